use crate::catalog::Catalog;
use crate::error::{ModelError, Result};
use crate::pool::Pool;
use crate::types::{foreign_key_for, Association, AssociationKind, AttrValue, EntityId, EntityKey};
use std::collections::HashSet;
use std::sync::Arc;

/// Counters from one linking run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Associations that received a value
    pub resolved: usize,

    /// Associations left unset because nothing matched or the whitelist
    /// dropped the key
    pub unresolved: usize,

    /// Through associations resolved in the second pass
    pub deferred: usize,
}

/// Resolves declared associations on every pooled entity from foreign keys
pub struct Linker<'a> {
    catalog: &'a Catalog,
}

impl<'a> Linker<'a> {
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Wire every declared association in `pool`.
    ///
    /// Direct associations are resolved first; `through` associations are
    /// queued as `(owner, key)` and drained in encounter order once every
    /// direct association is in place. Unresolved associations stay unset.
    pub fn link(&self, pool: &mut Pool) -> Result<LinkReport> {
        let mut report = LinkReport::default();
        let mut deferred: Vec<(EntityKey, String)> = Vec::new();

        for owner in pool.keys() {
            let entity_type = Arc::clone(pool.entity(owner).entity_type());
            for (key, association) in &entity_type.associations {
                self.catalog.target_of(association)?;

                if association.kind == AssociationKind::HasMany && association.through.is_some() {
                    deferred.push((owner, key.clone()));
                    continue;
                }

                let value = match association.kind {
                    AssociationKind::BelongsTo => Self::belongs_to(pool, owner, association),
                    AssociationKind::HasOne => Self::has_one(pool, owner, association)?,
                    AssociationKind::HasMany => Self::has_many(pool, owner, association)?,
                };
                match value {
                    Some(value) => {
                        if Self::store(pool, owner, key, association.kind, value) {
                            report.resolved += 1;
                        } else {
                            report.unresolved += 1;
                        }
                    }
                    None => {
                        log::debug!(
                            "{} {} {} is undefined.",
                            entity_type.name,
                            association.kind,
                            association.target
                        );
                        report.unresolved += 1;
                    }
                }
            }
        }

        for (owner, key) in deferred {
            let entity_type = Arc::clone(pool.entity(owner).entity_type());
            let association = &entity_type.associations[&key];
            match Self::through(pool, owner, &key, association)? {
                Some(value) => {
                    if Self::store(pool, owner, &key, association.kind, value) {
                        report.deferred += 1;
                    } else {
                        report.unresolved += 1;
                    }
                }
                None => {
                    log::debug!(
                        "{} hasMany {} through {:?} is undefined.",
                        entity_type.name,
                        association.target,
                        association.through
                    );
                    report.unresolved += 1;
                }
            }
        }

        log::info!(
            "Linked entity pool: {} entities, {} links ({} resolved, {} through, {} unresolved)",
            pool.len(),
            pool.link_count(),
            report.resolved,
            report.deferred,
            report.unresolved
        );

        Ok(report)
    }

    fn store(
        pool: &mut Pool,
        owner: EntityKey,
        key: &str,
        kind: AssociationKind,
        value: AttrValue,
    ) -> bool {
        let stored = pool.set_association(owner, key, kind, value);
        if !stored {
            log::debug!(
                "{}.{key} resolved but dropped by the attribute whitelist",
                pool.entity(owner).type_name()
            );
        }
        stored
    }

    /// Target whose id equals the owner's `<target>Id` attribute
    fn belongs_to(pool: &Pool, owner: EntityKey, association: &Association) -> Option<AttrValue> {
        let fk = foreign_key_for(&association.target);
        let id = pool
            .entity(owner)
            .scalar(&fk)
            .and_then(EntityId::from_json)?;
        pool.find(&association.target, &id).map(AttrValue::One)
    }

    /// First target whose `<owner>Id` attribute equals the owner's id
    fn has_one(
        pool: &Pool,
        owner: EntityKey,
        association: &Association,
    ) -> Result<Option<AttrValue>> {
        Ok(Self::referencing(pool, owner, association)?
            .into_iter()
            .next()
            .map(AttrValue::One))
    }

    /// Every target whose `<owner>Id` attribute equals the owner's id
    fn has_many(
        pool: &Pool,
        owner: EntityKey,
        association: &Association,
    ) -> Result<Option<AttrValue>> {
        let targets = Self::referencing(pool, owner, association)?;
        Ok((!targets.is_empty()).then_some(AttrValue::Many(targets)))
    }

    fn referencing(
        pool: &Pool,
        owner: EntityKey,
        association: &Association,
    ) -> Result<Vec<EntityKey>> {
        let entity = pool.entity(owner);
        let id = entity.id()?;
        let fk = foreign_key_for(entity.type_name());

        Ok(pool
            .of_type(&association.target)
            .iter()
            .copied()
            .filter(|&candidate| {
                pool.entity(candidate)
                    .scalar(&fk)
                    .and_then(EntityId::from_json)
                    .is_some_and(|fk_id| fk_id == id)
            })
            .collect())
    }

    /// Targets reached through the owner's join entities, deduplicated by id
    fn through(
        pool: &Pool,
        owner: EntityKey,
        key: &str,
        association: &Association,
    ) -> Result<Option<AttrValue>> {
        let entity = pool.entity(owner);
        let through = association.through.as_deref().unwrap_or_default();

        let joins: Vec<EntityKey> = match entity.get(through) {
            Some(AttrValue::Many(joins)) => joins.clone(),
            Some(AttrValue::One(join)) => vec![*join],
            Some(AttrValue::Scalar(_)) => {
                return Err(ModelError::shape(entity.type_name(), through, "an association"));
            }
            None => {
                return Err(ModelError::MissingThroughRelation {
                    type_name: entity.type_name().to_string(),
                    through: through.to_string(),
                    key: key.to_string(),
                });
            }
        };

        let join_key = association.target.to_lowercase();
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for join in joins {
            let candidates = match pool.entity(join).get(&join_key) {
                Some(AttrValue::One(target)) => vec![*target],
                Some(AttrValue::Many(found)) => found.clone(),
                _ => {
                    log::debug!(
                        "{} join entity has no {join_key} association",
                        pool.entity(join).type_name()
                    );
                    continue;
                }
            };
            for target in candidates {
                if seen.insert(pool.entity(target).id()?) {
                    targets.push(target);
                }
            }
        }

        Ok((!targets.is_empty()).then_some(AttrValue::Many(targets)))
    }
}
