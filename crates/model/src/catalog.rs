use crate::error::{ModelError, Result};
use crate::inflect::type_name_for_key;
use crate::types::{Association, AssociationKind, AssociationOptions, EntityType};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Registry of entity types and their associations.
///
/// Built once by the host application and passed by reference to the
/// grouper, linker and projector. Independent catalogs can coexist.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    types: HashMap<String, Arc<EntityType>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any earlier registration under the same name
    pub fn register(&mut self, entity_type: EntityType) -> Arc<EntityType> {
        if self.types.contains_key(&entity_type.name) {
            log::warn!("override relational type: {}", entity_type.name);
        }
        let entity_type = Arc::new(entity_type);
        self.types
            .insert(entity_type.name.clone(), Arc::clone(&entity_type));
        entity_type
    }

    /// Register an empty type and return a builder for its declarations
    pub fn define(&mut self, name: &str) -> TypeDefinition<'_> {
        self.register(EntityType::new(name));
        TypeDefinition {
            catalog: self,
            name: name.to_string(),
        }
    }

    /// Declare one association on a registered type. Redeclaring a key
    /// replaces the earlier declaration.
    pub fn declare(
        &mut self,
        type_name: &str,
        key: &str,
        kind: AssociationKind,
        options: AssociationOptions,
    ) -> Result<()> {
        let entity_type = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| ModelError::UnknownType(type_name.to_string()))?;

        let target = options
            .target
            .unwrap_or_else(|| type_name_for_key(key));
        let through = match kind {
            AssociationKind::HasMany => options.through,
            _ => {
                if let Some(through) = options.through {
                    log::debug!("{type_name}.{key}: through {through} ignored on {kind}");
                }
                None
            }
        };

        Arc::make_mut(entity_type).associations.insert(
            key.to_string(),
            Association {
                kind,
                target,
                through,
            },
        );
        Ok(())
    }

    /// Set the attribute whitelist of a registered type
    pub fn expect_attrs<I, S>(&mut self, type_name: &str, attrs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entity_type = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| ModelError::UnknownType(type_name.to_string()))?;
        Arc::make_mut(entity_type).expect_attrs = attrs.into_iter().map(Into::into).collect();
        Ok(())
    }

    pub fn lookup_type(&self, name: &str) -> Result<&Arc<EntityType>> {
        self.types
            .get(name)
            .ok_or_else(|| ModelError::UnknownType(name.to_string()))
    }

    pub fn associations_of(&self, name: &str) -> Result<&BTreeMap<String, Association>> {
        Ok(&self.lookup_type(name)?.associations)
    }

    /// Target type of a declared association
    pub fn target_of(&self, association: &Association) -> Result<&Arc<EntityType>> {
        self.lookup_type(&association.target)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names in sorted order
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check that every association targets a registered type and that every
    /// `through` key names a `hasMany` association on the same type.
    pub fn validate(&self) -> Result<()> {
        for name in self.type_names() {
            let entity_type = &self.types[name];
            for (key, association) in &entity_type.associations {
                self.target_of(association)?;
                if let Some(through) = &association.through {
                    let join = entity_type.association(through);
                    if !matches!(join, Some(a) if a.kind == AssociationKind::HasMany) {
                        return Err(ModelError::MissingThroughRelation {
                            type_name: name.to_string(),
                            through: through.clone(),
                            key: key.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Chained declarations for one type, returned by [`Catalog::define`]
pub struct TypeDefinition<'a> {
    catalog: &'a mut Catalog,
    name: String,
}

impl TypeDefinition<'_> {
    fn declare(self, key: &str, kind: AssociationKind, options: AssociationOptions) -> Self {
        // `define` registered the type, so the lookup cannot miss.
        if let Err(err) = self.catalog.declare(&self.name, key, kind, options) {
            log::warn!("{err}");
        }
        self
    }

    pub fn belongs_to(self, key: &str) -> Self {
        self.declare(key, AssociationKind::BelongsTo, AssociationOptions::default())
    }

    pub fn has_one(self, key: &str) -> Self {
        self.declare(key, AssociationKind::HasOne, AssociationOptions::default())
    }

    pub fn has_many(self, key: &str) -> Self {
        self.declare(key, AssociationKind::HasMany, AssociationOptions::default())
    }

    pub fn has_many_through(self, key: &str, through: &str) -> Self {
        self.declare(
            key,
            AssociationKind::HasMany,
            AssociationOptions::default().through(through),
        )
    }

    pub fn association(
        self,
        key: &str,
        kind: AssociationKind,
        options: AssociationOptions,
    ) -> Self {
        self.declare(key, kind, options)
    }

    pub fn expect_attrs(self, attrs: &[&str]) -> Self {
        if let Err(err) = self.catalog.expect_attrs(&self.name, attrs.iter().copied()) {
            log::warn!("{err}");
        }
        self
    }
}
