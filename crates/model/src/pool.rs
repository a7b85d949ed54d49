use crate::entity::Entity;
use crate::error::Result;
use crate::types::{AssociationKind, AttrValue, EntityId, EntityKey};
use petgraph::graph::{DiGraph, EdgeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};

/// Edge recorded for every resolved association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub key: String,
    pub kind: AssociationKind,
}

#[derive(Debug, Clone, Default)]
struct Partition {
    order: Vec<EntityKey>,
    by_id: HashMap<EntityId, EntityKey>,
}

/// Type-partitioned, id-indexed entities discovered by one decomposition.
///
/// Entities live as nodes of a directed graph; association values stored on
/// entities are [`EntityKey`] handles into that graph, and every resolved
/// association is mirrored as an edge.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    graph: DiGraph<Entity, Link>,
    partitions: BTreeMap<String, Partition>,
}

/// Root entity plus the pool it was registered in
#[derive(Debug, Clone)]
pub struct Group {
    pub root: EntityKey,
    pub pool: Pool,
}

impl Group {
    #[must_use]
    pub fn root(&self) -> &Entity {
        self.pool.entity(self.root)
    }
}

impl Pool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity under `(type, id)`. The first entity registered for
    /// a pair is kept; later ones are discarded and the kept key is returned
    /// with `false`.
    pub fn insert(&mut self, entity: Entity) -> Result<(EntityKey, bool)> {
        let id = entity.id()?;
        let partition = self
            .partitions
            .entry(entity.type_name().to_string())
            .or_default();

        if let Some(&existing) = partition.by_id.get(&id) {
            log::debug!("{}:{id} is duplicated.", entity.type_name());
            return Ok((existing, false));
        }

        let key = EntityKey(self.graph.add_node(entity));
        partition.order.push(key);
        partition.by_id.insert(id, key);
        Ok((key, true))
    }

    #[must_use]
    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.graph.node_weight(key.0)
    }

    /// Entity behind `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` was issued by a different pool.
    #[must_use]
    pub fn entity(&self, key: EntityKey) -> &Entity {
        &self.graph[key.0]
    }

    pub(crate) fn entity_mut(&mut self, key: EntityKey) -> &mut Entity {
        &mut self.graph[key.0]
    }

    #[must_use]
    pub fn find(&self, type_name: &str, id: &EntityId) -> Option<EntityKey> {
        self.partitions
            .get(type_name)
            .and_then(|p| p.by_id.get(id).copied())
    }

    /// Keys of one type, in registration order
    #[must_use]
    pub fn of_type(&self, type_name: &str) -> &[EntityKey] {
        self.partitions
            .get(type_name)
            .map_or(&[], |p| p.order.as_slice())
    }

    /// Every key, grouped by type name (sorted) then registration order
    #[must_use]
    pub fn keys(&self) -> Vec<EntityKey> {
        self.partitions
            .values()
            .flat_map(|p| p.order.iter().copied())
            .collect()
    }

    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        self.partitions.keys().map(String::as_str).collect()
    }

    /// Entity count per type name
    #[must_use]
    pub fn counts(&self) -> BTreeMap<&str, usize> {
        self.partitions
            .iter()
            .map(|(name, p)| (name.as_str(), p.order.len()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    #[must_use]
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// (entities, links)
    #[must_use]
    pub fn stats(&self) -> (usize, usize) {
        (self.graph.node_count(), self.graph.edge_count())
    }

    /// Outgoing links of an entity as `(association key, target)`
    #[must_use]
    pub fn links_from(&self, key: EntityKey) -> Vec<(&str, EntityKey)> {
        let mut links: Vec<(&str, EntityKey)> = self
            .graph
            .edges(key.0)
            .map(|e| (e.weight().key.as_str(), EntityKey(e.target())))
            .collect();
        links.sort();
        links
    }

    /// Store a resolved association on `owner` and replace the edges
    /// previously recorded under the same key.
    ///
    /// Returns `false` when the owner's whitelist drops the key.
    pub(crate) fn set_association(
        &mut self,
        owner: EntityKey,
        key: &str,
        kind: AssociationKind,
        value: AttrValue,
    ) -> bool {
        self.remove_links(owner, key);

        let targets: Vec<EntityKey> = match &value {
            AttrValue::One(target) => vec![*target],
            AttrValue::Many(targets) => targets.clone(),
            AttrValue::Scalar(_) => Vec::new(),
        };
        if !self.entity_mut(owner).set_property(key, value) {
            return false;
        }
        for target in targets {
            self.graph.add_edge(
                owner.0,
                target.0,
                Link {
                    key: key.to_string(),
                    kind,
                },
            );
        }
        true
    }

    fn remove_links(&mut self, owner: EntityKey, key: &str) {
        let mut stale: Vec<EdgeIndex> = self
            .graph
            .edges(owner.0)
            .filter(|e| e.weight().key == key)
            .map(|e| e.id())
            .collect();
        // remove_edge swaps the last edge into the hole, so go high to low
        stale.sort_unstable_by(|a, b| b.cmp(a));
        for edge in stale {
            self.graph.remove_edge(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityType;
    use serde_json::json;
    use std::sync::Arc;

    fn department(id: i64, name: &str) -> Entity {
        let mut entity = Entity::new(Arc::new(EntityType::new("Department")));
        entity.set_property("id", json!(id));
        entity.set_property("name", json!(name));
        entity
    }

    #[test]
    fn first_registration_wins() {
        let mut pool = Pool::new();
        let (first, inserted) = pool.insert(department(11, "dept11")).unwrap();
        assert!(inserted);

        let (second, inserted) = pool.insert(department(11, "other")).unwrap();
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(pool.len(), 1);
        assert_eq!(
            pool.entity(first).scalar("name"),
            Some(&json!("dept11"))
        );
    }

    #[test]
    fn keeps_registration_order_per_type() {
        let mut pool = Pool::new();
        let (a, _) = pool.insert(department(30, "c")).unwrap();
        let (b, _) = pool.insert(department(10, "a")).unwrap();
        assert_eq!(pool.of_type("Department"), &[a, b]);
        assert_eq!(pool.of_type("Employee"), &[] as &[EntityKey]);
        assert_eq!(pool.find("Department", &EntityId::Int(10)), Some(b));
        assert_eq!(pool.counts()["Department"], 2);
    }

    #[test]
    fn resetting_an_association_replaces_its_edges() {
        let mut pool = Pool::new();
        let (a, _) = pool.insert(department(1, "a")).unwrap();
        let (b, _) = pool.insert(department(2, "b")).unwrap();
        let (c, _) = pool.insert(department(3, "c")).unwrap();

        let peers = AttrValue::Many(vec![b, c]);
        assert!(pool.set_association(a, "peers", AssociationKind::HasMany, peers));
        assert_eq!(pool.link_count(), 2);

        let peers = AttrValue::Many(vec![c]);
        assert!(pool.set_association(a, "peers", AssociationKind::HasMany, peers));
        assert_eq!(pool.link_count(), 1);
        assert_eq!(pool.links_from(a), vec![("peers", c)]);
    }
}
