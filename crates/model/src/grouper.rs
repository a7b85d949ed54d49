use crate::catalog::Catalog;
use crate::entity::Entity;
use crate::error::{ModelError, Result};
use crate::pool::{Group, Pool};
use crate::types::{AssociationKind, EntityKey};
use std::sync::Arc;

/// Decomposes nested data into a shared, type-partitioned entity pool
pub struct Grouper<'a> {
    catalog: &'a Catalog,
}

impl<'a> Grouper<'a> {
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Group `data` as `type_name` into a fresh pool
    pub fn group(&self, type_name: &str, data: &serde_json::Value) -> Result<Group> {
        let mut pool = Pool::new();
        let root = self.group_into(&mut pool, type_name, data)?;
        Ok(Group { root, pool })
    }

    /// Group `data` as `type_name`, extending `pool`.
    ///
    /// Nested association values are registered as entities of their target
    /// type but are not attached to the owner; the linker wires them from
    /// foreign keys so nested and flat input produce the same graph.
    ///
    /// When `(type, id)` is already registered the kept entity's key is
    /// returned and the new data is discarded.
    pub fn group_into(
        &self,
        pool: &mut Pool,
        type_name: &str,
        data: &serde_json::Value,
    ) -> Result<EntityKey> {
        let entity_type = self.catalog.lookup_type(type_name)?;
        let fields = data
            .as_object()
            .ok_or_else(|| ModelError::shape(type_name, "<root>", "an object"))?;

        let mut entity = Entity::new(Arc::clone(entity_type));

        for (key, value) in fields {
            let Some(association) = entity_type.association(key) else {
                entity.set_property(key, value.clone());
                continue;
            };

            match association.kind {
                AssociationKind::HasMany => {
                    let items = value
                        .as_array()
                        .ok_or_else(|| ModelError::shape(type_name, key, "array"))?;
                    let target = self.catalog.target_of(association)?;
                    for item in items {
                        self.group_into(pool, &target.name, item)?;
                    }
                }
                AssociationKind::HasOne | AssociationKind::BelongsTo => {
                    if value.is_null() {
                        log::debug!("{type_name}.{key} is null, nothing to group");
                        continue;
                    }
                    if !value.is_object() {
                        return Err(ModelError::shape(type_name, key, "object"));
                    }
                    let target = self.catalog.target_of(association)?;
                    self.group_into(pool, &target.name, value)?;
                }
            }
        }

        let (key, _) = pool.insert(entity)?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssociationOptions, AttrValue, EntityId};
    use serde_json::json;

    fn scalars(pool: &Pool, type_name: &str, id: i64) -> serde_json::Value {
        let key = pool.find(type_name, &EntityId::Int(id)).unwrap();
        let map: serde_json::Map<String, serde_json::Value> = pool
            .entity(key)
            .attrs()
            .iter()
            .filter_map(|(k, v)| match v {
                AttrValue::Scalar(v) => Some((k.clone(), v.clone())),
                _ => None,
            })
            .collect();
        serde_json::Value::Object(map)
    }

    #[test]
    fn groups_flat_data() {
        let mut catalog = Catalog::new();
        catalog.define("Employee");

        let data = json!({"id": 1, "name": "emp1"});
        let group = Grouper::new(&catalog).group("Employee", &data).unwrap();

        assert_eq!(scalars(&group.pool, "Employee", 1), data);
        assert_eq!(group.root().id().unwrap(), EntityId::Int(1));
    }

    #[test]
    fn nested_single_associations_become_pool_entries() {
        for kind in ["belongs_to", "has_one"] {
            let mut catalog = Catalog::new();
            let def = catalog.define("Employee");
            if kind == "belongs_to" {
                def.belongs_to("department");
            } else {
                def.has_one("department");
            }
            catalog.define("Department");

            let data = json!({
                "id": 1,
                "name": "emp1",
                "department": {"id": 21, "name": "dep1"}
            });
            let group = Grouper::new(&catalog).group("Employee", &data).unwrap();

            assert_eq!(
                scalars(&group.pool, "Employee", 1),
                json!({"id": 1, "name": "emp1"})
            );
            assert_eq!(
                scalars(&group.pool, "Department", 21),
                json!({"id": 21, "name": "dep1"})
            );
            assert!(!group.root().has_property("department"));
        }
    }

    #[test]
    fn has_many_requires_an_array() {
        let mut catalog = Catalog::new();
        catalog.define("Employee").has_many("departments");
        catalog.define("Department");

        let data = json!({
            "id": 1,
            "name": "emp1",
            "departments": {"id": 21, "name": "dep1"}
        });
        let err = Grouper::new(&catalog).group("Employee", &data).unwrap_err();
        assert!(matches!(err, ModelError::Shape { .. }));
        assert_eq!(
            err.to_string(),
            "Employee has departments property is not array."
        );
    }

    #[test]
    fn null_single_association_is_skipped() {
        let mut catalog = Catalog::new();
        catalog.define("Employee").belongs_to("department");
        catalog.define("Department");

        let data = json!({"id": 1, "department": null});
        let group = Grouper::new(&catalog).group("Employee", &data).unwrap();
        assert_eq!(group.pool.len(), 1);
    }

    #[test]
    fn unregistered_target_type_fails() {
        let mut catalog = Catalog::new();
        catalog.define("Employee").has_many("departments");

        let data = json!({"id": 1, "departments": [{"id": 2}]});
        let err = Grouper::new(&catalog).group("Employee", &data).unwrap_err();
        assert!(matches!(err, ModelError::UnknownType(name) if name == "Department"));
    }

    #[test]
    fn regrouping_into_the_same_pool_keeps_one_entity_per_id() {
        let mut catalog = Catalog::new();
        catalog.define("Employee").has_many("assigns");
        catalog.define("Assign");

        let data = json!({"id": 1, "assigns": [{"id": 21}, {"id": 21, "note": "dup"}]});
        let grouper = Grouper::new(&catalog);
        let mut pool = Pool::new();
        let first = grouper.group_into(&mut pool, "Employee", &data).unwrap();
        let second = grouper.group_into(&mut pool, "Employee", &data).unwrap();

        assert_eq!(first, second);
        assert_eq!(pool.counts()["Employee"], 1);
        assert_eq!(pool.counts()["Assign"], 1);
        let assign = pool.find("Assign", &EntityId::Int(21)).unwrap();
        assert!(!pool.entity(assign).has_property("note"));
    }

    #[test]
    fn whitelist_filters_grouped_attributes() {
        let mut catalog = Catalog::new();
        catalog.define("Employee").expect_attrs(&["id", "name"]);

        let data = json!({"id": 1, "name": "dept1", "other1": {}, "other2": ""});
        let group = Grouper::new(&catalog).group("Employee", &data).unwrap();
        let attrs = group.root().attrs();
        assert!(!attrs.contains_key("other1"));
        assert!(!attrs.contains_key("other2"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn first_entity_in_input_order_is_kept() {
        let mut catalog = Catalog::new();
        catalog
            .define("Project")
            .association(
                "zeta",
                AssociationKind::BelongsTo,
                AssociationOptions::default().target("Person"),
            )
            .association(
                "alpha",
                AssociationKind::BelongsTo,
                AssociationOptions::default().target("Person"),
            );
        catalog.define("Person");

        let data: serde_json::Value = serde_json::from_str(
            r#"{"id": 1,
                "zeta": {"id": 5, "name": "first-in-input"},
                "alpha": {"id": 5, "name": "second-in-input"}}"#,
        )
        .unwrap();
        let group = Grouper::new(&catalog).group("Project", &data).unwrap();

        assert_eq!(group.pool.counts()["Person"], 1);
        assert_eq!(
            scalars(&group.pool, "Person", 5),
            json!({"id": 5, "name": "first-in-input"})
        );
    }
}
