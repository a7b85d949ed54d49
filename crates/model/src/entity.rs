use crate::catalog::Catalog;
use crate::error::{ModelError, Result};
use crate::grouper::Grouper;
use crate::linker::Linker;
use crate::pool::Pool;
use crate::types::{AttrValue, EntityId, EntityType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One instance of a declared type: a flat attribute map holding scalars and
/// resolved associations side by side, kept sorted by key.
#[derive(Debug, Clone)]
pub struct Entity {
    entity_type: Arc<EntityType>,
    attrs: BTreeMap<String, AttrValue>,
}

impl Entity {
    #[must_use]
    pub fn new(entity_type: Arc<EntityType>) -> Self {
        Self {
            entity_type,
            attrs: BTreeMap::new(),
        }
    }

    /// Empty instance of a registered type
    pub fn of_type(catalog: &Catalog, type_name: &str) -> Result<Self> {
        Ok(Self::new(Arc::clone(catalog.lookup_type(type_name)?)))
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.entity_type.name
    }

    #[must_use]
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    #[must_use]
    pub const fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Read an attribute that must be present
    pub fn get_property(&self, name: &str) -> Result<&AttrValue> {
        self.attrs
            .get(name)
            .ok_or_else(|| ModelError::MissingProperty {
                type_name: self.type_name().to_string(),
                name: name.to_string(),
                attrs: self.describe_attrs(),
            })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Scalar attribute, if present and not an association value
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&serde_json::Value> {
        self.attrs.get(name).and_then(AttrValue::as_scalar)
    }

    /// Store an attribute. Returns `false` when the type's whitelist drops it.
    pub fn set_property(&mut self, name: &str, value: impl Into<AttrValue>) -> bool {
        if !self.entity_type.permits(name) {
            log::debug!("{}: {name} is not an expected attribute", self.type_name());
            return false;
        }
        self.attrs.insert(name.to_string(), value.into());
        true
    }

    pub fn id(&self) -> Result<EntityId> {
        let value = self.get_property("id")?;
        value
            .as_scalar()
            .and_then(EntityId::from_json)
            .ok_or_else(|| ModelError::InvalidId {
                type_name: self.type_name().to_string(),
                value: format!("{value:?}"),
            })
    }

    /// Group and link `data` as this entity's type, then copy every attribute
    /// of the resulting root onto `self`.
    ///
    /// Association values on `self` point into the returned pool.
    pub fn from_data(&mut self, catalog: &Catalog, data: &serde_json::Value) -> Result<Pool> {
        let mut pool = Pool::new();
        let root = Grouper::new(catalog).group_into(&mut pool, self.type_name(), data)?;
        Linker::new(catalog).link(&mut pool)?;

        for (key, value) in pool.entity(root).attrs() {
            self.set_property(key, value.clone());
        }
        Ok(pool)
    }

    /// [`Entity::from_data`] over JSON text
    pub fn from_text(&mut self, catalog: &Catalog, text: &str) -> Result<Pool> {
        let data: serde_json::Value = serde_json::from_str(text)?;
        self.from_data(catalog, &data)
    }

    fn describe_attrs(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .attrs
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    AttrValue::Scalar(value) => value.clone(),
                    AttrValue::One(k) => format!("<entity #{}>", k.index()).into(),
                    AttrValue::Many(ks) => format!("<{} entities>", ks.len()).into(),
                };
                (key.clone(), value)
            })
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn employee(expect: &[&str]) -> Entity {
        let mut ty = EntityType::new("Employee");
        ty.expect_attrs = expect.iter().map(|s| (*s).to_string()).collect();
        Entity::new(Arc::new(ty))
    }

    #[test]
    fn stores_and_reads_properties() {
        let mut emp = employee(&[]);
        assert!(!emp.has_property("testKey"));
        assert!(emp.get("none").is_none());

        assert!(emp.set_property("testKey", json!("testValue")));
        assert!(emp.has_property("testKey"));
        assert_eq!(emp.scalar("testKey"), Some(&json!("testValue")));
        assert_eq!(
            emp.get_property("testKey").unwrap(),
            &AttrValue::Scalar(json!("testValue"))
        );
        assert_eq!(emp.type_name(), "Employee");
    }

    #[test]
    fn missing_property_reports_type_and_attrs() {
        let emp = employee(&[]);
        let err = emp.get_property("testKey").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Employee has not testKey property.\n    attrs: {}"
        );
    }

    #[test]
    fn whitelist_drops_unexpected_attributes() {
        let mut emp = employee(&["id", "name"]);
        assert!(emp.set_property("id", json!(1)));
        assert!(!emp.set_property("errorKey", json!("errorValue")));
        assert!(!emp.has_property("errorKey"));
        assert_eq!(emp.attrs().len(), 1);
    }

    #[test]
    fn id_must_be_present_and_scalar() {
        let mut emp = employee(&[]);
        assert!(matches!(emp.id(), Err(ModelError::MissingProperty { .. })));

        emp.set_property("id", json!([1]));
        assert!(matches!(emp.id(), Err(ModelError::InvalidId { .. })));

        emp.set_property("id", json!(3));
        assert_eq!(emp.id().unwrap(), EntityId::Int(3));
    }
}
