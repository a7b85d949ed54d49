//! JSON text wrappers around grouping, linking and projection.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::grouper::Grouper;
use crate::include::IncludeSpec;
use crate::linker::Linker;
use crate::pool::{Group, Pool};
use crate::projector::Projector;
use crate::types::EntityKey;

/// Group and link `data` as `type_name`
pub fn hydrate(catalog: &Catalog, type_name: &str, data: &serde_json::Value) -> Result<Group> {
    let mut group = Grouper::new(catalog).group(type_name, data)?;
    Linker::new(catalog).link(&mut group.pool)?;
    Ok(group)
}

/// Parse JSON text, then group and link it as `type_name`
pub fn from_text(catalog: &Catalog, type_name: &str, text: &str) -> Result<Group> {
    let data: serde_json::Value = serde_json::from_str(text)?;
    hydrate(catalog, type_name, &data)
}

/// Project an entity and encode it as compact JSON
pub fn to_text(pool: &Pool, key: EntityKey, include: &IncludeSpec) -> Result<String> {
    Ok(serde_json::to_string(&Projector::new(pool).project(key, include))?)
}

/// Project an entity and encode it as indented JSON
pub fn to_text_pretty(pool: &Pool, key: EntityKey, include: &IncludeSpec) -> Result<String> {
    Ok(serde_json::to_string_pretty(
        &Projector::new(pool).project(key, include),
    )?)
}

impl Group {
    /// Project the root entity
    #[must_use]
    pub fn project(&self, include: &IncludeSpec) -> serde_json::Value {
        Projector::new(&self.pool).project(self.root, include)
    }

    /// Encode the projected root as JSON text
    pub fn to_text(&self, include: &IncludeSpec) -> Result<String> {
        to_text(&self.pool, self.root, include)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_flat_text() {
        let mut catalog = Catalog::new();
        catalog.define("Employee");

        let group = from_text(&catalog, "Employee", r#"{"id":1,"name":"emp1"}"#).unwrap();
        assert_eq!(
            group.to_text(&IncludeSpec::none()).unwrap(),
            r#"{"id":1,"name":"emp1"}"#
        );
    }

    #[test]
    fn text_output_orders_attributes_by_key() {
        let mut catalog = Catalog::new();
        catalog.define("Employee");

        let text = r#"{"name":"emp1","id":1,"age":30}"#;
        let group = from_text(&catalog, "Employee", text).unwrap();
        let expected = r#"{"age":30,"id":1,"name":"emp1"}"#;
        assert_eq!(group.to_text(&IncludeSpec::none()).unwrap(), expected);
        assert_eq!(group.to_text(&IncludeSpec::none()).unwrap(), expected);
    }

    #[test]
    fn invalid_text_is_a_json_error() {
        let mut catalog = Catalog::new();
        catalog.define("Employee");
        let err = from_text(&catalog, "Employee", "{id: 1").unwrap_err();
        assert!(matches!(err, crate::ModelError::Json(_)));
    }
}
