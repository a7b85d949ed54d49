use crate::catalog::Catalog;
use crate::error::Result;
use crate::types::{AssociationKind, AssociationOptions, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative schema, loadable from TOML or JSON.
///
/// ```toml
/// [types.Employee]
/// attributes = ["id", "name", "assigns"]
///
/// [types.Employee.associations.assigns]
/// kind = "has_many"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    #[serde(default)]
    pub types: BTreeMap<String, TypeConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeConfig {
    /// Attribute whitelist; empty accepts everything
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub associations: BTreeMap<String, AssociationConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationConfig {
    /// `belongs_to`, `has_one` or `has_many` (camelCase also accepted)
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub through: Option<String>,
}

impl SchemaConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build and validate a catalog from this schema
    pub fn into_catalog(self) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        for (name, config) in self.types {
            let mut entity_type = EntityType::new(&name);
            entity_type.expect_attrs = config.attributes;
            catalog.register(entity_type);

            for (key, association) in config.associations {
                let kind: AssociationKind = association.kind.parse()?;
                let options = AssociationOptions {
                    target: association.target,
                    through: association.through,
                };
                catalog.declare(&name, &key, kind, options)?;
            }
        }
        catalog.validate()?;
        Ok(catalog)
    }
}

impl Catalog {
    /// Catalog from a TOML schema
    pub fn from_toml(text: &str) -> Result<Self> {
        SchemaConfig::from_toml(text)?.into_catalog()
    }
}
