use crate::error::ModelError;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Handle to an entity stored in a [`crate::Pool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(pub(crate) NodeIndex);

impl EntityKey {
    #[must_use]
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Identity of an entity within its type (the `id` attribute)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Text(String),
}

impl EntityId {
    /// Interpret a scalar attribute as an identity.
    ///
    /// Integral floats fold into the integer form, so `1.0` and `1` name the
    /// same entity. Fractional numbers, booleans, null and containers are not
    /// identities.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Self::from_number(n),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_number(n: &serde_json::Number) -> Option<Self> {
        // 2^63 and 2^64, both exact in f64
        const I64_END: f64 = 9_223_372_036_854_775_808.0;
        const U64_END: f64 = 18_446_744_073_709_551_616.0;

        if let Some(n) = n.as_i64() {
            return Some(Self::Int(n));
        }
        if let Some(n) = n.as_u64() {
            return Some(Self::UInt(n));
        }

        let f = n.as_f64()?;
        if !f.is_finite() || f.fract() != 0.0 {
            None
        } else if (-I64_END..I64_END).contains(&f) {
            Some(Self::Int(f as i64))
        } else if (0.0..U64_END).contains(&f) {
            Some(Self::UInt(f as u64))
        } else {
            None
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(n) => serde_json::Value::from(*n),
            Self::UInt(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::UInt(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::UInt(value), Self::Int)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Value stored in an entity's attribute map.
///
/// Scalars and resolved associations share one namespace; only the catalog
/// knows which keys are associations.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Scalar(serde_json::Value),
    One(EntityKey),
    Many(Vec<EntityKey>),
}

impl AttrValue {
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_one(&self) -> Option<EntityKey> {
        match self {
            Self::One(key) => Some(*key),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_many(&self) -> Option<&[EntityKey]> {
        match self {
            Self::Many(keys) => Some(keys),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Scalar(value)
    }
}

/// Association kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    /// Single target through the owner's own foreign key
    BelongsTo,

    /// Single target through the target's foreign key
    HasOne,

    /// Collection through the target's foreign key, or through join entities
    HasMany,
}

impl AssociationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BelongsTo => "belongsTo",
            Self::HasOne => "hasOne",
            Self::HasMany => "hasMany",
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssociationKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "belongs_to" | "belongsTo" => Ok(Self::BelongsTo),
            "has_one" | "hasOne" => Ok(Self::HasOne),
            "has_many" | "hasMany" => Ok(Self::HasMany),
            other => Err(ModelError::InvalidAssociationKind(other.to_string())),
        }
    }
}

/// One declared association of an entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub kind: AssociationKind,
    /// Name of the target entity type
    pub target: String,
    /// Join association on the same type (`hasMany` only)
    pub through: Option<String>,
}

/// Options accepted when declaring an association
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationOptions {
    pub target: Option<String>,
    pub through: Option<String>,
}

impl AssociationOptions {
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn through(mut self, through: impl Into<String>) -> Self {
        self.through = Some(through.into());
        self
    }
}

/// Schema shared by every entity of one type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityType {
    pub name: String,
    pub associations: BTreeMap<String, Association>,
    /// Attribute whitelist. Empty means every attribute is accepted.
    pub expect_attrs: Vec<String>,
}

impl EntityType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn association(&self, key: &str) -> Option<&Association> {
        self.associations.get(key)
    }

    /// Whether an attribute named `name` may be stored on instances.
    ///
    /// Association keys go through the same whitelist.
    #[must_use]
    pub fn permits(&self, name: &str) -> bool {
        self.expect_attrs.is_empty() || self.expect_attrs.iter().any(|a| a == name)
    }

    /// Foreign key attribute other types use to point at this type
    #[must_use]
    pub fn foreign_key(&self) -> String {
        foreign_key_for(&self.name)
    }
}

/// `Department` -> `departmentId`
#[must_use]
pub fn foreign_key_for(type_name: &str) -> String {
    format!("{}Id", type_name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_accepts_integers_and_strings() {
        assert_eq!(
            EntityId::from_json(&serde_json::json!(7)),
            Some(EntityId::Int(7))
        );
        assert_eq!(
            EntityId::from_json(&serde_json::json!("a-1")),
            Some(EntityId::Text("a-1".into()))
        );
        assert_eq!(
            EntityId::from_json(&serde_json::json!(u64::MAX)),
            Some(EntityId::UInt(u64::MAX))
        );
        assert_eq!(EntityId::from(7_u64), EntityId::Int(7));
        assert_eq!(EntityId::from_json(&serde_json::json!(1.5)), None);
        assert_eq!(EntityId::from_json(&serde_json::json!(null)), None);
        assert_eq!(EntityId::from_json(&serde_json::json!({"id": 1})), None);
    }

    #[test]
    fn integral_floats_fold_into_integer_ids() {
        assert_eq!(
            EntityId::from_json(&serde_json::json!(1.0)),
            Some(EntityId::Int(1))
        );
        assert_eq!(
            EntityId::from_json(&serde_json::json!(-3.0)),
            Some(EntityId::Int(-3))
        );
        assert_eq!(
            EntityId::from_json(&serde_json::json!(1e19)),
            Some(EntityId::UInt(10_000_000_000_000_000_000))
        );
        assert_eq!(EntityId::from_json(&serde_json::json!(1e20)), None);
    }

    #[test]
    fn association_kind_parses_both_spellings() {
        assert_eq!(
            "has_many".parse::<AssociationKind>().ok(),
            Some(AssociationKind::HasMany)
        );
        assert_eq!(
            "belongsTo".parse::<AssociationKind>().ok(),
            Some(AssociationKind::BelongsTo)
        );
        let err = "manyToMany".parse::<AssociationKind>().unwrap_err();
        assert!(matches!(err, ModelError::InvalidAssociationKind(k) if k == "manyToMany"));
    }

    #[test]
    fn whitelist_is_open_when_empty() {
        let mut ty = EntityType::new("Employee");
        assert!(ty.permits("anything"));

        ty.expect_attrs = vec!["id".into(), "name".into()];
        assert!(ty.permits("name"));
        assert!(!ty.permits("other"));
    }

    #[test]
    fn foreign_key_is_lowercased_type_name() {
        assert_eq!(foreign_key_for("Department"), "departmentId");
        assert_eq!(foreign_key_for("OrderItem"), "orderitemId");
    }
}
