use crate::error::{ModelError, Result};
use std::collections::BTreeMap;

static EMPTY: IncludeSpec = IncludeSpec::Nested(BTreeMap::new());

/// Which associations a projection renders, and how deep
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeSpec {
    /// Include these keys without further nesting
    Keys(Vec<String>),

    /// Include these keys, each with its own nested spec
    Nested(BTreeMap<String, IncludeSpec>),
}

impl Default for IncludeSpec {
    fn default() -> Self {
        Self::Nested(BTreeMap::new())
    }
}

impl IncludeSpec {
    /// Spec that includes no associations
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn empty() -> &'static IncludeSpec {
        &EMPTY
    }

    #[must_use]
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keys(keys.into_iter().map(Into::into).collect())
    }

    /// Add `key` with a nested spec. A `Keys` spec is widened to `Nested`.
    #[must_use]
    pub fn with(self, key: impl Into<String>, nested: IncludeSpec) -> Self {
        let mut map = match self {
            Self::Nested(map) => map,
            Self::Keys(keys) => keys.into_iter().map(|k| (k, Self::none())).collect(),
        };
        map.insert(key.into(), nested);
        Self::Nested(map)
    }

    /// Nested spec for `key`, or `None` when `key` is not included
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&IncludeSpec> {
        match self {
            Self::Keys(keys) => keys.iter().any(|k| k == key).then_some(&EMPTY),
            Self::Nested(map) => map.get(key),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Keys(keys) => keys.is_empty(),
            Self::Nested(map) => map.is_empty(),
        }
    }

    /// Parse `["a", "b"]` or `{"a": {...}, "b": ["c"]}`. `null` means no
    /// includes, at the top level and for nested values.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::none()),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ModelError::InvalidIncludeSpec(format!("expected a key, got {item}"))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Keys),
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(key, nested)| Ok((key.clone(), Self::from_json(nested)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Self::Nested),
            other => Err(ModelError::InvalidIncludeSpec(other.to_string())),
        }
    }
}

impl TryFrom<&serde_json::Value> for IncludeSpec {
    type Error = ModelError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        Self::from_json(value)
    }
}
