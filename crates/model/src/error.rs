use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("{type_name} has {key} property is not {expected}.")]
    Shape {
        type_name: String,
        key: String,
        expected: &'static str,
    },

    #[error("{0} is not registered in the catalog")]
    UnknownType(String),

    #[error("{0} is not an association kind")]
    InvalidAssociationKind(String),

    #[error("{type_name} has not {through} relation. define relation is {key}.")]
    MissingThroughRelation {
        type_name: String,
        through: String,
        key: String,
    },

    #[error("include spec must be an object or an array of keys: {0}")]
    InvalidIncludeSpec(String),

    #[error("{type_name} has not {name} property.\n    attrs: {attrs}")]
    MissingProperty {
        type_name: String,
        name: String,
        attrs: String,
    },

    #[error("{type_name} id must be an integer or a string, got {value}")]
    InvalidId { type_name: String, value: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] toml::de::Error),
}

impl ModelError {
    pub(crate) fn shape(type_name: &str, key: &str, expected: &'static str) -> Self {
        Self::Shape {
            type_name: type_name.to_string(),
            key: key.to_string(),
            expected,
        }
    }
}
