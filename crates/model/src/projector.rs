use crate::entity::Entity;
use crate::include::IncludeSpec;
use crate::pool::Pool;
use crate::types::{AttrValue, EntityKey};

/// Renders entities back into plain nested data.
///
/// Associations are excluded unless the include spec names them, so the
/// recursion depth is bounded by the include spec even when the graph has cycles.
pub struct Projector<'a> {
    pool: &'a Pool,
}

impl<'a> Projector<'a> {
    #[must_use]
    pub const fn new(pool: &'a Pool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn project(&self, key: EntityKey, include: &IncludeSpec) -> serde_json::Value {
        self.project_entity(self.pool.entity(key), include)
    }

    /// Project an entity whose association values point into this pool,
    /// including one hydrated with [`Entity::from_data`].
    #[must_use]
    pub fn project_entity(&self, entity: &Entity, include: &IncludeSpec) -> serde_json::Value {
        let entity_type = entity.entity_type();
        let mut out = serde_json::Map::new();

        for (key, value) in entity.attrs() {
            let nested = if entity_type.association(key).is_some() {
                match include.child(key) {
                    Some(nested) => nested,
                    None => continue,
                }
            } else {
                IncludeSpec::empty()
            };
            out.insert(key.clone(), self.render(value, nested));
        }

        serde_json::Value::Object(out)
    }

    /// Project each key, preserving order
    #[must_use]
    pub fn project_all(&self, keys: &[EntityKey], include: &IncludeSpec) -> serde_json::Value {
        serde_json::Value::Array(keys.iter().map(|&k| self.project(k, include)).collect())
    }

    fn render(&self, value: &AttrValue, include: &IncludeSpec) -> serde_json::Value {
        match value {
            AttrValue::Scalar(value) => value.clone(),
            AttrValue::One(key) => self.project(*key, include),
            AttrValue::Many(keys) => self.project_all(keys, include),
        }
    }
}
