//! # Relational Model
//!
//! Normalizes nested relational data into a deduplicated entity graph and
//! renders bounded subtrees of that graph back into plain data.
//!
//! ## Pipeline
//!
//! ```text
//! Nested JSON
//!     │
//!     ├──> Grouper
//!     │      ├─ One entity per (type, id), first seen wins
//!     │      └─ Nested associations registered, not attached
//!     │
//!     ├──> Linker
//!     │      ├─ Pass 1: belongsTo / hasOne / hasMany via foreign keys
//!     │      └─ Pass 2: hasMany through join entities
//!     │
//!     └──> Projector
//!            └─ Plain JSON, associations only where the include spec says
//! ```
//!
//! ## Example
//!
//! ```
//! use relational_model::{codec, Catalog, IncludeSpec};
//!
//! let mut catalog = Catalog::new();
//! catalog.define("Department").has_many("employees");
//! catalog.define("Employee").belongs_to("department");
//!
//! let data = serde_json::json!({
//!     "id": 21,
//!     "name": "dept1",
//!     "employees": [{"id": 1, "name": "emp1", "departmentId": 21}]
//! });
//! let group = codec::hydrate(&catalog, "Department", &data)?;
//!
//! let tree = group.project(&IncludeSpec::keys(["employees"]));
//! assert_eq!(tree["employees"][0]["name"], "emp1");
//! # Ok::<(), relational_model::ModelError>(())
//! ```

mod catalog;
pub mod codec;
mod entity;
mod error;
mod grouper;
mod include;
pub mod inflect;
mod linker;
mod pool;
mod projector;
mod schema;
mod types;

pub use catalog::{Catalog, TypeDefinition};
pub use entity::Entity;
pub use error::{ModelError, Result};
pub use grouper::Grouper;
pub use include::IncludeSpec;
pub use linker::{LinkReport, Linker};
pub use pool::{Group, Link, Pool};
pub use projector::Projector;
pub use schema::{AssociationConfig, SchemaConfig, TypeConfig};
pub use types::{
    foreign_key_for, Association, AssociationKind, AssociationOptions, AttrValue, EntityId,
    EntityKey, EntityType,
};
