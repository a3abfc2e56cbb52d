//! # Schema Module
//!
//! Declarative resource schemas: the typed property declarations of a resource and
//! the collection / resource URIs it is served on. Schemas are usually loaded from a
//! directory of YAML documents at startup (see [`load_from_directory`]) but can also
//! be built in code with [`SchemaModel::new`].

mod load;
mod types;

pub use load::*;
pub use types::*;
