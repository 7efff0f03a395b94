//! Record model: how a persisted type describes itself, and how that
//! description becomes a table schema.

pub mod descriptor;
pub mod directive;
pub mod kind;
pub mod record;

pub use descriptor::{describe, FieldDescriptor, PrimaryKey, TableSchema, PRIMARY_KEY_COLUMN};
pub use directive::{Directive, Directives, FieldOptions};
pub use kind::Kind;
pub use record::{kind_of, FieldDef, Record};
