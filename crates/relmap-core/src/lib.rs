//! # relmap-core
//!
//! Foundation crate for the relmap record mapper.
//! Defines the record model, field directives, the column type mapper,
//! the value codec, errors, config, cancellation and tracing setup.
//! `relmap-storage` builds SQL and talks to the database on top of this.

pub mod cancel;
pub mod codec;
pub mod config;
pub mod errors;
pub mod schema;
pub mod tracing;

// Re-export the most commonly used types at the crate root.
pub use cancel::CancelToken;
pub use codec::{FieldType, FieldValue, Json, SqlValue, TIME_FORMAT};
pub use config::{MapperConfig, PoolConfig};
pub use errors::{MapperError, MapperResult};
pub use schema::{
    describe, Directive, Directives, FieldDef, FieldDescriptor, FieldOptions, Kind, PrimaryKey,
    Record, TableSchema,
};
