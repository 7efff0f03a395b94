//! # relmap-storage
//!
//! SQL side of the relmap record mapper: driver and dialect selection,
//! a bounded connection pool, the statement builder, row scanning and the
//! `Mapper` CRUD API on top of them.

pub mod driver;
pub mod mapper;
pub mod pool;
pub mod pragmas;
pub mod scan;
pub mod statements;

pub use driver::{Dialect, Driver};
pub use mapper::Mapper;
pub use pool::{ConnectionPool, PooledConnection};
pub use scan::{scan, RowScanner};
pub use statements::{Statement, StatementBuilder};
