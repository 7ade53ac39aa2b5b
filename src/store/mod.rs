//! Persistence layer: libSQL-backed storage for intake sessions and plans.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::Database;
