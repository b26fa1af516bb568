// SQLite record store
// Append-only log of finalized sessions, queried by stream and by day

mod db;
mod error;
mod queries;
mod records;
mod schema;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use records::{DetectionStats, StoredRecord};
pub use schema::SCHEMA_VERSION;
