//! SQLite storage bootstrap.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the parcel tracker.
//! - Create the `parcel` table when it does not exist yet.
//!
//! # Invariants
//! - Core code must not read/write parcels before `ensure_schema` succeeds on
//!   connections opened here.
//! - Schema creation is idempotent and unversioned.

use thiserror::Error;

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Transport-level database failure.
///
/// The wrapped `rusqlite::Error` is kept intact; display and `source()` are
/// forwarded to it.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
