//! Core domain logic for the parcel tracker.
//! This crate owns the parcel store contract and lifecycle rules.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus, ParcelValidationError};
pub use repo::parcel_repo::{ParcelRepository, ParcelStore, RepoError, RepoResult};
pub use service::parcel_service::ParcelService;

/// Minimal health-check API for wiring probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
