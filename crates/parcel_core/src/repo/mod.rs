//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Parcel::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `AddressLocked`) in
//!   addition to DB transport errors.

pub mod parcel_repo;
