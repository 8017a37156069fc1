//! Domain model for shipment tracking.
//!
//! # Responsibility
//! - Define canonical data structures used by store and service layers.
//!
//! # Invariants
//! - Every persisted parcel is identified by a store-assigned `ParcelNumber`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod parcel;
