//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into lifecycle-level APIs.
//! - Keep the CLI decoupled from storage details.

pub mod parcel_service;
