//! Parcel domain model.
//!
//! # Responsibility
//! - Define the canonical shipment-tracking record.
//! - Own the lifecycle order of `ParcelStatus` and its text codec.
//!
//! # Invariants
//! - `number` is `None` until the store assigns one, and positive afterwards.
//! - `address` is never blank.
//! - `created_at` is an RFC3339 UTC timestamp and never changes after creation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Store-assigned parcel identifier.
pub type ParcelNumber = i64;

/// Identifier of the customer owning a parcel.
pub type ClientId = i64;

/// Delivery lifecycle of a parcel.
///
/// Variants are declared in lifecycle order, so the derived `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted by the tracker, not yet handed to a carrier.
    Registered,
    /// Handed to a carrier.
    Sent,
    /// Received by the client. Terminal.
    Delivered,
}

impl ParcelStatus {
    /// Returns the persisted text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Returns the following lifecycle state, or `None` for `Delivered`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParcelStatus {
    type Err = ParcelValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "registered" => Ok(Self::Registered),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            other => Err(ParcelValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// Validation failures for parcel invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParcelValidationError {
    #[error("parcel address cannot be blank")]
    BlankAddress,
    #[error("created_at `{0}` is not an RFC3339 UTC timestamp")]
    InvalidCreatedAt(String),
    #[error("unknown parcel status `{0}`")]
    UnknownStatus(String),
}

/// Shipment-tracking record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "UncheckedParcel")]
pub struct Parcel {
    /// Assigned by the store on insert.
    pub number: Option<ParcelNumber>,
    pub client: ClientId,
    pub status: ParcelStatus,
    pub address: String,
    /// RFC3339, UTC.
    pub created_at: String,
}

impl Parcel {
    /// Creates a `registered` parcel stamped with the current UTC time.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self::with_created_at(client, address, now_rfc3339())
    }

    /// Creates a `registered` parcel with a caller-provided creation time.
    ///
    /// Used by imports and tests where the timestamp must be deterministic.
    /// This constructor does not validate; call [`Parcel::validate`] or let
    /// the store do it on write.
    pub fn with_created_at(
        client: ClientId,
        address: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            number: None,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: created_at.into(),
        }
    }

    /// Checks field invariants that do not depend on storage.
    pub fn validate(&self) -> Result<(), ParcelValidationError> {
        validate_address(&self.address)?;
        validate_created_at(&self.created_at)
    }
}

/// Rejects blank addresses.
pub fn validate_address(address: &str) -> Result<(), ParcelValidationError> {
    if address.trim().is_empty() {
        return Err(ParcelValidationError::BlankAddress);
    }
    Ok(())
}

/// Accepts RFC3339 timestamps with a zero UTC offset (`Z` or `+00:00`).
pub fn validate_created_at(created_at: &str) -> Result<(), ParcelValidationError> {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(parsed) if parsed.offset().local_minus_utc() == 0 => Ok(()),
        _ => Err(ParcelValidationError::InvalidCreatedAt(
            created_at.to_string(),
        )),
    }
}

/// Current UTC time in the second-precision RFC3339 form parcels persist.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Deserialize)]
struct UncheckedParcel {
    number: Option<ParcelNumber>,
    client: ClientId,
    status: ParcelStatus,
    address: String,
    created_at: String,
}

impl TryFrom<UncheckedParcel> for Parcel {
    type Error = ParcelValidationError;

    fn try_from(value: UncheckedParcel) -> Result<Self, Self::Error> {
        let parcel = Self {
            number: value.number,
            client: value.client,
            status: value.status,
            address: value.address,
            created_at: value.created_at,
        };
        parcel.validate()?;
        Ok(parcel)
    }
}
