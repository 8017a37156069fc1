//! Parcel lifecycle service.
//!
//! # Responsibility
//! - Provide tracker-level use cases (register, advance, re-address, cancel).
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Status only moves forward one step at a time through this service.
//! - Only `registered` parcels can be deleted through this service.
//! - Service layer remains storage-agnostic.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelRepository, RepoError, RepoResult};
use log::{info, warn};

/// Use-case service wrapper for parcel tracking.
pub struct ParcelService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel for `client` stamped with the current time.
    ///
    /// # Contract
    /// - Status starts as `registered`.
    /// - Returns the stored parcel with its assigned number.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> RepoResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        let number = self.repo.add(&parcel)?;
        parcel.number = Some(number);

        info!("event=parcel_register module=service status=ok number={number} client={client}");
        Ok(parcel)
    }

    /// Gets one parcel by number.
    pub fn parcel(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        self.repo.get(number)
    }

    /// Lists every parcel owned by `client`.
    pub fn client_parcels(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        self.repo.get_by_client(client)
    }

    /// Moves a parcel one step forward in its lifecycle.
    ///
    /// Returns the new status, or `FinalStatus` for delivered parcels.
    pub fn next_status(&self, number: ParcelNumber) -> RepoResult<ParcelStatus> {
        let current = self.repo.get(number)?.status;
        let Some(next) = current.next() else {
            warn!("event=parcel_next_status module=service status=rejected number={number} from={current}");
            return Err(RepoError::FinalStatus(number));
        };

        self.repo.set_status(number, next)?;
        info!(
            "event=parcel_next_status module=service status=ok number={number} from={current} to={next}"
        );
        Ok(next)
    }

    /// Changes the delivery address of a `registered` parcel.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.repo.set_address(number, address)?;
        info!("event=parcel_change_address module=service status=ok number={number}");
        Ok(())
    }

    /// Deletes a parcel that has not left the tracker yet.
    pub fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        let status = self.repo.get(number)?.status;
        if status != ParcelStatus::Registered {
            warn!("event=parcel_delete module=service status=rejected number={number} parcel_status={status}");
            return Err(RepoError::DeleteLocked { number, status });
        }

        self.repo.delete(number)?;
        info!("event=parcel_delete module=service status=ok number={number}");
        Ok(())
    }
}
