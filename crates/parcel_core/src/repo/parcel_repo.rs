//! Parcel repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/read/delete and constrained-update APIs over the `parcel`
//!   table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate input before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Address edits only apply while the stored status is `registered`.
//! - Every operation issues a single mutating statement, so a failure never
//!   leaves a partial update behind.

use crate::db::schema::{table_columns, table_exists, PARCEL_COLUMNS, PARCEL_TABLE};
use crate::db::DbError;
use crate::model::parcel::{
    validate_address, ClientId, Parcel, ParcelNumber, ParcelStatus, ParcelValidationError,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

const ADDRESS_UPDATE_ATTEMPTS: usize = 2;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for parcel persistence and lifecycle operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ParcelValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("parcel not found: {0}")]
    NotFound(ParcelNumber),
    #[error("invalid persisted parcel data: {0}")]
    InvalidData(String),
    #[error("address of parcel {number} cannot change in status `{status}`")]
    AddressLocked {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    #[error("parcel {number} cannot be deleted in status `{status}`")]
    DeleteLocked {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    #[error("parcel {0} is already delivered")]
    FinalStatus(ParcelNumber),
    #[error("parcel {0} kept changing status during the address update")]
    ConcurrentUpdate(ParcelNumber),
    #[error("connection is missing required table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("table `{table}` is missing required column `{column}`")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for parcel storage.
pub trait ParcelRepository {
    /// Inserts a parcel and returns the store-assigned number.
    ///
    /// `parcel.number` is ignored.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel, failing with `NotFound` when absent.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Removes one parcel regardless of status.
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
    /// Replaces the address of a `registered` parcel.
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;
    /// Replaces the status without checking the transition.
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()>;
    /// Lists every parcel owned by `client`. Order is not part of the contract.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
}

/// SQLite-backed parcel store borrowing a caller-owned connection.
pub struct ParcelStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ParcelStore<'conn> {
    /// Wraps a connection without inspecting its schema.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking the `parcel` table layout.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the table does not exist.
    /// - `MissingRequiredColumn` for the first absent column.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_parcel_table_ready(conn)?;
        Ok(Self::new(conn))
    }

    fn stored_status(&self, number: ParcelNumber) -> RepoResult<Option<ParcelStatus>> {
        let status = self
            .conn
            .query_row(
                "SELECT status FROM parcel WHERE number = ?1;",
                [number],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        status.map(|value| parse_status(&value)).transpose()
    }
}

impl ParcelRepository for ParcelStore<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        parcel.validate()?;

        self.conn.execute(
            "INSERT INTO parcel (
                client,
                status,
                address,
                created_at
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                parcel.status.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))?;

        let mut rows = stmt.query([number])?;
        match rows.next()? {
            Some(row) => parse_parcel_row(row),
            None => Err(RepoError::NotFound(number)),
        }
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM parcel WHERE number = ?1;", [number])?;

        if changed == 0 {
            return Err(RepoError::NotFound(number));
        }

        Ok(())
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        validate_address(address)?;

        for _ in 0..ADDRESS_UPDATE_ATTEMPTS {
            let changed = self.conn.execute(
                "UPDATE parcel
                 SET address = ?1
                 WHERE number = ?2
                   AND status = ?3;",
                params![address, number, ParcelStatus::Registered.as_str()],
            )?;
            if changed > 0 {
                return Ok(());
            }

            // The status lookup is a separate statement; another writer may
            // have moved the parcel back to `registered` in between.
            if let Some(err) = address_guard_rejection(number, self.stored_status(number)?) {
                return Err(err);
            }
        }

        Err(RepoError::ConcurrentUpdate(number))
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?1 WHERE number = ?2;",
            params![status.as_str(), number],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(number));
        }

        Ok(())
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARCEL_SELECT_SQL}
             WHERE client = ?1
             ORDER BY number ASC;"
        ))?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }
}

/// Explains why the guarded address UPDATE touched no row.
///
/// Returns `None` when the stored status is `registered` again, meaning the
/// update is worth retrying.
fn address_guard_rejection(
    number: ParcelNumber,
    stored: Option<ParcelStatus>,
) -> Option<RepoError> {
    match stored {
        None => Some(RepoError::NotFound(number)),
        Some(ParcelStatus::Registered) => None,
        Some(status) => Some(RepoError::AddressLocked { number, status }),
    }
}

fn ensure_parcel_table_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, PARCEL_TABLE)? {
        return Err(RepoError::MissingRequiredTable(PARCEL_TABLE));
    }

    let present = table_columns(conn, PARCEL_TABLE)?;
    for &column in PARCEL_COLUMNS {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: PARCEL_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let number: ParcelNumber = row.get("number")?;
    if number <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid parcel number `{number}` in parcel.number"
        )));
    }

    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text)?;

    let parcel = Parcel {
        number: Some(number),
        client: row.get("client")?,
        status,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    };
    parcel.validate().map_err(|err| {
        RepoError::InvalidData(format!("parcel {number} violates model invariants: {err}"))
    })?;

    Ok(parcel)
}

fn parse_status(value: &str) -> RepoResult<ParcelStatus> {
    value.parse().map_err(|_| {
        RepoError::InvalidData(format!("invalid parcel status `{value}` in parcel.status"))
    })
}
