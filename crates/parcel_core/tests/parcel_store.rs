mod support;

use parcel_core::db::open_db_in_memory;
use parcel_core::{
    Parcel, ParcelRepository, ParcelStatus, ParcelStore, ParcelValidationError, RepoError,
};
use rusqlite::Connection;
use std::collections::HashSet;
use support::{test_parcel, ClientIdSource, SeededClientIds, FIXED_CREATED_AT};

#[test]
fn add_get_delete_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::try_new(&conn).unwrap();
    let mut parcel = test_parcel();

    let id = store.add(&parcel).unwrap();
    assert!(id > 0);
    parcel.number = Some(id);

    let loaded = store.get(id).unwrap();
    assert_eq!(loaded, parcel);

    store.delete(id).unwrap();
    let err = store.get(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn add_ignores_caller_supplied_number() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let mut parcel = test_parcel();
    parcel.number = Some(4242);
    let id = store.add(&parcel).unwrap();

    assert_ne!(id, 4242);
    assert!(matches!(store.get(4242), Err(RepoError::NotFound(4242))));
}

#[test]
fn numbers_are_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let first = store.add(&test_parcel()).unwrap();
    store.delete(first).unwrap();
    let second = store.add(&test_parcel()).unwrap();

    assert!(second > first);
}

#[test]
fn get_unknown_number_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    assert!(matches!(store.get(1), Err(RepoError::NotFound(1))));
}

#[test]
fn delete_unknown_number_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    assert!(matches!(store.delete(77), Err(RepoError::NotFound(77))));
}

#[test]
fn delete_ignores_status() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let id = store.add(&test_parcel()).unwrap();
    store.set_status(id, ParcelStatus::Delivered).unwrap();

    store.delete(id).unwrap();
    assert!(matches!(store.get(id), Err(RepoError::NotFound(_))));
}

#[test]
fn set_address_updates_only_address() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);
    let mut parcel = test_parcel();
    let id = store.add(&parcel).unwrap();
    parcel.number = Some(id);

    store.set_address(id, "new test address").unwrap();

    let loaded = store.get(id).unwrap();
    assert_eq!(loaded.address, "new test address");
    parcel.address = "new test address".to_string();
    assert_eq!(loaded, parcel);
}

#[test]
fn set_address_is_rejected_after_parcel_is_sent() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);
    let id = store.add(&test_parcel()).unwrap();
    store.set_status(id, ParcelStatus::Sent).unwrap();

    let err = store.set_address(id, "too late").unwrap_err();
    assert!(matches!(
        err,
        RepoError::AddressLocked {
            number,
            status: ParcelStatus::Sent,
        } if number == id
    ));
    assert_eq!(store.get(id).unwrap().address, "test");
}

#[test]
fn set_address_on_unknown_number_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let err = store.set_address(9, "nowhere").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(9)));
}

#[test]
fn set_address_rejects_blank_address_before_touching_storage() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);
    let id = store.add(&test_parcel()).unwrap();

    let err = store.set_address(id, "   ").unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ParcelValidationError::BlankAddress)
    ));
    assert_eq!(store.get(id).unwrap().address, "test");
}

#[test]
fn set_status_updates_only_status() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);
    let mut parcel = test_parcel();
    let id = store.add(&parcel).unwrap();
    parcel.number = Some(id);

    store.set_status(id, ParcelStatus::Sent).unwrap();

    let loaded = store.get(id).unwrap();
    assert_eq!(loaded.status, ParcelStatus::Sent);
    parcel.status = ParcelStatus::Sent;
    assert_eq!(loaded, parcel);
}

#[test]
fn set_status_allows_backward_moves() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);
    let id = store.add(&test_parcel()).unwrap();

    store.set_status(id, ParcelStatus::Delivered).unwrap();
    store.set_status(id, ParcelStatus::Registered).unwrap();

    assert_eq!(store.get(id).unwrap().status, ParcelStatus::Registered);
}

#[test]
fn set_status_on_unknown_number_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let err = store.set_status(3, ParcelStatus::Sent).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(3)));
}

#[test]
fn get_by_client_returns_exactly_that_clients_parcels() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);
    let mut ids = SeededClientIds::new(20240101);
    let client = ids.next_client();
    let other_client = loop {
        let candidate = ids.next_client();
        if candidate != client {
            break candidate;
        }
    };

    let mut expected = HashSet::new();
    for _ in 0..3 {
        let mut parcel = test_parcel();
        parcel.client = client;
        let id = store.add(&parcel).unwrap();
        assert!(id > 0);
        parcel.number = Some(id);
        expected.insert(parcel);
    }

    let mut foreign = test_parcel();
    foreign.client = other_client;
    store.add(&foreign).unwrap();

    let stored = store.get_by_client(client).unwrap();
    assert_eq!(stored.len(), expected.len());
    let stored: HashSet<Parcel> = stored.into_iter().collect();
    assert_eq!(stored, expected);
}

#[test]
fn get_by_client_skips_deleted_parcels() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let kept = store.add(&test_parcel()).unwrap();
    let removed = store.add(&test_parcel()).unwrap();
    store.delete(removed).unwrap();

    let numbers: Vec<_> = store
        .get_by_client(1000)
        .unwrap()
        .into_iter()
        .filter_map(|parcel| parcel.number)
        .collect();
    assert_eq!(numbers, vec![kept]);
}

#[test]
fn get_by_unknown_client_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    assert!(store.get_by_client(123_456).unwrap().is_empty());
}

#[test]
fn add_rejects_invalid_parcels() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let blank = Parcel::with_created_at(1, "", FIXED_CREATED_AT);
    assert!(matches!(
        store.add(&blank),
        Err(RepoError::Validation(ParcelValidationError::BlankAddress))
    ));

    let bad_time = Parcel::with_created_at(1, "street", "yesterday");
    assert!(matches!(
        store.add(&bad_time),
        Err(RepoError::Validation(ParcelValidationError::InvalidCreatedAt(_)))
    ));

    assert!(store.get_by_client(1).unwrap().is_empty());
}

#[test]
fn corrupt_status_row_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);
    let id = store.add(&test_parcel()).unwrap();

    conn.execute("UPDATE parcel SET status = 'lost' WHERE number = ?1;", [id])
        .unwrap();

    let err = store.get(id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("lost")));
}

#[test]
fn persistence_failures_surface_as_db_errors() {
    let conn = Connection::open_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let err = store.add(&test_parcel()).unwrap_err();
    match err {
        RepoError::Db(db_err) => {
            assert!(db_err.to_string().contains("no such table"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn wrapped_errors_do_not_repeat_their_message_in_the_source_chain() {
    let conn = Connection::open_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let db_err = store.add(&test_parcel()).unwrap_err();
    let validation_err = ParcelStore::new(&conn).set_address(1, " ").unwrap_err();

    for err in [db_err, validation_err] {
        let chain = error_chain(&err);
        for pair in chain.windows(2) {
            assert_ne!(pair[0], pair[1], "repeated message in chain {chain:?}");
        }
    }
}

#[test]
fn negative_client_round_trips_through_store() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);
    let mut parcel = Parcel::with_created_at(-5, "test", FIXED_CREATED_AT);

    let id = store.add(&parcel).unwrap();
    parcel.number = Some(id);

    assert_eq!(store.get(id).unwrap(), parcel);
    assert_eq!(store.get_by_client(-5).unwrap(), vec![parcel]);
}

#[test]
fn add_rejects_non_utc_created_at() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::new(&conn);

    let shifted = Parcel::with_created_at(1, "street", "2024-01-01T03:00:00+03:00");
    assert!(matches!(
        store.add(&shifted),
        Err(RepoError::Validation(ParcelValidationError::InvalidCreatedAt(_)))
    ));
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut messages = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        messages.push(cause.to_string());
        current = cause.source();
    }
    messages
}

#[test]
fn try_new_rejects_connection_without_parcel_table() {
    let conn = Connection::open_in_memory().unwrap();

    let result = ParcelStore::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("parcel"))
    ));
}

#[test]
fn try_new_rejects_parcel_table_missing_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER PRIMARY KEY AUTOINCREMENT,
            client INTEGER NOT NULL,
            status TEXT NOT NULL,
            address TEXT NOT NULL
        );",
    )
    .unwrap();

    let result = ParcelStore::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "parcel",
            column: "created_at"
        })
    ));
}

#[test]
fn tracker_scenario_add_mutate_delete() {
    let conn = open_db_in_memory().unwrap();
    let store = ParcelStore::try_new(&conn).unwrap();

    let id = store.add(&test_parcel()).unwrap();
    assert!(id > 0);
    let loaded = store.get(id).unwrap();
    assert_eq!(loaded.client, 1000);
    assert_eq!(loaded.status, ParcelStatus::Registered);
    assert_eq!(loaded.address, "test");
    assert_eq!(loaded.created_at, FIXED_CREATED_AT);
    assert_eq!(loaded.number, Some(id));

    store.set_address(id, "new test address").unwrap();
    assert_eq!(store.get(id).unwrap().address, "new test address");

    store.set_status(id, ParcelStatus::Sent).unwrap();
    assert_eq!(store.get(id).unwrap().status, ParcelStatus::Sent);

    store.delete(id).unwrap();
    assert!(store.get(id).is_err());
}
