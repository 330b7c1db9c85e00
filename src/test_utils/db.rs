use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{Database, initialize};

/// A shared in-memory database that lives as long as this value.
pub(crate) struct TestDatabase {
    pub(crate) database: Database,
    _keep_alive: Connection,
}

/// Create an initialized, empty database that no other test can see.
pub(crate) fn get_test_database() -> TestDatabase {
    let database = Database::shared_memory(&Uuid::new_v4().simple().to_string());
    let keep_alive = database
        .connect()
        .expect("Could not open in-memory SQLite database");
    initialize(&keep_alive).expect("Could not initialize database");

    TestDatabase {
        database,
        _keep_alive: keep_alive,
    }
}
