//! Access to the application's SQLite database.
//!
//! Every operation opens its own [Connection] through [Database::connect] and
//! drops it when the operation returns, so a connection is released on every
//! exit path, including early returns and errors.

use rusqlite::{Connection, OpenFlags};

use crate::{
    Error,
    auth::create_user_table,
    reference::{create_enrollee_table, create_item_table, create_school_table},
    workflow::{create_payment_table, create_purchase_table},
};

/// Knows where the database lives and how to open a connection to it.
#[derive(Debug, Clone)]
pub struct Database {
    location: String,
    flags: OpenFlags,
}

impl Database {
    /// A database stored in the file at `path`.
    pub fn new(path: &str) -> Self {
        Self {
            location: path.to_owned(),
            flags: OpenFlags::default(),
        }
    }

    /// An in-memory database shared by every connection opened with the same `name`.
    ///
    /// The database is deleted once the last connection to it closes, so the
    /// caller must hold a connection open for as long as the data is needed.
    #[cfg(test)]
    pub fn shared_memory(name: &str) -> Self {
        Self {
            location: format!("file:{name}?mode=memory&cache=shared"),
            flags: OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        }
    }

    /// Open a fresh connection with foreign keys enforced.
    ///
    /// # Errors
    ///
    /// Returns [Error::ConnectionError] if the database could not be opened.
    pub fn connect(&self) -> Result<Connection, Error> {
        tracing::debug!("Opening database connection to {}", self.location);

        let connection = Connection::open_with_flags(&self.location, self.flags)
            .map_err(|error| Error::ConnectionError(error.to_string()))?;
        connection
            .pragma_update(None, "foreign_keys", "ON")
            .map_err(|error| Error::ConnectionError(error.to_string()))?;

        Ok(connection)
    }
}

/// Create all of the database tables for the application and seed the
/// fixed list of schools.
///
/// # Errors
/// This function may return a [rusqlite::Error] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_school_table(&transaction)?;
    create_enrollee_table(&transaction)?;
    create_item_table(&transaction)?;
    create_payment_table(&transaction)?;
    create_purchase_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
