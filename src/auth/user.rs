//! Code for creating the users table, fetching users and checking credentials.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// Users are created by the `create_user` binary, the web app only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the users table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DuplicateUsername] if `username` is taken, or a
/// [Error::SqlError] if another SQL related error occurred.
pub fn create_user(
    username: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
        (username, password_hash.as_ref()),
    )?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        username: username.to_owned(),
        password_hash,
    })
}

/// Get the user whose username exactly matches `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such user.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password_hash FROM users WHERE username = :username")?
        .query_row(&[(":username", username)], |row| {
            let raw_password_hash: String = row.get(2)?;

            Ok(User {
                id: UserID::new(row.get(0)?),
                username: row.get(1)?,
                password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            })
        })
        .map_err(|error| error.into())
}

/// Check `password` against the stored hash for `username`.
///
/// Every failure, whether an unknown username, a wrong password or an error
/// reading the user, is reported as [Error::InvalidCredentials]. The actual
/// cause is only written to the log.
pub fn authenticate(username: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    let user = get_user_by_username(username, connection).map_err(|error| {
        match error {
            Error::NotFound => tracing::warn!("Log-in attempt for unknown user \"{username}\""),
            error => tracing::error!("Could not look up user \"{username}\": {error}"),
        }
        Error::InvalidCredentials
    })?;

    match user.password_hash.verify(password) {
        Ok(true) => Ok(user),
        Ok(false) => {
            tracing::warn!("Incorrect password for user \"{username}\"");
            Err(Error::InvalidCredentials)
        }
        Err(error) => {
            tracing::error!("Could not verify password for user \"{username}\": {error}");
            Err(Error::InvalidCredentials)
        }
    }
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM users;", [], |row| row.get(0))
        .map_err(|error| error.into())
}
