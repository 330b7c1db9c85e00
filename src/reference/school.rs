//! The fixed list of schools and the `school_types` table that gives them IDs.

use std::{fmt::Display, str::FromStr};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The database ID of a school.
pub type SchoolId = i64;

/// One of the schools that payments and purchases are recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum School {
    #[serde(rename = "SOML Advanced")]
    SomlAdvanced,
    #[serde(rename = "SOML Ordinary")]
    SomlOrdinary,
    #[serde(rename = "EFD & Igbaradi")]
    EfdIgbaradi,
}

impl School {
    /// Every school, in display order.
    pub const ALL: [School; 3] = [
        School::SomlAdvanced,
        School::SomlOrdinary,
        School::EfdIgbaradi,
    ];

    /// The school's name as stored in the database and shown to users.
    pub fn name(&self) -> &'static str {
        match self {
            School::SomlAdvanced => "SOML Advanced",
            School::SomlOrdinary => "SOML Ordinary",
            School::EfdIgbaradi => "EFD & Igbaradi",
        }
    }
}

impl Display for School {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for School {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        School::ALL
            .into_iter()
            .find(|school| school.name() == s)
            .ok_or_else(|| Error::UnresolvedReference(format!("school \"{s}\"")))
    }
}

/// The schools in display order.
///
/// The list is fixed rather than read from the database.
pub fn list_schools() -> &'static [School] {
    &School::ALL
}

/// Create the `school_types` table and make sure every [School] has a row.
pub fn create_school_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS school_types (
                school_id INTEGER PRIMARY KEY,
                school_name TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    let mut statement =
        connection.prepare("INSERT OR IGNORE INTO school_types (school_name) VALUES (?1)")?;
    for school in School::ALL {
        statement.execute((school.name(),))?;
    }

    Ok(())
}

/// Look up the ID of the school whose name is exactly `school_name`.
///
/// # Errors
///
/// Returns [Error::UnresolvedReference] if no school has that name.
pub fn resolve_school_id(school_name: &str, connection: &Connection) -> Result<SchoolId, Error> {
    connection
        .query_row(
            "SELECT school_id FROM school_types WHERE school_name = ?1",
            (school_name,),
            |row| row.get(0),
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::UnresolvedReference(format!("school \"{school_name}\"")),
            error => error,
        })
}
