//! Enrollees: the students that payments are recorded against.

use rusqlite::{Connection, OptionalExtension};

use crate::{
    Error,
    reference::{ADD_NEW_ENROLLEE_LABEL, Choice, School},
};

/// The database ID of an enrollee.
pub type EnrolleeId = i64;

/// Create the `enrollees` table.
pub fn create_enrollee_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS enrollees (
                enrollee_id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                school_name TEXT NOT NULL,
                FOREIGN KEY(school_name) REFERENCES school_types(school_name)
                    ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    Ok(())
}

/// The enrollee choices for a select input, ordered by display name and
/// followed by the "add new" sentinel.
///
/// The display name is "first last". When `school` is given, only enrollees
/// of that school are listed.
///
/// # Errors
///
/// Returns an error if the query fails. Callers decide how to present a
/// failed refresh.
pub fn list_enrollees(
    school: Option<School>,
    connection: &Connection,
) -> Result<Vec<(String, Choice<EnrolleeId>)>, Error> {
    let mut statement = connection.prepare(
        "SELECT first_name || ' ' || last_name AS name, enrollee_id
        FROM enrollees
        WHERE ?1 IS NULL OR school_name = ?1
        ORDER BY name, enrollee_id",
    )?;

    let mut choices = statement
        .query_map((school.map(|school| school.name()),), |row| {
            Ok((row.get(0)?, Choice::Existing(row.get(1)?)))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    choices.push((ADD_NEW_ENROLLEE_LABEL.to_owned(), Choice::AddNew));

    Ok(choices)
}

/// Look up the enrollee whose full name is exactly `full_name` at `school`.
///
/// # Errors
///
/// Returns [Error::UnresolvedReference] if there is no such enrollee.
pub fn resolve_enrollee_id(
    full_name: &str,
    school: School,
    connection: &Connection,
) -> Result<EnrolleeId, Error> {
    connection
        .query_row(
            "SELECT enrollee_id FROM enrollees
            WHERE first_name || ' ' || last_name = ?1 AND school_name = ?2
            ORDER BY enrollee_id
            LIMIT 1",
            (full_name, school.name()),
            |row| row.get(0),
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => {
                Error::UnresolvedReference(format!("enrollee \"{full_name}\" at {school}"))
            }
            error => error,
        })
}

/// Get the ID of the enrollee with this name at `school`, creating them if needed.
///
/// Names are trimmed before use.
///
/// # Errors
///
/// Returns [Error::EmptyName] if either name is blank.
pub fn create_or_get_enrollee(
    first_name: &str,
    last_name: &str,
    school: School,
    connection: &Connection,
) -> Result<EnrolleeId, Error> {
    let first_name = first_name.trim();
    let last_name = last_name.trim();

    if first_name.is_empty() || last_name.is_empty() {
        return Err(Error::EmptyName);
    }

    let existing = connection
        .query_row(
            "SELECT enrollee_id FROM enrollees
            WHERE first_name = ?1 AND last_name = ?2 AND school_name = ?3",
            (first_name, last_name, school.name()),
            |row| row.get(0),
        )
        .optional()?;

    if let Some(enrollee_id) = existing {
        return Ok(enrollee_id);
    }

    connection.execute(
        "INSERT INTO enrollees (first_name, last_name, school_name) VALUES (?1, ?2, ?3)",
        (first_name, last_name, school.name()),
    )?;
    tracing::info!("Created enrollee \"{first_name} {last_name}\" at {school}");

    Ok(connection.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        reference::{Choice, School},
        test_utils::get_test_database,
    };

    use super::{create_or_get_enrollee, list_enrollees, resolve_enrollee_id};

    #[test]
    fn list_is_sorted_and_ends_with_sentinel() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();
        create_or_get_enrollee("Tunde", "Bello", School::SomlAdvanced, &connection).unwrap();
        create_or_get_enrollee("Ada", "Obi", School::SomlAdvanced, &connection).unwrap();

        let choices = list_enrollees(None, &connection).unwrap();

        let names: Vec<_> = choices.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["Ada Obi", "Tunde Bello", "➕ Add new enrollee..."]);
        assert_eq!(choices.last().unwrap().1, Choice::AddNew);
    }

    #[test]
    fn list_filters_by_school() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();
        let ada = create_or_get_enrollee("Ada", "Obi", School::SomlAdvanced, &connection).unwrap();
        create_or_get_enrollee("Tunde", "Bello", School::EfdIgbaradi, &connection).unwrap();

        let choices = list_enrollees(Some(School::SomlAdvanced), &connection).unwrap();

        assert_eq!(
            choices,
            [
                ("Ada Obi".to_owned(), Choice::Existing(ada)),
                ("➕ Add new enrollee...".to_owned(), Choice::AddNew)
            ]
        );
    }

    #[test]
    fn create_or_get_reuses_existing_enrollee() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();

        let first = create_or_get_enrollee("Ada", "Obi", School::SomlOrdinary, &connection).unwrap();
        let second =
            create_or_get_enrollee(" Ada ", "Obi", School::SomlOrdinary, &connection).unwrap();
        let other_school =
            create_or_get_enrollee("Ada", "Obi", School::SomlAdvanced, &connection).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other_school);
    }

    #[test]
    fn blank_names_are_rejected() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();

        let result = create_or_get_enrollee("Ada", "  ", School::SomlOrdinary, &connection);

        assert_eq!(result, Err(Error::EmptyName));
    }

    #[test]
    fn resolves_by_full_name_and_school() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();
        let ada = create_or_get_enrollee("Ada", "Obi", School::SomlOrdinary, &connection).unwrap();

        assert_eq!(
            resolve_enrollee_id("Ada Obi", School::SomlOrdinary, &connection),
            Ok(ada)
        );
        assert!(matches!(
            resolve_enrollee_id("Ada Obi", School::SomlAdvanced, &connection),
            Err(Error::UnresolvedReference(_))
        ));
    }
}
