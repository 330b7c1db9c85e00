//! Items: the things a school purchases.

use rusqlite::{Connection, OptionalExtension};

use crate::{Error, reference::Choice};

/// The database ID of an item.
pub type ItemId = i64;

/// Create the `items` table.
pub fn create_item_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS items (
                item_id INTEGER PRIMARY KEY,
                item_name TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// The item names ordered alphabetically, followed by the "add new" sentinel.
pub fn list_items(connection: &Connection) -> Result<Vec<Choice<String>>, Error> {
    let mut statement = connection.prepare("SELECT item_name FROM items ORDER BY item_name")?;

    let mut items = statement
        .query_map((), |row| row.get(0).map(Choice::Existing))?
        .collect::<Result<Vec<_>, _>>()?;

    items.push(Choice::AddNew);

    Ok(items)
}

/// Get the ID of the item called `item_name`, creating it if needed.
///
/// # Errors
///
/// Returns [Error::EmptyName] if the trimmed name is empty.
pub fn create_or_get_item(item_name: &str, connection: &Connection) -> Result<ItemId, Error> {
    let item_name = item_name.trim();

    if item_name.is_empty() {
        return Err(Error::EmptyName);
    }

    let existing = connection
        .query_row(
            "SELECT item_id FROM items WHERE item_name = ?1",
            (item_name,),
            |row| row.get(0),
        )
        .optional()?;

    if let Some(item_id) = existing {
        return Ok(item_id);
    }

    connection.execute("INSERT INTO items (item_name) VALUES (?1)", (item_name,))?;
    tracing::info!("Created item \"{item_name}\"");

    Ok(connection.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use crate::{Error, reference::Choice, test_utils::get_test_database};

    use super::{create_or_get_item, list_items};

    #[test]
    fn empty_table_lists_only_sentinel() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();

        let items = list_items(&connection).unwrap();

        assert_eq!(items, [Choice::AddNew]);
    }

    #[test]
    fn items_are_sorted_by_name() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();
        create_or_get_item("Textbook", &connection).unwrap();
        create_or_get_item("Chalk", &connection).unwrap();

        let items = list_items(&connection).unwrap();

        assert_eq!(
            items,
            [
                Choice::Existing("Chalk".to_owned()),
                Choice::Existing("Textbook".to_owned()),
                Choice::AddNew
            ]
        );
    }

    #[test]
    fn create_or_get_is_idempotent() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();

        let first = create_or_get_item("Chalk", &connection).unwrap();
        let second = create_or_get_item("Chalk ", &connection).unwrap();

        assert_eq!(first, second);
        assert_eq!(list_items(&connection).unwrap().len(), 2);
    }

    #[test]
    fn blank_item_name_is_rejected() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();

        assert_eq!(create_or_get_item("   ", &connection), Err(Error::EmptyName));
    }
}
