//! Items purchased for a school.

use rusqlite::{Connection, ErrorCode};
use serde::Deserialize;
use time::{Month, OffsetDateTime};

use crate::{
    Error,
    reference::{ADD_NEW_ITEM, School, create_or_get_item},
    workflow::{parse_month, validate_amount},
};

/// The database ID of a purchase.
pub type PurchaseId = i64;

/// Create the `purchases` table.
pub fn create_purchase_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS purchases (
                purchase_id INTEGER PRIMARY KEY,
                item_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                amount REAL NOT NULL,
                school_id INTEGER NOT NULL,
                month_paid TEXT NOT NULL,
                year_paid INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(item_id) REFERENCES items(item_id)
                    ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(school_id) REFERENCES school_types(school_id)
                    ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    Ok(())
}

/// The form data for submitting a purchase.
#[derive(Debug, Deserialize)]
pub struct PurchaseForm {
    pub submit_count: u64,
    pub school: School,
    /// An item name or [ADD_NEW_ITEM].
    pub item: String,
    #[serde(default)]
    pub new_item_name: String,
    pub quantity: i64,
    pub amount: f64,
    pub month: u8,
    pub year: i32,
}

/// What was purchased.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSelection {
    Existing(String),
    /// An item to be created when the purchase is confirmed.
    New(String),
}

impl ItemSelection {
    fn name(&self) -> &str {
        match self {
            ItemSelection::Existing(name) | ItemSelection::New(name) => name,
        }
    }
}

/// A validated purchase waiting for confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseDraft {
    pub item: ItemSelection,
    pub quantity: i64,
    pub amount: f64,
    pub school: School,
    pub month: Month,
    pub year: i32,
}

impl TryFrom<PurchaseForm> for PurchaseDraft {
    type Error = Error;

    fn try_from(form: PurchaseForm) -> Result<Self, Self::Error> {
        let item = if form.item == ADD_NEW_ITEM {
            match form.new_item_name.trim() {
                "" => return Err(Error::EmptyName),
                name => ItemSelection::New(name.to_owned()),
            }
        } else if form.item.trim().is_empty() {
            return Err(Error::EmptyName);
        } else {
            ItemSelection::Existing(form.item)
        };

        if form.quantity < 1 {
            return Err(Error::InvalidQuantity(form.quantity));
        }

        Ok(Self {
            item,
            quantity: form.quantity,
            amount: validate_amount(form.amount)?,
            school: form.school,
            month: parse_month(form.month)?,
            year: form.year,
        })
    }
}

/// Write `draft` to the `purchases` table.
///
/// A new item is created first. The item and school IDs are looked up by
/// name inside the insert, so if either name is unknown the insert fails as a
/// whole.
///
/// # Errors
///
/// Returns [Error::UnresolvedReference] if the item or school does not exist,
/// or another [Error] if the database could not be written.
pub fn commit_purchase(
    draft: &PurchaseDraft,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<PurchaseId, Error> {
    let transaction = connection.unchecked_transaction()?;

    if let ItemSelection::New(name) = &draft.item {
        create_or_get_item(name, &transaction)?;
    }

    transaction
        .execute(
            "INSERT INTO purchases
                (item_id, quantity, amount, school_id, month_paid, year_paid, created_at)
            VALUES (
                (SELECT item_id FROM items WHERE item_name = ?1),
                ?2,
                ?3,
                (SELECT school_id FROM school_types WHERE school_name = ?4),
                ?5,
                ?6,
                ?7
            )",
            (
                draft.item.name(),
                draft.quantity,
                draft.amount,
                draft.school.name(),
                draft.month.to_string(),
                draft.year,
                created_at,
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(ref sql_error, _)
                if sql_error.code == ErrorCode::ConstraintViolation =>
            {
                Error::UnresolvedReference(format!(
                    "item \"{}\" at {}",
                    draft.item.name(),
                    draft.school
                ))
            }
            error => error.into(),
        })?;
    let purchase_id = transaction.last_insert_rowid();

    transaction.commit()?;

    Ok(purchase_id)
}
