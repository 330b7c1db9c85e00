//! Fee payments made for an enrollee.

use rusqlite::Connection;
use serde::Deserialize;
use time::{Month, OffsetDateTime};

use crate::{
    Error,
    reference::{
        ADD_NEW_ENROLLEE, FeeType, School, create_or_get_enrollee, resolve_enrollee_id,
        resolve_school_id,
    },
    workflow::{parse_month, validate_amount},
};

/// The database ID of a payment.
pub type PaymentId = i64;

/// Create the `payments` table.
pub fn create_payment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payments (
                payment_id INTEGER PRIMARY KEY,
                enrollee_id INTEGER NOT NULL,
                fee_type TEXT NOT NULL,
                amount REAL NOT NULL,
                month_paid TEXT NOT NULL,
                year_paid INTEGER NOT NULL,
                school_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(enrollee_id) REFERENCES enrollees(enrollee_id)
                    ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(school_id) REFERENCES school_types(school_id)
                    ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    Ok(())
}

/// The form data for submitting a payment.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub submit_count: u64,
    pub school: School,
    /// An enrollee's display name or [ADD_NEW_ENROLLEE].
    pub enrollee: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub fee_type: FeeType,
    pub amount: f64,
    pub month: u8,
    pub year: i32,
}

/// Who a payment is for.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrolleeSelection {
    /// An enrollee chosen from the list, by display name.
    Existing(String),
    /// An enrollee to be created when the payment is confirmed.
    New { first_name: String, last_name: String },
}

/// A validated payment waiting for confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub enrollee: EnrolleeSelection,
    pub school: School,
    pub fee_type: FeeType,
    pub amount: f64,
    pub month: Month,
    pub year: i32,
}

impl TryFrom<PaymentForm> for PaymentDraft {
    type Error = Error;

    fn try_from(form: PaymentForm) -> Result<Self, Self::Error> {
        let enrollee = if form.enrollee == ADD_NEW_ENROLLEE {
            let first_name = form.first_name.trim();
            let last_name = form.last_name.trim();

            if first_name.is_empty() || last_name.is_empty() {
                return Err(Error::EmptyName);
            }

            EnrolleeSelection::New {
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
            }
        } else if form.enrollee.trim().is_empty() {
            return Err(Error::EmptyName);
        } else {
            EnrolleeSelection::Existing(form.enrollee)
        };

        Ok(Self {
            enrollee,
            school: form.school,
            fee_type: form.fee_type,
            amount: validate_amount(form.amount)?,
            month: parse_month(form.month)?,
            year: form.year,
        })
    }
}

/// Write `draft` to the `payments` table.
///
/// A new enrollee is created (or an existing one with the same name and
/// school reused) first. The enrollee and school are then resolved to IDs, and
/// nothing is written unless both resolve.
///
/// # Errors
///
/// Returns [Error::UnresolvedReference] if the enrollee or school does not
/// exist, or another [Error] if the database could not be written.
pub fn commit_payment(
    draft: &PaymentDraft,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<PaymentId, Error> {
    let transaction = connection.unchecked_transaction()?;

    let enrollee_id = match &draft.enrollee {
        EnrolleeSelection::Existing(full_name) => {
            resolve_enrollee_id(full_name, draft.school, &transaction)?
        }
        EnrolleeSelection::New {
            first_name,
            last_name,
        } => create_or_get_enrollee(first_name, last_name, draft.school, &transaction)?,
    };
    let school_id = resolve_school_id(draft.school.name(), &transaction)?;

    transaction.execute(
        "INSERT INTO payments
            (enrollee_id, fee_type, amount, month_paid, year_paid, school_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            enrollee_id,
            draft.fee_type.as_str(),
            draft.amount,
            draft.month.to_string(),
            draft.year,
            school_id,
            created_at,
        ),
    )?;
    let payment_id = transaction.last_insert_rowid();

    transaction.commit()?;

    Ok(payment_id)
}
