//! Entering payments and purchases through a submit, confirm and cancel dialog.

mod endpoints;
mod modal;
mod payment;
mod purchase;
mod state;
mod task_page;

pub use endpoints::{
    REFERENCE_DATA_CHANGED, WorkflowState, cancel_endpoint, confirm_endpoint, submit_endpoint,
};
pub use payment::{
    EnrolleeSelection, PaymentDraft, PaymentForm, PaymentId, commit_payment, create_payment_table,
};
pub use purchase::{
    ItemSelection, PurchaseDraft, PurchaseForm, PurchaseId, commit_purchase, create_purchase_table,
};
pub use state::{Action, ConfirmationWorkflow, Outcome};
pub use task_page::get_task_page;

use std::{fmt::Display, str::FromStr};

use rusqlite::Connection;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::{Month, OffsetDateTime};

use crate::{Error, endpoints as routes, session::TaskSession};

/// The two kinds of transaction that can be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Payment,
    Purchase,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Payment => "Payment",
            TransactionKind::Purchase => "Purchase",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Payment => "payment",
            TransactionKind::Purchase => "purchase",
        }
    }

    /// The ID of the element the confirmation dialog is rendered into.
    pub fn modal_id(&self) -> String {
        format!("{}-modal", self.id_prefix())
    }

    /// The ID of the hidden input holding the submit counter.
    pub fn submit_count_id(&self) -> String {
        format!("{}-submit-count", self.id_prefix())
    }

    /// The ID of the school select on this kind's form.
    pub fn school_select_id(&self) -> String {
        format!("{}-school", self.id_prefix())
    }

    pub fn submit_endpoint(&self) -> &'static str {
        match self {
            TransactionKind::Payment => routes::PAYMENT_SUBMIT,
            TransactionKind::Purchase => routes::PURCHASE_SUBMIT,
        }
    }

    pub fn confirm_endpoint(&self) -> &'static str {
        match self {
            TransactionKind::Payment => routes::PAYMENT_CONFIRM,
            TransactionKind::Purchase => routes::PURCHASE_CONFIRM,
        }
    }

    pub fn cancel_endpoint(&self) -> &'static str {
        match self {
            TransactionKind::Payment => routes::PAYMENT_CANCEL,
            TransactionKind::Purchase => routes::PURCHASE_CANCEL,
        }
    }

    /// The notification shown once a row has been written.
    pub fn success_message(&self) -> &'static str {
        match self {
            TransactionKind::Payment => "Payment successfully recorded!",
            TransactionKind::Purchase => "Purchased Item successfully recorded!",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Payment" => Ok(TransactionKind::Payment),
            "Purchase" => Ok(TransactionKind::Purchase),
            other => Err(format!("unknown transaction kind \"{other}\"")),
        }
    }
}

/// A transaction captured at submit time and held until it is confirmed.
pub trait Draft: std::fmt::Debug + Sized + Send + 'static {
    /// The form the task page posts to the submit endpoint.
    type Form: DeserializeOwned + Send;

    const KIND: TransactionKind;

    /// Validate `form` and split it into its submit counter and draft.
    fn from_form(form: Self::Form) -> Result<(u64, Self), Error>;

    /// This kind's workflow within a session.
    fn workflow(session: &mut TaskSession) -> &mut ConfirmationWorkflow<Self>;

    /// Write the draft to the database, creating any new enrollee or item first.
    fn commit(&self, created_at: OffsetDateTime, connection: &Connection) -> Result<i64, Error>;
}

impl Draft for PaymentDraft {
    type Form = PaymentForm;

    const KIND: TransactionKind = TransactionKind::Payment;

    fn from_form(form: Self::Form) -> Result<(u64, Self), Error> {
        let submit_count = validate_submit_count(form.submit_count)?;
        PaymentDraft::try_from(form).map(|draft| (submit_count, draft))
    }

    fn workflow(session: &mut TaskSession) -> &mut ConfirmationWorkflow<Self> {
        &mut session.payment
    }

    fn commit(&self, created_at: OffsetDateTime, connection: &Connection) -> Result<i64, Error> {
        commit_payment(self, created_at, connection)
    }
}

impl Draft for PurchaseDraft {
    type Form = PurchaseForm;

    const KIND: TransactionKind = TransactionKind::Purchase;

    fn from_form(form: Self::Form) -> Result<(u64, Self), Error> {
        let submit_count = validate_submit_count(form.submit_count)?;
        PurchaseDraft::try_from(form).map(|draft| (submit_count, draft))
    }

    fn workflow(session: &mut TaskSession) -> &mut ConfirmationWorkflow<Self> {
        &mut session.purchase
    }

    fn commit(&self, created_at: OffsetDateTime, connection: &Connection) -> Result<i64, Error> {
        commit_purchase(self, created_at, connection)
    }
}

/// Parse a month number from a form.
fn parse_month(month: u8) -> Result<Month, Error> {
    Month::try_from(month).map_err(|_| Error::InvalidMonth(month))
}

/// Amounts must be finite and strictly positive.
fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

/// Real clicks count up from one and can never reach the end of the counter's range.
fn validate_submit_count(submit_count: u64) -> Result<u64, Error> {
    if submit_count == 0 || submit_count == u64::MAX {
        Err(Error::InvalidSubmitCount(submit_count))
    } else {
        Ok(submit_count)
    }
}
