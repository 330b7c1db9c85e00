//! Route handlers that drive a session's [ConfirmationWorkflow] from the task page.
//!
//! The handlers are generic over the [Draft] kind, so payments and purchases
//! share one implementation and only differ in their form and commit step.

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HX_TRIGGER;
use maud::html;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    alert::Alert,
    db::Database,
    session::{SessionId, SessionStore},
    workflow::{
        Action, ConfirmationWorkflow, Draft, Outcome,
        modal::{confirmation_modal, submit_count_input},
    },
};

/// The client-side event that asks the enrollee and item selects to reload.
pub const REFERENCE_DATA_CHANGED: &str = "reference-data-changed";

/// The state needed to submit, confirm and cancel transactions.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub database: Database,
    pub sessions: SessionStore,
}

impl FromRef<AppState> for WorkflowState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            database: state.database.clone(),
            sessions: state.sessions.clone(),
        }
    }
}

/// The form data sent by the confirm button.
#[derive(Debug, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm_count: u64,
}

/// Dispatch `action` to the `D` workflow of the session and return the outcome
/// together with the counter the next real submit must carry.
fn dispatch<D: Draft>(
    sessions: &SessionStore,
    session_id: SessionId,
    action: Action<D>,
) -> Result<(Outcome<D>, u64), Error> {
    sessions.with_session(session_id, |session| {
        let workflow: &mut ConfirmationWorkflow<D> = D::workflow(session);
        let outcome = workflow.dispatch(action);

        (outcome, workflow.next_submit_count())
    })
}

/// A route handler that validates a submitted form and opens the confirmation dialog.
///
/// Duplicate submits, and submits made while the dialog is already open, get
/// `204 No Content` so the page is left as it is.
pub async fn submit_endpoint<D: Draft>(
    State(state): State<WorkflowState>,
    Extension(session_id): Extension<SessionId>,
    Form(form): Form<D::Form>,
) -> Response {
    let (submit_count, draft) = match D::from_form(form) {
        Ok(submission) => submission,
        Err(error) => {
            tracing::debug!("Rejected {} form: {error}", D::KIND);
            return error.into_alert_response();
        }
    };

    let action = Action::Submit {
        submit_count,
        draft,
    };

    match dispatch(&state.sessions, session_id, action) {
        Ok((Outcome::AwaitingConfirmation, _)) => confirmation_modal(D::KIND).into_response(),
        Ok(_) => {
            tracing::debug!("Ignored {} submit #{submit_count}", D::KIND);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler that commits the draft awaiting confirmation.
///
/// The dialog is always removed and the submit counter re-armed. A success
/// notification is only shown when a row was written; a draft whose names do
/// not resolve is dropped and logged.
pub async fn confirm_endpoint<D: Draft>(
    State(state): State<WorkflowState>,
    Extension(session_id): Extension<SessionId>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    let action = Action::Confirm {
        confirm_count: form.confirm_count,
    };

    let (draft, next_submit_count) = match dispatch::<D>(&state.sessions, session_id, action) {
        Ok((Outcome::Commit(draft), next_submit_count)) => (draft, next_submit_count),
        Ok(_) => return StatusCode::NO_CONTENT.into_response(),
        Err(error) => return error.into_alert_response(),
    };

    let committed = state
        .database
        .connect()
        .and_then(|connection| draft.commit(OffsetDateTime::now_utc(), &connection));
    let counter = submit_count_input(D::KIND, next_submit_count, true);

    match committed {
        Ok(id) => {
            tracing::info!("Recorded {} {id}", D::KIND);
            let alert = Alert::SuccessSimple {
                message: D::KIND.success_message().to_owned(),
            };

            (
                [(HX_TRIGGER, REFERENCE_DATA_CHANGED)],
                html! {
                    (counter)
                    (alert.into_oob_markup())
                },
            )
                .into_response()
        }
        Err(error @ Error::ConnectionError(_)) => {
            tracing::error!("Could not record {} {draft:?}: {error}", D::KIND);
            let (_, alert) = error.into_alert();

            html! {
                (counter)
                (alert.into_oob_markup())
            }
            .into_response()
        }
        Err(error) => {
            tracing::error!("Could not record {} {draft:?}: {error}", D::KIND);
            counter.into_response()
        }
    }
}

/// A route handler that discards the draft awaiting confirmation.
pub async fn cancel_endpoint<D: Draft>(
    State(state): State<WorkflowState>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    match dispatch::<D>(&state.sessions, session_id, Action::Cancel) {
        Ok((Outcome::Cancelled, next_submit_count)) => {
            tracing::debug!("Cancelled {} submission", D::KIND);
            submit_count_input(D::KIND, next_submit_count, true).into_response()
        }
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Extension, Form, extract::State, http::StatusCode, response::Response};
    use axum_htmx::HX_TRIGGER;
    use rusqlite::Connection;
    use scraper::{Html, Selector};

    use crate::{
        reference::{ADD_NEW_ITEM, FeeType, School, create_or_get_enrollee, create_or_get_item},
        session::{SessionId, SessionStore},
        test_utils::{TestDatabase, get_test_database, parse_html_fragment},
        workflow::{PaymentDraft, PaymentForm, PurchaseDraft, PurchaseForm},
    };

    use super::{
        ConfirmForm, REFERENCE_DATA_CHANGED, WorkflowState, cancel_endpoint, confirm_endpoint,
        submit_endpoint,
    };

    fn get_state() -> (TestDatabase, WorkflowState) {
        let test_db = get_test_database();
        let state = WorkflowState {
            database: test_db.database.clone(),
            sessions: SessionStore::default(),
        };

        (test_db, state)
    }

    fn payment_form(submit_count: u64, enrollee: &str) -> PaymentForm {
        PaymentForm {
            submit_count,
            school: School::SomlAdvanced,
            enrollee: enrollee.to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            fee_type: FeeType::Registration,
            amount: 15_000.0,
            month: 1,
            year: 2025,
        }
    }

    fn purchase_form(submit_count: u64, item: &str) -> PurchaseForm {
        PurchaseForm {
            submit_count,
            school: School::SomlOrdinary,
            item: item.to_owned(),
            new_item_name: String::new(),
            quantity: 3,
            amount: 900.0,
            month: 2,
            year: 2025,
        }
    }

    async fn submit_payment(state: &WorkflowState, session_id: SessionId, form: PaymentForm) -> Response {
        submit_endpoint::<PaymentDraft>(State(state.clone()), Extension(session_id), Form(form)).await
    }

    async fn confirm_payment(state: &WorkflowState, session_id: SessionId) -> Response {
        confirm_endpoint::<PaymentDraft>(
            State(state.clone()),
            Extension(session_id),
            Form(ConfirmForm { confirm_count: 1 }),
        )
        .await
    }

    fn count_rows(connection: &Connection, table: &str) -> i64 {
        connection
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[track_caller]
    fn assert_counter(html: &Html, id: &str, want: &str) {
        let input = html
            .select(&Selector::parse(&format!("input#{id}")).unwrap())
            .next()
            .expect("No submit counter in response");
        assert_eq!(input.value().attr("value"), Some(want));
    }

    fn alert_text(html: &Html) -> String {
        html.select(&Selector::parse("#alert-container").unwrap())
            .flat_map(|container| container.text())
            .collect()
    }

    #[tokio::test]
    async fn submit_shows_confirmation_dialog() {
        let (_test_db, state) = get_state();

        let response = submit_payment(&state, SessionId::new(), payment_form(1, "Ada Obi")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Confirm Submission"), "got {text:?}");
    }

    #[tokio::test]
    async fn invalid_submit_shows_error_and_keeps_workflow_idle() {
        let (_test_db, state) = get_state();
        let session_id = SessionId::new();
        let mut form = payment_form(1, "Ada Obi");
        form.amount = -1.0;

        let response = submit_payment(&state, session_id, form).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = submit_payment(&state, session_id, payment_form(1, "Ada Obi")).await;
        assert_eq!(response.status(), StatusCode::OK, "counter should not be consumed");
    }

    #[tokio::test]
    async fn counter_at_end_of_range_is_rejected_and_store_stays_usable() {
        let (_test_db, state) = get_state();
        let session_id = SessionId::new();

        let response = submit_payment(&state, session_id, payment_form(u64::MAX, "Ada Obi")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert!(alert_text(&html).contains("Invalid form"));
        let response = submit_payment(&state, session_id, payment_form(1, "Ada Obi")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = submit_payment(&state, SessionId::new(), payment_form(1, "Ada Obi")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_submits_then_confirm_insert_one_row() {
        let (test_db, state) = get_state();
        let connection = test_db.database.connect().unwrap();
        create_or_get_enrollee("Ada", "Obi", School::SomlAdvanced, &connection).unwrap();
        let session_id = SessionId::new();

        let first = submit_payment(&state, session_id, payment_form(1, "Ada Obi")).await;
        assert_eq!(first.status(), StatusCode::OK);
        for _ in 0..4 {
            let duplicate = submit_payment(&state, session_id, payment_form(1, "Ada Obi")).await;
            assert_eq!(duplicate.status(), StatusCode::NO_CONTENT);
        }

        let response = confirm_payment(&state, session_id).await;
        let second_confirm = confirm_payment(&state, session_id).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(HX_TRIGGER).unwrap(),
            REFERENCE_DATA_CHANGED
        );
        let html = parse_html_fragment(response).await;
        assert_counter(&html, "payment-submit-count", "2");
        assert!(alert_text(&html).contains("Payment successfully recorded!"));
        assert_eq!(second_confirm.status(), StatusCode::NO_CONTENT);
        assert_eq!(count_rows(&connection, "payments"), 1);
    }

    #[tokio::test]
    async fn cancel_inserts_nothing_and_rearms_submit() {
        let (test_db, state) = get_state();
        let connection = test_db.database.connect().unwrap();
        create_or_get_item("Chalk", &connection).unwrap();
        let session_id = SessionId::new();

        submit_endpoint::<PurchaseDraft>(
            State(state.clone()),
            Extension(session_id),
            Form(purchase_form(1, "Chalk")),
        )
        .await;
        let response = cancel_endpoint::<PurchaseDraft>(State(state.clone()), Extension(session_id)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_counter(&html, "purchase-submit-count", "2");
        assert_eq!(count_rows(&connection, "purchases"), 0);

        let response = submit_endpoint::<PurchaseDraft>(
            State(state.clone()),
            Extension(session_id),
            Form(purchase_form(2, "Chalk")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = confirm_endpoint::<PurchaseDraft>(
            State(state.clone()),
            Extension(session_id),
            Form(ConfirmForm { confirm_count: 1 }),
        )
        .await;
        let html = parse_html_fragment(response).await;
        assert!(alert_text(&html).contains("Purchased Item successfully recorded!"));
        assert_eq!(count_rows(&connection, "purchases"), 1);
    }

    #[tokio::test]
    async fn unresolved_enrollee_is_dropped_without_success_alert() {
        let (test_db, state) = get_state();
        let connection = test_db.database.connect().unwrap();
        let session_id = SessionId::new();

        submit_payment(&state, session_id, payment_form(1, "Nobody Here")).await;
        let response = confirm_payment(&state, session_id).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(HX_TRIGGER).is_none());
        let html = parse_html_fragment(response).await;
        assert_counter(&html, "payment-submit-count", "2");
        assert!(alert_text(&html).is_empty());
        assert_eq!(count_rows(&connection, "payments"), 0);
    }

    #[tokio::test]
    async fn new_item_is_created_on_confirm() {
        let (test_db, state) = get_state();
        let connection = test_db.database.connect().unwrap();
        let session_id = SessionId::new();
        let mut form = purchase_form(1, ADD_NEW_ITEM);
        form.new_item_name = "Textbook".to_owned();

        submit_endpoint::<PurchaseDraft>(State(state.clone()), Extension(session_id), Form(form))
            .await;
        assert_eq!(count_rows(&connection, "items"), 0, "nothing is written before confirm");
        confirm_endpoint::<PurchaseDraft>(
            State(state.clone()),
            Extension(session_id),
            Form(ConfirmForm { confirm_count: 1 }),
        )
        .await;

        assert_eq!(count_rows(&connection, "items"), 1);
        assert_eq!(count_rows(&connection, "purchases"), 1);
    }

    #[tokio::test]
    async fn confirm_with_zero_count_is_ignored() {
        let (_test_db, state) = get_state();
        let session_id = SessionId::new();
        submit_payment(&state, session_id, payment_form(1, "Ada Obi")).await;

        let response = confirm_endpoint::<PaymentDraft>(
            State(state.clone()),
            Extension(session_id),
            Form(ConfirmForm { confirm_count: 0 }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn sessions_do_not_share_workflows() {
        let (_test_db, state) = get_state();
        let first = SessionId::new();
        let second = SessionId::new();

        submit_payment(&state, first, payment_form(1, "Ada Obi")).await;
        let response = submit_payment(&state, second, payment_form(1, "Ada Obi")).await;

        assert_eq!(response.status(), StatusCode::OK);
    }
}
