//! The task page: the payment and purchase entry forms.

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::{Month, OffsetDateTime};

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, loading_spinner, naira_input_styles,
    },
    navigation::NavBar,
    reference::{ADD_NEW_ENROLLEE_LABEL, ADD_NEW_ITEM_LABEL, FeeType, list_schools},
    session::{SessionId, SessionStore},
    timezone::get_local_offset,
    workflow::{
        REFERENCE_DATA_CHANGED, TransactionKind,
        modal::{confirmation_modal, submit_count_input},
    },
};

/// The state needed to render the task page.
#[derive(Debug, Clone)]
pub struct TaskPageState {
    pub sessions: SessionStore,
    /// The local timezone as a canonical timezone name, e.g. "Africa/Lagos".
    pub local_timezone: String,
}

impl FromRef<AppState> for TaskPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            sessions: state.sessions.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub kind: Option<TransactionKind>,
}

/// Everything the task page depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskInputs {
    pub kind: TransactionKind,
    pub next_submit_count: u64,
    /// A submitted draft is still waiting for confirmation, e.g. after a reload.
    pub pending: bool,
    pub current_year: i32,
    pub current_month: Month,
}

fn tab(kind: TransactionKind, active: TransactionKind) -> Markup {
    let style = if kind == active {
        "inline-block px-4 py-2 text-blue-600 border-b-2 border-blue-600 \
        dark:text-blue-500 dark:border-blue-500"
    } else {
        "inline-block px-4 py-2 border-b-2 border-transparent \
        hover:text-gray-600 hover:border-gray-300 dark:hover:text-gray-300"
    };

    html! {
        a
            href={ (endpoints::TASK_VIEW) "?kind=" (kind) }
            class=(style)
            aria-current=[(kind == active).then_some("page")]
        {
            (kind)
        }
    }
}

fn school_select(kind: TransactionKind) -> Markup {
    let id = kind.school_select_id();

    html! {
        div
        {
            label for=(id) class=(FORM_LABEL_STYLE) { "School" }

            select name="school" id=(id) required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for school in list_schools() {
                    option value=(school) { (school) }
                }
            }
        }
    }
}

/// January through December.
fn months() -> impl Iterator<Item = Month> {
    std::iter::successors(Some(Month::January), |month| {
        (*month != Month::December).then(|| month.next())
    })
}

fn month_year_inputs(inputs: &TaskInputs) -> Markup {
    html! {
        div class="grid grid-cols-2 gap-4"
        {
            div
            {
                label for="month" class=(FORM_LABEL_STYLE) { "Month Paid" }

                select name="month" id="month" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for month in months() {
                        option
                            value=(month as u8)
                            selected[month == inputs.current_month]
                        {
                            (month)
                        }
                    }
                }
            }

            div
            {
                label for="year" class=(FORM_LABEL_STYLE) { "Year Paid" }

                input
                    name="year"
                    id="year"
                    type="number"
                    required
                    value=(inputs.current_year)
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn amount_input() -> Markup {
    html! {
        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    placeholder="0.00"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn payment_fields(inputs: &TaskInputs) -> Markup {
    let school_select_id = format!("#{}", TransactionKind::Payment.school_select_id());

    html! {
        (school_select(TransactionKind::Payment))

        div
        {
            label for="enrollee" class=(FORM_LABEL_STYLE) { "Select Enrollee" }

            select
                name="enrollee"
                id="enrollee"
                required
                hx-get=(endpoints::ENROLLEE_OPTIONS)
                hx-include=(school_select_id)
                hx-trigger={
                    "load, change from:" (school_select_id) ", "
                    (REFERENCE_DATA_CHANGED) " from:body"
                }
                class=(FORM_TEXT_INPUT_STYLE)
            {}
        }

        fieldset class="grid grid-cols-2 gap-4"
        {
            legend class="mb-2 text-sm text-gray-500 dark:text-gray-400"
            {
                "Only used with \"" (ADD_NEW_ENROLLEE_LABEL) "\""
            }

            div
            {
                label for="first_name" class=(FORM_LABEL_STYLE) { "First Name" }
                input name="first_name" id="first_name" type="text" class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="last_name" class=(FORM_LABEL_STYLE) { "Last Name" }
                input name="last_name" id="last_name" type="text" class=(FORM_TEXT_INPUT_STYLE);
            }
        }

        div
        {
            label for="fee_type" class=(FORM_LABEL_STYLE) { "Fee Type" }

            select name="fee_type" id="fee_type" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for fee_type in FeeType::ALL {
                    option value=(fee_type) { (fee_type) }
                }
            }
        }

        (month_year_inputs(inputs))
        (amount_input())
    }
}

fn purchase_fields(inputs: &TaskInputs) -> Markup {
    html! {
        div
        {
            label for="item" class=(FORM_LABEL_STYLE) { "Select Item" }

            select
                name="item"
                id="item"
                required
                hx-get=(endpoints::ITEM_OPTIONS)
                hx-trigger={ "load, " (REFERENCE_DATA_CHANGED) " from:body" }
                class=(FORM_TEXT_INPUT_STYLE)
            {}
        }

        div
        {
            label for="new_item_name" class=(FORM_LABEL_STYLE) { "New Item Name" }

            input
                name="new_item_name"
                id="new_item_name"
                type="text"
                placeholder={ "Only used with \"" (ADD_NEW_ITEM_LABEL) "\"" }
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="quantity" class=(FORM_LABEL_STYLE) { "Quantity" }

            input
                name="quantity"
                id="quantity"
                type="number"
                min="1"
                step="1"
                value="1"
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        (amount_input())
        (school_select(TransactionKind::Purchase))
        (month_year_inputs(inputs))
    }
}

/// Render the task page for `inputs`.
pub fn task_view(inputs: &TaskInputs) -> Markup {
    let kind = inputs.kind;
    let nav_bar = NavBar::new(endpoints::TASK_VIEW).into_html();
    let spinner = loading_spinner();
    let modal_target = format!("#{}", kind.modal_id());

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            nav class="w-full mb-6 text-sm font-medium text-center text-gray-500 border-b border-gray-200 dark:text-gray-400 dark:border-gray-700"
            {
                (tab(TransactionKind::Payment, kind))
                (tab(TransactionKind::Purchase, kind))
            }

            form
                hx-post=(kind.submit_endpoint())
                hx-target=(modal_target)
                hx-swap="innerHTML"
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New " (kind) }

                (submit_count_input(kind, inputs.next_submit_count, false))

                @match kind {
                    TransactionKind::Payment => (payment_fields(inputs)),
                    TransactionKind::Purchase => (purchase_fields(inputs)),
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Submit " (kind)
                }
            }

            div id=(kind.modal_id())
            {
                @if inputs.pending {
                    (confirmation_modal(kind))
                }
            }
        }
    };

    base("Task", &[naira_input_styles()], &content)
}

/// Renders the task page with the form for the chosen transaction kind.
pub async fn get_task_page(
    State(state): State<TaskPageState>,
    Extension(session_id): Extension<SessionId>,
    Query(query): Query<TaskQuery>,
) -> Result<Response, Error> {
    let kind = query.kind.unwrap_or(TransactionKind::Payment);

    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let (next_submit_count, pending) =
        state.sessions.with_session(session_id, |session| match kind {
            TransactionKind::Payment => (
                session.payment.next_submit_count(),
                session.payment.is_pending(),
            ),
            TransactionKind::Purchase => (
                session.purchase.next_submit_count(),
                session.purchase.is_pending(),
            ),
        })?;

    let inputs = TaskInputs {
        kind,
        next_submit_count,
        pending,
        current_year: today.year(),
        current_month: today.month(),
    };

    Ok(task_view(&inputs).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::Selector;
    use time::Month;

    use crate::{
        endpoints,
        session::{SessionId, SessionStore},
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document,
        },
        workflow::{Action, PaymentDraft, TransactionKind},
    };

    use super::{TaskPageState, TaskQuery, get_task_page};

    fn get_state() -> TaskPageState {
        TaskPageState {
            sessions: SessionStore::default(),
            local_timezone: "Africa/Lagos".to_owned(),
        }
    }

    #[tokio::test]
    async fn payment_form_is_default() {
        let response = get_task_page(
            State(get_state()),
            Extension(SessionId::new()),
            Query(TaskQuery { kind: None }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::PAYMENT_SUBMIT, "hx-post");
        assert_hx_endpoint(&form, "#payment-modal", "hx-target");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "year", "number");
        let enrollee = form
            .select(&Selector::parse("select#enrollee").unwrap())
            .next()
            .expect("No enrollee select");
        assert_eq!(
            enrollee.value().attr("hx-get"),
            Some(endpoints::ENROLLEE_OPTIONS)
        );
        assert!(html.select(&Selector::parse("#payment-modal").unwrap()).next().is_some());
    }

    #[tokio::test]
    async fn purchase_form_has_item_and_quantity() {
        let response = get_task_page(
            State(get_state()),
            Extension(SessionId::new()),
            Query(TaskQuery {
                kind: Some(TransactionKind::Purchase),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::PURCHASE_SUBMIT, "hx-post");
        assert_form_input(&form, "quantity", "number");
        let button_text = form
            .select(&Selector::parse("button").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert_eq!(button_text.trim(), "Submit Purchase");
    }

    #[tokio::test]
    async fn counter_starts_after_last_recorded_submit() {
        let state = get_state();
        let session_id = SessionId::new();
        state
            .sessions
            .with_session(session_id, |session| {
                session.payment.dispatch(Action::Submit {
                    submit_count: 3,
                    draft: PaymentDraft {
                        enrollee: crate::workflow::EnrolleeSelection::Existing(
                            "Ada Obi".to_owned(),
                        ),
                        school: crate::reference::School::SomlAdvanced,
                        fee_type: crate::reference::FeeType::Handout,
                        amount: 1.0,
                        month: Month::May,
                        year: 2025,
                    },
                })
            })
            .unwrap();

        let response = get_task_page(
            State(state),
            Extension(session_id),
            Query(TaskQuery { kind: None }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let counter = html
            .select(&Selector::parse("input#payment-submit-count").unwrap())
            .next()
            .expect("No submit counter");
        assert_eq!(counter.value().attr("value"), Some("4"));
        assert_eq!(counter.value().attr("hx-swap-oob"), None);
    }

    #[tokio::test]
    async fn pending_draft_shows_dialog_after_reload() {
        let state = get_state();
        let session_id = SessionId::new();
        state
            .sessions
            .with_session(session_id, |session| {
                session.payment.dispatch(Action::Submit {
                    submit_count: 1,
                    draft: PaymentDraft {
                        enrollee: crate::workflow::EnrolleeSelection::Existing(
                            "Ada Obi".to_owned(),
                        ),
                        school: crate::reference::School::SomlAdvanced,
                        fee_type: crate::reference::FeeType::Registration,
                        amount: 5_000.0,
                        month: Month::March,
                        year: 2025,
                    },
                })
            })
            .unwrap();

        let payment_page = get_task_page(
            State(state.clone()),
            Extension(session_id),
            Query(TaskQuery { kind: None }),
        )
        .await
        .unwrap();
        let purchase_page = get_task_page(
            State(state),
            Extension(session_id),
            Query(TaskQuery {
                kind: Some(TransactionKind::Purchase),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(payment_page).await;
        assert_valid_html(&html);
        let confirm_button = html
            .select(&Selector::parse("#payment-modal [role=dialog] button").unwrap())
            .next()
            .expect("No confirmation dialog after reload");
        assert_eq!(
            confirm_button.value().attr("hx-post"),
            Some(endpoints::PAYMENT_CONFIRM)
        );
        let html = parse_html_document(purchase_page).await;
        assert!(
            html.select(&Selector::parse("[role=dialog]").unwrap())
                .next()
                .is_none()
        );
    }

    #[test]
    fn months_run_january_to_december() {
        let months: Vec<_> = super::months().collect();

        assert_eq!(months.len(), 12);
        assert_eq!(months.first(), Some(&Month::January));
        assert_eq!(months.last(), Some(&Month::December));
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error() {
        let mut state = get_state();
        state.local_timezone = "Not/AZone".to_owned();

        let result = get_task_page(
            State(state),
            Extension(SessionId::new()),
            Query(TaskQuery { kind: None }),
        )
        .await;

        assert!(result.is_err());
    }
}
