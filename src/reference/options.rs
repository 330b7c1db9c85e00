//! `<option>` fragments that HTMX swaps into the enrollee and item selects
//! whenever the selection they depend on changes.

use std::str::FromStr;

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    AppState,
    db::Database,
    reference::{
        ADD_NEW_ENROLLEE, ADD_NEW_ITEM, ADD_NEW_ITEM_LABEL, Choice, EnrolleeId, School,
        list_enrollees, list_items,
    },
};

/// The state needed to list reference data.
#[derive(Debug, Clone)]
pub struct ReferenceState {
    pub database: Database,
}

impl FromRef<AppState> for ReferenceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            database: state.database.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnrolleeOptionsQuery {
    pub school: Option<String>,
}

/// Render enrollee choices as `<option>` elements.
///
/// Existing enrollees use their display name as the value since that is what
/// is resolved when the payment is committed.
pub fn enrollee_options_view(choices: &[(String, Choice<EnrolleeId>)]) -> Markup {
    html! {
        @for (label, choice) in choices {
            @match choice {
                Choice::Existing(_) => option value=(label) { (label) },
                Choice::AddNew => option value=(ADD_NEW_ENROLLEE) { (label) },
            }
        }
    }
}

/// Render item choices as `<option>` elements.
pub fn item_options_view(choices: &[Choice<String>]) -> Markup {
    html! {
        @for choice in choices {
            @match choice {
                Choice::Existing(name) => option value=(name) { (name) },
                Choice::AddNew => option value=(ADD_NEW_ITEM) { (ADD_NEW_ITEM_LABEL) },
            }
        }
    }
}

/// Route handler for the enrollees of the chosen school.
///
/// If the list cannot be loaded the error is logged and an empty list is
/// returned.
pub async fn get_enrollee_options(
    State(state): State<ReferenceState>,
    Query(query): Query<EnrolleeOptionsQuery>,
) -> Markup {
    let school = match query.school.as_deref() {
        None | Some("") => None,
        Some(name) => match School::from_str(name) {
            Ok(school) => Some(school),
            Err(error) => {
                tracing::error!("Could not list enrollees: {error}");
                return html! {};
            }
        },
    };

    let choices = state
        .database
        .connect()
        .and_then(|connection| list_enrollees(school, &connection));

    match choices {
        Ok(choices) => {
            tracing::info!("Refreshed enrollee list with {} entries", choices.len());
            enrollee_options_view(&choices)
        }
        Err(error) => {
            tracing::error!("Could not list enrollees: {error}");
            html! {}
        }
    }
}

/// Route handler for the list of items.
///
/// If the list cannot be loaded the error is logged and the response is
/// `204 No Content`, which leaves the existing options in place.
pub async fn get_item_options(State(state): State<ReferenceState>) -> Response {
    let choices = state
        .database
        .connect()
        .and_then(|connection| list_items(&connection));

    match choices {
        Ok(choices) => {
            tracing::info!("Refreshed item list with {} entries", choices.len());
            item_options_view(&choices).into_response()
        }
        Err(error) => {
            tracing::error!("Could not list items: {error}");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::Selector;

    use crate::{
        db::Database,
        reference::{ADD_NEW_ENROLLEE, ADD_NEW_ITEM, School, create_or_get_enrollee, create_or_get_item},
        test_utils::{get_test_database, parse_html_fragment},
    };

    use super::{EnrolleeOptionsQuery, ReferenceState, get_enrollee_options, get_item_options};

    fn option_values(html: &scraper::Html) -> Vec<String> {
        html.select(&Selector::parse("option").unwrap())
            .map(|option| option.value().attr("value").unwrap_or_default().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn enrollee_options_for_school() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();
        create_or_get_enrollee("Ada", "Obi", School::SomlAdvanced, &connection).unwrap();
        create_or_get_enrollee("Tunde", "Bello", School::EfdIgbaradi, &connection).unwrap();
        let state = ReferenceState {
            database: test_db.database.clone(),
        };

        let response = get_enrollee_options(
            State(state),
            Query(EnrolleeOptionsQuery {
                school: Some("SOML Advanced".to_owned()),
            }),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_eq!(option_values(&html), ["Ada Obi", ADD_NEW_ENROLLEE]);
    }

    #[tokio::test]
    async fn enrollee_options_are_empty_on_failure() {
        let state = ReferenceState {
            database: Database::new("/this/directory/does/not/exist/ledger.db"),
        };

        let response = get_enrollee_options(
            State(state),
            Query(EnrolleeOptionsQuery { school: None }),
        )
        .await
        .into_response();

        let html = parse_html_fragment(response).await;
        assert!(option_values(&html).is_empty());
    }

    #[tokio::test]
    async fn item_options_end_with_sentinel() {
        let test_db = get_test_database();
        let connection = test_db.database.connect().unwrap();
        create_or_get_item("Chalk", &connection).unwrap();
        let state = ReferenceState {
            database: test_db.database.clone(),
        };

        let response = get_item_options(State(state)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_eq!(option_values(&html), ["Chalk", ADD_NEW_ITEM]);
    }

    #[tokio::test]
    async fn item_options_leave_list_unchanged_on_failure() {
        let state = ReferenceState {
            database: Database::new("/this/directory/does/not/exist/ledger.db"),
        };

        let response = get_item_options(State(state)).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
