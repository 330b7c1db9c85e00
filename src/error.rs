//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, error_page::ErrorPage};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username and password did not match a registered user.
    ///
    /// The reason for the failure (unknown username, wrong password or a
    /// failed lookup) is only ever written to the server logs.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token cookie could not be parsed, or it has expired.
    #[error("invalid auth token: {0}")]
    InvalidToken(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is already taken by another user.
    #[error("the username already exists in the database")]
    DuplicateUsername,

    /// An empty string was used for the name of a new enrollee or item.
    #[error("name cannot be empty")]
    EmptyName,

    /// The amount of a payment or purchase was zero, negative or not a number.
    #[error("{0} is not a valid amount, it must be greater than zero")]
    InvalidAmount(f64),

    /// The quantity of a purchase was less than one.
    #[error("{0} is not a valid quantity, it must be at least one")]
    InvalidQuantity(i64),

    /// The month number was outside of 1-12.
    #[error("{0} is not a valid month")]
    InvalidMonth(u8),

    /// The submit counter posted with a form was zero or at the limit of its range.
    #[error("{0} is not a valid submit count")]
    InvalidSubmitCount(u64),

    /// A school, enrollee or item name did not match any row at insert time.
    #[error("could not resolve {0}")]
    UnresolvedReference(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A connection to the database could not be opened.
    ///
    /// This is fatal for the operation that requested the connection only.
    #[error("could not connect to the database: {0}")]
    ConnectionError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The lock guarding the per-session workflow state was poisoned.
    #[error("could not acquire the session lock")]
    SessionLockError,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The history could not be written as CSV.
    #[error("could not export CSV: {0}")]
    CsvExport(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("users.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => ErrorPage::not_found().into_response(),
            Error::InvalidTimezoneError(timezone) => {
                ErrorPage::invalid_timezone(&timezone).into_response()
            }
            Error::ConnectionError(_) => ErrorPage::database_unavailable().into_response(),
            Error::SessionLockError => ErrorPage::internal().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorPage::internal().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = self.into_alert();

        (status_code, alert.into_html()).into_response()
    }

    /// The status code and alert that describe this error to the user.
    pub fn into_alert(self) -> (StatusCode, Alert) {
        match self {
            Error::InvalidTimezoneError(timezone) => {
                let page = ErrorPage::invalid_timezone(&timezone);
                (
                    page.status,
                    Alert::Error {
                        message: page.description,
                        details: page.fix,
                    },
                )
            }
            Error::EmptyName => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Missing name".to_owned(),
                    details: "Enter a name for the new enrollee or item.".to_owned(),
                },
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("{amount} is not a valid amount. Enter an amount above zero."),
                },
            ),
            Error::InvalidQuantity(quantity) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid quantity".to_owned(),
                    details: format!("{quantity} is not a valid quantity. Enter at least one."),
                },
            ),
            Error::InvalidMonth(month) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid month".to_owned(),
                    details: format!("{month} is not a month. Choose a month from the list."),
                },
            ),
            Error::InvalidSubmitCount(_) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid form".to_owned(),
                    details: "The form is out of date. Reload the page and try again.".to_owned(),
                },
            ),
            Error::ConnectionError(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Alert::Error {
                    message: "Database unavailable".to_owned(),
                    details: "Could not connect to the database. Try again later.".to_owned(),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::{
        Error,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[tokio::test]
    async fn validation_errors_render_bad_request_alert() {
        let response = Error::InvalidAmount(-5.0).into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Invalid amount"), "got alert text {text:?}");
    }

    #[tokio::test]
    async fn sql_errors_never_reach_the_client() {
        let error = Error::SqlError(rusqlite::Error::InvalidQuery);

        let response = error.into_alert_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(!text.contains("Query"), "raw SQL error leaked: {text:?}");
    }
}
