//! Full-page responses for missing routes and server-side failures.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// A whole page that explains what went wrong and what to do about it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub description: String,
    pub fix: String,
}

impl ErrorPage {
    /// The catch-all page for failures the user cannot do anything about.
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            description: "Sorry, something went wrong.".to_owned(),
            fix: "Try again later or check the server logs.".to_owned(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            description: "Something's missing.".to_owned(),
            fix: "Sorry, we can't find that page. Head back to the task page to record a \
                payment or purchase."
                .to_owned(),
        }
    }

    /// The page shown when the configured timezone name is not a canonical one.
    pub fn invalid_timezone(timezone: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            description: "Invalid Timezone Settings".to_owned(),
            fix: format!(
                "Could not get local timezone \"{timezone}\". Check your server settings and \
                ensure the timezone has been set to valid, canonical timezone string"
            ),
        }
    }

    pub fn database_unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            description: "Database Unavailable".to_owned(),
            fix: "Could not connect to the database. Try again later.".to_owned(),
        }
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        let title = self.status.canonical_reason().unwrap_or("Error");
        let markup = error_view(title, self.status.as_str(), &self.description, &self.fix);

        (self.status, Html(markup.into_string())).into_response()
    }
}

pub async fn get_404_not_found() -> Response {
    ErrorPage::not_found().into_response()
}

pub async fn get_internal_server_error_page() -> Response {
    ErrorPage::internal().into_response()
}
