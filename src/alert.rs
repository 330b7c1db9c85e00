//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into the page's `#alert-container`, either as the
//! target of an HTMX error response or as an out-of-band swap alongside
//! another fragment.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// An alert message with success or error styling.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Success { message: String, details: String },
    SuccessSimple { message: String },
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    fn parts(&self) -> (bool, &str, Option<&str>) {
        match self {
            Alert::Success { message, details } => (true, message, Some(details)),
            Alert::SuccessSimple { message } => (true, message, None),
            Alert::Error { message, details } => (false, message, Some(details)),
            Alert::ErrorSimple { message } => (false, message, None),
        }
    }

    fn body(&self) -> Markup {
        let (is_success, message, details) = self.parts();
        let style = if is_success {
            "flex items-start gap-3 p-4 text-sm rounded-lg shadow-lg \
            text-green-800 bg-green-50 border border-green-300 \
            dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        } else {
            "flex items-start gap-3 p-4 text-sm rounded-lg shadow-lg \
            text-red-800 bg-red-50 border border-red-300 \
            dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        };

        html! {
            div class=(style) role="alert"
            {
                div class="flex-1"
                {
                    p class="font-semibold" { (message) }

                    @if let Some(details) = details.filter(|details| !details.is_empty()) {
                        p class="mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="ms-auto font-bold"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }

    /// Render the alert for swapping into the alert container.
    pub fn into_html(self) -> Html<String> {
        Html(self.body().into_string())
    }

    /// Render the alert as an out-of-band swap that replaces the alert container.
    pub fn into_oob_markup(self) -> Markup {
        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                (self.body())
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn oob_alert_replaces_container() {
        let alert = Alert::SuccessSimple {
            message: "Payment successfully recorded!".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_oob_markup().into_string());

        let container = html
            .select(&Selector::parse("#alert-container").unwrap())
            .next()
            .expect("No alert container found");
        assert_eq!(container.value().attr("hx-swap-oob"), Some("true"));
        let text = container.text().collect::<String>();
        assert!(text.contains("Payment successfully recorded!"));
    }

    #[test]
    fn empty_details_are_omitted() {
        let alert = Alert::Error {
            message: "Oops".to_owned(),
            details: String::new(),
        };

        let html = Html::parse_fragment(&alert.into_html().0);

        let paragraphs = html.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(paragraphs, 1);
    }
}
