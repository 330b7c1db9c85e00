//! The API endpoints URIs.

/// The root route which redirects to the task page or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users, where payments and purchases are entered.
pub const TASK_VIEW: &str = "/task";
/// The page listing recorded payments and purchases.
pub const HISTORY_VIEW: &str = "/history";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route that asks for a payment to be confirmed.
pub const PAYMENT_SUBMIT: &str = "/api/payments/submit";
/// The route that commits the payment awaiting confirmation.
pub const PAYMENT_CONFIRM: &str = "/api/payments/confirm";
/// The route that discards the payment awaiting confirmation.
pub const PAYMENT_CANCEL: &str = "/api/payments/cancel";
/// The route that asks for a purchase to be confirmed.
pub const PURCHASE_SUBMIT: &str = "/api/purchases/submit";
/// The route that commits the purchase awaiting confirmation.
pub const PURCHASE_CONFIRM: &str = "/api/purchases/confirm";
/// The route that discards the purchase awaiting confirmation.
pub const PURCHASE_CANCEL: &str = "/api/purchases/cancel";
/// The route for the `<option>` list of enrollees, optionally for one school.
pub const ENROLLEE_OPTIONS: &str = "/api/enrollees/options";
/// The route for the `<option>` list of items.
pub const ITEM_OPTIONS: &str = "/api/items/options";
/// The route for downloading the filtered history as a CSV file.
pub const HISTORY_CSV: &str = "/api/history/csv";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::TASK_VIEW);
        assert_endpoint_is_valid_uri(endpoints::HISTORY_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);

        assert_endpoint_is_valid_uri(endpoints::LOG_IN_API);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::PAYMENT_SUBMIT);
        assert_endpoint_is_valid_uri(endpoints::PAYMENT_CONFIRM);
        assert_endpoint_is_valid_uri(endpoints::PAYMENT_CANCEL);
        assert_endpoint_is_valid_uri(endpoints::PURCHASE_SUBMIT);
        assert_endpoint_is_valid_uri(endpoints::PURCHASE_CONFIRM);
        assert_endpoint_is_valid_uri(endpoints::PURCHASE_CANCEL);
        assert_endpoint_is_valid_uri(endpoints::ENROLLEE_OPTIONS);
        assert_endpoint_is_valid_uri(endpoints::ITEM_OPTIONS);
        assert_endpoint_is_valid_uri(endpoints::HISTORY_CSV);
    }
}
