//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    endpoints,
    error_page::{get_404_not_found, get_internal_server_error_page},
    history::{get_history_csv, get_history_page},
    reference::{get_enrollee_options, get_item_options},
    workflow::{
        PaymentDraft, PurchaseDraft, cancel_endpoint, confirm_endpoint, get_task_page,
        submit_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::TASK_VIEW, get(get_task_page))
        .route(endpoints::HISTORY_VIEW, get(get_history_page))
        .route(endpoints::HISTORY_CSV, get(get_history_csv))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // HTMX requests need the HX-REDIRECT header for auth redirects to work properly.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::PAYMENT_SUBMIT, post(submit_endpoint::<PaymentDraft>))
            .route(endpoints::PAYMENT_CONFIRM, post(confirm_endpoint::<PaymentDraft>))
            .route(endpoints::PAYMENT_CANCEL, post(cancel_endpoint::<PaymentDraft>))
            .route(endpoints::PURCHASE_SUBMIT, post(submit_endpoint::<PurchaseDraft>))
            .route(
                endpoints::PURCHASE_CONFIRM,
                post(confirm_endpoint::<PurchaseDraft>),
            )
            .route(endpoints::PURCHASE_CANCEL, post(cancel_endpoint::<PurchaseDraft>))
            .route(endpoints::ENROLLEE_OPTIONS, get(get_enrollee_options))
            .route(endpoints::ITEM_OPTIONS, get(get_item_options))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the task page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::TASK_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_task_page() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::TASK_VIEW);
    }
}
