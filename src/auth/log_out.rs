//! Log-out route handler that ends the session and redirects users.

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    AppState,
    auth::{cookie::get_token_from_cookies, invalidate_auth_cookie},
    endpoints,
    session::SessionStore,
};

/// The state needed to log out.
#[derive(Debug, Clone)]
pub struct LogOutState {
    pub cookie_key: Key,
    pub sessions: SessionStore,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            sessions: state.sessions.clone(),
        }
    }
}

impl FromRef<LogOutState> for Key {
    fn from_ref(state: &LogOutState) -> Self {
        state.cookie_key.clone()
    }
}

/// Discard the session's workflow state, invalidate the auth cookie and
/// redirect the client to the log-in page.
///
/// A missing or expired cookie still gets the redirect.
pub async fn get_log_out(State(state): State<LogOutState>, jar: PrivateCookieJar) -> Response {
    if let Ok(token) = get_token_from_cookies(&jar) {
        match state.sessions.remove(token.session_id) {
            Ok(()) => tracing::info!("User {} logged out", token.user_id),
            Err(error) => tracing::error!("Could not discard session {}: {error}", token.session_id),
        }
    }

    let jar = invalidate_auth_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
