//! School Ledger is a web app for recording a school's fee payments and item
//! purchases.
//!
//! Payments and purchases are entered on the task page through a submit,
//! confirm and cancel dialog that never writes the same click twice. The
//! history page lists everything that has been recorded, with filters,
//! totals and a CSV download.
//!
//! This library serves HTML pages and HTMX fragments directly.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod error;
mod error_page;
mod history;
mod html;
mod logging;
mod navigation;
mod reference;
mod routing;
mod session;
mod timezone;
mod workflow;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, count_users, create_user};
pub use db::{Database, initialize as initialize_db};
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use reference::{FeeType, School, create_or_get_enrollee, create_or_get_item};
pub use routing::build_router;
pub use workflow::{
    EnrolleeSelection, ItemSelection, PaymentDraft, PurchaseDraft, commit_payment,
    commit_purchase,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
