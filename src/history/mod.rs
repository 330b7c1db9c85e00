//! Viewing, filtering and exporting every recorded payment and purchase.

mod export;
mod page;
mod query;

pub use export::{export_history_csv, get_history_csv};
pub use page::get_history_page;
pub use query::{
    HistoryFilter, HistoryRecord, HistoryTotals, apply_filter, compute_totals, get_all_records,
    query_history,
};

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
};
use time::UtcOffset;

use crate::{AppState, Error, db::Database, timezone::get_local_offset};

/// The state needed by the history page and the CSV download.
#[derive(Debug, Clone)]
pub struct HistoryState {
    pub database: Database,
    /// The local timezone as a canonical timezone name, e.g. "Africa/Lagos".
    pub local_timezone: String,
}

impl FromRef<AppState> for HistoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            database: state.database.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The [HistoryFilter] taken from the query string.
///
/// A query string that does not parse, e.g. a malformed date, is logged and
/// treated as no filters at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterQuery(pub HistoryFilter);

impl<S> FromRequestParts<S> for FilterQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<HistoryFilter>::from_request_parts(parts, state).await {
            Ok(Query(filter)) => Ok(Self(filter)),
            Err(rejection) => {
                tracing::warn!(
                    "Ignoring history filters {:?}: {}",
                    parts.uri.query(),
                    rejection.body_text()
                );
                Ok(Self::default())
            }
        }
    }
}

impl HistoryState {
    fn local_offset(&self) -> Result<UtcOffset, Error> {
        get_local_offset(&self.local_timezone).ok_or_else(|| {
            tracing::error!("Invalid timezone {}", self.local_timezone);
            Error::InvalidTimezoneError(self.local_timezone.clone())
        })
    }

    /// Load the records matching `filter`.
    ///
    /// Failures are logged and give an empty history so the page still renders.
    fn records(&self, filter: &HistoryFilter, local_offset: UtcOffset) -> Vec<HistoryRecord> {
        self.database
            .connect()
            .and_then(|connection| query_history(filter, local_offset, &connection))
            .unwrap_or_else(|error| {
                tracing::error!("Could not load history for {filter:?}: {error}");
                Vec::new()
            })
    }
}
