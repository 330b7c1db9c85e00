//! Builds the log-in URL that sends the user back to where they were after logging in.
//!
//! Only same-origin paths are accepted as redirect targets, so the log-in
//! form cannot be used as an open redirect.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

fn is_safe_redirect_target(target: &str) -> bool {
    if !target.starts_with('/') || target.starts_with("//") {
        return false;
    }

    let path = target.split_once('?').map_or(target, |(path, _)| path);

    path != endpoints::LOG_IN_VIEW && !path.starts_with("/api")
}

fn path_and_query(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_target(path_and_query).then(|| path_and_query.to_owned())
}

/// Accept `raw_url` as a redirect target if it is a relative, same-origin path.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    path_and_query(raw_url)
}

/// The log-in URL for a request that failed the auth check.
///
/// Page requests return to the requested page. HTMX requests to `/api`
/// routes return to the page the request was made from (`HX-Current-URL`),
/// and fall back to the task page when that header is missing or unsafe.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let target = if request.uri().path().starts_with("/api") {
        request
            .headers()
            .get("hx-current-url")
            .and_then(|header| header.to_str().ok())
            .and_then(path_and_query)
    } else {
        request
            .uri()
            .path_and_query()
            .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
    };

    let target = target.unwrap_or_else(|| {
        tracing::warn!(
            "No usable redirect target for {}. Falling back to the task page.",
            request.uri()
        );
        endpoints::TASK_VIEW.to_owned()
    });

    log_in_url_with_target(&target)
}

pub(super) fn log_in_url_with_target(target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", target)]) {
        Ok(param) => format!("{}?{}", endpoints::LOG_IN_VIEW, param),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}
