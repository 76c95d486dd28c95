//! HTTP request handlers and router.

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tracing::{debug, error, warn};

use lustre_core::metrics::{render_metrics, render_scrape_report};

use crate::state::SharedState;

/// Prometheus text exposition content type.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Checks that `path` can be mounted next to the landing page.
///
/// The path must be absolute, must not be `/` and must not use route
/// syntax (`{param}` captures or `*` wildcards).
pub(crate) fn validate_telemetry_path(path: &str) -> Result<(), String> {
    if !path.starts_with('/') {
        return Err(format!("telemetry path '{}' must start with '/'", path));
    }
    if path == "/" {
        return Err("telemetry path '/' is reserved for the landing page".to_string());
    }
    if path.contains(['{', '}', '*']) {
        return Err(format!(
            "telemetry path '{}' must not contain '{{', '}}' or '*'",
            path
        ));
    }
    Ok(())
}

/// Builds the router. `state.telemetry_path` must pass [`validate_telemetry_path`].
pub(crate) fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_landing))
        .route(&state.telemetry_path, get(handle_metrics))
        .with_state(state)
        .layer(CompressionLayer::new())
}

/// Runs one collection cycle.
///
/// Failed sources are reported through the collector success gauge; the
/// measurements of the other sources are still served.
pub(crate) async fn handle_metrics(State(state): State<SharedState>) -> Response {
    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || worker.scraper.scrape()).await;

    match result {
        Ok(scrape) => {
            if scrape.report.is_complete() {
                debug!(
                    measurements = scrape.report.measurements,
                    elapsed_ms = scrape.report.total.as_millis() as u64,
                    "scrape served"
                );
            } else {
                warn!(
                    measurements = scrape.report.measurements,
                    failed = scrape.report.errors.len(),
                    "scrape served with failed sources"
                );
            }
            let mut body = render_metrics(&state.namespace, &scrape.measurements);
            body.push_str(&render_scrape_report(&state.namespace, &scrape.report));
            ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "collection task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "collection task failed".to_string(),
            )
                .into_response()
        }
    }
}

pub(crate) async fn handle_landing(State(state): State<SharedState>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>Lustre Exporter</title></head>\n<body>\n\
         <h1>Lustre Exporter</h1>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n</html>\n",
        path = state.telemetry_path
    ))
}
