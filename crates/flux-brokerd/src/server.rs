use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::warn;

use flux_api::{GatewayAdapter, HttpApi};
use flux_ingest::LocalHandle;
use flux_prometheus::{Encoder, PrometheusMetrics, TextEncoder};

/// Job API plus `/metrics`.
pub fn router(h: LocalHandle, metrics: Arc<PrometheusMetrics>) -> Router {
    let api = HttpApi::new(Arc::new(GatewayAdapter::new(h))).router();
    let metrics = Router::new()
        .route("/metrics", get(serve_metrics))
        .with_state(metrics);

    api.merge(metrics)
}

/// GET /metrics
async fn serve_metrics(State(metrics): State<Arc<PrometheusMetrics>>) -> Response {
    match metrics.encode_text() {
        Ok(body) => (
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
