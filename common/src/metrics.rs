use axum::Router;
use axum::routing::get;

#[cfg(feature = "metrics")]
use std::sync::OnceLock;

#[cfg(feature = "metrics")]
static PROM_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

#[cfg(feature = "metrics")]
pub fn install_recorder_once() -> &'static metrics_exporter_prometheus::PrometheusHandle {
    PROM_HANDLE.get_or_init(|| {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .expect("install global metrics recorder")
    })
}

/// `/healthz`, `/readyz`, and (when the `metrics` feature is on) `/metrics`,
/// merged onto the control-plane router rather than served on their own
/// listener (see SPEC_FULL.md §6a).
pub fn routes() -> Router {
    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(|| async { "ok" }));

    #[cfg(feature = "metrics")]
    let app = {
        let handle = install_recorder_once().clone();
        app.route("/metrics", get(move || async move { handle.render() }))
    };

    app
}
