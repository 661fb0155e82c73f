pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use exhibitor_scheduler_core::{Driver, Scheduler};

/// Builds the control-plane router (see spec.md §4.6), with `/healthz`,
/// `/readyz`, and `/metrics` merged onto the same router rather than served
/// on a side channel (see SPEC_FULL.md §6a). The caller owns binding/serving
/// — mirrors the teacher's pattern of handing back a bare `Router` for the
/// binary to wire into `axum::serve`.
pub fn router<D: Driver + 'static>(scheduler: Arc<Scheduler<D>>) -> Router {
    let app = Router::new()
        .route("/api/add", get(routes::add::<D>))
        .route("/api/start", get(routes::start::<D>))
        .route("/api/stop", get(routes::stop::<D>))
        .route("/api/remove", get(routes::remove::<D>))
        .route("/api/config", get(routes::config::<D>))
        .route("/api/status", get(routes::status::<D>))
        .with_state(scheduler);

    app.merge(exhibitor_common::metrics::routes())
        .layer(axum::middleware::from_fn(exhibitor_common::access_log::control))
        .layer(exhibitor_common::cors::control_api())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exhibitor_scheduler_core::recording::RecordingDriver;
    use http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn artifacts() -> exhibitor_types::matcher::ArtifactUris {
        exhibitor_types::matcher::ArtifactUris {
            framework_jar: "jar".into(),
            exhibitor_dist: "exhibitor".into(),
            zookeeper_dist: "zookeeper".into(),
            jdk: "jdk".into(),
        }
    }

    fn app() -> Router {
        let scheduler = Arc::new(Scheduler::new(Arc::new(RecordingDriver::default()), artifacts()));
        router(scheduler)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn add_then_status_round_trips() {
        let app = app();
        let (status, body) = get(app.clone(), "/api/add?id=s1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "s1");
        assert_eq!(body["state"], "Added");

        let (_, body) = get(app, "/api/status").await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stop_unknown_id_returns_synthetic_unknown_without_mutation() {
        let app = app();
        let (status, body) = get(app.clone(), "/api/stop?id=nope").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "Unknown");

        let (_, body) = get(app, "/api/status").await;
        assert_eq!(body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn start_then_stop_flips_added_to_stopped() {
        let app = app();
        get(app.clone(), "/api/add?id=s1").await;
        let (_, body) = get(app.clone(), "/api/start?id=s1").await;
        assert_eq!(body["state"], "Stopped");

        // stopping a Stopped server is a no-op that still returns it
        let (_, body) = get(app, "/api/stop?id=s1").await;
        assert_eq!(body["state"], "Stopped");
    }

    #[tokio::test]
    async fn config_merges_recognized_keys_and_drops_unknown() {
        let app = app();
        get(app.clone(), "/api/add?id=s1").await;
        let (_, body) = get(
            app,
            "/api/config?id=s1&zkconfigconnect=zk:2181&bogus=nope",
        )
        .await;
        assert_eq!(body["config"]["exhibitorOptions"]["zkconfigconnect"], "zk:2181");
        assert!(body["config"]["exhibitorOptions"].get("bogus").is_none());
    }

    #[tokio::test]
    async fn add_rejects_invalid_constraint_spec() {
        let app = app();
        let (status, _) = get(app, "/api/add?id=s1&constraints=rack%3Dbogus").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_and_readiness_are_served_on_the_control_api_router() {
        let app = app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/readyz").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
