use std::time::Duration;

use http::Method;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Permissive CORS for the control-plane API: GET-only surface, credentials
/// not required, origin mirrored back so operator dashboards on any host can
/// poll it.
pub fn control_api() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET])
        .max_age(Duration::from_secs(60 * 60))
}
