use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use exhibitor_common::response::bad_request;
use exhibitor_scheduler_core::{Driver, Scheduler};
use exhibitor_types::{
    constraint, Server, RECOGNIZED_EXHIBITOR_OPTIONS, RECOGNIZED_SHARED_OVERRIDE,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct AddQuery {
    id: String,
    cpu: Option<f64>,
    mem: Option<f64>,
    constraints: Option<String>,
    configchangebackoff: Option<u64>,
}

/// `GET /api/add` — create a server in `Added` with default constraints
/// `hostname=unique`, overridden by the `constraints` spec if given.
pub async fn add<D: Driver + 'static>(
    State(scheduler): State<Arc<Scheduler<D>>>,
    Query(q): Query<AddQuery>,
) -> Response {
    let constraints = match &q.constraints {
        Some(spec) => match constraint::parse(spec) {
            Ok(c) => Some(c),
            Err(e) => return bad_request(e),
        },
        None => None,
    };

    let mut config = exhibitor_types::ServerConfig::default();
    if let Some(cpu) = q.cpu {
        config.cpus = cpu;
    }
    if let Some(mem) = q.mem {
        config.mem = mem;
    }
    if let Some(backoff) = q.configchangebackoff {
        config.shared_config_change_backoff = backoff;
    }

    match scheduler.add(q.id, config, constraints) {
        Ok(server) => Json(server).into_response(),
        Err(e) => bad_request(e),
    }
}

#[derive(Deserialize)]
pub struct IdQuery {
    id: String,
}

/// `GET /api/start` — `Added` -> `Stopped`. No-op past `Added`.
pub async fn start<D: Driver + 'static>(
    State(scheduler): State<Arc<Scheduler<D>>>,
    Query(q): Query<IdQuery>,
) -> Json<Server> {
    Json(scheduler.start(&q.id).unwrap_or_else(|| Server::unknown(q.id)))
}

/// `GET /api/stop`.
pub async fn stop<D: Driver + 'static>(
    State(scheduler): State<Arc<Scheduler<D>>>,
    Query(q): Query<IdQuery>,
) -> Json<Server> {
    Json(scheduler.stop(&q.id).unwrap_or_else(|| Server::unknown(q.id)))
}

/// `GET /api/remove`.
pub async fn remove<D: Driver + 'static>(
    State(scheduler): State<Arc<Scheduler<D>>>,
    Query(q): Query<IdQuery>,
) -> Json<Server> {
    Json(scheduler.remove(&q.id).unwrap_or_else(|| Server::unknown(q.id)))
}

#[derive(Deserialize)]
pub struct ConfigQuery {
    id: String,
    #[serde(flatten)]
    rest: BTreeMap<String, String>,
}

/// `GET /api/config` — merges recognized keys into `exhibitorOptions` or
/// `sharedOverride`; unrecognized keys are logged and ignored.
pub async fn config<D: Driver + 'static>(
    State(scheduler): State<Arc<Scheduler<D>>>,
    Query(q): Query<ConfigQuery>,
) -> Json<Server> {
    let mut exhibitor_options = BTreeMap::new();
    let mut shared_override = BTreeMap::new();
    for (key, value) in q.rest {
        if RECOGNIZED_EXHIBITOR_OPTIONS.contains(&key.as_str()) {
            exhibitor_options.insert(key, value);
        } else if RECOGNIZED_SHARED_OVERRIDE.contains(&key.as_str()) {
            shared_override.insert(key, value);
        } else {
            println!("ignoring unrecognized config key '{key}'");
        }
    }
    Json(
        scheduler
            .configure(&q.id, exhibitor_options, shared_override)
            .unwrap_or_else(|| Server::unknown(q.id)),
    )
}

/// `GET /api/status` — every server, insertion order.
pub async fn status<D: Driver + 'static>(
    State(scheduler): State<Arc<Scheduler<D>>>,
) -> Json<Vec<Server>> {
    Json(scheduler.all())
}
