use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use exhibitor_types::{
    matcher, Cluster, Constraint, Offer, Server, ServerConfig, State, Task, TaskState, TaskStatus,
};

use crate::driver::Driver;
use crate::error::Error;

/// Critical-section state: the cluster plus the bookkeeping an explicit
/// `stop`/`remove` needs to tell an operator-requested kill apart from an
/// organic task failure once the terminal status lands (see
/// SPEC_FULL.md §3a).
struct SchedulerState {
    cluster: Cluster,
    pending_stop: HashSet<String>,
}

/// Owns every `Server`'s state transitions. The control API only ever reaches
/// the cluster through these entry points; it never locks `Cluster` itself.
/// Mirrors the single-logical-critical-section model of spec.md §5.
pub struct Scheduler<D: Driver> {
    state: Mutex<SchedulerState>,
    driver: Arc<D>,
    artifacts: matcher::ArtifactUris,
    framework_id: Mutex<Option<String>>,
}

impl<D: Driver> Scheduler<D> {
    pub fn new(driver: Arc<D>, artifacts: matcher::ArtifactUris) -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                cluster: Cluster::new(),
                pending_stop: HashSet::new(),
            }),
            driver,
            artifacts,
            framework_id: Mutex::new(None),
        }
    }

    /// Records the framework id assigned by the cluster manager and
    /// schedules an immediate reconcile. Held in memory only — never
    /// persisted, per spec.md §5.
    pub fn registered(&self, framework_id: String) {
        *self.framework_id.lock().unwrap() = Some(framework_id);
        self.reconcile();
    }

    pub fn reregistered(&self) {
        self.reconcile();
    }

    pub fn framework_id(&self) -> Option<String> {
        self.framework_id.lock().unwrap().clone()
    }

    pub fn add(
        &self,
        id: impl Into<String>,
        config: ServerConfig,
        constraints: Option<std::collections::HashMap<String, Vec<Constraint>>>,
    ) -> Result<Server, Error> {
        let mut server = Server::new(id, config)?;
        if let Some(constraints) = constraints {
            server.constraints = constraints;
        }
        let mut state = self.state.lock().unwrap();
        state.cluster.add(server.clone())?;
        Ok(server)
    }

    /// `Added` -> `Stopped`. Idempotent on any other state.
    pub fn start(&self, id: &str) -> Option<Server> {
        let mut state = self.state.lock().unwrap();
        let server = state.cluster.get_mut(id)?;
        if server.state == State::Added {
            server.state = State::Stopped;
        }
        Some(server.clone())
    }

    /// Issues a kill for `last_task` if the server is active, and marks it to
    /// land on `Added` (not `Stopped`) once the terminal status arrives.
    /// Idempotent on `Added`/`Stopped`.
    pub fn stop(&self, id: &str) -> Option<Server> {
        let mut state = self.state.lock().unwrap();
        let task_id = {
            let server = state.cluster.get(id)?;
            match server.state {
                State::Staging | State::Running | State::Reconciling => {
                    server.last_task.as_ref().map(|t| t.task_id.clone())
                }
                _ => None,
            }
        };
        if let Some(task_id) = task_id {
            state.pending_stop.insert(id.to_string());
            self.driver.kill(task_id);
        }
        state.cluster.get(id).cloned()
    }

    /// Kills the active task (if any) and removes the server unconditionally;
    /// does not wait for the kill to be acknowledged.
    pub fn remove(&self, id: &str) -> Option<Server> {
        let mut state = self.state.lock().unwrap();
        if let Some(server) = state.cluster.get(id)
            && matches!(
                server.state,
                State::Staging | State::Running | State::Reconciling
            )
            && let Some(task_id) = server.last_task.as_ref().map(|t| t.task_id.clone())
        {
            self.driver.kill(task_id);
        }
        state.pending_stop.remove(id);
        state.cluster.remove(id)
    }

    /// Merges recognized `exhibitor_options`/`shared_override` keys into the
    /// server's config; unrecognized keys are logged and dropped (see
    /// spec.md §4.6).
    pub fn configure(
        &self,
        id: &str,
        exhibitor_options: std::collections::BTreeMap<String, String>,
        shared_override: std::collections::BTreeMap<String, String>,
    ) -> Option<Server> {
        let mut state = self.state.lock().unwrap();
        let server = state.cluster.get_mut(id)?;
        for (k, v) in exhibitor_options {
            if exhibitor_types::RECOGNIZED_EXHIBITOR_OPTIONS.contains(&k.as_str()) {
                server.config.exhibitor_options.insert(k, v);
            } else {
                println!("ignoring unrecognized exhibitor option '{k}'");
            }
        }
        for (k, v) in shared_override {
            if exhibitor_types::RECOGNIZED_SHARED_OVERRIDE.contains(&k.as_str()) {
                server.config.shared_override.insert(k, v);
            } else {
                println!("ignoring unrecognized shared override '{k}'");
            }
        }
        Some(server.clone())
    }

    pub fn get(&self, id: &str) -> Option<Server> {
        self.state.lock().unwrap().cluster.get(id).cloned()
    }

    pub fn all(&self) -> Vec<Server> {
        self.state.lock().unwrap().cluster.all().to_vec()
    }

    /// Blocking, cooperative poll for `id` reaching `target` (100ms
    /// granularity), per spec.md §5. Returns `false` on timeout or if the
    /// server disappears (removed).
    pub fn wait_for(&self, id: &str, target: State, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            match self.get(id) {
                Some(server) if server.state == target => return true,
                Some(_) => {}
                None => return false,
            }
            if start.elapsed() >= timeout {
                return false;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    /// Matches every offer against the first launchable, constraint-
    /// satisfying server (in cluster order); launches at most one task per
    /// offer, declining outright if none match.
    pub fn on_offers(&self, offers: Vec<Offer>) {
        for offer in offers {
            self.on_offer(offer);
        }
    }

    fn on_offer(&self, offer: Offer) {
        #[cfg(feature = "metrics")]
        metrics::counter!("exhibitor_offers_seen_total").increment(1);

        let mut state = self.state.lock().unwrap();
        let ids: Vec<String> = state.cluster.all().iter().map(|s| s.id.clone()).collect();
        for id in &ids {
            let peers = state.cluster.peer_attributes(id);
            let Some(server) = state.cluster.get(id) else {
                continue;
            };
            if !server.is_launchable() {
                continue;
            }
            if matcher::matches(server, &offer, &peers).is_some() {
                continue;
            }
            let server_mut = state.cluster.get_mut(id).expect("id just looked up");
            let task = matcher::build_task(server_mut, &offer, &self.artifacts);
            let attributes = matcher::attribute_snapshot(&offer);
            server_mut.last_task = Some(Task {
                task_id: task.task_id.clone(),
                slave_id: offer.slave_id.clone(),
                executor_id: task.executor.executor_id.clone(),
                attributes,
            });
            server_mut.state = State::Staging;
            #[cfg(feature = "metrics")]
            metrics::counter!("exhibitor_tasks_launched_total").increment(1);
            self.driver.launch(offer.id, vec![task]);
            return;
        }
        #[cfg(feature = "metrics")]
        metrics::counter!("exhibitor_offers_declined_total").increment(1);
        self.driver.decline(offer.id);
    }

    /// Applies a status update from the cluster manager. Unknown task ids
    /// (decoded via [`exhibitor_types::task_id_to_server_id`]) are ignored,
    /// except a `Running` update for a server no longer tracked, which is
    /// killed outright — see spec.md §4.5.
    pub fn on_status(&self, update: TaskStatus) {
        let Some(server_id) = exhibitor_types::task_id_to_server_id(&update.task_id) else {
            return;
        };
        let mut state = self.state.lock().unwrap();
        if state.cluster.get(server_id).is_none() {
            if update.state == TaskState::Running {
                self.driver.kill(update.task_id);
            }
            return;
        }

        match update.state {
            TaskState::Running => {
                let server_id = server_id.to_string();
                let task_id = update.task_id.clone();
                let slave_id = update.slave_id.clone().unwrap_or_default();
                let server = state.cluster.get_mut(&server_id).unwrap();
                server.state = State::Running;
                if server.last_task.is_none() {
                    server.last_task = Some(Task {
                        task_id,
                        slave_id,
                        executor_id: server_id,
                        attributes: Default::default(),
                    });
                }
            }
            TaskState::Staging | TaskState::Starting => {}
            other if other.is_terminal() => {
                #[cfg(feature = "metrics")]
                metrics::counter!(
                    "exhibitor_status_updates_total",
                    "state" => format!("{other:?}")
                )
                .increment(1);

                let became_added = state.pending_stop.remove(server_id);
                let server = state.cluster.get_mut(server_id).unwrap();
                server.state = if became_added {
                    State::Added
                } else {
                    State::Stopped
                };
                server.last_task = None;
            }
            _ => {}
        }
    }

    /// Transitions every active server to `Reconciling` and asks the driver
    /// to reconcile their last-known tasks. No timeout: an operator sees
    /// `Reconciling` until a status update resolves it.
    pub fn reconcile(&self) {
        #[cfg(feature = "metrics")]
        metrics::counter!("exhibitor_reconcile_cycles_total").increment(1);

        let mut state = self.state.lock().unwrap();
        let mut statuses = Vec::new();
        for server in state.cluster.all_mut() {
            if matches!(server.state, State::Added | State::Stopped) {
                continue;
            }
            server.state = State::Reconciling;
            if let Some(task) = &server.last_task {
                statuses.push(TaskStatus {
                    task_id: task.task_id.clone(),
                    slave_id: Some(task.slave_id.clone()),
                    state: TaskState::Running,
                });
            }
        }
        if !statuses.is_empty() {
            self.driver.reconcile(statuses);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::recording::{Call, RecordingDriver};
    use std::collections::BTreeMap;

    fn artifacts() -> matcher::ArtifactUris {
        matcher::ArtifactUris {
            framework_jar: "jar".into(),
            exhibitor_dist: "exhibitor".into(),
            zookeeper_dist: "zookeeper".into(),
            jdk: "jdk".into(),
        }
    }

    fn offer(hostname: &str) -> Offer {
        Offer {
            id: "offer-1".into(),
            slave_id: "slave-1".into(),
            hostname: hostname.into(),
            cpus: 1.0,
            mem: 512.0,
            ports: vec![exhibitor_types::Range::new(31000, 31010)],
            attributes: BTreeMap::new(),
        }
    }

    fn scheduler() -> Scheduler<RecordingDriver> {
        Scheduler::new(Arc::new(RecordingDriver::default()), artifacts())
    }

    #[test]
    fn added_server_is_not_launched_until_started() {
        let sched = scheduler();
        sched.add("a", ServerConfig::default(), None).unwrap();
        sched.on_offers(vec![offer("h1")]);
        let calls = sched.driver.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], Call::Decline(_)));
    }

    #[test]
    fn full_lifecycle_launch_run_fail_relaunch() {
        let sched = scheduler();
        sched.add("a", ServerConfig::default(), None).unwrap();
        sched.start("a").unwrap();

        sched.on_offers(vec![offer("h1")]);
        let launched = sched.get("a").unwrap();
        assert_eq!(launched.state, State::Staging);
        let task_id = launched.last_task.unwrap().task_id;

        sched.on_status(TaskStatus {
            task_id: task_id.clone(),
            slave_id: Some("slave-1".into()),
            state: TaskState::Running,
        });
        assert_eq!(sched.get("a").unwrap().state, State::Running);

        sched.on_status(TaskStatus {
            task_id,
            slave_id: Some("slave-1".into()),
            state: TaskState::Lost,
        });
        let after_fail = sched.get("a").unwrap();
        assert_eq!(after_fail.state, State::Stopped);
        assert!(after_fail.last_task.is_none());
    }

    #[test]
    fn explicit_stop_lands_on_added_not_stopped() {
        let sched = scheduler();
        sched.add("a", ServerConfig::default(), None).unwrap();
        sched.start("a").unwrap();
        sched.on_offers(vec![offer("h1")]);
        let task_id = sched.get("a").unwrap().last_task.unwrap().task_id;

        sched.stop("a");
        assert!(sched
            .driver
            .calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| matches!(c, Call::Kill(id) if *id == task_id)));

        sched.on_status(TaskStatus {
            task_id,
            slave_id: None,
            state: TaskState::Killed,
        });
        assert_eq!(sched.get("a").unwrap().state, State::Added);
    }

    #[test]
    fn remove_kills_and_drops_immediately() {
        let sched = scheduler();
        sched.add("a", ServerConfig::default(), None).unwrap();
        sched.start("a").unwrap();
        sched.on_offers(vec![offer("h1")]);

        sched.remove("a");
        assert!(sched.get("a").is_none());
        assert!(sched
            .driver
            .calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| matches!(c, Call::Kill(_))));
    }

    #[test]
    fn status_for_unknown_running_task_is_killed() {
        let sched = scheduler();
        sched.on_status(TaskStatus {
            task_id: "exhibitor-ghost-deadbeef".into(),
            slave_id: None,
            state: TaskState::Running,
        });
        assert!(matches!(
            sched.driver.calls.lock().unwrap()[0],
            Call::Kill(_)
        ));
    }

    #[test]
    fn reconcile_moves_active_servers_and_emits_last_tasks() {
        let sched = scheduler();
        sched.add("a", ServerConfig::default(), None).unwrap();
        sched.start("a").unwrap();
        sched.on_offers(vec![offer("h1")]);
        sched.on_status(TaskStatus {
            task_id: sched.get("a").unwrap().last_task.unwrap().task_id,
            slave_id: Some("slave-1".into()),
            state: TaskState::Running,
        });

        sched.reconcile();
        assert_eq!(sched.get("a").unwrap().state, State::Reconciling);
        assert!(sched
            .driver
            .calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| matches!(c, Call::Reconcile(ids) if ids.len() == 1)));
    }
}
