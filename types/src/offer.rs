use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::range::Range;

pub type OfferId = String;
pub type TaskId = String;
pub type SlaveId = String;

/// An advertisement from the cluster manager of currently-available
/// resources on one node.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: OfferId,
    pub slave_id: SlaveId,
    pub hostname: String,
    pub cpus: f64,
    pub mem: f64,
    pub ports: Vec<Range>,
    /// Text-valued node attributes (hostname is added separately by the
    /// matcher and does not need to appear here).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResources {
    pub cpus: f64,
    pub mem: f64,
    /// A single point `[p, p]` per spec.md's §8 testable property.
    pub ports: Range,
}

/// The executor descriptor carried by a [`TaskInfo`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorInfo {
    /// Names the executor by the server id.
    pub executor_id: String,
    pub framework_jar_uri: String,
    pub exhibitor_dist_uri: String,
    pub zookeeper_dist_uri: String,
    pub jdk_uri: String,
    pub s3credentials_uri: Option<String>,
    pub defaultconfig_uri: Option<String>,
    /// Places the JDK on `PATH` and invokes the executor entry point.
    pub command: String,
}

/// The task descriptor produced by matching a server against an offer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub task_id: TaskId,
    pub slave_id: SlaveId,
    pub resources: TaskResources,
    /// The serialized [`TaskPayload`], opaque to the cluster manager.
    pub payload: serde_json::Value,
    pub executor: ExecutorInfo,
}

/// The opaque task payload the executor reads to supervise Exhibitor (see
/// spec.md §6). Its key set is fixed by that contract and does not follow
/// [`crate::ServerConfig`]'s own field names or serde rename.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub exhibitor_config: BTreeMap<String, String>,
    pub shared_config_override: BTreeMap<String, String>,
    pub id: String,
    pub hostname: String,
    pub shared_config_change_backoff: u64,
    pub cpu: f64,
    pub mem: f64,
    /// Comma-range string (e.g. `"31015"`), matching [`crate::range::format_ranges`].
    pub ports: String,
}

/// Terminal or intermediate status of a task, as reported by the cluster
/// manager's `statusUpdate` callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Staging,
    Starting,
    Running,
    Finished,
    Failed,
    Killed,
    Lost,
    Error,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Finished | TaskState::Failed | TaskState::Killed | TaskState::Lost | TaskState::Error
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub task_id: TaskId,
    pub slave_id: Option<SlaveId>,
    pub state: TaskState,
}
