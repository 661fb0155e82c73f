use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::constraint::Constraint;
use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Added,
    Stopped,
    Staging,
    Running,
    Reconciling,
    /// Synthetic state returned only by the control API for ids not present
    /// in the cluster.
    Unknown,
}

/// The most recently launched task for a server; back-links to the server
/// via the task id's middle segment (see [`task_id_to_server_id`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub slave_id: String,
    pub executor_id: String,
    /// The node attributes (hostname plus any text-valued offer attributes)
    /// observed at placement time.
    pub attributes: BTreeMap<String, String>,
}

/// Mints `exhibitor-<server_id>-<uuid>`. `server_id` must not contain `-`.
pub fn next_task_id(server_id: &str) -> String {
    format!("exhibitor-{server_id}-{}", Uuid::new_v4())
}

/// Recovers the server id from a task id minted by [`next_task_id`]. A UUID
/// contains internal `-`s, so the back-link is everything up to the *first*
/// dash after the prefix, not the last — `server_id` itself never contains
/// `-`, so that dash unambiguously terminates it.
pub fn task_id_to_server_id(task_id: &str) -> Option<&str> {
    let rest = task_id.strip_prefix("exhibitor-")?;
    let first_dash = rest.find('-')?;
    Some(&rest[..first_dash])
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: String,
    pub state: State,
    pub config: ServerConfig,
    #[serde(default = "default_constraints")]
    pub constraints: HashMap<String, Vec<Constraint>>,
    #[serde(default)]
    pub last_task: Option<Task>,
}

fn default_constraints() -> HashMap<String, Vec<Constraint>> {
    let mut m = HashMap::new();
    m.insert("hostname".to_string(), vec![Constraint::Unique]);
    m
}

impl Server {
    /// Constructs a new server in the `Added` state with default
    /// constraints (`hostname=unique`).
    pub fn new(id: impl Into<String>, config: ServerConfig) -> Result<Self, Error> {
        let id = id.into();
        if id.contains('-') {
            return Err(Error::InvalidServerId(id));
        }
        Ok(Self {
            id,
            state: State::Added,
            config,
            constraints: default_constraints(),
            last_task: None,
        })
    }

    pub fn is_launchable(&self) -> bool {
        self.state == State::Stopped
    }

    /// The synthetic server the control API returns for ids it doesn't
    /// recognize (state `Unknown`, never stored in a `Cluster`).
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: State::Unknown,
            config: ServerConfig::default(),
            constraints: HashMap::new(),
            last_task: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_round_trips_to_server_id() {
        for id in ["a", "zk1", "nodeA"] {
            let task_id = next_task_id(id);
            assert_eq!(task_id_to_server_id(&task_id), Some(id));
        }
    }

    #[test]
    fn rejects_ids_containing_dash() {
        assert!(Server::new("bad-id", ServerConfig::default()).is_err());
    }

    #[test]
    fn new_server_has_default_hostname_unique_constraint() {
        let s = Server::new("s1", ServerConfig::default()).unwrap();
        assert_eq!(s.state, State::Added);
        assert_eq!(s.constraints["hostname"], vec![Constraint::Unique]);
    }
}
