use std::collections::HashMap;

use crate::server::Server;
use crate::Error;

/// Ordered collection of [`Server`]s keyed by id. Insertion order defines the
/// reconciliation and offer-presentation order, and determines peer
/// attribute history for constraints (servers earlier in order contribute
/// attributes first).
#[derive(Clone, Debug, Default)]
pub struct Cluster {
    servers: Vec<Server>,
}

impl Cluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, server: Server) -> Result<(), Error> {
        if self.servers.iter().any(|s| s.id == server.id) {
            return Err(Error::DuplicateServerId(server.id));
        }
        self.servers.push(server);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Server> {
        let idx = self.servers.iter().position(|s| s.id == id)?;
        Some(self.servers.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Server> {
        self.servers.iter_mut().find(|s| s.id == id)
    }

    /// All servers, in insertion order.
    pub fn all(&self) -> &[Server] {
        &self.servers
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut Server> {
        self.servers.iter_mut()
    }

    /// For each other server whose `last_task` exists, projects its task
    /// attributes into a `attribute -> history` mapping. Servers in `Added`
    /// state (no prior task) contribute nothing. `hostname` is always
    /// available via `last_task.attributes["hostname"]`.
    pub fn peer_attributes(&self, excluding_id: &str) -> HashMap<String, Vec<String>> {
        let mut out: HashMap<String, Vec<String>> = HashMap::new();
        for server in &self.servers {
            if server.id == excluding_id {
                continue;
            }
            let Some(task) = &server.last_task else {
                continue;
            };
            for (attr, value) in &task.attributes {
                out.entry(attr.clone()).or_default().push(value.clone());
            }
        }
        out
    }
}
