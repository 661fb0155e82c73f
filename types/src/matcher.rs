use std::collections::{BTreeMap, HashMap};

use crate::offer::{ExecutorInfo, Offer, TaskInfo, TaskPayload, TaskResources};
use crate::range::Range;
use crate::server::{next_task_id, Server};

/// Artifact URIs the task's executor descriptor is built from (see
/// SPEC_FULL.md §6a — these point at the artifact HTTP file server, an
/// external collaborator not implemented by this crate).
#[derive(Clone, Debug)]
pub struct ArtifactUris {
    pub framework_jar: String,
    pub exhibitor_dist: String,
    pub zookeeper_dist: String,
    pub jdk: String,
}

/// Matches `offer` against `server`'s configuration and placement
/// constraints, checking in the fixed order: port, cpu, memory, attributes.
/// Each check short-circuits. Returns a human-readable rejection reason, or
/// `None` on success (the reason is logged, never surfaced to the operator
/// as an error — see SPEC_FULL.md §7).
pub fn matches(
    server: &Server,
    offer: &Offer,
    peer_attributes: &HashMap<String, Vec<String>>,
) -> Option<String> {
    let port = match pick_port(&server.config.ports, &offer.ports) {
        Some(p) => p,
        None => return Some("no offered port satisfies configured port ranges".to_string()),
    };
    let _ = port;

    if offer.cpus < server.config.cpus {
        return Some(format!(
            "cpus {} < required {}",
            offer.cpus, server.config.cpus
        ));
    }

    if offer.mem < server.config.mem {
        return Some(format!(
            "mem {} < required {}",
            offer.mem, server.config.mem
        ));
    }

    let attributes = build_attribute_map(offer);
    for (attr, constraints) in &server.constraints {
        let Some(value) = attributes.get(attr) else {
            return Some(format!("attribute '{attr}' is not offered"));
        };
        let empty = Vec::new();
        let history = peer_attributes.get(attr).unwrap_or(&empty);
        for constraint in constraints {
            if !constraint.matches(value, history) {
                return Some(format!(
                    "{attr} doesn't match {}",
                    constraint.to_expr()
                ));
            }
        }
    }

    None
}

/// Lowest offered port satisfying `configured` (any port if empty).
fn pick_port(configured: &[Range], offered: &[Range]) -> Option<i64> {
    let mut candidates: Vec<i64> = Vec::new();
    for offered_range in offered {
        if configured.is_empty() {
            candidates.push(offered_range.start);
            continue;
        }
        for configured_range in configured {
            if let Some(overlap) = offered_range.overlap(configured_range) {
                candidates.push(overlap.start);
            }
        }
    }
    candidates.into_iter().min()
}

fn build_attribute_map(offer: &Offer) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    attributes.insert("hostname".to_string(), offer.hostname.clone());
    for (k, v) in &offer.attributes {
        attributes.insert(k.clone(), v.clone());
    }
    attributes
}

/// The node attributes (hostname plus text-valued offer attributes) a task
/// placed by this offer would record. Exposed so the scheduler can build the
/// [`crate::Task`] it attaches to `last_task` after a successful launch.
pub fn attribute_snapshot(offer: &Offer) -> BTreeMap<String, String> {
    build_attribute_map(offer)
}

/// Builds the task descriptor for a server that has already matched `offer`
/// via [`matches`]. Mutates `server.config` to record the chosen port and
/// placement hostname, exactly as spec.md §4.3 prescribes.
pub fn build_task(server: &mut Server, offer: &Offer, artifacts: &ArtifactUris) -> TaskInfo {
    let port = pick_port(&server.config.ports, &offer.ports)
        .expect("build_task called after a failed match");

    server
        .config
        .exhibitor_options
        .insert("port".to_string(), port.to_string());
    server.config.hostname = Some(offer.hostname.clone());

    let task_id = next_task_id(&server.id);

    let s3credentials_uri = server
        .config
        .exhibitor_options
        .get("s3credentials")
        .map(|_| format!("s3credentials/{}", server.id));
    let defaultconfig_uri = server
        .config
        .exhibitor_options
        .get("defaultconfig")
        .map(|_| format!("defaultconfig/{}", server.id));

    let payload = TaskPayload {
        exhibitor_config: server.config.exhibitor_options.clone(),
        shared_config_override: server.config.shared_override.clone(),
        id: server.id.clone(),
        hostname: offer.hostname.clone(),
        shared_config_change_backoff: server.config.shared_config_change_backoff,
        cpu: server.config.cpus,
        mem: server.config.mem,
        ports: Range::point(port).to_string(),
    };

    let executor = ExecutorInfo {
        executor_id: server.id.clone(),
        framework_jar_uri: artifacts.framework_jar.clone(),
        exhibitor_dist_uri: artifacts.exhibitor_dist.clone(),
        zookeeper_dist_uri: artifacts.zookeeper_dist.clone(),
        jdk_uri: artifacts.jdk.clone(),
        s3credentials_uri,
        defaultconfig_uri,
        command: "PATH=$MESOS_SANDBOX/jdk/bin:$PATH $MESOS_SANDBOX/exhibitor-executor"
            .to_string(),
    };

    TaskInfo {
        task_id,
        slave_id: offer.slave_id.clone(),
        resources: TaskResources {
            cpus: server.config.cpus,
            mem: server.config.mem,
            ports: Range::point(port),
        },
        payload: serde_json::to_value(&payload).expect("TaskPayload always serializes"),
        executor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::constraint::Constraint;
    use crate::server::Server;
    use std::collections::HashMap;

    fn offer(hostname: &str, cpus: f64, mem: f64, ports: Vec<Range>) -> Offer {
        Offer {
            id: "offer-1".to_string(),
            slave_id: "slave-1".to_string(),
            hostname: hostname.to_string(),
            cpus,
            mem,
            ports,
            attributes: BTreeMap::new(),
        }
    }

    fn artifacts() -> ArtifactUris {
        ArtifactUris {
            framework_jar: "jar/framework.jar".to_string(),
            exhibitor_dist: "exhibitor/exhibitor.tar.gz".to_string(),
            zookeeper_dist: "zookeeper/zookeeper.tar.gz".to_string(),
            jdk: "jdk/jdk.tar.gz".to_string(),
        }
    }

    #[test]
    fn picks_lowest_offered_port_when_unconstrained() {
        let mut server = Server::new("s1", ServerConfig::default()).unwrap();
        let offer = offer("h1", 1.0, 512.0, vec![Range::new(31000, 31005)]);
        assert!(matches(&server, &offer, &HashMap::new()).is_none());
        let task = build_task(&mut server, &offer, &artifacts());
        assert_eq!(task.resources.ports, Range::point(31000));
    }

    #[test]
    fn picks_lowest_port_within_configured_ranges() {
        let config = ServerConfig {
            ports: vec![Range::new(31010, 31020)],
            ..ServerConfig::default()
        };
        let mut server = Server::new("s1", config).unwrap();
        let offer = offer(
            "h1",
            1.0,
            512.0,
            vec![Range::new(31000, 31005), Range::new(31015, 31018)],
        );
        assert!(matches(&server, &offer, &HashMap::new()).is_none());
        let task = build_task(&mut server, &offer, &artifacts());
        assert_eq!(task.resources.ports, Range::point(31015));
    }

    #[test]
    fn declines_on_unique_hostname_conflict() {
        let server = Server::new("s2", ServerConfig::default()).unwrap();
        let offer = offer("h1", 1.0, 512.0, vec![Range::new(31000, 31005)]);
        let mut peers = HashMap::new();
        peers.insert("hostname".to_string(), vec!["h1".to_string()]);
        let reason = matches(&server, &offer, &peers).unwrap();
        assert!(reason.contains("hostname"));
        assert!(reason.contains("unique"));
    }

    #[test]
    fn group_by_rejects_only_the_overloaded_group() {
        let mut a = Server::new("a", ServerConfig::default()).unwrap();
        a.constraints.clear();
        a.constraints.insert("rack".to_string(), vec![Constraint::GroupBy(1)]);
        let offer_with = |rack: &str| {
            let mut o = offer("h1", 1.0, 512.0, vec![Range::new(31000, 31005)]);
            o.attributes.insert("rack".to_string(), rack.to_string());
            o
        };

        // rack A already has two placements, rack B has one: A is ahead of
        // the pack and must wait for B to catch up before growing further.
        let mut peers = HashMap::new();
        peers.insert(
            "rack".to_string(),
            vec!["A".to_string(), "A".to_string(), "B".to_string()],
        );

        assert!(matches(&a, &offer_with("A"), &peers).is_some());
        assert!(matches(&a, &offer_with("B"), &peers).is_none());
        assert!(matches(&a, &offer_with("C"), &peers).is_none());
    }

    #[test]
    fn payload_carries_the_literal_wire_key_set() {
        let mut config = ServerConfig::default();
        config.exhibitor_options.insert("configtype".to_string(), "s3".to_string());
        let mut server = Server::new("s1", config).unwrap();
        let offer = offer("h1", 1.0, 512.0, vec![Range::new(31000, 31005)]);
        let task = build_task(&mut server, &offer, &artifacts());
        let payload = task.payload.as_object().unwrap();

        let keys: std::collections::BTreeSet<_> = payload.keys().cloned().collect();
        let expected: std::collections::BTreeSet<_> = [
            "exhibitorConfig",
            "sharedConfigOverride",
            "id",
            "hostname",
            "sharedConfigChangeBackoff",
            "cpu",
            "mem",
            "ports",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(keys, expected);

        assert_eq!(payload["id"], "s1");
        assert_eq!(payload["hostname"], "h1");
        assert_eq!(payload["ports"], "31000");
        assert_eq!(payload["exhibitorConfig"]["configtype"], "s3");
    }

    #[test]
    fn ports_resource_is_single_point_and_offered() {
        let config = ServerConfig {
            ports: vec![Range::new(31010, 31020)],
            ..ServerConfig::default()
        };
        let mut server = Server::new("s1", config).unwrap();
        let offer = offer("h1", 1.0, 512.0, vec![Range::new(31000, 31020)]);
        let task = build_task(&mut server, &offer, &artifacts());
        assert_eq!(task.resources.ports.start, task.resources.ports.end);
        assert!(offer.ports.iter().any(|r| r.contains(task.resources.ports.start)));
    }
}
