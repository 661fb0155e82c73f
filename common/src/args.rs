use clap::Parser;

/// Process-level configuration. No durable config store is used; everything
/// is argv/env per invocation (see SPEC_FULL.md Non-goals).
#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// Address the control-plane HTTP API (plus health/metrics routes) binds to.
    #[arg(long, env = "CONTROL_API_BIND", default_value = "0.0.0.0:8080")]
    pub control_api_bind: String,

    /// Address of the two-level resource-offer cluster manager's master.
    #[arg(long, env = "CLUSTER_MANAGER_MASTER", default_value = "zk://localhost:2181/mesos")]
    pub cluster_manager_master: String,

    /// Principal this framework registers as with the cluster manager.
    #[arg(long, env = "FRAMEWORK_PRINCIPAL", default_value = "exhibitor-scheduler")]
    pub framework_principal: String,

    /// Framework role; used when declining offers that don't match this role.
    #[arg(long, env = "FRAMEWORK_ROLE", default_value = "*")]
    pub framework_role: String,

    /// Base URL artifacts (jar/exhibitor/zookeeper/jdk dists) are served from.
    /// Points at the artifact HTTP file server, an external collaborator
    /// (see SPEC_FULL.md §1) not implemented by this crate.
    #[arg(long, env = "ARTIFACT_BASE_URL", default_value = "http://localhost:8082")]
    pub artifact_base_url: String,
}
