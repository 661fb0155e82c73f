use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::range::Range;

fn default_cpus() -> f64 {
    0.2
}

fn default_mem() -> f64 {
    256.0
}

fn default_backoff_ms() -> u64 {
    10_000
}

/// Per-server desired configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Passthrough configuration for the supervised Exhibitor process.
    #[serde(default)]
    pub exhibitor_options: BTreeMap<String, String>,

    /// Overrides injected into ensemble-wide shared config.
    #[serde(default)]
    pub shared_override: BTreeMap<String, String>,

    #[serde(default = "default_cpus")]
    pub cpus: f64,

    /// Memory, in MiB.
    #[serde(default = "default_mem")]
    pub mem: f64,

    /// Candidate port ranges. Empty means "any port the offer provides".
    #[serde(default)]
    pub ports: Vec<Range>,

    #[serde(default = "default_backoff_ms")]
    pub shared_config_change_backoff: u64,

    /// Filled in when the server is placed on an offer.
    #[serde(default)]
    pub hostname: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            exhibitor_options: BTreeMap::new(),
            shared_override: BTreeMap::new(),
            cpus: default_cpus(),
            mem: default_mem(),
            ports: Vec::new(),
            shared_config_change_backoff: default_backoff_ms(),
            hostname: None,
        }
    }
}

/// Exhibitor option keys recognized by `/api/config`.
pub const RECOGNIZED_EXHIBITOR_OPTIONS: &[&str] = &[
    "configtype",
    "zkconfigconnect",
    "zkconfigzpath",
    "s3credentials",
    "s3region",
    "s3config",
    "s3configprefix",
];

/// Shared-override keys recognized by `/api/config`.
pub const RECOGNIZED_SHARED_OVERRIDE: &[&str] =
    &["zookeeper-install-directory", "zookeeper-data-directory"];
