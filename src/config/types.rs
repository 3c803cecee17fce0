use serde::{Deserialize, Serialize};

/// Contents of a `.kube-score.toml` file.
///
/// Every key is optional. Command-line flags override scalar values and
/// extend the list values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Check IDs that never run.
    pub ignore_tests: Vec<String>,
    /// Optional check IDs to switch on.
    pub enable_optional_tests: Vec<String>,
    /// Target cluster version, e.g. `v1.24`.
    pub kubernetes_version: Option<String>,
    pub ignore_container_cpu_limit: bool,
    pub ignore_container_memory_limit: bool,
    pub disable_ignore_checks_annotations: bool,
    pub exit_one_on_warning: bool,
    /// One of human, ci, json or sarif.
    pub output_format: Option<String>,
}
