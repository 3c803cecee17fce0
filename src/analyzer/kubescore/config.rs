//! Run policy for a scoring run.
//!
//! A `ScoreConfig` is built once before scoring starts and is never mutated
//! while checks execute.

use crate::analyzer::kubescore::version::KubernetesVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration consulted by the executor and handed to every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreConfig {
    /// Drop the `container-cpu-limit` check from the applicable set.
    #[serde(default)]
    pub ignore_container_cpu_limit: bool,

    /// Drop the `container-memory-limit` check from the applicable set.
    #[serde(default)]
    pub ignore_container_memory_limit: bool,

    /// Check IDs that never run.
    #[serde(default)]
    pub ignored_tests: HashSet<String>,

    /// Optional check IDs that are switched on.
    #[serde(default)]
    pub enabled_optional_tests: HashSet<String>,

    /// Honor the `kube-score/ignore` annotation.
    #[serde(default = "default_true")]
    pub use_ignore_annotation: bool,

    /// Version of the target cluster.
    #[serde(default)]
    pub kubernetes_version: KubernetesVersion,
}

fn default_true() -> bool {
    true
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            ignore_container_cpu_limit: false,
            ignore_container_memory_limit: false,
            ignored_tests: HashSet::new(),
            enabled_optional_tests: HashSet::new(),
            use_ignore_annotation: true,
            kubernetes_version: KubernetesVersion::default(),
        }
    }
}

impl ScoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_test(mut self, id: impl Into<String>) -> Self {
        self.ignored_tests.insert(id.into());
        self
    }

    pub fn enable_optional_test(mut self, id: impl Into<String>) -> Self {
        self.enabled_optional_tests.insert(id.into());
        self
    }

    pub fn with_ignore_container_cpu_limit(mut self, ignore: bool) -> Self {
        self.ignore_container_cpu_limit = ignore;
        self
    }

    pub fn with_ignore_container_memory_limit(mut self, ignore: bool) -> Self {
        self.ignore_container_memory_limit = ignore;
        self
    }

    pub fn with_ignore_annotation(mut self, enabled: bool) -> Self {
        self.use_ignore_annotation = enabled;
        self
    }

    pub fn with_kubernetes_version(mut self, version: KubernetesVersion) -> Self {
        self.kubernetes_version = version;
        self
    }

    pub fn is_test_ignored(&self, id: &str) -> bool {
        self.ignored_tests.contains(id)
    }

    pub fn is_optional_test_enabled(&self, id: &str) -> bool {
        self.enabled_optional_tests.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScoreConfig::default();
        assert!(!config.ignore_container_cpu_limit);
        assert!(!config.ignore_container_memory_limit);
        assert!(config.ignored_tests.is_empty());
        assert!(config.enabled_optional_tests.is_empty());
        assert!(config.use_ignore_annotation);
        assert_eq!(config.kubernetes_version, KubernetesVersion::new(1, 18));
    }

    #[test]
    fn test_config_builder() {
        let config = ScoreConfig::new()
            .ignore_test("container-image-tag")
            .enable_optional_test("deployment-replicas")
            .with_ignore_annotation(false)
            .with_kubernetes_version(KubernetesVersion::new(1, 25));

        assert!(config.is_test_ignored("container-image-tag"));
        assert!(!config.is_test_ignored("pod-probes"));
        assert!(config.is_optional_test_enabled("deployment-replicas"));
        assert!(!config.use_ignore_annotation);
        assert_eq!(config.kubernetes_version.minor, 25);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: ScoreConfig = serde_json::from_str(r#"{"kubernetesVersion":"v1.21"}"#).unwrap();
        assert!(config.use_ignore_annotation);
        assert_eq!(config.kubernetes_version, KubernetesVersion::new(1, 21));
    }
}
