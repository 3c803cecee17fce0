//! Checks that apply to every object: label syntax and API stability.

use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::Resource;
use crate::analyzer::kubescore::registry::{Check, CheckError, CheckRegistry, RegistryError};
use crate::analyzer::kubescore::types::{Comment, Finding, Grade, TargetKind};
use crate::analyzer::kubescore::version::KubernetesVersion;
use once_cell::sync::Lazy;
use regex::Regex;

const MAX_LABEL_VALUE_LEN: usize = 63;

static LABEL_VALUE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").expect("static regex")
});

/// A deprecated (apiVersion, kind) pair and its replacement.
struct Deprecation {
    api_version: &'static str,
    kind: &'static str,
    replacement: &'static str,
    available_since: KubernetesVersion,
}

const fn deprecation(
    api_version: &'static str,
    kind: &'static str,
    replacement: &'static str,
    major: u32,
    minor: u32,
) -> Deprecation {
    Deprecation {
        api_version,
        kind,
        replacement,
        available_since: KubernetesVersion::new(major, minor),
    }
}

/// Most preferred replacement first for each pair.
const DEPRECATIONS: &[Deprecation] = &[
    deprecation("extensions/v1beta1", "Deployment", "apps/v1", 1, 9),
    deprecation("apps/v1beta1", "Deployment", "apps/v1", 1, 9),
    deprecation("apps/v1beta2", "Deployment", "apps/v1", 1, 9),
    deprecation("apps/v1beta1", "StatefulSet", "apps/v1", 1, 9),
    deprecation("apps/v1beta2", "StatefulSet", "apps/v1", 1, 9),
    deprecation("extensions/v1beta1", "DaemonSet", "apps/v1", 1, 9),
    deprecation("apps/v1beta2", "DaemonSet", "apps/v1", 1, 9),
    deprecation("extensions/v1beta1", "ReplicaSet", "apps/v1", 1, 9),
    deprecation("apps/v1beta2", "ReplicaSet", "apps/v1", 1, 9),
    deprecation("extensions/v1beta1", "NetworkPolicy", "networking.k8s.io/v1", 1, 8),
    deprecation("extensions/v1beta1", "Ingress", "networking.k8s.io/v1", 1, 19),
    deprecation("extensions/v1beta1", "Ingress", "networking.k8s.io/v1beta1", 1, 14),
    deprecation("networking.k8s.io/v1beta1", "Ingress", "networking.k8s.io/v1", 1, 19),
    deprecation("batch/v2alpha1", "CronJob", "batch/v1", 1, 21),
    deprecation("batch/v2alpha1", "CronJob", "batch/v1beta1", 1, 8),
    deprecation("batch/v1beta1", "CronJob", "batch/v1", 1, 21),
    deprecation("policy/v1beta1", "PodDisruptionBudget", "policy/v1", 1, 21),
    deprecation("autoscaling/v2beta1", "HorizontalPodAutoscaler", "autoscaling/v2", 1, 23),
    deprecation("autoscaling/v2beta2", "HorizontalPodAutoscaler", "autoscaling/v2", 1, 23),
];

pub fn register(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(Check::new(
        "label-values",
        "Label Values",
        TargetKind::Any,
        "Validates label values",
        label_values,
    ))?;
    registry.register(Check::new(
        "stable-version",
        "Stable version",
        TargetKind::Any,
        "Checks if the object is using a deprecated apiVersion",
        stable_version,
    ))?;
    Ok(())
}

pub fn is_valid_label_value(value: &str) -> bool {
    value.len() <= MAX_LABEL_VALUE_LEN && LABEL_VALUE_REGEX.is_match(value)
}

fn label_values(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let comments = resource
        .labels
        .iter()
        .filter(|(_, value)| !is_valid_label_value(value))
        .map(|(key, value)| {
            Comment::new(
                key.as_str(),
                "Invalid label value",
                format!(
                    "The label value \"{value}\" is invalid. Values must be at most 63 characters, start and end with an alphanumeric character, and contain only alphanumerics, '-', '_' or '.'"
                ),
            )
        })
        .collect();
    Ok(Finding::from_problems(Grade::Critical, comments))
}

fn stable_version(resource: &Resource, config: &ScoreConfig) -> Result<Finding, CheckError> {
    let kind = resource.kind().as_str();
    let replacement = DEPRECATIONS.iter().find(|d| {
        d.api_version == resource.api_version()
            && d.kind == kind
            && config.kubernetes_version >= d.available_since
    });

    let Some(d) = replacement else {
        return Ok(Finding::ok());
    };

    Ok(Finding::new(Grade::Warning).with_comment(Comment::new(
        "",
        format!("The apiVersion and kind {}/{} is deprecated", d.api_version, d.kind),
        format!(
            "It's recommended to use {}/{} instead which has been available since Kubernetes {}",
            d.replacement, d.kind, d.available_since
        ),
    )))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{run, run_with};
    use super::*;

    #[test]
    fn test_label_value_syntax() {
        for ok in ["", "web", "v1.2.3", "a_b-c", "A1"] {
            assert!(is_valid_label_value(ok), "{ok:?}");
        }
        for bad in ["-web", "web-", "has space", "a/b", "x".repeat(64).as_str()] {
            assert!(!is_valid_label_value(bad), "{bad:?}");
        }
    }

    #[test]
    fn test_label_values_check() {
        let yaml = "apiVersion: v1
kind: ConfigMap
metadata:
  name: c
  labels:
    good: fine
    bad: \"-nope\"
";
        let finding = run("label-values", yaml);
        assert_eq!(finding.grade, Grade::Critical);
        assert_eq!(finding.comments.len(), 1);
        assert_eq!(finding.comments[0].path, "bad");
    }

    #[test]
    fn test_stable_version_respects_cluster_version() {
        let yaml = "apiVersion: networking.k8s.io/v1beta1
kind: Ingress
metadata:
  name: web
";
        // networking.k8s.io/v1 only exists from 1.19
        let old = ScoreConfig::default().with_kubernetes_version(KubernetesVersion::new(1, 18));
        assert_eq!(run_with("stable-version", yaml, &old).grade, Grade::Ok);

        let new = ScoreConfig::default().with_kubernetes_version(KubernetesVersion::new(1, 19));
        let finding = run_with("stable-version", yaml, &new);
        assert_eq!(finding.grade, Grade::Warning);
        assert!(finding.comments[0].details.contains("networking.k8s.io/v1/Ingress"));
    }

    #[test]
    fn test_stable_version_prefers_newest_replacement() {
        let yaml = "apiVersion: extensions/v1beta1
kind: Ingress
metadata:
  name: web
";
        let finding = run("stable-version", yaml);
        assert!(finding.comments[0].details.contains("networking.k8s.io/v1beta1"));

        let new = ScoreConfig::default().with_kubernetes_version(KubernetesVersion::new(1, 22));
        let finding = run_with("stable-version", yaml, &new);
        assert!(finding.comments[0].details.contains("networking.k8s.io/v1/Ingress"));
    }

    #[test]
    fn test_current_api_is_ok() {
        let yaml = "apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  template:
    spec:
      containers:
      - name: web
        image: nginx:1.25
";
        assert_eq!(run("stable-version", yaml).grade, Grade::Ok);
    }
}
