//! Annotation-based check suppression.
//!
//! A resource opts out of checks with the `kube-score/ignore` annotation:
//!
//! ```yaml
//! metadata:
//!   annotations:
//!     kube-score/ignore: container-image-tag, pod-probes
//! ```
//!
//! The value is a comma-separated list of check IDs, or `*` for every check.
//! On pod-bearing objects the pod template's annotations are read as well.
//! A value containing anything that is not a check ID makes the whole
//! annotation ineffective.

use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::Resource;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Annotation key holding the suppressed check IDs.
pub const IGNORE_ANNOTATION: &str = "kube-score/ignore";

/// Token that suppresses every check.
pub const WILDCARD: &str = "*";

static CHECK_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("static regex"));

/// Checks suppressed on one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoredChecks {
    all: bool,
    ids: BTreeSet<String>,
}

impl IgnoredChecks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, check_id: &str) -> bool {
        self.all || self.ids.contains(check_id)
    }

    pub fn is_empty(&self) -> bool {
        !self.all && self.ids.is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        self.all
    }

    fn merge(&mut self, other: IgnoredChecks) {
        self.all |= other.all;
        self.ids.extend(other.ids);
    }
}

/// Parse one annotation value. Malformed values yield an empty set.
pub fn parse_ignore_value(value: &str) -> IgnoredChecks {
    let mut ignored = IgnoredChecks::none();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if entry == WILDCARD {
            ignored.all = true;
        } else if CHECK_ID_REGEX.is_match(entry) {
            ignored.ids.insert(entry.to_string());
        } else {
            log::debug!("ignoring malformed {} value {:?}", IGNORE_ANNOTATION, value);
            return IgnoredChecks::none();
        }
    }

    ignored
}

fn from_annotations(annotations: Option<&BTreeMap<String, String>>) -> IgnoredChecks {
    annotations
        .and_then(|a| a.get(IGNORE_ANNOTATION))
        .map(|value| parse_ignore_value(value))
        .unwrap_or_default()
}

/// Extract the set of ignored checks from a resource's annotations.
pub fn get_ignored_checks(resource: &Resource) -> IgnoredChecks {
    let mut ignored = from_annotations(Some(&resource.annotations));
    if let Some(workload) = resource.workload() {
        ignored.merge(from_annotations(workload.pod_annotations()));
    }
    ignored
}

/// Suppressions that apply under `config`: none when annotations are disabled.
pub fn resolve_ignored_checks(resource: &Resource, config: &ScoreConfig) -> IgnoredChecks {
    if !config.use_ignore_annotation {
        return IgnoredChecks::none();
    }
    get_ignored_checks(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::context::{ResourceBody, ResourceId, Workload};
    use crate::analyzer::kubescore::types::ResourceKind;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn service_with_annotation(value: &str) -> Resource {
        Resource::new(
            ResourceId::new(ResourceKind::Service, "v1", None, "svc"),
            ResourceBody::Service(Box::default()),
        )
        .with_annotation(IGNORE_ANNOTATION, value)
    }

    #[test]
    fn test_parse_list() {
        let ignored = parse_ignore_value("container-image-tag, pod-probes");
        assert!(ignored.contains("container-image-tag"));
        assert!(ignored.contains("pod-probes"));
        assert!(!ignored.contains("service-type"));
    }

    #[test]
    fn test_parse_wildcard() {
        let ignored = parse_ignore_value("*");
        assert!(ignored.is_wildcard());
        assert!(ignored.contains("anything-at-all"));
    }

    #[test]
    fn test_empty_entries_are_dropped() {
        let ignored = parse_ignore_value(" , pod-probes,, ");
        assert!(ignored.contains("pod-probes"));
        assert!(parse_ignore_value("").is_empty());
    }

    #[test]
    fn test_malformed_value_suppresses_nothing() {
        for bad in ["pod-probes; service-type", "Pod-Probes", "pod probes", "-leading"] {
            assert!(parse_ignore_value(bad).is_empty(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_absent_annotation() {
        let resource = Resource::new(
            ResourceId::new(ResourceKind::Service, "v1", None, "svc"),
            ResourceBody::Other,
        );
        assert!(get_ignored_checks(&resource).is_empty());
    }

    #[test]
    fn test_resolve_respects_config() {
        let resource = service_with_annotation("*");
        assert!(resolve_ignored_checks(&resource, &ScoreConfig::default()).is_wildcard());
        let disabled = ScoreConfig::default().with_ignore_annotation(false);
        assert!(resolve_ignored_checks(&resource, &disabled).is_empty());
    }

    #[test]
    fn test_pod_template_annotations_are_merged() {
        let mut workload = Workload::default();
        workload.template.metadata = Some(ObjectMeta {
            annotations: Some(BTreeMap::from([(
                IGNORE_ANNOTATION.to_string(),
                "pod-probes".to_string(),
            )])),
            ..Default::default()
        });
        let resource = Resource::new(
            ResourceId::new(ResourceKind::Deployment, "apps/v1", None, "web"),
            ResourceBody::Workload(Box::new(workload)),
        )
        .with_annotation(IGNORE_ANNOTATION, "container-image-tag");

        let ignored = get_ignored_checks(&resource);
        assert!(ignored.contains("pod-probes"));
        assert!(ignored.contains("container-image-tag"));
    }
}
