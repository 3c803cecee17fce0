//! Scoring orchestration.
//!
//! For every resource, in input order: pick the checks registered for its
//! kind, drop the ones the configuration rules out, mark annotation
//! suppressions as skipped, and run the rest behind a fault boundary.

use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::{Resource, ResourceId, ResourceSet};
use crate::analyzer::kubescore::pragma::{IGNORE_ANNOTATION, resolve_ignored_checks};
use crate::analyzer::kubescore::registry::{Check, CheckRegistry};
use crate::analyzer::kubescore::scorecard::{CheckSummary, ScoreCard, ScoredObject, TestScore};
use crate::analyzer::kubescore::types::{Comment, Finding, Grade};
use rayon::prelude::*;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Fatal scoring errors. Check faults are not errors; they become scores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("resource {0} appears more than once in the input")]
    DuplicateResource(ResourceId),
}

/// Runs a registry of checks against resources under one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    registry: &'a CheckRegistry,
    config: &'a ScoreConfig,
    parallel: bool,
}

impl<'a> Scorer<'a> {
    pub fn new(registry: &'a CheckRegistry, config: &'a ScoreConfig) -> Self {
        Self {
            registry,
            config,
            parallel: false,
        }
    }

    /// Evaluate resources on the rayon pool. Output is identical to the
    /// sequential mode.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether `check` runs at all under the configuration, independent of
    /// any particular resource.
    pub fn is_applicable(&self, check: &Check) -> bool {
        if self.config.is_test_ignored(&check.id) {
            log::debug!("check {} is ignored by configuration", check.id);
            return false;
        }
        if check.optional && !self.config.is_optional_test_enabled(&check.id) {
            return false;
        }
        if !check.supports_version(self.config.kubernetes_version) {
            log::debug!(
                "check {} requires Kubernetes {:?}, running against {}",
                check.id,
                check.minimum_version,
                self.config.kubernetes_version
            );
            return false;
        }
        !check.is_disabled_by(self.config)
    }

    /// Checks that produce a score for `resource`, in registration order.
    pub fn applicable_checks(&self, resource: &Resource) -> Vec<&'a Check> {
        self.registry
            .checks_for(resource.kind())
            .into_iter()
            .filter(|check| self.is_applicable(check))
            .collect()
    }

    /// Score a single resource.
    pub fn score_resource(&self, resource: &Resource) -> ScoredObject {
        let ignored = resolve_ignored_checks(resource, self.config);
        if ignored.is_wildcard() {
            log::debug!("{}: every check suppressed by annotation", resource.id);
        }
        let mut object = ScoredObject::new(resource.id.clone(), resource.location.clone());

        for check in self.applicable_checks(resource) {
            let finding = if ignored.contains(&check.id) {
                log::debug!("{}: {} suppressed by annotation", resource.id, check.id);
                Finding::skipped(format!(
                    "Skipped because of the {} annotation",
                    IGNORE_ANNOTATION
                ))
            } else {
                run_check(check, resource, self.config)
            };
            object.add(TestScore::new(CheckSummary::from(check), finding));
        }

        object
    }

    /// Score every resource and collect the results in input order.
    pub fn score(&self, resources: &ResourceSet) -> Result<ScoreCard, ScoreError> {
        ensure_unique_ids(resources)?;

        let objects: Vec<ScoredObject> = if self.parallel {
            resources
                .resources()
                .par_iter()
                .map(|r| self.score_resource(r))
                .collect()
        } else {
            resources.iter().map(|r| self.score_resource(r)).collect()
        };

        let mut card = ScoreCard::new();
        for object in objects {
            card.insert(object);
        }

        log::info!(
            "scored {} resources: {}",
            card.len(),
            card.grade_counts()
        );
        Ok(card)
    }
}

/// Score `resources` with `registry` under `config`.
pub fn score(
    resources: &ResourceSet,
    registry: &CheckRegistry,
    config: &ScoreConfig,
) -> Result<ScoreCard, ScoreError> {
    Scorer::new(registry, config).score(resources)
}

fn ensure_unique_ids(resources: &ResourceSet) -> Result<(), ScoreError> {
    let mut seen = HashSet::new();
    for resource in resources {
        if !seen.insert(&resource.id) {
            return Err(ScoreError::DuplicateResource(resource.id.clone()));
        }
    }
    Ok(())
}

/// Run one check, turning errors and panics into a Critical finding.
fn run_check(check: &Check, resource: &Resource, config: &ScoreConfig) -> Finding {
    let outcome = catch_unwind(AssertUnwindSafe(|| check.evaluate(resource, config)));

    let reason = match outcome {
        Ok(Ok(finding)) => return finding,
        Ok(Err(err)) => err.to_string(),
        Err(panic_info) => {
            if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            }
        }
    };

    log::error!("check {} failed on {}: {}", check.id, resource.id, reason);
    Finding::new(Grade::Critical).with_comment(Comment::new(
        "",
        "Check failed internally",
        format!("The {} check could not be evaluated: {}", check.id, reason),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::context::ResourceBody;
    use crate::analyzer::kubescore::registry::CheckError;
    use crate::analyzer::kubescore::types::{ResourceKind, TargetKind};
    use crate::analyzer::kubescore::version::KubernetesVersion;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service(name: &str) -> Resource {
        Resource::new(
            ResourceId::new(ResourceKind::Service, "v1", None, name),
            ResourceBody::Other,
        )
    }

    fn fixed(id: &str, grade: Grade) -> Check {
        Check::new(id, id, TargetKind::Any, "fixed", move |_, _| Ok(Finding::new(grade)))
    }

    fn grades(object: &ScoredObject) -> Vec<(String, Grade)> {
        object
            .checks
            .iter()
            .map(|s| (s.check.id.clone(), s.grade))
            .collect()
    }

    #[test]
    fn test_optional_check_needs_enabling() {
        let mut registry = CheckRegistry::new();
        registry.register(fixed("opt", Grade::Ok).optional()).unwrap();

        let config = ScoreConfig::default();
        let object = Scorer::new(&registry, &config).score_resource(&service("a"));
        assert!(object.checks.is_empty());

        let config = ScoreConfig::default().enable_optional_test("opt");
        let object = Scorer::new(&registry, &config).score_resource(&service("a"));
        assert_eq!(grades(&object), vec![("opt".to_string(), Grade::Ok)]);
    }

    #[test]
    fn test_ignored_test_is_absent() {
        let mut registry = CheckRegistry::new();
        registry.register(fixed("a", Grade::Critical)).unwrap();
        registry.register(fixed("b", Grade::Ok)).unwrap();

        let config = ScoreConfig::default().ignore_test("a");
        let object = Scorer::new(&registry, &config).score_resource(&service("x"));
        assert_eq!(grades(&object), vec![("b".to_string(), Grade::Ok)]);
    }

    #[test]
    fn test_minimum_version_filters() {
        let mut registry = CheckRegistry::new();
        registry
            .register(fixed("new", Grade::Ok).with_minimum_version(KubernetesVersion::new(1, 19)))
            .unwrap();

        let old = ScoreConfig::default().with_kubernetes_version(KubernetesVersion::new(1, 18));
        assert!(Scorer::new(&registry, &old).score_resource(&service("a")).checks.is_empty());

        let new = ScoreConfig::default().with_kubernetes_version(KubernetesVersion::new(1, 19));
        assert_eq!(Scorer::new(&registry, &new).score_resource(&service("a")).checks.len(), 1);
    }

    #[test]
    fn test_suppressed_check_is_not_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut registry = CheckRegistry::new();
        registry
            .register(Check::new("counted", "counted", TargetKind::Any, "", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Finding::new(Grade::Critical))
            }))
            .unwrap();

        let resource = service("a").with_annotation(IGNORE_ANNOTATION, "counted");
        let config = ScoreConfig::default();
        let object = Scorer::new(&registry, &config).score_resource(&resource);

        assert_eq!(grades(&object), vec![("counted".to_string(), Grade::Skipped)]);
        assert!(object.checks[0].skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let config = ScoreConfig::default().with_ignore_annotation(false);
        let object = Scorer::new(&registry, &config).score_resource(&resource);
        assert_eq!(object.checks[0].grade, Grade::Critical);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_faults_become_critical() {
        let mut registry = CheckRegistry::new();
        registry
            .register(Check::new("errs", "errs", TargetKind::Any, "", |_, _| {
                Err(CheckError::Internal("boom".to_string()))
            }))
            .unwrap();
        registry
            .register(Check::new("panics", "panics", TargetKind::Any, "", |_, _| {
                panic!("kaboom")
            }))
            .unwrap();
        registry.register(fixed("fine", Grade::Ok)).unwrap();

        let config = ScoreConfig::default();
        let object = Scorer::new(&registry, &config).score_resource(&service("a"));

        assert_eq!(
            grades(&object),
            vec![
                ("errs".to_string(), Grade::Critical),
                ("panics".to_string(), Grade::Critical),
                ("fine".to_string(), Grade::Ok),
            ]
        );
        assert!(object.checks[1].comments[0].details.contains("kaboom"));
    }

    #[test]
    fn test_duplicate_resources_are_fatal() {
        let registry = CheckRegistry::new();
        let config = ScoreConfig::default();
        let set = ResourceSet::from(vec![service("a"), service("a")]);
        let err = score(&set, &registry, &config).unwrap_err();
        assert!(matches!(err, ScoreError::DuplicateResource(_)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut registry = CheckRegistry::new();
        registry.register(fixed("a", Grade::Warning)).unwrap();
        registry.register(fixed("b", Grade::Ok)).unwrap();
        let config = ScoreConfig::default();
        let set = ResourceSet::from((0..50).map(|i| service(&format!("s{i}"))).collect::<Vec<_>>());

        let sequential = Scorer::new(&registry, &config).score(&set).unwrap();
        let parallel = Scorer::new(&registry, &config)
            .with_parallelism(true)
            .score(&set)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_limit_options_remove_the_limit_checks() {
        use crate::analyzer::kubescore::checks::test_support::{deployment_with_container, resource};

        let registry = CheckRegistry::with_builtin_checks().unwrap();
        let deployment = resource(&deployment_with_container("image: nginx:1.25"));
        let set = ResourceSet::from(vec![deployment.clone()]);

        let card = score(&set, &registry, &ScoreConfig::default()).unwrap();
        let object = card.get(&deployment.id).unwrap();
        for (id, summary) in [
            ("container-cpu-limit", "CPU limit is not set"),
            ("container-memory-limit", "Memory limit is not set"),
        ] {
            let limit = object.score_for(id).unwrap();
            assert_eq!(limit.grade, Grade::Critical);
            assert_eq!(limit.comments[0].summary, summary);
        }

        let config = ScoreConfig::default().with_ignore_container_cpu_limit(true);
        let card = score(&set, &registry, &config).unwrap();
        let object = card.get(&deployment.id).unwrap();
        assert!(object.score_for("container-cpu-limit").is_none());
        assert_eq!(
            object.score_for("container-memory-limit").unwrap().grade,
            Grade::Critical
        );

        let config = ScoreConfig::default().with_ignore_container_memory_limit(true);
        let card = score(&set, &registry, &config).unwrap();
        let object = card.get(&deployment.id).unwrap();
        assert!(object.score_for("container-memory-limit").is_none());
        assert!(object.score_for("container-cpu-limit").is_some());
    }
}
