//! Readiness and liveness probe checks.

use super::pod_spec;
use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::Resource;
use crate::analyzer::kubescore::extract::containers;
use crate::analyzer::kubescore::registry::{Check, CheckError, CheckRegistry, RegistryError};
use crate::analyzer::kubescore::types::{Comment, Finding, Grade, ResourceKind, TargetKind};

pub fn register(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(Check::new(
        "pod-probes",
        "Pod Probes",
        TargetKind::DeploymentLike,
        "Makes sure that all Pods have safe probe configurations",
        pod_probes,
    ))
}

fn pod_probes(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    if matches!(resource.kind(), ResourceKind::Job | ResourceKind::CronJob) {
        return Ok(Finding::skipped(
            "Skipped because run-to-completion workloads do not serve traffic",
        ));
    }

    let mut finding = Finding::ok();
    for c in containers(pod_spec(resource)?) {
        match (&c.readiness_probe, &c.liveness_probe) {
            (None, _) => finding.add(
                Grade::Critical,
                Comment::new(
                    c.name.as_str(),
                    "Container is missing a readinessProbe",
                    "A readinessProbe should be used to indicate when the service is ready to receive traffic. Without it, the Pod is risking to receive traffic before it has booted.",
                ),
            ),
            (Some(readiness), Some(liveness)) if readiness == liveness => finding.add(
                Grade::Critical,
                Comment::new(
                    c.name.as_str(),
                    "Container has the same readiness and liveness probe",
                    "Using the same probe for liveness and readiness is very likely dangerous. Generally it's better to use a different endpoint or check for readiness.",
                ),
            ),
            _ => {}
        }
    }
    Ok(finding)
}
