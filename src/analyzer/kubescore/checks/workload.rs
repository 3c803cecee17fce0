//! Controller-level checks: scheduling spread, replicas, update strategy.

use super::pod_spec;
use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::{Resource, Workload};
use crate::analyzer::kubescore::registry::{Check, CheckError, CheckRegistry, RegistryError};
use crate::analyzer::kubescore::types::{Comment, Finding, Grade, ResourceKind, TargetKind};
use crate::analyzer::kubescore::version::KubernetesVersion;
use k8s_openapi::api::core::v1::PodSpec;

const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";
const WHEN_UNSATISFIABLE: [&str; 2] = ["DoNotSchedule", "ScheduleAnyway"];

pub fn register(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(
        Check::new(
            "pod-topology-spread-constraints",
            "Pod Topology Spread Constraints",
            TargetKind::DeploymentLike,
            "Pod Topology Spread Constraints",
            topology_spread_constraints,
        )
        .with_minimum_version(KubernetesVersion::new(1, 19)),
    )?;
    registry.register(Check::new(
        "deployment-has-host-podantiaffinity",
        "Deployment has host PodAntiAffinity",
        ResourceKind::Deployment,
        "Makes sure that a podAntiAffinity has been set that prevents multiple pods from being scheduled on the same node. https://kubernetes.io/docs/concepts/configuration/assign-pod-node/",
        |r: &Resource, _: &ScoreConfig| host_anti_affinity(r, "Deployment"),
    ))?;
    registry.register(Check::new(
        "statefulset-has-host-podantiaffinity",
        "StatefulSet has host PodAntiAffinity",
        ResourceKind::StatefulSet,
        "Makes sure that a podAntiAffinity has been set that prevents multiple pods from being scheduled on the same node. https://kubernetes.io/docs/concepts/configuration/assign-pod-node/",
        |r: &Resource, _: &ScoreConfig| host_anti_affinity(r, "StatefulSet"),
    ))?;
    registry.register(
        Check::new(
            "deployment-replicas",
            "Deployment Replicas",
            ResourceKind::Deployment,
            "Makes sure that Deployment has multiple replicas",
            deployment_replicas,
        )
        .optional(),
    )?;
    registry.register(
        Check::new(
            "deployment-strategy",
            "Deployment Strategy",
            ResourceKind::Deployment,
            "Makes sure that all Deployments targeted by service use RollingUpdate strategy",
            deployment_strategy,
        )
        .optional(),
    )?;
    registry.register(Check::new(
        "statefulset-has-servicename",
        "StatefulSet has ServiceName",
        ResourceKind::StatefulSet,
        "Makes sure that StatefulSets have a ServiceName",
        statefulset_service_name,
    ))?;
    registry.register(Check::new(
        "cronjob-has-deadline",
        "CronJob has deadline",
        ResourceKind::CronJob,
        "Makes sure that all CronJobs has a configured deadline",
        cronjob_deadline,
    ))?;
    Ok(())
}

fn workload(resource: &Resource) -> Result<&Workload, CheckError> {
    resource.workload().ok_or(CheckError::UnexpectedBody {
        expected: "workload",
    })
}

fn topology_spread_constraints(
    resource: &Resource,
    _config: &ScoreConfig,
) -> Result<Finding, CheckError> {
    let constraints = pod_spec(resource)?
        .topology_spread_constraints
        .as_deref()
        .unwrap_or_default();

    if constraints.is_empty() {
        return Ok(Finding::ok().with_comment(Comment::new(
            "",
            "Pod Topology Spread Constraints",
            "No Pod Topology Spread Constraints set, kube-scheduler defaults assumed",
        )));
    }

    let mut finding = Finding::ok();
    for constraint in constraints {
        if constraint.max_skew <= 0 {
            finding.add(
                Grade::Critical,
                Comment::new(
                    &constraint.topology_key,
                    "Pod Topology Spread Constraint",
                    "MaxSkew is set to zero or less. By default, it is recommended to set it to 1.",
                ),
            );
        }
        if constraint.topology_key.is_empty() {
            finding.add(
                Grade::Critical,
                Comment::new(
                    "",
                    "Pod Topology Spread Constraint",
                    "TopologyKey is not set. This key is required.",
                ),
            );
        }
        if !WHEN_UNSATISFIABLE.contains(&constraint.when_unsatisfiable.as_str()) {
            finding.add(
                Grade::Critical,
                Comment::new(
                    &constraint.topology_key,
                    "Pod Topology Spread Constraint",
                    "Invalid WhenUnsatisfiable value provided, it must be either DoNotSchedule or ScheduleAnyway",
                ),
            );
        }
    }
    Ok(finding)
}

fn has_host_anti_affinity(spec: &PodSpec) -> bool {
    let Some(anti) = spec
        .affinity
        .as_ref()
        .and_then(|a| a.pod_anti_affinity.as_ref())
    else {
        return false;
    };

    let required = anti
        .required_during_scheduling_ignored_during_execution
        .iter()
        .flatten()
        .any(|term| term.topology_key == HOSTNAME_TOPOLOGY_KEY);
    let preferred = anti
        .preferred_during_scheduling_ignored_during_execution
        .iter()
        .flatten()
        .any(|weighted| weighted.pod_affinity_term.topology_key == HOSTNAME_TOPOLOGY_KEY);

    required || preferred
}

fn host_anti_affinity(resource: &Resource, kind: &str) -> Result<Finding, CheckError> {
    let replicas = workload(resource)?.replicas.unwrap_or(1);
    if replicas < 2 {
        return Ok(Finding::skipped(format!(
            "Skipped because the {} has less than 2 replicas",
            kind.to_lowercase()
        )));
    }

    if has_host_anti_affinity(pod_spec(resource)?) {
        return Ok(Finding::ok());
    }

    Ok(Finding::new(Grade::Warning).with_comment(Comment::new(
        "",
        format!("{kind} does not have a host podAntiAffinity set"),
        "It's recommended to set a podAntiAffinity that stops multiple pods from a deployment from being scheduled on the same node. This increases availability in case the node becomes unavailable.",
    )))
}

fn deployment_replicas(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let replicas = workload(resource)?.replicas.unwrap_or(1);
    if replicas >= 2 {
        return Ok(Finding::ok());
    }
    Ok(Finding::new(Grade::Warning).with_comment(Comment::new(
        "",
        "Deployment few replicas",
        format!(
            "Deployments targeted by Services are recommended to have at least 2 replicas to prevent unwanted downtime. This Deployment has {replicas}."
        ),
    )))
}

fn deployment_strategy(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    match workload(resource)?.strategy_type.as_deref() {
        None | Some("RollingUpdate") => Ok(Finding::ok()),
        Some(other) => Ok(Finding::new(Grade::Warning).with_comment(Comment::new(
            "",
            "Deployment update strategy",
            format!(
                "The deployment uses the {other} strategy. RollingUpdate is recommended to keep the application available during updates."
            ),
        ))),
    }
}

fn statefulset_service_name(
    resource: &Resource,
    _config: &ScoreConfig,
) -> Result<Finding, CheckError> {
    let has_name = workload(resource)?
        .service_name
        .as_deref()
        .is_some_and(|name| !name.is_empty());
    if has_name {
        return Ok(Finding::ok());
    }
    Ok(Finding::new(Grade::Critical).with_comment(Comment::new(
        "",
        "StatefulSet does not have a serviceName",
        "StatefulSets require a headless Service to be responsible for the network identity of the Pods. Set spec.serviceName",
    )))
}

fn cronjob_deadline(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    match workload(resource)?.starting_deadline_seconds {
        Some(seconds) if seconds > 0 => Ok(Finding::ok()),
        Some(_) => Ok(Finding::new(Grade::Critical).with_comment(Comment::new(
            "",
            "The CronJob should have startingDeadlineSeconds greater than 0",
            "A CronJob with a non-positive startingDeadlineSeconds will never start a job",
        ))),
        None => Ok(Finding::new(Grade::Critical).with_comment(Comment::new(
            "",
            "The CronJob should have startingDeadlineSeconds configured",
            "This makes sure that jobs are not started after too long a delay. Set spec.startingDeadlineSeconds",
        ))),
    }
}
