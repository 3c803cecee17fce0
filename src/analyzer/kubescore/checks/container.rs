//! Container resource and image checks.

use super::{check_containers, pod_spec};
use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::Resource;
use crate::analyzer::kubescore::extract::{
    all_containers, has_digest, image_tag, is_unset, limit, quantities_equal, request,
};
use crate::analyzer::kubescore::registry::{Check, CheckError, CheckRegistry, RegistryError};
use crate::analyzer::kubescore::types::{Comment, Finding, Grade, TargetKind};

pub fn register(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(
        Check::new(
            "container-cpu-limit",
            "Container CPU Limit",
            TargetKind::DeploymentLike,
            "Makes sure that all pods have a CPU limit set",
            cpu_limit,
        )
        .disabled_when(|c| c.ignore_container_cpu_limit),
    )?;
    registry.register(
        Check::new(
            "container-memory-limit",
            "Container Memory Limit",
            TargetKind::DeploymentLike,
            "Makes sure that all pods have a memory limit set",
            memory_limit,
        )
        .disabled_when(|c| c.ignore_container_memory_limit),
    )?;
    registry.register(Check::new(
        "container-resource-requests",
        "Container Resource Requests",
        TargetKind::DeploymentLike,
        "Makes sure that all pods have CPU and memory requests set",
        resource_requests,
    ))?;
    registry.register(
        Check::new(
            "container-ephemeral-storage-request-and-limit",
            "Container Ephemeral Storage Request and Limit",
            TargetKind::DeploymentLike,
            "Makes sure all pods have ephemeral-storage requests and limits set",
            ephemeral_storage,
        )
        .optional(),
    )?;
    registry.register(
        Check::new(
            "container-cpu-requests-equal-limits",
            "Container CPU Requests Equal Limits",
            TargetKind::DeploymentLike,
            "Makes sure that all pods have the same CPU requests as limits set",
            |r: &Resource, _: &ScoreConfig| requests_equal_limits(r, "cpu", "CPU"),
        )
        .optional(),
    )?;
    registry.register(
        Check::new(
            "container-memory-requests-equal-limits",
            "Container Memory Requests Equal Limits",
            TargetKind::DeploymentLike,
            "Makes sure that all pods have the same memory requests as limits set",
            |r: &Resource, _: &ScoreConfig| requests_equal_limits(r, "memory", "Memory"),
        )
        .optional(),
    )?;
    registry.register(Check::new(
        "container-image-tag",
        "Container Image Tag",
        TargetKind::DeploymentLike,
        "Makes sure that a explicit non-latest tag is used",
        image_tag_check,
    ))?;
    registry.register(Check::new(
        "container-image-pull-policy",
        "Container Image Pull Policy",
        TargetKind::DeploymentLike,
        "Makes sure that the pullPolicy is set to Always. This makes sure that imagePullSecrets are always validated.",
        image_pull_policy,
    ))?;
    Ok(())
}

fn cpu_limit(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    check_containers(resource, Grade::Critical, |_, c| {
        is_unset(limit(c, "cpu")).then(|| {
            (
                "CPU limit is not set".to_string(),
                "Resource limits are recommended to avoid resource DDOS. Set resources.limits.cpu"
                    .to_string(),
            )
        })
    })
}

fn memory_limit(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    check_containers(resource, Grade::Critical, |_, c| {
        is_unset(limit(c, "memory")).then(|| {
            (
                "Memory limit is not set".to_string(),
                "Resource limits are recommended to avoid resource DDOS. Set resources.limits.memory"
                    .to_string(),
            )
        })
    })
}

fn resource_requests(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let mut finding = Finding::ok();
    for c in all_containers(pod_spec(resource)?) {
        for (name, label) in [("cpu", "CPU"), ("memory", "Memory")] {
            if is_unset(request(c, name)) {
                finding.add(
                    Grade::Warning,
                    Comment::new(
                        c.name.as_str(),
                        format!("{label} request is not set"),
                        format!(
                            "Resource requests are recommended to make sure that the application can start and run without crashing. Set resources.requests.{name}"
                        ),
                    ),
                );
            }
        }
    }
    Ok(finding)
}

fn ephemeral_storage(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let mut finding = Finding::ok();
    for c in all_containers(pod_spec(resource)?) {
        if is_unset(limit(c, "ephemeral-storage")) {
            finding.add(
                Grade::Critical,
                Comment::new(
                    c.name.as_str(),
                    "Ephemeral Storage limit is not set",
                    "Resource limits are recommended to avoid resource DDOS. Set resources.limits.ephemeral-storage",
                ),
            );
        }
        if is_unset(request(c, "ephemeral-storage")) {
            finding.add(
                Grade::Warning,
                Comment::new(
                    c.name.as_str(),
                    "Ephemeral Storage request is not set",
                    "Resource requests are recommended to make sure the application can start and run without crashing. Set resources.requests.ephemeral-storage",
                ),
            );
        }
    }
    Ok(finding)
}

fn requests_equal_limits(
    resource: &Resource,
    name: &'static str,
    label: &'static str,
) -> Result<Finding, CheckError> {
    check_containers(resource, Grade::Critical, |_, c| {
        (!quantities_equal(request(c, name), limit(c, name))).then(|| {
            (
                format!("{label} requests does not match limits"),
                format!(
                    "Having equal requests and limits is recommended to avoid resource DDOS of the node during spikes. Set resources.requests.{name} == resources.limits.{name}"
                ),
            )
        })
    })
}

fn image_tag_check(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    check_containers(resource, Grade::Critical, |_, c| {
        let image = c.image.as_deref().unwrap_or_default();
        if has_digest(image) {
            return None;
        }
        match image_tag(image) {
            Some(tag) if tag != "latest" => None,
            _ => Some((
                "Image with latest tag".to_string(),
                "Using a fixed tag is recommended to avoid accidental upgrades".to_string(),
            )),
        }
    })
}

fn image_pull_policy(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    check_containers(resource, Grade::Critical, |_, c| {
        (c.image_pull_policy.as_deref() != Some("Always")).then(|| {
            (
                "ImagePullPolicy is not set to Always".to_string(),
                "It's recommended to always set the ImagePullPolicy to Always, to make sure that the imagePullSecrets are always correct, and to always get the image you want."
                    .to_string(),
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{deployment_with_container, run};
    use crate::analyzer::kubescore::types::Grade;

    #[test]
    fn test_missing_cpu_limit_is_critical() {
        let yaml = deployment_with_container("image: nginx:1.25");
        let finding = run("container-cpu-limit", &yaml);
        assert_eq!(finding.grade, Grade::Critical);
        assert_eq!(finding.comments[0].path, "app");
        assert_eq!(finding.comments[0].summary, "CPU limit is not set");
    }

    #[test]
    fn test_limits_set() {
        let yaml = deployment_with_container(
            "image: nginx:1.25
resources:
  limits:
    cpu: 500m
    memory: 256Mi",
        );
        assert_eq!(run("container-cpu-limit", &yaml).grade, Grade::Ok);
        assert_eq!(run("container-memory-limit", &yaml).grade, Grade::Ok);
    }

    #[test]
    fn test_decimal_and_exponent_limits_are_set() {
        for cpu in ["\".5\"", "\"1.\"", "\"1e3m\""] {
            let yaml = deployment_with_container(&format!(
                "image: nginx:1.25
resources:
  limits:
    cpu: {cpu}"
            ));
            assert_eq!(run("container-cpu-limit", &yaml).grade, Grade::Ok, "cpu: {cpu}");
        }
    }

    #[test]
    fn test_zero_limit_counts_as_unset() {
        let yaml = deployment_with_container(
            "image: nginx:1.25
resources:
  limits:
    cpu: 0",
        );
        assert_eq!(run("container-cpu-limit", &yaml).grade, Grade::Critical);
    }

    #[test]
    fn test_requests() {
        let yaml = deployment_with_container(
            "image: nginx:1.25
resources:
  requests:
    cpu: 100m",
        );
        let finding = run("container-resource-requests", &yaml);
        assert_eq!(finding.grade, Grade::Warning);
        assert_eq!(finding.comments.len(), 1);
        assert_eq!(finding.comments[0].summary, "Memory request is not set");
    }

    #[test]
    fn test_ephemeral_storage() {
        let yaml = deployment_with_container(
            "image: nginx:1.25
resources:
  limits:
    ephemeral-storage: 1Gi",
        );
        let finding = run("container-ephemeral-storage-request-and-limit", &yaml);
        assert_eq!(finding.grade, Grade::Warning);
    }

    #[test]
    fn test_requests_equal_limits_across_units() {
        let yaml = deployment_with_container(
            "image: nginx:1.25
resources:
  limits:
    cpu: 1
    memory: 1Gi
  requests:
    cpu: 1000m
    memory: 512Mi",
        );
        assert_eq!(run("container-cpu-requests-equal-limits", &yaml).grade, Grade::Ok);
        assert_eq!(
            run("container-memory-requests-equal-limits", &yaml).grade,
            Grade::Critical
        );
    }

    #[test]
    fn test_image_tag() {
        for (image, expected) in [
            ("nginx:1.25", Grade::Ok),
            ("nginx", Grade::Critical),
            ("nginx:latest", Grade::Critical),
            ("registry:5000/team/app", Grade::Critical),
            ("nginx@sha256:0123456789abcdef", Grade::Ok),
        ] {
            let yaml = deployment_with_container(&format!("image: \"{image}\""));
            assert_eq!(run("container-image-tag", &yaml).grade, expected, "{image}");
        }
    }

    #[test]
    fn test_image_pull_policy() {
        let yaml = deployment_with_container("image: nginx:1.25\nimagePullPolicy: IfNotPresent");
        assert_eq!(run("container-image-pull-policy", &yaml).grade, Grade::Critical);
        let yaml = deployment_with_container("image: nginx:1.25\nimagePullPolicy: Always");
        assert_eq!(run("container-image-pull-policy", &yaml).grade, Grade::Ok);
    }
}
