//! Container security context checks.

use super::{check_containers, pod_spec};
use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::Resource;
use crate::analyzer::kubescore::extract::{all_containers, run_as_group, run_as_user, seccomp_profile_type};
use crate::analyzer::kubescore::registry::{Check, CheckError, CheckRegistry, RegistryError};
use crate::analyzer::kubescore::types::{Comment, Finding, Grade, TargetKind};
use crate::analyzer::kubescore::version::KubernetesVersion;

/// IDs at or below this may collide with users on the host.
const MIN_SAFE_ID: i64 = 10000;

pub fn register(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(Check::new(
        "container-security-context-privileged",
        "Container Security Context Privileged",
        TargetKind::DeploymentLike,
        "Makes sure that no pods are running in privileged mode",
        privileged,
    ))?;
    registry.register(Check::new(
        "container-security-context-readonlyrootfilesystem",
        "Container Security Context ReadOnlyRootFilesystem",
        TargetKind::DeploymentLike,
        "Makes sure that all pods have a read only root filesystem",
        read_only_root_filesystem,
    ))?;
    registry.register(Check::new(
        "container-security-context-user-group-id",
        "Container Security Context User Group ID",
        TargetKind::DeploymentLike,
        "Makes sure that all pods have a security context with high enough user and group IDs",
        user_group_id,
    ))?;
    registry.register(
        Check::new(
            "container-seccomp-profile",
            "Container Seccomp Profile",
            TargetKind::DeploymentLike,
            "Makes sure that all pods have a seccomp profile configured",
            seccomp_profile,
        )
        .optional()
        .with_minimum_version(KubernetesVersion::new(1, 19)),
    )?;
    Ok(())
}

fn privileged(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    check_containers(resource, Grade::Critical, |_, c| {
        let privileged = c
            .security_context
            .as_ref()
            .and_then(|sc| sc.privileged)
            .unwrap_or(false);
        privileged.then(|| {
            (
                "The container is privileged".to_string(),
                "Set securityContext.privileged to false. Privileged containers can access all devices on the host, and grants almost the same access as non-containerized processes on the host."
                    .to_string(),
            )
        })
    })
}

fn read_only_root_filesystem(
    resource: &Resource,
    _config: &ScoreConfig,
) -> Result<Finding, CheckError> {
    check_containers(resource, Grade::Critical, |_, c| {
        let read_only = c
            .security_context
            .as_ref()
            .and_then(|sc| sc.read_only_root_filesystem)
            .unwrap_or(false);
        (!read_only).then(|| {
            (
                "The pod has a container with a writable root filesystem".to_string(),
                "Set securityContext.readOnlyRootFilesystem to true".to_string(),
            )
        })
    })
}

fn user_group_id(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    let spec = pod_spec(resource)?;
    let mut finding = Finding::ok();

    for c in all_containers(spec) {
        if run_as_user(spec, c).is_none_or(|uid| uid <= MIN_SAFE_ID) {
            finding.add(
                Grade::Critical,
                Comment::new(
                    c.name.as_str(),
                    "The container is running with a low user ID",
                    "A userid above 10 000 is recommended to avoid conflicts with the host. Set securityContext.runAsUser to a value > 10000",
                ),
            );
        }
        if run_as_group(spec, c).is_none_or(|gid| gid <= MIN_SAFE_ID) {
            finding.add(
                Grade::Critical,
                Comment::new(
                    c.name.as_str(),
                    "The container running with a low group ID",
                    "A groupid above 10 000 is recommended to avoid conflicts with the host. Set securityContext.runAsGroup to a value > 10000",
                ),
            );
        }
    }

    Ok(finding)
}

fn seccomp_profile(resource: &Resource, _config: &ScoreConfig) -> Result<Finding, CheckError> {
    check_containers(resource, Grade::Warning, |spec, c| match seccomp_profile_type(spec, c) {
        Some("RuntimeDefault") | Some("Localhost") => None,
        Some(other) => Some((
            format!("The container uses the {other} seccomp profile"),
            "Set securityContext.seccompProfile.type to RuntimeDefault or Localhost".to_string(),
        )),
        None => Some((
            "The container does not have a seccomp profile".to_string(),
            "Set securityContext.seccompProfile.type to RuntimeDefault or Localhost".to_string(),
        )),
    })
}
