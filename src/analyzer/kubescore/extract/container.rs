//! Container extraction utilities.

use k8s_openapi::api::core::v1::{Container, PodSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Init containers followed by regular containers.
pub fn all_containers(pod_spec: &PodSpec) -> Vec<&Container> {
    let mut containers: Vec<&Container> = pod_spec.init_containers.iter().flatten().collect();
    containers.extend(pod_spec.containers.iter());
    containers
}

/// Regular containers only.
pub fn containers(pod_spec: &PodSpec) -> Vec<&Container> {
    pod_spec.containers.iter().collect()
}

pub fn init_containers(pod_spec: &PodSpec) -> Vec<&Container> {
    pod_spec.init_containers.iter().flatten().collect()
}

/// `resources.limits[name]`, if set.
pub fn limit<'a>(container: &'a Container, name: &str) -> Option<&'a Quantity> {
    container
        .resources
        .as_ref()
        .and_then(|r| r.limits.as_ref())
        .and_then(|l| l.get(name))
}

/// `resources.requests[name]`, if set.
pub fn request<'a>(container: &'a Container, name: &str) -> Option<&'a Quantity> {
    container
        .resources
        .as_ref()
        .and_then(|r| r.requests.as_ref())
        .and_then(|l| l.get(name))
}

/// Effective `runAsUser`: container value, else pod value.
pub fn run_as_user(pod_spec: &PodSpec, container: &Container) -> Option<i64> {
    container
        .security_context
        .as_ref()
        .and_then(|sc| sc.run_as_user)
        .or_else(|| pod_spec.security_context.as_ref().and_then(|sc| sc.run_as_user))
}

/// Effective `runAsGroup`: container value, else pod value.
pub fn run_as_group(pod_spec: &PodSpec, container: &Container) -> Option<i64> {
    container
        .security_context
        .as_ref()
        .and_then(|sc| sc.run_as_group)
        .or_else(|| pod_spec.security_context.as_ref().and_then(|sc| sc.run_as_group))
}

/// Effective seccomp profile type: container value, else pod value.
pub fn seccomp_profile_type<'a>(pod_spec: &'a PodSpec, container: &'a Container) -> Option<&'a str> {
    container
        .security_context
        .as_ref()
        .and_then(|sc| sc.seccomp_profile.as_ref())
        .or_else(|| {
            pod_spec
                .security_context
                .as_ref()
                .and_then(|sc| sc.seccomp_profile.as_ref())
        })
        .map(|p| p.type_.as_str())
}

/// Image tag, or `None` when the image has no tag. Digest references return
/// `None` too; use `has_digest` to tell them apart.
pub fn image_tag(image: &str) -> Option<&str> {
    if has_digest(image) {
        return None;
    }
    // Port separators in the registry host contain ':' before the last '/'.
    let last_segment = image.rsplit('/').next().unwrap_or(image);
    last_segment.split_once(':').map(|(_, tag)| tag)
}

pub fn has_digest(image: &str) -> bool {
    image.contains('@')
}
