//! Built-in checks.
//!
//! Each submodule registers its checks in catalog order; `register_builtin_checks`
//! calls them in sequence, so the listing order is the order below.

pub mod container;
pub mod meta;
pub mod networking;
pub mod probes;
pub mod security;
pub mod workload;

use crate::analyzer::kubescore::context::Resource;
use crate::analyzer::kubescore::registry::{CheckError, CheckRegistry, RegistryError};
use crate::analyzer::kubescore::types::{Comment, Finding, Grade};
use k8s_openapi::api::core::v1::{Container, PodSpec};

/// Register every built-in check.
pub fn register_builtin_checks(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    container::register(registry)?;
    probes::register(registry)?;
    security::register(registry)?;
    workload::register(registry)?;
    networking::register(registry)?;
    meta::register(registry)?;
    Ok(())
}

/// The pod spec of a pod-bearing resource.
pub(crate) fn pod_spec(resource: &Resource) -> Result<&PodSpec, CheckError> {
    resource
        .pod_spec()
        .ok_or(CheckError::UnexpectedBody {
            expected: "pod template",
        })
}

/// Grade every container (init containers first). `problem` returns the
/// summary and details for a failing container; all failures share `grade`.
pub(crate) fn check_containers<F>(
    resource: &Resource,
    grade: Grade,
    problem: F,
) -> Result<Finding, CheckError>
where
    F: Fn(&PodSpec, &Container) -> Option<(String, String)>,
{
    let spec = pod_spec(resource)?;
    let comments = crate::analyzer::kubescore::extract::all_containers(spec)
        .into_iter()
        .filter_map(|c| {
            problem(spec, c).map(|(summary, details)| Comment::new(c.name.as_str(), summary, details))
        })
        .collect();
    Ok(Finding::from_problems(grade, comments))
}
