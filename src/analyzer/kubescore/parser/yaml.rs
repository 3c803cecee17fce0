//! YAML parsing for Kubernetes manifests.

use crate::analyzer::kubescore::context::{
    Resource, ResourceBody, ResourceId, ResourceSet, SourceLocation, Workload,
};
use crate::analyzer::kubescore::types::ResourceKind;
use k8s_openapi::api::core::v1::{PodTemplateSpec, ServiceSpec};
use k8s_openapi::api::networking::v1::{IngressSpec, NetworkPolicySpec};
use k8s_openapi::api::policy::v1::PodDisruptionBudgetSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::{DeserializeOwned, Error as _};
use serde_yaml::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Name used for input read from standard input.
pub const STDIN_NAME: &str = "STDIN";

/// Errors while reading manifests. All of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: invalid YAML: {source}")]
    Syntax {
        file: String,
        line: u32,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{file}:{line}: document is not a Kubernetes object")]
    NotAnObject { file: String, line: u32 },

    #[error("{file}:{line}: missing required field {field}")]
    MissingField {
        file: String,
        line: u32,
        field: &'static str,
    },

    #[error("{file}:{line}: invalid {kind} {name}: {source}")]
    InvalidBody {
        file: String,
        line: u32,
        kind: String,
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Parse a YAML string containing one or more Kubernetes objects.
pub fn parse_yaml(content: &str) -> Result<Vec<Resource>, ParseError> {
    parse_yaml_with_path(content, Path::new(STDIN_NAME))
}

/// Parse YAML content with a source file path.
pub fn parse_yaml_with_path(content: &str, path: &Path) -> Result<Vec<Resource>, ParseError> {
    let file = path.display().to_string();
    let mut resources = Vec::new();

    for (line, doc) in split_documents(content) {
        let value: Value = serde_yaml::from_str(&doc).map_err(|source| ParseError::Syntax {
            file: file.clone(),
            line,
            source,
        })?;

        // Empty or comment-only document
        if value.is_null() {
            continue;
        }

        let location = SourceLocation::new(file.clone(), line);
        if value.get("kind").and_then(Value::as_str) == Some("List") {
            let items = value
                .get("items")
                .and_then(Value::as_sequence)
                .cloned()
                .unwrap_or_default();
            for item in items {
                resources.push(parse_object(item, &location)?);
            }
        } else {
            resources.push(parse_object(value, &location)?);
        }
    }

    log::debug!("parsed {} resources from {}", resources.len(), file);
    Ok(resources)
}

/// Parse a YAML file. Locations report the absolute path.
pub fn parse_yaml_file(path: &Path) -> Result<Vec<Resource>, ParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    parse_yaml_with_path(&content, &absolute)
}

/// Parse all `.yaml`/`.yml` files under a directory, in file name order.
pub fn parse_yaml_dir(path: &Path) -> Result<Vec<Resource>, ParseError> {
    let mut resources = Vec::new();

    for entry in walkdir::WalkDir::new(path)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ParseError::Io {
            path: path.display().to_string(),
            source: e.into(),
        })?;
        let entry_path = entry.path();
        if entry_path.is_file() && is_yaml_file(entry_path) {
            resources.extend(parse_yaml_file(entry_path)?);
        }
    }

    Ok(resources)
}

/// Parse every input in order. `-` reads standard input.
pub fn parse_paths(paths: &[PathBuf]) -> Result<ResourceSet, ParseError> {
    let mut set = ResourceSet::new();

    for path in paths {
        if path.as_os_str() == "-" {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .map_err(|source| ParseError::Io {
                    path: STDIN_NAME.to_string(),
                    source,
                })?;
            set.extend(parse_yaml(&content)?);
        } else if path.is_dir() {
            set.extend(parse_yaml_dir(path)?);
        } else {
            set.extend(parse_yaml_file(path)?);
        }
    }

    Ok(set)
}

fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Split on `---` separator lines, returning each document with the 1-based
/// line it starts on.
fn split_documents(content: &str) -> Vec<(u32, String)> {
    let mut docs = Vec::new();
    let mut current = String::new();
    let mut start = 1u32;

    for (idx, line) in content.lines().enumerate() {
        if is_separator(line) {
            docs.push((start, std::mem::take(&mut current)));
            start = idx as u32 + 2;
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    docs.push((start, current));

    docs
}

fn is_separator(line: &str) -> bool {
    line.strip_prefix("---").is_some_and(|rest| {
        let rest = rest.trim_start();
        rest.is_empty() || rest.starts_with('#')
    })
}

// ============================================================================
// Object narrowing
// ============================================================================

fn parse_object(mut value: Value, location: &SourceLocation) -> Result<Resource, ParseError> {
    let missing = |field| ParseError::MissingField {
        file: location.file_name.clone(),
        line: location.line,
        field,
    };

    if !value.is_mapping() {
        return Err(ParseError::NotAnObject {
            file: location.file_name.clone(),
            line: location.line,
        });
    }

    normalize_quantities(&mut value);

    let api_version = get_str(&value, "apiVersion").ok_or_else(|| missing("apiVersion"))?;
    let kind = get_str(&value, "kind").ok_or_else(|| missing("kind"))?;
    let metadata = value.get("metadata").ok_or_else(|| missing("metadata"))?;
    let name = get_str(metadata, "name").ok_or_else(|| missing("metadata.name"))?;

    let kind = ResourceKind::from_kind(&kind);
    let invalid = |source| ParseError::InvalidBody {
        file: location.file_name.clone(),
        line: location.line,
        kind: kind.to_string(),
        name: name.clone(),
        source,
    };

    let meta: ObjectMeta = from_value(metadata).map_err(invalid)?;
    let body = parse_body(&kind, &value).map_err(invalid)?;

    let id = ResourceId::new(kind, api_version, meta.namespace.clone(), name.clone());
    let mut resource = Resource::new(id, body).with_location(location.clone());
    resource.labels = meta.labels.unwrap_or_default();
    resource.annotations = meta.annotations.unwrap_or_default();
    Ok(resource.with_raw(value))
}

fn parse_body(kind: &ResourceKind, value: &Value) -> Result<ResourceBody, serde_yaml::Error> {
    let spec = value.get("spec");

    let body = match kind {
        ResourceKind::Deployment
        | ResourceKind::StatefulSet
        | ResourceKind::DaemonSet
        | ResourceKind::ReplicaSet
        | ResourceKind::Job => {
            let strategy_key = if *kind == ResourceKind::Deployment {
                "strategy"
            } else {
                "updateStrategy"
            };
            let workload = Workload {
                replicas: spec
                    .and_then(|s| get_i64(s, "replicas"))
                    .map(|n| {
                        i32::try_from(n).map_err(|_| {
                            serde_yaml::Error::custom(format!("replicas {n} is out of range"))
                        })
                    })
                    .transpose()?,
                template: optional_field(spec.and_then(|s| s.get("template")))?,
                strategy_type: spec
                    .and_then(|s| s.get(strategy_key))
                    .and_then(|s| get_str(s, "type")),
                service_name: spec.and_then(|s| get_str(s, "serviceName")),
                starting_deadline_seconds: None,
            };
            ResourceBody::Workload(Box::new(workload))
        }
        ResourceKind::CronJob => {
            let template = spec
                .and_then(|s| s.get("jobTemplate"))
                .and_then(|t| t.get("spec"))
                .and_then(|s| s.get("template"));
            let workload = Workload {
                template: optional_field(template)?,
                starting_deadline_seconds: spec
                    .and_then(|s| get_i64(s, "startingDeadlineSeconds")),
                ..Default::default()
            };
            ResourceBody::Workload(Box::new(workload))
        }
        ResourceKind::Pod => {
            let workload = Workload {
                template: PodTemplateSpec {
                    metadata: None,
                    spec: spec.map(from_value).transpose()?,
                },
                ..Default::default()
            };
            ResourceBody::Workload(Box::new(workload))
        }
        ResourceKind::Service => {
            ResourceBody::Service(Box::new(optional_field::<ServiceSpec>(spec)?))
        }
        ResourceKind::Ingress => {
            ResourceBody::Ingress(Box::new(optional_field::<IngressSpec>(spec)?))
        }
        ResourceKind::NetworkPolicy => {
            ResourceBody::NetworkPolicy(Box::new(optional_field::<NetworkPolicySpec>(spec)?))
        }
        ResourceKind::PodDisruptionBudget => ResourceBody::PodDisruptionBudget(Box::new(
            optional_field::<PodDisruptionBudgetSpec>(spec)?,
        )),
        ResourceKind::HorizontalPodAutoscaler | ResourceKind::Other(_) => ResourceBody::Other,
    };

    Ok(body)
}

/// Quantities must be strings for `k8s-openapi`; manifests often write
/// `cpu: 1`. Numbers directly under `limits`/`requests` are stringified.
fn normalize_quantities(value: &mut Value) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map.iter_mut() {
                let is_quantity_map = matches!(key.as_str(), Some("limits") | Some("requests"));
                if is_quantity_map && let Value::Mapping(quantities) = child {
                    for (_, q) in quantities.iter_mut() {
                        if let Value::Number(n) = q {
                            *q = Value::String(n.to_string());
                        }
                    }
                } else {
                    normalize_quantities(child);
                }
            }
        }
        Value::Sequence(items) => items.iter_mut().for_each(normalize_quantities),
        _ => {}
    }
}

// ============================================================================
// Parse helper functions
// ============================================================================

fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, serde_yaml::Error> {
    serde_yaml::from_value(value.clone())
}

fn optional_field<T: DeserializeOwned + Default>(
    value: Option<&Value>,
) -> Result<T, serde_yaml::Error> {
    match value {
        Some(v) if !v.is_null() => from_value(v),
        _ => Ok(T::default()),
    }
}

fn get_str(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(|s| s.to_string())
}

fn get_i64(value: &Value, key: &str) -> Option<i64> {
    value.get(key)?.as_i64()
}
