//! Kubernetes objects as seen by the scoring engine.

use crate::analyzer::kubescore::types::ResourceKind;
use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec, ServiceSpec};
use k8s_openapi::api::networking::v1::{IngressSpec, NetworkPolicySpec};
use k8s_openapi::api::policy::v1::PodDisruptionBudgetSpec;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a resource within one resource set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceId {
    pub kind: ResourceKind,
    pub api_version: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceId {
    pub fn new(
        kind: ResourceKind,
        api_version: impl Into<String>,
        namespace: Option<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            api_version: api_version.into(),
            namespace,
            name: name.into(),
        }
    }

    /// `namespace/name`, or just `name` for cluster-scoped objects.
    pub fn object_identifier(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.api_version, self.kind, self.name)?;
        if let Some(ns) = &self.namespace {
            write!(f, " in {}", ns)?;
        }
        Ok(())
    }
}

/// Where a resource was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file_name: String,
    /// 1-indexed line where the document starts.
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file_name: impl Into<String>, line: u32) -> Self {
        Self {
            file_name: file_name.into(),
            line,
        }
    }
}

/// Controller fields shared by every pod-bearing kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workload {
    pub replicas: Option<i32>,
    pub template: PodTemplateSpec,
    /// `spec.strategy.type` (Deployment) or `spec.updateStrategy.type`.
    pub strategy_type: Option<String>,
    /// `spec.serviceName` (StatefulSet).
    pub service_name: Option<String>,
    /// `spec.startingDeadlineSeconds` (CronJob).
    pub starting_deadline_seconds: Option<i64>,
}

impl Workload {
    pub fn pod_spec(&self) -> Option<&PodSpec> {
        self.template.spec.as_ref()
    }

    pub fn pod_annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.template
            .metadata
            .as_ref()
            .and_then(|m| m.annotations.as_ref())
    }
}

/// Resource body narrowed by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceBody {
    Workload(Box<Workload>),
    Service(Box<ServiceSpec>),
    Ingress(Box<IngressSpec>),
    NetworkPolicy(Box<NetworkPolicySpec>),
    PodDisruptionBudget(Box<PodDisruptionBudgetSpec>),
    /// No typed view; checks read `Resource::raw` if they need anything.
    Other,
}

/// A parsed Kubernetes object ready for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub location: SourceLocation,
    /// The document as decoded, before narrowing.
    pub raw: serde_yaml::Value,
    pub body: ResourceBody,
}

impl Resource {
    pub fn new(id: ResourceId, body: ResourceBody) -> Self {
        Self {
            id,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            location: SourceLocation::default(),
            raw: serde_yaml::Value::Null,
            body,
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_raw(mut self, raw: serde_yaml::Value) -> Self {
        self.raw = raw;
        self
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.id.kind
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.id.namespace.as_deref()
    }

    pub fn api_version(&self) -> &str {
        &self.id.api_version
    }

    pub fn workload(&self) -> Option<&Workload> {
        match &self.body {
            ResourceBody::Workload(w) => Some(w),
            _ => None,
        }
    }

    pub fn pod_spec(&self) -> Option<&PodSpec> {
        self.workload().and_then(Workload::pod_spec)
    }
}
