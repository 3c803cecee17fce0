//! Core types for the scoring engine.
//!
//! - `Grade` - outcome of a single check, with an explicit severity order
//! - `Comment` - one explanation attached to a grade
//! - `Finding` - what a check function returns
//! - `ResourceKind` / `TargetKind` - which objects a check applies to

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Grade given to a (resource, check) pair.
///
/// `Critical < Warning < Ok` is a total order. `Skipped` means the check was
/// not evaluated and is incomparable with every other grade, so ordered
/// comparisons against it always return `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Grade {
    Critical,
    Warning,
    Ok,
    Skipped,
}

impl Grade {
    /// Position in the severity order, `None` for `Skipped`.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Critical => Some(1),
            Self::Warning => Some(5),
            Self::Ok => Some(10),
            Self::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Ok => "OK",
            Self::Skipped => "SKIPPED",
        }
    }

    /// Numeric value used by the JSON v2 output.
    pub fn score(&self) -> u8 {
        self.rank().unwrap_or(0)
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            (None, None) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One explanation attached to a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Where in the object the issue is, usually a container name. May be empty.
    pub path: String,
    pub summary: String,
    #[serde(rename = "description")]
    pub details: String,
}

impl Comment {
    pub fn new(
        path: impl Into<String>,
        summary: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            summary: summary.into(),
            details: details.into(),
        }
    }
}

/// Result of evaluating one check against one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub grade: Grade,
    pub comments: Vec<Comment>,
}

impl Finding {
    pub fn new(grade: Grade) -> Self {
        Self {
            grade,
            comments: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(Grade::Ok)
    }

    pub fn skipped(summary: impl Into<String>) -> Self {
        Self::new(Grade::Skipped).with_comment(Comment::new("", summary, ""))
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comments.push(comment);
        self
    }

    /// Record a problem, lowering the grade to `grade` if it is worse than
    /// the current one.
    pub fn add(&mut self, grade: Grade, comment: Comment) {
        if grade < self.grade {
            self.grade = grade;
        }
        self.comments.push(comment);
    }

    /// Build a finding from collected problems: `Ok` when there are none.
    pub fn from_problems(grade: Grade, comments: Vec<Comment>) -> Self {
        if comments.is_empty() {
            Self::ok()
        } else {
            Self { grade, comments }
        }
    }
}

/// Kinds of Kubernetes objects the engine knows how to narrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    ReplicaSet,
    Pod,
    Job,
    CronJob,
    Service,
    Ingress,
    NetworkPolicy,
    PodDisruptionBudget,
    HorizontalPodAutoscaler,
    /// Any kind not listed above; only `TargetKind::Any` checks apply.
    Other(String),
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::ReplicaSet => "ReplicaSet",
            Self::Pod => "Pod",
            Self::Job => "Job",
            Self::CronJob => "CronJob",
            Self::Service => "Service",
            Self::Ingress => "Ingress",
            Self::NetworkPolicy => "NetworkPolicy",
            Self::PodDisruptionBudget => "PodDisruptionBudget",
            Self::HorizontalPodAutoscaler => "HorizontalPodAutoscaler",
            Self::Other(kind) => kind,
        }
    }

    /// Parse from a Kubernetes `kind` string. Never fails.
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "Deployment" => Self::Deployment,
            "StatefulSet" => Self::StatefulSet,
            "DaemonSet" => Self::DaemonSet,
            "ReplicaSet" => Self::ReplicaSet,
            "Pod" => Self::Pod,
            "Job" => Self::Job,
            "CronJob" => Self::CronJob,
            "Service" => Self::Service,
            "Ingress" => Self::Ingress,
            "NetworkPolicy" => Self::NetworkPolicy,
            "PodDisruptionBudget" => Self::PodDisruptionBudget,
            "HorizontalPodAutoscaler" => Self::HorizontalPodAutoscaler,
            other => Self::Other(other.to_string()),
        }
    }

    /// Kinds that carry a pod template (or are a pod).
    pub fn is_deployment_like(&self) -> bool {
        matches!(
            self,
            Self::Deployment
                | Self::StatefulSet
                | Self::DaemonSet
                | Self::ReplicaSet
                | Self::Pod
                | Self::Job
                | Self::CronJob
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let kind = String::deserialize(deserializer)?;
        Ok(Self::from_kind(&kind))
    }
}

/// Which resources a check applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// Exactly one kind.
    Kind(ResourceKind),
    /// Every kind that has a pod spec.
    DeploymentLike,
    /// Every object, including unknown kinds.
    Any,
}

impl TargetKind {
    pub fn matches(&self, kind: &ResourceKind) -> bool {
        match self {
            Self::Kind(k) => k == kind,
            Self::DeploymentLike => kind.is_deployment_like(),
            Self::Any => true,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Kind(k) => k.as_str(),
            Self::DeploymentLike => "DeploymentLike",
            Self::Any => "Any",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ResourceKind> for TargetKind {
    fn from(kind: ResourceKind) -> Self {
        Self::Kind(kind)
    }
}
