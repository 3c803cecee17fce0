//! Check definitions and the registry that holds them.
//!
//! The registry is filled once at startup and only read afterwards. Checks
//! are kept in registration order, which is the order they are listed and
//! the order their scores appear for every resource.

use crate::analyzer::kubescore::config::ScoreConfig;
use crate::analyzer::kubescore::context::Resource;
use crate::analyzer::kubescore::types::{Finding, ResourceKind, TargetKind};
use crate::analyzer::kubescore::version::KubernetesVersion;
use indexmap::IndexMap;
use std::fmt;

/// Failure inside a check function. Never leaves the executor: it is turned
/// into a Critical score for the offending (resource, check) pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("expected a {expected} body, got something else")]
    UnexpectedBody { expected: &'static str },

    #[error("{0}")]
    Internal(String),
}

/// A check function that grades one resource.
pub trait CheckFunc: Send + Sync {
    fn check(&self, resource: &Resource, config: &ScoreConfig) -> Result<Finding, CheckError>;
}

impl<F> CheckFunc for F
where
    F: Fn(&Resource, &ScoreConfig) -> Result<Finding, CheckError> + Send + Sync,
{
    fn check(&self, resource: &Resource, config: &ScoreConfig) -> Result<Finding, CheckError> {
        self(resource, config)
    }
}

/// Predicate that removes a check from the applicable set.
pub type ConfigGate = fn(&ScoreConfig) -> bool;

/// A registered check.
pub struct Check {
    /// Stable identifier, used by `--ignore-test` and the ignore annotation.
    pub id: String,
    /// Short human-readable name.
    pub name: String,
    pub target: TargetKind,
    pub comment: String,
    /// Only runs when enabled explicitly.
    pub optional: bool,
    /// Skipped entirely on clusters older than this.
    pub minimum_version: Option<KubernetesVersion>,
    gate: Option<ConfigGate>,
    func: Box<dyn CheckFunc>,
}

impl Check {
    pub fn new<F>(
        id: impl Into<String>,
        name: impl Into<String>,
        target: impl Into<TargetKind>,
        comment: impl Into<String>,
        func: F,
    ) -> Self
    where
        F: Fn(&Resource, &ScoreConfig) -> Result<Finding, CheckError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            target: target.into(),
            comment: comment.into(),
            optional: false,
            minimum_version: None,
            gate: None,
            func: Box::new(func),
        }
    }

    /// Mark the check as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_minimum_version(mut self, version: KubernetesVersion) -> Self {
        self.minimum_version = Some(version);
        self
    }

    /// Drop the check whenever `gate` returns true for the run configuration.
    pub fn disabled_when(mut self, gate: ConfigGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn is_disabled_by(&self, config: &ScoreConfig) -> bool {
        self.gate.is_some_and(|gate| gate(config))
    }

    pub fn supports_version(&self, version: KubernetesVersion) -> bool {
        self.minimum_version.is_none_or(|min| version >= min)
    }

    /// Run the check function. Faults are returned, not handled.
    pub fn evaluate(&self, resource: &Resource, config: &ScoreConfig) -> Result<Finding, CheckError> {
        self.func.check(resource, config)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("target", &self.target)
            .field("optional", &self.optional)
            .field("minimum_version", &self.minimum_version)
            .finish_non_exhaustive()
    }
}

/// Registry construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("check '{0}' is registered more than once")]
    DuplicateCheckId(String),
}

/// Catalog of checks keyed by ID, in registration order.
#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: IndexMap<String, Check>,
}

impl CheckRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in check.
    pub fn with_builtin_checks() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::analyzer::kubescore::checks::register_builtin_checks(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, check: Check) -> Result<(), RegistryError> {
        if self.checks.contains_key(&check.id) {
            return Err(RegistryError::DuplicateCheckId(check.id));
        }
        self.checks.insert(check.id.clone(), check);
        Ok(())
    }

    /// All checks in registration order.
    pub fn all_checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.values()
    }

    /// Checks whose target matches `kind`, in registration order.
    pub fn checks_for(&self, kind: &ResourceKind) -> Vec<&Check> {
        self.checks
            .values()
            .filter(|check| check.target.matches(kind))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Check> {
        self.checks.get(id)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
