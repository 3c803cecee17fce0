//! Kubernetes manifest scoring engine.
//!
//! Parses manifests into typed resources, runs a registry of checks against
//! each of them and collects a graded score card.
//!
//! # Features
//!
//! - Multi-document YAML, `kind: List`, directories and stdin
//! - 26 built-in reliability and security checks, 7 of them optional
//! - Suppression through the `kube-score/ignore` annotation
//! - Per-check fault isolation: a failing check becomes a Critical score
//! - Human, CI, JSON (v1/v2) and SARIF output
//!
//! # Example
//!
//! ```rust,ignore
//! use kube_score::analyzer::kubescore::{CheckRegistry, ScoreConfig, Scorer, Grade, parse_yaml};
//!
//! let resources = parse_yaml(manifest)?.into();
//! let registry = CheckRegistry::with_builtin_checks()?;
//! let config = ScoreConfig::new().enable_optional_test("deployment-replicas");
//! let card = Scorer::new(&registry, &config).score(&resources)?;
//!
//! if card.any_below_or_equal_to_grade(Grade::Critical) {
//!     std::process::exit(1);
//! }
//! ```

pub mod checks;
pub mod config;
pub mod context;
pub mod executor;
pub mod extract;
pub mod formatter;
pub mod parser;
pub mod pragma;
pub mod registry;
pub mod scorecard;
pub mod types;
pub mod version;

// Re-export main types and functions
pub use config::ScoreConfig;
pub use context::{Resource, ResourceBody, ResourceId, ResourceSet};
pub use executor::{ScoreError, Scorer, score};
pub use formatter::{
    FormatError, OutputFormat, RenderOptions, Renderer, format_result_to_string,
    select_renderer,
};
pub use parser::{ParseError, parse_paths, parse_yaml};
pub use registry::{Check, CheckError, CheckRegistry, RegistryError};
pub use scorecard::{GradeCounts, ScoreCard, ScoredObject, TestScore};
pub use types::{Comment, Finding, Grade, ResourceKind, TargetKind};
pub use version::{KubernetesVersion, VersionError};
