//! Output formatters for score cards.
//!
//! Every formatter is a pure function of the score card. The format and
//! version pair is validated up front with `select_renderer` so that an
//! unsupported combination aborts before any scoring happens.

pub mod ci;
pub mod human;
pub mod json;
pub mod sarif;

use crate::analyzer::kubescore::scorecard::ScoreCard;
use crate::analyzer::kubescore::types::Grade;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Grouped, colored, wrapped text.
    #[default]
    Human,
    /// One line per finding.
    Ci,
    /// JSON output.
    Json,
    /// SARIF for code scanning integrations.
    Sarif,
}

impl OutputFormat {
    /// Parse from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "ci" => Some(Self::Ci),
            "json" => Some(Self::Json),
            "sarif" => Some(Self::Sarif),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ci => "ci",
            Self::Json => "json",
            Self::Sarif => "sarif",
        }
    }
}

/// Output schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputVersion {
    V1,
    V2,
}

impl OutputVersion {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "v1" => Some(Self::V1),
            "v2" => Some(Self::V2),
            _ => None,
        }
    }
}

/// A resolved (format, version) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Human,
    Ci,
    JsonV1,
    JsonV2,
    Sarif,
}

/// Errors selecting an output renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("unknown output format '{0}', expected one of: human, ci, json, sarif")]
    UnknownFormat(String),

    #[error("unknown output version '{0}', expected v1 or v2")]
    UnknownVersion(String),

    #[error("output format {format} does not support version {version}")]
    UnsupportedVersion {
        format: &'static str,
        version: String,
    },
}

/// Resolve a format name and optional version string into a renderer.
pub fn select_renderer(format: &str, version: Option<&str>) -> Result<Renderer, FormatError> {
    let format =
        OutputFormat::parse(format).ok_or_else(|| FormatError::UnknownFormat(format.to_string()))?;
    let parsed = version
        .map(|v| OutputVersion::parse(v).ok_or_else(|| FormatError::UnknownVersion(v.to_string())))
        .transpose()?;

    match (format, parsed) {
        (OutputFormat::Human, None | Some(OutputVersion::V1)) => Ok(Renderer::Human),
        (OutputFormat::Ci, None | Some(OutputVersion::V1)) => Ok(Renderer::Ci),
        (OutputFormat::Json, Some(OutputVersion::V1)) => Ok(Renderer::JsonV1),
        (OutputFormat::Json, None | Some(OutputVersion::V2)) => Ok(Renderer::JsonV2),
        (OutputFormat::Sarif, _) => Ok(Renderer::Sarif),
        (format, Some(_)) => Err(FormatError::UnsupportedVersion {
            format: format.as_str(),
            version: version.unwrap_or_default().to_string(),
        }),
    }
}

/// Presentation settings for the human formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// 0 hides OK and skipped scores, 1 shows OK, 2 also shows skipped.
    pub verbosity: u8,
    /// Column to wrap long explanations at.
    pub width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            verbosity: 0,
            width: 80,
        }
    }
}

impl RenderOptions {
    /// Options sized to the current terminal, falling back to 80 columns.
    pub fn for_terminal(verbosity: u8) -> Self {
        Self {
            verbosity,
            width: term_size::dimensions().map(|(w, _)| w).unwrap_or(80),
        }
    }

    /// Whether a score with `grade` is shown at this verbosity.
    pub fn shows(&self, grade: Grade) -> bool {
        match grade {
            Grade::Critical | Grade::Warning => true,
            Grade::Ok => self.verbosity >= 1,
            Grade::Skipped => self.verbosity >= 2,
        }
    }
}

/// Format a score card to a string.
pub fn format_result_to_string(
    card: &ScoreCard,
    renderer: Renderer,
    options: &RenderOptions,
) -> String {
    match renderer {
        Renderer::Human => human::format(card, options),
        Renderer::Ci => ci::format(card),
        Renderer::JsonV1 => json::format_v1(card),
        Renderer::JsonV2 => json::format_v2(card),
        Renderer::Sarif => sarif::format(card),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::analyzer::kubescore::context::{ResourceId, SourceLocation};
    use crate::analyzer::kubescore::scorecard::{CheckSummary, ScoreCard, ScoredObject, TestScore};
    use crate::analyzer::kubescore::types::{Comment, Finding, Grade, ResourceKind};

    fn summary(id: &str) -> CheckSummary {
        CheckSummary {
            id: id.to_string(),
            name: format!("Check {id}"),
            target_type: "DeploymentLike".to_string(),
            comment: format!("Checks {id}"),
            optional: false,
        }
    }

    /// One Deployment with a critical, a warning, an OK and a skipped score.
    pub fn sample_card() -> ScoreCard {
        let id = ResourceId::new(
            ResourceKind::Deployment,
            "apps/v1",
            Some("prod".to_string()),
            "web",
        );
        let mut object = ScoredObject::new(id, SourceLocation::new("deploy.yaml", 3));
        object.add(TestScore::new(
            summary("container-cpu-limit"),
            Finding::new(Grade::Critical).with_comment(Comment::new(
                "app",
                "CPU limit is not set",
                "Set resources.limits.cpu",
            )),
        ));
        object.add(TestScore::new(
            summary("pod-probes"),
            Finding::new(Grade::Warning).with_comment(Comment::new(
                "",
                "Probe warning",
                "",
            )),
        ));
        object.add(TestScore::new(summary("container-image-tag"), Finding::ok()));
        object.add(TestScore::new(
            summary("service-type"),
            Finding::skipped("Skipped because of the kube-score/ignore annotation"),
        ));

        let mut card = ScoreCard::new();
        card.insert(object);
        card
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_renderer_defaults() {
        assert_eq!(select_renderer("human", None), Ok(Renderer::Human));
        assert_eq!(select_renderer("ci", None), Ok(Renderer::Ci));
        assert_eq!(select_renderer("json", None), Ok(Renderer::JsonV2));
        assert_eq!(select_renderer("json", Some("v1")), Ok(Renderer::JsonV1));
        assert_eq!(select_renderer("SARIF", None), Ok(Renderer::Sarif));
        assert_eq!(select_renderer("sarif", Some("v2")), Ok(Renderer::Sarif));
    }

    #[test]
    fn test_select_renderer_rejects_unknown() {
        assert_eq!(
            select_renderer("xml", None),
            Err(FormatError::UnknownFormat("xml".to_string()))
        );
        assert_eq!(
            select_renderer("json", Some("v3")),
            Err(FormatError::UnknownVersion("v3".to_string()))
        );
        assert!(matches!(
            select_renderer("human", Some("v2")),
            Err(FormatError::UnsupportedVersion { format: "human", .. })
        ));
    }

    #[test]
    fn test_verbosity_filter() {
        let quiet = RenderOptions::default();
        assert!(quiet.shows(Grade::Critical));
        assert!(!quiet.shows(Grade::Ok));
        assert!(!quiet.shows(Grade::Skipped));

        let verbose = RenderOptions {
            verbosity: 2,
            ..Default::default()
        };
        assert!(verbose.shows(Grade::Ok));
        assert!(verbose.shows(Grade::Skipped));
    }
}
