//! SARIF (Static Analysis Results Interchange Format) formatter.
//!
//! SARIF is a standard format for static analysis tool output,
//! supported by GitHub code scanning and most editors.

use crate::analyzer::kubescore::scorecard::ScoreCard;
use crate::analyzer::kubescore::types::Grade;
use serde::Serialize;
use std::collections::HashSet;

/// Format a score card as SARIF. Only Critical and Warning scores are reported.
pub fn format(card: &ScoreCard) -> String {
    let output = SarifOutput::from(card);
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

#[derive(Serialize)]
struct SarifOutput {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<SarifRegion>,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: u32,
}

impl From<&ScoreCard> for SarifOutput {
    fn from(card: &ScoreCard) -> Self {
        let mut rules: Vec<SarifRule> = Vec::new();
        let mut seen_rules = HashSet::new();
        let mut results: Vec<SarifResult> = Vec::new();

        for (object, score) in card.scores() {
            let Some(level) = grade_to_sarif_level(score.grade) else {
                continue;
            };

            if seen_rules.insert(score.check.id.clone()) {
                rules.push(SarifRule {
                    id: score.check.id.clone(),
                    name: score.check.name.clone(),
                    short_description: SarifMessage {
                        text: score.check.comment.clone(),
                    },
                });
            }

            let location = SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        uri: object.location.file_name.clone(),
                    },
                    region: (object.location.line > 0).then(|| SarifRegion {
                        start_line: object.location.line,
                    }),
                },
            };

            let text = if score.comments.is_empty() {
                score.check.name.clone()
            } else {
                score
                    .comments
                    .iter()
                    .map(|c| match c.path.as_str() {
                        "" => c.summary.clone(),
                        path => format!("({}) {}", path, c.summary),
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            };

            results.push(SarifResult {
                rule_id: score.check.id.clone(),
                level: level.to_string(),
                message: SarifMessage {
                    text: format!("{} {}: {}", object.id.kind, object.id.object_identifier(), text),
                },
                locations: vec![location],
            });
        }

        Self {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json".to_string(),
            version: "2.1.0".to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "kube-score".to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                        information_uri: "https://github.com/zegl/kube-score".to_string(),
                        rules,
                    },
                },
                results,
            }],
        }
    }
}

fn grade_to_sarif_level(grade: Grade) -> Option<&'static str> {
    match grade {
        Grade::Critical => Some("error"),
        Grade::Warning => Some("warning"),
        Grade::Ok | Grade::Skipped => None,
    }
}
