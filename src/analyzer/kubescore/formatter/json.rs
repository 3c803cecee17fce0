//! JSON formatters.
//!
//! v1 is the score card serialized as-is, keyed by resource identity.
//! v2 is a list of objects with Kubernetes-style type and object metadata.

use crate::analyzer::kubescore::scorecard::{CheckSummary, ScoreCard, ScoredObject, TestScore};
use crate::analyzer::kubescore::types::Comment;
use serde::Serialize;

/// Format a score card as JSON v1.
pub fn format_v1(card: &ScoreCard) -> String {
    serde_json::to_string_pretty(card).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

/// Format a score card as JSON v2.
pub fn format_v2(card: &ScoreCard) -> String {
    let output: Vec<JsonObject<'_>> = card.objects().map(JsonObject::from).collect();
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string()) + "\n"
}

#[derive(Serialize)]
struct JsonObject<'a> {
    object_name: String,
    type_meta: TypeMeta<'a>,
    object_meta: ObjectMeta<'a>,
    file_name: &'a str,
    file_row: u32,
    checks: Vec<JsonCheck<'a>>,
}

#[derive(Serialize)]
struct TypeMeta<'a> {
    #[serde(rename = "apiVersion")]
    api_version: &'a str,
    kind: &'a str,
}

#[derive(Serialize)]
struct ObjectMeta<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonCheck<'a> {
    check: &'a CheckSummary,
    grade: u8,
    skipped: bool,
    comments: &'a [Comment],
}

impl<'a> From<&'a ScoredObject> for JsonObject<'a> {
    fn from(object: &'a ScoredObject) -> Self {
        Self {
            object_name: object.id.name.clone(),
            type_meta: TypeMeta {
                api_version: &object.id.api_version,
                kind: object.id.kind.as_str(),
            },
            object_meta: ObjectMeta {
                name: &object.id.name,
                namespace: object.id.namespace.as_deref(),
            },
            file_name: &object.location.file_name,
            file_row: object.location.line,
            checks: object.checks.iter().map(JsonCheck::from).collect(),
        }
    }
}

impl<'a> From<&'a TestScore> for JsonCheck<'a> {
    fn from(score: &'a TestScore) -> Self {
        Self {
            check: &score.check,
            grade: score.grade.score(),
            skipped: score.skipped,
            comments: &score.comments,
        }
    }
}
