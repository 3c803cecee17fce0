//! Human-readable formatter.

use super::RenderOptions;
use crate::analyzer::kubescore::scorecard::{ScoreCard, ScoredObject, TestScore};
use crate::analyzer::kubescore::types::Grade;
use colored::{ColoredString, Colorize};

const SCORE_INDENT: &str = "    ";
const COMMENT_INDENT: &str = "        ";
const DETAIL_INDENT: &str = "            ";

/// Format a score card for a terminal.
pub fn format(card: &ScoreCard, options: &RenderOptions) -> String {
    let mut output = String::new();

    for object in card.objects() {
        format_object(&mut output, object, options);
    }

    output
}

fn format_object(output: &mut String, object: &ScoredObject, options: &RenderOptions) {
    let header = object.id.to_string();
    let marker = match object.worst_grade() {
        Some(Grade::Critical) => "💥",
        Some(Grade::Warning) => "⚠️",
        _ => "✅",
    };
    let padding = options
        .width
        .saturating_sub(header.chars().count() + 2)
        .max(1);
    output.push_str(&format!(
        "{}{}{}\n",
        header.bold(),
        " ".repeat(padding),
        marker
    ));

    for score in object.checks.iter().filter(|s| options.shows(s.grade)) {
        format_score(output, score, options);
    }
}

fn format_score(output: &mut String, score: &TestScore, options: &RenderOptions) {
    output.push_str(&format!(
        "{}[{}] {}\n",
        SCORE_INDENT,
        colored_grade(score.grade),
        score.check.name
    ));

    for comment in &score.comments {
        let line = if comment.path.is_empty() {
            comment.summary.clone()
        } else {
            format!("{} -> {}", comment.path, comment.summary)
        };
        output.push_str(&format!("{}· {}\n", COMMENT_INDENT, line));

        if !comment.details.is_empty() {
            let width = options.width.saturating_sub(DETAIL_INDENT.len()).max(20);
            for wrapped in textwrap::wrap(&comment.details, width) {
                output.push_str(&format!("{}{}\n", DETAIL_INDENT, wrapped.as_ref().dimmed()));
            }
        }
    }
}

fn colored_grade(grade: Grade) -> ColoredString {
    match grade {
        Grade::Critical => grade.as_str().bright_red().bold(),
        Grade::Warning => grade.as_str().yellow().bold(),
        Grade::Ok => grade.as_str().green(),
        Grade::Skipped => grade.as_str().dimmed(),
    }
}
