//! Line-oriented formatter for CI logs.

use crate::analyzer::kubescore::context::ResourceId;
use crate::analyzer::kubescore::scorecard::ScoreCard;

/// One line per comment, or per score when it has none.
pub fn format(card: &ScoreCard) -> String {
    let mut output = String::new();

    for (object, score) in card.scores() {
        let prefix = format!("[{}] {} {}", score.grade, object_name(&object.id), object.id.kind);

        if score.comments.is_empty() {
            output.push_str(&format!("{}: {}\n", prefix, score.check.name));
            continue;
        }
        for comment in &score.comments {
            if comment.path.is_empty() {
                output.push_str(&format!("{}: {}\n", prefix, comment.summary));
            } else {
                output.push_str(&format!("{}: ({}) {}\n", prefix, comment.path, comment.summary));
            }
        }
    }

    output
}

/// `name/namespace`, or just `name` for cluster-scoped objects.
fn object_name(id: &ResourceId) -> String {
    match &id.namespace {
        Some(ns) => format!("{}/{}", id.name, ns),
        None => id.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::sample_card;
    use super::*;

    #[test]
    fn test_ci_lines() {
        let output = format(&sample_card());
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[CRITICAL] web/prod Deployment: (app) CPU limit is not set",
                "[WARNING] web/prod Deployment: Probe warning",
                "[OK] web/prod Deployment: Check container-image-tag",
                "[SKIPPED] web/prod Deployment: Skipped because of the kube-score/ignore annotation",
            ]
        );
    }
}
