//! Aggregated result of a scoring run.
//!
//! The executor is the only writer. Renderers and the exit-code decision
//! read it through the query methods below.

use crate::analyzer::kubescore::context::{ResourceId, SourceLocation};
use crate::analyzer::kubescore::registry::Check;
use crate::analyzer::kubescore::types::{Comment, Finding, Grade};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// The parts of a check a renderer needs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CheckSummary {
    pub id: String,
    pub name: String,
    pub target_type: String,
    pub comment: String,
    pub optional: bool,
}

impl From<&Check> for CheckSummary {
    fn from(check: &Check) -> Self {
        Self {
            id: check.id.clone(),
            name: check.name.clone(),
            target_type: check.target.to_string(),
            comment: check.comment.clone(),
            optional: check.optional,
        }
    }
}

/// Outcome of one check on one resource. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TestScore {
    pub check: CheckSummary,
    pub grade: Grade,
    pub skipped: bool,
    pub comments: Vec<Comment>,
}

impl TestScore {
    pub fn new(check: CheckSummary, finding: Finding) -> Self {
        Self {
            check,
            grade: finding.grade,
            skipped: finding.grade.is_skipped(),
            comments: finding.comments,
        }
    }

    pub fn check_id(&self) -> &str {
        &self.check.id
    }
}

/// Every score recorded for a single resource, in check registration order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScoredObject {
    #[serde(rename = "ObjectMeta")]
    pub id: ResourceId,
    #[serde(rename = "FileLocation")]
    pub location: SourceLocation,
    #[serde(rename = "Checks")]
    pub checks: Vec<TestScore>,
}

impl ScoredObject {
    pub fn new(id: ResourceId, location: SourceLocation) -> Self {
        Self {
            id,
            location,
            checks: Vec::new(),
        }
    }

    pub fn add(&mut self, score: TestScore) {
        self.checks.push(score);
    }

    /// Worst grade among evaluated checks; `None` when nothing was evaluated.
    pub fn worst_grade(&self) -> Option<Grade> {
        self.checks
            .iter()
            .map(|s| s.grade)
            .filter(|g| !g.is_skipped())
            .reduce(|worst, g| if g < worst { g } else { worst })
    }

    pub fn score_for(&self, check_id: &str) -> Option<&TestScore> {
        self.checks.iter().find(|s| s.check_id() == check_id)
    }
}

/// Number of scores per grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct GradeCounts {
    pub critical: usize,
    pub warning: usize,
    pub ok: usize,
    pub skipped: usize,
}

impl GradeCounts {
    fn record(&mut self, grade: Grade) {
        match grade {
            Grade::Critical => self.critical += 1,
            Grade::Warning => self.warning += 1,
            Grade::Ok => self.ok += 1,
            Grade::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.ok + self.skipped
    }
}

impl fmt::Display for GradeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} critical, {} warning, {} ok, {} skipped",
            self.critical, self.warning, self.ok, self.skipped
        )
    }
}

/// Scores for every resource of a run, keyed by resource identity in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreCard {
    objects: IndexMap<ResourceId, ScoredObject>,
}

impl ScoreCard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource's scores. Returns the previous entry if the identity
    /// was already present.
    pub fn insert(&mut self, object: ScoredObject) -> Option<ScoredObject> {
        self.objects.insert(object.id.clone(), object)
    }

    pub fn get(&self, id: &ResourceId) -> Option<&ScoredObject> {
        self.objects.get(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &ScoredObject> {
        self.objects.values()
    }

    /// Every score with its resource, in output order.
    pub fn scores(&self) -> impl Iterator<Item = (&ScoredObject, &TestScore)> {
        self.objects
            .values()
            .flat_map(|o| o.checks.iter().map(move |s| (o, s)))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// True iff some evaluated score is at or below `threshold` in the
    /// severity order. Skipped scores never count.
    pub fn any_below_or_equal_to_grade(&self, threshold: Grade) -> bool {
        self.scores()
            .any(|(_, s)| !s.grade.is_skipped() && s.grade <= threshold)
    }

    pub fn grade_counts(&self) -> GradeCounts {
        let mut counts = GradeCounts::default();
        for (_, score) in self.scores() {
            counts.record(score.grade);
        }
        counts
    }
}

impl Serialize for ScoreCard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.objects.len()))?;
        for (id, object) in &self.objects {
            map.serialize_entry(&id.to_string(), object)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::types::ResourceKind;

    fn summary(id: &str) -> CheckSummary {
        CheckSummary {
            id: id.to_string(),
            name: id.to_string(),
            target_type: "Any".to_string(),
            comment: String::new(),
            optional: false,
        }
    }

    fn card_with(grades: &[Grade]) -> ScoreCard {
        let id = ResourceId::new(ResourceKind::Service, "v1", None, "svc");
        let mut object = ScoredObject::new(id, SourceLocation::default());
        for (i, grade) in grades.iter().enumerate() {
            object.add(TestScore::new(summary(&format!("c{i}")), Finding::new(*grade)));
        }
        let mut card = ScoreCard::new();
        card.insert(object);
        card
    }

    #[test]
    fn test_any_below_or_equal_to_grade() {
        let card = card_with(&[Grade::Ok, Grade::Warning]);
        assert!(card.any_below_or_equal_to_grade(Grade::Warning));
        assert!(!card.any_below_or_equal_to_grade(Grade::Critical));
        assert!(card.any_below_or_equal_to_grade(Grade::Ok));
    }

    #[test]
    fn test_skipped_never_counts() {
        let card = card_with(&[Grade::Skipped, Grade::Skipped, Grade::Ok]);
        assert!(!card.any_below_or_equal_to_grade(Grade::Critical));
        assert!(!card.any_below_or_equal_to_grade(Grade::Warning));
        assert!(!card.any_below_or_equal_to_grade(Grade::Skipped));
    }

    #[test]
    fn test_empty_card() {
        let card = ScoreCard::new();
        assert!(card.is_empty());
        assert!(!card.any_below_or_equal_to_grade(Grade::Ok));
        assert_eq!(card.grade_counts().total(), 0);
    }

    #[test]
    fn test_worst_grade_ignores_skipped() {
        let card = card_with(&[Grade::Skipped, Grade::Warning, Grade::Ok]);
        let object = card.objects().next().unwrap();
        assert_eq!(object.worst_grade(), Some(Grade::Warning));

        let card = card_with(&[Grade::Skipped]);
        assert_eq!(card.objects().next().unwrap().worst_grade(), None);
    }

    #[test]
    fn test_grade_counts() {
        let card = card_with(&[Grade::Critical, Grade::Ok, Grade::Ok, Grade::Skipped]);
        let counts = card.grade_counts();
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.ok, 2);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.to_string(), "1 critical, 0 warning, 2 ok, 1 skipped");
    }

    #[test]
    fn test_serializes_keyed_by_identity() {
        let card = card_with(&[Grade::Ok]);
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("v1/Service svc").is_some());
    }
}
