use serde::{Deserialize, Serialize};

/// A single weighted assessment extracted from a grade cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GradeEntry {
    pub score: f64,
    pub weight: f64,
}

impl GradeEntry {
    pub fn new(score: f64, weight: f64) -> Self {
        Self { score, weight }
    }
}

/// Aggregated outcome of one subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectResult {
    pub position: usize,
    pub average: f64,
    pub entry_count: usize,
    pub credits: u32,
    /// Credit award is computed but not printed on the report.
    pub credits_hidden: bool,
}

impl SubjectResult {
    pub fn has_data(&self) -> bool {
        self.entry_count > 0
    }
}

/// Aggregated outcome of one curriculum unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitResult {
    pub name: String,
    /// Mean of the scored subjects, rounded to two decimals.
    pub average: f64,
    pub credits: u32,
    pub scored_subjects: usize,
}

/// Everything computed for one student.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudentResults {
    pub subjects: Vec<SubjectResult>,
    pub units: Vec<UnitResult>,
    pub total_credits: u32,
    pub overall_average: f64,
}

impl StudentResults {
    pub fn subject(&self, position: usize) -> Option<&SubjectResult> {
        self.subjects.iter().find(|s| s.position == position)
    }

    pub fn unit(&self, name: &str) -> Option<&UnitResult> {
        self.units.iter().find(|u| u.name == name)
    }
}
