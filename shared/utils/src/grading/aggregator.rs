//! Curriculum-unit aggregation.

use bulletin_models::{Layout, StudentRecord, StudentResults, SubjectResult, UnitResult};

use super::average::{entries_average, round2};
use super::credits::CreditTable;
use super::parser::parse_grade_cell;

/// Minimum average (on 20) for a subject's credits to be awarded.
pub const PASS_THRESHOLD: f64 = 8.0;

pub fn award_credit(average: f64, credit: u32) -> u32 {
    if average >= PASS_THRESHOLD {
        credit
    } else {
        0
    }
}

/// Parses and scores one subject cell.
pub fn evaluate_subject(position: usize, raw: &str, credit: u32, credits_hidden: bool) -> SubjectResult {
    let entries = parse_grade_cell(raw);
    let average = entries_average(&entries);
    let credits = if entries.is_empty() {
        0
    } else {
        award_credit(average, credit)
    };

    SubjectResult {
        position,
        average,
        entry_count: entries.len(),
        credits,
        credits_hidden,
    }
}

/// Mean over subjects that carry at least one grade, rounded to two decimals.
///
/// Subjects without data are left out of the denominator.
pub fn unit_average<'a, I>(subjects: I) -> (f64, usize)
where
    I: IntoIterator<Item = &'a SubjectResult>,
{
    let (sum, count) = subjects
        .into_iter()
        .filter(|s| s.has_data())
        .fold((0.0, 0usize), |(sum, count), s| (sum + s.average, count + 1));

    if count == 0 {
        (0.0, 0)
    } else {
        (round2(sum / count as f64), count)
    }
}

/// Scores every configured subject of a layout for one student row.
pub struct UnitAggregator<'a> {
    layout: &'a Layout,
    credits: &'a CreditTable,
}

impl<'a> UnitAggregator<'a> {
    pub fn new(layout: &'a Layout, credits: &'a CreditTable) -> Self {
        Self { layout, credits }
    }

    pub fn aggregate(&self, record: &StudentRecord) -> StudentResults {
        let subjects: Vec<SubjectResult> = self
            .layout
            .positions()
            .map(|(position, spec)| {
                evaluate_subject(
                    position,
                    record.cell(spec.column),
                    self.credits.credit_for(position),
                    self.layout.is_credit_hidden(position),
                )
            })
            .collect();

        let mut units = Vec::with_capacity(self.layout.units.len());
        let mut total_credits = 0u32;
        let mut weighted_sum = 0.0;

        for unit in &self.layout.units {
            let members: Vec<&SubjectResult> = unit
                .subjects
                .iter()
                .filter_map(|pos| subjects.iter().find(|s| s.position == *pos))
                .collect();

            let (average, scored_subjects) = unit_average(members.iter().copied());
            let credits: u32 = members.iter().map(|s| s.credits).sum();

            total_credits += credits;
            weighted_sum += average * f64::from(credits);

            units.push(UnitResult {
                name: unit.name.clone(),
                average,
                credits,
                scored_subjects,
            });
        }

        let overall_average = if total_credits == 0 {
            0.0
        } else {
            weighted_sum / f64::from(total_credits)
        };

        tracing::debug!(
            student = %record.name,
            layout = %self.layout.key,
            total_credits,
            overall_average,
            "Aggregated student grades"
        );

        StudentResults {
            subjects,
            units,
            total_credits,
            overall_average,
        }
    }
}
