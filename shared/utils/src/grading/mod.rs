//! Grade aggregation
//!
//! Parses grade cells, computes weighted averages and awards credits per
//! subject and curriculum unit.

pub mod parser;
pub mod average;
pub mod credits;
pub mod aggregator;

pub use parser::{parse_grade_cell, parse_segment, format_segment};
pub use average::{weighted_average, entries_average, round2};
pub use credits::CreditTable;
pub use aggregator::{award_credit, evaluate_subject, unit_average, UnitAggregator, PASS_THRESHOLD};
