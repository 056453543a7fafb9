//! Grade-cell parser.
//!
//! A cell lists one or more assessments separated by `" - "`. Each assessment
//! is a grade with an optional weight in trailing parentheses, e.g.
//! `"12,5(0.6) - 15(0.4)"`. Segments that cannot be read are dropped; the
//! parser never fails.

use bulletin_models::GradeEntry;

pub const SEGMENT_SEPARATOR: &str = " - ";
pub const ABSENCE_MARKER: &str = "Absent au devoir";
/// Code standing for grade 1.
pub const ALIAS_TOKEN: &str = "CCHM";
/// Sub-header repeated under every subject column of the export.
pub const SUBHEADER_TOKEN: &str = "Note";

/// Parses a raw cell into ordered `(grade, weight)` entries.
pub fn parse_grade_cell(raw: &str) -> Vec<GradeEntry> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == SUBHEADER_TOKEN {
        return Vec::new();
    }

    trimmed
        .split(SEGMENT_SEPARATOR)
        .filter(|segment| !segment.contains(ABSENCE_MARKER))
        .filter_map(parse_segment)
        .collect()
}

/// Parses one segment, `None` when either number is unreadable or the
/// weight is not positive.
pub fn parse_segment(segment: &str) -> Option<GradeEntry> {
    let (grade_part, weight_part) = match segment.rsplit_once('(') {
        Some((grade, weight)) => (grade, weight.trim_end().trim_end_matches(')')),
        None => (segment, "1.0"),
    };

    let grade = normalize_number(grade_part);
    let weight = normalize_number(weight_part);

    let grade = if grade == ALIAS_TOKEN { "1".to_string() } else { grade };

    let score = grade.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let weight = weight.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)?;
    Some(GradeEntry::new(score, weight))
}

fn normalize_number(part: &str) -> String {
    part.replace(',', ".").trim().to_string()
}

/// Canonical text of an entry, readable again by [`parse_segment`].
pub fn format_segment(entry: &GradeEntry) -> String {
    format!("{}({})", entry.score, entry.weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_segments_with_decimal_comma() {
        let entries = parse_grade_cell("12,5(0.6) - 15(0.4)");
        assert_eq!(entries, vec![GradeEntry::new(12.5, 0.6), GradeEntry::new(15.0, 0.4)]);
    }

    #[test]
    fn test_absence_segment_dropped_and_default_weight() {
        let entries = parse_grade_cell("Absent au devoir - 10");
        assert_eq!(entries, vec![GradeEntry::new(10.0, 1.0)]);
    }

    #[test]
    fn test_alias_token_maps_to_one() {
        assert_eq!(parse_grade_cell("CCHM"), vec![GradeEntry::new(1.0, 1.0)]);
        assert_eq!(parse_grade_cell("CCHM(2)"), vec![GradeEntry::new(1.0, 2.0)]);
    }

    #[test]
    fn test_empty_and_subheader_cells() {
        assert!(parse_grade_cell("").is_empty());
        assert!(parse_grade_cell("   \t").is_empty());
        assert!(parse_grade_cell("Note").is_empty());
    }

    #[test]
    fn test_unparseable_segments_are_skipped() {
        assert!(parse_grade_cell("abc - n/a(2)").is_empty());
        assert_eq!(
            parse_grade_cell("abc - 14(2) - 9(x)"),
            vec![GradeEntry::new(14.0, 2.0)]
        );
    }

    #[test]
    fn test_weight_with_comma_and_spaces() {
        assert_eq!(
            parse_grade_cell(" 8 ( 0,5 ) "),
            vec![GradeEntry::new(8.0, 0.5)]
        );
    }

    #[test]
    fn test_non_positive_weights_are_skipped() {
        assert_eq!(parse_grade_cell("15(-1) - 10(2)"), vec![GradeEntry::new(10.0, 2.0)]);
        assert!(parse_grade_cell("12(0) - 8(0,0)").is_empty());
        assert_eq!(parse_segment("14(-0.5)"), None);
    }

    #[test]
    fn test_numeric_cell_text() {
        assert_eq!(parse_grade_cell("13.75"), vec![GradeEntry::new(13.75, 1.0)]);
    }

    #[test]
    fn test_format_segment_reparses() {
        let entry = GradeEntry::new(12.5, 0.6);
        assert_eq!(parse_segment(&format_segment(&entry)), Some(entry));
    }
}
