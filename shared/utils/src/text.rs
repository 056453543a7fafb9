//! Text normalisation used for matching names and titles.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Accent-insensitive, case-insensitive form: NFD, combining marks dropped, lowercased.
pub fn normalize_string(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Keeps only word characters, lowercased. Used for column titles and roster names.
pub fn normalize_title(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// File stem derived from a student name.
pub fn file_stem_for(name: &str) -> String {
    let normalized = normalize_string(name.trim());
    let stem: String = normalized
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "apprenant".to_string()
    } else {
        stem
    }
}

/// Minutes as `HHhMM`.
pub fn format_minutes(total_minutes: i64) -> String {
    let total = total_minutes.max(0);
    format!("{:02}h{:02}", total / 60, total % 60)
}

/// Sum of durations in minutes, `None` when there is nothing to sum.
pub fn sum_durations(minutes: &[i64]) -> Option<String> {
    if minutes.is_empty() {
        return None;
    }
    Some(format_minutes(minutes.iter().sum()))
}

/// Current local date as `dd/mm/YYYY`.
pub fn today_string() -> String {
    chrono::Local::now().format("%d/%m/%Y").to_string()
}
