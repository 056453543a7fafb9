use bulletin_models::GradeEntry;

/// Σ(grade·weight) / Σ(weight) over parallel slices.
///
/// Returns 0.0 when either slice is empty or the weights sum to zero.
pub fn weighted_average(grades: &[f64], weights: &[f64]) -> f64 {
    if grades.is_empty() || weights.is_empty() {
        return 0.0;
    }

    let total_grade: f64 = grades.iter().zip(weights).map(|(g, w)| g * w).sum();
    let total_weight: f64 = weights.iter().sum();

    if total_weight == 0.0 {
        0.0
    } else {
        total_grade / total_weight
    }
}

/// Weighted average of parsed entries.
pub fn entries_average(entries: &[GradeEntry]) -> f64 {
    let grades: Vec<f64> = entries.iter().map(|e| e.score).collect();
    let weights: Vec<f64> = entries.iter().map(|e| e.weight).collect();
    weighted_average(&grades, &weights)
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
