//! Grade normalization shared by writes and searches.

/// Canonical form of a grade label.
///
/// Lower-cases, trims, removes all whitespace, then strips a leading "grade"
/// token, so "Grade 12", "grade12" and "12" all normalize to "12".
pub fn normalize_grade(grade: &str) -> String {
    let compact: String = grade
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    match compact.strip_prefix("grade") {
        Some(rest) => rest.to_string(),
        None => compact,
    }
}
