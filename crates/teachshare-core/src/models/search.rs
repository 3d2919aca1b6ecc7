use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::validation::normalize_grade;
use crate::AppError;

/// Which documents a search may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityScope {
    /// Only approved, unreported documents.
    Public,
    /// Every document regardless of moderation state.
    Reviewer,
}

impl FromStr for VisibilityScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(VisibilityScope::Public),
            "reviewer" | "moderator" | "admin" => Ok(VisibilityScope::Reviewer),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid visibility scope: {}",
                s
            ))),
        }
    }
}

/// Normalized document search filter.
///
/// Blank terms are dropped so that they match everything. The grade term is
/// normalized the same way stored grades are, so "Grade 12", "grade12" and
/// "12" are equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub scope: VisibilityScope,
}

fn non_blank(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl SearchFilter {
    pub fn new(
        title: Option<&str>,
        subject: Option<&str>,
        grade: Option<&str>,
        scope: VisibilityScope,
    ) -> Self {
        Self {
            title: non_blank(title),
            subject: non_blank(subject),
            grade: grade.map(normalize_grade).filter(|g| !g.is_empty()),
            scope,
        }
    }

    pub fn public() -> Self {
        Self::new(None, None, None, VisibilityScope::Public)
    }
}
