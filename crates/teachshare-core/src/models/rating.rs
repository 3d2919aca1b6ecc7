use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Running rating totals for one document.
///
/// Created with zero counts when the document is uploaded and only changed by
/// atomic increments afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub id: Uuid,
    pub document_id: Uuid,
    pub times_rated: i64,
    pub total_rating: i64,
    pub average_rating: f64,
}

impl RatingAggregate {
    pub fn empty(id: Uuid, document_id: Uuid) -> Self {
        Self {
            id,
            document_id,
            times_rated: 0,
            total_rating: 0,
            average_rating: 0.0,
        }
    }

    /// Fold one score into the totals. Mirrors the single-statement SQL update.
    pub fn apply(&mut self, score: i32) {
        self.times_rated += 1;
        self.total_rating += i64::from(score);
        self.average_rating = self.total_rating as f64 / self.times_rated as f64;
    }
}
