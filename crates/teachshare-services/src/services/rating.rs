use std::sync::Arc;

use teachshare_core::models::RatingAggregate;
use teachshare_core::AppError;
use teachshare_db::RatingRepository;
use uuid::Uuid;

#[derive(Clone)]
pub struct RatingService {
    ratings: Arc<dyn RatingRepository>,
}

impl RatingService {
    pub fn new(ratings: Arc<dyn RatingRepository>) -> Self {
        Self { ratings }
    }

    /// Add one score. Scores are not range-checked.
    #[tracing::instrument(skip(self))]
    pub async fn rate(&self, document_id: Uuid, score: i32) -> Result<RatingAggregate, AppError> {
        let rating = self.ratings.add_rating(document_id, score).await?;
        tracing::debug!(
            times_rated = rating.times_rated,
            average_rating = rating.average_rating,
            "Rating recorded"
        );
        Ok(rating)
    }

    #[tracing::instrument(skip(self))]
    pub async fn rating(&self, document_id: Uuid) -> Result<RatingAggregate, AppError> {
        self.ratings
            .get_by_document(document_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Rating for document {} not found", document_id))
            })
    }
}
