use crate::dao::ReviewDao;
use crate::domain::models::{is_valid_rating, NewReview, Review, ReviewTarget, ScoreSummary};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewInsertionResult {
    Success(Review),
    ReviewAlreadyMade,
}

#[derive(Clone)]
pub struct ReviewRepository {
    review_dao: ReviewDao,
}

impl ReviewRepository {
    pub fn new(review_dao: ReviewDao) -> Self {
        Self { review_dao }
    }

    /// Stores the review unless its author already reviewed the target.
    ///
    /// The lookup runs first; the schema's unique pair catches a racing
    /// insert that slipped past it, and that is reported the same way.
    pub async fn insert_review(&self, review: &NewReview) -> Result<ReviewInsertionResult> {
        if !is_valid_rating(review.rating) {
            return Err(AppError::InvalidRating(review.rating));
        }

        if self
            .review_dao
            .get_user_review(&review.user_registration_number, review.target)
            .await?
            .is_some()
        {
            return Ok(ReviewInsertionResult::ReviewAlreadyMade);
        }

        let Some(id) = self.insert_unique(review).await? else {
            return Ok(ReviewInsertionResult::ReviewAlreadyMade);
        };

        let stored = self
            .review_dao
            .get_review(id)
            .await?
            .ok_or_else(|| AppError::not_found("Review", id))?;
        Ok(ReviewInsertionResult::Success(stored))
    }

    /// Inserts without the lookup. `None` when the unique pair rejected it.
    async fn insert_unique(&self, review: &NewReview) -> Result<Option<i64>> {
        match self.review_dao.insert_review(review).await {
            Ok(id) => Ok(Some(id)),
            Err(e) if e.is_unique_violation() => {
                tracing::warn!(
                    "Concurrent review by {} on {} rejected by constraint",
                    review.user_registration_number,
                    review.target
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Persists the rating and comment of `review`, matched by id.
    pub async fn update_review(&self, review: &Review) -> Result<()> {
        if !is_valid_rating(review.rating) {
            return Err(AppError::InvalidRating(review.rating));
        }
        self.review_dao
            .update_review(review.id, review.rating, &review.comment)
            .await
    }

    pub async fn delete_review(&self, review_id: i64) -> Result<()> {
        self.review_dao.delete_review(review_id).await
    }

    pub async fn get_review(&self, review_id: i64) -> Result<Option<Review>> {
        self.review_dao.get_review(review_id).await
    }

    pub async fn get_reviews(&self, target: ReviewTarget) -> Result<Vec<Review>> {
        self.review_dao.get_reviews(target).await
    }

    pub async fn get_class_reviews(&self, class_id: i64) -> Result<Vec<Review>> {
        self.review_dao.get_class_reviews(class_id).await
    }

    pub async fn get_teacher_reviews(&self, teacher_id: i64) -> Result<Vec<Review>> {
        self.review_dao.get_teacher_reviews(teacher_id).await
    }

    pub async fn get_user_review(
        &self,
        user_registration_number: &str,
        target: ReviewTarget,
    ) -> Result<Option<Review>> {
        self.review_dao
            .get_user_review(user_registration_number, target)
            .await
    }

    pub async fn get_user_reviews(&self, user_registration_number: &str) -> Result<Vec<Review>> {
        self.review_dao.get_user_reviews(user_registration_number).await
    }

    pub async fn get_score(&self, target: ReviewTarget) -> Result<ScoreSummary> {
        self.review_dao.get_score(target).await
    }
}
