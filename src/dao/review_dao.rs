use sqlx::SqlitePool;

use super::{row_to_review, REVIEW_SELECT};
use crate::domain::models::{NewReview, Review, ReviewTarget, ScoreSummary};
use crate::error::Result;

#[derive(Clone)]
pub struct ReviewDao {
    pool: SqlitePool,
}

impl ReviewDao {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the id assigned to the new review.
    pub async fn insert_review(&self, review: &NewReview) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO reviews (user_registration_number, rating, comment, class_id, teacher_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&review.user_registration_number)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.target.class_id())
        .bind(review.target.teacher_id())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(
            "Inserted review {} by {} on {}",
            id,
            review.user_registration_number,
            review.target
        );
        Ok(id)
    }

    /// Only rating and comment are mutable.
    pub async fn update_review(&self, review_id: i64, rating: i64, comment: &str) -> Result<()> {
        sqlx::query("UPDATE reviews SET rating = ?, comment = ? WHERE id = ?")
            .bind(rating)
            .bind(comment)
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Updated review {}", review_id);
        Ok(())
    }

    pub async fn delete_review(&self, review_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Deleted review {}", review_id);
        Ok(())
    }

    pub async fn get_review(&self, review_id: i64) -> Result<Option<Review>> {
        let query = format!("{REVIEW_SELECT} WHERE r.id = ?");
        let row = sqlx::query(&query)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_review))
    }

    /// Insertion order, oldest first.
    pub async fn get_class_reviews(&self, class_id: i64) -> Result<Vec<Review>> {
        self.get_reviews(ReviewTarget::Class(class_id)).await
    }

    /// Insertion order, oldest first.
    pub async fn get_teacher_reviews(&self, teacher_id: i64) -> Result<Vec<Review>> {
        self.get_reviews(ReviewTarget::Teacher(teacher_id)).await
    }

    pub async fn get_reviews(&self, target: ReviewTarget) -> Result<Vec<Review>> {
        let (filter, id) = target_filter(target);
        let query = format!("{REVIEW_SELECT} WHERE {filter} ORDER BY r.id");
        let rows = sqlx::query(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_review).collect())
    }

    pub async fn get_user_review(
        &self,
        user_registration_number: &str,
        target: ReviewTarget,
    ) -> Result<Option<Review>> {
        let (filter, id) = target_filter(target);
        let query = format!("{REVIEW_SELECT} WHERE {filter} AND r.user_registration_number = ?");
        let row = sqlx::query(&query)
            .bind(id)
            .bind(user_registration_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_review))
    }

    /// Every review written by one user, oldest first.
    pub async fn get_user_reviews(&self, user_registration_number: &str) -> Result<Vec<Review>> {
        let query = format!("{REVIEW_SELECT} WHERE r.user_registration_number = ? ORDER BY r.id");
        let rows = sqlx::query(&query)
            .bind(user_registration_number)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_review).collect())
    }

    pub async fn get_score(&self, target: ReviewTarget) -> Result<ScoreSummary> {
        let (filter, id) = target_filter(target);
        let query = format!("SELECT AVG(r.rating), COUNT(*) FROM reviews r WHERE {filter}");
        let (score, review_count) = sqlx::query_as::<_, (Option<f64>, i64)>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(ScoreSummary {
            score,
            review_count,
        })
    }
}

/// Column predicate for a target. Only static column names are spliced into
/// SQL; the id is always bound.
fn target_filter(target: ReviewTarget) -> (&'static str, i64) {
    match target {
        ReviewTarget::Class(id) => ("r.class_id = ?", id),
        ReviewTarget::Teacher(id) => ("r.teacher_id = ?", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    #[tokio::test]
    async fn test_reviews_keep_insertion_order() {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        for registration_number in ["111111111", "222222222", "333333333"] {
            fixtures::insert_user(&pool, &fixtures::student(registration_number)).await;
        }
        let dao = ReviewDao::new(pool);
        let target = ReviewTarget::Class(catalog.class_id);

        for registration_number in ["222222222", "111111111", "333333333"] {
            dao.insert_review(&fixtures::new_review(target, registration_number, 3))
                .await
                .unwrap();
        }

        let authors: Vec<String> = dao
            .get_class_reviews(catalog.class_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.user_registration_number)
            .collect();
        assert_eq!(authors, vec!["222222222", "111111111", "333333333"]);
    }

    #[tokio::test]
    async fn test_targets_are_separate() {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        fixtures::insert_user(&pool, &fixtures::student("123456789")).await;
        let dao = ReviewDao::new(pool);

        // Same id number on both sides must not collide
        dao.insert_review(&fixtures::new_review(
            ReviewTarget::Class(catalog.class_id),
            "123456789",
            2,
        ))
        .await
        .unwrap();
        dao.insert_review(&fixtures::new_review(
            ReviewTarget::Teacher(catalog.teacher_id),
            "123456789",
            5,
        ))
        .await
        .unwrap();

        let class_reviews = dao.get_class_reviews(catalog.class_id).await.unwrap();
        let teacher_reviews = dao.get_teacher_reviews(catalog.teacher_id).await.unwrap();
        assert_eq!(class_reviews.len(), 1);
        assert_eq!(class_reviews[0].target, ReviewTarget::Class(catalog.class_id));
        assert_eq!(teacher_reviews.len(), 1);
        assert_eq!(teacher_reviews[0].rating, 5);
        assert_eq!(dao.get_user_reviews("123456789").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_insert_hits_unique_constraint() {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        fixtures::insert_user(&pool, &fixtures::student("123456789")).await;
        let dao = ReviewDao::new(pool);
        let review = fixtures::new_review(ReviewTarget::Teacher(catalog.teacher_id), "123456789", 4);

        dao.insert_review(&review).await.unwrap();
        let err = dao.insert_review(&review).await.unwrap_err();
        assert!(err.is_unique_violation(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_update_changes_only_rating_and_comment() {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        fixtures::insert_user(&pool, &fixtures::student("123456789")).await;
        let dao = ReviewDao::new(pool);
        let target = ReviewTarget::Class(catalog.class_id);

        let id = dao
            .insert_review(&fixtures::new_review(target, "123456789", 1))
            .await
            .unwrap();
        dao.update_review(id, 4, "Changed my mind").await.unwrap();

        let review = dao.get_review(id).await.unwrap().unwrap();
        assert_eq!(review.rating, 4);
        assert_eq!(review.comment, "Changed my mind");
        assert_eq!(review.target, target);
        assert_eq!(review.user_registration_number, "123456789");

        let found = dao.get_user_review("123456789", target).await.unwrap();
        assert_eq!(found, Some(review));
    }

    #[tokio::test]
    async fn test_rating_check_constraint() {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        fixtures::insert_user(&pool, &fixtures::student("123456789")).await;
        let dao = ReviewDao::new(pool);

        let result = dao
            .insert_review(&fixtures::new_review(
                ReviewTarget::Class(catalog.class_id),
                "123456789",
                9,
            ))
            .await;
        assert!(result.is_err());
    }
}
