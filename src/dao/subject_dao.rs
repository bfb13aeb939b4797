use sqlx::SqlitePool;

use super::{row_to_class, row_to_subject, CLASS_SELECT, SUBJECT_SELECT};
use crate::domain::models::{Class, ScoreSummary, Subject};
use crate::error::Result;

#[derive(Clone)]
pub struct SubjectDao {
    pool: SqlitePool,
}

impl SubjectDao {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest semester first, then alphabetical.
    pub async fn get_all_subjects(&self) -> Result<Vec<Subject>> {
        let query = format!("{SUBJECT_SELECT} ORDER BY se.year DESC, se.number DESC, s.name");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(row_to_subject).collect())
    }

    pub async fn get_subject(&self, subject_id: i64) -> Result<Option<Subject>> {
        let query = format!("{SUBJECT_SELECT} WHERE s.id = ?");
        let row = sqlx::query(&query)
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_subject))
    }

    pub async fn get_subject_classes(&self, subject_id: i64) -> Result<Vec<Class>> {
        let query = format!("{CLASS_SELECT} WHERE c.subject_id = ? ORDER BY c.code");
        let rows = sqlx::query(&query)
            .bind(subject_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_class).collect())
    }

    /// Aggregated over the reviews of every class of the subject.
    pub async fn get_subject_score(&self, subject_id: i64) -> Result<ScoreSummary> {
        let (score, review_count) = sqlx::query_as::<_, (Option<f64>, i64)>(
            r#"
            SELECT AVG(r.rating), COUNT(*)
            FROM reviews r
            JOIN classes c ON c.id = r.class_id
            WHERE c.subject_id = ?
            "#,
        )
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ScoreSummary {
            score,
            review_count,
        })
    }
}
