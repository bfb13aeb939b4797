use sqlx::SqlitePool;

use super::{row_to_class, row_to_teacher, CLASS_SELECT, TEACHER_SELECT};
use crate::domain::models::{Class, ScoreSummary, Teacher};
use crate::error::Result;

#[derive(Clone)]
pub struct ClassDao {
    pool: SqlitePool,
}

impl ClassDao {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_all_classes(&self) -> Result<Vec<Class>> {
        let query = format!("{CLASS_SELECT} ORDER BY s.name, c.code");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(row_to_class).collect())
    }

    pub async fn get_class(&self, class_id: i64) -> Result<Option<Class>> {
        let query = format!("{CLASS_SELECT} WHERE c.id = ?");
        let row = sqlx::query(&query)
            .bind(class_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_class))
    }

    /// `None` when the class has no teacher assigned or does not exist.
    pub async fn get_class_teacher(&self, class_id: i64) -> Result<Option<Teacher>> {
        let query = format!(
            "{TEACHER_SELECT} WHERE t.id = (SELECT teacher_id FROM classes WHERE id = ?)"
        );
        let row = sqlx::query(&query)
            .bind(class_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_teacher))
    }

    pub async fn get_class_score(&self, class_id: i64) -> Result<ScoreSummary> {
        let (score, review_count) = sqlx::query_as::<_, (Option<f64>, i64)>(
            "SELECT AVG(rating), COUNT(*) FROM reviews WHERE class_id = ?",
        )
        .bind(class_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ScoreSummary {
            score,
            review_count,
        })
    }
}
