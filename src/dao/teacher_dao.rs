use sqlx::SqlitePool;

use super::{row_to_class, row_to_teacher, CLASS_SELECT, TEACHER_SELECT};
use crate::domain::models::{Class, ScoreSummary, Teacher};
use crate::error::Result;

#[derive(Clone)]
pub struct TeacherDao {
    pool: SqlitePool,
}

impl TeacherDao {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_all_teachers(&self) -> Result<Vec<Teacher>> {
        let query = format!("{TEACHER_SELECT} ORDER BY t.name");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(row_to_teacher).collect())
    }

    pub async fn get_teacher(&self, teacher_id: i64) -> Result<Option<Teacher>> {
        let query = format!("{TEACHER_SELECT} WHERE t.id = ?");
        let row = sqlx::query(&query)
            .bind(teacher_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_teacher))
    }

    pub async fn get_teacher_classes(&self, teacher_id: i64) -> Result<Vec<Class>> {
        let query = format!("{CLASS_SELECT} WHERE c.teacher_id = ? ORDER BY se.year, se.number, s.name");
        let rows = sqlx::query(&query)
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_class).collect())
    }

    pub async fn get_teacher_score(&self, teacher_id: i64) -> Result<ScoreSummary> {
        let (score, review_count) = sqlx::query_as::<_, (Option<f64>, i64)>(
            "SELECT AVG(rating), COUNT(*) FROM reviews WHERE teacher_id = ?",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ScoreSummary {
            score,
            review_count,
        })
    }
}
