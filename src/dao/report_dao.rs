use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{row_to_review, REVIEW_SELECT};
use crate::domain::models::{Report, ReportedReview};
use crate::error::Result;

#[derive(Clone)]
pub struct ReportDao {
    pool: SqlitePool,
}

impl ReportDao {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_report(&self, report: &Report) -> Result<()> {
        sqlx::query(
            "INSERT INTO reports (review_id, user_registration_number, description) VALUES (?, ?, ?)",
        )
        .bind(report.review_id)
        .bind(&report.user_registration_number)
        .bind(&report.description)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "User {} reported review {}",
            report.user_registration_number,
            report.review_id
        );
        Ok(())
    }

    pub async fn get_user_report(
        &self,
        review_id: i64,
        user_registration_number: &str,
    ) -> Result<Option<Report>> {
        let row = sqlx::query(
            r#"
            SELECT review_id, user_registration_number, description
            FROM reports
            WHERE review_id = ? AND user_registration_number = ?
            "#,
        )
        .bind(review_id)
        .bind(user_registration_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_report))
    }

    pub async fn update_report(
        &self,
        review_id: i64,
        user_registration_number: &str,
        new_description: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE reports SET description = ? WHERE review_id = ? AND user_registration_number = ?",
        )
        .bind(new_description)
        .bind(review_id)
        .bind(user_registration_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_review_reports(&self, review_id: i64) -> Result<Vec<Report>> {
        let rows = sqlx::query(
            r#"
            SELECT review_id, user_registration_number, description
            FROM reports
            WHERE review_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_report).collect())
    }

    pub async fn delete_report(&self, review_id: i64, user_registration_number: &str) -> Result<()> {
        sqlx::query("DELETE FROM reports WHERE review_id = ? AND user_registration_number = ?")
            .bind(review_id)
            .bind(user_registration_number)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Drops every report filed against a review. Returns how many were removed.
    pub async fn delete_review_reports(&self, review_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM reports WHERE review_id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            "Dismissed {} report(s) on review {}",
            result.rows_affected(),
            review_id
        );
        Ok(result.rows_affected())
    }

    /// Every review with at least one report, oldest review first.
    pub async fn get_reported_reviews(&self) -> Result<Vec<ReportedReview>> {
        let query = format!(
            "{REVIEW_SELECT} WHERE r.id IN (SELECT review_id FROM reports) ORDER BY r.id"
        );
        let review_rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let report_rows = sqlx::query(
            "SELECT review_id, user_registration_number, description FROM reports ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_review: HashMap<i64, Vec<Report>> = HashMap::new();
        for report in report_rows.iter().map(row_to_report) {
            by_review.entry(report.review_id).or_default().push(report);
        }

        Ok(review_rows
            .iter()
            .map(row_to_review)
            .map(|review| ReportedReview {
                reports: by_review.remove(&review.id).unwrap_or_default(),
                review,
            })
            .collect())
    }
}

fn row_to_report(row: &SqliteRow) -> Report {
    Report {
        review_id: row.get("review_id"),
        user_registration_number: row.get("user_registration_number"),
        description: row.get("description"),
    }
}
