use crate::dao::ReportDao;
use crate::domain::models::{Report, ReportedReview};
use crate::error::Result;

#[derive(Clone)]
pub struct ReportRepository {
    report_dao: ReportDao,
}

impl ReportRepository {
    pub fn new(report_dao: ReportDao) -> Self {
        Self { report_dao }
    }

    pub async fn insert_report(&self, report: &Report) -> Result<()> {
        self.report_dao.insert_report(report).await
    }

    pub async fn get_user_report(
        &self,
        review_id: i64,
        user_registration_number: &str,
    ) -> Result<Option<Report>> {
        self.report_dao
            .get_user_report(review_id, user_registration_number)
            .await
    }

    pub async fn update_report(
        &self,
        review_id: i64,
        user_registration_number: &str,
        new_description: &str,
    ) -> Result<()> {
        self.report_dao
            .update_report(review_id, user_registration_number, new_description)
            .await
    }

    /// Files `report`, replacing the description of an earlier report by the
    /// same user on the same review.
    pub async fn insert_or_update_report(&self, report: &Report) -> Result<()> {
        let existing = self
            .get_user_report(report.review_id, &report.user_registration_number)
            .await?;
        match existing {
            Some(_) => {
                self.update_report(
                    report.review_id,
                    &report.user_registration_number,
                    &report.description,
                )
                .await
            }
            None => self.insert_report(report).await,
        }
    }

    pub async fn get_review_reports(&self, review_id: i64) -> Result<Vec<Report>> {
        self.report_dao.get_review_reports(review_id).await
    }

    pub async fn delete_report(&self, review_id: i64, user_registration_number: &str) -> Result<()> {
        self.report_dao
            .delete_report(review_id, user_registration_number)
            .await
    }

    pub async fn delete_review_reports(&self, review_id: i64) -> Result<u64> {
        self.report_dao.delete_review_reports(review_id).await
    }

    pub async fn get_reported_reviews(&self) -> Result<Vec<ReportedReview>> {
        self.report_dao.get_reported_reviews().await
    }
}
