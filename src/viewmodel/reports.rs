use crate::domain::models::{ReportedReview, User};
use crate::error::{AppError, Result};
use crate::repository::{ReportRepository, ReviewRepository};

use super::state::StateHolder;
use super::tasks::{BackgroundTasks, TaskHandle, Ticket};

const REPORTED: &str = "reported-reviews";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportsState {
    pub reported_reviews: Vec<ReportedReview>,
    pub is_loading: bool,
}

/// Moderation queue. Only administrators can open it.
pub struct ReportsViewModel {
    state: StateHolder<ReportsState>,
    tasks: BackgroundTasks,
    review_repository: ReviewRepository,
    report_repository: ReportRepository,
}

impl ReportsViewModel {
    pub fn new(
        admin: &User,
        review_repository: ReviewRepository,
        report_repository: ReportRepository,
    ) -> Result<Self> {
        if !admin.is_administrator {
            return Err(AppError::NotAuthorized(admin.registration_number.clone()));
        }
        Ok(Self {
            state: StateHolder::new(ReportsState {
                reported_reviews: Vec::new(),
                is_loading: true,
            }),
            tasks: BackgroundTasks::new(),
            review_repository,
            report_repository,
        })
    }

    pub fn state(&self) -> &StateHolder<ReportsState> {
        &self.state
    }

    pub fn load(&self) -> TaskHandle<()> {
        let ticket = self.tasks.ticket(REPORTED);
        self.state.update(|s| ReportsState {
            is_loading: true,
            ..s.clone()
        });
        self.spawn_load(ticket)
    }

    fn spawn_load(&self, ticket: Ticket) -> TaskHandle<()> {
        let state = self.state.clone();
        let repository = self.report_repository.clone();
        self.tasks.spawn(ticket, |ticket| async move {
            let loaded = repository.get_reported_reviews().await;
            state.update_if_current(&ticket, |s| ReportsState {
                reported_reviews: loaded
                    .as_ref()
                    .map(Clone::clone)
                    .unwrap_or_else(|_| s.reported_reviews.clone()),
                is_loading: false,
            });
            loaded.map(|_| ())
        })
    }

    /// Removes the review; its reports go with it.
    pub async fn delete_review(&self, review_id: i64) -> Result<()> {
        self.review_repository.delete_review(review_id).await?;
        tracing::info!("Moderation removed review {}", review_id);
        self.forget(review_id);
        Ok(())
    }

    /// Drops the reports and keeps the review.
    pub async fn dismiss_reports(&self, review_id: i64) -> Result<()> {
        self.report_repository.delete_review_reports(review_id).await?;
        self.forget(review_id);
        Ok(())
    }

    /// Drops `review_id` from the queue. A load in flight may have read it
    /// before the change, so it is superseded in the same update and
    /// started again.
    fn forget(&self, review_id: i64) {
        let mut reload = None;
        self.state.update(|s| {
            if s.is_loading {
                reload = Some(self.tasks.ticket(REPORTED));
            }
            ReportsState {
                reported_reviews: s
                    .reported_reviews
                    .iter()
                    .filter(|reported| reported.review.id != review_id)
                    .cloned()
                    .collect(),
                ..s.clone()
            }
        });

        if let Some(ticket) = reload {
            // Detached; the snapshot is the result
            drop(self.spawn_load(ticket));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{ReportDao, ReviewDao};
    use crate::domain::models::{Report, ReviewTarget};
    use crate::test_utils::fixtures;

    struct Setup {
        reviews: ReviewRepository,
        reports: ReportRepository,
        flagged: i64,
        clean: i64,
    }

    async fn setup() -> Setup {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        for registration_number in ["123456789", "987654321", "555555555"] {
            fixtures::insert_user(&pool, &fixtures::student(registration_number)).await;
        }
        let review_dao = ReviewDao::new(pool.clone());
        let flagged = review_dao
            .insert_review(&fixtures::new_review(
                ReviewTarget::Class(catalog.class_id),
                "123456789",
                1,
            ))
            .await
            .unwrap();
        let clean = review_dao
            .insert_review(&fixtures::new_review(
                ReviewTarget::Teacher(catalog.teacher_id),
                "123456789",
                5,
            ))
            .await
            .unwrap();

        let reports = ReportRepository::new(ReportDao::new(pool));
        for reporter in ["987654321", "555555555"] {
            reports
                .insert_report(&Report {
                    review_id: flagged,
                    user_registration_number: reporter.into(),
                    description: format!("Reported by {reporter}"),
                })
                .await
                .unwrap();
        }

        Setup {
            reviews: ReviewRepository::new(review_dao),
            reports,
            flagged,
            clean,
        }
    }

    #[tokio::test]
    async fn test_students_cannot_moderate() {
        let setup = setup().await;
        let result = ReportsViewModel::new(
            &fixtures::student("987654321"),
            setup.reviews.clone(),
            setup.reports.clone(),
        );
        assert!(matches!(result, Err(AppError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_queue_lists_reported_reviews_with_reports() {
        let setup = setup().await;
        let vm = ReportsViewModel::new(&fixtures::admin("000000001"), setup.reviews, setup.reports)
            .unwrap();
        vm.load().wait().await.unwrap();

        let state = vm.state().snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.reported_reviews.len(), 1);
        assert_eq!(state.reported_reviews[0].review.id, setup.flagged);
        assert_eq!(state.reported_reviews[0].reports.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_review_removes_reports() {
        let setup = setup().await;
        let reviews = setup.reviews.clone();
        let reports = setup.reports.clone();
        let vm = ReportsViewModel::new(&fixtures::admin("000000001"), setup.reviews, setup.reports)
            .unwrap();
        vm.load().wait().await.unwrap();

        vm.delete_review(setup.flagged).await.unwrap();

        assert!(vm.state().snapshot().reported_reviews.is_empty());
        assert!(reviews.get_review(setup.flagged).await.unwrap().is_none());
        assert!(reports.get_review_reports(setup.flagged).await.unwrap().is_empty());
        assert!(reviews.get_review(setup.clean).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dismiss_keeps_review() {
        let setup = setup().await;
        let reviews = setup.reviews.clone();
        let vm = ReportsViewModel::new(&fixtures::admin("000000001"), setup.reviews, setup.reports)
            .unwrap();
        vm.load().wait().await.unwrap();

        vm.dismiss_reports(setup.flagged).await.unwrap();
        assert!(vm.state().snapshot().reported_reviews.is_empty());
        assert!(reviews.get_review(setup.flagged).await.unwrap().is_some());

        vm.load().wait().await.unwrap();
        assert!(vm.state().snapshot().reported_reviews.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_during_load_is_not_undone() {
        for _ in 0..20 {
            let setup = setup().await;
            let vm = ReportsViewModel::new(
                &fixtures::admin("000000001"),
                setup.reviews,
                setup.reports,
            )
            .unwrap();

            let load = vm.load();
            vm.delete_review(setup.flagged).await.unwrap();
            load.wait().await.unwrap();

            let mut receiver = vm.state().subscribe();
            let state = receiver
                .wait_for(|s| !s.is_loading)
                .await
                .unwrap()
                .clone();
            assert!(state
                .reported_reviews
                .iter()
                .all(|reported| reported.review.id != setup.flagged));
        }
    }

    #[tokio::test]
    async fn test_dismiss_during_load_restarts_it() {
        let setup = setup().await;
        let vm = ReportsViewModel::new(&fixtures::admin("000000001"), setup.reviews, setup.reports)
            .unwrap();

        let load = vm.load();
        vm.dismiss_reports(setup.flagged).await.unwrap();

        // The first load either finished before the dismissal or was superseded
        assert!(load.wait().await.is_ok());
        let mut receiver = vm.state().subscribe();
        let state = receiver.wait_for(|s| !s.is_loading).await.unwrap().clone();
        assert!(state.reported_reviews.is_empty());
    }
}
