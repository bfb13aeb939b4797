//! Single class / single teacher screen: the entity, its reviews and the
//! review lifecycle of the signed-in user.
//!
//! Mutations hit the database first, then recompute the entity's score, then
//! publish one snapshot carrying both. When a reviews load is still in
//! flight it is replaced by a new one, so a load that read before the
//! mutation cannot hide it.

use crate::domain::models::{Class, NewReview, Report, Review, ReviewTarget, ScoreSummary, Teacher, User};
use crate::error::{AppError, Result};
use crate::repository::{ReportRepository, ReviewInsertionResult, ReviewRepository};

use super::state::StateHolder;
use super::tasks::{BackgroundTasks, TaskHandle};

const REVIEWS: &str = "reviews";

/// Something students can review.
pub trait Reviewable: Clone + Send + Sync + 'static {
    fn review_target(&self) -> ReviewTarget;
    fn apply_score(&mut self, summary: ScoreSummary);
}

impl Reviewable for Class {
    fn review_target(&self) -> ReviewTarget {
        ReviewTarget::Class(self.id)
    }

    fn apply_score(&mut self, summary: ScoreSummary) {
        self.score = summary.score;
        self.review_count = summary.review_count;
    }
}

impl Reviewable for Teacher {
    fn review_target(&self) -> ReviewTarget {
        ReviewTarget::Teacher(self.id)
    }

    fn apply_score(&mut self, summary: ScoreSummary) {
        self.score = summary.score;
        self.review_count = summary.review_count;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewScreenState<E> {
    pub entity: E,
    /// Most recent first.
    pub reviews: Vec<Review>,
    pub is_reviews_loading: bool,
    /// Draft of the review being written.
    pub review_comment: String,
    pub user_already_made_review: bool,
}

impl<E: Reviewable> ReviewScreenState<E> {
    fn with_score(&self, summary: ScoreSummary) -> E {
        let mut entity = self.entity.clone();
        entity.apply_score(summary);
        entity
    }
}

pub struct ReviewScreenViewModel<E> {
    state: StateHolder<ReviewScreenState<E>>,
    tasks: BackgroundTasks,
    viewer: Option<User>,
    review_repository: ReviewRepository,
    report_repository: ReportRepository,
}

pub type SingleClassViewModel = ReviewScreenViewModel<Class>;
pub type SingleTeacherViewModel = ReviewScreenViewModel<Teacher>;

impl<E: Reviewable> ReviewScreenViewModel<E> {
    /// `viewer` is `None` for a guest, who can browse but not write.
    pub fn new(
        entity: E,
        viewer: Option<User>,
        review_repository: ReviewRepository,
        report_repository: ReportRepository,
    ) -> Self {
        Self {
            state: StateHolder::new(ReviewScreenState {
                entity,
                reviews: Vec::new(),
                is_reviews_loading: true,
                review_comment: String::new(),
                user_already_made_review: false,
            }),
            tasks: BackgroundTasks::new(),
            viewer,
            review_repository,
            report_repository,
        }
    }

    pub fn state(&self) -> &StateHolder<ReviewScreenState<E>> {
        &self.state
    }

    pub fn viewer(&self) -> Option<&User> {
        self.viewer.as_ref()
    }

    fn target(&self) -> ReviewTarget {
        self.state.snapshot().entity.review_target()
    }

    /// Loads every review of the entity along with its current score.
    pub fn load_reviews(&self) -> TaskHandle<()> {
        let ticket = self.tasks.ticket(REVIEWS);
        self.state.update(|s| ReviewScreenState {
            is_reviews_loading: true,
            ..s.clone()
        });

        let state = self.state.clone();
        let repository = self.review_repository.clone();
        let target = self.target();
        self.tasks.spawn(ticket, |ticket| async move {
            let loaded = async {
                let reviews = repository.get_reviews(target).await?;
                let summary = repository.get_score(target).await?;
                Ok::<_, AppError>((reviews, summary))
            }
            .await;

            match loaded {
                Ok((reviews, summary)) => {
                    let reviews: Vec<Review> = reviews.into_iter().rev().collect();
                    tracing::debug!("Loaded {} review(s) for {}", reviews.len(), target);
                    state.update_if_current(&ticket, |s| ReviewScreenState {
                        entity: s.with_score(summary),
                        reviews: reviews.clone(),
                        is_reviews_loading: false,
                        ..s.clone()
                    });
                    Ok(())
                }
                Err(e) => {
                    state.update_if_current(&ticket, |s| ReviewScreenState {
                        is_reviews_loading: false,
                        ..s.clone()
                    });
                    Err(e)
                }
            }
        })
    }

    pub fn review_belongs_to_user(&self, review: &Review) -> bool {
        self.viewer
            .as_ref()
            .is_some_and(|user| user.registration_number == review.user_registration_number)
    }

    pub fn update_review_comment(&self, comment: &str) {
        self.state.update(|s| ReviewScreenState {
            review_comment: comment.to_string(),
            user_already_made_review: false,
            ..s.clone()
        });
    }

    pub async fn publish_review(&self, comment: &str, rating: i64) -> Result<ReviewInsertionResult> {
        let user = self.signed_in()?;
        let target = self.target();

        let result = self
            .review_repository
            .insert_review(&NewReview {
                target,
                rating,
                comment: comment.to_string(),
                user_registration_number: user.registration_number.clone(),
            })
            .await?;

        match &result {
            ReviewInsertionResult::ReviewAlreadyMade => {
                self.state.update(|s| ReviewScreenState {
                    user_already_made_review: true,
                    ..s.clone()
                });
            }
            ReviewInsertionResult::Success(review) => {
                tracing::info!("User {} reviewed {}", user.registration_number, target);
                let summary = self.review_repository.get_score(target).await?;
                self.apply(summary, |s| ReviewScreenState {
                    reviews: std::iter::once(review.clone())
                        .chain(s.reviews.iter().cloned())
                        .collect(),
                    review_comment: String::new(),
                    ..s.clone()
                });
            }
        }
        Ok(result)
    }

    /// Changes rating and comment of one of the viewer's reviews. The list
    /// keeps its order; only the entry equal to `old` is replaced.
    pub async fn edit_review(&self, old: &Review, rating: i64, comment: &str) -> Result<Review> {
        self.check_owned(old)?;

        let edited = Review {
            rating,
            comment: comment.to_string(),
            ..old.clone()
        };
        self.review_repository.update_review(&edited).await?;
        let summary = self.review_repository.get_score(old.target).await?;

        self.apply(summary, |s| ReviewScreenState {
            reviews: s
                .reviews
                .iter()
                .map(|r| if r == old { edited.clone() } else { r.clone() })
                .collect(),
            ..s.clone()
        });
        Ok(edited)
    }

    pub async fn delete_review(&self, review: &Review) -> Result<()> {
        self.check_owned(review)?;

        self.review_repository.delete_review(review.id).await?;
        let summary = self.review_repository.get_score(review.target).await?;
        tracing::info!("Deleted review {} on {}", review.id, review.target);

        self.apply(summary, |s| ReviewScreenState {
            reviews: s.reviews.iter().filter(|r| r.id != review.id).cloned().collect(),
            user_already_made_review: false,
            ..s.clone()
        });
        Ok(())
    }

    /// Files a report on `review`, or rewrites the viewer's earlier report on it.
    pub async fn report_review(&self, review: &Review, description: &str) -> Result<()> {
        let user = self.signed_in()?;
        self.report_repository
            .insert_or_update_report(&Report {
                review_id: review.id,
                user_registration_number: user.registration_number.clone(),
                description: description.to_string(),
            })
            .await
    }

    pub async fn withdraw_report(&self, review: &Review) -> Result<()> {
        let user = self.signed_in()?;
        self.report_repository
            .delete_report(review.id, &user.registration_number)
            .await
    }

    /// The viewer's report on `review`, if any. Guests have none.
    pub async fn user_report(&self, review: &Review) -> Result<Option<Report>> {
        match &self.viewer {
            Some(user) => {
                self.report_repository
                    .get_user_report(review.id, &user.registration_number)
                    .await
            }
            None => Ok(None),
        }
    }

    fn signed_in(&self) -> Result<&User> {
        self.viewer.as_ref().ok_or(AppError::NotSignedIn)
    }

    fn check_owned(&self, review: &Review) -> Result<()> {
        let user = self.signed_in()?;
        if review.user_registration_number != user.registration_number {
            return Err(AppError::NotAuthorized(user.registration_number.clone()));
        }
        let expected = self.target();
        if review.target != expected {
            return Err(AppError::TargetMismatch {
                review_id: review.id,
                expected,
            });
        }
        Ok(())
    }

    /// Publishes `patch` together with the new score. If the list is still
    /// loading, that load is superseded by a fresh one.
    fn apply(&self, summary: ScoreSummary, patch: impl FnOnce(&ReviewScreenState<E>) -> ReviewScreenState<E>) {
        let mut reload = false;
        self.state.update(|s| {
            reload = s.is_reviews_loading;
            ReviewScreenState {
                entity: s.with_score(summary),
                ..patch(s)
            }
        });

        if reload {
            // Detached; the snapshot is the result
            drop(self.load_reviews());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{ClassDao, ReportDao, ReviewDao, TeacherDao};
    use crate::test_utils::fixtures::{self, SampleCatalog};
    use sqlx::SqlitePool;

    struct Setup {
        pool: SqlitePool,
        catalog: SampleCatalog,
        reviews: ReviewRepository,
        reports: ReportRepository,
    }

    async fn setup() -> Setup {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        for registration_number in ["123456789", "987654321"] {
            fixtures::insert_user(&pool, &fixtures::student(registration_number)).await;
        }
        Setup {
            reviews: ReviewRepository::new(ReviewDao::new(pool.clone())),
            reports: ReportRepository::new(ReportDao::new(pool.clone())),
            pool,
            catalog,
        }
    }

    impl Setup {
        async fn teacher_screen(&self, viewer: Option<&str>) -> SingleTeacherViewModel {
            let teacher = TeacherDao::new(self.pool.clone())
                .get_teacher(self.catalog.teacher_id)
                .await
                .unwrap()
                .unwrap();
            let vm = ReviewScreenViewModel::new(
                teacher,
                viewer.map(fixtures::student),
                self.reviews.clone(),
                self.reports.clone(),
            );
            vm.load_reviews().wait().await.unwrap();
            vm
        }

        async fn class_screen(&self, viewer: Option<&str>) -> SingleClassViewModel {
            let class = ClassDao::new(self.pool.clone())
                .get_class(self.catalog.class_id)
                .await
                .unwrap()
                .unwrap();
            let vm = ReviewScreenViewModel::new(
                class,
                viewer.map(fixtures::student),
                self.reviews.clone(),
                self.reports.clone(),
            );
            vm.load_reviews().wait().await.unwrap();
            vm
        }
    }

    fn published(result: ReviewInsertionResult) -> Review {
        match result {
            ReviewInsertionResult::Success(review) => review,
            other => panic!("expected a stored review, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_teacher_review_rated_then_edited() {
        let setup = setup().await;
        let vm = setup.teacher_screen(Some("123456789")).await;

        let review = published(vm.publish_review("Great", 5).await.unwrap());
        vm.edit_review(&review, 3, "Fine").await.unwrap();

        let state = vm.state().snapshot();
        assert_eq!(state.entity.score, Some(3.0));
        assert_eq!(state.entity.review_count, 1);
        assert_eq!(state.reviews.len(), 1);
        assert_eq!(state.reviews[0].comment, "Fine");
    }

    #[tokio::test]
    async fn test_two_users_rate_a_class() {
        let setup = setup().await;
        let first = setup.class_screen(Some("123456789")).await;
        let second = setup.class_screen(Some("987654321")).await;

        published(first.publish_review("", 4).await.unwrap());
        published(second.publish_review("", 2).await.unwrap());

        let class = second.state().snapshot().entity;
        assert_eq!(class.score, Some(3.0));
        assert_eq!(class.review_count, 2);
    }

    #[tokio::test]
    async fn test_publish_prepends_and_clears_draft() {
        let setup = setup().await;
        setup
            .reviews
            .insert_review(&fixtures::new_review(
                ReviewTarget::Class(setup.catalog.class_id),
                "987654321",
                2,
            ))
            .await
            .unwrap();
        let vm = setup.class_screen(Some("123456789")).await;

        vm.update_review_comment("Loved it");
        let review = published(vm.publish_review("Loved it", 4).await.unwrap());

        let state = vm.state().snapshot();
        assert_eq!(state.reviews.first(), Some(&review));
        assert_eq!(state.reviews.len(), 2);
        assert_eq!(state.review_comment, "");
        assert_eq!(state.entity.score, Some(3.0));
    }

    #[tokio::test]
    async fn test_duplicate_review_sets_flag_until_draft_changes() {
        let setup = setup().await;
        let vm = setup.teacher_screen(Some("123456789")).await;
        published(vm.publish_review("First", 5).await.unwrap());
        let before = vm.state().snapshot();

        assert_eq!(
            vm.publish_review("Second", 1).await.unwrap(),
            ReviewInsertionResult::ReviewAlreadyMade
        );
        let after = vm.state().snapshot();
        assert!(after.user_already_made_review);
        assert_eq!(after.reviews, before.reviews);
        assert_eq!(after.entity, before.entity);

        vm.update_review_comment("Second, reworded");
        assert!(!vm.state().snapshot().user_already_made_review);
    }

    #[tokio::test]
    async fn test_edit_keeps_order_and_other_reviews() {
        let setup = setup().await;
        let other_vm = setup.class_screen(Some("987654321")).await;
        let other = published(other_vm.publish_review("Other", 1).await.unwrap());

        let vm = setup.class_screen(Some("123456789")).await;
        let mine = published(vm.publish_review("Mine", 5).await.unwrap());
        let edited = vm.edit_review(&mine, 4, "Mine, edited").await.unwrap();

        let state = vm.state().snapshot();
        assert_eq!(state.reviews, vec![edited, other]);
        assert_eq!(state.entity.score, Some(2.5));
    }

    #[tokio::test]
    async fn test_delete_only_review_resets_score() {
        let setup = setup().await;
        let vm = setup.teacher_screen(Some("123456789")).await;
        let review = published(vm.publish_review("", 5).await.unwrap());
        vm.publish_review("", 4).await.unwrap();
        assert!(vm.state().snapshot().user_already_made_review);

        vm.delete_review(&review).await.unwrap();

        let state = vm.state().snapshot();
        assert!(state.reviews.is_empty());
        assert_eq!(state.entity.score, None);
        assert_eq!(state.entity.review_count, 0);
        assert!(!state.user_already_made_review);
        assert!(matches!(
            vm.publish_review("", 4).await.unwrap(),
            ReviewInsertionResult::Success(_)
        ));
    }

    #[tokio::test]
    async fn test_guests_browse_but_cannot_write() {
        let setup = setup().await;
        let vm = setup.teacher_screen(None).await;

        assert!(vm.state().snapshot().reviews.is_empty());
        assert!(matches!(
            vm.publish_review("", 5).await,
            Err(AppError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_only_the_author_edits() {
        let setup = setup().await;
        let author = setup.teacher_screen(Some("123456789")).await;
        let review = published(author.publish_review("", 5).await.unwrap());

        let other = setup.teacher_screen(Some("987654321")).await;
        assert!(!other.review_belongs_to_user(&review));
        assert!(author.review_belongs_to_user(&review));
        assert!(matches!(
            other.delete_review(&review).await,
            Err(AppError::NotAuthorized(_))
        ));
        assert_eq!(setup.reviews.get_review(review.id).await.unwrap(), Some(review));
    }

    #[tokio::test]
    async fn test_report_lifecycle() {
        let setup = setup().await;
        let author = setup.class_screen(Some("123456789")).await;
        let review = published(author.publish_review("Spam", 1).await.unwrap());

        let reporter = setup.class_screen(Some("987654321")).await;
        reporter.report_review(&review, "Spam").await.unwrap();
        reporter.report_review(&review, "Spam, really").await.unwrap();

        let report = reporter.user_report(&review).await.unwrap().unwrap();
        assert_eq!(report.description, "Spam, really");
        assert_eq!(setup.reports.get_review_reports(review.id).await.unwrap().len(), 1);

        reporter.withdraw_report(&review).await.unwrap();
        assert!(reporter.user_report(&review).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mutation_during_load_reloads_list() {
        let setup = setup().await;
        let teacher = TeacherDao::new(setup.pool.clone())
            .get_teacher(setup.catalog.teacher_id)
            .await
            .unwrap()
            .unwrap();
        let vm = ReviewScreenViewModel::new(
            teacher,
            Some(fixtures::student("123456789")),
            setup.reviews.clone(),
            setup.reports.clone(),
        );
        // No load has completed yet, so the publish reloads
        assert!(vm.state().snapshot().is_reviews_loading);

        let mut receiver = vm.state().subscribe();
        let review = published(vm.publish_review("", 5).await.unwrap());
        receiver.wait_for(|s| !s.is_reviews_loading).await.unwrap();

        assert_eq!(vm.state().snapshot().reviews, vec![review]);
    }
}
