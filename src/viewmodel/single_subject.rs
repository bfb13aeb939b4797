use crate::domain::models::{Class, Subject};
use crate::error::AppError;
use crate::repository::SubjectRepository;

use super::state::StateHolder;
use super::tasks::{BackgroundTasks, TaskHandle};

const CLASSES: &str = "subject-classes";

#[derive(Debug, Clone, PartialEq)]
pub struct SingleSubjectState {
    pub subject: Subject,
    pub classes: Vec<Class>,
    pub is_classes_loading: bool,
}

/// A subject with the classes offered for it.
pub struct SingleSubjectViewModel {
    state: StateHolder<SingleSubjectState>,
    tasks: BackgroundTasks,
    subject_repository: SubjectRepository,
}

impl SingleSubjectViewModel {
    pub fn new(subject: Subject, subject_repository: SubjectRepository) -> Self {
        Self {
            state: StateHolder::new(SingleSubjectState {
                subject,
                classes: Vec::new(),
                is_classes_loading: true,
            }),
            tasks: BackgroundTasks::new(),
            subject_repository,
        }
    }

    pub fn state(&self) -> &StateHolder<SingleSubjectState> {
        &self.state
    }

    /// Reloads the subject (for its score) and its classes.
    pub fn load(&self) -> TaskHandle<()> {
        let ticket = self.tasks.ticket(CLASSES);
        self.state.update(|s| SingleSubjectState {
            is_classes_loading: true,
            ..s.clone()
        });

        let state = self.state.clone();
        let repository = self.subject_repository.clone();
        let subject_id = self.state.snapshot().subject.id;
        self.tasks.spawn(ticket, |ticket| async move {
            let loaded = async {
                let subject = repository
                    .get_subject(subject_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Subject", subject_id))?;
                let classes = repository.get_subject_classes(subject_id).await?;
                Ok::<_, AppError>((subject, classes))
            }
            .await;

            match loaded {
                Ok((subject, classes)) => {
                    state.update_if_current(&ticket, |_| SingleSubjectState {
                        subject: subject.clone(),
                        classes: classes.clone(),
                        is_classes_loading: false,
                    });
                    Ok(())
                }
                Err(e) => {
                    state.update_if_current(&ticket, |s| SingleSubjectState {
                        is_classes_loading: false,
                        ..s.clone()
                    });
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{ReviewDao, SubjectDao};
    use crate::domain::models::ReviewTarget;
    use crate::test_utils::fixtures;

    #[tokio::test]
    async fn test_load_refreshes_score_and_classes() {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        let repository = SubjectRepository::new(SubjectDao::new(pool.clone()));
        let subject = repository.get_subject(catalog.subject_id).await.unwrap().unwrap();
        assert_eq!(subject.score, None);

        fixtures::insert_user(&pool, &fixtures::student("123456789")).await;
        ReviewDao::new(pool)
            .insert_review(&fixtures::new_review(
                ReviewTarget::Class(catalog.second_class_id),
                "123456789",
                4,
            ))
            .await
            .unwrap();

        let vm = SingleSubjectViewModel::new(subject, repository);
        vm.load().wait().await.unwrap();

        let state = vm.state().snapshot();
        assert!(!state.is_classes_loading);
        assert_eq!(state.subject.score, Some(4.0));
        assert_eq!(state.classes.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_subject_is_reported() {
        let pool = fixtures::setup_test_db().await;
        let catalog = fixtures::insert_sample_catalog(&pool).await;
        let repository = SubjectRepository::new(SubjectDao::new(pool.clone()));
        let subject = repository.get_subject(catalog.subject_id).await.unwrap().unwrap();
        sqlx::query("DELETE FROM subjects").execute(&pool).await.unwrap();

        let vm = SingleSubjectViewModel::new(subject, repository);
        let err = vm.load().wait().await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { entity: "Subject", .. }));
        assert!(!vm.state().snapshot().is_classes_loading);
    }
}
