use crate::domain::models::{Review, User};
use crate::error::Result;
use crate::repository::{ReviewRepository, SaveUserResult, UserRepository};

use super::form::{empty_to_none, filter_registration_number, fits_field, is_complete_registration_number};
use super::state::StateHolder;
use super::tasks::{BackgroundTasks, TaskHandle};

const REVIEWS: &str = "profile-reviews";

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileState {
    /// The account as stored.
    pub user: User,
    pub registration_number: String,
    pub name: String,
    pub course: Option<String>,
    pub email: String,
    pub password: String,
    pub profile_picture: Option<Vec<u8>>,
    pub invalid_registration_number: bool,
    pub invalid_name: bool,
    pub invalid_email: bool,
    pub invalid_password: bool,
    pub registration_number_already_in_use: bool,
    pub email_already_in_use: bool,
    pub reviews: Vec<Review>,
    pub is_reviews_loading: bool,
    pub deleted: bool,
}

impl ProfileState {
    fn for_user(user: User) -> Self {
        Self {
            registration_number: user.registration_number.clone(),
            name: user.name.clone(),
            course: user.course.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            profile_picture: user.profile_picture.clone(),
            user,
            invalid_registration_number: false,
            invalid_name: false,
            invalid_email: false,
            invalid_password: false,
            registration_number_already_in_use: false,
            email_already_in_use: false,
            reviews: Vec::new(),
            is_reviews_loading: true,
            deleted: false,
        }
    }

    fn edited_user(&self) -> User {
        User {
            registration_number: self.registration_number.clone(),
            name: self.name.clone(),
            course: self.course.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            profile_picture: self.profile_picture.clone(),
            is_administrator: self.user.is_administrator,
        }
    }
}

/// The signed-in user's own account page.
pub struct ProfileViewModel {
    state: StateHolder<ProfileState>,
    tasks: BackgroundTasks,
    user_repository: UserRepository,
    review_repository: ReviewRepository,
}

impl ProfileViewModel {
    pub fn new(user: User, user_repository: UserRepository, review_repository: ReviewRepository) -> Self {
        Self {
            state: StateHolder::new(ProfileState::for_user(user)),
            tasks: BackgroundTasks::new(),
            user_repository,
            review_repository,
        }
    }

    pub fn state(&self) -> &StateHolder<ProfileState> {
        &self.state
    }

    /// Loads the reviews written by the user, most recent first.
    pub fn load_reviews(&self) -> TaskHandle<()> {
        let ticket = self.tasks.ticket(REVIEWS);
        self.state.update(|s| ProfileState {
            is_reviews_loading: true,
            ..s.clone()
        });

        let state = self.state.clone();
        let review_repository = self.review_repository.clone();
        let registration_number = self.state.snapshot().user.registration_number;
        self.tasks.spawn(ticket, |ticket| async move {
            let loaded = review_repository.get_user_reviews(&registration_number).await;
            let reviews = match loaded {
                Ok(reviews) => reviews.into_iter().rev().collect::<Vec<_>>(),
                Err(e) => {
                    state.update_if_current(&ticket, |s| ProfileState {
                        is_reviews_loading: false,
                        ..s.clone()
                    });
                    return Err(e);
                }
            };
            state.update_if_current(&ticket, |s| ProfileState {
                reviews: reviews.clone(),
                is_reviews_loading: false,
                ..s.clone()
            });
            Ok(())
        })
    }

    pub fn update_registration_number(&self, input: &str) {
        let Some(registration_number) = filter_registration_number(input) else {
            return;
        };
        self.state.update(|s| ProfileState {
            registration_number,
            invalid_registration_number: false,
            registration_number_already_in_use: false,
            ..s.clone()
        });
    }

    pub fn update_name(&self, name: &str) {
        if fits_field(name) {
            self.state.update(|s| ProfileState {
                name: name.to_string(),
                invalid_name: false,
                ..s.clone()
            });
        }
    }

    pub fn update_course(&self, course: &str) {
        if fits_field(course) {
            self.state.update(|s| ProfileState {
                course: empty_to_none(course),
                ..s.clone()
            });
        }
    }

    pub fn update_email(&self, email: &str) {
        if fits_field(email) {
            self.state.update(|s| ProfileState {
                email: email.to_string(),
                invalid_email: false,
                email_already_in_use: false,
                ..s.clone()
            });
        }
    }

    pub fn update_password(&self, password: &str) {
        if fits_field(password) {
            self.state.update(|s| ProfileState {
                password: password.to_string(),
                invalid_password: false,
                ..s.clone()
            });
        }
    }

    pub fn update_profile_picture(&self, picture: Option<Vec<u8>>) {
        self.state.update(|s| ProfileState {
            profile_picture: picture.clone(),
            ..s.clone()
        });
    }

    /// Puts the stored values back into the form.
    pub fn discard_changes(&self) {
        self.state.update(|s| ProfileState {
            reviews: s.reviews.clone(),
            is_reviews_loading: s.is_reviews_loading,
            ..ProfileState::for_user(s.user.clone())
        });
    }

    /// Validates and stores the edited account. Returns `None` when
    /// validation failed.
    pub async fn save(&self) -> Result<Option<SaveUserResult>> {
        self.state.update(|s| ProfileState {
            invalid_registration_number: !is_complete_registration_number(&s.registration_number),
            invalid_name: s.name.is_empty(),
            invalid_email: s.email.is_empty(),
            invalid_password: s.password.is_empty(),
            ..s.clone()
        });

        let form = self.state.snapshot();
        if form.invalid_registration_number
            || form.invalid_name
            || form.invalid_email
            || form.invalid_password
        {
            return Ok(None);
        }

        let edited = form.edited_user();
        let result = self
            .user_repository
            .update(&form.user.registration_number, &edited)
            .await?;

        self.state.update(|s| {
            let mut next = ProfileState {
                registration_number_already_in_use: result.registration_number_conflict(),
                email_already_in_use: result.email_conflict(),
                ..s.clone()
            };
            if result == SaveUserResult::Success {
                next.user = edited.clone();
            }
            next
        });

        // Stored reviews follow the new number through the foreign key
        if result == SaveUserResult::Success
            && edited.registration_number != form.user.registration_number
        {
            self.load_reviews().wait().await?;
        }
        Ok(Some(result))
    }

    /// Removes the account together with its reviews and reports.
    pub async fn delete_account(&self) -> Result<()> {
        self.tasks.cancel_all();
        let registration_number = self.state.snapshot().user.registration_number;
        self.user_repository.delete(&registration_number).await?;

        self.state.update(|s| ProfileState {
            reviews: Vec::new(),
            is_reviews_loading: false,
            deleted: true,
            ..s.clone()
        });
        Ok(())
    }
}
