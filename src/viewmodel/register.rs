use crate::domain::models::User;
use crate::error::Result;
use crate::repository::{SaveUserResult, UserRepository};

use super::form::{empty_to_none, filter_registration_number, fits_field, is_complete_registration_number};
use super::state::StateHolder;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterState {
    pub registration_number: String,
    pub name: String,
    pub course: Option<String>,
    pub email: String,
    pub password: String,
    pub invalid_registration_number: bool,
    pub invalid_name: bool,
    pub invalid_email: bool,
    pub invalid_password: bool,
    pub registration_number_already_in_use: bool,
    pub email_already_in_use: bool,
    pub registered: bool,
}

impl RegisterState {
    fn has_invalid_field(&self) -> bool {
        self.invalid_registration_number || self.invalid_name || self.invalid_email || self.invalid_password
    }
}

pub struct RegisterViewModel {
    state: StateHolder<RegisterState>,
    user_repository: UserRepository,
}

impl RegisterViewModel {
    pub fn new(user_repository: UserRepository) -> Self {
        Self {
            state: StateHolder::new(RegisterState::default()),
            user_repository,
        }
    }

    pub fn state(&self) -> &StateHolder<RegisterState> {
        &self.state
    }

    /// Non-digits are dropped; input longer than a registration number is ignored.
    pub fn update_registration_number(&self, input: &str) {
        let Some(registration_number) = filter_registration_number(input) else {
            return;
        };
        self.state.update(|s| RegisterState {
            registration_number,
            invalid_registration_number: false,
            registration_number_already_in_use: false,
            ..s.clone()
        });
    }

    pub fn update_name(&self, name: &str) {
        if fits_field(name) {
            self.state.update(|s| RegisterState {
                name: name.to_string(),
                invalid_name: false,
                ..s.clone()
            });
        }
    }

    pub fn update_course(&self, course: &str) {
        if fits_field(course) {
            self.state.update(|s| RegisterState {
                course: empty_to_none(course),
                ..s.clone()
            });
        }
    }

    pub fn update_email(&self, email: &str) {
        if fits_field(email) {
            self.state.update(|s| RegisterState {
                email: email.to_string(),
                invalid_email: false,
                email_already_in_use: false,
                ..s.clone()
            });
        }
    }

    pub fn update_password(&self, password: &str) {
        if fits_field(password) {
            self.state.update(|s| RegisterState {
                password: password.to_string(),
                invalid_password: false,
                ..s.clone()
            });
        }
    }

    /// Validates the form and, when it is complete, tries to create the account.
    ///
    /// Returns `None` when validation failed and no data access happened.
    pub async fn register(&self) -> Result<Option<SaveUserResult>> {
        self.state.update(|s| RegisterState {
            invalid_registration_number: !is_complete_registration_number(&s.registration_number),
            invalid_name: s.name.is_empty(),
            invalid_email: s.email.is_empty(),
            invalid_password: s.password.is_empty(),
            ..s.clone()
        });

        let form = self.state.snapshot();
        if form.has_invalid_field() {
            return Ok(None);
        }

        let user = User::new(
            form.registration_number,
            form.name,
            form.course,
            form.email,
            form.password,
        );
        let result = self.user_repository.save(&user).await?;

        self.state.update(|s| RegisterState {
            registration_number_already_in_use: result.registration_number_conflict(),
            email_already_in_use: result.email_conflict(),
            registered: result == SaveUserResult::Success,
            ..s.clone()
        });
        Ok(Some(result))
    }
}
