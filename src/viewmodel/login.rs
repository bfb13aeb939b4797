use crate::domain::models::User;
use crate::error::Result;
use crate::repository::{LoginResult, UserRepository};

use super::form::{filter_registration_number, fits_field, is_complete_registration_number};
use super::state::StateHolder;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginState {
    pub registration_number: String,
    pub password: String,
    pub invalid_registration_number: bool,
    pub invalid_password: bool,
    pub user_not_registered: bool,
    pub wrong_password: bool,
    pub signed_in_user: Option<User>,
}

pub struct LoginViewModel {
    state: StateHolder<LoginState>,
    user_repository: UserRepository,
}

impl LoginViewModel {
    pub fn new(user_repository: UserRepository) -> Self {
        Self {
            state: StateHolder::new(LoginState::default()),
            user_repository,
        }
    }

    pub fn state(&self) -> &StateHolder<LoginState> {
        &self.state
    }

    pub fn update_registration_number(&self, input: &str) {
        let Some(registration_number) = filter_registration_number(input) else {
            return;
        };
        self.state.update(|s| LoginState {
            registration_number,
            invalid_registration_number: false,
            user_not_registered: false,
            ..s.clone()
        });
    }

    pub fn update_password(&self, password: &str) {
        if fits_field(password) {
            self.state.update(|s| LoginState {
                password: password.to_string(),
                invalid_password: false,
                wrong_password: false,
                ..s.clone()
            });
        }
    }

    /// Checks the credentials. On success the signed-in user is kept in the
    /// snapshot and returned.
    pub async fn login(&self) -> Result<Option<User>> {
        self.state.update(|s| LoginState {
            invalid_registration_number: !is_complete_registration_number(&s.registration_number),
            invalid_password: s.password.is_empty(),
            ..s.clone()
        });

        let form = self.state.snapshot();
        if form.invalid_registration_number || form.invalid_password {
            return Ok(None);
        }

        let result = self
            .user_repository
            .login(&form.registration_number, &form.password)
            .await?;

        let signed_in_user = match &result {
            LoginResult::Success(user) => {
                tracing::info!("User {} signed in", user.registration_number);
                Some(user.clone())
            }
            _ => None,
        };
        self.state.update(|s| LoginState {
            user_not_registered: result == LoginResult::UserNotRegistered,
            wrong_password: result == LoginResult::WrongPassword,
            signed_in_user: signed_in_user.clone(),
            ..s.clone()
        });
        Ok(signed_in_user)
    }

    pub fn logout(&self) {
        self.state.update(|_| LoginState::default());
    }
}
