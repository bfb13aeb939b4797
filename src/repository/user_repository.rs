use crate::dao::UserDao;
use crate::domain::models::User;
use crate::error::Result;

/// Outcome of registering or editing an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveUserResult {
    Success,
    RegistrationNumberAlreadyInUse,
    EmailAlreadyInUse,
    EmailAndRegistrationNumberInUse,
}

impl SaveUserResult {
    fn from_conflicts(registration_number_in_use: bool, email_in_use: bool) -> Self {
        match (registration_number_in_use, email_in_use) {
            (false, false) => Self::Success,
            (true, false) => Self::RegistrationNumberAlreadyInUse,
            (false, true) => Self::EmailAlreadyInUse,
            (true, true) => Self::EmailAndRegistrationNumberInUse,
        }
    }

    pub fn registration_number_conflict(&self) -> bool {
        matches!(
            self,
            Self::RegistrationNumberAlreadyInUse | Self::EmailAndRegistrationNumberInUse
        )
    }

    pub fn email_conflict(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyInUse | Self::EmailAndRegistrationNumberInUse
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    Success(User),
    UserNotRegistered,
    WrongPassword,
}

#[derive(Clone)]
pub struct UserRepository {
    user_dao: UserDao,
}

impl UserRepository {
    pub fn new(user_dao: UserDao) -> Self {
        Self { user_dao }
    }

    /// Inserts the user unless the registration number or email is taken.
    pub async fn save(&self, user: &User) -> Result<SaveUserResult> {
        let result = self.conflicts(None, user).await?;
        if result != SaveUserResult::Success {
            return Ok(result);
        }
        self.store(None, user).await
    }

    /// Rewrites the account keyed by `old_registration_number`. Conflicts with
    /// the account's own row do not count.
    pub async fn update(&self, old_registration_number: &str, user: &User) -> Result<SaveUserResult> {
        let result = self.conflicts(Some(old_registration_number), user).await?;
        if result != SaveUserResult::Success {
            return Ok(result);
        }
        self.store(Some(old_registration_number), user).await
    }

    async fn conflicts(&self, old_registration_number: Option<&str>, user: &User) -> Result<SaveUserResult> {
        let registration_number_in_use = old_registration_number != Some(user.registration_number.as_str())
            && self
                .user_dao
                .is_registration_number_in_use(&user.registration_number)
                .await?;
        let email_in_use = match old_registration_number {
            Some(old) => self.user_dao.is_email_in_use_by_other(&user.email, old).await?,
            None => self.user_dao.is_email_in_use(&user.email).await?,
        };
        Ok(SaveUserResult::from_conflicts(registration_number_in_use, email_in_use))
    }

    /// Writes without the conflict lookup. A unique violation from an account
    /// stored in between is classified like the lookup would have done.
    async fn store(&self, old_registration_number: Option<&str>, user: &User) -> Result<SaveUserResult> {
        let stored = match old_registration_number {
            Some(old) => self.user_dao.update_user(old, user).await,
            None => self.user_dao.insert_user(user).await,
        };
        match stored {
            Ok(_) => Ok(SaveUserResult::Success),
            Err(e) if e.is_unique_violation() => {
                tracing::warn!(
                    "Concurrent account change for {} rejected by constraint",
                    user.registration_number
                );
                match self.conflicts(old_registration_number, user).await? {
                    SaveUserResult::Success => Err(e),
                    conflict => Ok(conflict),
                }
            }
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, registration_number: &str) -> Result<()> {
        self.user_dao.delete_user(registration_number).await
    }

    pub async fn get_user(&self, registration_number: &str) -> Result<Option<User>> {
        self.user_dao.get_user(registration_number).await
    }

    pub async fn is_administrator(&self, registration_number: &str) -> Result<bool> {
        self.user_dao.is_user_administrator(registration_number).await
    }

    pub async fn set_administrator(&self, registration_number: &str, admin: bool) -> Result<bool> {
        self.user_dao.set_administrator(registration_number, admin).await
    }

    pub async fn login(&self, registration_number: &str, password: &str) -> Result<LoginResult> {
        let stored = match self.user_dao.get_user_password(registration_number).await? {
            Some(stored) => stored,
            None => return Ok(LoginResult::UserNotRegistered),
        };
        if stored != password {
            tracing::debug!("Wrong password for {}", registration_number);
            return Ok(LoginResult::WrongPassword);
        }

        match self.user_dao.get_user(registration_number).await? {
            Some(user) => Ok(LoginResult::Success(user)),
            // Deleted between the two reads
            None => Ok(LoginResult::UserNotRegistered),
        }
    }
}
