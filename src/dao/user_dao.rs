use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::domain::models::User;
use crate::error::Result;

#[derive(Clone)]
pub struct UserDao {
    pool: SqlitePool,
}

impl UserDao {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                registration_number, name, course, email, password,
                profile_picture, is_administrator
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.registration_number)
        .bind(&user.name)
        .bind(&user.course)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.profile_picture)
        .bind(user.is_administrator)
        .execute(&self.pool)
        .await?;

        tracing::info!("Registered user {}", user.registration_number);
        Ok(())
    }

    /// Rewrites every column of the row keyed by `old_registration_number`,
    /// including the key itself. The administrator flag is left alone.
    pub async fn update_user(&self, old_registration_number: &str, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET registration_number = ?, name = ?, course = ?, email = ?,
                password = ?, profile_picture = ?
            WHERE registration_number = ?
            "#,
        )
        .bind(&user.registration_number)
        .bind(&user.name)
        .bind(&user.course)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.profile_picture)
        .bind(old_registration_number)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "Updated user {} (now {})",
            old_registration_number,
            user.registration_number
        );
        Ok(())
    }

    pub async fn delete_user(&self, registration_number: &str) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE registration_number = ?")
            .bind(registration_number)
            .execute(&self.pool)
            .await?;

        tracing::info!("Deleted user {}", registration_number);
        Ok(())
    }

    /// Unknown users are not administrators.
    pub async fn is_user_administrator(&self, registration_number: &str) -> Result<bool> {
        let flag = sqlx::query_scalar::<_, bool>(
            "SELECT is_administrator FROM users WHERE registration_number = ?",
        )
        .bind(registration_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(flag.unwrap_or(false))
    }

    /// Returns whether a row was changed.
    pub async fn set_administrator(&self, registration_number: &str, admin: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET is_administrator = ? WHERE registration_number = ?")
                .bind(admin)
                .bind(registration_number)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_user(&self, registration_number: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE registration_number = ?")
            .bind(registration_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_user))
    }

    pub async fn get_user_password(&self, registration_number: &str) -> Result<Option<String>> {
        let password =
            sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE registration_number = ?")
                .bind(registration_number)
                .fetch_optional(&self.pool)
                .await?;

        Ok(password)
    }

    pub async fn is_registration_number_in_use(&self, registration_number: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE registration_number = ?)",
        )
        .bind(registration_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }

    pub async fn is_email_in_use(&self, email: &str) -> Result<bool> {
        let found =
            sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(found != 0)
    }

    /// Same as [`is_email_in_use`](Self::is_email_in_use) but ignores the
    /// row of `registration_number` itself.
    pub async fn is_email_in_use_by_other(
        &self,
        email: &str,
        registration_number: &str,
    ) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND registration_number <> ?)",
        )
        .bind(email)
        .bind(registration_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        registration_number: row.get("registration_number"),
        name: row.get("name"),
        course: row.get("course"),
        email: row.get("email"),
        password: row.get("password"),
        profile_picture: row.get("profile_picture"),
        is_administrator: row.get("is_administrator"),
    }
}
