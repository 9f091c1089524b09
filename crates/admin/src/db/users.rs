//! Employee management queries.

use sqlx::PgPool;

use perkshop_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::UserSummary;

const SUMMARY_SELECT: &str = r"
    SELECT p.id, p.email, p.full_name, p.role, p.is_active,
           COALESCE(SUM(l.delta), 0)::BIGINT AS balance, p.created_at
    FROM profiles p
    LEFT JOIN points_ledger l ON l.user_id = p.id
";

/// Credentials needed to authenticate an admin.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginProfile {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub password_hash: Option<String>,
}

/// Repository for profiles as seen by admins.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All profiles with balances, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<UserSummary>, RepositoryError> {
        let users = sqlx::query_as::<_, UserSummary>(&format!(
            "{SUMMARY_SELECT} GROUP BY p.id ORDER BY p.full_name, p.email"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }

    /// One profile with its balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<UserSummary>, RepositoryError> {
        let user = sqlx::query_as::<_, UserSummary>(&format!(
            "{SUMMARY_SELECT} WHERE p.id = $1 GROUP BY p.id"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Profile and password hash by email, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_login(&self, email: &Email) -> Result<Option<LoginProfile>, RepositoryError> {
        let profile = sqlx::query_as::<_, LoginProfile>(
            "SELECT id, email, full_name, role, is_active, password_hash FROM profiles WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(profile)
    }

    /// Number of active profiles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_active(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles WHERE is_active")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Change a profile's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(role)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Flip a profile's active flag and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn toggle_active(&self, id: UserId) -> Result<bool, RepositoryError> {
        let row: Option<(bool,)> = sqlx::query_as(
            r"
            UPDATE profiles SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING is_active
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        row.map(|(active,)| active).ok_or(RepositoryError::NotFound)
    }

    /// Create an admin, or promote and reactivate an existing profile, and
    /// set its password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_admin(
        &self,
        email: &Email,
        full_name: &str,
        password_hash: &str,
    ) -> Result<UserId, RepositoryError> {
        let (id,): (UserId,) = sqlx::query_as(
            r"
            INSERT INTO profiles (email, full_name, role, is_active, password_hash)
            VALUES ($1, $2, 'admin', TRUE, $3)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, role = 'admin', is_active = TRUE,
                password_hash = EXCLUDED.password_hash, updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(email)
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Look up a profile ID by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn id_by_email(&self, email: &Email) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(UserId,)> = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }
}
