//! Profile queries.

use sqlx::{PgConnection, PgPool};

use perkshop_core::{Email, UserId};

use super::RepositoryError;
use crate::models::profile::non_empty;
use crate::models::{Profile, ShippingAddress};

pub(crate) const PROFILE_COLUMNS: &str = "id, email, full_name, role, is_active, password_hash, \
     address_line1, address_line2, city, state, postal_code, country, phone, \
     created_at, updated_at";

/// Repository for profile reads and self-service updates.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Profile>, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(profile)
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(profile)
    }

    /// Update name, address and phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    pub async fn update_address(
        &self,
        id: UserId,
        address: &ShippingAddress,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET full_name = $2, address_line1 = $3, address_line2 = $4, city = $5,
                state = $6, postal_code = $7, country = $8, phone = $9, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(address.full_name.trim())
        .bind(non_empty(&address.address_line1))
        .bind(non_empty(&address.address_line2))
        .bind(non_empty(&address.city))
        .bind(non_empty(&address.state))
        .bind(non_empty(&address.postal_code))
        .bind(non_empty(&address.country))
        .bind(non_empty(&address.phone))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Lock a profile row for the rest of the transaction.
pub(crate) async fn lock_profile(
    conn: &mut PgConnection,
    id: UserId,
) -> Result<Option<Profile>, RepositoryError> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(profile)
}

/// Replace a profile's password hash.
pub(crate) async fn set_password_hash(
    conn: &mut PgConnection,
    id: UserId,
    password_hash: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE profiles SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
