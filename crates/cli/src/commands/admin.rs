//! Admin user management command.
//!
//! # Usage
//!
//! ```bash
//! perkshop admin create -e admin@example.com -n "Admin Name" -p 'long password'
//! ```
//!
//! An existing profile with the same email is promoted to admin, reactivated
//! and given the new password.

use perkshop_admin::services::AdminAuthService;
use perkshop_core::UserId;

use super::{CommandError, connect};

/// Create or promote an admin.
///
/// # Errors
///
/// Returns an error for an invalid email, a short password, or a database
/// failure.
pub async fn create(email: &str, name: &str, password: &str) -> Result<UserId, CommandError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::Invalid("name must not be blank".to_string()));
    }

    let pool = connect().await?;
    tracing::info!("Creating admin user: {}", email);

    let user_id = AdminAuthService::new(&pool)
        .create_admin(email, name, password)
        .await?;

    tracing::info!("Admin ready! ID: {}, Email: {}", user_id, email);
    Ok(user_id)
}
