//! Points grant command.

use perkshop_admin::db::{LedgerRepository, UserRepository};
use perkshop_core::{Email, Points};

use super::{CommandError, connect};

/// Append a ledger entry for the employee with `email`.
///
/// Debits may not take the balance below zero.
///
/// # Errors
///
/// Returns an error for a zero amount, a blank reason, an unknown email, or
/// an overdraft.
pub async fn grant(email: &str, amount: i64, reason: &str) -> Result<Points, CommandError> {
    if amount == 0 {
        return Err(CommandError::Invalid("amount must not be zero".to_string()));
    }
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(CommandError::Invalid("reason must not be blank".to_string()));
    }
    let email = Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let pool = connect().await?;
    let user_id = UserRepository::new(&pool)
        .id_by_email(&email)
        .await?
        .ok_or_else(|| CommandError::Invalid(format!("no profile with email {email}")))?;

    let balance = LedgerRepository::new(&pool)
        .adjust(user_id, Points::new(amount), reason, None)
        .await?;

    tracing::info!(
        "Applied {} points to {}. New balance: {}",
        Points::new(amount),
        email,
        balance
    );
    Ok(balance)
}
