//! Employee management: balances, ledger adjustments, roles.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use perkshop_core::{Points, UserId, UserRole};

use super::{AdminUserView, render};
use crate::db::{LedgerRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{LedgerEntry, UserSummary};
use crate::state::AppState;

/// Points adjustment form.
#[derive(Debug, Deserialize)]
pub struct AdjustPointsForm {
    pub amount: String,
    #[serde(default)]
    pub reason: String,
}

/// Role change form.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

/// Flash message carried back to the detail page.
#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    pub error: Option<String>,
}

/// Users list template.
#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub users: Vec<UserSummary>,
}

/// User detail template.
#[derive(Template)]
#[template(path = "users/show.html")]
pub struct UserShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub user: UserSummary,
    pub history: Vec<LedgerEntry>,
    pub is_self: bool,
    pub error: Option<String>,
}

/// A validated adjustment.
#[derive(Debug, PartialEq, Eq)]
struct Adjustment {
    delta: Points,
    reason: String,
}

impl AdjustPointsForm {
    fn validate(&self) -> std::result::Result<Adjustment, String> {
        let amount: i64 = self
            .amount
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| "Amount must be a whole number".to_string())?;
        if amount == 0 {
            return Err("Amount must not be zero".to_string());
        }
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err("A reason is required".to_string());
        }
        Ok(Adjustment {
            delta: Points::new(amount),
            reason: reason.to_string(),
        })
    }
}

fn show_url(id: UserId) -> String {
    format!("/users/{id}")
}

fn show_url_with_error(id: UserId, error: &str) -> String {
    format!("/users/{id}?error={}", urlencoding::encode(error))
}

/// Users list page handler.
///
/// GET /users
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let users = UserRepository::new(state.db()?).list().await?;

    Ok(render(&UsersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/users".to_string(),
        users,
    }))
}

/// User detail page handler.
///
/// GET /users/{id}
#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Query(query): Query<ShowQuery>,
) -> Result<Html<String>> {
    let pool = state.db()?;
    let users = UserRepository::new(pool);
    let ledger = LedgerRepository::new(pool);
    let (user, history) = tokio::join!(users.get(id), ledger.history(id));
    let user = user?.ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    Ok(render(&UserShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/users".to_string(),
        is_self: admin.id == id,
        user,
        history: history?,
        error: query.error,
    }))
}

/// Append a manual ledger entry.
///
/// POST /users/{id}/points
#[instrument(skip(admin, state))]
pub async fn adjust_points(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Form(form): Form<AdjustPointsForm>,
) -> Result<Redirect> {
    let ledger = LedgerRepository::new(state.db()?);
    let adjustment = match form.validate() {
        Ok(adjustment) => adjustment,
        Err(error) => return Ok(Redirect::to(&show_url_with_error(id, &error))),
    };

    match ledger
        .adjust(id, adjustment.delta, &adjustment.reason, Some(admin.id))
        .await
    {
        Ok(balance) => {
            tracing::info!(
                user_id = %id,
                delta = adjustment.delta.value(),
                balance = balance.value(),
                admin_id = %admin.id,
                "Points adjusted"
            );
            Ok(Redirect::to(&show_url(id)))
        }
        Err(RepositoryError::Conflict(msg)) => Ok(Redirect::to(&show_url_with_error(
            id,
            &format!("Cannot debit {}: {msg}", adjustment.delta.abs()),
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Change a user's role.
///
/// POST /users/{id}/role
#[instrument(skip(admin, state))]
pub async fn set_role(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect> {
    let role: UserRole = form
        .role
        .parse()
        .map_err(|_| AppError::BadRequest(format!("unknown role '{}'", form.role)))?;
    if admin.id == id && role != UserRole::Admin {
        return Ok(Redirect::to(&show_url_with_error(
            id,
            "You cannot remove your own admin role",
        )));
    }

    UserRepository::new(state.db()?).set_role(id, role).await?;
    tracing::info!(user_id = %id, %role, admin_id = %admin.id, "Role changed");

    Ok(Redirect::to(&show_url(id)))
}

/// Activate or deactivate a user.
///
/// POST /users/{id}/toggle
#[instrument(skip(admin, state))]
pub async fn toggle_active(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    if admin.id == id {
        return Ok(Redirect::to(&show_url_with_error(
            id,
            "You cannot deactivate your own account",
        )));
    }

    let active = UserRepository::new(state.db()?).toggle_active(id).await?;
    tracing::info!(user_id = %id, active, admin_id = %admin.id, "User toggled");

    Ok(Redirect::to(&show_url(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(amount: &str, reason: &str) -> AdjustPointsForm {
        AdjustPointsForm {
            amount: amount.to_string(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_adjustment_accepts_credits_and_debits() {
        assert_eq!(
            form("1,500", " Quarterly award ").validate(),
            Ok(Adjustment {
                delta: Points::new(1500),
                reason: "Quarterly award".to_string(),
            })
        );
        assert_eq!(
            form("-200", "Correction").validate().map(|a| a.delta),
            Ok(Points::new(-200))
        );
    }

    #[test]
    fn test_adjustment_rejects_zero_and_garbage() {
        assert!(form("0", "Nothing").validate().is_err());
        assert!(form("12.5", "Half").validate().is_err());
        assert!(form("lots", "Why not").validate().is_err());
    }

    #[test]
    fn test_adjustment_requires_reason() {
        assert_eq!(
            form("100", "   ").validate(),
            Err("A reason is required".to_string())
        );
    }
}
