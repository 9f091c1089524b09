//! Access request review.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
};
use tracing::instrument;

use perkshop_core::AccessRequestId;

use super::{AdminUserView, render};
use crate::db::AccessRequestRepository;
use crate::db::access_requests::Approval;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::AccessRequest;
use crate::services::AdminAuthService;
use crate::state::AppState;

/// Pending requests template.
#[derive(Template)]
#[template(path = "access_requests/index.html")]
pub struct AccessRequestsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub requests: Vec<AccessRequest>,
}

/// Pending access requests.
///
/// GET /access-requests
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let requests = AccessRequestRepository::new(state.db()?)
        .list_pending()
        .await?;

    Ok(render(&AccessRequestsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/access-requests".to_string(),
        requests,
    }))
}

/// Approve a request and invite the requester.
///
/// POST /access-requests/{id}/approve
#[instrument(skip(admin, state))]
pub async fn approve(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<AccessRequestId>,
) -> Result<Redirect> {
    let pool = state.db()?;
    let approval = AccessRequestRepository::new(pool).approve(id, admin.id).await?;

    tracing::info!(
        request_id = %id,
        user_id = %approval.user_id,
        created = approval.created,
        admin_id = %admin.id,
        "Access request approved"
    );

    send_invitation(&state, &approval).await?;

    Ok(Redirect::to("/access-requests"))
}

/// Email a set-password link in the background.
async fn send_invitation(state: &AppState, approval: &Approval) -> Result<()> {
    let (Some(email), Some(pool)) = (state.email().cloned(), state.pool()) else {
        return Ok(());
    };

    let token = AdminAuthService::new(pool)
        .issue_set_password_token(approval.user_id)
        .await?;
    let link = format!(
        "{}/auth/reset-password?token={token}",
        state.config().storefront_base_url.trim_end_matches('/')
    );
    let to = approval.request.email.clone();
    let name = approval.request.full_name.clone();

    tokio::spawn(async move {
        if let Err(e) = email.send_access_approved(&to, &name, &link).await {
            tracing::warn!(error = %e, "Failed to send access approval email");
        }
    });

    Ok(())
}

/// Deny a request.
///
/// POST /access-requests/{id}/deny
#[instrument(skip(admin, state))]
pub async fn deny(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<AccessRequestId>,
) -> Result<Redirect> {
    AccessRequestRepository::new(state.db()?)
        .deny(id, admin.id)
        .await?;
    tracing::info!(request_id = %id, admin_id = %admin.id, "Access request denied");

    Ok(Redirect::to("/access-requests"))
}
