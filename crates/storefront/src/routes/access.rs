//! Public "request access" form.
//!
//! People without an account leave their name and email; admins approve or
//! deny from the admin dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use perkshop_core::{AccessRequestId, Email};

use super::Nav;
use crate::db::{AccessRequestRepository, ProfileRepository, RepositoryError};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Longest accepted free-text message.
const MAX_MESSAGE_CHARS: usize = 1000;

/// Access request form data.
#[derive(Debug, Default, Deserialize)]
pub struct AccessRequestForm {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub message: String,
}

/// Query parameters for the confirmation banner.
#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub submitted: Option<String>,
}

/// Request access page template.
#[derive(Template, WebTemplate)]
#[template(path = "access/request.html")]
pub struct AccessRequestTemplate {
    pub nav: Nav,
    pub form: AccessRequestForm,
    pub submitted: bool,
    pub error: Option<String>,
}

/// A validated submission.
#[derive(Debug)]
struct Submission {
    email: Email,
    full_name: String,
    message: Option<String>,
}

fn validate(form: &AccessRequestForm) -> Result<Submission, String> {
    let email = Email::parse(&form.email).map_err(|_| "Enter a valid email address.".to_string())?;
    let full_name = form.full_name.trim();
    if full_name.is_empty() {
        return Err("Enter your name.".to_string());
    }
    let message = form.message.trim();
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(format!(
            "Keep the message under {MAX_MESSAGE_CHARS} characters."
        ));
    }
    Ok(Submission {
        email,
        full_name: full_name.to_string(),
        message: (!message.is_empty()).then(|| message.to_string()),
    })
}

/// Display the request access form.
pub async fn page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<AccessQuery>,
) -> impl IntoResponse {
    AccessRequestTemplate {
        nav: Nav::new(&state, user.as_ref()),
        form: AccessRequestForm::default(),
        submitted: query.submitted.is_some(),
        error: None,
    }
}

/// Store a submission unless it repeats a pending request or belongs to an
/// existing account. Returns the new row's id, or `None` for a repeat.
async fn record(
    pool: &PgPool,
    submission: &Submission,
) -> Result<Option<AccessRequestId>, RepositoryError> {
    let requests = AccessRequestRepository::new(pool);
    if requests.has_pending(&submission.email).await?
        || ProfileRepository::new(pool)
            .get_by_email(&submission.email)
            .await?
            .is_some()
    {
        return Ok(None);
    }

    let id = requests
        .create(
            &submission.email,
            &submission.full_name,
            submission.message.as_deref(),
        )
        .await?;
    Ok(Some(id))
}

/// Record an access request and notify admins.
///
/// Every valid submission gets the same confirmation: repeats, emails that
/// already have an account, dev mode and database failures included.
#[instrument(skip(state, form))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<AccessRequestForm>) -> Response {
    let submission = match validate(&form) {
        Ok(submission) => submission,
        Err(error) => {
            return AccessRequestTemplate {
                nav: Nav::new(&state, None),
                form,
                submitted: false,
                error: Some(error),
            }
            .into_response();
        }
    };

    let confirmed = Redirect::to("/request-access?submitted=1").into_response();
    let Some(pool) = state.pool() else {
        tracing::warn!("Dev mode, access request not stored");
        return confirmed;
    };

    let id = match record(pool, &submission).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            tracing::info!("Duplicate access request ignored");
            return confirmed;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to record access request");
            return confirmed;
        }
    };
    tracing::info!(access_request_id = %id, "Access request created");

    let admins = state.config().admin_notification_emails.clone();
    if let Some(email) = state.email().cloned()
        && !admins.is_empty()
    {
        tokio::spawn(async move {
            if let Err(e) = email
                .send_admin_access_request(
                    &admins,
                    &submission.full_name,
                    &submission.email,
                    submission.message.as_deref(),
                )
                .await
            {
                tracing::warn!(error = %e, "Failed to notify admins of access request");
            }
        });
    }

    confirmed
}
