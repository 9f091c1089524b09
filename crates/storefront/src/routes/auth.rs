//! Authentication route handlers.
//!
//! Email and password login against employee profiles, plus the
//! forgot/reset password flow with single-use emailed tokens.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use perkshop_core::Email;

use super::Nav;
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::mock;
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Query parameters for the reset link.
#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

/// Human-readable text for an `?error=` code.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "invalid_reset_link" => "This reset link is invalid or has expired. Request a new one below.",
        "unavailable" => "Sign-in is temporarily unavailable. Please try again shortly.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Human-readable text for a `?success=` code.
fn success_message(code: &str) -> &'static str {
    match code {
        "reset" => "Your password has been updated. Please sign in.",
        "email_sent" => {
            "If an account exists for that email, we've sent a link to reset the password."
        }
        _ => "Done.",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub nav: Nav,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub token: String,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        nav: Nav::new(&state, None),
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().map(success_message),
    }
    .into_response()
}

/// Handle login form submission.
///
/// Without a database any well-formed email signs in as the demo employee.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let Some(pool) = state.pool() else {
        let Ok(email) = Email::parse(&form.email) else {
            return Ok(Redirect::to("/auth/login?error=credentials").into_response());
        };
        set_current_user(&session, &mock::user(email)).await?;
        return Ok(Redirect::to("/").into_response());
    };

    match AuthService::new(pool).login(&form.email, &form.password).await {
        Ok(profile) => {
            let user = CurrentUser {
                id: profile.id,
                email: profile.email,
                full_name: profile.full_name,
            };
            set_current_user(&session, &user).await?;
            tracing::info!(user_id = %user.id, "Employee logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            tracing::info!("Login failed: invalid credentials");
            Ok(Redirect::to("/auth/login?error=credentials").into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            Ok(Redirect::to("/auth/login?error=unavailable").into_response())
        }
    }
}

// =============================================================================
// Logout Route
// =============================================================================

/// Handle logout.
///
/// Destroys the whole session, cart included.
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ForgotPasswordTemplate {
        nav: Nav::new(&state, None),
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().map(success_message),
    }
}

/// Handle forgot password form submission.
///
/// The response is the same whether or not the email belongs to an
/// employee.
#[instrument(skip(state, form))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let sent = Redirect::to("/auth/forgot-password?success=email_sent").into_response();
    let Some(pool) = state.pool() else {
        return sent;
    };

    let (profile, token) = match AuthService::new(pool).start_password_reset(&form.email).await {
        Ok(Some(found)) => found,
        Ok(None) => return sent,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start password reset");
            return sent;
        }
    };

    let Some(email) = state.email().cloned() else {
        tracing::warn!(user_id = %profile.id, "Email disabled, reset link not sent");
        return sent;
    };
    let reset_url = format!(
        "{}/auth/reset-password?token={token}",
        state.config().base_url.trim_end_matches('/')
    );
    tokio::spawn(async move {
        if let Err(e) = email
            .send_password_reset(&profile.email, &profile.full_name, &reset_url)
            .await
        {
            tracing::warn!(error = %e, "Failed to send password reset email");
        }
    });

    sent
}

/// Display the reset password page.
///
/// Unknown, used, or expired tokens go back to the forgot password page.
pub async fn reset_password_page(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
) -> Result<Response> {
    let invalid = Redirect::to("/auth/forgot-password?error=invalid_reset_link").into_response();
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return Ok(invalid);
    };
    if let Some(pool) = state.pool()
        && !AuthService::new(pool).reset_token_is_valid(&token).await?
    {
        return Ok(invalid);
    }

    Ok(ResetPasswordTemplate {
        nav: Nav::new(&state, None),
        error: None,
        token,
    }
    .into_response())
}

/// Handle reset password form submission.
#[instrument(skip(state, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    let retry = |error: String| {
        ResetPasswordTemplate {
            nav: Nav::new(&state, None),
            error: Some(error),
            token: form.token.clone(),
        }
        .into_response()
    };

    if form.password != form.password_confirm {
        return Ok(retry("Passwords do not match.".to_string()));
    }

    let pool = state.db()?;
    match AuthService::new(pool)
        .reset_password(&form.token, &form.password)
        .await
    {
        Ok(_) => Ok(Redirect::to("/auth/login?success=reset").into_response()),
        Err(AuthError::WeakPassword(message)) => Ok(retry(message)),
        Err(AuthError::InvalidToken) => {
            Ok(Redirect::to("/auth/forgot-password?error=invalid_reset_link").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_codes_fall_back() {
        assert_eq!(error_message("credentials"), "Invalid email or password.");
        assert_eq!(error_message("<script>"), "Something went wrong. Please try again.");
        assert_eq!(success_message("whatever"), "Done.");
    }
}
