//! Transactional email.
//!
//! Every message goes out as a text and HTML pair rendered from Askama
//! templates. Callers send fire-and-forget: failures are logged and never
//! surface to the employee.

use askama::Template;
use thiserror::Error;

use perkshop_core::server::{MailError, Mailer, SmtpConfig};
use perkshop_core::{Email, Points};

/// One line of an order email.
#[derive(Debug, Clone)]
pub struct OrderEmailLine {
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub total_points: Points,
}

/// Order details shared by the confirmation and admin notification emails.
#[derive(Debug, Clone)]
pub struct OrderEmail {
    pub short_id: String,
    pub employee_name: String,
    pub employee_email: Email,
    pub lines: Vec<OrderEmailLine>,
    pub total_points: Points,
    pub shipping_address: String,
    pub order_url: String,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order: &'a OrderEmail,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order: &'a OrderEmail,
}

#[derive(Template)]
#[template(path = "email/admin_new_order.html")]
struct AdminNewOrderHtml<'a> {
    order: &'a OrderEmail,
}

#[derive(Template)]
#[template(path = "email/admin_new_order.txt")]
struct AdminNewOrderText<'a> {
    order: &'a OrderEmail,
}

#[derive(Template)]
#[template(path = "email/admin_access_request.html")]
struct AccessRequestHtml<'a> {
    full_name: &'a str,
    email: &'a str,
    message: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "email/admin_access_request.txt")]
struct AccessRequestText<'a> {
    full_name: &'a str,
    email: &'a str,
    message: Option<&'a str>,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Renders storefront emails and hands them to the mailer.
#[derive(Clone)]
pub struct EmailService {
    mailer: Mailer,
}

impl EmailService {
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        Ok(Self {
            mailer: Mailer::new(config)?,
        })
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &Email,
        name: &str,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let text = PasswordResetText { name, reset_url }.render()?;
        let html = PasswordResetHtml { name, reset_url }.render()?;
        self.mailer
            .send(to, "Reset your PerkShop password", text, html)
            .await?;
        Ok(())
    }

    /// Send the employee their order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(&self, order: &OrderEmail) -> Result<(), EmailError> {
        let subject = format!("Your PerkShop order #{}", order.short_id);
        self.mailer
            .send(
                &order.employee_email,
                &subject,
                OrderConfirmationText { order }.render()?,
                OrderConfirmationHtml { order }.render()?,
            )
            .await?;
        Ok(())
    }

    /// Notify administrators of a new order.
    ///
    /// # Errors
    ///
    /// Returns the first error; remaining recipients are still attempted.
    pub async fn send_admin_new_order(
        &self,
        admins: &[Email],
        order: &OrderEmail,
    ) -> Result<(), EmailError> {
        let subject = format!(
            "New order #{} from {}",
            order.short_id, order.employee_name
        );
        let text = AdminNewOrderText { order }.render()?;
        let html = AdminNewOrderHtml { order }.render()?;
        self.mailer.send_to_all(admins, &subject, &text, &html).await?;
        Ok(())
    }

    /// Notify administrators of a new access request.
    ///
    /// # Errors
    ///
    /// Returns the first error; remaining recipients are still attempted.
    pub async fn send_admin_access_request(
        &self,
        admins: &[Email],
        full_name: &str,
        email: &Email,
        message: Option<&str>,
    ) -> Result<(), EmailError> {
        let email = email.as_str();
        let text = AccessRequestText {
            full_name,
            email,
            message,
        }
        .render()?;
        let html = AccessRequestHtml {
            full_name,
            email,
            message,
        }
        .render()?;
        let subject = format!("Access request from {full_name}");
        self.mailer.send_to_all(admins, &subject, &text, &html).await?;
        Ok(())
    }
}
