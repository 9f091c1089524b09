//! Shipping notices and access approvals.
//!
//! Callers send fire-and-forget; a failed email never undoes the admin
//! action that triggered it.

use askama::Template;
use thiserror::Error;

use perkshop_core::Email;
use perkshop_core::server::{MailError, Mailer, SmtpConfig};
use perkshop_core::tracking::TrackingLink;

/// Shipping notice details.
#[derive(Debug, Clone)]
pub struct ShippedEmail {
    pub short_id: String,
    pub employee_name: String,
    pub employee_email: Email,
    pub tracking: Option<TrackingLink>,
    pub order_url: String,
}

/// HTML template for the shipping notice.
#[derive(Template)]
#[template(path = "email/order_shipped.html")]
struct OrderShippedHtml<'a> {
    order: &'a ShippedEmail,
}

/// Plain text template for the shipping notice.
#[derive(Template)]
#[template(path = "email/order_shipped.txt")]
struct OrderShippedText<'a> {
    order: &'a ShippedEmail,
}

/// HTML template for the access approval email.
#[derive(Template)]
#[template(path = "email/access_approved.html")]
struct AccessApprovedHtml<'a> {
    name: &'a str,
    set_password_url: &'a str,
}

/// Plain text template for the access approval email.
#[derive(Template)]
#[template(path = "email/access_approved.txt")]
struct AccessApprovedText<'a> {
    name: &'a str,
    set_password_url: &'a str,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Renders admin-triggered emails and hands them to the mailer.
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

    /// Tell an employee their order has shipped.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_shipped(&self, order: &ShippedEmail) -> Result<(), EmailError> {
        let subject = format!("Your PerkShop order #{} has shipped", order.short_id);
        self.mailer
            .send(
                &order.employee_email,
                &subject,
                OrderShippedText { order }.render()?,
                OrderShippedHtml { order }.render()?,
            )
            .await?;
        Ok(())
    }

    /// Welcome an approved requester with a link to choose a password.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_access_approved(
        &self,
        to: &Email,
        name: &str,
        set_password_url: &str,
    ) -> Result<(), EmailError> {
        let text = AccessApprovedText {
            name,
            set_password_url,
        }
        .render()?;
        let html = AccessApprovedHtml {
            name,
            set_password_url,
        }
        .render()?;

        self.mailer
            .send(to, "Welcome to PerkShop", text, html)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use perkshop_core::tracking::tracking_link;

    use super::*;

    fn shipped(tracking: Option<TrackingLink>) -> ShippedEmail {
        ShippedEmail {
            short_id: "9f8e7d6c".to_string(),
            employee_name: "Ada Lovelace".to_string(),
            employee_email: Email::parse("ada@example.com").unwrap(),
            tracking,
            order_url: "http://localhost:3000/orders/9f8e7d6c".to_string(),
        }
    }

    #[test]
    fn test_shipped_text_includes_tracking_url() {
        let order = shipped(tracking_link("1Z999AA10123456784"));
        let text = OrderShippedText { order: &order }.render().unwrap();
        assert!(text.contains("#9f8e7d6c"));
        assert!(text.contains("UPS 1Z999AA10123456784"));
        assert!(text.contains("https://www.ups.com/track?tracknum=1Z999AA10123456784"));
    }

    #[test]
    fn test_shipped_text_without_tracking() {
        let order = shipped(None);
        let text = OrderShippedText { order: &order }.render().unwrap();
        assert!(!text.contains("Track it"));
        assert!(text.contains("http://localhost:3000/orders/9f8e7d6c"));
    }

    #[test]
    fn test_access_approved_html_links_to_set_password() {
        let html = AccessApprovedHtml {
            name: "Grace",
            set_password_url: "http://localhost:3000/auth/reset-password?token=abc",
        }
        .render()
        .unwrap();
        assert!(html.contains("Hi Grace"));
        assert!(html.contains("reset-password?token=abc"));
    }
}
