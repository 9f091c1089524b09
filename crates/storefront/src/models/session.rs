//! What the storefront keeps in a session besides the cart.

use serde::{Deserialize, Serialize};

use perkshop_core::{Email, UserId};

/// Session key for the signed-in [`CurrentUser`].
pub const CURRENT_USER_KEY: &str = "current_user";

/// Session key for the name of the session's cart broadcast channel.
pub const CART_CHANNEL_KEY: &str = "cart_channel";

/// The signed-in employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
}

impl CurrentUser {
    /// Name for greetings, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.full_name.trim() {
            "" => self.email.as_str(),
            name => name,
        }
    }
}
