//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use perkshop_core::Points;
use perkshop_core::cart::EnrichedCart;

use super::Nav;
use crate::db::{PointsRepository, ProfileRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::mock;
use crate::models::order::short_id;
use crate::models::{CurrentUser, ShippingAddress};
use crate::services::cart as session_cart;
use crate::services::catalog::CatalogService;
use crate::services::checkout::{self, CheckoutError, PlacedOrder};
use crate::services::email::{OrderEmail, OrderEmailLine};
use crate::state::AppState;

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub error: Option<String>,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub nav: Nav,
    pub cart: EnrichedCart,
    pub balance: Points,
    pub remaining: Points,
    pub address: ShippingAddress,
    pub address_complete: bool,
    pub can_place: bool,
    pub error: Option<String>,
}

async fn balance_and_address(
    state: &AppState,
    user: &CurrentUser,
) -> Result<(Points, ShippingAddress)> {
    let Some(pool) = state.pool() else {
        return Ok((mock::MOCK_BALANCE, mock::profile(user).shipping_address()));
    };
    let balance = PointsRepository::new(pool).balance(user.id).await?;
    let profile = ProfileRepository::new(pool)
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("profile no longer exists".to_string()))?;
    Ok((balance, profile.shipping_address()))
}

/// Review the cart, balance and shipping address.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CheckoutQuery>,
) -> Result<impl IntoResponse> {
    let cart = session_cart::load(&session).await?;
    let cart = CatalogService::new(&state).enrich(&cart).await?;
    let (balance, address) = balance_and_address(&state, &user).await?;
    let address_complete = address.is_complete();
    let can_place = !cart.is_empty()
        && checkout::validate_cart(&cart).is_ok()
        && address_complete
        && balance >= cart.total_points;

    Ok(CheckoutTemplate {
        nav: Nav::new(&state, Some(&user)),
        remaining: balance - cart.total_points,
        cart,
        balance,
        address,
        address_complete,
        can_place,
        error: query.error,
    })
}

/// Place the order.
///
/// Failures redirect back to the checkout page with a message. On success
/// the cart is cleared and notifications are sent in the background.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let pool = state.db()?;
    let cart = session_cart::load(&session).await?;

    let placed = match checkout::place_order(pool, state.rate(), user.id, &cart).await {
        Ok(placed) => placed,
        Err(e) => return Ok(checkout_failed(&e)),
    };

    session_cart::mutate(&session, state.cart_hub(), |store| store.clear()).await?;
    add_breadcrumb(
        "checkout",
        "Order placed",
        [("order_id", placed.order.id.to_string())],
    );
    send_order_emails(&state, &placed);

    Ok(Redirect::to(&format!("/orders/{}?placed=1", placed.order.id)).into_response())
}

fn checkout_failed(err: &CheckoutError) -> Response {
    if err.is_internal() {
        let event_id = sentry::capture_error(err);
        tracing::error!(error = %err, sentry_event_id = %event_id, "Checkout failed");
    } else {
        tracing::info!(reason = %err, "Checkout rejected");
    }
    let message = urlencoding::encode(&err.user_message()).into_owned();
    Redirect::to(&format!("/checkout?error={message}")).into_response()
}

/// Confirmation to the employee and a notification to admins, fire-and-forget.
fn send_order_emails(state: &AppState, placed: &PlacedOrder) {
    let Some(email) = state.email().cloned() else {
        tracing::debug!("Email disabled, skipping order notifications");
        return;
    };
    let admins = state.config().admin_notification_emails.clone();
    let order = OrderEmail {
        short_id: short_id(placed.order.id),
        employee_name: placed.shipping.full_name.clone(),
        employee_email: placed.profile.email.clone(),
        lines: placed
            .items
            .iter()
            .map(|item| OrderEmailLine {
                product_name: item.product_name.clone(),
                variant_name: item.variant_name.clone(),
                quantity: item.quantity,
                total_points: item.total_points,
            })
            .collect(),
        total_points: placed.order.total_points,
        shipping_address: placed.shipping.one_line(),
        order_url: format!(
            "{}/orders/{}",
            state.config().base_url.trim_end_matches('/'),
            placed.order.id
        ),
    };

    tokio::spawn(async move {
        if let Err(e) = email.send_order_confirmation(&order).await {
            tracing::warn!(error = %e, "Failed to send order confirmation");
        }
        if !admins.is_empty()
            && let Err(e) = email.send_admin_new_order(&admins, &order).await
        {
            tracing::warn!(error = %e, "Failed to notify admins of new order");
        }
    });
}
