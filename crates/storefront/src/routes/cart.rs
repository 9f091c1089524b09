//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation answers with `HX-Trigger: cart-updated` so badges in the
//! same tab refresh, and is broadcast to the session's other tabs, which
//! refresh on the `cart-synced` server-sent event.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{
        AppendHeaders, IntoResponse, Redirect, Response, Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tower_sessions::Session;
use tracing::instrument;

use perkshop_core::cart::{CART_STORAGE_KEY, EnrichedCart};
use perkshop_core::{ProductId, VariantId};

use super::{Nav, is_htmx};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::cart::{self as session_cart, sync_view};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Header value telling HTMX listeners in this tab to refresh.
const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: String,
}

/// Parse an optional variant ID from a form field; blank means none.
fn parse_variant(raw: &str) -> Result<Option<VariantId>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("invalid variant id: {raw}")))
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: Nav,
    pub cart: EnrichedCart,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: EnrichedCart,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

async fn priced_cart(state: &AppState, session: &Session) -> Result<EnrichedCart> {
    let cart = session_cart::load(session).await?;
    CatalogService::new(state).enrich(&cart).await
}

/// Answer a mutation: a fragment for HTMX, a redirect to the cart otherwise.
async fn mutation_response(state: &AppState, session: &Session, headers: &HeaderMap) -> Result<Response> {
    if !is_htmx(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }
    let cart = priced_cart(state, session).await?;
    Ok((AppendHeaders([CART_UPDATED_TRIGGER]), CartItemsTemplate { cart }).into_response())
}

/// Display cart page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    Ok(CartShowTemplate {
        nav: Nav::new(&state, user.as_ref()),
        cart: priced_cart(&state, &session).await?,
    })
}

/// Add item to cart (HTMX).
///
/// Returns the count badge with an HTMX trigger to update other elements.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let variant_id = parse_variant(&form.variant_id)?;
    let quantity = form.quantity.unwrap_or(1);

    let cart = session_cart::mutate(&session, state.cart_hub(), |store| {
        store.add(form.product_id, variant_id, quantity);
    })
    .await?;

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }
    Ok((
        AppendHeaders([CART_UPDATED_TRIGGER]),
        CartCountTemplate {
            count: cart.count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX). Zero or less removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let variant_id = parse_variant(&form.variant_id)?;
    session_cart::mutate(&session, state.cart_hub(), |store| {
        store.update_quantity(form.product_id, variant_id, form.quantity);
    })
    .await?;
    mutation_response(&state, &session, &headers).await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let variant_id = parse_variant(&form.variant_id)?;
    session_cart::mutate(&session, state.cart_hub(), |store| {
        store.remove(form.product_id, variant_id);
    })
    .await?;
    mutation_response(&state, &session, &headers).await
}

/// Empty the cart (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    session_cart::mutate(&session, state.cart_hub(), |store| store.clear()).await?;
    mutation_response(&state, &session, &headers).await
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse> {
    let cart = session_cart::load(&session).await?;
    Ok(CartCountTemplate {
        count: cart.count(),
    })
}

/// Stream cart changes made in the session's other tabs.
///
/// Each published blob is applied to a local view as a storage event and
/// forwarded as a `cart-synced` event carrying the new item count. The
/// subscription, and the session's channel with it, goes away when the
/// client disconnects and the stream is dropped.
#[instrument(skip(state, session))]
pub async fn events(
    State(state): State<AppState>,
    session: Session,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let channel = session_cart::channel_id(&session).await?;
    let mut subscription = state.cart_hub().subscribe(&channel);

    let stream = async_stream::stream! {
        let mut view = sync_view();
        loop {
            match subscription.recv().await {
                Ok(blob) => {
                    if let Some(cart) = view.apply_storage_event(CART_STORAGE_KEY, Some(&blob)) {
                        yield Ok(Event::default().event("cart-synced").data(cart.count().to_string()));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Cart event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant_blank_is_none() {
        assert_eq!(parse_variant("").unwrap(), None);
        assert_eq!(parse_variant("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_variant_rejects_garbage() {
        assert!(matches!(
            parse_variant("blue"),
            Err(AppError::BadRequest(_))
        ));
        assert!(
            parse_variant("00000000-0000-0000-0000-000000000065")
                .unwrap()
                .is_some()
        );
    }
}
