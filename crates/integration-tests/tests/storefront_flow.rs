//! Storefront flows through the full router in dev mode.
//!
//! Dev mode serves the mock catalog at the default rate of 100 points per
//! dollar: the Insulated Tumbler costs $25.00 (2,500 points) and its Steel
//! variant adds $2.00 (200 points).

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};

use perkshop_core::mock_uuid;
use perkshop_integration_tests::{body_string, location, send, session_cookie, storefront_app};

fn tumbler() -> String {
    mock_uuid(1).to_string()
}

fn black() -> String {
    mock_uuid(101).to_string()
}

fn steel() -> String {
    mock_uuid(102).to_string()
}

fn form_post(uri: &str, body: String, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("HX-Request", "true");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = storefront_app();
    let response = send(&app, get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_without_database() {
    let app = storefront_app();
    let response = send(&app, get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_lists_products_in_points() {
    let app = storefront_app();
    let response = send(&app, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Insulated Tumbler"));
    assert!(html.contains("2,500 points"));
    assert!(html.contains("Logo Hoodie"));
}

#[tokio::test]
async fn test_catalog_search_filters() {
    let app = storefront_app();
    let html = body_string(send(&app, get("/?q=hoodie", None)).await).await;

    assert!(html.contains("Logo Hoodie"));
    assert!(!html.contains("Insulated Tumbler"));
}

#[tokio::test]
async fn test_product_page_and_unknown_product() {
    let app = storefront_app();

    let response = send(&app, get(&format!("/products/{}", tumbler()), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Steel"));

    let missing = send(&app, get(&format!("/products/{}", mock_uuid(999)), None)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_merges_lines_and_prices_them() {
    let app = storefront_app();

    let first = send(
        &app,
        form_post(
            "/cart/add",
            format!("product_id={}&variant_id={}&quantity=2", tumbler(), black()),
            None,
        ),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["hx-trigger"], "cart-updated");
    let cookie = session_cookie(first.headers()).unwrap();
    assert!(body_string(first).await.contains('2'));

    let second = send(
        &app,
        form_post(
            "/cart/add",
            format!("product_id={}&variant_id={}&quantity=1", tumbler(), black()),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);

    let count = body_string(send(&app, get("/cart/count", Some(&cookie))).await).await;
    assert!(count.contains(">3<"));

    let cart = body_string(send(&app, get("/cart", Some(&cookie))).await).await;
    assert!(cart.contains("Total (3 items)"));
    assert!(cart.contains("7,500"));
}

#[tokio::test]
async fn test_variants_are_separate_lines() {
    let app = storefront_app();

    let response = send(
        &app,
        form_post(
            "/cart/add",
            format!("product_id={}&variant_id={}&quantity=1", tumbler(), black()),
            None,
        ),
    )
    .await;
    let cookie = session_cookie(response.headers()).unwrap();

    send(
        &app,
        form_post(
            "/cart/add",
            format!("product_id={}&variant_id={}&quantity=1", tumbler(), steel()),
            Some(&cookie),
        ),
    )
    .await;

    let cart = body_string(send(&app, get("/cart", Some(&cookie))).await).await;
    assert!(cart.contains("Insulated Tumbler (Black)"));
    assert!(cart.contains("Insulated Tumbler (Steel)"));
    assert!(cart.contains("2,700"));
    assert!(cart.contains("5,200"));
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let app = storefront_app();

    let response = send(
        &app,
        form_post(
            "/cart/add",
            format!("product_id={}&variant_id={}&quantity=4", tumbler(), black()),
            None,
        ),
    )
    .await;
    let cookie = session_cookie(response.headers()).unwrap();

    let updated = send(
        &app,
        form_post(
            "/cart/update",
            format!("product_id={}&variant_id={}&quantity=0", tumbler(), black()),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert!(body_string(updated).await.contains("Your cart is empty"));

    let count = body_string(send(&app, get("/cart/count", Some(&cookie))).await).await;
    assert!(!count.contains("badge"));
}

#[tokio::test]
async fn test_unknown_product_shows_as_unavailable() {
    let app = storefront_app();

    let response = send(
        &app,
        form_post(
            "/cart/add",
            format!("product_id={}&quantity=1", mock_uuid(999)),
            None,
        ),
    )
    .await;
    let cookie = session_cookie(response.headers()).unwrap();

    let cart = body_string(send(&app, get("/cart", Some(&cookie))).await).await;
    assert!(cart.contains("Unavailable product"));
    assert!(cart.contains("No longer available"));
}

#[tokio::test]
async fn test_non_htmx_mutation_redirects_to_cart() {
    let app = storefront_app();
    let request = Request::post("/cart/add")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("product_id={}", tumbler())))
        .unwrap();

    let response = send(&app, request).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(response.headers()), Some("/cart"));
}

#[tokio::test]
async fn test_garbage_variant_is_bad_request() {
    let app = storefront_app();
    let response = send(
        &app,
        form_post(
            "/cart/add",
            format!("product_id={}&variant_id=not-a-uuid", tumbler()),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_account_pages_require_login() {
    let app = storefront_app();
    for path in ["/orders", "/points", "/account", "/checkout"] {
        let response = send(&app, get(path, None)).await;
        assert!(response.status().is_redirection(), "{path}");
        assert_eq!(location(response.headers()), Some("/auth/login"), "{path}");
    }
}

#[tokio::test]
async fn test_public_pages_render() {
    let app = storefront_app();
    for path in ["/auth/login", "/auth/forgot-password", "/request-access"] {
        let response = send(&app, get(path, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}
