//! Two cart stores over the same data, kept in step through storage events,
//! then priced against the dev-mode catalog.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};

use perkshop_core::cart::{
    CART_STORAGE_KEY, CartEvent, CartStorage, CartStore, MemoryStorage, UNAVAILABLE_PRODUCT_NAME,
};
use perkshop_core::{Points, ProductId, VariantId, mock_uuid};
use perkshop_storefront::config::StorefrontConfig;
use perkshop_storefront::services::catalog::CatalogService;
use perkshop_storefront::state::AppState;

use perkshop_integration_tests::STOREFRONT_BASE_URL;

fn tumbler() -> ProductId {
    ProductId::from_uuid(mock_uuid(1))
}

fn hoodie() -> ProductId {
    ProductId::from_uuid(mock_uuid(2))
}

fn steel() -> VariantId {
    VariantId::from_uuid(mock_uuid(102))
}

fn xxl() -> VariantId {
    VariantId::from_uuid(mock_uuid(202))
}

/// The blob tab `store` last wrote.
fn blob(store: &CartStore<MemoryStorage>) -> Option<String> {
    store.storage().get_item(CART_STORAGE_KEY)
}

#[test]
fn test_other_tab_sees_every_mutation() {
    let mut writer = CartStore::new(MemoryStorage::new());
    let mut reader = CartStore::new(MemoryStorage::new());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    reader.on_change(move |event| {
        if let CartEvent::Synced(cart) = event {
            sink.lock().unwrap().push(cart.count());
        }
    });

    writer.add(tumbler(), Some(steel()), 2);
    reader.apply_storage_event(CART_STORAGE_KEY, blob(&writer).as_deref());

    writer.add(tumbler(), Some(steel()), 3);
    reader.apply_storage_event(CART_STORAGE_KEY, blob(&writer).as_deref());

    writer.add(hoodie(), Some(xxl()), 1);
    let synced = reader
        .apply_storage_event(CART_STORAGE_KEY, blob(&writer).as_deref())
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![2, 5, 6]);
    assert_eq!(synced, writer.get());
    assert_eq!(synced.items[0].quantity, 5);
}

#[test]
fn test_unrelated_keys_and_removal() {
    let mut reader = CartStore::new(MemoryStorage::new());
    let events = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&events);
    let id = reader.on_change(move |_| *counter.lock().unwrap() += 1);

    assert!(reader.apply_storage_event("theme", Some("dark")).is_none());
    assert_eq!(*events.lock().unwrap(), 0);

    let cleared = reader.apply_storage_event(CART_STORAGE_KEY, None).unwrap();
    assert!(cleared.is_empty());
    assert_eq!(*events.lock().unwrap(), 1);

    assert!(reader.off(id));
    reader.apply_storage_event(CART_STORAGE_KEY, Some("{not json"));
    assert_eq!(*events.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_synced_cart_prices_against_catalog() {
    let state = AppState::new(StorefrontConfig::dev(STOREFRONT_BASE_URL), None).unwrap();

    let mut writer = CartStore::new(MemoryStorage::new());
    writer.add(tumbler(), None, 3);
    writer.add(tumbler(), Some(steel()), 1);
    writer.add(ProductId::from_uuid(mock_uuid(999)), None, 2);

    let mut reader = CartStore::new(MemoryStorage::new());
    let cart = reader
        .apply_storage_event(CART_STORAGE_KEY, blob(&writer).as_deref())
        .unwrap();

    let priced = CatalogService::new(&state).enrich(&cart).await.unwrap();

    assert_eq!(priced.lines[0].unit_points, Points::new(2_500));
    assert_eq!(priced.lines[0].total_points, Points::new(7_500));
    assert_eq!(priced.lines[1].unit_points, Points::new(2_700));
    assert!(!priced.lines[2].available);
    assert_eq!(priced.lines[2].product_name, UNAVAILABLE_PRODUCT_NAME);
    assert_eq!(priced.lines[2].total_points, Points::ZERO);

    assert_eq!(priced.total_points, Points::new(10_200));
    assert_eq!(priced.total_quantity, 6);
    assert!(priced.has_unavailable());
}
