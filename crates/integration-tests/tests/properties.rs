//! Cart, CSV and tracking behaviour checked across many inputs.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use rust_decimal::Decimal;

use perkshop_core::cart::{
    CartStore, CatalogProduct, MemoryStorage, UNAVAILABLE_PRODUCT_NAME, enrich_cart,
};
use perkshop_core::csv::{CsvWriter, escape_field};
use perkshop_core::tracking::{Carrier, tracking_link};
use perkshop_core::{ConversionRate, Points, ProductId, VariantId, mock_uuid};

fn p(n: u128) -> ProductId {
    ProductId::from_uuid(mock_uuid(n))
}

fn v(n: u128) -> Option<VariantId> {
    (n > 0).then(|| VariantId::from_uuid(mock_uuid(100 + n)))
}

#[derive(Debug, Clone)]
enum Op {
    Add(u128, u128, u32),
    Update(u128, u128, i64),
    Remove(u128, u128),
}

fn op() -> impl Strategy<Value = Op> {
    let products = 0u128..4;
    let variants = 0u128..3;
    prop_oneof![
        2 => (products.clone(), variants.clone(), 0u32..5)
            .prop_map(|(product, variant, qty)| Op::Add(product, variant, qty)),
        1 => (products.clone(), variants.clone(), -3i64..4)
            .prop_map(|(product, variant, qty)| Op::Update(product, variant, qty)),
        1 => (products, variants).prop_map(|(product, variant)| Op::Remove(product, variant)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn test_operation_sequences_keep_keys_unique_and_count_exact(
        ops in proptest::collection::vec(op(), 0..60)
    ) {
        let mut store = CartStore::new(MemoryStorage::new());
        let mut model: HashMap<(ProductId, Option<VariantId>), u64> = HashMap::new();

        for step in ops {
            match step {
                Op::Add(product, variant, quantity) => {
                    let key = (p(product), v(variant));
                    store.add(key.0, key.1, quantity);
                    if quantity > 0 {
                        *model.entry(key).or_default() += u64::from(quantity);
                    }
                }
                Op::Update(product, variant, quantity) => {
                    let key = (p(product), v(variant));
                    store.update_quantity(key.0, key.1, quantity);
                    if quantity <= 0 {
                        model.remove(&key);
                    } else if let Some(q) = model.get_mut(&key) {
                        *q = u64::try_from(quantity).unwrap();
                    }
                }
                Op::Remove(product, variant) => {
                    let key = (p(product), v(variant));
                    store.remove(key.0, key.1);
                    model.remove(&key);
                }
            }

            let cart = store.get();
            let keys: HashSet<_> = cart.items.iter().map(|i| i.key()).collect();
            prop_assert_eq!(keys.len(), cart.items.len());
            prop_assert!(cart.items.iter().all(|i| i.quantity >= 1));
            prop_assert_eq!(
                store.count(),
                cart.items.iter().map(|i| u64::from(i.quantity)).sum::<u64>()
            );
            prop_assert_eq!(store.count(), model.values().sum::<u64>());
        }
    }

    /// Neighbouring fields keep the empty string from reading as a blank
    /// line and a leading byte-order mark from being stripped.
    #[test]
    fn test_escaped_fields_reparse_with_standard_parser(value in ".*") {
        let line = format!("start,{},end\n", escape_field(&value));
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        prop_assert_eq!(record.len(), 3);
        prop_assert_eq!(&record[1], value.as_str());
    }

    #[test]
    fn test_fields_with_csv_metacharacters_reparse(
        value in "[a-z\",\r\n ]{0,24}"
    ) {
        let line = format!("start,{},end\n", escape_field(&value));
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(line.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        prop_assert_eq!(&record[1], value.as_str());
    }
}

#[test]
fn test_add_two_then_three_is_one_line_of_five() {
    let mut store = CartStore::new(MemoryStorage::new());
    store.add(p(1), None, 2);
    store.add(p(1), None, 3);

    let cart = store.get();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
}

#[test]
fn test_non_positive_update_removes_line_from_count() {
    for quantity in [0, -1, -50] {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(p(1), None, 2);
        store.add(p(2), v(1), 4);

        store.update_quantity(p(2), v(1), quantity);

        assert_eq!(store.get().items.len(), 1);
        assert_eq!(store.count(), 2);
    }
}

#[test]
fn test_twenty_five_dollars_at_rate_one_hundred() {
    let mut store = CartStore::new(MemoryStorage::new());
    store.add(p(1), None, 3);

    let products = HashMap::from([(
        p(1),
        CatalogProduct {
            id: p(1),
            name: "Insulated Tumbler".to_string(),
            base_price: Decimal::new(2_500, 2),
            image_url: None,
        },
    )]);
    let enriched = enrich_cart(&store.get(), &products, &HashMap::new(), ConversionRate::DEFAULT);

    assert_eq!(enriched.lines[0].unit_points, Points::new(2_500));
    assert_eq!(enriched.total_points, Points::new(7_500));
}

#[test]
fn test_unknown_product_is_zero_points_not_an_error() {
    let mut store = CartStore::new(MemoryStorage::new());
    store.add(p(42), v(1), 2);

    let enriched = enrich_cart(
        &store.get(),
        &HashMap::new(),
        &HashMap::new(),
        ConversionRate::DEFAULT,
    );

    assert_eq!(enriched.lines.len(), 1);
    assert_eq!(enriched.lines[0].product_name, UNAVAILABLE_PRODUCT_NAME);
    assert_eq!(enriched.total_points, Points::ZERO);
    assert_eq!(enriched.total_quantity, 2);
}

#[test]
fn test_document_reparses_with_header_and_empty_fields() {
    let mut writer = CsvWriter::new(&["id", "note", "tracking"]);
    writer.write_row([Some("1"), Some("fragile, \"glass\""), None]);
    writer.write_row([Some("2"), Some("two\nlines"), Some("1Z999AA10123456784")]);
    let document = writer.finish();

    let mut reader = csv::Reader::from_reader(document.as_bytes());
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        ["id", "note", "tracking"]
    );
    let records: Vec<_> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][1], "fragile, \"glass\"");
    assert_eq!(&records[0][2], "");
    assert_eq!(&records[1][1], "two\nlines");
}

#[test]
fn test_header_only_document() {
    let document = CsvWriter::new(&["id", "delta"]).finish();
    assert_eq!(document, "id,delta\n");

    let mut reader = csv::Reader::from_reader(document.as_bytes());
    assert_eq!(reader.headers().unwrap().len(), 2);
    assert_eq!(reader.records().count(), 0);
}

#[test]
fn test_tracking_examples() {
    let ups = tracking_link("1Z999AA10123456784").unwrap();
    assert_eq!(ups.carrier, Carrier::Ups);
    assert_eq!(ups.url, "https://www.ups.com/track?tracknum=1Z999AA10123456784");

    let usps = tracking_link("940123456789012345678").unwrap();
    assert_eq!(usps.carrier, Carrier::Usps);
    assert_eq!(
        usps.url,
        "https://tools.usps.com/go/TrackConfirmAction?tLabels=940123456789012345678"
    );

    let spaced = tracking_link("9401 2345 6789 0123 4567 8").unwrap();
    assert_eq!(spaced.url, usps.url);

    let fedex = tracking_link("123456789012").unwrap();
    assert_eq!(fedex.url, "https://www.fedex.com/fedextrack/?trknbr=123456789012");

    let dhl = tracking_link("1234567890").unwrap();
    assert_eq!(dhl.carrier, Carrier::Dhl);

    let other = tracking_link("not a real number").unwrap();
    assert_eq!(other.carrier, Carrier::Other);
    assert_eq!(other.url, "https://parcelsapp.com/en/tracking/notarealnumber");
}
