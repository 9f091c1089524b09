//! Cart store with change notification.

use super::{CART_STORAGE_KEY, Cart, CartStorage};
use crate::{ProductId, VariantId};

/// Notification delivered to cart listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// This store wrote a new cart.
    Updated(Cart),
    /// Another writer changed the shared cart key.
    Synced(Cart),
}

impl CartEvent {
    /// The cart carried by the event.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        match self {
            Self::Updated(cart) | Self::Synced(cart) => cart,
        }
    }
}

/// Handle returned by [`CartStore::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&CartEvent) + Send>;

/// Read-modify-write cart operations over a [`CartStorage`].
///
/// Every mutation reads the stored cart, applies the change, persists the
/// whole cart again and fires [`CartEvent::Updated`]. When the storage
/// refuses the write the change is dropped silently and no event fires.
///
/// ```
/// use perkshop_core::cart::{CartStore, MemoryStorage};
/// use perkshop_core::{ProductId, mock_uuid};
///
/// let p1 = ProductId::from_uuid(mock_uuid(1));
/// let mut store = CartStore::new(MemoryStorage::new());
/// store.add(p1, None, 2);
/// store.add(p1, None, 3);
///
/// let cart = store.get();
/// assert_eq!(cart.items.len(), 1);
/// assert_eq!(cart.items[0].quantity, 5);
/// ```
pub struct CartStore<S> {
    storage: S,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl<S: CartStorage> CartStore<S> {
    pub const fn new(storage: S) -> Self {
        Self {
            storage,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Borrow the underlying storage.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store, returning its storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// The current cart, or an empty cart if nothing valid is stored.
    pub fn get(&self) -> Cart {
        self.storage
            .get_item(CART_STORAGE_KEY)
            .map(|raw| Cart::from_json_lossy(&raw))
            .unwrap_or_default()
    }

    /// Persist `cart` and notify listeners.
    pub fn set(&mut self, cart: Cart) {
        if self
            .storage
            .set_item(CART_STORAGE_KEY, cart.to_json())
            .is_err()
        {
            return;
        }
        self.emit(&CartEvent::Updated(cart));
    }

    /// Add `quantity` of a product, merging into an existing line.
    pub fn add(&mut self, product_id: ProductId, variant_id: Option<VariantId>, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let mut cart = self.get();
        cart.merge(product_id, variant_id, quantity);
        self.set(cart);
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// Setting a quantity on a line that does not exist does not create it.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i64,
    ) {
        let mut cart = self.get();
        cart.set_quantity(product_id, variant_id, quantity);
        self.set(cart);
    }

    /// Remove a line.
    pub fn remove(&mut self, product_id: ProductId, variant_id: Option<VariantId>) {
        let mut cart = self.get();
        cart.remove(product_id, variant_id);
        self.set(cart);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.set(Cart::new());
    }

    /// Sum of quantities across all lines.
    pub fn count(&self) -> u64 {
        self.get().count()
    }

    /// Register a listener for [`CartEvent`]s.
    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CartEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Handle a change made to shared storage by another writer.
    ///
    /// Events for other keys are ignored and return `None`. For the cart key
    /// the new value is parsed (absent or corrupt means empty), listeners get
    /// [`CartEvent::Synced`] and the parsed cart is returned.
    pub fn apply_storage_event(&mut self, key: &str, new_value: Option<&str>) -> Option<Cart> {
        if key != CART_STORAGE_KEY {
            return None;
        }
        let cart = new_value.map(Cart::from_json_lossy).unwrap_or_default();
        self.emit(&CartEvent::Synced(cart.clone()));
        Some(cart)
    }

    fn emit(&mut self, event: &CartEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

impl<S> std::fmt::Debug for CartStore<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage", &self.storage)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::cart::{MemoryStorage, UnavailableStorage};
    use crate::mock_uuid;

    fn p(n: u128) -> ProductId {
        ProductId::from_uuid(mock_uuid(n))
    }

    fn v(n: u128) -> VariantId {
        VariantId::from_uuid(mock_uuid(1000 + n))
    }

    fn recording_store() -> (CartStore<MemoryStorage>, Arc<Mutex<Vec<CartEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut store = CartStore::new(MemoryStorage::new());
        let sink = Arc::clone(&events);
        store.on_change(move |event| sink.lock().unwrap().push(event.clone()));
        (store, events)
    }

    #[test]
    fn test_add_merges_same_key() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(p(1), None, 2);
        store.add(p(1), None, 3);
        let cart = store.get();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
    }

    #[test]
    fn test_add_appends_in_order() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(p(2), None, 1);
        store.add(p(1), Some(v(1)), 1);
        store.add(p(1), None, 1);
        let keys: Vec<_> = store.get().items.iter().map(|i| i.key()).collect();
        assert_eq!(keys, vec![(p(2), None), (p(1), Some(v(1))), (p(1), None)]);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let (mut store, events) = recording_store();
        store.add(p(1), None, 0);
        assert!(store.get().is_empty());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_add_saturates() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(p(1), None, u32::MAX);
        store.add(p(1), None, 10);
        assert_eq!(store.get().items[0].quantity, u32::MAX);
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(p(1), None, 2);
        store.update_quantity(p(1), None, 7);
        assert_eq!(store.count(), 7);
    }

    #[test]
    fn test_update_quantity_non_positive_removes() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(p(1), None, 2);
        store.add(p(2), None, 4);
        store.update_quantity(p(1), None, 0);
        assert!(store.get().find(p(1), None).is_none());
        assert_eq!(store.count(), 4);

        store.update_quantity(p(2), None, -3);
        assert!(store.get().is_empty());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_update_quantity_missing_line_does_not_create() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.update_quantity(p(1), None, 3);
        assert!(store.get().is_empty());
    }

    #[test]
    fn test_remove_only_matching_variant() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(p(1), Some(v(1)), 1);
        store.add(p(1), Some(v(2)), 1);
        store.remove(p(1), Some(v(1)));
        let cart = store.get();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].variant_id, Some(v(2)));
    }

    #[test]
    fn test_clear_empties() {
        let mut store = CartStore::new(MemoryStorage::new());
        store.add(p(1), None, 1);
        store.clear();
        assert!(store.get().is_empty());
        assert_eq!(
            store.storage().get_item(CART_STORAGE_KEY).as_deref(),
            Some(r#"{"items":[]}"#)
        );
    }

    #[test]
    fn test_corrupt_storage_reads_empty() {
        let store = CartStore::new(MemoryStorage::with_item(CART_STORAGE_KEY, "{oops"));
        assert!(store.get().is_empty());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_unavailable_storage_degrades_silently() {
        let events = Arc::new(Mutex::new(0_u32));
        let mut store = CartStore::new(UnavailableStorage);
        let sink = Arc::clone(&events);
        store.on_change(move |_| *sink.lock().unwrap() += 1);
        store.add(p(1), None, 3);
        assert!(store.get().is_empty());
        assert_eq!(*events.lock().unwrap(), 0);
    }

    #[test]
    fn test_every_mutation_fires_updated() {
        let (mut store, events) = recording_store();
        store.add(p(1), None, 1);
        store.update_quantity(p(1), None, 2);
        store.remove(p(1), None);
        store.clear();
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| matches!(e, CartEvent::Updated(_))));
        assert_eq!(events[1].cart().count(), 2);
    }

    #[test]
    fn test_off_stops_notifications() {
        let count = Arc::new(Mutex::new(0_u32));
        let mut store = CartStore::new(MemoryStorage::new());
        let sink = Arc::clone(&count);
        let id = store.on_change(move |_| *sink.lock().unwrap() += 1);
        store.add(p(1), None, 1);
        assert!(store.off(id));
        assert!(!store.off(id));
        store.add(p(1), None, 1);
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_storage_event_for_cart_key_fires_synced() {
        let (mut other_tab, _) = recording_store();
        other_tab.add(p(3), None, 2);
        let raw = other_tab.storage().get_item(CART_STORAGE_KEY).unwrap();

        let (mut store, events) = recording_store();
        let cart = store.apply_storage_event(CART_STORAGE_KEY, Some(&raw)).unwrap();
        assert_eq!(cart.count(), 2);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], CartEvent::Synced(c) if c.count() == 2));
    }

    #[test]
    fn test_storage_event_for_other_key_is_ignored() {
        let (mut store, events) = recording_store();
        assert!(store.apply_storage_event("theme", Some("dark")).is_none());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_storage_event_removal_syncs_empty_cart() {
        let (mut store, events) = recording_store();
        let cart = store.apply_storage_event(CART_STORAGE_KEY, None).unwrap();
        assert!(cart.is_empty());
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_sequence_keeps_keys_unique_and_count_consistent() {
        let mut store = CartStore::new(MemoryStorage::new());
        let products = [p(1), p(2), p(3)];
        let variants = [None, Some(v(1)), Some(v(2))];
        let mut step: u32 = 0;
        for round in 0..60_u32 {
            let product = products[(round % 3) as usize];
            let variant = variants[((round / 3) % 3) as usize];
            match round % 5 {
                0 | 1 => store.add(product, variant, round % 4),
                2 => store.update_quantity(product, variant, i64::from(round % 7) - 2),
                3 => store.remove(product, variant),
                _ => store.add(product, variant, 1),
            }
            step += 1;

            let cart = store.get();
            let mut keys: Vec<_> = cart.items.iter().map(|i| i.key()).collect();
            let before = keys.len();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), before, "duplicate key after step {step}");
            assert!(cart.items.iter().all(|i| i.quantity >= 1));
            assert_eq!(
                store.count(),
                cart.items.iter().map(|i| u64::from(i.quantity)).sum::<u64>()
            );
        }
    }
}
