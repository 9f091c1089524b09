//! Session-backed cart.
//!
//! The cart blob lives in the session under [`CART_STORAGE_KEY`], exactly as
//! it would sit in browser local storage. Each request loads it into a
//! [`CartStore`] over [`MemoryStorage`], applies one mutation and writes the
//! blob back.
//!
//! Every open tab of a session subscribes to the same broadcast channel in
//! [`CartHub`]. A store listener publishes each written blob there, and the
//! `/cart/events` stream replays it into a read-only store as a storage event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tower_sessions::Session;
use uuid::Uuid;

use perkshop_core::cart::{CART_STORAGE_KEY, Cart, CartEvent, CartStore, MemoryStorage};

use crate::models::CART_CHANNEL_KEY;

/// Buffered cart publications per session before slow tabs lag.
const CHANNEL_CAPACITY: usize = 16;

/// Per-session broadcast channels carrying cart blobs.
///
/// A channel lives while at least one [`CartSubscription`] for it is open.
#[derive(Clone, Default)]
pub struct CartHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl CartHub {
    /// Subscribe to a session's cart publications.
    #[must_use]
    pub fn subscribe(&self, channel: &str) -> CartSubscription {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let receiver = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        CartSubscription {
            hub: self.clone(),
            channel: channel.to_string(),
            receiver: Some(receiver),
        }
    }

    /// Publish a cart blob. Returns the number of tabs that received it.
    pub fn publish(&self, channel: &str, blob: String) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = channels.get(channel) else {
            return 0;
        };
        if let Ok(receivers) = sender.send(blob) {
            receivers
        } else {
            channels.remove(channel);
            0
        }
    }

    /// Drop the channel once its last subscriber is gone.
    fn release(&self, channel: &str) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        if channels
            .get(channel)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(channel);
        }
    }

    /// Number of sessions with an open channel.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// One tab's view of a session channel. Dropping the last subscription of a
/// session removes its channel from the hub.
pub struct CartSubscription {
    hub: CartHub,
    channel: String,
    receiver: Option<broadcast::Receiver<String>>,
}

impl CartSubscription {
    /// Wait for the next published blob.
    ///
    /// # Errors
    ///
    /// Returns `Lagged` when this tab fell behind and `Closed` when the
    /// channel is gone.
    pub async fn recv(&mut self) -> Result<String, RecvError> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => Err(RecvError::Closed),
        }
    }
}

impl Drop for CartSubscription {
    fn drop(&mut self) {
        // The receiver must be gone before the count is checked.
        drop(self.receiver.take());
        self.hub.release(&self.channel);
    }
}

impl std::fmt::Debug for CartSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSubscription")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for CartHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartHub")
            .field("channels", &self.channel_count())
            .finish()
    }
}

/// The session's broadcast channel name, created on first use.
///
/// # Errors
///
/// Returns a session error if the session store fails.
pub async fn channel_id(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(id) = session.get::<String>(CART_CHANNEL_KEY).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    session.insert(CART_CHANNEL_KEY, &id).await?;
    Ok(id)
}

/// Read the session's cart. Missing or corrupt blobs read as empty.
///
/// # Errors
///
/// Returns a session error if the session store fails.
pub async fn load(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    let store = CartStore::new(session_storage(session).await?);
    Ok(store.get())
}

/// Apply a mutation to the session's cart and persist it.
///
/// Other tabs of the session are notified through `hub`.
///
/// # Errors
///
/// Returns a session error if the session store fails.
pub async fn mutate<F>(
    session: &Session,
    hub: &CartHub,
    mutation: F,
) -> Result<Cart, tower_sessions::session::Error>
where
    F: FnOnce(&mut CartStore<MemoryStorage>),
{
    let channel = channel_id(session).await?;
    let mut store = CartStore::new(session_storage(session).await?);

    let publisher = hub.clone();
    store.on_change(move |event| {
        if let CartEvent::Updated(cart) = event {
            publisher.publish(&channel, cart.to_json());
        }
    });

    mutation(&mut store);

    let cart = store.get();
    let mut storage = store.into_storage();
    if let Some(blob) = storage.take_item(CART_STORAGE_KEY) {
        session.insert(CART_STORAGE_KEY, blob).await?;
    }
    Ok(cart)
}

async fn session_storage(session: &Session) -> Result<MemoryStorage, tower_sessions::session::Error> {
    let raw = session.get::<String>(CART_STORAGE_KEY).await?;
    Ok(raw.map_or_else(MemoryStorage::new, |blob| {
        MemoryStorage::with_item(CART_STORAGE_KEY, blob)
    }))
}

/// A read-only store that follows another tab's writes.
#[must_use]
pub fn sync_view() -> CartStore<MemoryStorage> {
    CartStore::new(MemoryStorage::new())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use perkshop_core::{ProductId, mock_uuid};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn p(n: u128) -> ProductId {
        ProductId::from_uuid(mock_uuid(n))
    }

    #[tokio::test]
    async fn test_empty_session_has_empty_cart() {
        assert!(load(&session()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_blob_reads_as_empty() {
        let session = session();
        session
            .insert(CART_STORAGE_KEY, "{not json".to_string())
            .await
            .unwrap();
        assert!(load(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_persists_in_session() {
        let session = session();
        let hub = CartHub::default();

        mutate(&session, &hub, |store| store.add(p(1), None, 2))
            .await
            .unwrap();
        let cart = mutate(&session, &hub, |store| store.add(p(1), None, 3))
            .await
            .unwrap();

        assert_eq!(cart.count(), 5);
        assert_eq!(load(&session).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_other_tabs_receive_published_blob() {
        let session = session();
        let hub = CartHub::default();
        let channel = channel_id(&session).await.unwrap();
        let mut other_tab = hub.subscribe(&channel);

        mutate(&session, &hub, |store| store.add(p(7), None, 1))
            .await
            .unwrap();

        let blob = other_tab.recv().await.unwrap();
        let mut view = sync_view();
        let synced = view.apply_storage_event(CART_STORAGE_KEY, Some(&blob)).unwrap();
        assert_eq!(synced.count(), 1);
    }

    #[test]
    fn test_closing_every_tab_removes_channels() {
        let hub = CartHub::default();
        let tabs: Vec<_> = (0..100)
            .map(|n| hub.subscribe(&format!("session-{n}")))
            .collect();
        assert_eq!(hub.channel_count(), 100);

        drop(tabs);
        assert_eq!(hub.channel_count(), 0);
    }

    #[test]
    fn test_channel_survives_until_last_tab_closes() {
        let hub = CartHub::default();
        let first = hub.subscribe("session");
        let second = hub.subscribe("session");
        assert_eq!(hub.channel_count(), 1);

        drop(first);
        assert_eq!(hub.channel_count(), 1);
        assert_eq!(hub.publish("session", "{}".to_string()), 1);

        drop(second);
        assert_eq!(hub.channel_count(), 0);
        assert_eq!(hub.publish("session", "{}".to_string()), 0);
    }
}
