use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use uuid::Uuid;

struct Endpoint {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// Process-wide map from user identity to their one live-channel endpoint.
/// Injected through `AppState` so message delivery never reaches for a global.
///
/// At most one endpoint per user: a new connection replaces any prior one
/// (last writer wins), and replacing an entry drops its sender, which closes
/// the old socket's feed.
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    inner: Arc<Mutex<HashMap<Uuid, Endpoint>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live channel for `user`, returning the endpoint id and the
    /// event feed to forward into the socket.
    pub fn connect(&self, user: Uuid) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let endpoint_id = Uuid::now_v7();
        self.inner
            .lock()
            .unwrap()
            .insert(user, Endpoint { id: endpoint_id, tx });
        (endpoint_id, rx)
    }

    /// Removes the entry only while it still belongs to `endpoint_id`, so a
    /// late close of a replaced socket cannot evict a newer connection.
    pub fn disconnect(&self, user: Uuid, endpoint_id: Uuid) {
        let mut map = self.inner.lock().unwrap();
        if map.get(&user).is_some_and(|endpoint| endpoint.id == endpoint_id) {
            map.remove(&user);
        }
    }

    /// Best-effort push of a serialized event. `false` means the user is
    /// offline or their channel already closed; callers treat both the same
    /// and must not read delivery as a correctness signal.
    pub fn push(&self, user: Uuid, event: &str) -> bool {
        match self.inner.lock().unwrap().get(&user) {
            Some(endpoint) => endpoint.tx.send(event.to_owned()).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_to_absent_user_is_false() {
        let presence = PresenceRegistry::new();
        assert!(!presence.push(Uuid::now_v7(), "hello"));
    }

    #[test]
    fn connected_user_receives_pushes() {
        let presence = PresenceRegistry::new();
        let user = Uuid::now_v7();
        let (_endpoint, mut rx) = presence.connect(user);

        assert!(presence.push(user, "one"));
        assert!(presence.push(user, "two"));
        assert_eq!(rx.try_recv().unwrap(), "one");
        assert_eq!(rx.try_recv().unwrap(), "two");
    }

    #[test]
    fn reconnect_replaces_prior_endpoint() {
        let presence = PresenceRegistry::new();
        let user = Uuid::now_v7();
        let (_old, mut old_rx) = presence.connect(user);
        let (_new, mut new_rx) = presence.connect(user);

        assert!(presence.push(user, "msg"));
        assert_eq!(new_rx.try_recv().unwrap(), "msg");
        // replaced endpoint's sender was dropped, its feed is closed
        assert!(matches!(
            old_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn stale_disconnect_does_not_evict_newer_endpoint() {
        let presence = PresenceRegistry::new();
        let user = Uuid::now_v7();
        let (old_endpoint, _old_rx) = presence.connect(user);
        let (_new_endpoint, mut new_rx) = presence.connect(user);

        presence.disconnect(user, old_endpoint);

        assert!(presence.push(user, "still here"));
        assert_eq!(new_rx.try_recv().unwrap(), "still here");
    }

    #[test]
    fn disconnect_removes_entry() {
        let presence = PresenceRegistry::new();
        let user = Uuid::now_v7();
        let (endpoint, _rx) = presence.connect(user);

        presence.disconnect(user, endpoint);
        assert!(!presence.push(user, "gone"));
    }
}
