//! # Key Injection Module
//!
//! Synthesizes OS-visible keyboard events for bound keys.
//!
//! The [`KeyInjector`] resolves each [`KeyCode`] to an
//! [`InjectionDescriptor`] once - the scan-code lookup is the expensive
//! part - and memoizes it for the lifetime of the process, separately for
//! the down and up variants. Delivery goes through an
//! [`InjectionTransport`]; failures are swallowed here because a missed
//! transition is corrected on the next polling cycle, when the held paddle
//! is still observed as down.

pub mod transport;

pub use transport::{InjectionTransport, RemoteTransport, UinputTransport};

use std::collections::HashMap;

use tracing::debug;

use crate::keys::KeyCode;

/// Direction of a synthesized key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// Immutable, precomputed delivery data for one key transition.
///
/// Created on first use per key and direction, then cached for the
/// process lifetime; the cache is never invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionDescriptor {
    /// Virtual-key code, the remote wire representation.
    pub virtual_key: u16,
    /// Resolved scan code, the local uinput representation.
    pub scan_code: u16,
    /// Which transition this descriptor delivers.
    pub direction: KeyDirection,
}

impl InjectionDescriptor {
    fn resolve(key: KeyCode, direction: KeyDirection) -> Self {
        Self {
            virtual_key: key.virtual_key(),
            scan_code: key.scan_code(),
            direction,
        }
    }
}

/// Caches per-key injection descriptors and emits key transitions through
/// the configured transport.
pub struct KeyInjector {
    transport: Box<dyn InjectionTransport>,
    down_cache: HashMap<KeyCode, InjectionDescriptor>,
    up_cache: HashMap<KeyCode, InjectionDescriptor>,
}

impl KeyInjector {
    /// Creates an injector with empty descriptor caches.
    #[must_use]
    pub fn new(transport: Box<dyn InjectionTransport>) -> Self {
        Self {
            transport,
            down_cache: HashMap::new(),
            up_cache: HashMap::new(),
        }
    }

    /// Emits a key-down for `key`.
    ///
    /// Delivery is best-effort: a transport failure is logged at debug and
    /// dropped, never retried synchronously.
    pub async fn send_key_down(&mut self, key: KeyCode) {
        let descriptor = self
            .down_cache
            .entry(key)
            .or_insert_with(|| InjectionDescriptor::resolve(key, KeyDirection::Down));

        if let Err(e) = self.transport.inject_key_down(descriptor).await {
            debug!("Key-down delivery for {} failed: {}", key, e);
        }
    }

    /// Emits a key-up for `key`. Best-effort, like
    /// [`KeyInjector::send_key_down`].
    pub async fn send_key_up(&mut self, key: KeyCode) {
        let descriptor = self
            .up_cache
            .entry(key)
            .or_insert_with(|| InjectionDescriptor::resolve(key, KeyDirection::Up));

        if let Err(e) = self.transport.inject_key_up(descriptor).await {
            debug!("Key-up delivery for {} failed: {}", key, e);
        }
    }

    /// Number of cached (down, up) descriptors, exposed for tests.
    #[must_use]
    pub fn cached_descriptors(&self) -> (usize, usize) {
        (self.down_cache.len(), self.up_cache.len())
    }
}

#[cfg(test)]
mod tests {
    use super::transport::mocks::RecordingTransport;
    use super::*;
    use std::io;

    fn injector_with(transport: &RecordingTransport) -> KeyInjector {
        KeyInjector::new(Box::new(transport.clone()))
    }

    #[tokio::test]
    async fn test_send_key_down_delivers_virtual_key() {
        let transport = RecordingTransport::new();
        let mut injector = injector_with(&transport);

        injector.send_key_down(KeyCode::A).await;

        assert_eq!(transport.sent_events(), vec![("down", 0x41)]);
    }

    #[tokio::test]
    async fn test_send_key_up_delivers_virtual_key() {
        let transport = RecordingTransport::new();
        let mut injector = injector_with(&transport);

        injector.send_key_up(KeyCode::Space).await;

        assert_eq!(transport.sent_events(), vec![("up", 0x20)]);
    }

    #[tokio::test]
    async fn test_descriptor_memoized_per_key_and_direction() {
        let transport = RecordingTransport::new();
        let mut injector = injector_with(&transport);

        injector.send_key_down(KeyCode::A).await;
        injector.send_key_down(KeyCode::A).await;
        injector.send_key_up(KeyCode::A).await;
        injector.send_key_down(KeyCode::B).await;

        // One down entry per key, one up entry for A
        assert_eq!(injector.cached_descriptors(), (2, 1));
        // Every call still delivered
        assert_eq!(transport.sent_events().len(), 4);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let transport = RecordingTransport::new();
        transport.set_failure(io::ErrorKind::NotFound);
        let mut injector = injector_with(&transport);

        // Must not panic or surface the error
        injector.send_key_down(KeyCode::A).await;
        assert!(transport.sent_events().is_empty());

        // Recovery on the next call once the transport heals
        transport.clear_failure();
        injector.send_key_down(KeyCode::A).await;
        assert_eq!(transport.sent_events(), vec![("down", 0x41)]);
    }

    #[tokio::test]
    async fn test_descriptor_contents() {
        let transport = RecordingTransport::new();
        let mut injector = injector_with(&transport);

        injector.send_key_down(KeyCode::Escape).await;

        let descriptor = injector.down_cache[&KeyCode::Escape];
        assert_eq!(descriptor.virtual_key, 0x1B);
        assert_eq!(descriptor.scan_code, KeyCode::Escape.scan_code());
        assert_eq!(descriptor.direction, KeyDirection::Down);
    }
}
