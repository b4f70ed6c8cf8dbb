//! Trait abstraction for key-event delivery to enable testing and to keep
//! the local uinput path and the remote key-sender path interchangeable.

use async_trait::async_trait;
use std::io;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};

use crate::error::{KeyBridgeError, Result};
use crate::inject::InjectionDescriptor;
use crate::keys::ALL_KEYS;

/// Trait for delivering one synthesized key transition to the OS.
///
/// Implementations must be behaviorally equivalent from the engine's
/// perspective: a delivered descriptor produces exactly one key event
/// visible to the foreground application, and a failed delivery produces
/// nothing (the engine never retries within a tick).
#[async_trait]
pub trait InjectionTransport: Send {
    /// Deliver a key-down transition.
    async fn inject_key_down(&mut self, descriptor: &InjectionDescriptor) -> io::Result<()>;

    /// Deliver a key-up transition.
    async fn inject_key_up(&mut self, descriptor: &InjectionDescriptor) -> io::Result<()>;
}

/// Local transport: a uinput virtual keyboard.
///
/// Creating the device registers every key in [`ALL_KEYS`] up front, since
/// uinput capabilities are fixed at build time.
pub struct UinputTransport {
    device: VirtualDevice,
}

impl UinputTransport {
    /// Builds the virtual keyboard device.
    ///
    /// # Errors
    ///
    /// Returns `Injection` error if `/dev/uinput` is unavailable or the
    /// process lacks permission to create input devices.
    pub fn create() -> Result<Self> {
        let mut keys: AttributeSet<Key> = AttributeSet::new();
        for key in ALL_KEYS {
            keys.insert(Key::new(key.scan_code()));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e| KeyBridgeError::Injection(format!("uinput builder: {}", e)))?
            .name("key-bridge virtual keyboard")
            .with_keys(&keys)
            .map_err(|e| KeyBridgeError::Injection(format!("uinput capabilities: {}", e)))?
            .build()
            .map_err(|e| KeyBridgeError::Injection(format!("uinput device: {}", e)))?;

        Ok(Self { device })
    }

    fn emit(&mut self, scan_code: u16, value: i32) -> io::Result<()> {
        // SYN_REPORT is appended by the uinput device on emit
        let event = InputEvent::new(EventType::KEY, scan_code, value);
        self.device.emit(&[event])
    }
}

#[async_trait]
impl InjectionTransport for UinputTransport {
    async fn inject_key_down(&mut self, descriptor: &InjectionDescriptor) -> io::Result<()> {
        self.emit(descriptor.scan_code, 1)
    }

    async fn inject_key_up(&mut self, descriptor: &InjectionDescriptor) -> io::Result<()> {
        self.emit(descriptor.scan_code, 0)
    }
}

/// Remote transport: a loopback key-sender service.
///
/// Used when this process cannot hold input-injection privilege itself.
/// Each transition is a fire-and-forget POST of the virtual-key code:
/// `{base}/SendKeyDown?virtualKey={code}` and the `SendKeyUp` equivalent.
/// Response bodies are ignored.
pub struct RemoteTransport {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteTransport {
    /// Creates a transport targeting `base_url`
    /// (for example `http://127.0.0.1:8642/keysender`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The URL for one transition, exposed for tests.
    pub(crate) fn url_for(&self, operation: &str, virtual_key: u16) -> String {
        format!(
            "{}/{}?virtualKey={}",
            self.base_url, operation, virtual_key
        )
    }

    async fn post(&self, operation: &str, virtual_key: u16) -> io::Result<()> {
        self.client
            .post(self.url_for(operation, virtual_key))
            .send()
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(())
    }
}

#[async_trait]
impl InjectionTransport for RemoteTransport {
    async fn inject_key_down(&mut self, descriptor: &InjectionDescriptor) -> io::Result<()> {
        self.post("SendKeyDown", descriptor.virtual_key).await
    }

    async fn inject_key_up(&mut self, descriptor: &InjectionDescriptor) -> io::Result<()> {
        self.post("SendKeyUp", descriptor.virtual_key).await
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// A recorded key transition: `("down" | "up", virtual_key)`.
    pub type SentEvent = (&'static str, u16);

    /// Mock transport that records transitions for testing.
    #[derive(Clone)]
    pub struct RecordingTransport {
        pub sent: Arc<Mutex<Vec<SentEvent>>>,
        pub fail_with: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self {
                sent: Arc::new(Mutex::new(Vec::new())),
                fail_with: Arc::new(Mutex::new(None)),
            }
        }

        pub fn sent_events(&self) -> Vec<SentEvent> {
            self.sent.lock().unwrap().clone()
        }

        pub fn set_failure(&self, kind: io::ErrorKind) {
            *self.fail_with.lock().unwrap() = Some(kind);
        }

        pub fn clear_failure(&self) {
            *self.fail_with.lock().unwrap() = None;
        }

        fn record(&self, direction: &'static str, virtual_key: u16) -> io::Result<()> {
            if let Some(kind) = *self.fail_with.lock().unwrap() {
                return Err(io::Error::new(kind, "Mock delivery error"));
            }
            self.sent.lock().unwrap().push((direction, virtual_key));
            Ok(())
        }
    }

    #[async_trait]
    impl InjectionTransport for RecordingTransport {
        async fn inject_key_down(&mut self, descriptor: &InjectionDescriptor) -> io::Result<()> {
            self.record("down", descriptor.virtual_key)
        }

        async fn inject_key_up(&mut self, descriptor: &InjectionDescriptor) -> io::Result<()> {
            self.record("up", descriptor.virtual_key)
        }
    }
}
