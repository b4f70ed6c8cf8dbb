//! # Key Bridge
//!
//! Remap the rear paddles of an Xbox Elite controller to keyboard keys.
//!
//! This application polls a connected Elite gamepad at a fixed cadence,
//! detects paddle press/release edges, and injects the bound keyboard keys
//! into the OS through a uinput virtual keyboard (or a remote key-sender
//! service when this process cannot hold injection privilege itself).

use anyhow::Result;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::info;
use tracing_subscriber;

use key_bridge::bindings::{BindingStore, TomlSettingsStore};
use key_bridge::config::Config;
use key_bridge::engine::assign::AssignmentStateMachine;
use key_bridge::engine::{EngineHandles, RemappingEngine};
use key_bridge::gamepad::driver::hotplug_channel;
use key_bridge::gamepad::elite::EliteDriver;
use key_bridge::gamepad::GamepadSession;
use key_bridge::inject::{InjectionTransport, KeyInjector, RemoteTransport, UinputTransport};

/// Default configuration file path
const CONFIG_PATH: &str = "config/default.toml";

/// Number of ticks between status log messages
const LOG_INTERVAL_TICKS: u64 = 1000;

/// Main entry point for Key Bridge
///
/// Initializes the application and runs the poll loop that watches the
/// Elite controller's paddles and emits key transitions for every edge.
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (defaults if no file exists)
///    - Restore persisted paddle bindings
///    - Build the injection transport named by the configuration
///
/// 2. **Main Loop**
///    - Tick the remapping engine at the configured poll rate (8ms default)
///    - Rediscover the gamepad automatically after disconnects
///    - Log status every 1000 ticks (~8 seconds at 125Hz)
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration file exists but is invalid
/// - The uinput device cannot be created (missing /dev/uinput access)
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Key Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    // Optional config path argument, otherwise the default location
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path)?;

    // Restore persisted bindings
    let store = BindingStore::new(Box::new(TomlSettingsStore::open(&config.bindings.path)));
    let (machine, binding_events) = AssignmentStateMachine::new(store);

    // Injection transport per configuration
    let transport: Box<dyn InjectionTransport> = match config.injection.transport.as_str() {
        "remote" => {
            info!("Using remote key-sender at {}", config.injection.service_url);
            Box::new(RemoteTransport::new(&config.injection.service_url))
        }
        _ => {
            info!("Using local uinput virtual keyboard");
            Box::new(UinputTransport::create()?)
        }
    };
    let injector = KeyInjector::new(transport);

    // Gamepad session; the device binds lazily on the first tick it is
    // seen, and the watcher feeds connect/disconnect notifications for the
    // process lifetime
    let driver = EliteDriver::new(
        config.gamepad.vendor_id,
        config.gamepad.product_ids.clone(),
    );
    let (hotplug_tx, hotplug_rx) = hotplug_channel();
    let hotplug_watcher = driver.spawn_hotplug_watcher(hotplug_tx);
    let session = GamepadSession::new(Box::new(driver), hotplug_rx);

    let (mut engine, handles) = RemappingEngine::new(session, injector, machine, binding_events);

    // UI-boundary surface. The assignment handle drives interactive
    // rebinding; the receivers must outlive the loop so reading broadcasts
    // and binding notifications stay deliverable.
    let EngineHandles {
        assignment,
        readings: _readings_rx,
        binding_events: _binding_events_rx,
    } = handles;

    for (paddle, key) in assignment.bindings() {
        info!("Binding: {} -> {}", paddle, key);
    }

    let mut poll_interval = interval(Duration::from_millis(config.engine.poll_rate_ms));
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Starting paddle poll loop at {}ms cadence",
        config.engine.poll_rate_ms
    );
    info!("Press Ctrl+C to exit");

    let mut tick_count: u64 = 0;
    let mut last_log_count: u64 = 0;

    // Main poll loop
    loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                engine.tick().await;
                tick_count += 1;

                // Log status every LOG_INTERVAL_TICKS (~8 seconds at 125Hz)
                if tick_count - last_log_count >= LOG_INTERVAL_TICKS {
                    let stats = engine.stats();
                    info!(
                        "Ticks: {} (gamepad {}, {} transitions emitted, {} duplicate readings skipped)",
                        tick_count,
                        if engine.is_ready() { "ready" } else { "absent" },
                        stats.emitted_transitions,
                        stats.skipped_readings,
                    );
                    last_log_count = tick_count;
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                let stats = engine.stats();
                info!("Total transitions emitted: {}", stats.emitted_transitions);
                break;
            }
        }
    }

    hotplug_watcher.abort();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_interval_constant() {
        // At the default 8ms cadence, 1000 ticks = 8 seconds
        assert_eq!(LOG_INTERVAL_TICKS, 1000);
        let seconds = LOG_INTERVAL_TICKS as f64 * 0.008;
        assert_eq!(seconds, 8.0, "Log interval should be 8 seconds at 125Hz");
    }

    #[test]
    fn test_config_path_constant() {
        assert_eq!(CONFIG_PATH, "config/default.toml");
    }
}
