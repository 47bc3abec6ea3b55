//! AFV Link
//!
//! Console host for the voice session layer: wires the voice engine, the
//! session actor, the global PTT hook and persisted settings together.

mod app;
mod console;
mod key_hook;
mod settings;

use std::sync::Arc;

use afv_protocol::{parse_hz, UNSET_FREQUENCY_HZ};
use afv_session::{spawn_session, CommandDispatcher, KeyCaptureBridge, SessionEvent, SpawnedSession};
use afv_sim::{SimStation, SimulatedEngine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{describe_binding, describe_event, App, Flow};
use console::parse_command;
use key_hook::{KeyEvent, KeyHook};
use settings::SettingsStore;

const DEFAULT_CALLSIGN: &str = "EGLL_TWR";
const DEFAULT_FREQUENCY_HZ: u32 = 118_500_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "afvlink=info,afv_protocol=info,afv_session=info,afv_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AFV Link");

    let settings = Arc::new(SettingsStore::load());
    match settings.path() {
        Some(path) => info!("Settings: {}", path.display()),
        None => warn!("No settings directory, changes will not be saved"),
    }

    let (callsign, frequency_hz) = network_position();

    let engine = Arc::new(SimulatedEngine::new());
    engine.add_station(SimStation {
        callsign: callsign.clone(),
        frequencies_hz: vec![frequency_hz],
        transceivers: 1,
    });

    let dispatcher = Arc::new(CommandDispatcher::new(engine.clone()));
    info!("Voice engine {}", dispatcher.version());

    let SpawnedSession {
        handle,
        events,
        demux,
        task,
    } = spawn_session(dispatcher.clone());

    let (bound_tx, bound_rx) = mpsc::unbounded_channel();
    let bridge = Arc::new(
        KeyCaptureBridge::new(dispatcher.clone(), settings.clone()).with_notifier(bound_tx),
    );

    let app = App::new(
        handle.clone(),
        dispatcher.clone(),
        bridge.clone(),
        settings.clone(),
    );
    app.apply_settings();
    app.restore_gain().await?;

    let hook_bridge = bridge.clone();
    let hook = match KeyHook::install(move |event| match event {
        KeyEvent::Down(key) => {
            hook_bridge.key_down(key);
        }
        KeyEvent::Up(key) => {
            hook_bridge.key_up(key);
        }
    }) {
        Ok(hook) => Some(hook),
        Err(e) => {
            warn!("{}; push-to-talk keys are unavailable", e);
            None
        }
    };

    // The simulated network sees us logged in as a controller position
    engine.network_login(&callsign, true, frequency_hz);

    let observer = tokio::spawn(observe(events, bound_rx));

    println!("Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            Ok(Some(command)) => {
                if app.execute(command).await? == Flow::Quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("! {}", e),
        }
    }

    info!("Shutting down");

    if let Some(hook) = &hook {
        hook.release();
    }
    bridge.shutdown();

    if dispatcher.is_connected() {
        if let Err(e) = handle.disconnect().await {
            warn!("Disconnect failed: {}", e);
        }
    }

    handle.shutdown().await;
    if let Err(e) = task.await {
        warn!("Session actor ended abnormally: {}", e);
    }
    observer.abort();

    if demux.dropped_count() > 0 {
        warn!("{} engine events could not be decoded", demux.dropped_count());
    }
    dispatcher.exit();

    Ok(())
}

/// Position announced by the simulated network
fn network_position() -> (String, u32) {
    let callsign = std::env::var("AFVLINK_CALLSIGN")
        .ok()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CALLSIGN.to_string());

    let frequency_hz = match std::env::var("AFVLINK_FREQUENCY") {
        Ok(value) => match parse_hz("AFVLINK_FREQUENCY", &value) {
            Ok(hz) if hz != 0 && hz != UNSET_FREQUENCY_HZ => hz,
            _ => {
                warn!(
                    "Ignoring AFVLINK_FREQUENCY={:?}, using {}",
                    value, DEFAULT_FREQUENCY_HZ
                );
                DEFAULT_FREQUENCY_HZ
            }
        },
        Err(_) => DEFAULT_FREQUENCY_HZ,
    };

    (callsign, frequency_hz)
}

/// Print session notifications and new key bindings
async fn observe(
    mut events: mpsc::Receiver<SessionEvent>,
    mut bound: mpsc::UnboundedReceiver<afv_session::KeyBound>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    if let Some(text) = describe_event(&event) {
                        println!("{}", text);
                    }
                }
                None => break,
            },
            Some(key) = bound.recv() => println!("{}", describe_binding(&key)),
        }
    }
}
