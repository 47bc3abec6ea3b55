//! Global keyboard hook
//!
//! Runs `rdev::listen` on a dedicated thread and forwards key presses and
//! releases as virtual key codes. rdev offers no way to remove the OS hook
//! once installed, so [`KeyHook::release`] only stops forwarding; the hook
//! itself goes away with the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use afv_protocol::{vc, KeyCode};
use rdev::{listen, Event, EventType, Key};
use thiserror::Error;
use tracing::{debug, error, info};

/// How long to wait for the hook to fail before assuming it is running
const STARTUP_GRACE: Duration = Duration::from_millis(200);

// Keys with no virtual key entry, kept clear of the `KeyCode::raw` range
const INTL_BACKSLASH: KeyCode = KeyCode(0xFFFF_FF01);
const FUNCTION: KeyCode = KeyCode(0xFFFF_FF02);

/// A global key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(KeyCode),
    Up(KeyCode),
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("could not install keyboard hook: {0}")]
    Listen(String),

    #[error("could not start keyboard hook thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Installed keyboard hook
pub struct KeyHook {
    enabled: Arc<AtomicBool>,
}

impl KeyHook {
    /// Install the hook and forward key events to `handler`
    ///
    /// `handler` runs on the hook thread and must return quickly.
    pub fn install<F>(handler: F) -> Result<Self, HookError>
    where
        F: Fn(KeyEvent) + Send + 'static,
    {
        let enabled = Arc::new(AtomicBool::new(true));
        let (err_tx, err_rx) = mpsc::channel::<String>();

        let flag = enabled.clone();
        thread::Builder::new()
            .name("key-hook".to_string())
            .spawn(move || {
                let callback = move |event: Event| {
                    if !flag.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(key_event) = translate(&event.event_type) {
                        handler(key_event);
                    }
                };

                if let Err(e) = listen(callback) {
                    error!("Keyboard hook stopped: {:?}", e);
                    let _ = err_tx.send(format!("{:?}", e));
                }
            })?;

        match err_rx.recv_timeout(STARTUP_GRACE) {
            Ok(message) => Err(HookError::Listen(message)),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(HookError::Listen("hook exited immediately".to_string()))
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                info!("Keyboard hook installed");
                Ok(Self { enabled })
            }
        }
    }

    /// Stop forwarding key events
    pub fn release(&self) {
        if self.enabled.swap(false, Ordering::Relaxed) {
            debug!("Keyboard hook released");
        }
    }
}

impl Drop for KeyHook {
    fn drop(&mut self) {
        self.release();
    }
}

fn translate(event_type: &EventType) -> Option<KeyEvent> {
    match event_type {
        EventType::KeyPress(key) => Some(KeyEvent::Down(key_code(*key))),
        EventType::KeyRelease(key) => Some(KeyEvent::Up(key_code(*key))),
        _ => None,
    }
}

/// Map an rdev key to its virtual key code
pub fn key_code(key: Key) -> KeyCode {
    let code = match key {
        Key::Escape => vc::ESCAPE,
        Key::F1 => vc::F1,
        Key::F2 => vc::F2,
        Key::F3 => vc::F3,
        Key::F4 => vc::F4,
        Key::F5 => vc::F5,
        Key::F6 => vc::F6,
        Key::F7 => vc::F7,
        Key::F8 => vc::F8,
        Key::F9 => vc::F9,
        Key::F10 => vc::F10,
        Key::F11 => vc::F11,
        Key::F12 => vc::F12,

        Key::BackQuote => vc::BACKQUOTE,
        Key::Num1 => vc::NUM_1,
        Key::Num2 => vc::NUM_2,
        Key::Num3 => vc::NUM_3,
        Key::Num4 => vc::NUM_4,
        Key::Num5 => vc::NUM_5,
        Key::Num6 => vc::NUM_6,
        Key::Num7 => vc::NUM_7,
        Key::Num8 => vc::NUM_8,
        Key::Num9 => vc::NUM_9,
        Key::Num0 => vc::NUM_0,
        Key::Minus => vc::MINUS,
        Key::Equal => vc::EQUALS,
        Key::Backspace => vc::BACKSPACE,
        Key::Tab => vc::TAB,
        Key::CapsLock => vc::CAPS_LOCK,

        Key::KeyA => vc::A,
        Key::KeyB => vc::B,
        Key::KeyC => vc::C,
        Key::KeyD => vc::D,
        Key::KeyE => vc::E,
        Key::KeyF => vc::F,
        Key::KeyG => vc::G,
        Key::KeyH => vc::H,
        Key::KeyI => vc::I,
        Key::KeyJ => vc::J,
        Key::KeyK => vc::K,
        Key::KeyL => vc::L,
        Key::KeyM => vc::M,
        Key::KeyN => vc::N,
        Key::KeyO => vc::O,
        Key::KeyP => vc::P,
        Key::KeyQ => vc::Q,
        Key::KeyR => vc::R,
        Key::KeyS => vc::S,
        Key::KeyT => vc::T,
        Key::KeyU => vc::U,
        Key::KeyV => vc::V,
        Key::KeyW => vc::W,
        Key::KeyX => vc::X,
        Key::KeyY => vc::Y,
        Key::KeyZ => vc::Z,

        Key::LeftBracket => vc::OPEN_BRACKET,
        Key::RightBracket => vc::CLOSE_BRACKET,
        Key::BackSlash => vc::BACK_SLASH,
        Key::SemiColon => vc::SEMICOLON,
        Key::Quote => vc::QUOTE,
        Key::Return => vc::ENTER,
        Key::Comma => vc::COMMA,
        Key::Dot => vc::PERIOD,
        Key::Slash => vc::SLASH,
        Key::Space => vc::SPACE,

        Key::PrintScreen => vc::PRINTSCREEN,
        Key::ScrollLock => vc::SCROLL_LOCK,
        Key::Pause => vc::PAUSE,
        Key::Insert => vc::INSERT,
        Key::Delete => vc::DELETE,
        Key::Home => vc::HOME,
        Key::End => vc::END,
        Key::PageUp => vc::PAGE_UP,
        Key::PageDown => vc::PAGE_DOWN,

        Key::UpArrow => vc::UP,
        Key::LeftArrow => vc::LEFT,
        Key::RightArrow => vc::RIGHT,
        Key::DownArrow => vc::DOWN,

        Key::NumLock => vc::NUM_LOCK,
        Key::KpDivide => vc::KP_DIVIDE,
        Key::KpMultiply => vc::KP_MULTIPLY,
        Key::KpMinus => vc::KP_SUBTRACT,
        Key::KpPlus => vc::KP_ADD,
        Key::KpReturn => vc::KP_ENTER,
        Key::KpDelete => vc::KP_SEPARATOR,
        Key::Kp0 => vc::KP_0,
        Key::Kp1 => vc::KP_1,
        Key::Kp2 => vc::KP_2,
        Key::Kp3 => vc::KP_3,
        Key::Kp4 => vc::KP_4,
        Key::Kp5 => vc::KP_5,
        Key::Kp6 => vc::KP_6,
        Key::Kp7 => vc::KP_7,
        Key::Kp8 => vc::KP_8,
        Key::Kp9 => vc::KP_9,

        Key::ShiftLeft => vc::SHIFT_L,
        Key::ShiftRight => vc::SHIFT_R,
        Key::ControlLeft => vc::CONTROL_L,
        Key::ControlRight => vc::CONTROL_R,
        Key::Alt => vc::ALT_L,
        Key::AltGr => vc::ALT_R,
        Key::MetaLeft => vc::META_L,
        Key::MetaRight => vc::META_R,

        Key::IntlBackslash => return INTL_BACKSLASH,
        Key::Function => return FUNCTION,
        Key::Unknown(raw) => return KeyCode::raw(raw),
        #[allow(unreachable_patterns)]
        other => {
            debug!("No key code for {:?}", other);
            return KeyCode::UNBOUND;
        }
    };
    KeyCode(code)
}
