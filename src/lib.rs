//! Eddy Input
//!
//! A frame-based input manager: consumes a queue of raw platform events
//! (keyboard, mouse, touch, joystick, window lifecycle) and turns it into
//! a queryable snapshot of device state plus a stream of normalized,
//! ordered notifications.
//!
//! # Architecture
//!
//! ```text
//! Platform queue → InputManager::update → translator → DeviceState
//!                                             ↓            ↓
//!                                         EventBus      queries
//!                                             ↑
//!                      screen joystick (touch → synthetic raw events)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut input = InputManager::new(&config, window, ui, devices);
//! input.subscribe(Box::new(my_sink));
//!
//! // As platform events arrive
//! input.queue_event(event);
//!
//! // Once per frame tick
//! input.update();
//! if input.key_press(keys::KEY_SPACE) {
//!     // ...
//! }
//! ```

/// Profile-based configuration
pub mod config;

/// Normalized notifications and the subscriber bus
pub mod events;

/// Key codes, scancodes, qualifier/button/hat masks, and name lookups
pub mod keys;

/// Raw platform events and the window/UI/device collaborator traits
pub mod platform;

/// Per-device state: keyboard, mouse, touch contacts, joysticks
pub mod state;

mod gestures;
mod manager;
mod screen_joystick;
mod translator;

// Re-export public API
pub use config::InputConfig;
pub use events::{EventBus, EventKind, EventSink, InputEvent};
pub use manager::InputManager;
pub use screen_joystick::{
    SCREEN_JOYSTICK_START_ID, ScreenJoystickError, ScreenJoystickLayout, WidgetLayout,
};
pub use state::{DeviceState, JoystickId, JoystickSource, JoystickState, TouchState};
