//! Normalized input notifications
//!
//! One variant per meaningful device-state transition, with named payload
//! fields. Key, text, and mouse notifications also carry the aggregate
//! mouse-button mask and qualifier mask current at the time of the event,
//! so subscribers never have to query back into the state store.

use std::path::PathBuf;

use crate::keys::{HatPosition, KeyCode, MouseButton, Qualifier, Scancode};
use crate::state::JoystickId;

/// Normalized input event delivered through the [`EventBus`]
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Key pressed, or auto-repeated while held
    KeyDown {
        key: KeyCode,
        scancode: Scancode,
        raw: u32,
        buttons: MouseButton,
        qualifiers: Qualifier,
        repeat: bool,
    },
    KeyUp {
        key: KeyCode,
        scancode: Scancode,
        raw: u32,
        buttons: MouseButton,
        qualifiers: Qualifier,
    },
    /// Composed text from the platform IME / text input layer
    TextInput {
        text: String,
        buttons: MouseButton,
        qualifiers: Qualifier,
    },
    MouseButtonDown {
        button: MouseButton,
        buttons: MouseButton,
        qualifiers: Qualifier,
    },
    MouseButtonUp {
        button: MouseButton,
        buttons: MouseButton,
        qualifiers: Qualifier,
    },
    /// Mouse moved; `position` is present only while the cursor is visible
    MouseMove {
        position: Option<(i32, i32)>,
        delta: (i32, i32),
        buttons: MouseButton,
        qualifiers: Qualifier,
    },
    MouseWheel {
        wheel: i32,
        buttons: MouseButton,
        qualifiers: Qualifier,
    },
    MouseVisibleChanged {
        visible: bool,
    },
    TouchBegin {
        touch_id: i32,
        position: (i32, i32),
        pressure: f32,
    },
    TouchMove {
        touch_id: i32,
        position: (i32, i32),
        delta: (i32, i32),
        pressure: f32,
    },
    TouchEnd {
        touch_id: i32,
        position: (i32, i32),
    },
    GestureRecorded {
        gesture_id: i64,
    },
    GestureRecognized {
        gesture_id: i64,
        center: (i32, i32),
        num_fingers: u32,
        error: f32,
    },
    MultiGesture {
        center: (i32, i32),
        num_fingers: u32,
        /// Rotation delta in degrees
        d_theta: f32,
        d_dist: f32,
    },
    JoystickConnected {
        joystick_id: JoystickId,
    },
    JoystickDisconnected {
        joystick_id: JoystickId,
    },
    JoystickButtonDown {
        joystick_id: JoystickId,
        button: u32,
    },
    JoystickButtonUp {
        joystick_id: JoystickId,
        button: u32,
    },
    JoystickAxisMove {
        joystick_id: JoystickId,
        axis: u32,
        position: f32,
    },
    JoystickHatMove {
        joystick_id: JoystickId,
        hat: u32,
        position: HatPosition,
    },
    ControllerButtonDown {
        joystick_id: JoystickId,
        button: u32,
    },
    ControllerButtonUp {
        joystick_id: JoystickId,
        button: u32,
    },
    ControllerAxisMove {
        joystick_id: JoystickId,
        axis: u32,
        position: f32,
    },
    /// Window input focus or minimized status changed
    InputFocus {
        focused: bool,
        minimized: bool,
    },
    DropFile {
        path: PathBuf,
    },
    /// The platform asked the application to quit; the host decides
    ExitRequested,
}

/// Event kind discriminant, used by sinks to filter subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    KeyUp,
    TextInput,
    MouseButtonDown,
    MouseButtonUp,
    MouseMove,
    MouseWheel,
    MouseVisibleChanged,
    TouchBegin,
    TouchMove,
    TouchEnd,
    GestureRecorded,
    GestureRecognized,
    MultiGesture,
    JoystickConnected,
    JoystickDisconnected,
    JoystickButtonDown,
    JoystickButtonUp,
    JoystickAxisMove,
    JoystickHatMove,
    ControllerButtonDown,
    ControllerButtonUp,
    ControllerAxisMove,
    InputFocus,
    DropFile,
    ExitRequested,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::KeyDown { .. } => EventKind::KeyDown,
            InputEvent::KeyUp { .. } => EventKind::KeyUp,
            InputEvent::TextInput { .. } => EventKind::TextInput,
            InputEvent::MouseButtonDown { .. } => EventKind::MouseButtonDown,
            InputEvent::MouseButtonUp { .. } => EventKind::MouseButtonUp,
            InputEvent::MouseMove { .. } => EventKind::MouseMove,
            InputEvent::MouseWheel { .. } => EventKind::MouseWheel,
            InputEvent::MouseVisibleChanged { .. } => EventKind::MouseVisibleChanged,
            InputEvent::TouchBegin { .. } => EventKind::TouchBegin,
            InputEvent::TouchMove { .. } => EventKind::TouchMove,
            InputEvent::TouchEnd { .. } => EventKind::TouchEnd,
            InputEvent::GestureRecorded { .. } => EventKind::GestureRecorded,
            InputEvent::GestureRecognized { .. } => EventKind::GestureRecognized,
            InputEvent::MultiGesture { .. } => EventKind::MultiGesture,
            InputEvent::JoystickConnected { .. } => EventKind::JoystickConnected,
            InputEvent::JoystickDisconnected { .. } => EventKind::JoystickDisconnected,
            InputEvent::JoystickButtonDown { .. } => EventKind::JoystickButtonDown,
            InputEvent::JoystickButtonUp { .. } => EventKind::JoystickButtonUp,
            InputEvent::JoystickAxisMove { .. } => EventKind::JoystickAxisMove,
            InputEvent::JoystickHatMove { .. } => EventKind::JoystickHatMove,
            InputEvent::ControllerButtonDown { .. } => EventKind::ControllerButtonDown,
            InputEvent::ControllerButtonUp { .. } => EventKind::ControllerButtonUp,
            InputEvent::ControllerAxisMove { .. } => EventKind::ControllerAxisMove,
            InputEvent::InputFocus { .. } => EventKind::InputFocus,
            InputEvent::DropFile { .. } => EventKind::DropFile,
            InputEvent::ExitRequested => EventKind::ExitRequested,
        }
    }
}

/// Receiver for normalized input events
///
/// Sinks are invoked synchronously, in subscription order, on the input
/// thread. A sink that only cares about some kinds filters on
/// [`InputEvent::kind`].
pub trait EventSink {
    fn on_event(&mut self, event: &InputEvent);
}

impl<F: FnMut(&InputEvent)> EventSink for F {
    fn on_event(&mut self, event: &InputEvent) {
        self(event)
    }
}

/// Fan-out point between the input manager and its subscribers
#[derive(Default)]
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink; all events are delivered to all sinks
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn publish(&mut self, event: &InputEvent) {
        for sink in &mut self.sinks {
            sink.on_event(event);
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}
