//! Device state store
//!
//! Current-frame snapshot of every input device: keyboard down/press sets,
//! mouse button masks and deltas, touch contacts, and joystick devices.
//! All mutation happens inside the crate (the event translator); external
//! callers only read through the query methods.
//!
//! "Press" state is edge-triggered and frame-scoped: it records a
//! not-down-to-down transition for the current tick only and is cleared by
//! [`DeviceState::begin_frame`] before any event is drained.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::keys::{
    self, HatPosition, KeyCode, MouseButton, Qualifier, Scancode,
};
use crate::platform::{ElementId, UiBackend};

/// Stable identifier of an open input device, physical or virtual
pub type JoystickId = i32;

/// A single finger contact on a touch surface
#[derive(Debug, Clone)]
pub struct TouchState {
    pub touch_id: i32,
    /// Position in window pixel coordinates
    pub position: (i32, i32),
    /// Position at the previous frame tick
    pub last_position: (i32, i32),
    /// Movement accumulated this frame
    pub delta: (i32, i32),
    pub pressure: f32,
    /// Widget currently under this contact; weak handle, revalidated on use
    pub(crate) touched_element: Option<ElementId>,
}

impl TouchState {
    /// The widget this contact is interacting with, if it still exists
    pub fn touched_element(&self, ui: &dyn UiBackend) -> Option<ElementId> {
        self.touched_element.filter(|&e| ui.is_valid(e))
    }
}

/// What a joystick's inputs are backed by: a physical device or an
/// on-screen widget tree. Exactly one applies per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickSource {
    /// Physical device, by platform enumeration index
    Device { index: u32 },
    /// Virtual joystick whose controls are widgets under `root`
    Screen { root: ElementId },
}

/// State of one joystick or controller device
#[derive(Debug, Clone)]
pub struct JoystickState {
    pub id: JoystickId,
    pub name: String,
    pub(crate) buttons: Vec<bool>,
    pub(crate) button_press: Vec<bool>,
    pub(crate) axes: Vec<f32>,
    pub(crate) hats: Vec<HatPosition>,
    pub(crate) source: JoystickSource,
}

impl JoystickState {
    pub(crate) fn new(id: JoystickId, name: String, source: JoystickSource) -> Self {
        Self {
            id,
            name,
            buttons: Vec::new(),
            button_press: Vec::new(),
            axes: Vec::new(),
            hats: Vec::new(),
            source,
        }
    }

    /// Sizes the value arrays to the device capability counts, all neutral
    pub(crate) fn allocate(&mut self, buttons: usize, axes: usize, hats: usize) {
        self.buttons = vec![false; buttons];
        self.button_press = vec![false; buttons];
        self.axes = vec![0.0; axes];
        self.hats = vec![HatPosition::empty(); hats];
    }

    pub fn num_buttons(&self) -> usize {
        self.buttons.len()
    }

    pub fn num_axes(&self) -> usize {
        self.axes.len()
    }

    pub fn num_hats(&self) -> usize {
        self.hats.len()
    }

    /// Whether a button is currently held; out-of-range reads as released
    pub fn button_down(&self, button: u32) -> bool {
        self.buttons.get(button as usize).copied().unwrap_or(false)
    }

    /// Whether a button was pressed this frame
    pub fn button_press(&self, button: u32) -> bool {
        self.button_press.get(button as usize).copied().unwrap_or(false)
    }

    /// Axis position in [-1, 1]; out-of-range reads as neutral
    pub fn axis(&self, axis: u32) -> f32 {
        self.axes.get(axis as usize).copied().unwrap_or(0.0)
    }

    /// Hat direction mask; out-of-range reads as centered
    pub fn hat(&self, hat: u32) -> HatPosition {
        self.hats.get(hat as usize).copied().unwrap_or(HatPosition::empty())
    }

    pub fn is_screen_joystick(&self) -> bool {
        matches!(self.source, JoystickSource::Screen { .. })
    }

    /// Root widget of a virtual joystick, if this is one
    pub fn screen_root(&self) -> Option<ElementId> {
        match self.source {
            JoystickSource::Screen { root } => Some(root),
            JoystickSource::Device { .. } => None,
        }
    }

    /// Returns buttons and hats to neutral; axes keep their last reading
    pub(crate) fn reset_transient(&mut self) {
        self.buttons.fill(false);
        self.hats.fill(HatPosition::empty());
    }
}

/// Snapshot of all device state for the current frame
#[derive(Default)]
pub struct DeviceState {
    pub(crate) key_down: HashSet<KeyCode>,
    pub(crate) key_press: HashSet<KeyCode>,
    pub(crate) scancode_down: HashSet<Scancode>,
    pub(crate) scancode_press: HashSet<Scancode>,
    pub(crate) mouse_button_down: MouseButton,
    pub(crate) mouse_button_press: MouseButton,
    pub(crate) mouse_move: (i32, i32),
    pub(crate) mouse_move_wheel: i32,
    pub(crate) last_mouse_position: (i32, i32),
    pub(crate) touches: IndexMap<i32, TouchState>,
    pub(crate) joysticks: IndexMap<JoystickId, JoystickState>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every frame-scoped accumulator.
    ///
    /// Runs exactly once per frame tick, before the platform queue is
    /// drained: press sets and masks, mouse move/wheel deltas, joystick
    /// press edges, and touch deltas (stashing each position as previous).
    pub(crate) fn begin_frame(&mut self) {
        self.key_press.clear();
        self.scancode_press.clear();
        self.mouse_button_press = MouseButton::empty();
        self.mouse_move = (0, 0);
        self.mouse_move_wheel = 0;
        for joystick in self.joysticks.values_mut() {
            joystick.button_press.fill(false);
        }
        for touch in self.touches.values_mut() {
            touch.last_position = touch.position;
            touch.delta = (0, 0);
        }
    }

    /// Whether a key is held; the query symbol is normalized like events are
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.key_down.contains(&keys::ascii_uppercase(key))
    }

    /// Whether a key was pressed this frame
    pub fn key_press(&self, key: KeyCode) -> bool {
        self.key_press.contains(&keys::ascii_uppercase(key))
    }

    pub fn scancode_down(&self, scancode: Scancode) -> bool {
        self.scancode_down.contains(&scancode)
    }

    pub fn scancode_press(&self, scancode: Scancode) -> bool {
        self.scancode_press.contains(&scancode)
    }

    /// Whether any button in `mask` is held
    pub fn mouse_button_down(&self, mask: MouseButton) -> bool {
        self.mouse_button_down.intersects(mask)
    }

    /// Whether any button in `mask` was pressed this frame
    pub fn mouse_button_press(&self, mask: MouseButton) -> bool {
        self.mouse_button_press.intersects(mask)
    }

    /// Whether a qualifier class is down, via either physical variant
    pub fn qualifier_down(&self, qualifier: Qualifier) -> bool {
        if qualifier == Qualifier::SHIFT {
            return self.key_down(keys::KEY_LSHIFT) || self.key_down(keys::KEY_RSHIFT);
        }
        if qualifier == Qualifier::CTRL {
            return self.key_down(keys::KEY_LCTRL) || self.key_down(keys::KEY_RCTRL);
        }
        if qualifier == Qualifier::ALT {
            return self.key_down(keys::KEY_LALT) || self.key_down(keys::KEY_RALT);
        }
        false
    }

    /// Whether a qualifier class saw a press edge this frame
    pub fn qualifier_press(&self, qualifier: Qualifier) -> bool {
        if qualifier == Qualifier::SHIFT {
            return self.key_press(keys::KEY_LSHIFT) || self.key_press(keys::KEY_RSHIFT);
        }
        if qualifier == Qualifier::CTRL {
            return self.key_press(keys::KEY_LCTRL) || self.key_press(keys::KEY_RCTRL);
        }
        if qualifier == Qualifier::ALT {
            return self.key_press(keys::KEY_LALT) || self.key_press(keys::KEY_RALT);
        }
        false
    }

    /// Mask of all qualifier classes currently down
    pub fn qualifiers(&self) -> Qualifier {
        let mut mask = Qualifier::empty();
        if self.qualifier_down(Qualifier::SHIFT) {
            mask |= Qualifier::SHIFT;
        }
        if self.qualifier_down(Qualifier::CTRL) {
            mask |= Qualifier::CTRL;
        }
        if self.qualifier_down(Qualifier::ALT) {
            mask |= Qualifier::ALT;
        }
        mask
    }

    pub fn num_touches(&self) -> usize {
        self.touches.len()
    }

    /// Touch contact by position in insertion order.
    ///
    /// The index of a given contact is not stable across contact
    /// additions and removals; use [`TouchState::touch_id`] for identity.
    pub fn touch(&self, index: usize) -> Option<&TouchState> {
        self.touches.get_index(index).map(|(_, touch)| touch)
    }

    pub fn num_joysticks(&self) -> usize {
        self.joysticks.len()
    }

    pub fn joysticks(&self) -> impl Iterator<Item = &JoystickState> {
        self.joysticks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KEY_LSHIFT;

    #[test]
    fn test_begin_frame_clears_edges_only() {
        let mut state = DeviceState::new();
        state.key_down.insert('W' as KeyCode);
        state.key_press.insert('W' as KeyCode);
        state.mouse_button_down = MouseButton::LEFT;
        state.mouse_button_press = MouseButton::LEFT;
        state.mouse_move_wheel = 3;
        state.mouse_move = (5, -2);

        state.begin_frame();

        assert!(state.key_down('W' as KeyCode));
        assert!(!state.key_press('W' as KeyCode));
        assert!(state.mouse_button_down(MouseButton::LEFT));
        assert!(!state.mouse_button_press(MouseButton::LEFT));
        assert_eq!(state.mouse_move_wheel, 0);
        assert_eq!(state.mouse_move, (0, 0));
    }

    #[test]
    fn test_begin_frame_stashes_touch_positions() {
        let mut state = DeviceState::new();
        state.touches.insert(
            7,
            TouchState {
                touch_id: 7,
                position: (40, 50),
                last_position: (10, 10),
                delta: (30, 40),
                pressure: 1.0,
                touched_element: None,
            },
        );

        state.begin_frame();

        let touch = state.touch(0).unwrap();
        assert_eq!(touch.last_position, (40, 50));
        assert_eq!(touch.delta, (0, 0));
    }

    #[test]
    fn test_qualifier_composes_left_and_right() {
        let mut state = DeviceState::new();
        state.key_down.insert(KEY_LSHIFT);
        assert!(state.qualifier_down(Qualifier::SHIFT));
        assert_eq!(state.qualifiers(), Qualifier::SHIFT);
        assert!(!state.qualifier_down(Qualifier::CTRL));
    }

    #[test]
    fn test_joystick_out_of_range_reads_neutral() {
        let mut joystick =
            JoystickState::new(0, "pad".to_string(), JoystickSource::Device { index: 0 });
        joystick.allocate(2, 1, 1);
        assert!(!joystick.button_down(5));
        assert_eq!(joystick.axis(9), 0.0);
        assert_eq!(joystick.hat(3), HatPosition::empty());
    }
}
