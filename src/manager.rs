//! Input manager: per-frame driver, focus handling, and the query surface
//!
//! One explicitly constructed context object owned by the host application.
//! The host pushes raw platform events into the manager's queue as they
//! arrive and calls [`InputManager::update`] once per frame tick; queries
//! are answered from the device state store, notifications go out through
//! the event bus.

use std::collections::{HashMap, VecDeque};

use tracing::{error, info};

use crate::config::InputConfig;
use crate::events::{EventBus, EventSink, InputEvent};
use crate::keys::{self, KeyCode, KeyNameTable, MouseButton, Qualifier, Scancode};
use crate::platform::{
    DeviceBackend, ElementId, JoystickCaps, PlatformEvent, UiBackend, WindowBackend,
};
use crate::screen_joystick::{ScreenWidget, TouchPhase};
use crate::state::{DeviceState, JoystickId, JoystickSource, JoystickState, TouchState};

/// The input subsystem context.
///
/// Single-threaded by design: all state mutation happens synchronously
/// inside [`update`](Self::update) on the thread that calls it. Handling
/// one event may synthesize and translate further events within the same
/// call stack (the on-screen joystick path), so translation is reentrant
/// but never concurrent.
pub struct InputManager {
    pub(crate) window: Box<dyn WindowBackend>,
    pub(crate) ui: Box<dyn UiBackend>,
    pub(crate) devices: Box<dyn DeviceBackend>,
    pub(crate) bus: EventBus,
    pub(crate) queue: VecDeque<PlatformEvent>,
    pub(crate) state: DeviceState,
    pub(crate) key_table: KeyNameTable,
    /// Metadata for widgets acting as virtual joystick controls
    pub(crate) screen_widgets: HashMap<ElementId, ScreenWidget>,
    pub(crate) mouse_visible: bool,
    pub(crate) toggle_fullscreen: bool,
    pub(crate) input_focus: bool,
    pub(crate) minimized: bool,
    pub(crate) focused_this_frame: bool,
    pub(crate) suppress_next_mouse_move: bool,
    pub(crate) initialized: bool,
}

impl InputManager {
    /// Creates the input manager and initializes it immediately if the
    /// window surface already exists; otherwise initialization is retried
    /// on the first screen mode change.
    pub fn new(
        config: &InputConfig,
        window: Box<dyn WindowBackend>,
        ui: Box<dyn UiBackend>,
        devices: Box<dyn DeviceBackend>,
    ) -> Self {
        let mut manager = Self {
            window,
            ui,
            devices,
            bus: EventBus::new(),
            queue: VecDeque::new(),
            state: DeviceState::new(),
            key_table: KeyNameTable::new(),
            screen_widgets: HashMap::new(),
            mouse_visible: config.mouse_visible,
            toggle_fullscreen: config.toggle_fullscreen,
            input_focus: false,
            minimized: false,
            focused_this_frame: false,
            suppress_next_mouse_move: false,
            initialized: false,
        };
        manager.initialize();
        manager
    }

    /// Registers a notification subscriber
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.bus.subscribe(sink);
    }

    /// Appends a raw platform event to this frame's queue
    pub fn queue_event(&mut self, event: PlatformEvent) {
        self.queue.push_back(event);
    }

    pub fn queue_events(&mut self, events: impl IntoIterator<Item = PlatformEvent>) {
        self.queue.extend(events);
    }

    /// Runs one frame tick.
    ///
    /// Clears frame-scoped accumulators, drains the platform queue in
    /// arrival order, evaluates focus transitions, and computes the
    /// relative mouse move (recentering the hidden cursor so deltas are
    /// measured against a fixed reference).
    pub fn update(&mut self) {
        if !self.initialized {
            return;
        }

        self.state.begin_frame();

        while let Some(event) = self.queue.pop_front() {
            self.handle_platform_event(event);
        }

        // A handler invoked during the drain may have closed the window
        if !self.window.is_open() {
            return;
        }

        let input_focus = self.window.has_input_focus();
        let mouse_focus = self.window.has_mouse_focus();

        if self.window.requires_click_to_refocus() {
            // Dragging the title bar must not re-capture the cursor, so
            // re-acquisition waits for confirmed focus and mouse focus
            if !self.input_focus
                && (self.window.is_fullscreen() || self.mouse_visible)
                && input_focus
                && mouse_focus
            {
                self.focused_this_frame = true;
            }
        } else if !self.input_focus && input_focus {
            self.focused_this_frame = true;
        }

        if self.focused_this_frame {
            self.gain_focus();
        }

        if self.input_focus && !input_focus {
            self.lose_focus();
        }

        // Relative mode mouse move: external windows always, otherwise
        // only while the hidden cursor is captured inside a focused window
        if self.window.is_external() || (!self.mouse_visible && self.input_focus && mouse_focus) {
            let position = self.mouse_position();
            let delta = (
                position.0 - self.state.last_mouse_position.0,
                position.1 - self.state.last_mouse_position.1,
            );

            if self.window.is_external() {
                self.state.last_mouse_position = position;
            } else {
                let (width, height) = self.window.size();
                let center = (width / 2, height / 2);
                if position != center {
                    self.window.warp_mouse(center.0, center.1);
                    self.state.last_mouse_position = center;
                }
            }

            if delta != (0, 0) {
                if self.suppress_next_mouse_move {
                    // The recentering warp itself must stay invisible
                    self.suppress_next_mouse_move = false;
                } else {
                    self.state.mouse_move = delta;
                    let event = InputEvent::MouseMove {
                        position: self.mouse_visible.then_some(position),
                        delta,
                        buttons: self.state.mouse_button_down,
                        qualifiers: self.state.qualifiers(),
                    };
                    self.publish(event);
                }
            }
        }
    }

    fn initialize(&mut self) {
        if !self.window.is_open() {
            return;
        }

        // External windows can only support a visible cursor
        if self.window.is_external() {
            self.mouse_visible = true;
        }

        self.focused_this_frame = true;
        self.initialized = true;

        self.reset_joysticks();
        self.reset_state();

        info!("Input manager initialized");
    }

    fn reset_joysticks(&mut self) {
        self.state.joysticks.clear();
        for index in 0..self.devices.num_joysticks() {
            self.open_joystick(index as u32);
        }
    }

    /// Opens the physical joystick at an enumeration index.
    ///
    /// Returns its instance id; value arrays are sized to the reported
    /// capability counts and initialized to neutral.
    pub fn open_joystick(&mut self, index: u32) -> Option<JoystickId> {
        let Some(caps) = self.devices.open_joystick(index) else {
            error!(index, "Cannot open joystick");
            return None;
        };
        let JoystickCaps { id, name, buttons, axes, hats } = caps;
        let mut joystick = JoystickState::new(id, name, JoystickSource::Device { index });
        joystick.allocate(buttons, axes, hats);
        self.state.joysticks.insert(id, joystick);
        Some(id)
    }

    pub(crate) fn gain_focus(&mut self) {
        self.reset_state();

        self.input_focus = true;
        self.focused_this_frame = false;

        // Re-establish cursor hiding as necessary
        if !self.mouse_visible {
            self.window.show_cursor(false);
            self.suppress_next_mouse_move = true;
        } else {
            self.state.last_mouse_position = self.mouse_position();
        }

        self.send_focus_event();
    }

    pub(crate) fn lose_focus(&mut self) {
        self.reset_state();

        self.input_focus = false;
        self.focused_this_frame = false;

        // Show the cursor while inactive
        self.window.show_cursor(true);

        self.send_focus_event();
    }

    /// Clears all transient device state.
    ///
    /// Still-open touch contacts synthesize an end notification before
    /// being dropped, and held mouse buttons release through the regular
    /// mutation path so subscribers see the transitions.
    pub(crate) fn reset_state(&mut self) {
        self.state.key_down.clear();
        self.state.key_press.clear();
        self.state.scancode_down.clear();
        self.state.scancode_press.clear();

        for joystick in self.state.joysticks.values_mut() {
            joystick.reset_transient();
        }

        // End still-open touch contacts instead of silently dropping them.
        // Routing the end through the screen joystick clears its drag
        // bookkeeping; the resulting key releases find the key sets already
        // empty and stay silent.
        let touch_ids: Vec<i32> = self.state.touches.keys().copied().collect();
        for id in touch_ids {
            if let Some(touch) = self.state.touches.get(&id) {
                let event = InputEvent::TouchEnd {
                    touch_id: touch.touch_id,
                    position: touch.position,
                };
                self.publish(event);
            }
            self.route_screen_joystick_touch(TouchPhase::End, id);
            self.state.touches.shift_remove(&id);
        }

        self.set_mouse_button(MouseButton::LEFT, false);
        self.set_mouse_button(MouseButton::RIGHT, false);
        self.set_mouse_button(MouseButton::MIDDLE, false);

        self.state.mouse_move = (0, 0);
        self.state.mouse_move_wheel = 0;
        self.state.mouse_button_press = MouseButton::empty();
    }

    pub(crate) fn send_focus_event(&mut self) {
        let event = InputEvent::InputFocus {
            focused: self.has_focus(),
            minimized: self.is_minimized(),
        };
        self.publish(event);
    }

    pub(crate) fn publish(&mut self, event: InputEvent) {
        self.bus.publish(&event);
    }

    /// Shows or hides the OS cursor; hiding enables captured mouse mode
    pub fn set_mouse_visible(&mut self, enable: bool) {
        if enable == self.mouse_visible {
            return;
        }
        self.mouse_visible = enable;

        if self.initialized {
            if self.window.is_external() {
                self.mouse_visible = true;
                return;
            }

            if !self.mouse_visible && self.input_focus {
                self.window.show_cursor(false);
                // Recenter when hiding to avoid one frame of erratic delta
                let (width, height) = self.window.size();
                let center = (width / 2, height / 2);
                self.window.warp_mouse(center.0, center.1);
                self.state.last_mouse_position = center;
            } else {
                self.window.show_cursor(true);
            }
        }

        let event = InputEvent::MouseVisibleChanged { visible: self.mouse_visible };
        self.publish(event);
    }

    pub fn is_mouse_visible(&self) -> bool {
        self.mouse_visible
    }

    /// Enables or disables the Alt+Enter fullscreen toggle
    pub fn set_toggle_fullscreen(&mut self, enable: bool) {
        self.toggle_fullscreen = enable;
    }

    pub fn toggle_fullscreen_enabled(&self) -> bool {
        self.toggle_fullscreen
    }

    /// Re-syncs input after the host changed screen mode (resolution,
    /// fullscreen, window recreation)
    pub fn screen_mode_changed(&mut self) {
        if !self.initialized {
            self.initialize();
        } else {
            self.reset_state();
        }
        if !self.initialized {
            return;
        }

        // Re-center the hidden cursor against the new screen size so no
        // erroneous move is reported
        if !self.mouse_visible {
            let (width, height) = self.window.size();
            let center = (width / 2, height / 2);
            self.window.warp_mouse(center.0, center.1);
            self.state.last_mouse_position = center;
        }

        self.focused_this_frame = true;
        self.minimized = self.window.minimized_flag();
    }

    pub fn has_focus(&self) -> bool {
        self.input_focus
    }

    /// Minimized for feature-gating purposes; a fullscreen window that
    /// lost focus counts as minimized even if the platform flag disagrees
    pub fn is_minimized(&self) -> bool {
        if !self.input_focus && self.initialized && self.window.is_fullscreen() {
            true
        } else {
            self.minimized
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Read-only view of the device state store
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn key_down(&self, key: KeyCode) -> bool {
        self.state.key_down(key)
    }

    pub fn key_press(&self, key: KeyCode) -> bool {
        self.state.key_press(key)
    }

    pub fn scancode_down(&self, scancode: Scancode) -> bool {
        self.state.scancode_down(scancode)
    }

    pub fn scancode_press(&self, scancode: Scancode) -> bool {
        self.state.scancode_press(scancode)
    }

    pub fn mouse_button_down(&self, mask: MouseButton) -> bool {
        self.state.mouse_button_down(mask)
    }

    pub fn mouse_button_press(&self, mask: MouseButton) -> bool {
        self.state.mouse_button_press(mask)
    }

    pub fn qualifier_down(&self, qualifier: Qualifier) -> bool {
        self.state.qualifier_down(qualifier)
    }

    pub fn qualifier_press(&self, qualifier: Qualifier) -> bool {
        self.state.qualifier_press(qualifier)
    }

    pub fn qualifiers(&self) -> Qualifier {
        self.state.qualifiers()
    }

    pub fn key_from_name(&self, name: &str) -> Option<KeyCode> {
        self.key_table.key_from_name(name)
    }

    pub fn key_name(&self, key: KeyCode) -> String {
        self.key_table.key_name(key)
    }

    pub fn key_from_scancode(&self, scancode: Scancode) -> KeyCode {
        keys::key_from_scancode(scancode)
    }

    pub fn scancode_from_key(&self, key: KeyCode) -> Scancode {
        keys::scancode_from_key(key)
    }

    pub fn scancode_from_name(&self, name: &str) -> Scancode {
        self.key_table
            .key_from_name(name)
            .map_or(keys::SCANCODE_UNKNOWN, keys::scancode_from_key)
    }

    pub fn scancode_name(&self, scancode: Scancode) -> String {
        self.key_table.key_name(keys::key_from_scancode(scancode))
    }

    /// Current cursor position in window coordinates, queried live from
    /// the window; neutral before initialization
    pub fn mouse_position(&self) -> (i32, i32) {
        if !self.initialized {
            return (0, 0);
        }
        self.window.mouse_position()
    }

    /// Mouse movement accumulated this frame
    pub fn mouse_move(&self) -> (i32, i32) {
        self.state.mouse_move
    }

    /// Wheel movement accumulated this frame
    pub fn mouse_move_wheel(&self) -> i32 {
        self.state.mouse_move_wheel
    }

    pub fn num_touches(&self) -> usize {
        self.state.num_touches()
    }

    pub fn touch(&self, index: usize) -> Option<&TouchState> {
        self.state.touch(index)
    }

    /// Number of currently open joystick devices, physical and virtual
    pub fn num_joysticks(&self) -> usize {
        self.state.num_joysticks()
    }

    /// Joystick by instance id.
    ///
    /// A virtual joystick whose widget tree was hidden is re-opened
    /// (made visible) by the lookup.
    pub fn joystick(&mut self, id: JoystickId) -> Option<&JoystickState> {
        let hidden_root = self
            .state
            .joysticks
            .get(&id)
            .and_then(|joystick| joystick.screen_root())
            .filter(|&root| !self.ui.is_visible(root));
        if let Some(root) = hidden_root {
            self.ui.set_visible(root, true);
        }
        self.state.joysticks.get(&id)
    }

    pub fn joystick_name(&self, id: JoystickId) -> Option<&str> {
        self.state.joysticks.get(&id).map(|joystick| joystick.name.as_str())
    }

    /// Shows or hides the platform's on-screen keyboard
    pub fn set_screen_keyboard_visible(&mut self, enable: bool) {
        if !self.initialized {
            return;
        }
        if enable != self.is_screen_keyboard_visible() {
            self.window.show_screen_keyboard(enable);
        }
    }

    pub fn is_screen_keyboard_visible(&self) -> bool {
        self.initialized && self.window.is_screen_keyboard_shown()
    }

    pub fn screen_keyboard_support(&self) -> bool {
        self.initialized && self.window.has_screen_keyboard_support()
    }
}
