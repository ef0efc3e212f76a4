//! Event translation: raw platform events into state mutations and
//! notifications
//!
//! Each raw event maps to zero or more device-state mutations plus at most
//! one notification. Mutations that would set "pressed" state are gated on
//! window focus, so a click or keypress that merely refocuses the window is
//! not also interpreted as input; releases are never gated.
//!
//! Translation is reentrant: the on-screen joystick path synthesizes raw
//! events while a touch event is being handled and feeds them straight
//! back through [`InputManager::handle_platform_event`], so synthetic
//! events are fully processed before the tick ends.

use crate::events::InputEvent;
use crate::keys::{self, HatPosition, KeyCode, MouseButton, Scancode};
use crate::manager::InputManager;
use crate::platform::{PlatformEvent, TOUCH_MOUSEID, WindowEventKind};
use crate::screen_joystick::TouchPhase;
use crate::state::TouchState;

/// Raw finger ids are masked into a stable non-negative range
fn touch_id(finger: i64) -> i32 {
    (finger & 0x7ff_ffff) as i32
}

impl InputManager {
    pub(crate) fn handle_platform_event(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::KeyDown { sym, scancode, raw } => {
                self.set_key(keys::normalize_key_code(sym, scancode), scancode, raw, true);
            }

            PlatformEvent::KeyUp { sym, scancode, raw } => {
                self.set_key(keys::normalize_key_code(sym, scancode), scancode, raw, false);
            }

            PlatformEvent::TextInput { text } => {
                if !text.is_empty() {
                    let event = InputEvent::TextInput {
                        text,
                        buttons: self.state.mouse_button_down,
                        qualifiers: self.state.qualifiers(),
                    };
                    self.publish(event);
                }
            }

            PlatformEvent::MouseButtonDown { button } => {
                self.set_mouse_button(MouseButton::from_ordinal(button), true);
            }

            PlatformEvent::MouseButtonUp { button } => {
                self.set_mouse_button(MouseButton::from_ordinal(button), false);
            }

            PlatformEvent::MouseMotion { x, y, dx, dy } => {
                // Captured-mode deltas come from position polling in the
                // frame driver; taking them here too would double-count
                if self.mouse_visible {
                    self.state.mouse_move.0 += dx;
                    self.state.mouse_move.1 += dy;

                    let event = InputEvent::MouseMove {
                        position: Some((x, y)),
                        delta: (dx, dy),
                        buttons: self.state.mouse_button_down,
                        qualifiers: self.state.qualifiers(),
                    };
                    self.publish(event);
                }
            }

            PlatformEvent::MouseWheel { delta } => {
                self.set_mouse_wheel(delta);
            }

            PlatformEvent::FingerDown { device, finger, x, y, pressure } => {
                if device != TOUCH_MOUSEID {
                    let id = touch_id(finger);
                    let (width, height) = self.window.size();
                    let position = ((x * width as f32) as i32, (y * height as f32) as i32);

                    let touch = self.state.touches.entry(id).or_insert_with(|| TouchState {
                        touch_id: id,
                        position,
                        last_position: position,
                        delta: (0, 0),
                        pressure,
                        touched_element: None,
                    });
                    touch.position = position;
                    touch.last_position = position;
                    touch.delta = (0, 0);
                    touch.pressure = pressure;

                    let event = InputEvent::TouchBegin { touch_id: id, position, pressure };
                    self.publish(event);
                    self.route_screen_joystick_touch(TouchPhase::Begin, id);
                }
            }

            PlatformEvent::FingerUp { device, finger, .. } => {
                if device != TOUCH_MOUSEID {
                    let id = touch_id(finger);
                    // The position reported with the up event can be stale;
                    // report the last position stored on the contact
                    if let Some(touch) = self.state.touches.get(&id) {
                        let position = touch.position;
                        let event = InputEvent::TouchEnd { touch_id: id, position };
                        self.publish(event);
                        self.route_screen_joystick_touch(TouchPhase::End, id);
                        self.state.touches.shift_remove(&id);
                    }
                }
            }

            PlatformEvent::FingerMotion { device, finger, x, y, dx, dy, pressure } => {
                if device != TOUCH_MOUSEID {
                    let id = touch_id(finger);
                    let (width, height) = self.window.size();
                    let position = ((x * width as f32) as i32, (y * height as f32) as i32);

                    let touch = self.state.touches.entry(id).or_insert_with(|| TouchState {
                        touch_id: id,
                        position,
                        last_position: position,
                        delta: (0, 0),
                        pressure,
                        touched_element: None,
                    });
                    touch.position = position;
                    touch.delta = (
                        position.0 - touch.last_position.0,
                        position.1 - touch.last_position.1,
                    );
                    touch.pressure = pressure;

                    let event = InputEvent::TouchMove {
                        touch_id: id,
                        position,
                        delta: ((dx * width as f32) as i32, (dy * height as f32) as i32),
                        pressure,
                    };
                    self.publish(event);
                    self.route_screen_joystick_touch(TouchPhase::Move, id);
                }
            }

            PlatformEvent::GestureRecorded { gesture_id } => {
                let event = InputEvent::GestureRecorded { gesture_id };
                self.publish(event);
            }

            PlatformEvent::GestureRecognized { gesture_id, x, y, num_fingers, error } => {
                let (width, height) = self.window.size();
                let event = InputEvent::GestureRecognized {
                    gesture_id,
                    center: ((x * width as f32) as i32, (y * height as f32) as i32),
                    num_fingers,
                    error,
                };
                self.publish(event);
            }

            PlatformEvent::MultiGesture { x, y, num_fingers, d_theta, d_dist } => {
                let (width, height) = self.window.size();
                let event = InputEvent::MultiGesture {
                    center: ((x * width as f32) as i32, (y * height as f32) as i32),
                    num_fingers,
                    d_theta: d_theta.to_degrees(),
                    d_dist,
                };
                self.publish(event);
            }

            PlatformEvent::JoyDeviceAdded { index } => {
                if let Some(id) = self.open_joystick(index) {
                    let event = InputEvent::JoystickConnected { joystick_id: id };
                    self.publish(event);
                }
            }

            PlatformEvent::JoyDeviceRemoved { id } => {
                // May race with live device reports; an unknown id removes
                // nothing but is still announced with the raw id
                self.state.joysticks.shift_remove(&id);
                let event = InputEvent::JoystickDisconnected { joystick_id: id };
                self.publish(event);
            }

            PlatformEvent::JoyButtonDown { id, button } => {
                if let Some(joystick) = self.state.joysticks.get_mut(&id)
                    && (button as usize) < joystick.buttons.len()
                {
                    joystick.buttons[button as usize] = true;
                    joystick.button_press[button as usize] = true;
                    let event = InputEvent::JoystickButtonDown { joystick_id: id, button };
                    self.publish(event);
                }
            }

            PlatformEvent::JoyButtonUp { id, button } => {
                if let Some(joystick) = self.state.joysticks.get_mut(&id)
                    && (button as usize) < joystick.buttons.len()
                {
                    joystick.buttons[button as usize] = false;
                    let event = InputEvent::JoystickButtonUp { joystick_id: id, button };
                    self.publish(event);
                }
            }

            PlatformEvent::JoyAxisMotion { id, axis, value } => {
                let position = (value as f32 / 32767.0).clamp(-1.0, 1.0);
                if let Some(joystick) = self.state.joysticks.get_mut(&id)
                    && (axis as usize) < joystick.axes.len()
                {
                    joystick.axes[axis as usize] = position;
                    let event = InputEvent::JoystickAxisMove { joystick_id: id, axis, position };
                    self.publish(event);
                }
            }

            PlatformEvent::JoyHatMotion { id, hat, value } => {
                let position = HatPosition::from_bits_truncate(value);
                if let Some(joystick) = self.state.joysticks.get_mut(&id)
                    && (hat as usize) < joystick.hats.len()
                {
                    joystick.hats[hat as usize] = position;
                    let event = InputEvent::JoystickHatMove { joystick_id: id, hat, position };
                    self.publish(event);
                }
            }

            PlatformEvent::ControllerButtonDown { id, button } => {
                if let Some(joystick) = self.state.joysticks.get_mut(&id)
                    && (button as usize) < joystick.buttons.len()
                {
                    joystick.buttons[button as usize] = true;
                    joystick.button_press[button as usize] = true;
                    let event = InputEvent::ControllerButtonDown { joystick_id: id, button };
                    self.publish(event);
                }
            }

            PlatformEvent::ControllerButtonUp { id, button } => {
                if let Some(joystick) = self.state.joysticks.get_mut(&id)
                    && (button as usize) < joystick.buttons.len()
                {
                    joystick.buttons[button as usize] = false;
                    let event = InputEvent::ControllerButtonUp { joystick_id: id, button };
                    self.publish(event);
                }
            }

            PlatformEvent::ControllerAxisMotion { id, axis, value } => {
                let position = (value as f32 / 32767.0).clamp(-1.0, 1.0);
                if let Some(joystick) = self.state.joysticks.get_mut(&id)
                    && (axis as usize) < joystick.axes.len()
                {
                    joystick.axes[axis as usize] = position;
                    let event = InputEvent::ControllerAxisMove { joystick_id: id, axis, position };
                    self.publish(event);
                }
            }

            PlatformEvent::Window { event } => match event {
                WindowEventKind::Minimized => {
                    self.minimized = true;
                    self.send_focus_event();
                }
                WindowEventKind::Maximized | WindowEventKind::Restored => {
                    self.minimized = false;
                    self.send_focus_event();
                }
                WindowEventKind::Resized => {
                    self.window.resized();
                }
                WindowEventKind::FocusGained => {
                    self.window.restore_context();
                }
            },

            PlatformEvent::DropFile { path } => {
                let event = InputEvent::DropFile { path };
                self.publish(event);
            }

            PlatformEvent::Quit => {
                self.publish(InputEvent::ExitRequested);
            }
        }
    }

    pub(crate) fn set_key(&mut self, key: KeyCode, scancode: Scancode, raw: u32, new_state: bool) {
        // A keypress that merely refocuses the window must not register
        if !self.window.is_external() && new_state && !self.input_focus {
            return;
        }

        let mut repeat = false;

        if new_state {
            self.state.scancode_down.insert(scancode);
            self.state.scancode_press.insert(scancode);

            if self.state.key_down.insert(key) {
                self.state.key_press.insert(key);
            } else {
                repeat = true;
            }
        } else {
            self.state.scancode_down.remove(&scancode);

            // Release of a key that was never marked down (e.g. pressed
            // while unfocused) stays invisible
            if !self.state.key_down.remove(&key) {
                return;
            }
        }

        let buttons = self.state.mouse_button_down;
        let qualifiers = self.state.qualifiers();
        let event = if new_state {
            InputEvent::KeyDown { key, scancode, raw, buttons, qualifiers, repeat }
        } else {
            InputEvent::KeyUp { key, scancode, raw, buttons, qualifiers }
        };
        self.publish(event);

        if (key == keys::KEY_RETURN || key == keys::KEY_RETURN2 || key == keys::KEY_KP_ENTER)
            && new_state
            && !repeat
            && self.toggle_fullscreen
            && (self.key_down(keys::KEY_LALT) || self.key_down(keys::KEY_RALT))
        {
            self.window.toggle_fullscreen();
        }
    }

    pub(crate) fn set_mouse_button(&mut self, button: MouseButton, new_state: bool) {
        if button.is_empty() {
            return;
        }

        if self.window.requires_click_to_refocus()
            && !self.mouse_visible
            && !self.window.is_fullscreen()
            && !self.input_focus
            && new_state
            && button == MouseButton::LEFT
        {
            self.focused_this_frame = true;
        }

        // A click that merely refocuses the window must not register
        if !self.window.is_external() && new_state && !self.input_focus {
            return;
        }

        if new_state {
            // Repeat without an intervening release: no transition
            if self.state.mouse_button_down.contains(button) {
                return;
            }
            self.state.mouse_button_press |= button;
            self.state.mouse_button_down |= button;
        } else {
            if !self.state.mouse_button_down.intersects(button) {
                return;
            }
            self.state.mouse_button_down &= !button;
        }

        let buttons = self.state.mouse_button_down;
        let qualifiers = self.state.qualifiers();
        let event = if new_state {
            InputEvent::MouseButtonDown { button, buttons, qualifiers }
        } else {
            InputEvent::MouseButtonUp { button, buttons, qualifiers }
        };
        self.publish(event);
    }

    pub(crate) fn set_mouse_wheel(&mut self, delta: i32) {
        if !self.window.is_external() && !self.input_focus {
            return;
        }

        if delta != 0 {
            self.state.mouse_move_wheel += delta;

            let event = InputEvent::MouseWheel {
                wheel: delta,
                buttons: self.state.mouse_button_down,
                qualifiers: self.state.qualifiers(),
            };
            self.publish(event);
        }
    }
}
