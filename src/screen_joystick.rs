//! On-screen (virtual) joystick
//!
//! Builds a joystick device whose buttons and directional hat are widgets
//! in a touch-driven screen layout, and translates touch interaction with
//! those widgets into the same raw event shapes the translator already
//! understands. The synthesizer is a producer for the event translator,
//! not a separate state machine: synthetic events are fed back through
//! [`InputManager::handle_platform_event`] and processed within the same
//! call stack as the touch event that caused them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::keys::{self, HatPosition, KeyCode, KeyNameTable};
use crate::manager::InputManager;
use crate::platform::{ElementId, PlatformEvent};
use crate::state::{JoystickId, JoystickSource, JoystickState};

/// First instance id handed out to screen joysticks; chosen far above any
/// realistic physical device count so the id spaces never collide
pub const SCREEN_JOYSTICK_START_ID: JoystickId = 1000;

/// Hat key binding used when a layout's binding text cannot be parsed:
/// up, down, left, right
const HAT_FALLBACK_BINDING: [KeyCode; 4] =
    ['W' as KeyCode, 'S' as KeyCode, 'A' as KeyCode, 'D' as KeyCode];

/// Failure to create a screen joystick
#[derive(Debug, Error)]
pub enum ScreenJoystickError {
    /// The input manager has no window surface yet
    #[error("no window surface available")]
    NoSurface,
    /// The UI layer could not instantiate the layout
    #[error("screen joystick layout could not be instantiated")]
    LayoutLoad,
}

/// Descriptor for a screen joystick widget tree.
///
/// Loaded by the host's resource layer from any serde format, or built in
/// code; the widget naming convention carries the control semantics:
/// `ButtonN` widgets act as joystick buttons, `HatN` widgets as a
/// four-direction pad, `AxisN` widgets are reserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenJoystickLayout {
    pub name: String,
    pub widgets: Vec<WidgetLayout>,
}

/// One widget in a screen joystick layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetLayout {
    pub name: String,
    /// Top-left corner in layout coordinates
    pub position: (i32, i32),
    pub size: (i32, i32),
    /// Key binding text: a single character, a named key, or for hats
    /// four characters / four space-separated names
    #[serde(default)]
    pub key_binding: Option<String>,
}

impl ScreenJoystickLayout {
    /// Built-in layout used when the host supplies none: a four-way hat
    /// on the left, two action buttons on the right
    pub fn default_gamepad() -> Self {
        Self {
            name: "ScreenJoystick".to_string(),
            widgets: vec![
                WidgetLayout {
                    name: "Hat0".to_string(),
                    position: (20, 360),
                    size: (120, 120),
                    key_binding: Some("WSAD".to_string()),
                },
                WidgetLayout {
                    name: "Button0".to_string(),
                    position: (480, 380),
                    size: (80, 80),
                    key_binding: None,
                },
                WidgetLayout {
                    name: "Button1".to_string(),
                    position: (580, 340),
                    size: (80, 80),
                    key_binding: None,
                },
            ],
        }
    }
}

/// Phase of a touch interaction as routed to the screen joystick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TouchPhase {
    Begin,
    Move,
    End,
}

/// Control metadata attached to a widget of a screen joystick
#[derive(Debug, Clone)]
pub(crate) struct ScreenWidget {
    pub joystick_id: JoystickId,
    pub kind: ScreenWidgetKind,
}

#[derive(Debug, Clone)]
pub(crate) enum ScreenWidgetKind {
    /// Binary control: emits key events when bound, joystick button
    /// events otherwise
    Button { index: u32, key: Option<KeyCode> },
    /// Four-direction pad; `last_key` tracks the key currently held by a
    /// bound hat so drags can release it (0 = none)
    Hat { index: u32, keys: Option<[KeyCode; 4]>, last_key: KeyCode },
}

/// Resolves a button key-binding text; unsupported names are logged and
/// ignored so the button falls back to joystick button events
fn resolve_button_binding(text: &str, table: &KeyNameTable) -> Option<KeyCode> {
    match table.key_from_name(text) {
        Some(key) => Some(key),
        None => {
            error!(binding = %text, "Unsupported key binding");
            None
        }
    }
}

/// Resolves a hat binding to exactly four key codes (up, down, left,
/// right). Any malformed binding falls back to the fixed WSAD mapping.
fn resolve_hat_binding(widget: &str, text: &str, table: &KeyNameTable) -> [KeyCode; 4] {
    if text.contains(' ') {
        // e.g. "UP DOWN LEFT RIGHT"
        let tokens: Vec<&str> = text.split(' ').collect();
        if tokens.len() == 4 {
            let mut bindings = [0; 4];
            let mut resolved = true;
            for (slot, token) in bindings.iter_mut().zip(&tokens) {
                match table.key_from_name(token) {
                    Some(key) => *slot = key,
                    None => {
                        resolved = false;
                        break;
                    }
                }
            }
            if resolved {
                return bindings;
            }
        }
    } else {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() == 4 {
            return [
                chars[0] as KeyCode,
                chars[1] as KeyCode,
                chars[2] as KeyCode,
                chars[3] as KeyCode,
            ];
        }
    }

    error!(widget = %widget, binding = %text, "Invalid hat key binding, falling back to WSAD");
    HAT_FALLBACK_BINDING
}

/// Direction mask for a touch offset from the hat center.
///
/// The deadzone is anisotropic: a direction registers only when the
/// offset along its axis clearly dominates (1.5x) the cross-axis offset.
fn hat_direction_mask(rel: (i32, i32)) -> HatPosition {
    let (x, y) = rel;
    let mut mask = HatPosition::empty();
    if y < 0 && (x * 3 / 2).abs() < y.abs() {
        mask |= HatPosition::UP;
    }
    if y > 0 && (x * 3 / 2).abs() < y.abs() {
        mask |= HatPosition::DOWN;
    }
    if x < 0 && (y * 3 / 2).abs() < x.abs() {
        mask |= HatPosition::LEFT;
    }
    if x > 0 && (y * 3 / 2).abs() < x.abs() {
        mask |= HatPosition::RIGHT;
    }
    mask
}

/// Reduces the same directional computation to one of the four bound keys
fn hat_key(rel: (i32, i32), bindings: &[KeyCode; 4]) -> Option<KeyCode> {
    let (x, y) = rel;
    if y < 0 && (x * 3 / 2).abs() < y.abs() {
        Some(bindings[0])
    } else if y > 0 && (x * 3 / 2).abs() < y.abs() {
        Some(bindings[1])
    } else if x < 0 && (y * 3 / 2).abs() < x.abs() {
        Some(bindings[2])
    } else if x > 0 && (y * 3 / 2).abs() < x.abs() {
        Some(bindings[3])
    } else {
        None
    }
}

impl InputManager {
    /// Creates a screen joystick from a layout descriptor (or the built-in
    /// default) and returns its device id.
    ///
    /// Button and hat widgets carrying key-binding text are resolved to
    /// logical key codes; widgets without a binding emit joystick events.
    /// All descendant widgets are made non-focusable so they never
    /// intercept generic UI focus.
    pub fn add_screen_joystick(
        &mut self,
        layout: Option<&ScreenJoystickLayout>,
        style: Option<&str>,
    ) -> Result<JoystickId, ScreenJoystickError> {
        if !self.initialized {
            warn!("Cannot add screen joystick without a window surface");
            return Err(ScreenJoystickError::NoSurface);
        }

        let default_layout;
        let layout = match layout {
            Some(layout) => layout,
            None => {
                default_layout = ScreenJoystickLayout::default_gamepad();
                &default_layout
            }
        };

        // Instantiation failure is already logged by the UI layer
        let Some(root) = self.ui.instantiate_layout(layout, style) else {
            return Err(ScreenJoystickError::LayoutLoad);
        };

        let (root_width, root_height) = self.ui.root_size();
        self.ui.set_size(root, root_width, root_height);
        // Shown when the joystick is opened later
        self.ui.set_visible(root, false);

        let id = SCREEN_JOYSTICK_START_ID + self.state.joysticks.len() as JoystickId;

        let mut num_buttons = 0;
        let mut num_axes = 0;
        let mut num_hats = 0;

        for child in self.ui.children(root) {
            let name = self.ui.name(child);
            if let Some(index_text) = name.strip_prefix("Button") {
                num_buttons += 1;

                let index: u32 = index_text.parse().unwrap_or(0);
                let key = match self.ui.key_binding_text(child) {
                    Some(text) => {
                        self.ui.hide_binding_label(child);
                        resolve_button_binding(&text, &self.key_table)
                    }
                    None => None,
                };
                self.screen_widgets.insert(
                    child,
                    ScreenWidget {
                        joystick_id: id,
                        kind: ScreenWidgetKind::Button { index, key },
                    },
                );
            } else if name.starts_with("Axis") {
                num_axes += 1;
                warn!(widget = %name, "Axis emulation for screen joysticks is not supported yet");
            } else if let Some(index_text) = name.strip_prefix("Hat") {
                num_hats += 1;

                let index: u32 = index_text.parse().unwrap_or(0);
                let hat_keys = match self.ui.key_binding_text(child) {
                    Some(text) => {
                        self.ui.hide_binding_label(child);
                        Some(resolve_hat_binding(&name, &text, &self.key_table))
                    }
                    None => None,
                };
                self.screen_widgets.insert(
                    child,
                    ScreenWidget {
                        joystick_id: id,
                        kind: ScreenWidgetKind::Hat { index, keys: hat_keys, last_key: 0 },
                    },
                );
            }
        }

        // The joystick widgets must never be considered active UI input
        // controls by the application
        for element in self.ui.descendants(root) {
            self.ui.set_focusable(element, false);
        }

        let mut joystick =
            JoystickState::new(id, layout.name.clone(), JoystickSource::Screen { root });
        joystick.allocate(num_buttons, num_axes, num_hats);
        self.state.joysticks.insert(id, joystick);

        Ok(id)
    }

    /// Removes a screen joystick by device id.
    ///
    /// Fails if the id is unknown or belongs to a physical device.
    pub fn remove_screen_joystick(&mut self, id: JoystickId) -> bool {
        let Some(joystick) = self.state.joysticks.get(&id) else {
            error!(id, "Cannot remove screen joystick: unknown joystick id");
            return false;
        };
        let Some(root) = joystick.screen_root() else {
            error!(id, "Cannot remove joystick: not a screen joystick");
            return false;
        };

        self.ui.remove(root);
        self.screen_widgets.retain(|_, widget| widget.joystick_id != id);
        self.state.joysticks.shift_remove(&id);

        true
    }

    /// Routes a touch notification to the screen joystick widget under it
    /// and feeds the resulting synthetic events back through the
    /// translator.
    pub(crate) fn route_screen_joystick_touch(&mut self, phase: TouchPhase, touch_id: i32) {
        if self.screen_widgets.is_empty() {
            return;
        }

        let Some(touch) = self.state.touches.get(&touch_id) else {
            return;
        };
        let position = touch.position;

        // Begin hit-tests at the touch position; move and end keep routing
        // to the previously touched widget so a drag can leave it without
        // losing the interaction
        let element = match phase {
            TouchPhase::Begin => self.ui.element_at(position.0, position.1),
            TouchPhase::Move | TouchPhase::End => touch.touched_element(self.ui.as_ref()),
        };
        let Some(element) = element else {
            return;
        };
        let Some(widget) = self.screen_widgets.get(&element).cloned() else {
            return;
        };

        if let Some(touch) = self.state.touches.get_mut(&touch_id) {
            touch.touched_element = if phase == TouchPhase::End { None } else { Some(element) };
        }

        let mut synthetic: Vec<PlatformEvent> = Vec::new();

        match widget.kind {
            ScreenWidgetKind::Button { index, key } => {
                // Directional motion on a button widget is ignored
                if phase == TouchPhase::Move {
                    return;
                }
                let down = phase == TouchPhase::Begin;
                match key {
                    None => synthetic.push(if down {
                        PlatformEvent::JoyButtonDown { id: widget.joystick_id, button: index }
                    } else {
                        PlatformEvent::JoyButtonUp { id: widget.joystick_id, button: index }
                    }),
                    Some(sym) => synthetic.push(if down {
                        PlatformEvent::KeyDown { sym, scancode: keys::SCANCODE_UNKNOWN, raw: 0 }
                    } else {
                        PlatformEvent::KeyUp { sym, scancode: keys::SCANCODE_UNKNOWN, raw: 0 }
                    }),
                }
            }

            ScreenWidgetKind::Hat { index, keys: None, .. } => {
                let value = if phase == TouchPhase::End {
                    HatPosition::empty()
                } else {
                    hat_direction_mask(self.relative_to_center(element, position))
                };
                synthetic.push(PlatformEvent::JoyHatMotion {
                    id: widget.joystick_id,
                    hat: index,
                    value: value.bits(),
                });
            }

            ScreenWidgetKind::Hat { keys: Some(bindings), last_key, .. } => {
                if phase == TouchPhase::End {
                    // Lifting releases whichever key was last active
                    if last_key == 0 {
                        return;
                    }
                    self.set_hat_last_key(element, 0);
                    synthetic.push(PlatformEvent::KeyUp {
                        sym: last_key,
                        scancode: keys::SCANCODE_UNKNOWN,
                        raw: 0,
                    });
                } else {
                    let rel = self.relative_to_center(element, position);
                    let Some(sym) = hat_key(rel, &bindings) else {
                        // Inside the center deadzone
                        return;
                    };

                    // Dragging across a directional boundary releases the
                    // previous key before the new press
                    if phase == TouchPhase::Move && sym != last_key && last_key != 0 {
                        synthetic.push(PlatformEvent::KeyUp {
                            sym: last_key,
                            scancode: keys::SCANCODE_UNKNOWN,
                            raw: 0,
                        });
                    }

                    self.set_hat_last_key(element, sym);
                    synthetic.push(PlatformEvent::KeyDown {
                        sym,
                        scancode: keys::SCANCODE_UNKNOWN,
                        raw: 0,
                    });
                }
            }
        }

        for event in synthetic {
            self.handle_platform_event(event);
        }
    }

    /// Touch offset relative to a widget's center
    fn relative_to_center(&self, element: ElementId, position: (i32, i32)) -> (i32, i32) {
        let (x, y) = self.ui.screen_position(element);
        let (width, height) = self.ui.size_of(element);
        (position.0 - x - width / 2, position.1 - y - height / 2)
    }

    fn set_hat_last_key(&mut self, element: ElementId, key: KeyCode) {
        if let Some(widget) = self.screen_widgets.get_mut(&element)
            && let ScreenWidgetKind::Hat { last_key, .. } = &mut widget.kind
        {
            *last_key = key;
        }
    }
}
