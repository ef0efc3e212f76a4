//! Platform boundary: raw events and collaborator traits
//!
//! The input manager never talks to a windowing or UI library directly.
//! The host feeds it [`PlatformEvent`]s in arrival order and supplies the
//! window, UI, and device collaborators as trait objects. Everything the
//! manager needs from the outside world is expressed here, which is also
//! what makes the whole pipeline drivable from tests.

use std::io::{Read, Write};
use std::path::PathBuf;

use crate::screen_joystick::ScreenJoystickLayout;
use crate::state::JoystickId;

/// Platform touch device id
pub type TouchDeviceId = i64;

/// Touch device id reserved for mouse events replayed as synthetic touches;
/// real contact handling must ignore it to avoid double-counting the mouse
pub const TOUCH_MOUSEID: TouchDeviceId = -1;

/// Opaque handle to a UI element owned by the host's widget system
pub type ElementId = u64;

/// Window lifecycle sub-event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEventKind {
    Minimized,
    Maximized,
    Restored,
    Resized,
    FocusGained,
}

/// Raw platform input event, as popped from the platform queue.
///
/// Payloads mirror what the platform reports: key symbols are not yet
/// normalized, touch coordinates are in the [0,1] range, axis values are
/// signed 16-bit. The translator owns all conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    KeyDown { sym: i32, scancode: i32, raw: u32 },
    KeyUp { sym: i32, scancode: i32, raw: u32 },
    TextInput { text: String },
    /// `button` is the platform's 1-based button ordinal
    MouseButtonDown { button: u8 },
    MouseButtonUp { button: u8 },
    MouseMotion { x: i32, y: i32, dx: i32, dy: i32 },
    MouseWheel { delta: i32 },
    FingerDown { device: TouchDeviceId, finger: i64, x: f32, y: f32, pressure: f32 },
    FingerUp { device: TouchDeviceId, finger: i64, x: f32, y: f32 },
    FingerMotion { device: TouchDeviceId, finger: i64, x: f32, y: f32, dx: f32, dy: f32, pressure: f32 },
    GestureRecorded { gesture_id: i64 },
    GestureRecognized { gesture_id: i64, x: f32, y: f32, num_fingers: u32, error: f32 },
    /// Pinch / rotate gesture; `d_theta` is in radians
    MultiGesture { x: f32, y: f32, num_fingers: u32, d_theta: f32, d_dist: f32 },
    /// `index` is the platform's enumeration index, not an instance id
    JoyDeviceAdded { index: u32 },
    JoyDeviceRemoved { id: JoystickId },
    JoyButtonDown { id: JoystickId, button: u32 },
    JoyButtonUp { id: JoystickId, button: u32 },
    JoyAxisMotion { id: JoystickId, axis: u32, value: i16 },
    JoyHatMotion { id: JoystickId, hat: u32, value: u8 },
    ControllerButtonDown { id: JoystickId, button: u32 },
    ControllerButtonUp { id: JoystickId, button: u32 },
    ControllerAxisMotion { id: JoystickId, axis: u32, value: i16 },
    Window { event: WindowEventKind },
    DropFile { path: PathBuf },
    Quit,
}

/// Window and cursor surface owned by the host's display layer
pub trait WindowBackend {
    /// Whether a window handle currently exists; it can vanish mid-frame
    /// if an event handler closes the window
    fn is_open(&self) -> bool;
    fn has_input_focus(&self) -> bool;
    fn has_mouse_focus(&self) -> bool;
    /// Current client area size in pixels
    fn size(&self) -> (i32, i32);
    fn is_fullscreen(&self) -> bool;
    fn toggle_fullscreen(&mut self);
    /// True when the window is embedded in a host application rather than
    /// owned by this process; such windows never grab focus or the cursor
    fn is_external(&self) -> bool;
    /// Platform quirk: re-acquiring the hidden cursor requires a confirmed
    /// click inside the window, not just the focus flag
    fn requires_click_to_refocus(&self) -> bool {
        false
    }
    /// Minimized flag as reported by the platform window
    fn minimized_flag(&self) -> bool;
    fn show_cursor(&mut self, visible: bool);
    fn mouse_position(&self) -> (i32, i32);
    fn warp_mouse(&mut self, x: i32, y: i32);
    /// Viewport adjustment after a platform resize event
    fn resized(&mut self);
    /// Graphics-context restore side channel; some platforms drop GPU
    /// state while backgrounded
    fn restore_context(&mut self) {}
    fn show_screen_keyboard(&mut self, visible: bool);
    fn is_screen_keyboard_shown(&self) -> bool;
    fn has_screen_keyboard_support(&self) -> bool;
}

/// Widget layer queries used by the on-screen joystick
pub trait UiBackend {
    /// Builds the widget tree for a layout, returning its root.
    /// `None` means the layout could not be instantiated (already logged
    /// by the UI layer).
    fn instantiate_layout(
        &mut self,
        layout: &ScreenJoystickLayout,
        style: Option<&str>,
    ) -> Option<ElementId>;
    /// Size of the UI root, used to stretch a joystick layout over the viewport
    fn root_size(&self) -> (i32, i32);
    fn set_size(&mut self, element: ElementId, width: i32, height: i32);
    fn set_visible(&mut self, element: ElementId, visible: bool);
    fn is_visible(&self, element: ElementId) -> bool;
    fn name(&self, element: ElementId) -> String;
    /// Direct children of an element
    fn children(&self, element: ElementId) -> Vec<ElementId>;
    /// All transitive children of an element
    fn descendants(&self, element: ElementId) -> Vec<ElementId>;
    /// Key-binding label text attached to a widget, if any
    fn key_binding_text(&self, element: ElementId) -> Option<String>;
    /// Hides the key-binding label so it is not rendered
    fn hide_binding_label(&mut self, element: ElementId);
    fn set_focusable(&mut self, element: ElementId, focusable: bool);
    /// Top-left corner in screen coordinates
    fn screen_position(&self, element: ElementId) -> (i32, i32);
    fn size_of(&self, element: ElementId) -> (i32, i32);
    /// Topmost element at a screen position
    fn element_at(&self, x: i32, y: i32) -> Option<ElementId>;
    /// Whether a previously obtained handle still refers to a live element
    fn is_valid(&self, element: ElementId) -> bool;
    fn remove(&mut self, element: ElementId);
}

/// Capabilities reported for a newly opened joystick device
#[derive(Debug, Clone)]
pub struct JoystickCaps {
    pub id: JoystickId,
    pub name: String,
    pub buttons: usize,
    pub axes: usize,
    pub hats: usize,
}

/// Physical device layer: joystick enumeration and gesture persistence
pub trait DeviceBackend {
    fn num_joysticks(&self) -> usize;
    /// Opens the device at an enumeration index, reporting its instance id
    /// and capability counts; `None` if the device cannot be opened
    fn open_joystick(&mut self, index: u32) -> Option<JoystickCaps>;
    fn num_touch_devices(&self) -> usize;
    /// Starts gesture recording on all touch devices
    fn record_gesture(&mut self) -> bool;
    /// Serializes all recorded gesture templates; the byte format belongs
    /// to the platform layer and is opaque here
    fn save_gesture_templates(&mut self, dest: &mut dyn Write) -> bool;
    fn save_gesture_template(&mut self, gesture_id: i64, dest: &mut dyn Write) -> bool;
    /// Returns the number of templates loaded
    fn load_gesture_templates(&mut self, source: &mut dyn Read) -> u32;
}
