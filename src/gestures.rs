//! Touch gesture recording and persistence
//!
//! Recording and template storage are delegated to the platform's device
//! layer; templates move through plain byte streams and their format is
//! opaque to the input manager.

use std::io::{Read, Write};

use tracing::error;

use crate::manager::InputManager;

impl InputManager {
    /// Starts recording a gesture on all touch devices
    pub fn record_gesture(&mut self) -> bool {
        if self.devices.num_touch_devices() == 0 {
            error!("Cannot record gesture: no touch devices");
            return false;
        }
        self.devices.record_gesture()
    }

    /// Saves all recorded gesture templates to a byte stream
    pub fn save_gestures(&mut self, dest: &mut dyn Write) -> bool {
        self.devices.save_gesture_templates(dest)
    }

    /// Saves a single gesture template to a byte stream
    pub fn save_gesture(&mut self, dest: &mut dyn Write, gesture_id: i64) -> bool {
        self.devices.save_gesture_template(gesture_id, dest)
    }

    /// Loads gesture templates from a byte stream, returning how many
    /// were loaded
    pub fn load_gestures(&mut self, source: &mut dyn Read) -> u32 {
        if self.devices.num_touch_devices() == 0 {
            error!("Cannot load gestures: no touch devices");
            return 0;
        }
        self.devices.load_gesture_templates(source)
    }
}
