//! Input manager configuration
//!
//! Supports multiple profiles (debug, release) with different settings.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Host-tunable input behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    /// Whether the OS cursor starts visible; hidden enables captured
    /// (relative) mouse mode while the window is focused
    pub mouse_visible: bool,
    /// Whether Alt+Enter toggles fullscreen
    pub toggle_fullscreen: bool,
}

impl InputConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Profiles are loaded from config files in the following order:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{profile}.toml (profile-specific overrides)
    /// 3. Environment variables with prefix EDDY_ (e.g., EDDY_MOUSE_VISIBLE=true)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", profile)).required(false))
            .add_source(
                Environment::with_prefix("EDDY")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override("profile", profile)?
            .build()?;

        config.try_deserialize()
    }

    /// Loads configuration using the EDDY_PROFILE environment variable,
    /// defaulting to "debug" if not set
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("EDDY_PROFILE").unwrap_or_else(|_| "debug".to_string());
        Self::load(&profile)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self::load("debug").unwrap_or_else(|_| Self {
            profile: "debug".to_string(),
            mouse_visible: false,
            toggle_fullscreen: true,
        })
    }
}
