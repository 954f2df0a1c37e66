//! Runner configuration, read from the `[callbacks]` table of a TOML file.
//!
//! ```toml
//! [callbacks]
//! unyielded-around = "halt"   # or "continue"
//! detect-cycles = true
//! ```

use crate::error::CallbackResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// What a phase does when an around handler returns without yielding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AroundPolicy {
    /// The action never ran, so the phase fails.
    #[default]
    Halt,
    /// The handler's own flow decides. Inner arounds and the action are
    /// skipped; the after handlers still run.
    Continue,
}

/// Tunables for [`crate::CallbackRunner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CallbackConfig {
    pub unyielded_around: AroundPolicy,
    pub detect_cycles: bool,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            unyielded_around: AroundPolicy::Halt,
            detect_cycles: true,
        }
    }
}

impl CallbackConfig {
    /// Parses a TOML document. A missing `[callbacks]` table yields defaults.
    pub fn from_toml_str(contents: &str) -> CallbackResult<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        Ok(file.callbacks)
    }

    /// Loads from a file, falling back to defaults with a warning when it is
    /// missing or malformed.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No callback config at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded callback config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!(
                        "Failed to parse callback config {:?}: {}. Using defaults.",
                        path, e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read callback config {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    callbacks: CallbackConfig,
}
