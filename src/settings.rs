// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CaptureError;
use crate::geometry::Rect;

pub const APP_ID: &str = "io.snipkit.Snipkit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Drags with either side under this many pixels select the full frame
    pub min_drag_px: f32,
    /// Width bound of the loaded-image preview surface
    pub max_display_width: u32,
    /// Height bound of attachment preview thumbnails
    pub preview_height: u32,
    /// Bounded per-resource wait in the readiness gate, in milliseconds
    pub resource_wait_ms: u64,
    /// Whether to remember the selection area across sessions
    pub remember_selection_area: bool,
    /// Last selection rectangle (for region captures)
    pub last_selection_area: Option<Rect>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            min_drag_px: crate::gesture::MIN_DRAG_PX,
            max_display_width: 320,
            preview_height: 360,
            resource_wait_ms: 3000,
            remember_selection_area: false,
            last_selection_area: None,
        }
    }
}

impl CaptureSettings {
    #[must_use]
    pub fn resource_wait(&self) -> Duration {
        Duration::from_millis(self.resource_wait_ms)
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snipkit").join("settings.json"))
    }

    /// Load settings from the user config directory, falling back to
    /// defaults when the file is missing or unreadable.
    #[must_use]
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("invalid settings at {}: {err}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist settings to the user config directory.
    ///
    /// # Errors
    /// Returns `CaptureError::Io` when the config directory cannot be
    /// created or the file cannot be written.
    pub fn save(&self) -> Result<(), CaptureError> {
        let path = Self::default_path().ok_or_else(|| {
            CaptureError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no user config directory",
            ))
        })?;
        self.save_to(&path)
    }

    /// # Errors
    /// Returns `CaptureError::Io` on directory or file write failure.
    pub fn save_to(&self, path: &Path) -> Result<(), CaptureError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(|err| {
            CaptureError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
