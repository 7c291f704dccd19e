//! Runtime settings
//!
//! Policy constants consumed by the section runtime. Loaded from JSON;
//! any missing field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::level::LoadError;

/// Camera smoothing constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Fraction of the horizontal delta covered each step while tracking
    pub horizontal_speed: f32,
    /// Fraction of the horizontal delta covered each step in fixed-camera mode
    pub fixed_horizontal_speed: f32,
    /// Base fraction of the vertical delta covered each step while moving
    pub vertical_speed: f32,
    /// Vertical delta (px) under which the camera stays put
    pub vertical_tolerance: f32,
    /// Vertical delta (px) that engages movement immediately
    pub vertical_limit: f32,
    /// Steps the vertical delta must persist before movement engages
    pub vertical_delay: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            horizontal_speed: 0.2,
            fixed_horizontal_speed: 0.1,
            vertical_speed: 0.1,
            vertical_tolerance: 32.0,
            vertical_limit: 160.0,
            vertical_delay: 30,
        }
    }
}

/// Section runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Edge length of one grid cell in pixels
    pub cell_size: f32,
    /// Viewport width in pixels
    pub screen_width: f32,
    /// Viewport height in pixels
    pub screen_height: f32,

    pub camera: CameraSettings,

    /// Distance past the section edge the player must travel to exit
    pub exit_margin: f32,
    /// Steps between tile animation frames
    pub tile_anim_interval: u32,

    // === Death countdown ===
    /// Steps before confirm input may trigger a reload
    pub dead_confirm_delay: u32,
    /// Steps before a reload happens on its own once lives are exhausted
    pub dead_game_over_delay: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cell_size: 32.0,
            screen_width: 800.0,
            screen_height: 600.0,

            camera: CameraSettings::default(),

            exit_margin: 16.0,
            tile_anim_interval: 7,

            dead_confirm_delay: 30,
            dead_game_over_delay: 150,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Viewport size in whole cells (rounded up)
    pub fn viewport_cells(&self) -> (usize, usize) {
        (
            (self.screen_width / self.cell_size).ceil() as usize,
            (self.screen_height / self.cell_size).ceil() as usize,
        )
    }

    /// Death countdown cap: the longest delay that can still trigger a reload
    pub fn dead_timer_cap(&self) -> u32 {
        self.dead_confirm_delay.max(self.dead_game_over_delay)
    }
}
