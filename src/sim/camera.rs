//! Follow camera
//!
//! Horizontal tracking is continuous. Vertical tracking uses hysteresis: a
//! vertical offset has to persist for `vertical_delay` steps (or exceed
//! `vertical_limit`) before the camera starts moving, and it stops again
//! once the offset falls back within `vertical_tolerance`.

use glam::Vec2;

use crate::Rect;
use crate::settings::{CameraSettings, Settings};

/// Horizontal deltas at or below this are ignored
const HORIZONTAL_DEADZONE: f32 = 0.5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraController {
    /// Smoothed point the view is centered on
    ref_pos: Vec2,
    /// Point being tracked (player center or the fixed point)
    target: Vec2,
    moving_y: bool,
    timer: u32,
    fixed: bool,
    /// Top-left of the view in section pixels
    origin: Vec2,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump straight to `pos`, dropping any smoothing state
    pub fn snap_to(&mut self, pos: Vec2, settings: &Settings, world: Vec2) {
        self.ref_pos = pos;
        self.target = pos;
        self.moving_y = false;
        self.timer = 0;
        self.origin = Self::clamped_origin(pos, settings, world);
    }

    pub fn set_fixed(&mut self, target: Vec2) {
        self.target = target;
        self.fixed = true;
        log::debug!("Fixed camera engaged at ({}, {})", target.x, target.y);
    }

    pub fn unset_fixed(&mut self) {
        self.fixed = false;
        log::debug!("Fixed camera released");
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    #[inline]
    pub fn is_moving_vertically(&self) -> bool {
        self.moving_y
    }

    /// Retarget on the tracked body. Ignored while fixed.
    pub fn track(&mut self, target: Vec2) {
        if !self.fixed {
            self.target = target;
        }
    }

    pub fn reference(&self) -> Vec2 {
        self.ref_pos
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Top-left of the view in section pixels
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// The visible region of the section
    pub fn view(&self, settings: &Settings) -> Rect {
        Rect {
            pos: self.origin,
            size: Vec2::new(settings.screen_width, settings.screen_height),
        }
    }

    /// Advance one step. Returns true when the view moved.
    pub fn update(&mut self, settings: &Settings, world: Vec2) -> bool {
        let cam = &settings.camera;
        let delta = self.target - self.ref_pos;

        let moved_x = delta.x.abs() > HORIZONTAL_DEADZONE;
        if moved_x {
            let speed = if self.fixed {
                cam.fixed_horizontal_speed
            } else {
                cam.horizontal_speed
            };
            self.ref_pos.x += speed * delta.x;
        }

        let moved_y = self.update_vertical(cam, delta.y);

        if moved_x || moved_y {
            self.origin = Self::clamped_origin(self.ref_pos, settings, world);
        }
        moved_x || moved_y
    }

    fn update_vertical(&mut self, cam: &CameraSettings, dy: f32) -> bool {
        let distance = dy.abs();
        if self.moving_y {
            if distance > cam.vertical_tolerance {
                let scale = (distance / cam.vertical_tolerance.max(f32::EPSILON)).max(1.0);
                let fraction = (cam.vertical_speed * scale).min(1.0);
                self.ref_pos.y += fraction * dy;
                return true;
            }
            self.moving_y = false;
            self.timer = 0;
        } else if distance > cam.vertical_tolerance {
            if distance >= cam.vertical_limit {
                self.timer = cam.vertical_delay;
            } else {
                self.timer += 1;
            }
            if self.timer >= cam.vertical_delay {
                self.moving_y = true;
            }
        } else {
            self.timer = 0;
        }
        false
    }

    fn clamped_origin(center: Vec2, settings: &Settings, world: Vec2) -> Vec2 {
        let screen = Vec2::new(settings.screen_width, settings.screen_height);
        let max = (world - screen).max(Vec2::ZERO);
        (center - screen / 2.0).clamp(Vec2::ZERO, max)
    }
}
