//! Tilesection - runtime of a single platformer level section
//!
//! Core modules:
//! - `level`: Section descriptor parsing and the element catalog
//! - `sim`: Tile grid, collision extraction, elements, camera and the per-frame step
//! - `renderer`: Ordered draw requests and the darkness overlay
//! - `settings`: Data-driven runtime constants

pub mod level;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use level::{LoadError, SectionLayout, parse_section};
pub use settings::Settings;
pub use sim::{Section, StepOutcome};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Descriptor format constants
pub mod consts {
    /// Separates header, backgrounds, elements and ramps
    pub const SEGMENT_DELIMITER: char = '#';
    /// Number of segments a descriptor must carry
    pub const SEGMENT_COUNT: usize = 4;
    /// Upper bound on `width * height` accepted from a header
    pub const MAX_GRID_CELLS: usize = 1 << 24;

    /// Marks a background layer that must not tile vertically
    pub const NO_REPEAT_MARKER: char = '!';
    /// Marks an entrance sub-token (and, when trailing, the default entrance)
    pub const ENTRANCE_MARKER: char = '!';
    /// Starts a skip token
    pub const SKIP_MARKER: char = '_';
    /// Separates a layer payload from its repeat count in run tokens
    pub const RUN_MARKER: char = '*';
    /// Marks a tall ramp
    pub const TALL_RAMP_MARKER: char = '\'';

    /// Animated tile ranges: two three-frame groups and one four-frame group
    pub const ANIM_GROUP_A: u16 = 90;
    pub const ANIM_GROUP_B: u16 = 93;
    pub const ANIM_GROUP_C: u16 = 96;

    /// Alpha step used by fading effects and reveal tiles
    pub const FADE_STEP: u8 = 17;
}

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Half-open containment (right and bottom edges excluded)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.pos.x && p.x < self.right() && p.y >= self.pos.y && p.y < self.bottom()
    }

    /// Closed containment (all edges included)
    pub fn contains_inclusive(&self, p: Vec2) -> bool {
        p.x >= self.pos.x && p.x <= self.right() && p.y >= self.pos.y && p.y <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.pos.x < other.right()
            && other.pos.x < self.right()
            && self.pos.y < other.bottom()
            && other.pos.y < self.bottom()
    }
}

/// Lenient integer coercion used by the descriptor format.
///
/// Reads an optional sign and leading digits, ignoring anything after them.
/// Input without leading digits yields zero.
pub fn lenient_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    sign * value
}
