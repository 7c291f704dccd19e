//! Animated tile cycling

use crate::consts::{ANIM_GROUP_A, ANIM_GROUP_B, ANIM_GROUP_C};

/// Frame counters shared by every animated back/fore tile in a section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileAnimation {
    timer: u32,
    phase3: u16,
    phase4: u16,
}

impl TileAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one step, advancing both cycles every `interval` steps
    pub fn advance(&mut self, interval: u32) {
        self.timer += 1;
        if self.timer >= interval.max(1) {
            self.phase3 = (self.phase3 + 1) % 3;
            self.phase4 = (self.phase4 + 1) % 4;
            self.timer = 0;
        }
    }

    /// Tileset index to draw for a stored tile index
    pub fn frame_for(&self, index: u16) -> u16 {
        if index >= ANIM_GROUP_C {
            ANIM_GROUP_C + (index - ANIM_GROUP_C + self.phase4) % 4
        } else if index >= ANIM_GROUP_B {
            ANIM_GROUP_B + (index - ANIM_GROUP_B + self.phase3) % 3
        } else if index >= ANIM_GROUP_A {
            ANIM_GROUP_A + (index - ANIM_GROUP_A + self.phase3) % 3
        } else {
            index
        }
    }
}
