//! Draw requests for one frame
//!
//! The section issues requests in painter's order; pixel rendering of the
//! requests is up to the host.

use glam::Vec2;

use crate::Rect;

/// Vertical scrolling of a background layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundScroll {
    /// Tiles vertically, scrolled by this offset
    Tiled { offset_y: f32 },
    /// Drawn once; 0.0 aligns the image top with the screen top and 1.0
    /// aligns its bottom with the screen bottom
    Stretched { progress: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Parallax background layer
    Background {
        layer: usize,
        name: String,
        offset_x: f32,
        scroll: BackgroundScroll,
    },
    /// Tileset cell at a screen position
    Tile { index: u16, pos: Vec2, alpha: u8 },
    /// Named sprite frame at a screen position
    Sprite {
        key: &'static str,
        frame: u32,
        pos: Vec2,
        alpha: u8,
    },
    /// Centered text with a border
    Text {
        text: String,
        pos: Vec2,
        alpha: u8,
        scale: f32,
    },
    /// Black rectangle with the given opacity
    Shade { rect: Rect, alpha: u8 },
}

/// Ordered draw requests
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn tile(&mut self, index: u16, pos: Vec2) {
        self.push(DrawCommand::Tile {
            index,
            pos,
            alpha: u8::MAX,
        });
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }
}
