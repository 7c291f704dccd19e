//! Tile grid and ramp geometry
//!
//! Tiles are stored column-major (`x * height + y`). Pixel and cell
//! coordinates convert by the grid's cell size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Rect;

/// One per-cell rendering/collision channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Back,
    Fore,
    Pass,
    Wall,
    Hide,
}

impl Layer {
    /// Descriptor letter for this layer
    pub fn from_code(c: u8) -> Option<Self> {
        match c {
            b'b' => Some(Layer::Back),
            b'f' => Some(Layer::Fore),
            b'p' => Some(Layer::Pass),
            b'w' => Some(Layer::Wall),
            b'h' => Some(Layer::Hide),
            _ => None,
        }
    }
}

/// Which section edge lets the player leave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderExit {
    Top,
    Right,
    Bottom,
    Left,
    #[default]
    None,
}

impl BorderExit {
    /// Header code: 0 top, 1 right, 2 bottom, 3 left, anything else none
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => BorderExit::Top,
            1 => BorderExit::Right,
            2 => BorderExit::Bottom,
            3 => BorderExit::Left,
            _ => BorderExit::None,
        }
    }
}

/// A single grid cell. `None` in a layer slot means the layer is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    pub back: Option<u16>,
    pub fore: Option<u16>,
    pub pass: Option<u16>,
    pub wall: Option<u16>,
    pub hide: Option<u16>,
    /// Wall currently destroyed; ignored for collision and drawing
    pub broken: bool,
    /// Cell where a ramp meets flat ground
    pub ramp_end: bool,
}

impl Tile {
    pub fn layer(&self, layer: Layer) -> Option<u16> {
        match layer {
            Layer::Back => self.back,
            Layer::Fore => self.fore,
            Layer::Pass => self.pass,
            Layer::Wall => self.wall,
            Layer::Hide => self.hide,
        }
    }

    /// Overwrite one layer slot (last write wins)
    pub fn set_layer(&mut self, layer: Layer, value: Option<u16>) {
        let slot = match layer {
            Layer::Back => &mut self.back,
            Layer::Fore => &mut self.fore,
            Layer::Pass => &mut self.pass,
            Layer::Wall => &mut self.wall,
            Layer::Hide => &mut self.hide,
        };
        *slot = value;
    }

    /// Wall present and not broken
    #[inline]
    pub fn is_solid(&self) -> bool {
        self.wall.is_some() && !self.broken
    }

    /// Blocks movement in some direction. A broken cell blocks nothing,
    /// whichever layers it carries.
    #[inline]
    pub fn is_obstacle(&self) -> bool {
        !self.broken && (self.pass.is_some() || self.wall.is_some())
    }
}

/// Ramp orientation: which side the slope rises toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RampDir {
    /// Rises toward the right; the far edge is the right edge
    Left,
    /// Rises toward the left; the far edge is the left edge
    Right,
}

/// A sloped surface spanning several cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    /// Top-left corner in pixels
    pub pos: Vec2,
    /// Width and height in pixels
    pub size: Vec2,
    pub dir: RampDir,
    /// Anchor cell (column, row)
    pub cell: (usize, usize),
    /// Width in cells
    pub width_cells: usize,
}

impl Ramp {
    pub fn bounds(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    /// Cell adjacent to the far edge, paired with this ramp as its ramp end.
    /// `None` when that cell would fall left of column zero.
    pub fn end_cell(&self) -> Option<(usize, usize)> {
        let (col, row) = self.cell;
        let end_col = match self.dir {
            RampDir::Left => col.checked_add(self.width_cells)?,
            RampDir::Right => col.checked_sub(1)?,
        };
        Some((end_col, row))
    }
}

/// Grid storage for one section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cell_size: f32,
    tiles: Vec<Tile>,
    pub border_exit: BorderExit,
    pub tileset: u32,
    /// Enables the darkness overlay pass
    pub dark: bool,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            tiles: vec![Tile::default(); width * height],
            border_exit: BorderExit::None,
            tileset: 0,
            dark: false,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Section size in pixels
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.cell_size,
            self.height as f32 * self.cell_size,
        )
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn tile(&self, x: usize, y: usize) -> Option<&Tile> {
        if x < self.width && y < self.height {
            self.tiles.get(x * self.height + y)
        } else {
            None
        }
    }

    pub fn tile_mut(&mut self, x: usize, y: usize) -> Option<&mut Tile> {
        if x < self.width && y < self.height {
            self.tiles.get_mut(x * self.height + y)
        } else {
            None
        }
    }

    /// Signed-coordinate lookup for scan windows that may leave the grid
    pub fn tile_at(&self, x: i64, y: i64) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            self.tile(x as usize, y as usize)
        } else {
            None
        }
    }

    /// Top-left pixel of a cell
    pub fn cell_origin(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(x as f32 * self.cell_size, y as f32 * self.cell_size)
    }

    /// Cell containing a pixel (may be outside the grid)
    pub fn cell_of(&self, p: Vec2) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    /// Iterate every cell as `(x, y, tile)` in storage order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &Tile)> {
        let height = self.height.max(1);
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (i / height, i % height, t))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut Tile)> {
        let height = self.height.max(1);
        self.tiles
            .iter_mut()
            .enumerate()
            .map(move |(i, t)| (i / height, i % height, t))
    }

    /// Mark or clear a wall as broken. Returns false outside the grid.
    pub fn set_broken(&mut self, x: usize, y: usize, broken: bool) -> bool {
        match self.tile_mut(x, y) {
            Some(tile) => {
                tile.broken = broken;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dimensions() {
        let grid = TileGrid::new(10, 6, 32.0);
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 6);
        assert_eq!(grid.pixel_size(), Vec2::new(320.0, 192.0));
        assert!(grid.tile(9, 5).is_some());
        assert!(grid.tile(10, 0).is_none());
        assert!(grid.tile_at(-1, 0).is_none());
    }

    #[test]
    fn test_cell_conversions() {
        let grid = TileGrid::new(4, 4, 32.0);
        assert_eq!(grid.cell_origin(2, 3), Vec2::new(64.0, 96.0));
        assert_eq!(grid.cell_of(Vec2::new(63.9, 96.0)), (1, 3));
        assert_eq!(grid.cell_of(Vec2::new(-0.5, 0.0)), (-1, 0));
    }

    #[test]
    fn test_tile_classification() {
        let mut tile = Tile::default();
        assert!(!tile.is_obstacle());
        tile.set_layer(Layer::Wall, Some(3));
        assert!(tile.is_solid());
        tile.broken = true;
        assert!(!tile.is_solid());
        assert!(!tile.is_obstacle());
        tile.set_layer(Layer::Pass, Some(1));
        assert!(!tile.is_obstacle());
        tile.broken = false;
        tile.set_layer(Layer::Wall, None);
        assert!(tile.is_obstacle());
    }

    #[test]
    fn test_last_layer_write_wins() {
        let mut tile = Tile::default();
        tile.set_layer(Layer::Back, Some(1));
        tile.set_layer(Layer::Back, Some(7));
        assert_eq!(tile.layer(Layer::Back), Some(7));
    }

    #[test]
    fn test_ramp_end_cell() {
        let left = Ramp {
            pos: Vec2::new(64.0, 96.0),
            size: Vec2::new(96.0, 32.0),
            dir: RampDir::Left,
            cell: (2, 3),
            width_cells: 3,
        };
        assert_eq!(left.end_cell(), Some((5, 3)));

        let right = Ramp {
            dir: RampDir::Right,
            ..left.clone()
        };
        assert_eq!(right.end_cell(), Some((1, 3)));

        let at_edge = Ramp {
            cell: (0, 0),
            ..right
        };
        assert_eq!(at_edge.end_cell(), None);
    }

    #[test]
    fn test_border_exit_codes() {
        assert_eq!(BorderExit::from_code(0), BorderExit::Top);
        assert_eq!(BorderExit::from_code(2), BorderExit::Bottom);
        assert_eq!(BorderExit::from_code(4), BorderExit::None);
        assert_eq!(BorderExit::from_code(9), BorderExit::None);
    }
}
