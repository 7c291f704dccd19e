//! Darkness overlay for dark sections
//!
//! Light sources register patterns of lit viewport cells each frame. The
//! overlay starts fully opaque and each cell drops to the lowest opacity
//! any light assigned to it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::draw_list::{DrawCommand, DrawList};
use crate::Rect;

/// One lit cell relative to the light source's cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightTile {
    pub dx: i32,
    pub dy: i32,
    /// Remaining darkness, 0 fully lit and 255 fully dark
    pub alpha: u8,
}

impl LightTile {
    pub const fn new(dx: i32, dy: i32, alpha: u8) -> Self {
        Self { dx, dy, alpha }
    }
}

/// Per-frame light accumulator over the viewport's cells
#[derive(Debug, Clone)]
pub struct LightMap {
    cols: usize,
    rows: usize,
    lit: Vec<(usize, usize, u8)>,
}

impl LightMap {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            lit: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.lit.clear();
    }

    pub fn len(&self) -> usize {
        self.lit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lit.is_empty()
    }

    /// Project a light pattern centered on `body` into viewport cells.
    /// Cells outside the viewport are dropped.
    pub fn add(&mut self, pattern: &[LightTile], body: &Rect, camera: Vec2, cell_size: f32) {
        let center = body.center() - camera;
        let cx = (center.x / cell_size).floor() as i64;
        let cy = (center.y / cell_size).floor() as i64;
        for light in pattern {
            let x = cx + i64::from(light.dx);
            let y = cy + i64::from(light.dy);
            if x >= 0 && y >= 0 && (x as usize) < self.cols && (y as usize) < self.rows {
                self.lit.push((x as usize, y as usize, light.alpha));
            }
        }
    }

    /// Darkness per viewport cell, column-major
    pub fn compose(&self) -> Vec<u8> {
        let mut shade = vec![u8::MAX; self.cols * self.rows];
        for &(x, y, alpha) in &self.lit {
            let cell = &mut shade[x * self.rows + y];
            *cell = (*cell).min(alpha);
        }
        shade
    }

    /// Emit one shade request per viewport cell
    pub fn draw(&self, frame: &mut DrawList, cell_size: f32) {
        for (i, alpha) in self.compose().into_iter().enumerate() {
            let (x, y) = (i / self.rows, i % self.rows);
            frame.push(DrawCommand::Shade {
                rect: Rect::new(x as f32 * cell_size, y as f32 * cell_size, cell_size, cell_size),
                alpha,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_light_wins() {
        let mut map = LightMap::new(4, 3);
        let body = Rect::new(32.0, 32.0, 32.0, 32.0);
        map.add(&[LightTile::new(0, 0, 100)], &body, Vec2::ZERO, 32.0);
        map.add(&[LightTile::new(0, 0, 40), LightTile::new(1, 0, 200)], &body, Vec2::ZERO, 32.0);

        let shade = map.compose();
        assert_eq!(shade[3 + 1], 40);
        assert_eq!(shade[2 * 3 + 1], 200);
        assert_eq!(shade[0], 255);
    }

    #[test]
    fn test_light_outside_viewport_is_dropped() {
        let mut map = LightMap::new(2, 2);
        let body = Rect::new(0.0, 0.0, 16.0, 16.0);
        map.add(
            &[LightTile::new(-1, 0, 0), LightTile::new(0, 5, 0), LightTile::new(1, 1, 0)],
            &body,
            Vec2::ZERO,
            32.0,
        );
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_camera_offsets_lights() {
        let mut map = LightMap::new(4, 4);
        let body = Rect::new(100.0, 100.0, 8.0, 8.0);
        map.add(&[LightTile::new(0, 0, 0)], &body, Vec2::new(64.0, 64.0), 32.0);
        // Center (104, 104) minus camera is (40, 40): cell (1, 1)
        assert_eq!(map.compose()[4 + 1], 0);
    }

    #[test]
    fn test_draw_emits_a_shade_per_cell() {
        let map = LightMap::new(3, 2);
        let mut frame = DrawList::new();
        map.draw(&mut frame, 32.0);
        assert_eq!(frame.len(), 6);
    }
}
