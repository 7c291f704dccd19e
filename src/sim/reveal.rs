//! Reveal tiles: hidden areas drawn over the map until the player enters them

use std::collections::{HashSet, VecDeque};

use glam::Vec2;

use super::grid::TileGrid;
use crate::Rect;
use crate::consts::FADE_STEP;
use crate::renderer::{DrawCommand, DrawList};

/// Hide-layer value that anchors a reveal group
pub const REVEAL_ANCHOR: u16 = 0;

/// A connected group of hide-layer cells fading as one
#[derive(Debug, Clone)]
pub struct RevealTile {
    /// (column, row, hide index) of every covered cell
    cells: Vec<(usize, usize, u16)>,
    cell_size: f32,
    bounds: Rect,
    alpha: u8,
}

impl RevealTile {
    /// Flood-fill the 4-connected hide cells reachable from `anchor`
    pub fn from_anchor(grid: &TileGrid, anchor: (usize, usize)) -> Self {
        let mut cells = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([anchor]);
        visited.insert(anchor);

        while let Some((x, y)) = queue.pop_front() {
            let Some(hide) = grid.tile(x, y).and_then(|t| t.hide) else {
                continue;
            };
            cells.push((x, y, hide));

            let neighbours = [
                x.checked_sub(1).map(|nx| (nx, y)),
                Some((x + 1, y)),
                y.checked_sub(1).map(|ny| (x, ny)),
                Some((x, y + 1)),
            ];
            for next in neighbours.into_iter().flatten() {
                let has_hide = grid.tile(next.0, next.1).is_some_and(|t| t.hide.is_some());
                if has_hide && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        let cell_size = grid.cell_size();
        let bounds = Self::enclosing(&cells, cell_size);
        Self {
            cells,
            cell_size,
            bounds,
            alpha: u8::MAX,
        }
    }

    fn enclosing(cells: &[(usize, usize, u16)], cell_size: f32) -> Rect {
        let Some(&(x0, y0, _)) = cells.first() else {
            return Rect::default();
        };
        let (mut lo_x, mut lo_y, mut hi_x, mut hi_y) = (x0, y0, x0, y0);
        for &(x, y, _) in cells {
            lo_x = lo_x.min(x);
            lo_y = lo_y.min(y);
            hi_x = hi_x.max(x);
            hi_y = hi_y.max(y);
        }
        Rect::new(
            lo_x as f32 * cell_size,
            lo_y as f32 * cell_size,
            (hi_x - lo_x + 1) as f32 * cell_size,
            (hi_y - lo_y + 1) as f32 * cell_size,
        )
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().map(|&(x, y, _)| (x, y))
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether a point lies in one of the group's cells
    pub fn covers(&self, point: Vec2) -> bool {
        if point.x < 0.0 || point.y < 0.0 {
            return false;
        }
        let x = (point.x / self.cell_size) as usize;
        let y = (point.y / self.cell_size) as usize;
        self.cells.iter().any(|&(cx, cy, _)| cx == x && cy == y)
    }

    /// Fade out while `player_center` is inside, back in otherwise
    pub fn update(&mut self, player_center: Vec2) {
        if self.covers(player_center) {
            self.alpha = self.alpha.saturating_sub(FADE_STEP);
        } else {
            self.alpha = self.alpha.saturating_add(FADE_STEP);
        }
    }

    pub fn is_visible(&self, view: &Rect) -> bool {
        self.bounds.intersects(view)
    }

    pub fn draw(&self, frame: &mut DrawList, view: &Rect) {
        if self.alpha == 0 {
            return;
        }
        for &(x, y, index) in &self.cells {
            let pos = Vec2::new(x as f32, y as f32) * self.cell_size - view.pos;
            frame.push(DrawCommand::Tile {
                index,
                pos,
                alpha: self.alpha,
            });
        }
    }
}

/// One reveal group per anchor cell, in storage order
pub fn collect(grid: &TileGrid) -> Vec<RevealTile> {
    grid.cells()
        .filter(|(_, _, tile)| tile.hide == Some(REVEAL_ANCHOR))
        .map(|(x, y, _)| RevealTile::from_anchor(grid, (x, y)))
        .collect()
}
