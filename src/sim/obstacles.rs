//! Collision geometry extraction
//!
//! Obstacles are never cached: every query rebuilds them from the live grid
//! so broken walls and toggled switches take effect immediately.
//!
//! The windowed query merges each scanned row into maximal runs of
//! same-class tiles. Ramp ends interrupt runs and contribute a half-height
//! one-way block over the lower half of the cell, blending the slope into
//! the floor beside it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::{BorderExit, Tile, TileGrid};
use crate::Rect;

/// Minimum scan margin around the query point, in cells
pub const MIN_SCAN_MARGIN: i64 = 2;

/// An axis-aligned collision rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rect,
    /// One-way: collidable from above only
    pub passable: bool,
}

impl Obstacle {
    pub fn new(rect: Rect, passable: bool) -> Self {
        Self { rect, passable }
    }
}

/// Collision class of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileClass {
    Empty,
    Passable,
    Solid,
    RampEnd,
}

impl TileClass {
    pub fn of(tile: &Tile) -> Self {
        if tile.pass.is_some() {
            TileClass::Passable
        } else if tile.is_solid() {
            if tile.ramp_end {
                TileClass::RampEnd
            } else {
                TileClass::Solid
            }
        } else {
            TileClass::Empty
        }
    }
}

/// Open run of same-class tiles on the current row
struct Run {
    start: i64,
    len: i64,
    passable: bool,
}

fn row_block(grid: &TileGrid, col: i64, row: i64, cells: i64, passable: bool, y_off: f32) -> Obstacle {
    let cell = grid.cell_size();
    Obstacle::new(
        Rect::new(
            col as f32 * cell,
            row as f32 * cell + y_off,
            cells as f32 * cell,
            cell - y_off,
        ),
        passable,
    )
}

/// Invisible walls just outside the left and right edges, except on the
/// edge the player may leave through
pub fn world_bounds(grid: &TileGrid) -> Vec<Obstacle> {
    let size = grid.pixel_size();
    let mut bounds = Vec::with_capacity(2);
    if grid.border_exit != BorderExit::Left {
        bounds.push(Obstacle::new(Rect::new(-1.0, 0.0, 1.0, size.y), false));
    }
    if grid.border_exit != BorderExit::Right {
        bounds.push(Obstacle::new(Rect::new(size.x, 0.0, 1.0, size.y), false));
    }
    bounds
}

/// Obstacles relevant to a body at `pos` with `size`.
///
/// A zero-sized body queries around the point itself; otherwise the query
/// is centered on the body and the scan margin grows by one cell for every
/// two cells of body extent.
pub fn obstacles_around(grid: &TileGrid, dynamic: &[Obstacle], pos: Vec2, size: Vec2) -> Vec<Obstacle> {
    let mut obstacles = world_bounds(grid);
    obstacles.extend_from_slice(dynamic);

    let cell = grid.cell_size();
    let mut center = pos;
    let mut margin_x = MIN_SCAN_MARGIN;
    let mut margin_y = MIN_SCAN_MARGIN;
    if size.x > 0.0 {
        center.x += size.x / 2.0;
        margin_x += (size.x / (2.0 * cell)).floor() as i64;
    }
    if size.y > 0.0 {
        center.y += size.y / 2.0;
        margin_y += (size.y / (2.0 * cell)).floor() as i64;
    }

    let i = (center.x / cell).round() as i64;
    let j = (center.y / cell).round() as i64;
    let width = grid.width() as i64;
    let height = grid.height() as i64;
    let col_lo = (i - margin_x).max(0);
    let col_hi = i + margin_x;

    for row in (j - margin_y).max(0)..=(j + margin_y).min(height - 1) {
        let mut run: Option<Run> = None;
        for col in col_lo..=col_hi.min(width - 1) {
            let Some(tile) = grid.tile_at(col, row) else {
                continue;
            };
            match TileClass::of(tile) {
                TileClass::Empty => flush(grid, &mut obstacles, row, run.take()),
                TileClass::RampEnd => {
                    flush(grid, &mut obstacles, row, run.take());
                    obstacles.push(row_block(grid, col, row, 1, true, cell / 2.0));
                }
                class => {
                    let passable = class == TileClass::Passable;
                    match &mut run {
                        Some(open) if open.passable == passable => open.len += 1,
                        _ => {
                            flush(grid, &mut obstacles, row, run.take());
                            run = Some(Run {
                                start: col,
                                len: 1,
                                passable,
                            });
                        }
                    }
                }
            }
        }
        // A run still open at the window edge ends at the window's right
        // edge or the grid's true width, whichever comes first
        if let Some(open) = run {
            let end = (col_hi + 1).min(width);
            let len = end - open.start;
            obstacles.push(row_block(grid, open.start, row, len, open.passable, 0.0));
        }
    }

    obstacles
}

fn flush(grid: &TileGrid, obstacles: &mut Vec<Obstacle>, row: i64, run: Option<Run>) {
    if let Some(run) = run {
        obstacles.push(row_block(grid, run.start, row, run.len, run.passable, 0.0));
    }
}

/// Whether a point lies inside an intact wall, a one-way platform, or a
/// dynamic obstacle. Nothing is merged.
pub fn obstacle_at(grid: &TileGrid, dynamic: &[Obstacle], point: Vec2) -> bool {
    let (x, y) = grid.cell_of(point);
    if grid.tile_at(x, y).is_some_and(Tile::is_obstacle) {
        return true;
    }
    dynamic.iter().any(|o| o.rect.contains(point))
}
