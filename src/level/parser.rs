//! Section descriptor parser
//!
//! Grammar (segments separated by `#`):
//! - header: `width,height,border_exit,tileset,music[,dark]`
//! - backgrounds: `name[!],...` (`!` disables vertical tiling)
//! - elements: `;`-separated tokens consumed in raster order, left to right
//!   along a row and wrapping to the next row at the right edge:
//!   - `_N` skips N cells
//!   - `Lpp*N` paints N cells with layer `L` payload `pp`
//!   - packed: zero or more `Lpp` sub-tokens, optionally followed by one
//!     terminal `!index[!]` (entrance) or `@type[:args]` (element)
//! - ramps: `;`-separated `[l]['']WH:col,row`
//!
//! Numeric fields are coerced leniently: malformed digits read as zero.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::ElementKind;
use super::error::LoadError;
use crate::consts::*;
use crate::lenient_int;
use crate::sim::grid::{BorderExit, Layer, Ramp, RampDir, TileGrid};

/// Identifies a section within its stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SectionId(pub usize);

/// Persistent state of a switch placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SwitchState {
    #[default]
    Normal,
    Taken,
    Used,
}

/// Switch bookkeeping attached to a switch-capable placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchSlot {
    /// Stage-wide sequential index
    pub index: u32,
    pub state: SwitchState,
}

/// An element to instantiate when the section starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementPlacement {
    /// Grid cell (column, row)
    pub cell: (usize, usize),
    /// Top-left pixel of the cell
    pub pos: Vec2,
    pub kind: ElementKind,
    /// Opaque argument string following `:`
    pub args: Option<String>,
    pub switch: Option<SwitchSlot>,
    pub section: SectionId,
}

/// A point where the player can enter a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrance {
    pub index: u32,
    pub pos: Vec2,
    pub section: SectionId,
    pub default: bool,
}

/// One parallax background layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundLayer {
    /// Resource name; image lookup (PNG, then JPEG) is the caller's job
    pub name: String,
    pub repeat_y: bool,
}

/// Switch indices whose state was saved, in ascending order.
/// Each entry is consumed at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSwitches {
    pub taken: VecDeque<u32>,
    pub used: VecDeque<u32>,
}

impl PendingSwitches {
    fn resolve(&mut self, index: u32) -> SwitchState {
        if self.used.front() == Some(&index) {
            self.used.pop_front();
            SwitchState::Used
        } else if self.taken.front() == Some(&index) {
            self.taken.pop_front();
            SwitchState::Taken
        } else {
            SwitchState::Normal
        }
    }
}

/// Stage-wide tables shared by all sections of a stage
#[derive(Debug, Clone, Default)]
pub struct StageTables {
    pub entrances: BTreeMap<u32, Entrance>,
    /// Switch placements of every section, by switch index
    pub switches: Vec<ElementPlacement>,
    pub pending: PendingSwitches,
}

/// Everything a descriptor defines for one section
#[derive(Debug, Clone)]
pub struct SectionLayout {
    pub id: SectionId,
    pub grid: TileGrid,
    pub backgrounds: Vec<BackgroundLayer>,
    pub music: String,
    /// Non-switch placements in descriptor order
    pub placements: Vec<ElementPlacement>,
    pub ramps: Vec<Ramp>,
    pub default_entrance: Option<u32>,
}

/// Parse a section descriptor.
///
/// Entrances and switch placements are merged into `tables`; switch
/// indices continue from the number of switches already registered.
pub fn parse_section(
    descriptor: &str,
    id: SectionId,
    cell_size: f32,
    tables: &mut StageTables,
) -> Result<SectionLayout, LoadError> {
    let descriptor = descriptor.trim_end_matches(['\r', '\n']);
    let parts: Vec<&str> = descriptor.split(SEGMENT_DELIMITER).collect();
    if parts.len() < SEGMENT_COUNT {
        return Err(LoadError::MissingSegment {
            found: parts.len(),
            expected: SEGMENT_COUNT,
        });
    }

    let (grid, music) = parse_header(parts[0], cell_size)?;
    let mut layout = SectionLayout {
        id,
        grid,
        backgrounds: parse_backgrounds(parts[1]),
        music,
        placements: Vec::new(),
        ramps: Vec::new(),
        default_entrance: None,
    };
    parse_elements(parts[2], &mut layout, tables)?;
    parse_ramps(parts[3], &mut layout)?;

    log::debug!(
        "Parsed section {}: {}x{} cells, {} placements, {} ramps, {} backgrounds",
        id.0,
        layout.grid.width(),
        layout.grid.height(),
        layout.placements.len(),
        layout.ramps.len(),
        layout.backgrounds.len()
    );
    Ok(layout)
}

fn parse_header(segment: &str, cell_size: f32) -> Result<(TileGrid, String), LoadError> {
    let mut fields: Vec<&str> = segment.split(',').collect();
    // Trailing empty fields do not count towards the field total
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    let field = |i: usize| fields.get(i).copied().unwrap_or("");

    let width = lenient_int(field(0)).max(0) as usize;
    let height = lenient_int(field(1)).max(0) as usize;
    if width.checked_mul(height).is_none_or(|cells| cells > MAX_GRID_CELLS) {
        return Err(LoadError::GridTooLarge { width, height });
    }
    let mut grid = TileGrid::new(width, height, cell_size);
    grid.border_exit = BorderExit::from_code(lenient_int(field(2)));
    grid.tileset = lenient_int(field(3)).max(0) as u32;
    // Only the presence of a sixth field matters
    grid.dark = fields.len() > 5;

    Ok((grid, field(4).to_string()))
}

fn parse_backgrounds(segment: &str) -> Vec<BackgroundLayer> {
    segment
        .split(',')
        .filter(|name| !name.is_empty())
        .map(|name| match name.strip_suffix(NO_REPEAT_MARKER) {
            Some(stripped) => BackgroundLayer {
                name: stripped.to_string(),
                repeat_y: false,
            },
            None => BackgroundLayer {
                name: name.to_string(),
                repeat_y: true,
            },
        })
        .collect()
}

/// Substring by byte offsets, clamped to the string
fn slice(s: &str, start: usize, len: usize) -> &str {
    let start = start.min(s.len());
    let end = start.saturating_add(len).min(s.len());
    s.get(start..end).unwrap_or("")
}

/// Layer payload: negative values mean the layer is absent
fn payload(s: &str) -> Option<u16> {
    u16::try_from(lenient_int(s)).ok()
}

/// Raster cursor over the grid, row by row
struct Cursor {
    linear: usize,
    width: usize,
}

impl Cursor {
    fn cell(&self) -> (usize, usize) {
        (self.linear % self.width, self.linear / self.width)
    }

    fn advance(&mut self, n: usize) {
        self.linear = self.linear.saturating_add(n);
    }
}

fn paint(grid: &mut TileGrid, cell: (usize, usize), layer: Layer, value: Option<u16>) {
    match grid.tile_mut(cell.0, cell.1) {
        Some(tile) => tile.set_layer(layer, value),
        None => log::warn!("Tile write outside grid at {:?} ignored", cell),
    }
}

fn parse_elements(
    segment: &str,
    layout: &mut SectionLayout,
    tables: &mut StageTables,
) -> Result<(), LoadError> {
    if layout.grid.width() == 0 {
        if !segment.is_empty() {
            log::warn!("Section {} has zero width; element tokens ignored", layout.id.0);
        }
        return Ok(());
    }
    let segment = segment.trim_end_matches(';');
    if segment.is_empty() {
        return Ok(());
    }

    let mut cursor = Cursor {
        linear: 0,
        width: layout.grid.width(),
    };
    let mut switch_index = tables.switches.len() as u32;

    for token in segment.split(';') {
        let bytes = token.as_bytes();
        if bytes.is_empty() {
            log::warn!("Section {}: empty element token skipped", layout.id.0);
            continue;
        }

        if bytes[0] == SKIP_MARKER as u8 {
            cursor.advance(lenient_int(&token[1..]).max(0) as usize);
            continue;
        }

        if bytes.get(3) == Some(&(RUN_MARKER as u8)) {
            let layer = Layer::from_code(bytes[0])
                .ok_or_else(|| LoadError::MalformedToken(token.to_string()))?;
            let value = payload(slice(token, 1, 2));
            let count = lenient_int(slice(token, 4, token.len())).max(0) as usize;
            for _ in 0..count {
                paint(&mut layout.grid, cursor.cell(), layer, value);
                cursor.advance(1);
            }
            continue;
        }

        let cell = cursor.cell();
        let pos = layout.grid.cell_origin(cell.0, cell.1);
        let mut i = 0;
        while let Some(&c) = bytes.get(i) {
            if let Some(layer) = Layer::from_code(c) {
                paint(&mut layout.grid, cell, layer, payload(slice(token, i + 1, 2)));
                i += 3;
                continue;
            }

            // Terminal sub-token: consumes the rest of the token
            let rest = slice(token, i + 1, token.len());
            if c == ENTRANCE_MARKER as u8 {
                register_entrance(token, rest, pos, layout, tables);
            } else {
                let (kind, args) = element_type(token, rest)?;
                let mut placement = ElementPlacement {
                    cell,
                    pos,
                    kind,
                    args,
                    switch: None,
                    section: layout.id,
                };
                if kind.is_switch() {
                    placement.switch = Some(SwitchSlot {
                        index: switch_index,
                        state: tables.pending.resolve(switch_index),
                    });
                    switch_index += 1;
                    tables.switches.push(placement);
                } else {
                    layout.placements.push(placement);
                }
            }
            break;
        }
        cursor.advance(1);
    }
    Ok(())
}

fn register_entrance(
    token: &str,
    rest: &str,
    pos: Vec2,
    layout: &mut SectionLayout,
    tables: &mut StageTables,
) {
    let index = lenient_int(rest).max(0) as u32;
    let default = token.ends_with(ENTRANCE_MARKER);
    if default {
        // At most one default entrance per section
        if let Some(previous) = layout.default_entrance.replace(index) {
            log::warn!(
                "Section {} declares default entrance {} after {}",
                layout.id.0,
                index,
                previous
            );
            if let Some(entrance) = tables.entrances.get_mut(&previous) {
                entrance.default = false;
            }
        }
    }
    tables.entrances.insert(
        index,
        Entrance {
            index,
            pos,
            section: layout.id,
            default,
        },
    );
}

fn element_type(token: &str, s: &str) -> Result<(ElementKind, Option<String>), LoadError> {
    let (number, args) = match s.split_once(':') {
        Some((n, a)) => (n, Some(a.to_string())),
        None => (s, None),
    };
    let index = lenient_int(number);
    let kind = ElementKind::from_index(index).ok_or_else(|| LoadError::UnknownElementType {
        index,
        token: token.to_string(),
    })?;
    Ok((kind, args))
}

fn parse_ramps(segment: &str, layout: &mut SectionLayout) -> Result<(), LoadError> {
    let cell_size = layout.grid.cell_size();
    for token in segment.split(';').filter(|t| !t.is_empty()) {
        let bytes = token.as_bytes();
        let malformed = |reason| LoadError::MalformedRamp {
            token: token.to_string(),
            reason,
        };

        let dir = if bytes[0] == b'l' {
            RampDir::Left
        } else {
            RampDir::Right
        };
        let tall = bytes.get(1) == Some(&(TALL_RAMP_MARKER as u8));
        let a = if tall { 2 } else { 1 };
        let width_cells = lenient_int(slice(token, a, 1)).max(0) as usize;
        let height_cells = lenient_int(slice(token, a + 1, 1)).max(0) as usize;

        let coords = token
            .split(':')
            .nth(1)
            .ok_or_else(|| malformed("missing coordinates"))?;
        let mut coords = coords.split(',');
        let col = lenient_int(coords.next().unwrap_or(""));
        let row = lenient_int(coords.next().unwrap_or(""));
        if !layout.grid.in_bounds(col, row) {
            return Err(malformed("anchor outside grid"));
        }

        let mut size = Vec2::new(
            width_cells as f32 * cell_size,
            height_cells as f32 * cell_size,
        );
        if tall {
            size.y -= 1.0;
        }
        let ramp = Ramp {
            pos: Vec2::new(col as f32 * cell_size, row as f32 * cell_size),
            size,
            dir,
            cell: (col as usize, row as usize),
            width_cells,
        };

        let (end_x, end_y) = ramp.end_cell().ok_or_else(|| malformed("ramp end outside grid"))?;
        let tile = layout
            .grid
            .tile_mut(end_x, end_y)
            .ok_or_else(|| malformed("ramp end outside grid"))?;
        tile.ramp_end = true;
        layout.ramps.push(ramp);
    }
    Ok(())
}
