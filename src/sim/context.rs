//! External game context
//!
//! The player actor, input, lives, music and persistence belong to the
//! top-level game loop. The section reaches them only through this trait.

use glam::Vec2;

use super::element::{ElementId, PLAYER_ID};
use super::section::Section;
use crate::Rect;
use crate::level::SwitchSlot;
use crate::renderer::DrawList;

/// Time-stop effects applied to the element update pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFreeze {
    #[default]
    None,
    /// Enemies stop, except while dying or when immune
    Enemies,
    /// Everything stops, except immune elements
    All,
}

/// Completion rule of a bonus stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusObjective {
    /// Finish once no enemy remains
    KillAll,
    /// Finish once no collectible remains
    CollectAll,
}

/// The player-controlled actor, persisting across sections
pub trait Actor {
    fn id(&self) -> ElementId {
        PLAYER_ID
    }

    fn bounds(&self) -> Rect;

    /// Teleport, clearing any motion
    fn warp_to(&mut self, pos: Vec2);

    /// Enables or disables player control
    fn set_active(&mut self, active: bool);

    fn celebrate(&mut self) {}
}

pub trait GameContext {
    fn player(&self) -> &dyn Actor;

    fn player_mut(&mut self) -> &mut dyn Actor;

    /// Advance the player's own movement and timers
    fn update_player(&mut self, section: &mut Section);

    fn draw_player(&self, _frame: &mut DrawList, _view: &Rect) {}

    fn player_dead(&self) -> bool;

    /// Start the player-death path (pits)
    fn kill_player(&mut self);

    fn lives(&self) -> u32;

    fn confirm_pressed(&self) -> bool;

    fn pause_pressed(&self) -> bool {
        false
    }

    fn time_freeze(&self) -> TimeFreeze {
        TimeFreeze::None
    }

    fn bonus_objective(&self) -> Option<BonusObjective> {
        None
    }

    fn play_song(&mut self, _song: &str) {}

    /// Persist a checkpoint: entrance to respawn at plus the switch that
    /// triggered it
    fn save_checkpoint(&mut self, _entrance: u32, _switch: Option<SwitchSlot>) {}
}
