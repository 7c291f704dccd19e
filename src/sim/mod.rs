//! Section simulation module
//!
//! Everything that runs once per frame lives here. Single-threaded and
//! deterministic given the same inputs:
//! - One step per frame, no background work
//! - Collision geometry rebuilt on every query, never cached
//! - Element updates in reverse registration order
//! - No pixel rendering; drawing only issues requests

pub mod anim;
pub mod camera;
pub mod context;
pub mod effects;
pub mod element;
pub mod grid;
pub mod obstacles;
pub mod registry;
pub mod reveal;
pub mod section;

pub use anim::TileAnimation;
pub use camera::CameraController;
pub use context::{Actor, BonusObjective, GameContext, TimeFreeze};
pub use effects::{Blast, Effect, Explosion, ScoreEffect};
pub use element::{Capability, Element, ElementFactory, ElementId, PLAYER_ID, SharedElement, shared};
pub use grid::{BorderExit, Layer, Ramp, RampDir, Tile, TileGrid};
pub use obstacles::{Obstacle, TileClass, obstacle_at, obstacles_around, world_bounds};
pub use registry::{Census, ElementRegistry};
pub use reveal::RevealTile;
pub use section::{Section, SectionState, StepOutcome};
