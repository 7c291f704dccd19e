//! Section descriptor loading
//!
//! A descriptor is a single line of text split by `#` into four segments:
//! header, backgrounds, elements/tiles and ramps.

pub mod catalog;
pub mod error;
pub mod parser;

pub use catalog::ElementKind;
pub use error::LoadError;
pub use parser::{
    BackgroundLayer, ElementPlacement, Entrance, PendingSwitches, SectionId, SectionLayout,
    StageTables, SwitchSlot, SwitchState, parse_section,
};
