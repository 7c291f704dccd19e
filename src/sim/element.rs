//! Element capability interface
//!
//! Concrete element behavior lives outside this crate. The section only
//! holds shared handles and asks elements for what it needs: updates,
//! draws, bounds, death and a small closed set of capability tags.

use std::cell::RefCell;
use std::rc::Rc;

use super::section::Section;
use super::context::GameContext;
use crate::Rect;
use crate::level::{ElementKind, ElementPlacement};
use crate::renderer::DrawList;

/// Identifies an element (or the player) within a section
pub type ElementId = u32;

/// Id reserved for the player actor; registry ids start after it
pub const PLAYER_ID: ElementId = 0;

/// Shared element handle. Elements query and mutate each other through
/// the section, so the section holds shared references only.
pub type SharedElement = Rc<RefCell<dyn Element>>;

/// Capability tags the core distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Counts for kill-all objectives; exempt from enemy freeze while dying
    Enemy,
    /// Has an owner and is consumed on hit
    Projectile,
    /// Counts for collect-all objectives
    Collectible,
    /// Can be pushed or carried by the player
    Pushable,
    /// Accepts pushable elements (ball receptors, pressure plates)
    Receptor,
    /// Responds to `Section::activate_object`
    Activatable,
}

pub trait Element {
    fn update(&mut self, section: &mut Section, ctx: &mut dyn GameContext);

    fn draw(&self, frame: &mut DrawList, view: &Rect);

    fn bounds(&self) -> Rect;

    fn is_dead(&self) -> bool;

    fn is_visible(&self, view: &Rect) -> bool {
        self.bounds().intersects(view)
    }

    fn has_capability(&self, _capability: Capability) -> bool {
        false
    }

    /// Mid-death animation
    fn dying(&self) -> bool {
        false
    }

    /// Keeps updating while time is frozen
    fn freeze_immune(&self) -> bool {
        false
    }

    /// Who fired this element (projectiles)
    fn owner(&self) -> Option<ElementId> {
        None
    }

    /// Called once when the registry assigns an id
    fn on_registered(&mut self, _id: ElementId) {}

    /// Kind and id matched by `Section::activate_object`
    fn activation_key(&self) -> Option<(ElementKind, u32)> {
        None
    }

    fn activate(&mut self, _arg: Option<&str>) {}
}

/// Wrap a concrete element into a shared handle
pub fn shared<E: Element + 'static>(element: E) -> SharedElement {
    Rc::new(RefCell::new(element))
}

/// Builds live elements from placements, one factory per catalog kind
pub trait ElementFactory {
    fn create(&self, placement: &ElementPlacement) -> SharedElement;
}

impl<F> ElementFactory for F
where
    F: Fn(&ElementPlacement) -> SharedElement,
{
    fn create(&self, placement: &ElementPlacement) -> SharedElement {
        self(placement)
    }
}
