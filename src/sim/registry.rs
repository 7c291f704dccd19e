//! Element registry
//!
//! Owns the section's live element handles, the opt-in interaction set,
//! effects, reveal tiles and the passenger chain. Elements borrowed for
//! their own update are skipped by every query here (`try_borrow`), so an
//! element never matches against itself mid-update.

use glam::Vec2;

use super::context::TimeFreeze;
use super::effects::Effect;
use super::element::{Capability, Element, ElementId, PLAYER_ID, SharedElement};
use super::reveal::RevealTile;
use crate::Rect;
use crate::level::ElementKind;

#[derive(Clone)]
struct Entry {
    id: ElementId,
    element: SharedElement,
}

/// Objective counters gathered during the element update pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Census {
    pub enemies: usize,
    pub collectibles: usize,
}

impl Census {
    pub fn record(&mut self, element: &dyn Element) {
        if element.has_capability(Capability::Enemy) {
            self.enemies += 1;
        }
        if element.has_capability(Capability::Collectible) {
            self.collectibles += 1;
        }
    }
}

/// Whether an element takes its update this step.
///
/// Elements outside the view never update. Time freezes stop enemies
/// (`Enemies`) or everything (`All`); dying enemies and freeze-immune
/// elements update regardless.
pub fn should_update(element: &dyn Element, view: &Rect, freeze: TimeFreeze) -> bool {
    if !element.is_visible(view) {
        return false;
    }
    let enemy = element.has_capability(Capability::Enemy);
    let unfrozen = match freeze {
        TimeFreeze::None => true,
        TimeFreeze::Enemies => !enemy,
        TimeFreeze::All => false,
    };
    unfrozen || (enemy && element.dying()) || element.freeze_immune()
}

pub struct ElementRegistry {
    elements: Vec<Entry>,
    interactive: Vec<Entry>,
    effects: Vec<Box<dyn Effect>>,
    reveal_tiles: Vec<RevealTile>,
    /// Follow-the-leader chain; slot 0 is always the leading actor
    passengers: Vec<ElementId>,
    next_id: ElementId,
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            interactive: Vec::new(),
            effects: Vec::new(),
            reveal_tiles: Vec::new(),
            passengers: vec![PLAYER_ID],
            next_id: PLAYER_ID + 1,
        }
    }

    /// Drop everything; ids keep counting up
    pub fn clear(&mut self) {
        self.elements.clear();
        self.interactive.clear();
        self.effects.clear();
        self.reveal_tiles.clear();
        self.passengers.truncate(1);
    }

    /// Add an element to the active set and assign its id
    pub fn add(&mut self, element: SharedElement) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        element.borrow_mut().on_registered(id);
        self.elements.push(Entry { id, element });
        id
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: ElementId) -> Option<SharedElement> {
        self.elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.element.clone())
    }

    /// Active elements in registration order
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &SharedElement)> {
        self.elements.iter().map(|e| (e.id, &e.element))
    }

    /// Handles for an update pass, in registration order
    pub fn snapshot(&self) -> Vec<(ElementId, SharedElement)> {
        self.elements
            .iter()
            .map(|e| (e.id, e.element.clone()))
            .collect()
    }

    /// Remove an element from every collection it belongs to
    pub fn remove(&mut self, id: ElementId) -> Option<SharedElement> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        let entry = self.elements.remove(index);
        self.interactive.retain(|e| e.id != id);
        self.remove_passenger(id);
        Some(entry.element)
    }

    // === Interaction set ===

    /// Opt an active element into `element_at` queries
    pub fn register_interactive(&mut self, id: ElementId) -> bool {
        if self.interactive.iter().any(|e| e.id == id) {
            return true;
        }
        match self.elements.iter().find(|e| e.id == id) {
            Some(entry) => {
                let entry = entry.clone();
                self.interactive.push(entry);
                true
            }
            None => false,
        }
    }

    pub fn unregister_interactive(&mut self, id: ElementId) {
        self.interactive.retain(|e| e.id != id);
    }

    /// First registered interactive element with `capability` whose bounds
    /// contain `point` (edges included)
    pub fn element_at(&self, capability: Capability, point: Vec2) -> Option<SharedElement> {
        self.interactive
            .iter()
            .find(|entry| {
                entry.element.try_borrow().is_ok_and(|e| {
                    e.has_capability(capability) && e.bounds().contains_inclusive(point)
                })
            })
            .map(|entry| entry.element.clone())
    }

    /// Consume the first projectile not owned by `target` that overlaps
    /// `bounds`. At most one projectile resolves per call.
    pub fn projectile_hit(&mut self, target: ElementId, bounds: &Rect) -> Option<SharedElement> {
        let id = self.elements.iter().find_map(|entry| {
            let e = entry.element.try_borrow().ok()?;
            let hit = e.has_capability(Capability::Projectile)
                && e.owner() != Some(target)
                && e.bounds().intersects(bounds);
            hit.then_some(entry.id)
        })?;
        self.remove(id)
    }

    /// Whether `center` lies inside the blast of any explosion not owned
    /// by `target`
    pub fn explode(&self, target: ElementId, center: Vec2) -> bool {
        self.effects
            .iter()
            .filter_map(|e| e.blast())
            .any(|blast| blast.owner != target && blast.reaches(center))
    }

    /// Activate the first element whose activation key matches
    pub fn activate(&self, kind: ElementKind, id: u32, arg: Option<&str>) -> bool {
        for entry in &self.elements {
            let Ok(mut element) = entry.element.try_borrow_mut() else {
                continue;
            };
            if element.activation_key() == Some((kind, id)) {
                element.activate(arg);
                return true;
            }
        }
        false
    }

    // === Effects ===

    pub fn add_effect(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    /// Advance every effect, dropping the ones that died
    pub fn update_effects(&mut self) {
        self.effects.retain_mut(|effect| {
            effect.update();
            !effect.is_dead()
        });
    }

    pub fn effects(&self) -> &[Box<dyn Effect>] {
        &self.effects
    }

    // === Reveal tiles ===

    pub fn set_reveal_tiles(&mut self, tiles: Vec<RevealTile>) {
        self.reveal_tiles = tiles;
    }

    pub fn reveal_tiles(&self) -> &[RevealTile] {
        &self.reveal_tiles
    }

    pub fn reveal_tiles_mut(&mut self) -> &mut [RevealTile] {
        &mut self.reveal_tiles
    }

    // === Passenger chain ===

    pub fn passengers(&self) -> &[ElementId] {
        &self.passengers
    }

    /// Point the head of the chain at the current leading actor
    pub fn sync_passengers(&mut self, leader: ElementId) {
        match self.passengers.first_mut() {
            Some(head) => *head = leader,
            None => self.passengers.push(leader),
        }
    }

    pub fn add_passenger(&mut self, id: ElementId) {
        if !self.passengers.contains(&id) {
            self.passengers.push(id);
        }
    }

    /// Drop a trailing passenger; the leader slot is never removed
    pub fn remove_passenger(&mut self, id: ElementId) {
        if let Some(index) = self.passengers.iter().skip(1).position(|&p| p == id) {
            self.passengers.remove(index + 1);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::renderer::DrawList;
    use crate::sim::context::GameContext;
    use crate::sim::effects::Explosion;
    use crate::sim::element::shared;
    use crate::sim::section::Section;

    /// Inert element with configurable capabilities
    pub(crate) struct Probe {
        pub bounds: Rect,
        pub caps: Vec<Capability>,
        pub owner: Option<ElementId>,
        pub dying: bool,
        pub immune: bool,
        pub key: Option<(ElementKind, u32)>,
        pub activated: Rc<Cell<u32>>,
    }

    impl Probe {
        pub fn new(x: f32, y: f32, caps: &[Capability]) -> Self {
            Self {
                bounds: Rect::new(x, y, 16.0, 16.0),
                caps: caps.to_vec(),
                owner: None,
                dying: false,
                immune: false,
                key: None,
                activated: Rc::new(Cell::new(0)),
            }
        }
    }

    impl Element for Probe {
        fn update(&mut self, _section: &mut Section, _ctx: &mut dyn GameContext) {}

        fn draw(&self, _frame: &mut DrawList, _view: &Rect) {}

        fn bounds(&self) -> Rect {
            self.bounds
        }

        fn is_dead(&self) -> bool {
            false
        }

        fn has_capability(&self, capability: Capability) -> bool {
            self.caps.contains(&capability)
        }

        fn dying(&self) -> bool {
            self.dying
        }

        fn freeze_immune(&self) -> bool {
            self.immune
        }

        fn owner(&self) -> Option<ElementId> {
            self.owner
        }

        fn activation_key(&self) -> Option<(ElementKind, u32)> {
            self.key
        }

        fn activate(&mut self, _arg: Option<&str>) {
            self.activated.set(self.activated.get() + 1);
        }
    }

    #[test]
    fn test_ids_start_after_player() {
        let mut registry = ElementRegistry::new();
        let a = registry.add(shared(Probe::new(0.0, 0.0, &[])));
        let b = registry.add(shared(Probe::new(0.0, 0.0, &[])));
        assert_eq!((a, b), (1, 2));
        assert_eq!(registry.passengers(), &[PLAYER_ID]);
    }

    #[test]
    fn test_element_at_requires_registration() {
        let mut registry = ElementRegistry::new();
        let id = registry.add(shared(Probe::new(10.0, 10.0, &[Capability::Pushable])));
        let point = Vec2::new(26.0, 26.0);
        assert!(registry.element_at(Capability::Pushable, point).is_none());

        assert!(registry.register_interactive(id));
        assert!(registry.element_at(Capability::Pushable, point).is_some());
        assert!(registry.element_at(Capability::Receptor, point).is_none());

        registry.unregister_interactive(id);
        assert!(registry.element_at(Capability::Pushable, point).is_none());
        assert!(!registry.register_interactive(99));
    }

    #[test]
    fn test_element_at_skips_borrowed_elements() {
        let mut registry = ElementRegistry::new();
        let element = shared(Probe::new(0.0, 0.0, &[Capability::Pushable]));
        let id = registry.add(element.clone());
        registry.register_interactive(id);

        let _busy = element.borrow_mut();
        assert!(registry.element_at(Capability::Pushable, Vec2::new(4.0, 4.0)).is_none());
    }

    #[test]
    fn test_projectile_hit_consumes_once() {
        let mut registry = ElementRegistry::new();
        let mut shot = Probe::new(0.0, 0.0, &[Capability::Projectile]);
        shot.owner = Some(7);
        let shot_id = registry.add(shared(shot));
        let target = Rect::new(8.0, 8.0, 16.0, 16.0);

        // The owner is never hit by its own projectile
        assert!(registry.projectile_hit(7, &target).is_none());

        assert!(registry.projectile_hit(PLAYER_ID, &target).is_some());
        assert!(!registry.contains(shot_id));
        assert!(registry.projectile_hit(PLAYER_ID, &target).is_none());
    }

    #[test]
    fn test_explode_excludes_owner() {
        let mut registry = ElementRegistry::new();
        registry.add_effect(Box::new(Explosion::new(5, Vec2::new(100.0, 100.0), 30.0, 10)));

        assert!(registry.explode(PLAYER_ID, Vec2::new(120.0, 100.0)));
        assert!(!registry.explode(5, Vec2::new(120.0, 100.0)));
        assert!(!registry.explode(PLAYER_ID, Vec2::new(140.0, 100.0)));
    }

    #[test]
    fn test_dead_effects_removed_on_update() {
        let mut registry = ElementRegistry::new();
        registry.add_effect(Box::new(Explosion::new(1, Vec2::ZERO, 10.0, 1)));
        registry.add_effect(Box::new(Explosion::new(1, Vec2::ZERO, 10.0, 3)));
        registry.update_effects();
        assert_eq!(registry.effects().len(), 1);
    }

    #[test]
    fn test_freeze_rules() {
        let view = Rect::new(0.0, 0.0, 800.0, 600.0);
        let plain = Probe::new(10.0, 10.0, &[]);
        let enemy = Probe::new(10.0, 10.0, &[Capability::Enemy]);
        let mut dying_enemy = Probe::new(10.0, 10.0, &[Capability::Enemy]);
        dying_enemy.dying = true;
        let mut immune = Probe::new(10.0, 10.0, &[]);
        immune.immune = true;
        let offscreen = Probe::new(2000.0, 10.0, &[]);

        assert!(should_update(&plain, &view, TimeFreeze::None));
        assert!(should_update(&plain, &view, TimeFreeze::Enemies));
        assert!(!should_update(&enemy, &view, TimeFreeze::Enemies));
        assert!(should_update(&dying_enemy, &view, TimeFreeze::Enemies));
        assert!(!should_update(&plain, &view, TimeFreeze::All));
        assert!(should_update(&dying_enemy, &view, TimeFreeze::All));
        assert!(should_update(&immune, &view, TimeFreeze::All));
        assert!(!should_update(&offscreen, &view, TimeFreeze::None));
    }

    #[test]
    fn test_activate_first_match() {
        let mut registry = ElementRegistry::new();
        let mut first = Probe::new(0.0, 0.0, &[Capability::Activatable]);
        first.key = Some((ElementKind::Door, 3));
        let first_count = first.activated.clone();
        let mut second = Probe::new(0.0, 0.0, &[Capability::Activatable]);
        second.key = Some((ElementKind::Door, 3));
        let second_count = second.activated.clone();
        registry.add(shared(first));
        registry.add(shared(second));

        assert!(registry.activate(ElementKind::Door, 3, None));
        assert_eq!((first_count.get(), second_count.get()), (1, 0));
        assert!(!registry.activate(ElementKind::Door, 4, None));
    }

    #[test]
    fn test_passenger_chain() {
        let mut registry = ElementRegistry::new();
        let id = registry.add(shared(Probe::new(0.0, 0.0, &[])));
        registry.add_passenger(id);
        registry.add_passenger(id);
        assert_eq!(registry.passengers(), &[PLAYER_ID, id]);

        registry.sync_passengers(42);
        assert_eq!(registry.passengers(), &[42, id]);

        registry.remove(id);
        assert_eq!(registry.passengers(), &[42]);
        registry.remove_passenger(42);
        assert_eq!(registry.passengers(), &[42]);
    }
}
