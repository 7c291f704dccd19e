//! Section runtime
//!
//! Owns one parsed section and advances it one step per frame: element
//! and effect updates, reveal tiles, the camera, tile animation, the
//! player, then terminal conditions (death countdown, bonus completion,
//! finish, border exits and pits).

use glam::Vec2;

use super::anim::TileAnimation;
use super::camera::CameraController;
use super::context::{BonusObjective, GameContext, TimeFreeze};
use super::effects::{Effect, ScoreEffect};
use super::element::{Capability, ElementFactory, ElementId, SharedElement};
use super::grid::{BorderExit, Ramp, TileGrid};
use super::obstacles::{Obstacle, obstacle_at, obstacles_around};
use super::registry::{Census, ElementRegistry, should_update};
use super::reveal;
use crate::Rect;
use crate::level::{BackgroundLayer, ElementKind, ElementPlacement, SectionId, SectionLayout, SwitchSlot};
use crate::renderer::{BackgroundScroll, DrawCommand, DrawList, LightMap, LightTile};
use crate::settings::Settings;

/// Lifecycle of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionState {
    /// Parsed but not started
    #[default]
    Loading,
    Active,
    /// Player died; waiting for confirm input or the game-over delay
    PlayerDeadCountdown,
    /// Player crossed the exit edge
    NextSection,
    Finished,
}

/// Result of one step, for the stage loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// Player left through the border exit
    NextSection,
    /// Goal reached or bonus objective completed
    Finished,
    /// Pause input was pressed this step
    Paused,
}

/// Parallax factor of the first background layer
const BG_PARALLAX_BASE: f32 = 0.5;
/// Parallax factor added per deeper layer
const BG_PARALLAX_STEP: f32 = 0.1;

pub struct Section {
    id: SectionId,
    grid: TileGrid,
    ramps: Vec<Ramp>,
    backgrounds: Vec<BackgroundLayer>,
    music: String,
    placements: Vec<ElementPlacement>,
    default_entrance: Option<u32>,
    settings: Settings,

    registry: ElementRegistry,
    /// Obstacles registered by elements (moving walls, lifts)
    obstacles: Vec<Obstacle>,
    camera: CameraController,
    light: LightMap,
    anim: TileAnimation,

    state: SectionState,
    dead_timer: u32,
    /// Entrance the player is warping to
    warp: Option<u32>,
    finished: bool,
    reload: bool,
    /// Last checkpoint entrance
    entrance: Option<u32>,
}

impl Section {
    pub fn new(layout: SectionLayout, settings: Settings) -> Self {
        let (cols, rows) = settings.viewport_cells();
        Self {
            id: layout.id,
            grid: layout.grid,
            ramps: layout.ramps,
            backgrounds: layout.backgrounds,
            music: layout.music,
            placements: layout.placements,
            default_entrance: layout.default_entrance,
            settings,
            registry: ElementRegistry::new(),
            obstacles: Vec::new(),
            camera: CameraController::new(),
            light: LightMap::new(cols, rows),
            anim: TileAnimation::new(),
            state: SectionState::Loading,
            dead_timer: 0,
            warp: None,
            finished: false,
            reload: false,
            entrance: None,
        }
    }

    /// Instantiate elements, reset per-visit state and place the player at
    /// `spawn`. `switches` holds the stage's switch placements; only those
    /// belonging to this section are created.
    pub fn start(
        &mut self,
        switches: &[ElementPlacement],
        factory: &dyn ElementFactory,
        spawn: Vec2,
        ctx: &mut dyn GameContext,
    ) {
        self.registry.clear();
        self.obstacles.clear();
        self.light.clear();
        self.dead_timer = 0;
        self.warp = None;
        self.finished = false;
        self.reload = false;

        for placement in switches.iter().filter(|s| s.section == self.id) {
            self.registry.add(factory.create(placement));
        }
        for placement in &self.placements {
            self.registry.add(factory.create(placement));
        }

        // Walls broken on a previous visit come back, except under reveal anchors
        for (_, _, tile) in self.grid.cells_mut() {
            if tile.hide != Some(reveal::REVEAL_ANCHOR) {
                tile.broken = false;
            }
        }
        self.registry.set_reveal_tiles(reveal::collect(&self.grid));
        self.anim = TileAnimation::new();

        self.state = SectionState::Active;
        log::info!(
            "Section {} started: {} elements, {} reveal tiles",
            self.id.0,
            self.registry.len(),
            self.registry.reveal_tiles().len()
        );

        self.do_warp(spawn, ctx);
        ctx.play_song(&self.music);
    }

    /// Move the player to `pos` and snap the camera there. The only path
    /// that bypasses camera smoothing.
    pub fn do_warp(&mut self, pos: Vec2, ctx: &mut dyn GameContext) {
        let player = ctx.player_mut();
        player.warp_to(pos);
        player.set_active(true);
        let center = player.bounds().center();
        let leader = player.id();

        self.camera.snap_to(center, &self.settings, self.grid.pixel_size());
        self.registry.sync_passengers(leader);
        self.warp = None;
        log::info!("Warped to ({}, {}) in section {}", pos.x, pos.y, self.id.0);
    }

    /// Begin a warp to `entrance`; the stage loop completes it
    pub fn start_warp(&mut self, entrance: u32, ctx: &mut dyn GameContext) {
        self.warp = Some(entrance);
        ctx.player_mut().set_active(false);
    }

    pub fn pending_warp(&self) -> Option<u32> {
        self.warp
    }

    /// Advance the section by one step
    pub fn step(&mut self, ctx: &mut dyn GameContext) -> StepOutcome {
        if self.state == SectionState::Loading {
            log::warn!("Section {} stepped before start", self.id.0);
            return StepOutcome::Continue;
        }
        let freeze = ctx.time_freeze();

        self.light.clear();
        let census = self.update_elements(ctx, freeze);
        self.registry.update_effects();

        let player_center = ctx.player().bounds().center();
        let view = self.view();
        for tile in self.registry.reveal_tiles_mut() {
            if tile.is_visible(&view) {
                tile.update(player_center);
            }
        }

        self.camera.track(player_center);
        self.camera.update(&self.settings, self.grid.pixel_size());

        if freeze != TimeFreeze::All {
            self.anim.advance(self.settings.tile_anim_interval);
        }

        ctx.update_player(self);

        if !self.camera.is_fixed() {
            if let Some(outcome) = self.check_terminal(ctx, census) {
                return outcome;
            }
        }

        if ctx.pause_pressed() {
            return StepOutcome::Paused;
        }
        StepOutcome::Continue
    }

    /// Update elements newest first, removing the dead ones
    fn update_elements(&mut self, ctx: &mut dyn GameContext, freeze: TimeFreeze) -> Census {
        let view = self.view();
        let mut census = Census::default();

        for (id, element) in self.registry.snapshot().into_iter().rev() {
            // Consumed earlier in this pass (projectile hits)
            if !self.registry.contains(id) {
                continue;
            }
            let run = should_update(&*element.borrow(), &view, freeze);
            if run {
                element.borrow_mut().update(self, ctx);
            }
            let dead = element.borrow().is_dead();
            if dead {
                self.registry.remove(id);
            } else {
                census.record(&*element.borrow());
            }
        }
        census
    }

    /// Terminal conditions in priority order. `Some` ends the step early.
    fn check_terminal(&mut self, ctx: &mut dyn GameContext, census: Census) -> Option<StepOutcome> {
        if ctx.player_dead() {
            self.state = SectionState::PlayerDeadCountdown;
            if self.dead_timer < self.settings.dead_timer_cap() {
                self.dead_timer += 1;
            }
            let confirmed = ctx.confirm_pressed() && self.dead_timer >= self.settings.dead_confirm_delay;
            let game_over = ctx.lives() == 0 && self.dead_timer >= self.settings.dead_game_over_delay;
            if (confirmed || game_over) && !self.reload {
                log::info!("Reloading section {} after death", self.id.0);
                self.reload = true;
            }
            return Some(StepOutcome::Continue);
        }

        let completed = match ctx.bonus_objective() {
            Some(BonusObjective::KillAll) => census.enemies == 0,
            Some(BonusObjective::CollectAll) => census.collectibles == 0,
            None => false,
        };
        if completed && !self.finished {
            log::info!("Bonus objective complete in section {}", self.id.0);
            self.finish(ctx);
        }

        if self.finished {
            self.state = SectionState::Finished;
            return Some(StepOutcome::Finished);
        }

        let body = ctx.player().bounds();
        if self.warp.is_none() && self.crossed_exit(&body) {
            log::info!("Player left section {} through {:?}", self.id.0, self.grid.border_exit);
            self.state = SectionState::NextSection;
            return Some(StepOutcome::NextSection);
        }

        let size = self.grid.pixel_size();
        if self.grid.border_exit != BorderExit::Bottom && body.pos.y >= size.y + self.settings.exit_margin {
            log::debug!("Player fell into a pit in section {}", self.id.0);
            ctx.kill_player();
            return Some(StepOutcome::Continue);
        }
        None
    }

    fn crossed_exit(&self, body: &Rect) -> bool {
        let size = self.grid.pixel_size();
        let margin = self.settings.exit_margin;
        match self.grid.border_exit {
            BorderExit::Top => body.bottom() <= -margin,
            BorderExit::Right => body.pos.x >= size.x - margin,
            BorderExit::Bottom => body.pos.y >= size.y + margin,
            BorderExit::Left => body.right() <= margin,
            BorderExit::None => false,
        }
    }

    /// Mark the section finished; the player stops and celebrates
    pub fn finish(&mut self, ctx: &mut dyn GameContext) {
        self.finished = true;
        let player = ctx.player_mut();
        player.set_active(false);
        player.celebrate();
        log::info!("Section {} finished", self.id.0);
    }

    // === Camera ===

    /// Point the camera at `target` and take control away from the player
    pub fn set_fixed_camera(&mut self, target: Vec2, ctx: &mut dyn GameContext) {
        self.camera.set_fixed(target);
        ctx.player_mut().set_active(false);
    }

    pub fn unset_fixed_camera(&mut self, ctx: &mut dyn GameContext) {
        self.camera.unset_fixed();
        ctx.player_mut().set_active(true);
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    /// Visible region in section pixels
    pub fn view(&self) -> Rect {
        self.camera.view(&self.settings)
    }

    // === Collision ===

    /// Obstacles relevant to a body at `pos` with `size` (zero for a point)
    pub fn get_obstacles(&self, pos: Vec2, size: Vec2) -> Vec<Obstacle> {
        obstacles_around(&self.grid, &self.obstacles, pos, size)
    }

    pub fn obstacle_at(&self, point: Vec2) -> bool {
        obstacle_at(&self.grid, &self.obstacles, point)
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Remove the first registered obstacle equal to `obstacle`
    pub fn remove_obstacle(&mut self, obstacle: &Obstacle) -> bool {
        match self.obstacles.iter().position(|o| o == obstacle) {
            Some(index) => {
                self.obstacles.remove(index);
                true
            }
            None => false,
        }
    }

    // === Elements and effects ===

    pub fn add(&mut self, element: SharedElement) -> ElementId {
        self.registry.add(element)
    }

    pub fn add_effect(&mut self, effect: Box<dyn Effect>) {
        self.registry.add_effect(effect);
    }

    pub fn add_score_effect(&mut self, pos: Vec2, score: u32) {
        self.add_effect(Box::new(ScoreEffect::new(pos, score)));
    }

    pub fn register_interactive(&mut self, id: ElementId) -> bool {
        self.registry.register_interactive(id)
    }

    pub fn unregister_interactive(&mut self, id: ElementId) {
        self.registry.unregister_interactive(id);
    }

    pub fn element_at(&self, capability: Capability, point: Vec2) -> Option<SharedElement> {
        self.registry.element_at(capability, point)
    }

    pub fn projectile_hit(&mut self, target: ElementId, bounds: &Rect) -> Option<SharedElement> {
        self.registry.projectile_hit(target, bounds)
    }

    pub fn explode(&self, target: ElementId, center: Vec2) -> bool {
        self.registry.explode(target, center)
    }

    /// Activate the first element of `kind` with activation id `id`
    pub fn activate_object(&self, kind: ElementKind, id: u32, arg: Option<&str>) -> bool {
        self.registry.activate(kind, id, arg)
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ElementRegistry {
        &mut self.registry
    }

    /// Record a checkpoint and hand persistence to the game context
    pub fn save_check_point(&mut self, entrance: u32, switch: Option<SwitchSlot>, ctx: &mut dyn GameContext) {
        self.entrance = Some(entrance);
        ctx.save_checkpoint(entrance, switch);
        log::debug!("Checkpoint saved at entrance {}", entrance);
    }

    /// Light a pattern of viewport cells around `body` for this frame
    pub fn add_light_tiles(&mut self, pattern: &[LightTile], body: &Rect) {
        self.light
            .add(pattern, body, self.camera.origin(), self.grid.cell_size());
    }

    // === Accessors ===

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    pub fn ramps(&self) -> &[Ramp] {
        &self.ramps
    }

    pub fn backgrounds(&self) -> &[BackgroundLayer] {
        &self.backgrounds
    }

    pub fn music(&self) -> &str {
        &self.music
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state != SectionState::Loading
    }

    /// Set once the death countdown asks the stage to reload
    pub fn reload(&self) -> bool {
        self.reload
    }

    pub fn default_entrance(&self) -> Option<u32> {
        self.default_entrance
    }

    pub fn checkpoint(&self) -> Option<u32> {
        self.entrance
    }

    pub fn light(&self) -> &LightMap {
        &self.light
    }

    // === Drawing ===

    /// Emit this frame's draw requests in painter's order
    pub fn draw(&self, ctx: &dyn GameContext, frame: &mut DrawList) {
        let view = self.view();
        self.draw_backgrounds(frame, &view);

        let cells = self.visible_cells(&view);
        for &(x, y) in &cells {
            let Some(tile) = self.grid.tile(x, y) else {
                continue;
            };
            let pos = self.grid.cell_origin(x, y) - view.pos;
            if let Some(back) = tile.back {
                frame.tile(self.anim.frame_for(back), pos);
            }
            if let Some(pass) = tile.pass {
                frame.tile(pass, pos);
            }
            if let (Some(wall), false) = (tile.wall, tile.broken) {
                frame.tile(wall, pos);
            }
        }

        for (_, element) in self.registry.elements() {
            if let Ok(element) = element.try_borrow() {
                if element.is_visible(&view) {
                    element.draw(frame, &view);
                }
            }
        }
        ctx.draw_player(frame, &view);
        for effect in self.registry.effects() {
            effect.draw(frame, &view);
        }

        for &(x, y) in &cells {
            if let Some(fore) = self.grid.tile(x, y).and_then(|t| t.fore) {
                let pos = self.grid.cell_origin(x, y) - view.pos;
                frame.tile(self.anim.frame_for(fore), pos);
            }
        }

        for tile in self.registry.reveal_tiles() {
            if tile.is_visible(&view) {
                tile.draw(frame, &view);
            }
        }

        if self.grid.dark {
            self.light.draw(frame, self.grid.cell_size());
        }
    }

    fn draw_backgrounds(&self, frame: &mut DrawList, view: &Rect) {
        let world = self.grid.pixel_size();
        let scroll_range = world.y - view.size.y;
        for (layer, bg) in self.backgrounds.iter().enumerate() {
            let factor = BG_PARALLAX_BASE + layer as f32 * BG_PARALLAX_STEP;
            let scroll = if bg.repeat_y {
                BackgroundScroll::Tiled {
                    offset_y: -view.pos.y * factor,
                }
            } else {
                BackgroundScroll::Stretched {
                    progress: if scroll_range > 0.0 { view.pos.y / scroll_range } else { 0.0 },
                }
            };
            frame.push(DrawCommand::Background {
                layer,
                name: bg.name.clone(),
                offset_x: -view.pos.x * factor,
                scroll,
            });
        }
    }

    /// Cells overlapping the view, column by column
    fn visible_cells(&self, view: &Rect) -> Vec<(usize, usize)> {
        let cell = self.grid.cell_size();
        let x0 = (view.pos.x / cell).floor().max(0.0) as usize;
        let y0 = (view.pos.y / cell).floor().max(0.0) as usize;
        let x1 = ((view.right() / cell).ceil().max(0.0) as usize).min(self.grid.width());
        let y1 = ((view.bottom() / cell).ceil().max(0.0) as usize).min(self.grid.height());
        (x0..x1)
            .flat_map(|x| (y0..y1).map(move |y| (x, y)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::context::Actor;
    use crate::sim::element::shared;
    use crate::sim::grid::Layer;
    use crate::sim::registry::tests::Probe;

    struct Body {
        bounds: Rect,
        active: bool,
    }

    impl Actor for Body {
        fn bounds(&self) -> Rect {
            self.bounds
        }

        fn warp_to(&mut self, pos: Vec2) {
            self.bounds.pos = pos;
        }

        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
    }

    struct Ctx {
        player: Body,
        songs: Vec<String>,
        checkpoints: Vec<u32>,
    }

    impl Ctx {
        fn new() -> Self {
            Self {
                player: Body {
                    bounds: Rect::new(0.0, 0.0, 20.0, 28.0),
                    active: false,
                },
                songs: Vec::new(),
                checkpoints: Vec::new(),
            }
        }
    }

    impl GameContext for Ctx {
        fn player(&self) -> &dyn Actor {
            &self.player
        }

        fn player_mut(&mut self) -> &mut dyn Actor {
            &mut self.player
        }

        fn update_player(&mut self, _section: &mut Section) {}

        fn player_dead(&self) -> bool {
            false
        }

        fn kill_player(&mut self) {}

        fn lives(&self) -> u32 {
            3
        }

        fn confirm_pressed(&self) -> bool {
            false
        }

        fn play_song(&mut self, song: &str) {
            self.songs.push(song.to_string());
        }

        fn save_checkpoint(&mut self, entrance: u32, _switch: Option<SwitchSlot>) {
            self.checkpoints.push(entrance);
        }
    }

    fn layout(width: usize, height: usize) -> SectionLayout {
        SectionLayout {
            id: SectionId(0),
            grid: TileGrid::new(width, height, 32.0),
            backgrounds: vec![
                BackgroundLayer {
                    name: "sky".into(),
                    repeat_y: true,
                },
                BackgroundLayer {
                    name: "hills".into(),
                    repeat_y: false,
                },
            ],
            music: "forest".into(),
            placements: Vec::new(),
            ramps: Vec::new(),
            default_entrance: None,
        }
    }

    fn probe_factory(placement: &ElementPlacement) -> SharedElement {
        shared(Probe::new(placement.pos.x, placement.pos.y, &[]))
    }

    #[test]
    fn test_start_creates_elements_and_plays_song() {
        let mut layout = layout(10, 10);
        let placement = ElementPlacement {
            cell: (1, 1),
            pos: Vec2::new(32.0, 32.0),
            kind: ElementKind::Goal,
            args: None,
            switch: None,
            section: SectionId(0),
        };
        layout.placements.push(placement.clone());
        let foreign_switch = ElementPlacement {
            section: SectionId(3),
            ..placement.clone()
        };

        let mut section = Section::new(layout, Settings::default());
        let mut ctx = Ctx::new();
        section.start(&[placement, foreign_switch], &probe_factory, Vec2::new(64.0, 64.0), &mut ctx);

        assert_eq!(section.registry().len(), 2);
        assert_eq!(section.state(), SectionState::Active);
        assert_eq!(ctx.songs, vec!["forest".to_string()]);
        assert!(ctx.player.active);
        assert_eq!(ctx.player.bounds.pos, Vec2::new(64.0, 64.0));
    }

    #[test]
    fn test_start_repairs_walls_outside_reveal_anchors() {
        let mut layout = layout(4, 4);
        layout.grid.tile_mut(1, 1).expect("in grid").set_layer(Layer::Wall, Some(2));
        layout.grid.set_broken(1, 1, true);
        let anchor = layout.grid.tile_mut(2, 2).expect("in grid");
        anchor.set_layer(Layer::Wall, Some(2));
        anchor.set_layer(Layer::Hide, Some(0));
        anchor.broken = true;

        let mut section = Section::new(layout, Settings::default());
        section.start(&[], &probe_factory, Vec2::ZERO, &mut Ctx::new());

        assert!(!section.grid().tile(1, 1).expect("in grid").broken);
        assert!(section.grid().tile(2, 2).expect("in grid").broken);
        assert_eq!(section.registry().reveal_tiles().len(), 1);
    }

    #[test]
    fn test_step_before_start_is_inert() {
        let mut section = Section::new(layout(4, 4), Settings::default());
        assert_eq!(section.step(&mut Ctx::new()), StepOutcome::Continue);
        assert!(!section.is_loaded());
    }

    #[test]
    fn test_dynamic_obstacles() {
        let mut section = Section::new(layout(4, 4), Settings::default());
        let lift = Obstacle::new(Rect::new(40.0, 40.0, 64.0, 8.0), true);
        section.add_obstacle(lift);
        assert!(section.obstacle_at(Vec2::new(50.0, 44.0)));
        assert!(section.get_obstacles(Vec2::ZERO, Vec2::ZERO).contains(&lift));

        assert!(section.remove_obstacle(&lift));
        assert!(!section.remove_obstacle(&lift));
        assert!(!section.obstacle_at(Vec2::new(50.0, 44.0)));
    }

    #[test]
    fn test_checkpoint_forwarded_to_context() {
        let mut section = Section::new(layout(4, 4), Settings::default());
        let mut ctx = Ctx::new();
        section.save_check_point(5, None, &mut ctx);
        assert_eq!(section.checkpoint(), Some(5));
        assert_eq!(ctx.checkpoints, vec![5]);
    }

    #[test]
    fn test_draw_order() {
        let mut layout = layout(30, 25);
        let tile = layout.grid.tile_mut(0, 0).expect("in grid");
        tile.back = Some(1);
        tile.fore = Some(90);
        layout.grid.dark = true;

        let mut section = Section::new(layout, Settings::default());
        let mut ctx = Ctx::new();
        section.start(&[], &probe_factory, Vec2::ZERO, &mut ctx);

        let mut frame = DrawList::new();
        section.draw(&ctx, &mut frame);
        let commands = frame.commands();

        assert!(matches!(
            commands[0],
            DrawCommand::Background {
                scroll: BackgroundScroll::Tiled { .. },
                ..
            }
        ));
        assert!(matches!(
            commands[1],
            DrawCommand::Background {
                scroll: BackgroundScroll::Stretched { progress },
                ..
            } if progress == 0.0
        ));
        assert!(matches!(commands[2], DrawCommand::Tile { index: 1, .. }));
        assert!(matches!(commands[3], DrawCommand::Tile { index: 90, .. }));
        // The darkness overlay closes the frame, one shade per viewport cell
        let (cols, rows) = section.settings().viewport_cells();
        assert_eq!(commands.len(), 4 + cols * rows);
        assert!(matches!(commands[4], DrawCommand::Shade { alpha: 255, .. }));
    }

    #[test]
    fn test_light_tiles_follow_camera() {
        let mut section = Section::new(layout(100, 100), Settings::default());
        let mut ctx = Ctx::new();
        section.start(&[], &probe_factory, Vec2::new(1600.0, 1600.0), &mut ctx);
        let origin = section.camera().origin();
        assert_eq!(origin, Vec2::new(1210.0, 1314.0));

        let body = Rect::new(1600.0, 1600.0, 20.0, 28.0);
        section.add_light_tiles(&[LightTile::new(0, 0, 0)], &body);
        assert_eq!(section.light().len(), 1);
    }
}
