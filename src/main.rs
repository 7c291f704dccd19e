//! Tilesection headless runner
//!
//! Loads a section descriptor, starts it with inert placeholder elements
//! and a standing player, then steps it for a number of frames.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;

use tilesection::level::{ElementKind, ElementPlacement, SectionId, StageTables};
use tilesection::renderer::{DrawCommand, DrawList};
use tilesection::sim::{Actor, Element, GameContext, SharedElement, shared};
use tilesection::{LoadError, Rect, Section, Settings, StepOutcome, parse_section};

/// Tilesection - step a platformer section without a window
#[derive(Parser)]
#[command(name = "tilesection")]
#[command(version)]
struct Cli {
    /// Section descriptor file
    descriptor: PathBuf,

    /// Number of steps to simulate
    #[arg(short, long, default_value = "600")]
    steps: u32,

    /// JSON settings file (defaults apply to missing fields)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Entrance to spawn at (defaults to the section's default entrance)
    #[arg(short, long)]
    entrance: Option<u32>,
}

/// Stands in for a concrete element kind
struct Placeholder {
    kind: ElementKind,
    bounds: Rect,
}

impl Element for Placeholder {
    fn update(&mut self, _section: &mut Section, _ctx: &mut dyn GameContext) {}

    fn draw(&self, frame: &mut DrawList, view: &Rect) {
        frame.push(DrawCommand::Sprite {
            key: self.kind.name(),
            frame: 0,
            pos: self.bounds.pos - view.pos,
            alpha: u8::MAX,
        });
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn is_dead(&self) -> bool {
        false
    }
}

struct StandingPlayer {
    bounds: Rect,
    active: bool,
}

impl Actor for StandingPlayer {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn warp_to(&mut self, pos: Vec2) {
        self.bounds.pos = pos;
    }

    fn set_active(&mut self, active: bool) {
        if self.active != active {
            log::debug!("Player control {}", if active { "enabled" } else { "disabled" });
        }
        self.active = active;
    }
}

struct Headless {
    player: StandingPlayer,
}

impl GameContext for Headless {
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

    fn kill_player(&mut self) {
        log::info!("Player died");
    }

    fn lives(&self) -> u32 {
        1
    }

    fn confirm_pressed(&self) -> bool {
        false
    }

    fn play_song(&mut self, song: &str) {
        log::info!("Playing song '{}'", song);
    }
}

fn run(cli: &Cli) -> Result<(), LoadError> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let descriptor = std::fs::read_to_string(&cli.descriptor).map_err(|source| LoadError::Io {
        path: cli.descriptor.clone(),
        source,
    })?;
    let mut tables = StageTables::default();
    let layout = parse_section(descriptor.trim(), SectionId(0), settings.cell_size, &mut tables)?;

    let entrance = cli.entrance.or(layout.default_entrance);
    let spawn = match entrance.map(|index| (index, tables.entrances.get(&index))) {
        Some((_, Some(e))) => e.pos,
        Some((index, None)) => {
            log::warn!("Entrance {} not found, spawning at the origin", index);
            Vec2::ZERO
        }
        None => Vec2::ZERO,
    };

    let cell = settings.cell_size;
    let factory = move |placement: &ElementPlacement| -> SharedElement {
        shared(Placeholder {
            kind: placement.kind,
            bounds: Rect {
                pos: placement.pos,
                size: Vec2::splat(cell),
            },
        })
    };

    let mut ctx = Headless {
        player: StandingPlayer {
            bounds: Rect::new(0.0, 0.0, 20.0, 28.0),
            active: false,
        },
    };
    let mut section = Section::new(layout, settings);
    section.start(&tables.switches, &factory, spawn, &mut ctx);

    let mut frame = DrawList::new();
    let mut outcome = StepOutcome::Continue;
    let mut steps = 0;
    while steps < cli.steps && outcome == StepOutcome::Continue {
        outcome = section.step(&mut ctx);
        frame.clear();
        section.draw(&ctx, &mut frame);
        steps += 1;
    }

    let grid = section.grid();
    let obstacles = section.get_obstacles(Vec2::ZERO, grid.pixel_size());
    let passable = obstacles.iter().filter(|o| o.passable).count();
    log::info!(
        "Ran {} steps: {:?}; {}x{} grid, {} obstacles ({} one-way), {} elements, {} draw requests",
        steps,
        outcome,
        grid.width(),
        grid.height(),
        obstacles.len(),
        passable,
        section.registry().len(),
        frame.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
