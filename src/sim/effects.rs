//! Transient, non-colliding effects

use glam::Vec2;

use super::element::ElementId;
use crate::Rect;
use crate::consts::FADE_STEP;
use crate::renderer::{DrawCommand, DrawList};

/// Hit-test shape of an explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blast {
    pub owner: ElementId,
    pub center: Vec2,
    pub radius: f32,
}

impl Blast {
    pub fn reaches(&self, point: Vec2) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }
}

pub trait Effect {
    fn update(&mut self);

    fn draw(&self, frame: &mut DrawList, view: &Rect);

    fn is_dead(&self) -> bool;

    /// Explosion-capable effects expose their blast
    fn blast(&self) -> Option<Blast> {
        None
    }
}

/// Steps spent fading in
const SCORE_FADE_IN: u32 = 15;
/// Step after which the readout fades out
const SCORE_FADE_OUT: u32 = 135;
/// Upward drift per step
const SCORE_RISE: f32 = 0.5;

/// Floating score readout
#[derive(Debug, Clone)]
pub struct ScoreEffect {
    pos: Vec2,
    text: String,
    alpha: u8,
    timer: u32,
    dead: bool,
}

impl ScoreEffect {
    pub fn new(pos: Vec2, score: u32) -> Self {
        Self {
            pos,
            text: score.to_string(),
            alpha: 0,
            timer: 0,
            dead: false,
        }
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }
}

impl Effect for ScoreEffect {
    fn update(&mut self) {
        if self.timer < SCORE_FADE_IN {
            self.alpha = self.alpha.saturating_add(FADE_STEP);
        } else if self.timer > SCORE_FADE_OUT {
            self.alpha = self.alpha.saturating_sub(FADE_STEP);
            if self.alpha == 0 {
                self.dead = true;
            }
        }
        self.pos.y -= SCORE_RISE;
        self.timer += 1;
    }

    fn draw(&self, frame: &mut DrawList, view: &Rect) {
        frame.push(DrawCommand::Text {
            text: self.text.clone(),
            pos: self.pos - view.pos,
            alpha: self.alpha,
            scale: 1.5,
        });
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

/// Explosion with a circular blast lasting a fixed number of steps
#[derive(Debug, Clone)]
pub struct Explosion {
    blast: Blast,
    frames: u32,
    timer: u32,
}

impl Explosion {
    pub fn new(owner: ElementId, center: Vec2, radius: f32, frames: u32) -> Self {
        Self {
            blast: Blast {
                owner,
                center,
                radius,
            },
            frames,
            timer: 0,
        }
    }
}

impl Effect for Explosion {
    fn update(&mut self) {
        self.timer += 1;
    }

    fn draw(&self, frame: &mut DrawList, view: &Rect) {
        frame.push(DrawCommand::Sprite {
            key: "explosion",
            frame: self.timer,
            pos: self.blast.center - Vec2::splat(self.blast.radius) - view.pos,
            alpha: u8::MAX,
        });
    }

    fn is_dead(&self) -> bool {
        self.timer >= self.frames
    }

    fn blast(&self) -> Option<Blast> {
        Some(self.blast)
    }
}
