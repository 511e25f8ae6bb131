//! Runner state
//!
//! Lane, action, derived screen position, and the action-dependent hitbox that
//! gives the safe-action collision rule its meaning: a jumping runner's box no
//! longer overlaps a ground-level hazard, a crouching one slips under an
//! overhead bar, a pushup flattens the box to floor level.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{Action, Rect, RoadGeometry, Settings};

/// One afterimage sample for the renderer's trail
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub lane: usize,
    pub action: Action,
    pub time: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runner {
    pub lane: usize,
    pub action: Action,
    /// Base screen position (lane center, fixed depth)
    pub pos: Vec2,
    /// Display y with the per-action offset applied
    pub display_y: f32,
    pub width: f32,
    pub height: f32,
    /// Position history, oldest first, capped at MAX_TRAIL
    pub trail: Vec<TrailPoint>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            lane: 0,
            action: Action::Stand,
            pos: Vec2::ZERO,
            display_y: 0.0,
            width: RUNNER_WIDTH,
            height: RUNNER_HEIGHT,
            trail: Vec::with_capacity(MAX_TRAIL),
        }
    }
}

impl Runner {
    pub fn new(settings: &Settings) -> Self {
        Self {
            lane: settings.center_lane(),
            ..Self::default()
        }
    }

    /// Move to a lane, clamped to the valid range whatever the input
    pub fn set_lane(&mut self, lane: i32, settings: &Settings) {
        self.lane = lane.clamp(0, settings.max_lane() as i32) as usize;
    }

    /// Any action may follow any other; no transition validation
    pub fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    /// Recompute screen position from lane and action, and append a trail
    /// sample (FIFO, oldest evicted first)
    pub fn update_position(&mut self, road: &RoadGeometry, time: f32) {
        self.pos = Vec2::new(
            road.lane_center_x(self.lane),
            road.height * RUNNER_BASE_Y_FRAC,
        );

        self.display_y = match self.action {
            Action::Jump => self.pos.y - JUMP_RISE,
            Action::Crouch => self.pos.y + CROUCH_DROP,
            Action::Pushup => self.pos.y + PUSHUP_DROP,
            Action::Stand => self.pos.y,
        };

        self.trail.push(TrailPoint {
            pos: Vec2::new(self.pos.x, self.display_y),
            lane: self.lane,
            action: self.action,
            time,
        });
        if self.trail.len() > MAX_TRAIL {
            self.trail.remove(0);
        }
    }

    /// Collision hitbox for the current action
    pub fn rect(&self) -> Rect {
        match self.action {
            // Airborne: lifted with the display position, shortened
            Action::Jump => Rect::new(
                self.pos.x - self.width / 2.0,
                self.display_y - self.height / 2.0,
                self.width,
                self.height * 0.6,
            ),
            // Low profile from the base line down
            Action::Crouch => Rect::new(
                self.pos.x - self.width / 2.0,
                self.pos.y,
                self.width,
                self.height * 0.4,
            ),
            // Flat to the floor, wider than standing
            Action::Pushup => Rect::new(
                self.pos.x - self.width * 0.75,
                self.pos.y + 10.0,
                self.width * 1.5,
                self.height * 0.2,
            ),
            Action::Stand => Rect::new(
                self.pos.x - self.width / 2.0,
                self.pos.y - self.height / 2.0,
                self.width,
                self.height,
            ),
        }
    }

    /// Sprite dimensions for the renderer (distinct from the hitbox)
    pub fn display_size(&self) -> Vec2 {
        match self.action {
            Action::Crouch => Vec2::new(self.width * 1.2, self.height * 0.5),
            Action::Pushup => Vec2::new(self.width * 1.5, self.height * 0.3),
            _ => Vec2::new(self.width, self.height),
        }
    }

    /// Back to the center lane with an empty trail
    pub fn reset(&mut self, settings: &Settings) {
        self.lane = settings.center_lane();
        self.action = Action::Stand;
        self.trail.clear();
    }
}
