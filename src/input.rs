//! Input handling: keyboard plus optional pose camera
//!
//! Produces one `(lane, action)` sample per simulation tick. A detected
//! jump/crouch is held for a fixed duration so brief or noisy pose detections
//! still register as a full action.

use std::collections::HashSet;

use crate::consts::*;
use crate::pose::{PoseCell, PoseProvider};
use crate::{Action, Settings};

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
}

/// One tick's worth of resolved input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    pub lane: usize,
    pub action: Action,
}

/// Merges keyboard and pose input into per-tick lane/action samples
#[derive(Debug)]
pub struct InputSource {
    pose: PoseCell,
    camera_active: bool,
    keys_down: HashSet<Key>,
    keyboard_lane: usize,
    current_lane: usize,
    current_action: Action,
    hold_timer: f32,
    hold_action: Action,
}

impl InputSource {
    pub fn new(settings: &Settings) -> Self {
        Self {
            pose: PoseCell::new(),
            camera_active: false,
            keys_down: HashSet::new(),
            keyboard_lane: settings.center_lane(),
            current_lane: settings.center_lane(),
            current_action: Action::Stand,
            hold_timer: 0.0,
            hold_action: Action::Stand,
        }
    }

    /// Handle to the shared pose cell, for wiring up a provider or tests
    pub fn pose_cell(&self) -> PoseCell {
        self.pose.clone()
    }

    pub fn key_down(&mut self, key: Key, settings: &Settings) {
        self.keys_down.insert(key);
        match key {
            Key::Left => self.keyboard_lane = self.keyboard_lane.saturating_sub(1),
            Key::Right => {
                self.keyboard_lane = (self.keyboard_lane + 1).min(settings.max_lane());
            }
            _ => {}
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys_down.remove(&key);
    }

    /// Start the pose camera. Returns false on failure, in which case input
    /// stays on the keyboard; the failure is reported once, never retried.
    pub fn enable_camera(&mut self, provider: &mut dyn PoseProvider) -> bool {
        if provider.start(self.pose.clone()) {
            self.pose.set_active(true);
            self.camera_active = true;
            true
        } else {
            log::warn!("camera unavailable, staying on keyboard input");
            self.camera_active = false;
            false
        }
    }

    /// Stop the pose camera and release its stream
    pub fn disable_camera(&mut self, provider: &mut dyn PoseProvider) {
        provider.stop();
        self.pose.set_active(false);
        self.camera_active = false;
    }

    pub fn is_camera_active(&self) -> bool {
        self.camera_active
    }

    /// Advance hold timers and resolve the current lane/action.
    /// Called exactly once per simulation tick, in every phase.
    pub fn sample(&mut self, dt: f32, settings: &Settings) -> TickInput {
        let raw_action;

        if settings.camera_enabled && self.camera_active {
            let reading = self.pose.reading();
            self.current_lane = Self::offset_to_lane(reading.offset_x, settings);
            // Keyboard can still override the pose stance
            raw_action = if self.key_action() != Action::Stand {
                self.key_action()
            } else {
                reading.stance
            };
        } else {
            self.current_lane = self.keyboard_lane.min(settings.max_lane());
            raw_action = self.key_action();
        }

        // A jump/crouch refreshes the hold; while held, the held action wins
        if raw_action == Action::Jump || raw_action == Action::Crouch {
            self.hold_timer = ACTION_HOLD_DURATION;
            self.hold_action = raw_action;
        }

        if self.hold_timer > 0.0 {
            self.hold_timer -= dt;
            self.current_action = self.hold_action;
        } else {
            self.current_action = raw_action;
        }

        TickInput {
            lane: self.current_lane,
            action: self.current_action,
        }
    }

    /// Recenter for a new game
    pub fn reset(&mut self, settings: &Settings) {
        self.keyboard_lane = settings.center_lane();
        self.current_lane = self.keyboard_lane;
        self.current_action = Action::Stand;
        self.hold_timer = 0.0;
        self.hold_action = Action::Stand;
        self.keys_down.clear();
    }

    fn key_action(&self) -> Action {
        if self.keys_down.contains(&Key::Up) || self.keys_down.contains(&Key::Space) {
            Action::Jump
        } else if self.keys_down.contains(&Key::Down) {
            Action::Crouch
        } else {
            Action::Stand
        }
    }

    /// Map the smoothed pose offset to a lane index
    fn offset_to_lane(offset_x: f32, settings: &Settings) -> usize {
        if settings.lane_count == 3 {
            if offset_x < -LANE_EDGE_X {
                0
            } else if offset_x > LANE_EDGE_X {
                2
            } else {
                1
            }
        } else if offset_x < 0.0 {
            0
        } else {
            1
        }
    }
}
