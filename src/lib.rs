//! Projection Run - a record-then-replay lane runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (phases, reservation playback, obstacles, scoring)
//! - `input`: Keyboard + pose input with action-hold debounce
//! - `pose`: Pose-provider interface and shared last-write-wins cell
//! - `settings`: Global configuration, persisted in LocalStorage on web
//! - `highscores`: Single best-score scalar

pub mod highscores;
pub mod input;
pub mod pose;
pub mod settings;
pub mod sim;

pub use highscores::BestScore;
pub use settings::{GameMode, Settings};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Largest single-tick timestep; anything bigger is a stall, not gameplay
    pub const MAX_TICK_DT: f32 = 0.1;

    /// Phase durations (seconds); RESERVE duration comes from settings
    pub const READY_DURATION: f32 = 1.0;
    pub const EXECUTE_DURATION: f32 = 0.5;

    /// Reservation trace sampling interval (seconds, i.e. 10 Hz)
    pub const RECORD_INTERVAL: f32 = 0.1;

    /// Jump/crouch inputs stay active this long despite noisy pose detections
    pub const ACTION_HOLD_DURATION: f32 = 1.0;

    /// Runner nominal body size
    pub const RUNNER_WIDTH: f32 = 36.0;
    pub const RUNNER_HEIGHT: f32 = 48.0;
    /// Runner's fixed screen depth as a fraction of play-area height
    pub const RUNNER_BASE_Y_FRAC: f32 = 0.78;
    /// Display-vertical offsets per action
    pub const JUMP_RISE: f32 = 30.0;
    pub const CROUCH_DROP: f32 = 10.0;
    pub const PUSHUP_DROP: f32 = 20.0;
    /// Position-history samples kept for the renderer's afterimage trail
    pub const MAX_TRAIL: usize = 30;

    /// Obstacle spawn tuning (distance-driven lookahead strategy)
    pub const SPAWN_START_Y: f32 = -80.0;
    pub const SPAWN_BASE_INTERVAL: f32 = 0.8;
    pub const SPAWN_MIN_INTERVAL: f32 = 0.3;
    pub const SPAWN_INTERVAL_DECAY: f32 = 0.008;
    pub const SPAWN_LOOKAHEAD: f32 = 3000.0;
    /// Obstacles this far past the runner are evicted
    pub const DESPAWN_Y: f32 = 2000.0;

    /// Obstacle kind selection: warm-up before anything but Normal appears,
    /// then cumulative bands over a uniform roll in [0, 1)
    pub const KIND_WARMUP_SECS: f32 = 0.5;
    pub const CRAWL_UNLOCK_SECS: f32 = 1.0;
    pub const CRAWL_BAND: f32 = 0.15;
    pub const GROUND_BAND: f32 = 0.35;
    pub const OVERHEAD_BAND: f32 = 0.60;
    /// Chance an evadable-by-action batch blocks every lane
    pub const FULL_ROW_CHANCE: f32 = 0.7;
    /// Chance a partial evadable batch blocks two lanes instead of one
    pub const EVADABLE_DOUBLE_CHANCE: f32 = 0.4;
    /// Chance a Normal batch blocks two lanes instead of one
    pub const NORMAL_DOUBLE_CHANCE: f32 = 0.35;
    /// Overhead hazard zone extends this far ahead of its visual position
    pub const OVERHEAD_REACH: f32 = 20.0;

    /// Score accrues at speed * dt / SCORE_DIVISOR
    pub const SCORE_DIVISOR: f32 = 10.0;
    /// EXECUTE phase plays the world back at this speed multiple
    pub const EXECUTE_SPEED_MULT: f32 = 2.0;

    /// Pose-derived lane offset smoothing (EMA weight of the new sample)
    pub const POSE_SMOOTHING: f32 = 0.2;
    /// Hip-center y bands for stance detection (0 = screen top)
    pub const PUSHUP_HIP_Y: f32 = 1.0;
    pub const CROUCH_HIP_Y: f32 = 0.7;
    pub const JUMP_HIP_Y: f32 = 0.4;
    /// Shoulder-center offset beyond which a 3-lane setup leaves the middle lane
    pub const LANE_EDGE_X: f32 = 0.33;
}

/// The runner's posture; each evades exactly one obstacle kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    Stand,
    Jump,
    Crouch,
    Pushup,
}

/// Axis-aligned screen rectangle used for hitboxes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// AABB overlap test (strict, shared edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && self.pos.x + self.size.x > other.pos.x
            && self.pos.y < other.pos.y + other.size.y
            && self.pos.y + self.size.y > other.pos.y
    }
}

/// Road layout for the current viewport and lane count.
///
/// Recomputed from settings every tick so a lane-count change between games
/// takes effect on the next reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadGeometry {
    /// Left edge of the road in screen units
    pub left: f32,
    /// Width of a single lane
    pub lane_width: f32,
    /// Play-area height
    pub height: f32,
}

impl RoadGeometry {
    /// Lay the road out centered, spanning half the viewport width
    pub fn from_viewport(width: f32, height: f32, lane_count: usize) -> Self {
        let road_width = width * 0.5;
        Self {
            left: (width - road_width) / 2.0,
            lane_width: road_width / lane_count.max(1) as f32,
            height,
        }
    }

    /// X coordinate of a lane's center line
    pub fn lane_center_x(&self, lane: usize) -> f32 {
        self.left + self.lane_width * lane as f32 + self.lane_width / 2.0
    }
}

/// Set up panic reporting and logging for the browser build
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
