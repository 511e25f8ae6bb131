//! Obstacle field
//!
//! Procedurally spawns obstacles ahead of the runner, advances them toward the
//! runner at the current speed, and tests collision against the runner's
//! hitbox and stance. Obstacle y is the distance from the runner's fixed
//! screen depth: negative is ahead, positive is behind.
//!
//! Two spawn strategies exist in the game's history; `ObstacleTuning.strategy`
//! selects one explicitly and they are never mixed. The default is the
//! distance-driven lookahead, which keeps the field pre-populated a fixed
//! distance ahead regardless of frame rate.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::GameMode;
use crate::{Action, Rect, RoadGeometry, Settings};

/// Obstacle flavor; all but Normal are nullified by one specific action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Blocks the lane outright; dodge by changing lanes
    #[default]
    Normal,
    /// Low bar, cleared by jumping
    Ground,
    /// Head-height bar, cleared by crouching
    Overhead,
    /// Full-width wire, cleared by a pushup
    Crawl,
}

impl ObstacleKind {
    /// The unique action that nullifies collision with this kind
    pub fn safe_action(&self) -> Option<Action> {
        match self {
            ObstacleKind::Normal => None,
            ObstacleKind::Ground => Some(Action::Jump),
            ObstacleKind::Overhead => Some(Action::Crouch),
            ObstacleKind::Crawl => Some(Action::Pushup),
        }
    }

    fn height(&self) -> f32 {
        match self {
            ObstacleKind::Normal => 50.0,
            ObstacleKind::Ground => 30.0,
            ObstacleKind::Overhead => 35.0,
            ObstacleKind::Crawl => 25.0,
        }
    }

    fn width(&self, lane_width: f32) -> f32 {
        match self {
            ObstacleKind::Normal => lane_width * 0.6,
            _ => lane_width * 0.7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub lane: usize,
    /// Distance from the runner's screen depth; negative = ahead
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: ObstacleKind,
}

impl Obstacle {
    /// Screen rectangle for collision. An overhead bar's hazard zone starts
    /// ahead of its visual position.
    pub fn rect(&self, road: &RoadGeometry) -> Rect {
        let x = road.left
            + road.lane_width * self.lane as f32
            + (road.lane_width - self.width) / 2.0;
        let y = match self.kind {
            ObstacleKind::Overhead => self.y - OVERHEAD_REACH,
            _ => self.y,
        };
        Rect::new(x, y, self.width, self.height)
    }
}

/// Which spawn scheduler drives the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnStrategy {
    /// Wall-timer countdown; batches appear at the fixed start depth
    TimeDriven,
    /// Advance a spawn cursor with the world and backfill a lookahead horizon
    #[default]
    DistanceLookahead,
}

/// Spawn tuning, injectable for tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleTuning {
    pub strategy: SpawnStrategy,
    /// Initial seconds between batches
    pub base_interval: f32,
    /// Interval floor as density ramps up
    pub min_interval: f32,
    /// Interval shrink per second of total run time
    pub interval_decay: f32,
    /// How far ahead (in distance units) the field is kept populated
    pub lookahead: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            strategy: SpawnStrategy::default(),
            base_interval: SPAWN_BASE_INTERVAL,
            min_interval: SPAWN_MIN_INTERVAL,
            interval_decay: SPAWN_INTERVAL_DECAY,
            lookahead: SPAWN_LOOKAHEAD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObstacleField {
    pub obstacles: Vec<Obstacle>,
    tuning: ObstacleTuning,
    seed: u64,
    rng: Pcg32,
    /// Cursor for the distance-driven strategy
    last_spawn_y: f32,
    /// Countdown for the time-driven strategy
    spawn_timer: f32,
}

impl ObstacleField {
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, ObstacleTuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: ObstacleTuning) -> Self {
        Self {
            obstacles: Vec::new(),
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            last_spawn_y: SPAWN_START_Y,
            spawn_timer: 0.0,
        }
    }

    /// Empty the field and reseed, so a reset run replays identically
    pub fn reset(&mut self) {
        self.obstacles.clear();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.last_spawn_y = SPAWN_START_Y;
        self.spawn_timer = 0.0;
    }

    /// Advance everything toward the runner, run the spawn scheduler, and
    /// evict obstacles far behind the runner
    pub fn update(
        &mut self,
        dt: f32,
        speed: f32,
        road: &RoadGeometry,
        elapsed_total: f32,
        settings: &Settings,
    ) {
        for obs in &mut self.obstacles {
            obs.y += speed * dt;
        }

        match self.tuning.strategy {
            SpawnStrategy::DistanceLookahead => {
                // The cursor rides the world forward; backfill until the
                // horizon is covered again
                self.last_spawn_y += speed * dt;
                let horizon = -self.tuning.lookahead;
                while self.last_spawn_y > horizon {
                    let interval = self.interval_time(elapsed_total, settings);
                    self.last_spawn_y -= speed * interval;
                    let at = self.last_spawn_y;
                    self.spawn_batch(road, elapsed_total, at, settings);
                }
            }
            SpawnStrategy::TimeDriven => {
                self.spawn_timer -= dt;
                if self.spawn_timer <= 0.0 {
                    self.spawn_batch(road, elapsed_total, SPAWN_START_Y, settings);
                    self.spawn_timer = self.interval_time(elapsed_total, settings);
                }
            }
        }

        self.obstacles.retain(|o| o.y < DESPAWN_Y);
    }

    /// Seconds between batches: shrinks as the run goes on, doubled in
    /// realtime mode
    fn interval_time(&self, elapsed_total: f32, settings: &Settings) -> f32 {
        let mut interval = (self.tuning.base_interval - elapsed_total * self.tuning.interval_decay)
            .max(self.tuning.min_interval);
        if settings.mode == GameMode::Realtime {
            interval *= 2.0;
        }
        interval
    }

    /// Spawn one batch (a row of obstacles at a shared depth)
    fn spawn_batch(
        &mut self,
        road: &RoadGeometry,
        elapsed_total: f32,
        start_y: f32,
        settings: &Settings,
    ) {
        let lane_count = settings.lane_count;
        let kind = self.roll_kind(elapsed_total);

        match kind {
            ObstacleKind::Ground | ObstacleKind::Overhead | ObstacleKind::Crawl => {
                // Crawl rows always span the road; the others usually do,
                // forcing the matching action regardless of lane
                let all_lanes = kind == ObstacleKind::Crawl
                    || self.rng.random::<f32>() < FULL_ROW_CHANCE;
                if all_lanes {
                    for lane in 0..lane_count {
                        self.push(lane, start_y, kind, road);
                    }
                } else {
                    let count = if self.rng.random::<f32>() < EVADABLE_DOUBLE_CHANCE {
                        2.min(lane_count - 1)
                    } else {
                        1
                    };
                    for lane in self.pick_lanes(count, lane_count) {
                        self.push(lane, start_y, kind, road);
                    }
                }
            }
            ObstacleKind::Normal => {
                // Never block every lane: the run must stay survivable
                let max_blocked = lane_count - 1;
                let count = if self.rng.random::<f32>() < NORMAL_DOUBLE_CHANCE {
                    2.min(max_blocked)
                } else {
                    1
                };
                for lane in self.pick_lanes(count, lane_count) {
                    self.push(lane, start_y, ObstacleKind::Normal, road);
                }
            }
        }
    }

    /// Kind selection: Normal-only warm-up, then fixed cumulative bands
    fn roll_kind(&mut self, elapsed_total: f32) -> ObstacleKind {
        if elapsed_total <= KIND_WARMUP_SECS {
            return ObstacleKind::Normal;
        }
        let roll = self.rng.random::<f32>();
        if elapsed_total > CRAWL_UNLOCK_SECS && roll < CRAWL_BAND {
            ObstacleKind::Crawl
        } else if roll < GROUND_BAND {
            ObstacleKind::Ground
        } else if roll < OVERHEAD_BAND {
            ObstacleKind::Overhead
        } else {
            ObstacleKind::Normal
        }
    }

    /// Choose `count` distinct lanes uniformly without replacement
    fn pick_lanes(&mut self, count: usize, lane_count: usize) -> Vec<usize> {
        let mut available: Vec<usize> = (0..lane_count).collect();
        let mut picked = Vec::with_capacity(count);
        for _ in 0..count.min(available.len()) {
            let idx = self.rng.random_range(0..available.len());
            picked.push(available.swap_remove(idx));
        }
        picked
    }

    fn push(&mut self, lane: usize, y: f32, kind: ObstacleKind, road: &RoadGeometry) {
        self.obstacles.push(Obstacle {
            lane,
            y,
            width: kind.width(road.lane_width),
            height: kind.height(),
            kind,
        });
    }

    /// True if the runner's hitbox overlaps any obstacle it is not performing
    /// the safe action for
    pub fn check_collision(
        &self,
        runner_rect: &Rect,
        runner_action: Action,
        road: &RoadGeometry,
    ) -> bool {
        self.obstacles.iter().any(|obs| {
            if obs.kind.safe_action() == Some(runner_action) {
                return false;
            }
            runner_rect.overlaps(&obs.rect(road))
        })
    }
}
