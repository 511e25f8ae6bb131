//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - dt-driven timing only, no wall-clock deadlines
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod obstacle;
pub mod phase;
pub mod reservation;
pub mod runner;
pub mod tick;

pub use obstacle::{Obstacle, ObstacleField, ObstacleKind, ObstacleTuning, SpawnStrategy};
pub use phase::{Phase, PhaseMachine};
pub use reservation::{ReservationBuffer, ReservationEntry};
pub use runner::Runner;
pub use tick::{GameEvent, GameState, SpeedTuning};
