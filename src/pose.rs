//! Pose-estimation input interface
//!
//! The pose provider (camera + landmark model) runs on its own callback cadence,
//! independent of the simulation tick. It writes into a small shared cell that
//! the simulation reads at the top of each step: last write wins, no queuing,
//! since only the most recent pose matters.

use std::sync::{Arc, Mutex};

use crate::Action;
use crate::consts::*;

/// A single normalized landmark from the pose model (0..1 screen coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

/// One frame of pose results. `None` landmarks means nothing was detected.
#[derive(Debug, Clone, Default)]
pub struct PoseFrame {
    pub landmarks: Option<Vec<Landmark>>,
}

/// Landmark indices we care about (MediaPipe Pose numbering)
const LEFT_SHOULDER: usize = 11;
const RIGHT_SHOULDER: usize = 12;
const LEFT_HIP: usize = 23;
const RIGHT_HIP: usize = 24;

/// Snapshot the simulation reads once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseReading {
    /// Smoothed horizontal offset in [-1, 1], positive = player's left
    pub offset_x: f32,
    /// Discrete stance derived from hip height
    pub stance: Action,
    /// Whether a provider is currently delivering frames
    pub active: bool,
}

#[derive(Debug, Default)]
struct PoseState {
    smoothed_x: f32,
    stance: Action,
    active: bool,
}

/// Cloneable handle to the shared pose cell.
///
/// The producer side calls [`PoseCell::ingest`] from the provider callback;
/// the simulation calls [`PoseCell::reading`]. Single-threaded on the web, but
/// the mutex makes the cell safe if a provider delivers from another thread.
#[derive(Debug, Clone, Default)]
pub struct PoseCell(Arc<Mutex<PoseState>>);

impl PoseCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame of pose results.
    ///
    /// Frames with no landmarks, or with the shoulders/hips missing, are treated
    /// as "no new input": the prior smoothed offset and stance are retained.
    pub fn ingest(&self, frame: &PoseFrame) {
        let Some(landmarks) = &frame.landmarks else {
            return;
        };

        let (Some(ls), Some(rs)) = (
            landmarks.get(LEFT_SHOULDER),
            landmarks.get(RIGHT_SHOULDER),
        ) else {
            return;
        };

        let mut state = match self.0.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Horizontal: shoulder center, mirrored so moving left goes left,
        // EMA-smoothed against jitter
        let center_x = (ls.x + rs.x) / 2.0;
        let raw = -(center_x - 0.5) * 2.0;
        state.smoothed_x =
            state.smoothed_x * (1.0 - POSE_SMOOTHING) + raw * POSE_SMOOTHING;

        // Stance: hip-center height bands
        let (Some(lh), Some(rh)) = (landmarks.get(LEFT_HIP), landmarks.get(RIGHT_HIP)) else {
            return;
        };
        let hip_y = (lh.y + rh.y) / 2.0;
        state.stance = if hip_y > PUSHUP_HIP_Y {
            Action::Pushup
        } else if hip_y > CROUCH_HIP_Y {
            Action::Crouch
        } else if hip_y < JUMP_HIP_Y {
            Action::Jump
        } else {
            Action::Stand
        };
    }

    /// Read the latest pose. Never blocks the simulation on a poisoned lock.
    pub fn reading(&self) -> PoseReading {
        let state = match self.0.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        PoseReading {
            offset_x: state.smoothed_x,
            stance: state.stance,
            active: state.active,
        }
    }

    /// Mark the provider as delivering (or not). Deactivating also clears the
    /// stance so a stale crouch never outlives the camera.
    pub fn set_active(&self, active: bool) {
        let mut state = match self.0.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.active = active;
        if !active {
            state.stance = Action::Stand;
        }
    }
}

/// A camera + pose-model backend.
///
/// `start` acquires the camera and begins writing frames into the cell,
/// returning false on failure (permission denied, no device) so the caller can
/// fall back to keyboard input. `stop` must release the stream deterministically;
/// it is called on both the normal stop path and game over.
pub trait PoseProvider {
    fn start(&mut self, cell: PoseCell) -> bool;
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(shoulder_x: f32, hip_y: f32) -> PoseFrame {
        let mut landmarks = vec![
            Landmark {
                x: 0.5,
                y: 0.5,
                visibility: 1.0,
            };
            25
        ];
        landmarks[LEFT_SHOULDER].x = shoulder_x;
        landmarks[RIGHT_SHOULDER].x = shoulder_x;
        landmarks[LEFT_HIP].y = hip_y;
        landmarks[RIGHT_HIP].y = hip_y;
        PoseFrame {
            landmarks: Some(landmarks),
        }
    }

    #[test]
    fn test_stance_bands() {
        let cases = [
            (1.1, Action::Pushup),
            (0.8, Action::Crouch),
            (0.3, Action::Jump),
            (0.5, Action::Stand),
        ];
        for (hip_y, expected) in cases {
            let cell = PoseCell::new();
            cell.ingest(&frame_with(0.5, hip_y));
            assert_eq!(cell.reading().stance, expected, "hip_y={hip_y}");
        }
    }

    #[test]
    fn test_offset_smoothing() {
        let cell = PoseCell::new();
        // Shoulders fully left of frame center -> raw offset +1, mirrored
        cell.ingest(&frame_with(0.0, 0.5));
        let first = cell.reading().offset_x;
        assert!((first - POSE_SMOOTHING).abs() < 1e-6);

        // Converges toward +1 as frames repeat
        for _ in 0..50 {
            cell.ingest(&frame_with(0.0, 0.5));
        }
        assert!(cell.reading().offset_x > 0.9);
    }

    #[test]
    fn test_missing_landmarks_retain_state() {
        let cell = PoseCell::new();
        cell.ingest(&frame_with(0.2, 0.8));
        let before = cell.reading();

        cell.ingest(&PoseFrame { landmarks: None });
        cell.ingest(&PoseFrame {
            landmarks: Some(vec![]),
        });
        assert_eq!(cell.reading(), before);
    }

    #[test]
    fn test_deactivation_clears_stance() {
        let cell = PoseCell::new();
        cell.set_active(true);
        cell.ingest(&frame_with(0.5, 0.8));
        assert_eq!(cell.reading().stance, Action::Crouch);

        cell.set_active(false);
        let reading = cell.reading();
        assert!(!reading.active);
        assert_eq!(reading.stance, Action::Stand);
    }
}
