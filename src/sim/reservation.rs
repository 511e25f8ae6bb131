//! Reservation buffer
//!
//! Records a time-stamped (lane, action) trace during RESERVE, sampled at
//! 10 Hz rather than every tick. During EXECUTE, playback progress maps back
//! to the trace by right-continuous step interpolation: a change recorded at
//! time T takes effect as soon as playback reaches T and persists until the
//! next recorded change.

use serde::{Deserialize, Serialize};

use crate::Action;
use crate::consts::RECORD_INTERVAL;

/// One sample of the recorded trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservationEntry {
    /// Seconds since the RESERVE phase began
    pub time: f32,
    pub lane: usize,
    pub action: Action,
}

/// The recorded trace for the current reserve/execute cycle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReservationBuffer {
    entries: Vec<ReservationEntry>,
    last_record_time: f32,
}

impl ReservationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the trace; called on every RESERVE entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_record_time = 0.0;
    }

    /// Append a sample if at least the sampling interval has passed since the
    /// last accepted one (the first sample is always accepted)
    pub fn record(&mut self, elapsed: f32, lane: usize, action: Action) {
        if self.entries.is_empty() || elapsed - self.last_record_time >= RECORD_INTERVAL {
            self.entries.push(ReservationEntry {
                time: elapsed,
                lane,
                action,
            });
            self.last_record_time = elapsed;
        }
    }

    /// Lane at playback progress 0..1. `neutral_lane` is returned for an empty
    /// trace (the center lane for the current lane count).
    pub fn lane_at_progress(&self, progress: f32, neutral_lane: usize) -> usize {
        self.entry_at_progress(progress)
            .map(|e| e.lane)
            .unwrap_or(neutral_lane)
    }

    /// Action at playback progress 0..1; Stand for an empty trace
    pub fn action_at_progress(&self, progress: f32) -> Action {
        self.entry_at_progress(progress)
            .map(|e| e.action)
            .unwrap_or(Action::Stand)
    }

    /// Step lookup: scale progress onto the recorded timeline, then return the
    /// later endpoint of the first bracketing interval. Past the last entry,
    /// the last entry wins.
    fn entry_at_progress(&self, progress: f32) -> Option<&ReservationEntry> {
        let first = self.entries.first()?;
        if self.entries.len() == 1 {
            return Some(first);
        }

        let last = self.entries.last()?;
        if last.time == 0.0 {
            return Some(first);
        }

        let target_time = progress * last.time;
        // At or before the first sample the trace has not changed yet; without
        // this the right-endpoint rule would skip straight to the second entry
        // when the first was recorded at time 0
        if target_time <= first.time {
            return Some(first);
        }
        for pair in self.entries.windows(2) {
            if target_time >= pair[0].time && target_time <= pair[1].time {
                return Some(&pair[1]);
            }
        }
        Some(last)
    }

    /// Read-only view of the trace for the renderer's reservation line
    pub fn trajectory(&self) -> &[ReservationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
