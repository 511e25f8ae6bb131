//! Game settings
//!
//! Mutated by the menu UI at any time; the simulation re-reads them every tick
//! and applies structural changes (lane count, mode) on the next reset.
//! Persisted separately from the best score in LocalStorage.

use serde::{Deserialize, Serialize};

/// How the runner is controlled during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Record a trace during RESERVE, watch it replay at 2x during EXECUTE
    #[default]
    Normal,
    /// Direct control, no reserve/execute cycle
    Realtime,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Normal => "normal",
            GameMode::Realtime => "realtime",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(GameMode::Normal),
            "realtime" => Some(GameMode::Realtime),
            _ => None,
        }
    }
}

/// Global configuration, read fresh by every component each tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Number of lanes (2 or 3)
    pub lane_count: usize,
    /// RESERVE phase duration in seconds (3 or 5)
    pub reserve_time: f32,
    /// Whether pose-camera input is requested
    pub camera_enabled: bool,
    /// Control scheme
    pub mode: GameMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lane_count: 3,
            reserve_time: 3.0,
            camera_enabled: false,
            mode: GameMode::Normal,
        }
    }
}

impl Settings {
    /// The lane the runner starts in and falls back to with no recorded trace
    pub fn center_lane(&self) -> usize {
        if self.lane_count == 3 { 1 } else { 0 }
    }

    /// Highest valid lane index
    pub fn max_lane(&self) -> usize {
        self.lane_count.saturating_sub(1)
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "projection_run_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.lane_count, 3);
        assert_eq!(s.reserve_time, 3.0);
        assert_eq!(s.mode, GameMode::Normal);
        assert!(!s.camera_enabled);
    }

    #[test]
    fn test_center_lane() {
        let mut s = Settings::default();
        assert_eq!(s.center_lane(), 1);
        s.lane_count = 2;
        assert_eq!(s.center_lane(), 0);
        assert_eq!(s.max_lane(), 1);
    }

    #[test]
    fn test_mode_round_trip() {
        assert_eq!(GameMode::from_str("REALTIME"), Some(GameMode::Realtime));
        assert_eq!(GameMode::from_str(GameMode::Normal.as_str()), Some(GameMode::Normal));
        assert_eq!(GameMode::from_str("speedrun"), None);
    }
}
