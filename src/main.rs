//! Projection Run entry point
//!
//! The browser build drives the simulation from the animation-frame callback
//! and the pose camera. This native binary is a headless demo: it runs the
//! deterministic core with a simple auto-dodge player until the run ends,
//! then reports the score.

use projection_run::consts::RUNNER_BASE_Y_FRAC;
use projection_run::highscores::now_ms;
use projection_run::input::{InputSource, Key};
use projection_run::sim::{GameEvent, GameState, ObstacleKind, Phase};
use projection_run::Settings;

const DEMO_DT: f32 = 1.0 / 60.0;
const DEMO_TIME_LIMIT: f32 = 120.0;
/// Start dodging when a threat is this close (screen units)
const DODGE_WINDOW: f32 = 350.0;

fn main() {
    env_logger::init();

    let settings = Settings::load();
    let mut input = InputSource::new(&settings);
    let mut state = GameState::new(now_ms() as u64, &settings);

    for event in state.start(&settings) {
        log::info!("{event:?}");
    }

    let mut wall_clock = 0.0_f32;
    while wall_clock < DEMO_TIME_LIMIT {
        wall_clock += DEMO_DT;

        auto_dodge(&state, &mut input, &settings);

        let sample = input.sample(DEMO_DT, &settings);
        let events = state.tick(&sample, DEMO_DT, &settings);

        for event in &events {
            match event {
                GameEvent::PhaseChanged(phase) => log::info!("phase -> {phase:?}"),
                GameEvent::GameOver { score, best_score } => {
                    state.best.save();
                    println!("game over after {wall_clock:.1}s");
                    println!("score: {score:.0}  best: {best_score:.0}");
                    return;
                }
            }
        }
    }

    println!("demo time limit reached, score: {:.0}", state.score);
}

/// Keyboard-only demo player: jump low bars, duck overheads, and sidestep
/// walls into an open lane. Crawl wires need the pose camera, so they end
/// the demo sooner or later.
fn auto_dodge(state: &GameState, input: &mut InputSource, settings: &Settings) {
    for key in [Key::Left, Key::Right, Key::Up, Key::Down] {
        input.key_up(key);
    }

    // Only the phases where the runner is (or will be) steered matter
    if !matches!(state.phase.phase, Phase::Reserve | Phase::Realtime) {
        return;
    }

    let road = state.road(settings);
    let runner_y = road.height * RUNNER_BASE_Y_FRAC;
    let lane = state.runner.lane;

    let threat = state
        .obstacles
        .obstacles
        .iter()
        .filter(|o| o.lane == lane && o.y < runner_y && o.y > runner_y - DODGE_WINDOW)
        .min_by(|a, b| b.y.total_cmp(&a.y));

    let Some(threat) = threat else {
        return;
    };

    match threat.kind {
        ObstacleKind::Ground => input.key_down(Key::Up, settings),
        ObstacleKind::Overhead => input.key_down(Key::Down, settings),
        ObstacleKind::Crawl => {}
        ObstacleKind::Normal => {
            // Prefer whichever neighboring lane is clear at this depth
            let lane_is_clear = |candidate: usize| {
                state
                    .obstacles
                    .obstacles
                    .iter()
                    .all(|o| o.lane != candidate || (o.y - threat.y).abs() > 60.0)
            };
            if lane > 0 && lane_is_clear(lane - 1) {
                input.key_down(Key::Left, settings);
            } else if lane < settings.max_lane() && lane_is_clear(lane + 1) {
                input.key_down(Key::Right, settings);
            }
        }
    }
}
