//! Flappy Rewind entry point
//!
//! Headless demo: plays one autopilot run and prints the resulting record.
//!
//! Usage: `flappy-rewind [difficulty] [seed] [max_steps]`
//!
//! `FLAPPY_SETTINGS` points at a settings JSON file and `FLAPPY_HIGHSCORES`
//! at a leaderboard file that is loaded before and saved after the run.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use flappy_rewind::sim::{GameEvent, StepOutcome, TickInput};
use flappy_rewind::{
    Difficulty, HighScores, RecordSink, RunController, RunRecord, Settings, SubmitError,
    SubmitResponse,
};

/// How long to wait for the leaderboard write before exiting
const SAVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Roughly five minutes of play
const DEFAULT_MAX_STEPS: u64 = 5 * 60 * 60;

struct Args {
    difficulty: Option<Difficulty>,
    seed: Option<u64>,
    max_steps: u64,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let difficulty = match args.next() {
        Some(s) => Some(
            Difficulty::from_str(&s).ok_or_else(|| format!("unknown difficulty '{s}'"))?,
        ),
        None => None,
    };
    let seed = match args.next() {
        Some(s) => Some(s.parse().map_err(|_| format!("invalid seed '{s}'"))?),
        None => None,
    };
    let max_steps = match args.next() {
        Some(s) => s.parse().map_err(|_| format!("invalid step count '{s}'"))?,
        None => DEFAULT_MAX_STEPS,
    };
    Ok(Args {
        difficulty,
        seed,
        max_steps,
    })
}

/// Leaderboard sink that writes through to disk after every record
struct FileScores {
    scores: HighScores,
    path: Option<PathBuf>,
}

impl RecordSink for FileScores {
    fn submit(&mut self, record: &RunRecord) -> Result<SubmitResponse, SubmitError> {
        let response = self.scores.submit(record)?;
        if let Some(path) = &self.path {
            self.scores.save(path)?;
        }
        Ok(response)
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::ScoreChanged { score } => log::debug!("Score: {}", score),
        GameEvent::PowerUpActivated {
            kind,
            remaining_secs,
        } => log::info!("Power-up {} active for {}s", kind.as_str(), remaining_secs),
        GameEvent::PowerUpTimer { .. } => {}
        GameEvent::PowerUpDeactivated { kind } => log::info!("Power-up {} expired", kind.as_str()),
        GameEvent::CooldownChanged {
            ability,
            remaining_secs: 0,
        } => log::info!("{} ready", ability.as_str()),
        GameEvent::CooldownChanged { .. } => {}
        GameEvent::Rewound { to_step } => log::info!("Rewound to step {}", to_step),
        GameEvent::RunEnded {
            final_score,
            power_ups_collected,
            elapsed_secs,
        } => log::info!(
            "Game over: {} points, {} power-ups, {}s",
            final_score,
            power_ups_collected,
            elapsed_secs
        ),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Flappy Rewind (headless) starting...");

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("usage: flappy-rewind [easy|normal|hard] [seed] [max_steps]");
            return ExitCode::FAILURE;
        }
    };

    let mut settings = match std::env::var_os("FLAPPY_SETTINGS") {
        Some(path) => Settings::load(&PathBuf::from(path)),
        None => Settings::default(),
    };
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    let difficulty = args.difficulty.unwrap_or(settings.difficulty);

    let scores_path = std::env::var_os("FLAPPY_HIGHSCORES").map(PathBuf::from);
    let scores = scores_path
        .as_deref()
        .map(HighScores::load)
        .unwrap_or_default();
    let sink = FileScores {
        scores,
        path: scores_path,
    };

    let mut controller = RunController::new(settings).with_sink(Box::new(sink));
    if let Err(e) = controller.start(difficulty) {
        log::error!("Could not start run: {}", e);
        return ExitCode::FAILURE;
    }

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut steps = 0;
    while steps < args.max_steps {
        let outcome = controller.advance_with(&input);
        for event in controller.drain_events() {
            log_event(&event);
        }
        steps += 1;
        if let StepOutcome::Ended(cause) = outcome {
            log::info!("Run ended after {} steps ({:?})", steps, cause);
            break;
        }
    }

    controller.flush_records(SAVE_TIMEOUT);
    if controller.records_in_flight() > 0 {
        log::warn!("Leaderboard did not answer in time");
    }

    let Some(record) = controller.last_record() else {
        log::info!(
            "Step limit reached with the run still going (score {})",
            controller.state().score
        );
        return ExitCode::SUCCESS;
    };
    match serde_json::to_string_pretty(record) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            log::error!("Could not encode run record: {}", e);
            return ExitCode::FAILURE;
        }
    }
    if let Some(best) = controller.high_score() {
        log::info!("High score: {}", best);
    }
    ExitCode::SUCCESS
}
