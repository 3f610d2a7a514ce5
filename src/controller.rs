//! Run controller
//!
//! Owns the simulation state and drives the run lifecycle:
//! Idle -> Running -> Ended -> (Running | Idle). Every entry into Running
//! starts from a completely fresh state. Commands that do not fit the
//! current phase are rejected without side effects.
//!
//! Finished-run records go to a [`RecordWorker`] so the step that ends a
//! run never waits on the sink. Replies are picked up on later steps.

use std::time::Duration;

use crate::error::Rejection;
use crate::highscores::{RecordSink, RecordWorker, RunRecord, SubmitReply};
use crate::settings::{Difficulty, Settings};
use crate::sim::{self, GameEvent, RunPhase, SimulationState, StepOutcome, TickInput};

pub struct RunController {
    settings: Settings,
    difficulty: Difficulty,
    base_seed: u64,
    runs_started: u64,
    state: SimulationState,
    records: Option<RecordWorker>,
    high_score: Option<u64>,
    last_record: Option<RunRecord>,
}

impl RunController {
    pub fn new(settings: Settings) -> Self {
        let base_seed = settings.seed.unwrap_or_else(rand::random);
        let difficulty = settings.difficulty;
        let state = SimulationState::new(&settings, difficulty, base_seed);
        Self {
            settings,
            difficulty,
            base_seed,
            runs_started: 0,
            state,
            records: None,
            high_score: None,
            last_record: None,
        }
    }

    /// Send completed-run records to `sink` on a background thread
    pub fn with_sink(mut self, sink: Box<dyn RecordSink + Send>) -> Self {
        match RecordWorker::spawn(sink) {
            Ok(worker) => self.records = Some(worker),
            Err(e) => log::warn!("Run records will not be saved: {}", e),
        }
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Records handed to the sink that have not been answered yet
    pub fn records_in_flight(&self) -> usize {
        self.records.as_ref().map_or(0, RecordWorker::in_flight)
    }

    /// Best score reported by the record sink, once one has answered
    pub fn high_score(&self) -> Option<u64> {
        self.high_score
    }

    pub fn last_record(&self) -> Option<&RunRecord> {
        self.last_record.as_ref()
    }

    fn require(&self, phase: RunPhase) -> Result<(), Rejection> {
        if self.state.phase == phase {
            Ok(())
        } else {
            log::debug!("Rejected command in phase {:?}", self.state.phase);
            Err(Rejection::WrongPhase {
                phase: self.state.phase,
            })
        }
    }

    fn begin_run(&mut self) {
        let seed = self.base_seed.wrapping_add(self.runs_started);
        self.runs_started += 1;
        self.state = SimulationState::new(&self.settings, self.difficulty, seed);
        self.state.phase = RunPhase::Running;
        log::info!(
            "Run {} started on {} (seed {})",
            self.runs_started,
            self.difficulty.as_str(),
            seed
        );
    }

    /// Idle -> Running with the chosen difficulty
    pub fn start(&mut self, difficulty: Difficulty) -> Result<(), Rejection> {
        self.require(RunPhase::Idle)?;
        self.difficulty = difficulty;
        self.begin_run();
        Ok(())
    }

    /// Ended -> Running with the same difficulty
    pub fn restart(&mut self) -> Result<(), Rejection> {
        self.require(RunPhase::Ended)?;
        self.begin_run();
        Ok(())
    }

    /// Ended -> Idle
    pub fn return_to_menu(&mut self) -> Result<(), Rejection> {
        self.require(RunPhase::Ended)?;
        self.state = SimulationState::new(&self.settings, self.difficulty, self.base_seed);
        log::info!("Returned to menu");
        Ok(())
    }

    pub fn jump(&mut self) -> Result<(), Rejection> {
        sim::tick::jump(&mut self.state)
    }

    /// Returns the number of obstacles cleared
    pub fn activate_area_clear(&mut self) -> Result<usize, Rejection> {
        sim::ability::activate_area_clear(&mut self.state).inspect_err(|e| {
            log::debug!("Area clear rejected: {}", e);
        })
    }

    /// Returns the step the run was rolled back to
    pub fn activate_rewind(&mut self) -> Result<u64, Rejection> {
        sim::ability::activate_rewind(&mut self.state).inspect_err(|e| {
            log::debug!("Rewind rejected: {}", e);
        })
    }

    /// Advance one fixed step. Call once per frame.
    pub fn advance(&mut self) -> StepOutcome {
        self.advance_with(&TickInput::default())
    }

    /// Advance one fixed step with a batch of commands applied first
    pub fn advance_with(&mut self, input: &TickInput) -> StepOutcome {
        self.poll_records();
        let outcome = sim::tick(&mut self.state, input);
        if let StepOutcome::Ended(_) = outcome {
            self.finish_run();
        }
        outcome
    }

    /// Events produced since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Apply any sink replies that have arrived, without waiting
    pub fn poll_records(&mut self) {
        let replies = match self.records.as_mut() {
            Some(worker) => worker.poll(),
            None => return,
        };
        for reply in replies {
            self.apply_reply(reply);
        }
    }

    /// Wait up to `timeout` for the sink to answer every queued record
    pub fn flush_records(&mut self, timeout: Duration) {
        let replies = match self.records.as_mut() {
            Some(worker) => worker.wait(timeout),
            None => return,
        };
        for reply in replies {
            self.apply_reply(reply);
        }
    }

    fn apply_reply(&mut self, reply: SubmitReply) {
        match reply {
            Ok(response) => {
                log::info!("Run record saved; best score {}", response.new_high_score);
                self.high_score = Some(response.new_high_score);
            }
            Err(e) => log::warn!("Failed to save run record: {}", e),
        }
    }

    fn finish_run(&mut self) {
        let record = RunRecord {
            score: self.state.score,
            power_ups_collected: self.state.power_ups_collected,
            difficulty_level: self.difficulty,
            duration_secs: self.state.clock.whole_secs(),
        };

        if let Some(worker) = self.records.as_mut() {
            if let Err(e) = worker.send(record.clone()) {
                log::warn!("Failed to queue run record: {}", e);
            }
        }
        self.last_record = Some(record);
    }
}
