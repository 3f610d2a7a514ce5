//! Completed-run records and the high score leaderboard
//!
//! When a run ends the controller hands a [`RunRecord`] to a [`RecordSink`].
//! Sinks may fail; failures are logged by the caller and never touch the
//! simulation.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::SubmitError;
use crate::settings::Difficulty;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Summary of a finished run, as sent to the record service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub score: u64,
    pub power_ups_collected: u32,
    pub difficulty_level: Difficulty,
    /// Whole seconds the run lasted
    #[serde(rename = "gameDuration")]
    pub duration_secs: u64,
}

/// Record service reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    /// Best score on record after this submission
    #[serde(default)]
    pub new_high_score: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Destination for completed-run records
pub trait RecordSink {
    fn submit(&mut self, record: &RunRecord) -> Result<SubmitResponse, SubmitError>;
}

/// Sink that speaks the JSON wire format through a caller-supplied transport
/// (for example an HTTP POST). The transport receives the request body and
/// returns the response body.
pub struct JsonRecordSink<F> {
    transport: F,
}

impl<F> JsonRecordSink<F>
where
    F: FnMut(&str) -> Result<String, SubmitError>,
{
    pub fn new(transport: F) -> Self {
        Self { transport }
    }
}

impl<F> RecordSink for JsonRecordSink<F>
where
    F: FnMut(&str) -> Result<String, SubmitError>,
{
    fn submit(&mut self, record: &RunRecord) -> Result<SubmitResponse, SubmitError> {
        let body = serde_json::to_string(record)?;
        let reply = (self.transport)(&body)?;
        let response: SubmitResponse = serde_json::from_str(&reply)?;
        if !response.success {
            return Err(SubmitError::Refused {
                message: response.message.unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

/// Reply to one queued record
pub type SubmitReply = Result<SubmitResponse, SubmitError>;

/// Owns a [`RecordSink`] on a background thread. Queuing a record never
/// waits for the sink; replies are collected later with [`poll`](Self::poll).
pub struct RecordWorker {
    records: Option<Sender<RunRecord>>,
    replies: Receiver<SubmitReply>,
    in_flight: usize,
    thread: Option<JoinHandle<()>>,
}

impl RecordWorker {
    pub fn spawn(mut sink: Box<dyn RecordSink + Send>) -> Result<Self, SubmitError> {
        let (record_tx, record_rx) = mpsc::channel::<RunRecord>();
        let (reply_tx, reply_rx) = mpsc::channel::<SubmitReply>();
        let thread = thread::Builder::new()
            .name("record-sink".into())
            .spawn(move || {
                for record in record_rx {
                    let reply = sink.submit(&record);
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            records: Some(record_tx),
            replies: reply_rx,
            in_flight: 0,
            thread: Some(thread),
        })
    }

    /// Queue a record for submission
    pub fn send(&mut self, record: RunRecord) -> Result<(), SubmitError> {
        let Some(records) = &self.records else {
            return Err(SubmitError::Unavailable);
        };
        records.send(record).map_err(|_| SubmitError::Unavailable)?;
        self.in_flight += 1;
        Ok(())
    }

    /// Records queued but not yet answered
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Replies that have already arrived
    pub fn poll(&mut self) -> Vec<SubmitReply> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.replies.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            replies.push(reply);
        }
        replies
    }

    /// Block until every queued record is answered or `timeout` elapses
    pub fn wait(&mut self, timeout: Duration) -> Vec<SubmitReply> {
        let deadline = Instant::now() + timeout;
        let mut replies = self.poll();
        while self.in_flight > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(left) {
                Ok(reply) => {
                    self.in_flight -= 1;
                    replies.push(reply);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("Record sink stopped with {} records unanswered", self.in_flight);
                    self.in_flight = 0;
                    break;
                }
            }
        }
        replies
    }
}

impl Drop for RecordWorker {
    /// Lets the sink finish what is already queued
    fn drop(&mut self) {
        self.records.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("Record sink thread panicked");
            }
        }
    }
}

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub record: RunRecord,
    /// Unix timestamp (s) when achieved
    #[serde(default)]
    pub timestamp: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries
            .last()
            .map(|e| score > e.record.score)
            .unwrap_or(true)
    }

    /// Add a run to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_record(&mut self, record: RunRecord, timestamp: u64) -> Option<usize> {
        if !self.qualifies(record.score) {
            return None;
        }

        let score = record.score;
        let entry = HighScoreEntry { record, timestamp };

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.record.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.record.score)
    }

    /// Load high scores from a JSON file, starting fresh if unavailable
    pub fn load(path: &Path) -> Self {
        let loaded = std::fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str::<HighScores>(&json).ok());
        match loaded {
            Some(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            None => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
        }
    }

    /// Save high scores to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), SubmitError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

impl RecordSink for HighScores {
    fn submit(&mut self, record: &RunRecord) -> Result<SubmitResponse, SubmitError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        if let Some(rank) = self.add_record(record.clone(), timestamp) {
            log::info!("Score {} ranked #{}", record.score, rank);
        }
        Ok(SubmitResponse {
            success: true,
            new_high_score: self.top_score().unwrap_or(0).max(record.score),
            message: None,
        })
    }
}
