use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::{format_duration, group_thousands};

/// Lifetime reading totals, persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadingStats {
    pub total_words_read: u64,
    pub total_time_spent_seconds: f64,
    pub chapters_completed: u64,
    /// Start of the current active (playing) stretch, epoch millis.
    pub session_start_timestamp: Option<i64>,
}

impl ReadingStats {
    /// Drops a dangling active stretch left behind by an earlier run.
    pub fn restored(mut self) -> Self {
        self.session_start_timestamp = None;
        self
    }

    pub fn is_active(&self) -> bool {
        self.session_start_timestamp.is_some()
    }

    pub fn begin_active(&mut self, now: DateTime<Utc>) {
        if self.session_start_timestamp.is_none() {
            self.session_start_timestamp = Some(now.timestamp_millis());
        }
    }

    /// Folds the running stretch into the total and stops tracking.
    pub fn end_active(&mut self, now: DateTime<Utc>) {
        if let Some(start) = self.session_start_timestamp.take() {
            self.total_time_spent_seconds += elapsed_secs(start, now);
        }
    }

    /// Folds the running stretch into the total and keeps tracking.
    pub fn fold_active(&mut self, now: DateTime<Utc>) {
        if self.is_active() {
            self.end_active(now);
            self.begin_active(now);
        }
    }

    /// Total time including the stretch still running.
    pub fn live_seconds(&self, now: DateTime<Utc>) -> f64 {
        let running = self
            .session_start_timestamp
            .map_or(0.0, |start| elapsed_secs(start, now));
        self.total_time_spent_seconds + running
    }

    pub fn summary(&self, now: DateTime<Utc>) -> String {
        format!(
            "{} words read • {} total time • {} chapters completed",
            group_thousands(self.total_words_read),
            format_duration(self.live_seconds(now)),
            self.chapters_completed
        )
    }
}

fn elapsed_secs(start_millis: i64, now: DateTime<Utc>) -> f64 {
    (now.timestamp_millis() - start_millis).max(0) as f64 / 1000.0
}
