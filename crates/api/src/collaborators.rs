// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Collaborators the engine consumes: notification delivery and time.

use mukadam_bid_domain::{JobId, TeamId};
use std::sync::Mutex;
use time::OffsetDateTime;

/// Delivers job notifications to team leaders.
///
/// Delivery is best-effort. The engine calls it after a notification has
/// been committed and only reports the delivered count.
pub trait Notifier: Send + Sync {
    /// Notifies `team_ids` about `job_id`.
    ///
    /// # Returns
    ///
    /// How many notifications were delivered.
    fn notify(&self, job_id: JobId, team_ids: &[TeamId]) -> usize;
}

/// A notifier that delivers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _job_id: JobId, _team_ids: &[TeamId]) -> usize {
        0
    }
}

/// A notifier that records every call and reports full delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(JobId, Vec<TeamId>)>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(JobId, Vec<TeamId>)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, job_id: JobId, team_ids: &[TeamId]) -> usize {
        match self.calls.lock() {
            Ok(mut calls) => {
                calls.push((job_id, team_ids.to_vec()));
                team_ids.len()
            }
            Err(_) => 0,
        }
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> OffsetDateTime;
}

/// The system clock, in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that always reads the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
