// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Mukadam job bidding engine.
//!
//! This crate stores jobs, bids, labor teams, availability intervals,
//! payments and audit events in `SQLite` through Diesel.
//!
//! ## Write Discipline
//!
//! Every write made on behalf of a transition happens in one immediate
//! transaction together with its audit event. Rows that were read before the
//! transition was computed are updated conditionally on the value that was
//! read (job status, bid status, interval contents). A mismatch aborts the
//! whole transaction with [`PersistenceError::Conflict`] so that callers can
//! re-read and report the current state.
//!
//! The schema adds a partial unique index allowing one `assigned` bid per
//! job, a `(job, team)` unique bid constraint and one payment per job.
//!
//! ## Testing Philosophy
//!
//! - Every test gets its own shared in-memory database
//! - Migrations run on every connection, so tests see the real schema
//! - Foreign key enforcement is verified at startup

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use mukadam_bid::{
    JobCreation, JobState, TeamOnboarding, TeamState, TeamTransitionResult, TransitionResult,
};
use mukadam_bid_audit::AuditEvent;
use mukadam_bid_domain::{
    Activity, AvailabilityInterval, Bid, BidHistoryEntry, BidId, IntervalId, Job, JobId, JobStatus,
    LaborTeam, PaymentRecord, TeamId,
};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

use backend::sqlite::{Storage, open};

pub use backend::sqlite::BUSY_TIMEOUT_MS;
pub use error::PersistenceError;

/// Persistence adapter over one `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique shared in-memory database, so adapters
    /// created by different tests never see each other's rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let conn: SqliteConnection = open(&Storage::Memory(format!("memdb_mukadam_{db_id}")))?;
        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::Open(format!(
                "database path is not valid UTF-8: {}",
                path.as_ref().display()
            ))
        })?;

        let conn: SqliteConnection = open(&Storage::File(path_str.to_string()))?;
        Ok(Self { conn })
    }

    // ------------------------------------------------------------------
    // Jobs
    // ------------------------------------------------------------------

    /// Records a new job and its creation audit event.
    ///
    /// # Returns
    ///
    /// The stored job and its audit event ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn persist_creation(
        &mut self,
        creation: &JobCreation,
    ) -> Result<(Job, i64), PersistenceError> {
        mutations::persist_creation(&mut self.conn, creation)
    }

    /// Persists a job transition.
    ///
    /// # Returns
    ///
    /// The event ID assigned to the persisted audit event.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Conflict` if the job or a bid changed since
    /// the transition was computed.
    pub fn persist_transition(
        &mut self,
        result: &TransitionResult,
    ) -> Result<i64, PersistenceError> {
        mutations::persist_transition(&mut self.conn, result)
    }

    /// Retrieves a job.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the job does not exist.
    pub fn get_job(&mut self, job_id: JobId) -> Result<Job, PersistenceError> {
        queries::get_job(&mut self.conn, job_id)
    }

    /// Lists jobs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_jobs(&mut self, status: Option<JobStatus>) -> Result<Vec<Job>, PersistenceError> {
        queries::list_jobs(&mut self.conn, status)
    }

    /// Loads a job with its bids and payment.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the job does not exist.
    pub fn load_job_state(&mut self, job_id: JobId) -> Result<JobState, PersistenceError> {
        queries::load_job_state(&mut self.conn, job_id)
    }

    /// Lists the bids on a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_bids(&mut self, job_id: JobId) -> Result<Vec<Bid>, PersistenceError> {
        queries::list_bids(&mut self.conn, job_id)
    }

    /// Retrieves a bid.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the bid does not exist.
    pub fn get_bid(&mut self, bid_id: BidId) -> Result<Bid, PersistenceError> {
        queries::get_bid(&mut self.conn, bid_id)
    }

    /// Retrieves the payment recorded for a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_payment(
        &mut self,
        job_id: JobId,
    ) -> Result<Option<PaymentRecord>, PersistenceError> {
        queries::get_payment(&mut self.conn, job_id)
    }

    /// Most recent quoted prices for an activity.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn recent_bid_prices(
        &mut self,
        activity: &Activity,
        limit: i64,
    ) -> Result<Vec<Decimal>, PersistenceError> {
        queries::recent_bid_prices(&mut self.conn, activity, limit)
    }

    /// A team's bid history joined with job statuses.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_bid_history(
        &mut self,
        team_id: TeamId,
    ) -> Result<Vec<BidHistoryEntry>, PersistenceError> {
        queries::get_bid_history(&mut self.conn, team_id)
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    /// Onboards a team.
    ///
    /// # Returns
    ///
    /// The stored team with its calendar, and its audit event ID.
    ///
    /// # Errors
    ///
    /// Returns an error if an insert fails.
    pub fn persist_onboarding(
        &mut self,
        onboarding: &TeamOnboarding,
    ) -> Result<(TeamState, i64), PersistenceError> {
        mutations::persist_onboarding(&mut self.conn, onboarding)
    }

    /// Persists a team transition.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Conflict` if the calendar changed since it
    /// was read.
    pub fn persist_team_transition(
        &mut self,
        result: &TeamTransitionResult,
    ) -> Result<i64, PersistenceError> {
        mutations::persist_team_transition(&mut self.conn, result)
    }

    /// Retrieves a team with its rates.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the team does not exist.
    pub fn get_team(&mut self, team_id: TeamId) -> Result<LaborTeam, PersistenceError> {
        queries::get_team(&mut self.conn, team_id)
    }

    /// Lists teams in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_teams(&mut self, active_only: bool) -> Result<Vec<LaborTeam>, PersistenceError> {
        queries::list_teams(&mut self.conn, active_only)
    }

    /// Lists a team's intervals ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_intervals(
        &mut self,
        team_id: TeamId,
    ) -> Result<Vec<AvailabilityInterval>, PersistenceError> {
        queries::list_intervals(&mut self.conn, team_id)
    }

    /// Retrieves one availability interval.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the interval does not exist.
    pub fn get_interval(
        &mut self,
        interval_id: IntervalId,
    ) -> Result<AvailabilityInterval, PersistenceError> {
        queries::get_interval(&mut self.conn, interval_id)
    }

    /// Loads a team with its calendar.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the team does not exist.
    pub fn load_team_state(&mut self, team_id: TeamId) -> Result<TeamState, PersistenceError> {
        queries::load_team_state(&mut self.conn, team_id)
    }

    // ------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::EventNotFound` if no such event exists.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::get_audit_event(&mut self.conn, event_id)
    }

    /// Every audit event of a job, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_job_audit_trail(
        &mut self,
        job_id: JobId,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::get_job_audit_trail(&mut self.conn, job_id)
    }

    /// Every audit event of a team, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_team_audit_trail(
        &mut self,
        team_id: TeamId,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::get_team_audit_trail(&mut self.conn, team_id)
    }
}
