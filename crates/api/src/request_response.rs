// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response types for engine operations.
//!
//! Responses carry the state read back after the write, so identifiers
//! assigned on insert are always present.

use mukadam_bid::{JobState, TeamState};
use mukadam_bid_domain::{
    AvailabilityInterval, Bid, BidDecision, BidId, BidSummary, CostBreakdown,
    Job, LaborTeam, PaymentMethod, PaymentRecord, TeamId,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::roster_import::RosterRowResult;

/// A job with its bids and payment, as stored after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResponse {
    /// The job.
    pub job: Job,
    /// Every bid on the job, in creation order.
    pub bids: Vec<Bid>,
    /// Bid counts and the current leader.
    pub summary: BidSummary,
    /// The recorded payment, if any.
    pub payment: Option<PaymentRecord>,
    /// The audit event written by the operation, absent for reads.
    pub event_id: Option<i64>,
}

impl JobResponse {
    pub(crate) fn from_state(state: JobState, event_id: Option<i64>) -> Self {
        let summary: BidSummary = state.board().summary();
        Self {
            job: state.job,
            bids: state.bids,
            summary,
            payment: state.payment,
            event_id,
        }
    }

    /// The bid placed by `team_id`, if any.
    #[must_use]
    pub fn bid_for(&self, team_id: TeamId) -> Option<&Bid> {
        self.bids.iter().find(|bid| bid.team_id == team_id)
    }
}

/// Result of notifying or reassigning a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyResponse {
    /// The job after the fan-out.
    pub job: JobResponse,
    /// Teams that received a new pending bid.
    pub newly_notified: Vec<TeamId>,
    /// Notifications the delivery collaborator reported as delivered.
    pub delivered: usize,
}

/// A team with its calendar, as stored after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamResponse {
    /// The team.
    pub team: LaborTeam,
    /// Its intervals, ordered by start date.
    pub intervals: Vec<AvailabilityInterval>,
    /// The audit event written by the operation, absent for reads.
    pub event_id: Option<i64>,
}

impl TeamResponse {
    pub(crate) fn from_state(state: TeamState, event_id: Option<i64>) -> Self {
        Self {
            team: state.team,
            intervals: state.intervals,
            event_id,
        }
    }
}

/// A team's answer to a job notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidResponseRequest {
    /// The bid being answered.
    pub bid_id: BidId,
    /// Interested or declined.
    pub decision: BidDecision,
    /// Quoted price per acre, required when interested.
    pub price: Option<Decimal>,
    /// Estimated days of work.
    pub estimated_days: Option<u32>,
    /// Free text.
    pub comment: Option<String>,
}

/// A payment against a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Where the money goes.
    pub breakdown: CostBreakdown,
    /// How it was collected.
    pub method: PaymentMethod,
    /// Receipt or transaction reference.
    pub proof_reference: Option<String>,
    /// Who collected it.
    pub collected_by: String,
}

/// Outcome of a roster import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterImportResponse {
    /// Per-row validation results.
    pub rows: Vec<RosterRowResult>,
    /// Teams that were onboarded, in file order.
    pub imported: Vec<TeamId>,
    /// Number of invalid rows.
    pub invalid_count: usize,
}
