// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod availability;
mod bid_board;
mod bid_status;
mod error;
mod job_status;
mod performance;
mod ranking;
mod reconciliation;
mod scoring;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use availability::{
    AvailabilityInterval, AvailabilityStatus, DateRange, IntervalPlan, is_available,
    plan_interval_addition, split_interval, validate_non_overlapping,
};
pub use bid_board::{BidBoard, BidSummary};
pub use bid_status::BidStatus;
pub use job_status::JobStatus;
pub use performance::{BidHistoryEntry, TeamPerformance};
pub use ranking::rank_candidates;
pub use reconciliation::{
    CostBreakdown, PaymentRecord, RECONCILIATION_TOLERANCE, balance_due, validate_breakdown,
};
pub use scoring::{
    Candidate, CandidateScore, ScoringWeights, median, rate_benchmark, score_candidate,
};

// Re-export public types
pub use error::{DomainError, ErrorKind};
pub use types::{
    Activity, Bid, BidDecision, BidId, CompletionRecord, IntervalId, Job, JobId, JobRequest,
    LaborTeam, PaymentMethod, TeamId, TeamRegistration,
};
pub use validation::{
    MAX_QUALITY_RATING, validate_completion_record, validate_confirmable,
    validate_job_invariants, validate_positive, validate_rate, validate_reason,
    validate_team_registration,
};
