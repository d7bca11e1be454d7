// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::availability::DateRange;
use crate::job_status::JobStatus;
use crate::types::{BidId, IntervalId, JobId, TeamId};
use rust_decimal::Decimal;

/// Broad classification of a [`DomainError`].
///
/// The kind tells a caller what to do next: fix the input, refresh state,
/// pick a narrower range, pick another bid, or correct a payment breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed input. Not retryable without changing the input.
    Validation,
    /// Operation is not legal in the current job or bid status.
    InvalidState,
    /// Interval request is not contained in the target interval.
    OutOfBounds,
    /// Another caller already selected the winning bid for this job.
    AlreadyFinalized,
    /// Payment breakdown does not sum to the balance due.
    ReconciliationMismatch,
    /// Referenced entity does not exist.
    NotFound,
}

/// Errors that can occur during domain validation and state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field is absent.
    MissingField {
        /// The missing field.
        field: &'static str,
    },
    /// A field is present but malformed or out of range.
    InvalidField {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A job status string could not be parsed.
    InvalidJobStatus(String),
    /// A bid status string could not be parsed.
    InvalidBidStatus {
        /// The unparseable status.
        status: String,
    },
    /// An availability status string could not be parsed.
    InvalidAvailabilityStatus(String),
    /// A payment method string could not be parsed.
    InvalidPaymentMethod(String),
    /// A date range whose start is after its end.
    InvalidDateRange {
        /// Range start.
        start: time::Date,
        /// Range end.
        end: time::Date,
    },
    /// Date arithmetic overflow.
    DateArithmeticOverflow {
        /// Description of the operation that failed.
        operation: String,
    },
    /// A money or acreage calculation left the representable range.
    ArithmeticOverflow {
        /// Description of the calculation that failed.
        operation: &'static str,
    },
    /// A job operation was attempted in a status that does not permit it.
    InvalidJobTransition {
        /// The attempted operation.
        operation: &'static str,
        /// The job's current status.
        status: JobStatus,
    },
    /// A bid status change that the bid lifecycle does not permit.
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The bid does not belong to the job it was submitted against.
    BidNotOnJob {
        /// The bid.
        bid_id: BidId,
        /// The job.
        job_id: JobId,
    },
    /// An inactive team was offered a job.
    TeamInactive(TeamId),
    /// Requested range is not contained in the interval being split.
    IntervalOutOfBounds {
        /// The requested range.
        requested: DateRange,
        /// The interval's range.
        original: DateRange,
    },
    /// Requested range straddles one or more existing intervals.
    IntervalOverlap {
        /// The requested range.
        requested: DateRange,
        /// The first existing range it collides with.
        existing: DateRange,
    },
    /// Two intervals owned by the same team overlap.
    OverlappingIntervals {
        /// The earlier interval.
        first: DateRange,
        /// The later interval.
        second: DateRange,
    },
    /// A winning bid has already been selected for this job.
    AlreadyFinalized {
        /// The job.
        job_id: JobId,
        /// The bid holding the assignment, when known.
        assigned_bid: Option<BidId>,
    },
    /// The payment breakdown does not reconcile with the balance due.
    ReconciliationMismatch {
        /// Balance owed.
        balance_due: Decimal,
        /// Sum of the submitted breakdown.
        total: Decimal,
        /// `total - balance_due`.
        delta: Decimal,
    },
    /// A payment has already been recorded for this job.
    PaymentAlreadyRecorded(JobId),
    /// A job's field/status pairing is inconsistent.
    JobInvariantViolated {
        /// The job.
        job_id: JobId,
        /// The broken invariant.
        reason: String,
    },
    /// Job does not exist.
    JobNotFound(JobId),
    /// Bid does not exist.
    BidNotFound(BidId),
    /// Team does not exist.
    TeamNotFound(TeamId),
    /// Availability interval does not exist.
    IntervalNotFound(IntervalId),
}

impl DomainError {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. }
            | Self::InvalidField { .. }
            | Self::InvalidJobStatus(_)
            | Self::InvalidBidStatus { .. }
            | Self::InvalidAvailabilityStatus(_)
            | Self::InvalidPaymentMethod(_)
            | Self::InvalidDateRange { .. }
            | Self::DateArithmeticOverflow { .. }
            | Self::ArithmeticOverflow { .. }
            | Self::BidNotOnJob { .. }
            | Self::TeamInactive(_) => ErrorKind::Validation,
            Self::InvalidJobTransition { .. }
            | Self::InvalidStatusTransition { .. }
            | Self::PaymentAlreadyRecorded(_)
            | Self::JobInvariantViolated { .. } => ErrorKind::InvalidState,
            Self::IntervalOutOfBounds { .. }
            | Self::IntervalOverlap { .. }
            | Self::OverlappingIntervals { .. } => ErrorKind::OutOfBounds,
            Self::AlreadyFinalized { .. } => ErrorKind::AlreadyFinalized,
            Self::ReconciliationMismatch { .. } => ErrorKind::ReconciliationMismatch,
            Self::JobNotFound(_)
            | Self::BidNotFound(_)
            | Self::TeamNotFound(_)
            | Self::IntervalNotFound(_) => ErrorKind::NotFound,
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "Required field '{field}' is missing"),
            Self::InvalidField { field, reason } => {
                write!(f, "Invalid value for '{field}': {reason}")
            }
            Self::InvalidJobStatus(status) => write!(f, "Invalid job status: {status}"),
            Self::InvalidBidStatus { status } => write!(f, "Invalid bid status: {status}"),
            Self::InvalidAvailabilityStatus(status) => {
                write!(f, "Invalid availability status: {status}")
            }
            Self::InvalidPaymentMethod(method) => write!(f, "Invalid payment method: {method}"),
            Self::InvalidDateRange { start, end } => {
                write!(f, "Date range start {start} is after end {end}")
            }
            Self::DateArithmeticOverflow { operation } => {
                write!(f, "Date arithmetic overflow while {operation}")
            }
            Self::ArithmeticOverflow { operation } => {
                write!(f, "Amount out of range while {operation}")
            }
            Self::InvalidJobTransition { operation, status } => {
                write!(f, "Cannot {operation} a job in status '{status}'")
            }
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Invalid bid status transition from {from} to {to}: {reason}")
            }
            Self::BidNotOnJob { bid_id, job_id } => {
                write!(f, "Bid {bid_id} does not belong to job {job_id}")
            }
            Self::TeamInactive(team_id) => write!(f, "Team {team_id} is not active"),
            Self::IntervalOutOfBounds {
                requested,
                original,
            } => {
                write!(
                    f,
                    "Requested range {requested} is not contained in interval {original}"
                )
            }
            Self::IntervalOverlap {
                requested,
                existing,
            } => {
                write!(
                    f,
                    "Requested range {requested} partially overlaps existing interval {existing}"
                )
            }
            Self::OverlappingIntervals { first, second } => {
                write!(f, "Intervals {first} and {second} overlap")
            }
            Self::AlreadyFinalized {
                job_id,
                assigned_bid,
            } => match assigned_bid {
                Some(bid_id) => {
                    write!(f, "Job {job_id} is already finalized with bid {bid_id}")
                }
                None => write!(f, "Job {job_id} is already finalized"),
            },
            Self::ReconciliationMismatch {
                balance_due,
                total,
                delta,
            } => {
                write!(
                    f,
                    "Payment breakdown totals {total} but balance due is {balance_due} (difference {delta})"
                )
            }
            Self::PaymentAlreadyRecorded(job_id) => {
                write!(f, "A payment has already been recorded for job {job_id}")
            }
            Self::JobInvariantViolated { job_id, reason } => {
                write!(f, "Job {job_id} violates an invariant: {reason}")
            }
            Self::JobNotFound(job_id) => write!(f, "Job {job_id} not found"),
            Self::BidNotFound(bid_id) => write!(f, "Bid {bid_id} not found"),
            Self::TeamNotFound(team_id) => write!(f, "Team {team_id} not found"),
            Self::IntervalNotFound(interval_id) => {
                write!(f, "Availability interval {interval_id} not found")
            }
        }
    }
}

impl std::error::Error for DomainError {}
