// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use mukadam_bid::CoreError;
use mukadam_bid_domain::{DomainError, ErrorKind};
use mukadam_bid_persistence::PersistenceError;
use rust_decimal::Decimal;

use crate::roster_import::RosterError;

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// The operation is not legal in the current job, bid or team state.
    InvalidState {
        /// A human-readable description of the current state.
        message: String,
    },
    /// A calendar range does not fit the interval it targets.
    OutOfBounds {
        /// A human-readable description of the collision.
        message: String,
    },
    /// A winning bid has already been selected for the job.
    AlreadyFinalized {
        /// The job.
        job_id: i64,
        /// The bid holding the assignment, when known.
        assigned_bid: Option<i64>,
    },
    /// A payment breakdown does not sum to the balance due.
    ReconciliationMismatch {
        /// Balance owed.
        balance_due: Decimal,
        /// Sum of the submitted breakdown.
        total: Decimal,
        /// `total - balance_due`.
        delta: Decimal,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A roster file could not be read.
    InvalidCsvFormat {
        /// Why the file was rejected.
        reason: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// The domain classification of this error, if it has one.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::InvalidInput { .. } | Self::InvalidCsvFormat { .. } => {
                Some(ErrorKind::Validation)
            }
            Self::InvalidState { .. } => Some(ErrorKind::InvalidState),
            Self::OutOfBounds { .. } => Some(ErrorKind::OutOfBounds),
            Self::AlreadyFinalized { .. } => Some(ErrorKind::AlreadyFinalized),
            Self::ReconciliationMismatch { .. } => Some(ErrorKind::ReconciliationMismatch),
            Self::ResourceNotFound { .. } => Some(ErrorKind::NotFound),
            Self::Internal { .. } => None,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::InvalidState { message } => write!(f, "Invalid state: {message}"),
            Self::OutOfBounds { message } => write!(f, "Out of bounds: {message}"),
            Self::AlreadyFinalized {
                job_id,
                assigned_bid,
            } => match assigned_bid {
                Some(bid_id) => write!(f, "Job {job_id} is already finalized with bid {bid_id}"),
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
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::InvalidCsvFormat { reason } => write!(f, "Invalid roster file: {reason}"),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<RosterError> for ApiError {
    fn from(err: RosterError) -> Self {
        Self::InvalidCsvFormat {
            reason: err.to_string(),
        }
    }
}

fn not_found(resource_type: &str, message: String) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from(resource_type),
        message,
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::MissingField { field } | DomainError::InvalidField { field, .. } => {
            ApiError::InvalidInput {
                field: String::from(field),
                message,
            }
        }
        DomainError::InvalidJobStatus(_) => ApiError::InvalidInput {
            field: String::from("status"),
            message,
        },
        DomainError::InvalidBidStatus { .. } => ApiError::InvalidInput {
            field: String::from("bid_status"),
            message,
        },
        DomainError::InvalidAvailabilityStatus(_) => ApiError::InvalidInput {
            field: String::from("availability_status"),
            message,
        },
        DomainError::InvalidPaymentMethod(_) => ApiError::InvalidInput {
            field: String::from("method"),
            message,
        },
        DomainError::InvalidDateRange { .. } | DomainError::DateArithmeticOverflow { .. } => {
            ApiError::InvalidInput {
                field: String::from("range"),
                message,
            }
        }
        DomainError::ArithmeticOverflow { .. } => ApiError::InvalidInput {
            field: String::from("amount"),
            message,
        },
        DomainError::BidNotOnJob { .. } => ApiError::InvalidInput {
            field: String::from("bid_id"),
            message,
        },
        DomainError::TeamInactive(_) => ApiError::InvalidInput {
            field: String::from("team_ids"),
            message,
        },
        DomainError::InvalidJobTransition { .. }
        | DomainError::InvalidStatusTransition { .. }
        | DomainError::PaymentAlreadyRecorded(_)
        | DomainError::JobInvariantViolated { .. } => ApiError::InvalidState { message },
        DomainError::IntervalOutOfBounds { .. }
        | DomainError::IntervalOverlap { .. }
        | DomainError::OverlappingIntervals { .. } => ApiError::OutOfBounds { message },
        DomainError::AlreadyFinalized {
            job_id,
            assigned_bid,
        } => ApiError::AlreadyFinalized {
            job_id: job_id.value(),
            assigned_bid: assigned_bid.map(mukadam_bid_domain::BidId::value),
        },
        DomainError::ReconciliationMismatch {
            balance_due,
            total,
            delta,
        } => ApiError::ReconciliationMismatch {
            balance_due,
            total,
            delta,
        },
        DomainError::JobNotFound(_) => not_found("Job", message),
        DomainError::BidNotFound(_) => not_found("Bid", message),
        DomainError::TeamNotFound(_) => not_found("Team", message),
        DomainError::IntervalNotFound(_) => not_found("Availability interval", message),
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::Internal(msg) => ApiError::Internal {
            message: format!("Transition failed: {msg}"),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// A compare-and-set conflict becomes `InvalidState` here. Job operations
/// re-read the job after a conflict and may report `AlreadyFinalized`
/// instead.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(what) => {
            let resource_type: &str = what.split_whitespace().next().unwrap_or("record");
            ApiError::ResourceNotFound {
                resource_type: String::from(resource_type),
                message: format!("{what} does not exist"),
            }
        }
        PersistenceError::EventNotFound(event_id) => {
            not_found("Audit event", format!("event {event_id} does not exist"))
        }
        PersistenceError::Conflict(msg) => ApiError::InvalidState {
            message: format!("state changed concurrently: {msg}"),
        },
        other => ApiError::Internal {
            message: format!("Persistence failure: {other}"),
        },
    }
}
