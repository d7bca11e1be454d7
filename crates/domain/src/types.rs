// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::bid_status::BidStatus;
use crate::error::DomainError;
use crate::job_status::JobStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Declares a numeric identifier assigned by the persistence layer.
macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a database identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier!(
    /// Identifies a job.
    JobId
);
identifier!(
    /// Identifies a bid.
    BidId
);
identifier!(
    /// Identifies a labor team (mukadam).
    TeamId
);
identifier!(
    /// Identifies an availability interval.
    IntervalId
);

/// An agricultural activity (harvesting, sowing, weeding, ...).
///
/// Activity names are normalized to trimmed lowercase so that rate entries
/// and job requests match regardless of how they were typed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Activity(String);

impl Activity {
    /// Creates a new activity, normalizing the name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    /// Returns the normalized activity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns whether the name is empty after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work summary captured when a job is completed.
///
/// Informational only: the lifecycle requires its presence, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Area actually worked, in acres.
    pub actual_area_acres: Decimal,
    /// Number of labourers that turned up.
    pub labourers_used: u32,
    /// Total hours worked by the crew.
    pub hours_worked: Decimal,
    /// Farmer's quality rating, 1 to 5.
    pub quality_rating: Option<u8>,
    /// Free-text summary of the work done.
    pub work_summary: String,
}

/// One unit of farm work requested by a farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// The job identifier.
    pub job_id: JobId,
    /// Reference to the farmer who requested the work.
    pub farmer: String,
    /// Requested activity.
    pub activity: Activity,
    /// Farm size in acres. Must be positive once confirmed.
    pub farm_size_acres: Option<Decimal>,
    /// Date the work should happen.
    pub requested_date: Option<Date>,
    /// Price per acre offered by the farmer. Never shown to teams.
    pub farmer_price_per_acre: Option<Decimal>,
    /// Operator's own price per acre, set when the job is priced.
    pub your_price_per_acre: Option<Decimal>,
    /// Winning bid price per acre, set at finalization.
    pub finalized_price_per_acre: Option<Decimal>,
    /// Advance already collected from the farmer.
    pub advance_amount: Decimal,
    /// Number of labourers the job needs.
    pub workers_needed: u32,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Operator notes.
    pub notes: Option<String>,
    /// When the request was recorded.
    pub created_at: OffsetDateTime,
    /// When work started.
    pub started_at: Option<OffsetDateTime>,
    /// When work completed.
    pub completed_at: Option<OffsetDateTime>,
    /// Why the job was cancelled.
    pub cancellation_reason: Option<String>,
    /// Completion details.
    pub completion: Option<CompletionRecord>,
}

/// Fields supplied when a farmer's request is first recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Reference to the farmer.
    pub farmer: String,
    /// Requested activity.
    pub activity: Activity,
    /// Farm size in acres.
    pub farm_size_acres: Option<Decimal>,
    /// Requested date.
    pub requested_date: Option<Date>,
    /// Farmer's offered price per acre.
    pub farmer_price_per_acre: Option<Decimal>,
    /// Advance already collected.
    pub advance_amount: Decimal,
    /// Labourers needed.
    pub workers_needed: u32,
    /// Operator notes.
    pub notes: Option<String>,
}

impl Job {
    /// Builds a `pending` job from a request.
    #[must_use]
    pub fn from_request(job_id: JobId, request: JobRequest, created_at: OffsetDateTime) -> Self {
        Self {
            job_id,
            farmer: request.farmer,
            activity: request.activity,
            farm_size_acres: request.farm_size_acres,
            requested_date: request.requested_date,
            farmer_price_per_acre: request.farmer_price_per_acre,
            your_price_per_acre: None,
            finalized_price_per_acre: None,
            advance_amount: request.advance_amount,
            workers_needed: request.workers_needed,
            status: JobStatus::Pending,
            notes: request.notes,
            created_at,
            started_at: None,
            completed_at: None,
            cancellation_reason: None,
            completion: None,
        }
    }
}

/// A labor team's response to a job notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// The canonical identifier assigned by the database.
    /// `None` indicates the bid has not been persisted yet.
    pub bid_id: Option<BidId>,
    /// The job being bid on.
    pub job_id: JobId,
    /// The bidding team.
    pub team_id: TeamId,
    /// Response status.
    pub status: BidStatus,
    /// Quoted price per acre. Present iff interested or assigned.
    pub bid_price_per_acre: Option<Decimal>,
    /// Team's estimate of how many days the work takes.
    pub estimated_days: Option<u32>,
    /// Free-text comment from the team.
    pub comment: Option<String>,
    /// When the team was notified.
    pub notified_at: OffsetDateTime,
    /// When the team answered.
    pub responded_at: Option<OffsetDateTime>,
}

impl Bid {
    /// Creates a `pending` bid for a freshly notified team.
    #[must_use]
    pub const fn pending(job_id: JobId, team_id: TeamId, notified_at: OffsetDateTime) -> Self {
        Self {
            bid_id: None,
            job_id,
            team_id,
            status: BidStatus::Pending,
            bid_price_per_acre: None,
            estimated_days: None,
            comment: None,
            notified_at,
            responded_at: None,
        }
    }
}

/// A team's answer to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidDecision {
    /// Team wants the job.
    Interested,
    /// Team turns it down.
    Declined,
}

impl BidDecision {
    /// The bid status this decision leads to.
    #[must_use]
    pub const fn resulting_status(self) -> BidStatus {
        match self {
            Self::Interested => BidStatus::Interested,
            Self::Declined => BidStatus::Declined,
        }
    }
}

impl FromStr for BidDecision {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interested" => Ok(Self::Interested),
            "declined" => Ok(Self::Declined),
            other => Err(DomainError::InvalidField {
                field: "decision",
                reason: format!("expected 'interested' or 'declined', got '{other}'"),
            }),
        }
    }
}

/// A crew leader (mukadam) and the crew they bring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborTeam {
    /// The team identifier.
    pub team_id: TeamId,
    /// Leader's name.
    pub leader_name: String,
    /// Leader's phone number.
    pub phone: String,
    /// Home village or location.
    pub location: Option<String>,
    /// Number of labourers in the crew.
    pub crew_size: u32,
    /// Inactive teams are never recommended or notified.
    pub is_active: bool,
    /// Rate per acre for each activity the team performs.
    pub rates: BTreeMap<Activity, Decimal>,
}

impl LaborTeam {
    /// Returns the team's configured rate for an activity.
    #[must_use]
    pub fn rate_for(&self, activity: &Activity) -> Option<Decimal> {
        self.rates.get(activity).copied()
    }
}

/// Fields supplied when onboarding a new team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRegistration {
    /// Leader's name.
    pub leader_name: String,
    /// Leader's phone number.
    pub phone: String,
    /// Home village or location.
    pub location: Option<String>,
    /// Crew size.
    pub crew_size: u32,
    /// Initial activity rates.
    pub rates: BTreeMap<Activity, Decimal>,
    /// First day of the default availability interval.
    pub available_from: Date,
    /// Last day of the default availability interval.
    pub available_until: Date,
}

/// How a payment was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash in hand.
    Cash,
    /// UPI transfer.
    Upi,
    /// Bank transfer.
    BankTransfer,
    /// Cheque.
    Cheque,
}

impl PaymentMethod {
    /// Converts this method to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Upi => "upi",
            Self::BankTransfer => "bank_transfer",
            Self::Cheque => "cheque",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "upi" => Ok(Self::Upi),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cheque" => Ok(Self::Cheque),
            _ => Err(DomainError::InvalidPaymentMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
