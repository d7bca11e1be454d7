// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use mukadam_bid_domain::{
    Activity, AvailabilityStatus, BidDecision, BidId, CompletionRecord, CostBreakdown, DateRange,
    IntervalId, PaymentMethod, TeamId,
};
use rust_decimal::Decimal;

/// A command represents operator or team intent as data only.
///
/// Commands are the only way to request a job state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Mark a pending request as complete and checked.
    ConfirmJob,
    /// Set the operator's own price.
    SetPrice {
        /// Price per acre.
        your_price_per_acre: Decimal,
    },
    /// Fan the job out to teams.
    NotifyTeams {
        /// Teams to notify. Duplicates and already-notified teams are skipped.
        team_ids: Vec<TeamId>,
    },
    /// Record a team's answer.
    RecordBidResponse {
        /// The bid being answered.
        bid_id: BidId,
        /// Interested or declined.
        decision: BidDecision,
        /// Quoted price per acre. Required when interested, rejected when declined.
        price: Option<Decimal>,
        /// Team's estimate of how long the work takes.
        estimated_days: Option<u32>,
        /// Free-text comment.
        comment: Option<String>,
    },
    /// Select the winning bid.
    Finalize {
        /// The winning bid.
        bid_id: BidId,
    },
    /// Widen the pool while bidding is open.
    Reassign {
        /// Additional teams to notify.
        team_ids: Vec<TeamId>,
        /// Why the pool is being widened.
        reason: String,
    },
    /// Crew has started work.
    StartWork,
    /// Crew has finished.
    CompleteWork {
        /// What was done.
        record: CompletionRecord,
    },
    /// Abort the workflow.
    Cancel {
        /// Why the job was cancelled.
        reason: String,
    },
    /// Record the reconciled payment for a completed job.
    RecordPayment {
        /// Where the money goes.
        breakdown: CostBreakdown,
        /// How it was collected.
        method: PaymentMethod,
        /// Receipt or transaction reference.
        proof_reference: Option<String>,
        /// Who collected it.
        collected_by: String,
    },
}

impl Command {
    /// The audit action name for this command.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::ConfirmJob => "ConfirmJob",
            Self::SetPrice { .. } => "SetPrice",
            Self::NotifyTeams { .. } => "NotifyTeams",
            Self::RecordBidResponse { .. } => "RecordBidResponse",
            Self::Finalize { .. } => "FinalizeBid",
            Self::Reassign { .. } => "Reassign",
            Self::StartWork => "StartWork",
            Self::CompleteWork { .. } => "CompleteWork",
            Self::Cancel { .. } => "CancelJob",
            Self::RecordPayment { .. } => "RecordPayment",
        }
    }
}

/// A change to a team's rates, status or calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamCommand {
    /// Set or replace the rate for one activity.
    SetRate {
        /// The activity.
        activity: Activity,
        /// Rate per acre.
        rate: Decimal,
    },
    /// Activate or deactivate the team.
    SetActive {
        /// New flag value.
        active: bool,
    },
    /// Add a tagged range to the calendar, splitting an interval if needed.
    AddAvailability {
        /// The range.
        range: DateRange,
        /// Its tag.
        status: AvailabilityStatus,
    },
    /// Remove one interval.
    DeleteAvailability {
        /// The interval.
        interval_id: IntervalId,
    },
}

impl TeamCommand {
    /// The audit action name for this command.
    #[must_use]
    pub const fn action_name(&self) -> &'static str {
        match self {
            Self::SetRate { .. } => "SetTeamRate",
            Self::SetActive { .. } => "SetTeamActive",
            Self::AddAvailability { .. } => "AddAvailability",
            Self::DeleteAvailability { .. } => "DeleteAvailability",
        }
    }
}
