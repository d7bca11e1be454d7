// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Job lifecycle states.
//!
//! Jobs only ever move forward through the lifecycle. The single exception is
//! cancellation, which is reachable from every non-terminal state.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Request received from the farmer. Fields may still be incomplete.
    #[default]
    Pending,
    /// All request fields are present and checked.
    Confirmed,
    /// Operator has set its own price per acre.
    Priced,
    /// Teams are being notified.
    Notified,
    /// At least one team holds a bid on the job.
    Bidding,
    /// A winning bid has been selected.
    Finalized,
    /// The crew has started work.
    InProgress,
    /// Work is done.
    Completed,
    /// Workflow aborted.
    Cancelled,
}

impl JobStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Priced => "priced",
            Self::Notified => "notified",
            Self::Bidding => "bidding",
            Self::Finalized => "finalized",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Position along the forward path. `Cancelled` sits outside it.
    const fn position(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Confirmed => Some(1),
            Self::Priced => Some(2),
            Self::Notified => Some(3),
            Self::Bidding => Some(4),
            Self::Finalized => Some(5),
            Self::InProgress => Some(6),
            Self::Completed => Some(7),
            Self::Cancelled => None,
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Checks if a transition from this state to another is valid.
    ///
    /// Forward moves along the path are valid (`Priced` may skip straight to
    /// `Bidding` when the fan-out produced bids). `Cancelled` is reachable
    /// from every non-terminal state.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(target, Self::Cancelled) {
            return true;
        }
        matches!(
            (self, target),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Priced)
                | (Self::Priced, Self::Notified | Self::Bidding)
                | (Self::Notified, Self::Bidding)
                | (Self::Bidding, Self::Finalized)
                | (Self::Finalized, Self::InProgress)
                | (Self::InProgress, Self::Completed)
        )
    }

    /// Returns whether a job in this status has been priced by the operator.
    #[must_use]
    pub fn has_passed_pricing(&self) -> bool {
        match (self.position(), Self::Priced.position()) {
            (Some(current), Some(priced)) => current >= priced,
            _ => false,
        }
    }

    /// Returns whether a job in this status must carry a finalized price.
    #[must_use]
    pub const fn carries_finalized_price(&self) -> bool {
        matches!(self, Self::Finalized | Self::InProgress | Self::Completed)
    }

    /// Returns whether teams may be notified while the job is in this status.
    #[must_use]
    pub const fn accepts_notifications(&self) -> bool {
        matches!(self, Self::Priced | Self::Notified | Self::Bidding)
    }

    /// Returns whether a winning bid has been selected at this point.
    #[must_use]
    pub const fn is_past_finalization(&self) -> bool {
        matches!(self, Self::Finalized | Self::InProgress | Self::Completed)
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "priced" => Ok(Self::Priced),
            "notified" => Ok(Self::Notified),
            "bidding" => Ok(Self::Bidding),
            "finalized" => Ok(Self::Finalized),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidJobStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
