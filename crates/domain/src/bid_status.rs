// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bid status tracking and transition logic.
//!
//! A bid is created `pending` when its team is notified, answered once by the
//! team (`interested` or `declined`), and at most once more by the operator
//! (`assigned`).

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Response status of a team's bid on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    /// Team has been notified and has not answered
    Pending,
    /// Team wants the job at its quoted price
    Interested,
    /// Team turned the job down
    Declined,
    /// Operator selected this bid as the winner
    Assigned,
}

impl BidStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Interested => "interested",
            Self::Declined => "declined",
            Self::Assigned => "assigned",
        }
    }

    /// Parses a status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBidStatus` if the string is not a valid status.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "interested" => Ok(Self::Interested),
            "declined" => Ok(Self::Declined),
            "assigned" => Ok(Self::Assigned),
            _ => Err(DomainError::InvalidBidStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal (cannot transition to another state).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Assigned)
    }

    /// Returns true if a bid in this status carries a price.
    #[must_use]
    pub const fn carries_price(&self) -> bool {
        matches!(self, Self::Interested | Self::Assigned)
    }

    /// Validates if a transition from this status to another is permitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not allowed.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        let valid = match self {
            Self::Pending => matches!(new_status, Self::Interested | Self::Declined),
            Self::Interested => matches!(new_status, Self::Assigned),
            Self::Declined | Self::Assigned => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by bid lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for BidStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
