// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Aggregated view over the bids placed on one job.

use crate::bid_status::BidStatus;
use crate::types::{Bid, BidId, JobId, TeamId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// All bids on a single job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidBoard {
    /// The job.
    pub job_id: JobId,
    /// Every bid on the job, in any status.
    pub bids: Vec<Bid>,
}

/// Counts by status plus the headline numbers of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidSummary {
    /// Bids awaiting an answer.
    pub pending: usize,
    /// Bids with a price on the table.
    pub interested: usize,
    /// Bids turned down.
    pub declined: usize,
    /// Bids selected as the winner. Never more than one.
    pub assigned: usize,
    /// Lowest interested price, if any.
    pub lowest_price: Option<Decimal>,
    /// The winning bid, if one has been selected.
    pub assigned_bid: Option<BidId>,
}

/// Orders interested bids: lowest price first, then earliest response, then
/// lowest bid id.
fn compare_interested(a: &Bid, b: &Bid) -> Ordering {
    a.bid_price_per_acre
        .cmp(&b.bid_price_per_acre)
        .then_with(|| match (a.responded_at, b.responded_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.bid_id.cmp(&b.bid_id))
}

impl BidBoard {
    /// Creates a board from a job's bids.
    #[must_use]
    pub const fn new(job_id: JobId, bids: Vec<Bid>) -> Self {
        Self { job_id, bids }
    }

    /// Interested bids in selection order.
    #[must_use]
    pub fn ranked_interested(&self) -> Vec<&Bid> {
        let mut interested: Vec<&Bid> = self
            .bids
            .iter()
            .filter(|bid| bid.status == BidStatus::Interested)
            .collect();
        interested.sort_by(|a, b| compare_interested(a, b));
        interested
    }

    /// The assigned bid, if any.
    #[must_use]
    pub fn assigned(&self) -> Option<&Bid> {
        self.bids
            .iter()
            .find(|bid| bid.status == BidStatus::Assigned)
    }

    /// Looks up a bid by id.
    #[must_use]
    pub fn find(&self, bid_id: BidId) -> Option<&Bid> {
        self.bids.iter().find(|bid| bid.bid_id == Some(bid_id))
    }

    /// Returns whether the team already holds a bid on this job.
    #[must_use]
    pub fn has_bid_for(&self, team_id: TeamId) -> bool {
        self.bids.iter().any(|bid| bid.team_id == team_id)
    }

    /// Summarizes the board.
    #[must_use]
    pub fn summary(&self) -> BidSummary {
        let count = |status: BidStatus| self.bids.iter().filter(|b| b.status == status).count();
        BidSummary {
            pending: count(BidStatus::Pending),
            interested: count(BidStatus::Interested),
            declined: count(BidStatus::Declined),
            assigned: count(BidStatus::Assigned),
            lowest_price: self
                .ranked_interested()
                .first()
                .and_then(|bid| bid.bid_price_per_acre),
            assigned_bid: self.assigned().and_then(|bid| bid.bid_id),
        }
    }
}
