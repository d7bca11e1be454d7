// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::bid_status::BidStatus;
use crate::job_status::JobStatus;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One bid from a team's history, joined with its job's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidHistoryEntry {
    /// Status of the team's bid.
    pub bid_status: BidStatus,
    /// Price the team quoted, if any.
    pub bid_price_per_acre: Option<Decimal>,
    /// Status of the job the bid was placed on.
    pub job_status: JobStatus,
}

/// Performance counters derived from a team's bid history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamPerformance {
    /// Number of jobs the team was notified of.
    pub total_notified: u32,
    /// Number of bids that were assigned.
    pub won: u32,
    /// Number of assigned jobs that reached `completed`.
    pub completed: u32,
    /// Mean of every quoted price, rounded to two decimals. `None` when the
    /// team never quoted or the prices cannot be summed.
    pub average_bid_price: Option<Decimal>,
}

impl TeamPerformance {
    /// Derives the counters from a team's bid history.
    #[must_use]
    pub fn from_history(history: &[BidHistoryEntry]) -> Self {
        let mut performance: Self = Self::default();
        let mut price_sum: Option<Decimal> = Some(Decimal::ZERO);
        let mut price_count: u32 = 0;

        for entry in history {
            performance.total_notified = performance.total_notified.saturating_add(1);
            if entry.bid_status == BidStatus::Assigned {
                performance.won = performance.won.saturating_add(1);
                if entry.job_status == JobStatus::Completed {
                    performance.completed = performance.completed.saturating_add(1);
                }
            }
            if let Some(price) = entry.bid_price_per_acre {
                price_sum = price_sum.and_then(|sum| sum.checked_add(price));
                price_count = price_count.saturating_add(1);
            }
        }

        if price_count > 0 {
            performance.average_bid_price = price_sum
                .and_then(|sum| sum.checked_div(Decimal::from(price_count)))
                .map(|mean| mean.round_dp(2));
        }
        performance
    }

    /// Fraction of notifications that turned into wins, in `[0, 1]`.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.total_notified == 0 {
            return 0.0;
        }
        let won: f64 = f64::from(self.won);
        let notified: f64 = f64::from(self.total_notified);
        (won / notified).clamp(0.0, 1.0)
    }

    /// Average bid price as a float, for display.
    #[must_use]
    pub fn average_bid_price_f64(&self) -> Option<f64> {
        self.average_bid_price.and_then(|price| price.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(bid_status: BidStatus, price: Option<i64>, job_status: JobStatus) -> BidHistoryEntry {
        BidHistoryEntry {
            bid_status,
            bid_price_per_acre: price.map(Decimal::from),
            job_status,
        }
    }

    #[test]
    fn test_empty_history() {
        let performance = TeamPerformance::from_history(&[]);

        assert_eq!(performance, TeamPerformance::default());
        assert!(performance.win_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_counters_from_history() {
        let history = vec![
            entry(BidStatus::Assigned, Some(800), JobStatus::Completed),
            entry(BidStatus::Assigned, Some(900), JobStatus::InProgress),
            entry(BidStatus::Interested, Some(1000), JobStatus::Finalized),
            entry(BidStatus::Declined, None, JobStatus::Finalized),
        ];

        let performance = TeamPerformance::from_history(&history);

        assert_eq!(performance.total_notified, 4);
        assert_eq!(performance.won, 2);
        assert_eq!(performance.completed, 1);
        assert_eq!(performance.average_bid_price, Some(Decimal::from(900)));
        assert!((performance.win_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unsummable_prices_leave_average_unset() {
        let history = vec![
            BidHistoryEntry {
                bid_status: BidStatus::Interested,
                bid_price_per_acre: Some(Decimal::MAX),
                job_status: JobStatus::Finalized,
            },
            BidHistoryEntry {
                bid_status: BidStatus::Assigned,
                bid_price_per_acre: Some(Decimal::MAX),
                job_status: JobStatus::Completed,
            },
        ];

        let performance = TeamPerformance::from_history(&history);

        assert_eq!(performance.total_notified, 2);
        assert_eq!(performance.completed, 1);
        assert_eq!(performance.average_bid_price, None);
    }
}
