// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Candidate scoring.
//!
//! A candidate's score is a weighted sum of four independent factors, each
//! expressed as a fraction in `[0, 1]`:
//!
//! - rate competitiveness against the activity's benchmark rate
//! - availability on the requested date
//! - historical reliability (win rate and completed jobs)
//! - crew-size adequacy
//!
//! The weights are policy and are supplied by the caller. The farmer's price
//! is deliberately not an input.

use crate::availability::{AvailabilityInterval, DateRange, is_available};
use crate::error::DomainError;
use crate::performance::TeamPerformance;
use crate::types::{Job, LaborTeam, TeamId};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A rate at or below this fraction of the benchmark earns full credit.
const FULL_CREDIT_RATIO: f64 = 0.85;

/// A rate at or above this fraction of the benchmark earns no credit.
const NO_CREDIT_RATIO: f64 = 1.30;

/// Completed jobs beyond this count add no further reliability.
const RELIABILITY_CEILING: u32 = 5;

/// Relative weight of each scoring factor.
///
/// Weights need not sum to 100; they are normalized when scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of rate competitiveness.
    pub rate: f64,
    /// Weight of availability on the requested date.
    pub availability: f64,
    /// Weight of historical reliability.
    pub reliability: f64,
    /// Weight of crew-size adequacy.
    pub crew: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rate: 30.0,
            availability: 35.0,
            reliability: 20.0,
            crew: 15.0,
        }
    }
}

impl ScoringWeights {
    fn total(&self) -> f64 {
        self.rate + self.availability + self.reliability + self.crew
    }

    /// Checks that every weight is finite and non-negative and that at least
    /// one is positive.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidField` naming the offending weight.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("rate", self.rate),
            ("availability", self.availability),
            ("reliability", self.reliability),
            ("crew", self.crew),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::InvalidField {
                    field: "weights",
                    reason: format!("{name} weight must be a non-negative number, got {value}"),
                });
            }
        }
        if self.total() <= 0.0 {
            return Err(DomainError::InvalidField {
                field: "weights",
                reason: String::from("at least one weight must be positive"),
            });
        }
        Ok(())
    }
}

/// Median of a set of prices. `None` for an empty set.
///
/// The midpoint of an even set is taken as `low + (high - low) / 2` when
/// the plain sum of the two middle prices is not representable.
#[must_use]
pub fn median(prices: &[Decimal]) -> Option<Decimal> {
    let mut sorted: Vec<Decimal> = prices.to_vec();
    sorted.sort_unstable();
    let len: usize = sorted.len();
    if len == 0 {
        return None;
    }
    let mid: usize = len / 2;
    if len % 2 == 1 {
        Some(sorted[mid])
    } else {
        let (low, high): (Decimal, Decimal) = (sorted[mid - 1], sorted[mid]);
        low.checked_add(high)
            .and_then(|sum| sum.checked_div(Decimal::TWO))
            .or_else(|| {
                high.checked_sub(low)
                    .and_then(|spread| spread.checked_div(Decimal::TWO))
                    .and_then(|half| low.checked_add(half))
            })
    }
}

/// Benchmark rate for an activity.
///
/// Uses the median of recent bid prices for the activity, falling back to
/// the median of the candidate pool's configured rates.
#[must_use]
pub fn rate_benchmark(recent_bid_prices: &[Decimal], pool_rates: &[Decimal]) -> Option<Decimal> {
    median(recent_bid_prices).or_else(|| median(pool_rates))
}

/// Everything the scorer knows about one team.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// The team.
    pub team: &'a LaborTeam,
    /// The team's availability intervals.
    pub intervals: &'a [AvailabilityInterval],
    /// The team's performance counters.
    pub performance: TeamPerformance,
    /// A quoted price that stands in for the configured rate, once the team
    /// has bid.
    pub offered_rate: Option<Decimal>,
}

impl Candidate<'_> {
    /// The rate used for scoring: the offered price if any, else the team's
    /// configured rate for the job's activity.
    #[must_use]
    pub fn effective_rate(&self, job: &Job) -> Option<Decimal> {
        self.offered_rate
            .or_else(|| self.team.rate_for(&job.activity))
    }
}

/// A scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// The team.
    pub team_id: TeamId,
    /// The team's leader.
    pub leader_name: String,
    /// Rate the score was computed with.
    pub rate_per_acre: Decimal,
    /// Score in `[0, 100]`, rounded to two decimals.
    pub score: f64,
    /// Whether the team is available on the requested date.
    pub available: bool,
    /// Factors that raised the score.
    pub reasons: Vec<String>,
    /// Factors that lowered the score.
    pub flags: Vec<String>,
}

/// Credit for the rate relative to the benchmark. `None` when there is no
/// usable benchmark or the ratio is out of range.
fn rate_credit(rate: Decimal, benchmark: Option<Decimal>) -> Option<f64> {
    let benchmark: Decimal = benchmark.filter(|b| *b > Decimal::ZERO)?;
    let ratio: f64 = rate.checked_div(benchmark)?.to_f64()?;
    if ratio <= FULL_CREDIT_RATIO {
        Some(1.0)
    } else if ratio >= NO_CREDIT_RATIO {
        Some(0.0)
    } else {
        Some((NO_CREDIT_RATIO - ratio) / (NO_CREDIT_RATIO - FULL_CREDIT_RATIO))
    }
}

fn reliability_credit(performance: &TeamPerformance) -> f64 {
    let completed: f64 = f64::from(performance.completed.min(RELIABILITY_CEILING));
    let ceiling: f64 = f64::from(RELIABILITY_CEILING);
    0.5f64.mul_add(performance.win_rate(), 0.5 * (completed / ceiling))
}

fn crew_credit(crew_size: u32, workers_needed: u32) -> f64 {
    if workers_needed == 0 {
        return 1.0;
    }
    (f64::from(crew_size) / f64::from(workers_needed)).min(1.0)
}

/// Scores one candidate for a job.
///
/// # Arguments
///
/// * `job` - The job being staffed
/// * `candidate` - The team and its calendar and history
/// * `benchmark` - The activity's benchmark rate, if one exists
/// * `weights` - Factor weights
///
/// # Returns
///
/// `None` if the team has no rate for the job's activity.
#[must_use]
pub fn score_candidate(
    job: &Job,
    candidate: &Candidate<'_>,
    benchmark: Option<Decimal>,
    weights: &ScoringWeights,
) -> Option<CandidateScore> {
    let rate: Decimal = candidate.effective_rate(job)?;
    let mut reasons: Vec<String> = Vec::new();
    let mut flags: Vec<String> = Vec::new();

    let rate_fraction: f64 = match rate_credit(rate, benchmark) {
        Some(credit) => {
            if credit >= 1.0 {
                reasons.push(String::from("rate well below benchmark"));
            } else if credit > 0.0 {
                reasons.push(String::from("rate near benchmark"));
            } else {
                flags.push(String::from("rate well above benchmark"));
            }
            credit
        }
        None => {
            flags.push(String::from("no rate benchmark for activity"));
            0.5
        }
    };

    let available: bool = job
        .requested_date
        .is_some_and(|day| is_available(candidate.intervals, &DateRange::single_day(day)));
    let availability_fraction: f64 = if available {
        reasons.push(String::from("available on requested date"));
        1.0
    } else {
        flags.push(String::from("not available on requested date"));
        0.0
    };

    let reliability_fraction: f64 = reliability_credit(&candidate.performance);
    if candidate.performance.total_notified == 0 {
        flags.push(String::from("no bidding history"));
    } else if reliability_fraction >= 0.5 {
        reasons.push(String::from("reliable track record"));
    }

    let crew_fraction: f64 = crew_credit(candidate.team.crew_size, job.workers_needed);
    if crew_fraction >= 1.0 {
        reasons.push(String::from("crew covers workers needed"));
    } else {
        flags.push(format!(
            "crew shortfall: {} of {} workers",
            candidate.team.crew_size, job.workers_needed
        ));
    }

    let total_weight: f64 = weights.total();
    let raw: f64 = if total_weight > 0.0 {
        let weighted: f64 = weights.rate.mul_add(
            rate_fraction,
            weights.availability.mul_add(
                availability_fraction,
                weights
                    .reliability
                    .mul_add(reliability_fraction, weights.crew * crew_fraction),
            ),
        );
        weighted / total_weight * 100.0
    } else {
        0.0
    };
    let score: f64 = ((raw * 100.0).round() / 100.0).clamp(0.0, 100.0);

    Some(CandidateScore {
        team_id: candidate.team.team_id,
        leader_name: candidate.team.leader_name.clone(),
        rate_per_acre: rate,
        score,
        available,
        reasons,
        flags,
    })
}
