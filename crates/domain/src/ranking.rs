// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::scoring::{Candidate, CandidateScore, ScoringWeights, score_candidate};
use crate::types::Job;
use rust_decimal::Decimal;

/// Ranks candidate teams for a job.
///
/// Inactive teams and teams without a rate for the job's activity are
/// dropped. The rest are ordered by score descending, ties broken by team id
/// ascending, so identical inputs always produce the identical ordering.
///
/// # Arguments
///
/// * `job` - The job being staffed
/// * `candidates` - The candidate pool
/// * `benchmark` - The activity's benchmark rate, if one exists
/// * `weights` - Factor weights
#[must_use]
pub fn rank_candidates(
    job: &Job,
    candidates: &[Candidate<'_>],
    benchmark: Option<Decimal>,
    weights: &ScoringWeights,
) -> Vec<CandidateScore> {
    let mut scored: Vec<CandidateScore> = candidates
        .iter()
        .filter(|candidate| candidate.team.is_active)
        .filter_map(|candidate| score_candidate(job, candidate, benchmark, weights))
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    scored
}
