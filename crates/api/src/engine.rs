// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The matching engine: every exposed operation, serialized per transition.
//!
//! Each write operation holds the persistence lock for exactly one
//! load → apply → persist cycle. Persistence writes run in an immediate
//! transaction and are conditional on the state that was read, so when two
//! engines share one database file the later finalize of a job fails with a
//! conflict instead of assigning a second bid.

use mukadam_bid::{
    Command, JobCreation, JobState, TeamCommand, TeamOnboarding, TeamState, TeamTransitionResult,
    TransitionResult, apply, apply_team, create_job, onboard_team,
};
use mukadam_bid_audit::{Actor, AuditEvent, Cause};
use mukadam_bid_domain::{
    Activity, AvailabilityInterval, AvailabilityStatus, Bid, BidHistoryEntry, BidId, Candidate,
    CandidateScore, CompletionRecord, CostBreakdown, DateRange, DomainError, IntervalId, Job,
    JobId, JobRequest, JobStatus, LaborTeam, ScoringWeights, TeamId, TeamPerformance,
    TeamRegistration, balance_due, rate_benchmark, validate_breakdown,
};
use mukadam_bid_persistence::{Persistence, PersistenceError};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::collaborators::{Clock, Notifier};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::request_response::{
    BidResponseRequest, JobResponse, NotifyResponse, PaymentRequest, RosterImportResponse,
    TeamResponse,
};
use crate::roster_import::{RosterPreview, RosterTeam, preview_roster};

/// How many recent quoted prices feed an activity's rate benchmark.
pub const BENCHMARK_WINDOW: i64 = 20;

fn load_job(persistence: &mut Persistence, job_id: JobId) -> Result<JobState, ApiError> {
    persistence.load_job_state(job_id).map_err(|err| match err {
        PersistenceError::NotFound(_) => translate_domain_error(DomainError::JobNotFound(job_id)),
        other => translate_persistence_error(other),
    })
}

fn load_team(persistence: &mut Persistence, team_id: TeamId) -> Result<TeamState, ApiError> {
    persistence.load_team_state(team_id).map_err(|err| match err {
        PersistenceError::NotFound(_) => {
            translate_domain_error(DomainError::TeamNotFound(team_id))
        }
        other => translate_persistence_error(other),
    })
}

/// Checks that every listed team exists and is active.
fn require_active_teams(
    persistence: &mut Persistence,
    team_ids: &[TeamId],
) -> Result<(), ApiError> {
    for team_id in team_ids {
        let team: LaborTeam = persistence.get_team(*team_id).map_err(|err| match err {
            PersistenceError::NotFound(_) => ApiError::InvalidInput {
                field: String::from("team_ids"),
                message: format!("Team {team_id} does not exist"),
            },
            other => translate_persistence_error(other),
        })?;
        if !team.is_active {
            return Err(translate_domain_error(DomainError::TeamInactive(*team_id)));
        }
    }
    Ok(())
}

/// Re-reads a job after a conditional write matched nothing.
fn resolve_job_conflict(
    persistence: &mut Persistence,
    job_id: JobId,
    finalizing: bool,
    detail: &str,
) -> ApiError {
    warn!(job_id = %job_id, detail, "Write lost to a concurrent change");
    match load_job(persistence, job_id) {
        Ok(current) => {
            let assigned: Option<BidId> = current.board().assigned().and_then(|bid| bid.bid_id);
            if finalizing && (assigned.is_some() || current.job.status.is_past_finalization()) {
                ApiError::AlreadyFinalized {
                    job_id: job_id.value(),
                    assigned_bid: assigned.map(BidId::value),
                }
            } else {
                ApiError::InvalidState {
                    message: format!(
                        "job {job_id} changed concurrently and is now {}",
                        current.job.status
                    ),
                }
            }
        }
        Err(err) => err,
    }
}

/// One candidate's data, owned so that [`Candidate`] can borrow it.
struct PoolEntry {
    team: LaborTeam,
    intervals: Vec<AvailabilityInterval>,
    performance: TeamPerformance,
    offered_rate: Option<Decimal>,
}

impl PoolEntry {
    fn load(
        persistence: &mut Persistence,
        team: LaborTeam,
        offered_rate: Option<Decimal>,
    ) -> Result<Self, ApiError> {
        let intervals: Vec<AvailabilityInterval> = persistence
            .list_intervals(team.team_id)
            .map_err(translate_persistence_error)?;
        let history: Vec<BidHistoryEntry> = persistence
            .get_bid_history(team.team_id)
            .map_err(translate_persistence_error)?;
        Ok(Self {
            team,
            intervals,
            performance: TeamPerformance::from_history(&history),
            offered_rate,
        })
    }

    fn candidate(&self) -> Candidate<'_> {
        Candidate {
            team: &self.team,
            intervals: self.intervals.as_slice(),
            performance: self.performance,
            offered_rate: self.offered_rate,
        }
    }
}

/// The job matching and bidding engine.
///
/// Safe to share between threads. Reads and writes always go through
/// persistence; nothing is cached.
pub struct MatchingEngine {
    persistence: Mutex<Persistence>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    weights: ScoringWeights,
}

impl MatchingEngine {
    /// Creates an engine with the default scoring weights.
    #[must_use]
    pub fn new(
        persistence: Persistence,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            persistence: Mutex::new(persistence),
            notifier,
            clock,
            weights: ScoringWeights::default(),
        }
    }

    /// Replaces the scoring weights.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if a weight is negative or not finite,
    /// or if every weight is zero.
    pub fn with_weights(mut self, weights: ScoringWeights) -> Result<Self, ApiError> {
        weights.validate().map_err(translate_domain_error)?;
        self.weights = weights;
        Ok(self)
    }

    /// The scoring weights in use.
    #[must_use]
    pub const fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    fn lock(&self) -> Result<MutexGuard<'_, Persistence>, ApiError> {
        self.persistence.lock().map_err(|_| ApiError::Internal {
            message: String::from("persistence lock poisoned by a panicked operation"),
        })
    }

    /// Loads, applies and persists one job command, then reads the job back.
    fn run_job_command(
        &self,
        persistence: &mut Persistence,
        job_id: JobId,
        command: Command,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<(TransitionResult, JobResponse), ApiError> {
        let finalizing: bool = matches!(command, Command::Finalize { .. });
        let state: JobState = load_job(persistence, job_id)?;
        let result: TransitionResult = apply(
            &state,
            command,
            actor.clone(),
            cause.clone(),
            self.clock.now(),
        )
        .map_err(translate_core_error)?;

        let event_id: i64 = match persistence.persist_transition(&result) {
            Ok(event_id) => event_id,
            Err(PersistenceError::Conflict(detail)) => {
                return Err(resolve_job_conflict(persistence, job_id, finalizing, &detail));
            }
            Err(other) => return Err(translate_persistence_error(other)),
        };

        let stored: JobState = load_job(persistence, job_id)?;
        Ok((result, JobResponse::from_state(stored, Some(event_id))))
    }

    fn job_command(
        &self,
        job_id: JobId,
        command: Command,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        let action: &'static str = command.action_name();
        let mut persistence = self.lock()?;
        let (_, response) = self.run_job_command(&mut persistence, job_id, command, actor, cause)?;
        drop(persistence);
        info!(
            job_id = %job_id,
            action,
            status = %response.job.status,
            event_id = ?response.event_id,
            "Job transition applied"
        );
        Ok(response)
    }

    /// Loads, applies and persists one team command, then reads the team back.
    fn run_team_command(
        &self,
        persistence: &mut Persistence,
        team_id: TeamId,
        command: TeamCommand,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<TeamResponse, ApiError> {
        let action: &'static str = command.action_name();
        let state: TeamState = load_team(persistence, team_id)?;
        let result: TeamTransitionResult = apply_team(
            &state,
            command,
            actor.clone(),
            cause.clone(),
            self.clock.now(),
        )
        .map_err(translate_core_error)?;
        let event_id: i64 = persistence
            .persist_team_transition(&result)
            .map_err(translate_persistence_error)?;
        let stored: TeamState = load_team(persistence, team_id)?;
        info!(team_id = %team_id, action, event_id, "Team transition applied");
        Ok(TeamResponse::from_state(stored, Some(event_id)))
    }

    fn team_command(
        &self,
        team_id: TeamId,
        command: TeamCommand,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<TeamResponse, ApiError> {
        let mut persistence = self.lock()?;
        self.run_team_command(&mut persistence, team_id, command, actor, cause)
    }

    /// Notifies newly added teams after their bids were committed.
    fn deliver(&self, job: JobResponse, newly_notified: Vec<TeamId>) -> NotifyResponse {
        let delivered: usize = if newly_notified.is_empty() {
            0
        } else {
            self.notifier.notify(job.job.job_id, &newly_notified)
        };
        debug!(
            job_id = %job.job.job_id,
            notified = newly_notified.len(),
            delivered,
            "Delivered notifications"
        );
        NotifyResponse {
            job,
            newly_notified,
            delivered,
        }
    }

    // ------------------------------------------------------------------
    // Job lifecycle
    // ------------------------------------------------------------------

    /// Records a farmer's request.
    ///
    /// # Arguments
    ///
    /// * `request` - The request
    /// * `confirm` - Record the job directly as `confirmed`; requires a
    ///   complete request
    /// * `actor` - Who records it
    /// * `cause` - Why
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if a supplied value is out of range,
    /// or if `confirm` is set and a required field is missing.
    pub fn create_job(
        &self,
        request: JobRequest,
        confirm: bool,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        let creation: JobCreation = create_job(
            request,
            confirm,
            actor.clone(),
            cause.clone(),
            self.clock.now(),
        )
        .map_err(translate_core_error)?;

        let mut persistence = self.lock()?;
        let (job, event_id): (Job, i64) = persistence
            .persist_creation(&creation)
            .map_err(translate_persistence_error)?;
        let stored: JobState = load_job(&mut persistence, job.job_id)?;
        drop(persistence);

        info!(job_id = %job.job_id, status = %job.status, event_id, "Job created");
        Ok(JobResponse::from_state(stored, Some(event_id)))
    }

    /// Marks a pending request as complete and checked.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidState` unless the job is `pending`, and
    /// `ApiError::InvalidInput` if a required field is missing.
    pub fn confirm_job(
        &self,
        job_id: JobId,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        self.job_command(job_id, Command::ConfirmJob, actor, cause)
    }

    /// Sets the operator's own price per acre.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidState` unless the job is `confirmed`, and
    /// `ApiError::InvalidInput` if the price is not positive.
    pub fn set_price(
        &self,
        job_id: JobId,
        your_price_per_acre: Decimal,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        self.job_command(
            job_id,
            Command::SetPrice {
                your_price_per_acre,
            },
            actor,
            cause,
        )
    }

    /// Fans a priced job out to teams.
    ///
    /// Teams that already hold a bid are skipped and duplicates collapse, so
    /// calling this twice with the same list creates no new bids. The
    /// notifier is called once the bids are committed, and only for teams
    /// that received a new bid.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `ApiError::InvalidInput` if the list is empty or names an unknown or
    ///   inactive team
    /// - `ApiError::InvalidState` unless the job is `priced`, `notified` or
    ///   `bidding`
    pub fn notify_teams(
        &self,
        job_id: JobId,
        team_ids: &[TeamId],
        actor: &Actor,
        cause: &Cause,
    ) -> Result<NotifyResponse, ApiError> {
        let mut persistence = self.lock()?;
        require_active_teams(&mut persistence, team_ids)?;
        let (result, job) = self.run_job_command(
            &mut persistence,
            job_id,
            Command::NotifyTeams {
                team_ids: team_ids.to_vec(),
            },
            actor,
            cause,
        )?;
        drop(persistence);

        let newly_notified: Vec<TeamId> = result
            .inserted_bids()
            .iter()
            .map(|bid| bid.team_id)
            .collect();
        info!(
            job_id = %job_id,
            new_bids = newly_notified.len(),
            status = %job.job.status,
            "Teams notified"
        );
        Ok(self.deliver(job, newly_notified))
    }

    /// Records a team's answer to a notification.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `ApiError::ResourceNotFound` if the bid does not exist
    /// - `ApiError::InvalidState` unless the job is `bidding` and the bid is
    ///   still `pending`
    /// - `ApiError::InvalidInput` if an interested answer has no positive
    ///   price or a declined answer carries one
    pub fn record_bid_response(
        &self,
        request: BidResponseRequest,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        let mut persistence = self.lock()?;
        let bid: Bid = persistence.get_bid(request.bid_id).map_err(|err| match err {
            PersistenceError::NotFound(_) => {
                translate_domain_error(DomainError::BidNotFound(request.bid_id))
            }
            other => translate_persistence_error(other),
        })?;
        let (_, response) = self.run_job_command(
            &mut persistence,
            bid.job_id,
            Command::RecordBidResponse {
                bid_id: request.bid_id,
                decision: request.decision,
                price: request.price,
                estimated_days: request.estimated_days,
                comment: request.comment,
            },
            actor,
            cause,
        )?;
        drop(persistence);

        info!(
            job_id = %bid.job_id,
            bid_id = %request.bid_id,
            team_id = %bid.team_id,
            decision = ?request.decision,
            "Bid response recorded"
        );
        Ok(response)
    }

    /// Interested bids in selection order: lowest price, then earliest
    /// response, then lowest bid id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the job does not exist.
    pub fn rank_bids(&self, job_id: JobId) -> Result<Vec<Bid>, ApiError> {
        let mut persistence = self.lock()?;
        let state: JobState = load_job(&mut persistence, job_id)?;
        drop(persistence);
        Ok(state
            .board()
            .ranked_interested()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Selects the winning bid.
    ///
    /// At most one call per job ever succeeds.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `ApiError::AlreadyFinalized` if a bid is already assigned or the job
    ///   is past finalization
    /// - `ApiError::InvalidState` if the job is in any other status than
    ///   `bidding`, or the bid is not `interested`
    /// - `ApiError::InvalidInput` if the bid belongs to another job
    pub fn finalize(
        &self,
        job_id: JobId,
        bid_id: BidId,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        let response: JobResponse =
            self.job_command(job_id, Command::Finalize { bid_id }, actor, cause)?;
        info!(
            job_id = %job_id,
            bid_id = %bid_id,
            price = ?response.job.finalized_price_per_acre,
            "Job finalized"
        );
        Ok(response)
    }

    /// Widens the pool of a job that is still open for bids.
    ///
    /// Existing bids are left untouched.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `ApiError::InvalidState` unless the job is `bidding`
    /// - `ApiError::InvalidInput` if the reason is blank, or the list is
    ///   empty or names an unknown or inactive team
    pub fn reassign(
        &self,
        job_id: JobId,
        team_ids: &[TeamId],
        reason: &str,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<NotifyResponse, ApiError> {
        let mut persistence = self.lock()?;
        require_active_teams(&mut persistence, team_ids)?;
        let (result, job) = self.run_job_command(
            &mut persistence,
            job_id,
            Command::Reassign {
                team_ids: team_ids.to_vec(),
                reason: reason.to_string(),
            },
            actor,
            cause,
        )?;
        drop(persistence);

        let newly_notified: Vec<TeamId> = result
            .inserted_bids()
            .iter()
            .map(|bid| bid.team_id)
            .collect();
        info!(job_id = %job_id, new_bids = newly_notified.len(), "Job reassigned");
        Ok(self.deliver(job, newly_notified))
    }

    /// Marks a finalized job as started.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidState` unless the job is `finalized`.
    pub fn start_work(
        &self,
        job_id: JobId,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        self.job_command(job_id, Command::StartWork, actor, cause)
    }

    /// Marks a job in progress as completed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidState` unless the job is `in_progress`, and
    /// `ApiError::InvalidInput` if the record is incomplete.
    pub fn complete_work(
        &self,
        job_id: JobId,
        record: CompletionRecord,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        self.job_command(job_id, Command::CompleteWork { record }, actor, cause)
    }

    /// Aborts a job. Bids are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidState` if the job is already completed or
    /// cancelled, and `ApiError::InvalidInput` if the reason is blank.
    pub fn cancel(
        &self,
        job_id: JobId,
        reason: &str,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        self.job_command(
            job_id,
            Command::Cancel {
                reason: reason.to_string(),
            },
            actor,
            cause,
        )
    }

    // ------------------------------------------------------------------
    // Recommendation
    // ------------------------------------------------------------------

    /// Scores and orders the candidate pool for a job.
    ///
    /// While the job is `priced` or `notified` the pool is every active team.
    /// While it is `bidding` the pool is the teams holding an interested bid,
    /// scored on their quoted price.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidState` for any other job status.
    pub fn rank_candidates(&self, job_id: JobId) -> Result<Vec<CandidateScore>, ApiError> {
        let mut persistence = self.lock()?;
        let state: JobState = load_job(&mut persistence, job_id)?;

        let mut pool: Vec<PoolEntry> = Vec::new();
        match state.job.status {
            JobStatus::Priced | JobStatus::Notified => {
                let teams: Vec<LaborTeam> = persistence
                    .list_teams(true)
                    .map_err(translate_persistence_error)?;
                for team in teams {
                    pool.push(PoolEntry::load(&mut persistence, team, None)?);
                }
            }
            JobStatus::Bidding => {
                for bid in state.board().ranked_interested() {
                    let team: LaborTeam = persistence
                        .get_team(bid.team_id)
                        .map_err(translate_persistence_error)?;
                    pool.push(PoolEntry::load(
                        &mut persistence,
                        team,
                        bid.bid_price_per_acre,
                    )?);
                }
            }
            status => {
                return Err(translate_domain_error(DomainError::InvalidJobTransition {
                    operation: "rank candidates for",
                    status,
                }));
            }
        }

        let recent_prices: Vec<Decimal> = persistence
            .recent_bid_prices(&state.job.activity, BENCHMARK_WINDOW)
            .map_err(translate_persistence_error)?;
        drop(persistence);

        let activity: &Activity = &state.job.activity;
        let pool_rates: Vec<Decimal> = pool
            .iter()
            .filter_map(|entry| entry.team.rate_for(activity))
            .collect();
        let benchmark: Option<Decimal> = rate_benchmark(&recent_prices, &pool_rates);
        let candidates: Vec<Candidate<'_>> = pool.iter().map(PoolEntry::candidate).collect();
        let ranked: Vec<CandidateScore> =
            mukadam_bid_domain::rank_candidates(&state.job, &candidates, benchmark, &self.weights);

        debug!(
            job_id = %job_id,
            pool = candidates.len(),
            ranked = ranked.len(),
            benchmark = ?benchmark,
            "Ranked candidates"
        );
        Ok(ranked)
    }

    // ------------------------------------------------------------------
    // Teams and availability
    // ------------------------------------------------------------------

    /// Onboards a team with its rates and a default `available` interval.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the registration fails validation.
    pub fn onboard_team(
        &self,
        registration: TeamRegistration,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<TeamResponse, ApiError> {
        let onboarding: TeamOnboarding = onboard_team(
            registration,
            actor.clone(),
            cause.clone(),
            self.clock.now(),
        )
        .map_err(translate_core_error)?;

        let mut persistence = self.lock()?;
        let (state, event_id): (TeamState, i64) = persistence
            .persist_onboarding(&onboarding)
            .map_err(translate_persistence_error)?;
        drop(persistence);

        info!(team_id = %state.team.team_id, event_id, "Team onboarded");
        Ok(TeamResponse::from_state(state, Some(event_id)))
    }

    /// Sets or replaces a team's rate for one activity.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the team does not exist, and
    /// `ApiError::InvalidInput` if the rate is not positive.
    pub fn set_team_rate(
        &self,
        team_id: TeamId,
        activity: Activity,
        rate: Decimal,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<TeamResponse, ApiError> {
        self.team_command(team_id, TeamCommand::SetRate { activity, rate }, actor, cause)
    }

    /// Activates or deactivates a team. Inactive teams are never notified
    /// or recommended.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the team does not exist.
    pub fn set_team_active(
        &self,
        team_id: TeamId,
        active: bool,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<TeamResponse, ApiError> {
        self.team_command(team_id, TeamCommand::SetActive { active }, actor, cause)
    }

    /// Tags a date range on a team's calendar.
    ///
    /// A range inside one interval splits it; a range touching no interval
    /// is added on its own.
    ///
    /// # Returns
    ///
    /// The team's intervals after the change, ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::OutOfBounds` if the range straddles an interval
    /// boundary, and `ApiError::InvalidState` if the calendar changed since
    /// it was read.
    pub fn add_availability_interval(
        &self,
        team_id: TeamId,
        range: DateRange,
        status: AvailabilityStatus,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<TeamResponse, ApiError> {
        self.team_command(
            team_id,
            TeamCommand::AddAvailability { range, status },
            actor,
            cause,
        )
    }

    /// Removes one interval from its team's calendar.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the interval does not exist.
    pub fn delete_availability_interval(
        &self,
        interval_id: IntervalId,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<TeamResponse, ApiError> {
        let mut persistence = self.lock()?;
        let interval: AvailabilityInterval =
            persistence.get_interval(interval_id).map_err(|err| match err {
                PersistenceError::NotFound(_) => {
                    translate_domain_error(DomainError::IntervalNotFound(interval_id))
                }
                other => translate_persistence_error(other),
            })?;
        self.run_team_command(
            &mut persistence,
            interval.team_id,
            TeamCommand::DeleteAvailability { interval_id },
            actor,
            cause,
        )
    }

    /// A team's bidding record.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the team does not exist.
    pub fn team_performance(&self, team_id: TeamId) -> Result<TeamPerformance, ApiError> {
        let mut persistence = self.lock()?;
        load_team(&mut persistence, team_id)?;
        let history: Vec<BidHistoryEntry> = persistence
            .get_bid_history(team_id)
            .map_err(translate_persistence_error)?;
        drop(persistence);
        Ok(TeamPerformance::from_history(&history))
    }

    // ------------------------------------------------------------------
    // Payment
    // ------------------------------------------------------------------

    /// Checks a breakdown against a balance due.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a negative component and
    /// `ApiError::ReconciliationMismatch`, carrying the signed difference,
    /// if the total is more than one paisa away from the balance.
    pub fn validate_payment(
        breakdown: &CostBreakdown,
        balance_due: Decimal,
    ) -> Result<(), ApiError> {
        validate_breakdown(breakdown, balance_due).map_err(translate_domain_error)
    }

    /// Balance still owed on a job.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the job has no finalized price or
    /// no farm size.
    pub fn balance_due(&self, job_id: JobId) -> Result<Decimal, ApiError> {
        let mut persistence = self.lock()?;
        let state: JobState = load_job(&mut persistence, job_id)?;
        drop(persistence);
        balance_due(&state.job).map_err(translate_domain_error)
    }

    /// Records the single payment of a completed job.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `ApiError::InvalidState` unless the job is `completed` and unpaid
    /// - `ApiError::ReconciliationMismatch` if the breakdown does not match
    ///   the balance due
    pub fn record_payment(
        &self,
        job_id: JobId,
        payment: PaymentRequest,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<JobResponse, ApiError> {
        self.job_command(
            job_id,
            Command::RecordPayment {
                breakdown: payment.breakdown,
                method: payment.method,
                proof_reference: payment.proof_reference,
                collected_by: payment.collected_by,
            },
            actor,
            cause,
        )
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// A job with its bids and payment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the job does not exist.
    pub fn get_job(&self, job_id: JobId) -> Result<JobResponse, ApiError> {
        let mut persistence = self.lock()?;
        let state: JobState = load_job(&mut persistence, job_id)?;
        drop(persistence);
        Ok(JobResponse::from_state(state, None))
    }

    /// Jobs, newest first, optionally in one status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<Job>, ApiError> {
        self.lock()?
            .list_jobs(status)
            .map_err(translate_persistence_error)
    }

    /// A team with its calendar.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResourceNotFound` if the team does not exist.
    pub fn get_team(&self, team_id: TeamId) -> Result<TeamResponse, ApiError> {
        let mut persistence = self.lock()?;
        let state: TeamState = load_team(&mut persistence, team_id)?;
        drop(persistence);
        Ok(TeamResponse::from_state(state, None))
    }

    /// Teams in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_teams(&self, active_only: bool) -> Result<Vec<LaborTeam>, ApiError> {
        self.lock()?
            .list_teams(active_only)
            .map_err(translate_persistence_error)
    }

    /// Every audit event of a job, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn job_audit_trail(&self, job_id: JobId) -> Result<Vec<AuditEvent>, ApiError> {
        self.lock()?
            .get_job_audit_trail(job_id)
            .map_err(translate_persistence_error)
    }

    /// Every audit event of a team, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn team_audit_trail(&self, team_id: TeamId) -> Result<Vec<AuditEvent>, ApiError> {
        self.lock()?
            .get_team_audit_trail(team_id)
            .map_err(translate_persistence_error)
    }

    // ------------------------------------------------------------------
    // Roster import
    // ------------------------------------------------------------------

    /// Validates a roster file against the stored teams without writing.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCsvFormat` if the header row is unreadable
    /// or incomplete.
    pub fn preview_roster_csv(&self, csv_content: &str) -> Result<RosterPreview, ApiError> {
        let mut persistence = self.lock()?;
        let phones: HashSet<String> = onboarded_phones(&mut persistence)?;
        drop(persistence);
        Ok(preview_roster(csv_content, &phones)?)
    }

    /// Onboards every team of a roster file whose rows are all valid.
    ///
    /// Each team is onboarded in its own transaction. A team whose status is
    /// not `available` gets its whole default interval retagged.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCsvFormat` if the header row is unreadable
    /// or incomplete. Invalid rows are reported in the response instead.
    pub fn import_roster_csv(
        &self,
        csv_content: &str,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<RosterImportResponse, ApiError> {
        let mut persistence = self.lock()?;
        let phones: HashSet<String> = onboarded_phones(&mut persistence)?;
        let preview: RosterPreview = preview_roster(csv_content, &phones)?;

        let mut imported: Vec<TeamId> = Vec::new();
        for roster_team in &preview.teams {
            imported.push(self.import_team(&mut persistence, roster_team, actor, cause)?);
        }
        drop(persistence);

        let invalid_count: usize = preview.invalid_count();
        info!(
            imported = imported.len(),
            invalid_rows = invalid_count,
            "Roster imported"
        );
        Ok(RosterImportResponse {
            rows: preview.rows,
            imported,
            invalid_count,
        })
    }

    fn import_team(
        &self,
        persistence: &mut Persistence,
        roster_team: &RosterTeam,
        actor: &Actor,
        cause: &Cause,
    ) -> Result<TeamId, ApiError> {
        let onboarding: TeamOnboarding = onboard_team(
            roster_team.registration.clone(),
            actor.clone(),
            cause.clone(),
            self.clock.now(),
        )
        .map_err(translate_core_error)?;
        let (state, _): (TeamState, i64) = persistence
            .persist_onboarding(&onboarding)
            .map_err(translate_persistence_error)?;
        let team_id: TeamId = state.team.team_id;

        if roster_team.availability != AvailabilityStatus::Available {
            self.run_team_command(
                persistence,
                team_id,
                TeamCommand::AddAvailability {
                    range: onboarding.default_range,
                    status: roster_team.availability,
                },
                actor,
                cause,
            )?;
        }
        debug!(team_id = %team_id, rows = ?roster_team.rows, "Imported roster team");
        Ok(team_id)
    }
}

fn onboarded_phones(persistence: &mut Persistence) -> Result<HashSet<String>, ApiError> {
    Ok(persistence
        .list_teams(false)
        .map_err(translate_persistence_error)?
        .into_iter()
        .map(|team| team.phone)
        .collect())
}
