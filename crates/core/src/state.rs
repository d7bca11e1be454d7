// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use mukadam_bid_audit::{Action, Actor, AuditEvent, Cause, Scope, StateSnapshot};
use mukadam_bid_domain::{
    Activity, AvailabilityInterval, Bid, BidBoard, BidStatus, DateRange, Job, JobRequest, JobStatus,
    LaborTeam, PaymentRecord, TeamRegistration,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;

fn price_text(price: Option<Decimal>) -> String {
    price.map_or_else(|| String::from("none"), |p| p.to_string())
}

/// Everything a job transition reads: the job, its bids and its payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    /// The job.
    pub job: Job,
    /// Every bid placed on the job.
    pub bids: Vec<Bid>,
    /// The recorded payment, once the job has been paid.
    pub payment: Option<PaymentRecord>,
}

impl JobState {
    /// Creates a job state.
    #[must_use]
    pub const fn new(job: Job, bids: Vec<Bid>, payment: Option<PaymentRecord>) -> Self {
        Self { job, bids, payment }
    }

    /// Aggregated view over the job's bids.
    #[must_use]
    pub fn board(&self) -> BidBoard {
        BidBoard::new(self.job.job_id, self.bids.clone())
    }

    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        let count = |status: BidStatus| self.bids.iter().filter(|b| b.status == status).count();
        StateSnapshot::new(format!(
            "job_id={},status={},your_price={},finalized_price={},bids=pending:{}/interested:{}/declined:{}/assigned:{},paid={}",
            self.job.job_id,
            self.job.status,
            price_text(self.job.your_price_per_acre),
            price_text(self.job.finalized_price_per_acre),
            count(BidStatus::Pending),
            count(BidStatus::Interested),
            count(BidStatus::Declined),
            count(BidStatus::Assigned),
            self.payment.is_some()
        ))
    }
}

/// A bid row change produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidWrite {
    /// A new pending bid for a freshly notified team.
    Insert(Bid),
    /// An existing bid whose status changed.
    ///
    /// The write only applies if the stored bid still holds `expected`.
    Update {
        /// The bid after the change.
        bid: Bid,
        /// The status the bid held when it was read.
        expected: BidStatus,
    },
}

/// The result of a successful job transition.
///
/// Transitions are atomic: they either succeed completely or fail without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// The new state after the transition.
    pub new_state: JobState,
    /// The job status the transition was computed from. The job write only
    /// applies if the stored job still holds this status.
    pub expected_status: JobStatus,
    /// Bid rows to insert or update.
    pub bid_writes: Vec<BidWrite>,
    /// A payment to store.
    pub payment: Option<PaymentRecord>,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}

impl TransitionResult {
    /// Bids created by this transition.
    #[must_use]
    pub fn inserted_bids(&self) -> Vec<&Bid> {
        self.bid_writes
            .iter()
            .filter_map(|write| match write {
                BidWrite::Insert(bid) => Some(bid),
                BidWrite::Update { .. } => None,
            })
            .collect()
    }
}

/// A team with its calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamState {
    /// The team.
    pub team: LaborTeam,
    /// The team's intervals, ordered by start date.
    pub intervals: Vec<AvailabilityInterval>,
}

impl TeamState {
    /// Creates a team state.
    #[must_use]
    pub const fn new(team: LaborTeam, intervals: Vec<AvailabilityInterval>) -> Self {
        Self { team, intervals }
    }

    /// Converts the state to a snapshot for audit purposes.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        let rates: Vec<String> = self
            .team
            .rates
            .iter()
            .map(|(activity, rate)| format!("{activity}:{rate}"))
            .collect();
        let intervals: Vec<String> = self
            .intervals
            .iter()
            .map(|interval| format!("{}:{}", interval.range, interval.status))
            .collect();
        StateSnapshot::new(format!(
            "team_id={},active={},crew={},rates=[{}],intervals=[{}]",
            self.team.team_id,
            self.team.is_active,
            self.team.crew_size,
            rates.join(";"),
            intervals.join(";")
        ))
    }
}

/// A team row change produced by a team transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamWrite {
    /// Set or replace one activity rate.
    UpsertRate {
        /// The activity.
        activity: Activity,
        /// Rate per acre.
        rate: Decimal,
    },
    /// Flip the active flag.
    SetActive(bool),
    /// Add an interval that touches no other interval.
    InsertInterval(AvailabilityInterval),
    /// Replace one interval by its split slices.
    ///
    /// The original is removed only if it is still stored unchanged.
    ReplaceInterval {
        /// The interval as it was read.
        original: AvailabilityInterval,
        /// Its replacements, in date order.
        replacements: Vec<AvailabilityInterval>,
    },
    /// Remove one interval.
    DeleteInterval(AvailabilityInterval),
}

/// The result of a successful team transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTransitionResult {
    /// The team after the transition. New intervals carry no id yet.
    pub new_state: TeamState,
    /// The row change to persist.
    pub write: TeamWrite,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}

/// A validated request to record a new job.
///
/// The job's identifier is assigned on insert, so the audit event is built
/// once the persisted job exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCreation {
    /// The request.
    pub request: JobRequest,
    /// `pending`, or `confirmed` when confirmation was requested and allowed.
    pub initial_status: JobStatus,
    /// Who recorded the request.
    pub actor: Actor,
    /// Why.
    pub cause: Cause,
    /// When.
    pub occurred_at: OffsetDateTime,
}

impl JobCreation {
    /// Builds the audit event for the persisted job.
    #[must_use]
    pub fn audit_event(&self, job: &Job) -> AuditEvent {
        let after: StateSnapshot = JobState::new(job.clone(), Vec::new(), None).to_snapshot();
        AuditEvent::new(
            self.actor.clone(),
            self.cause.clone(),
            Action::new(
                String::from("CreateJob"),
                Some(format!(
                    "Recorded {} request from '{}' as {}",
                    job.activity, job.farmer, job.status
                )),
            ),
            StateSnapshot::new(String::from("none")),
            after,
            Scope::Job(job.job_id),
            self.occurred_at,
        )
    }
}

/// A validated request to onboard a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamOnboarding {
    /// The registration.
    pub registration: TeamRegistration,
    /// Range of the default `Available` interval.
    pub default_range: DateRange,
    /// Who onboarded the team.
    pub actor: Actor,
    /// Why.
    pub cause: Cause,
    /// When.
    pub occurred_at: OffsetDateTime,
}

impl TeamOnboarding {
    /// Builds the audit event for the persisted team.
    #[must_use]
    pub fn audit_event(&self, state: &TeamState) -> AuditEvent {
        AuditEvent::new(
            self.actor.clone(),
            self.cause.clone(),
            Action::new(
                String::from("OnboardTeam"),
                Some(format!(
                    "Onboarded team led by '{}' with crew of {}",
                    state.team.leader_name, state.team.crew_size
                )),
            ),
            StateSnapshot::new(String::from("none")),
            state.to_snapshot(),
            Scope::Team(state.team.team_id),
            self.occurred_at,
        )
    }
}
