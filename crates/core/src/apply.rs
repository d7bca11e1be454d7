// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{Command, TeamCommand};
use crate::error::CoreError;
use crate::state::{
    BidWrite, JobCreation, JobState, TeamOnboarding, TeamState, TeamTransitionResult, TeamWrite,
    TransitionResult,
};
use mukadam_bid_audit::{Action, Actor, AuditEvent, Cause, Scope, StateSnapshot};
use mukadam_bid_domain::{
    AvailabilityInterval, AvailabilityStatus, Bid, BidDecision, BidId, BidStatus, CompletionRecord,
    DateRange, DomainError, IntervalPlan, Job, JobId, JobRequest, JobStatus, PaymentRecord, TeamId,
    TeamRegistration, balance_due, plan_interval_addition, validate_breakdown,
    validate_completion_record, validate_confirmable, validate_job_invariants,
    validate_non_overlapping, validate_positive, validate_rate, validate_reason,
    validate_team_registration,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;

/// Moves a job to `target` if the lifecycle allows it.
fn advance(job: &mut Job, target: JobStatus, operation: &'static str) -> Result<(), DomainError> {
    if !job.status.can_transition_to(target) {
        return Err(DomainError::InvalidJobTransition {
            operation,
            status: job.status,
        });
    }
    job.status = target;
    Ok(())
}

/// Creates pending bids for every listed team that holds none on this job.
///
/// Duplicate team ids collapse to one bid.
fn fan_out(state: &JobState, team_ids: &[TeamId], at: OffsetDateTime) -> Vec<Bid> {
    let mut created: Vec<Bid> = Vec::new();
    for team_id in team_ids {
        let already_notified: bool = state.bids.iter().any(|bid| bid.team_id == *team_id)
            || created.iter().any(|bid| bid.team_id == *team_id);
        if !already_notified {
            created.push(Bid::pending(state.job.job_id, *team_id, at));
        }
    }
    created
}

fn require_teams(team_ids: &[TeamId]) -> Result<(), DomainError> {
    if team_ids.is_empty() {
        return Err(DomainError::MissingField { field: "team_ids" });
    }
    Ok(())
}

fn team_list(bids: &[Bid]) -> String {
    bids.iter()
        .map(|bid| bid.team_id.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// The job and bid changes one command makes.
struct Outcome {
    job: Job,
    bids: Vec<Bid>,
    bid_writes: Vec<BidWrite>,
    payment: Option<PaymentRecord>,
    details: String,
}

impl Outcome {
    fn from_state(state: &JobState) -> Self {
        Self {
            job: state.job.clone(),
            bids: state.bids.clone(),
            bid_writes: Vec::new(),
            payment: None,
            details: String::new(),
        }
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = details;
        self
    }

    fn replace_bid(&mut self, bid: Bid, expected: BidStatus) {
        if let Some(slot) = self.bids.iter_mut().find(|b| b.bid_id == bid.bid_id) {
            *slot = bid.clone();
        }
        self.bid_writes.push(BidWrite::Update { bid, expected });
    }

    fn insert_bids(&mut self, created: Vec<Bid>) {
        for bid in created {
            self.bids.push(bid.clone());
            self.bid_writes.push(BidWrite::Insert(bid));
        }
    }
}

/// Validates a new job request.
///
/// # Arguments
///
/// * `request` - The farmer's request
/// * `confirm` - Whether to record the job directly as `confirmed`
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `at` - When the request is recorded
///
/// # Errors
///
/// Returns an error if:
/// - A supplied size or price is not positive, or the advance is negative
/// - `confirm` is set and the request is incomplete
pub fn create_job(
    request: JobRequest,
    confirm: bool,
    actor: Actor,
    cause: Cause,
    at: OffsetDateTime,
) -> Result<JobCreation, CoreError> {
    if let Some(acres) = request.farm_size_acres {
        validate_positive("farm_size_acres", acres)?;
    }
    if let Some(price) = request.farmer_price_per_acre {
        validate_positive("farmer_price_per_acre", price)?;
    }
    if request.advance_amount < Decimal::ZERO {
        return Err(CoreError::DomainViolation(DomainError::InvalidField {
            field: "advance_amount",
            reason: String::from("must not be negative"),
        }));
    }

    let initial_status: JobStatus = if confirm {
        let probe: Job = Job::from_request(JobId::new(0), request.clone(), at);
        validate_confirmable(&probe)?;
        JobStatus::Confirmed
    } else {
        JobStatus::Pending
    };

    Ok(JobCreation {
        request,
        initial_status,
        actor,
        cause,
        occurred_at: at,
    })
}

/// Validates a team registration.
///
/// # Errors
///
/// Returns an error if the registration fails field validation.
pub fn onboard_team(
    registration: TeamRegistration,
    actor: Actor,
    cause: Cause,
    at: OffsetDateTime,
) -> Result<TeamOnboarding, CoreError> {
    let default_range: DateRange = validate_team_registration(&registration)?;
    Ok(TeamOnboarding {
        registration,
        default_range,
        actor,
        cause,
        occurred_at: at,
    })
}

fn confirm(state: &JobState) -> Result<Outcome, DomainError> {
    let mut outcome: Outcome = Outcome::from_state(state);
    advance(&mut outcome.job, JobStatus::Confirmed, "confirm")?;
    validate_confirmable(&outcome.job)?;
    Ok(outcome.with_details(String::from("Request confirmed")))
}

fn set_price(state: &JobState, price: Decimal) -> Result<Outcome, DomainError> {
    let mut outcome: Outcome = Outcome::from_state(state);
    advance(&mut outcome.job, JobStatus::Priced, "price")?;
    validate_positive("your_price_per_acre", price)?;
    outcome.job.your_price_per_acre = Some(price);
    Ok(outcome.with_details(format!("Priced at {price} per acre")))
}

fn notify(
    state: &JobState,
    team_ids: &[TeamId],
    at: OffsetDateTime,
) -> Result<Outcome, DomainError> {
    if !state.job.status.accepts_notifications() {
        return Err(DomainError::InvalidJobTransition {
            operation: "notify teams about",
            status: state.job.status,
        });
    }
    require_teams(team_ids)?;

    let mut outcome: Outcome = Outcome::from_state(state);
    let created: Vec<Bid> = fan_out(state, team_ids, at);
    let details: String = if created.is_empty() {
        String::from("All listed teams were already notified")
    } else {
        format!("Notified teams {}", team_list(&created))
    };
    outcome.insert_bids(created);

    if !outcome.bids.is_empty() && outcome.job.status != JobStatus::Bidding {
        advance(&mut outcome.job, JobStatus::Bidding, "open bidding on")?;
    }
    Ok(outcome.with_details(details))
}

fn record_response(
    state: &JobState,
    bid_id: BidId,
    decision: BidDecision,
    price: Option<Decimal>,
    estimated_days: Option<u32>,
    comment: Option<String>,
    at: OffsetDateTime,
) -> Result<Outcome, DomainError> {
    if state.job.status != JobStatus::Bidding {
        return Err(DomainError::InvalidJobTransition {
            operation: "record a bid response on",
            status: state.job.status,
        });
    }
    let original: &Bid = state
        .bids
        .iter()
        .find(|bid| bid.bid_id == Some(bid_id))
        .ok_or(DomainError::BidNotOnJob {
            bid_id,
            job_id: state.job.job_id,
        })?;
    let new_status: BidStatus = decision.resulting_status();
    original.status.validate_transition(new_status)?;

    let price: Option<Decimal> = match (decision, price) {
        (BidDecision::Interested, Some(price)) => {
            validate_positive("bid_price_per_acre", price)?;
            Some(price)
        }
        (BidDecision::Interested, None) => {
            return Err(DomainError::MissingField {
                field: "bid_price_per_acre",
            });
        }
        (BidDecision::Declined, Some(_)) => {
            return Err(DomainError::InvalidField {
                field: "bid_price_per_acre",
                reason: String::from("a declined bid carries no price"),
            });
        }
        (BidDecision::Declined, None) => None,
    };

    let mut answered: Bid = original.clone();
    answered.status = new_status;
    answered.bid_price_per_acre = price;
    answered.estimated_days = estimated_days;
    answered.comment = comment;
    answered.responded_at = Some(at);

    let details: String = price.map_or_else(
        || format!("Team {} declined", answered.team_id),
        |p| format!("Team {} interested at {p} per acre", answered.team_id),
    );
    let mut outcome: Outcome = Outcome::from_state(state);
    outcome.replace_bid(answered, original.status);
    Ok(outcome.with_details(details))
}

fn finalize(state: &JobState, bid_id: BidId) -> Result<Outcome, DomainError> {
    let assigned: Option<BidId> = state.board().assigned().and_then(|bid| bid.bid_id);
    if assigned.is_some() || state.job.status.is_past_finalization() {
        return Err(DomainError::AlreadyFinalized {
            job_id: state.job.job_id,
            assigned_bid: assigned,
        });
    }

    let mut outcome: Outcome = Outcome::from_state(state);
    advance(&mut outcome.job, JobStatus::Finalized, "finalize")?;

    let chosen: &Bid = state
        .bids
        .iter()
        .find(|bid| bid.bid_id == Some(bid_id))
        .ok_or(DomainError::BidNotOnJob {
            bid_id,
            job_id: state.job.job_id,
        })?;
    chosen.status.validate_transition(BidStatus::Assigned)?;
    let price: Decimal = chosen.bid_price_per_acre.ok_or(DomainError::MissingField {
        field: "bid_price_per_acre",
    })?;

    let mut winner: Bid = chosen.clone();
    winner.status = BidStatus::Assigned;
    outcome.job.finalized_price_per_acre = Some(price);
    outcome.replace_bid(winner, chosen.status);
    Ok(outcome.with_details(format!(
        "Bid {bid_id} from team {} selected at {price} per acre",
        chosen.team_id
    )))
}

fn reassign(
    state: &JobState,
    team_ids: &[TeamId],
    reason: &str,
    at: OffsetDateTime,
) -> Result<Outcome, DomainError> {
    if state.job.status != JobStatus::Bidding {
        return Err(DomainError::InvalidJobTransition {
            operation: "reassign",
            status: state.job.status,
        });
    }
    validate_reason("reason", reason)?;
    require_teams(team_ids)?;

    let mut outcome: Outcome = Outcome::from_state(state);
    let created: Vec<Bid> = fan_out(state, team_ids, at);
    let details: String = format!(
        "Reassigned to teams [{}]: {}",
        team_list(&created),
        reason.trim()
    );
    outcome.insert_bids(created);
    Ok(outcome.with_details(details))
}

fn start_work(state: &JobState, at: OffsetDateTime) -> Result<Outcome, DomainError> {
    let mut outcome: Outcome = Outcome::from_state(state);
    advance(&mut outcome.job, JobStatus::InProgress, "start work on")?;
    outcome.job.started_at = Some(at);
    Ok(outcome.with_details(String::from("Work started")))
}

fn complete_work(
    state: &JobState,
    record: CompletionRecord,
    at: OffsetDateTime,
) -> Result<Outcome, DomainError> {
    let mut outcome: Outcome = Outcome::from_state(state);
    advance(&mut outcome.job, JobStatus::Completed, "complete")?;
    validate_completion_record(&record)?;
    let details: String = format!(
        "Completed {} acres with {} labourers",
        record.actual_area_acres, record.labourers_used
    );
    outcome.job.completion = Some(record);
    outcome.job.completed_at = Some(at);
    Ok(outcome.with_details(details))
}

fn cancel(state: &JobState, reason: &str) -> Result<Outcome, DomainError> {
    let mut outcome: Outcome = Outcome::from_state(state);
    advance(&mut outcome.job, JobStatus::Cancelled, "cancel")?;
    validate_reason("reason", reason)?;
    outcome.job.cancellation_reason = Some(reason.trim().to_string());
    Ok(outcome.with_details(format!("Cancelled: {}", reason.trim())))
}

fn record_payment(state: &JobState, payment: PaymentRecord) -> Result<Outcome, DomainError> {
    if state.job.status != JobStatus::Completed {
        return Err(DomainError::InvalidJobTransition {
            operation: "record a payment for",
            status: state.job.status,
        });
    }
    if state.payment.is_some() {
        return Err(DomainError::PaymentAlreadyRecorded(state.job.job_id));
    }
    validate_reason("collected_by", &payment.collected_by)?;
    let due: Decimal = balance_due(&state.job)?;
    validate_breakdown(&payment.breakdown, due)?;

    let collected: Decimal = payment.breakdown.total()?;

    let details: String = format!(
        "Collected {collected} by {} against balance {due}",
        payment.method
    );
    let mut outcome: Outcome = Outcome::from_state(state);
    outcome.payment = Some(payment);
    Ok(outcome.with_details(details))
}

/// Applies a command to a job, producing the new state, its row changes and
/// one audit event.
///
/// # Arguments
///
/// * `state` - The current job state (immutable)
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
/// * `at` - When the command is applied
///
/// # Returns
///
/// * `Ok(TransitionResult)` containing the new state, writes and audit event
/// * `Err(CoreError)` if the command is invalid
///
/// # Errors
///
/// Returns an error if:
/// - The job's status does not permit the command
/// - The command's input fails validation
/// - The resulting job would break a field/status invariant
pub fn apply(
    state: &JobState,
    command: Command,
    actor: Actor,
    cause: Cause,
    at: OffsetDateTime,
) -> Result<TransitionResult, CoreError> {
    let action_name: &'static str = command.action_name();
    let outcome: Outcome = match command {
        Command::ConfirmJob => confirm(state)?,
        Command::SetPrice {
            your_price_per_acre,
        } => set_price(state, your_price_per_acre)?,
        Command::NotifyTeams { team_ids } => notify(state, &team_ids, at)?,
        Command::RecordBidResponse {
            bid_id,
            decision,
            price,
            estimated_days,
            comment,
        } => record_response(state, bid_id, decision, price, estimated_days, comment, at)?,
        Command::Finalize { bid_id } => finalize(state, bid_id)?,
        Command::Reassign { team_ids, reason } => reassign(state, &team_ids, &reason, at)?,
        Command::StartWork => start_work(state, at)?,
        Command::CompleteWork { record } => complete_work(state, record, at)?,
        Command::Cancel { reason } => cancel(state, &reason)?,
        Command::RecordPayment {
            breakdown,
            method,
            proof_reference,
            collected_by,
        } => record_payment(
            state,
            PaymentRecord {
                job_id: state.job.job_id,
                breakdown,
                method,
                proof_reference,
                collected_by,
                recorded_at: at,
            },
        )?,
    };

    validate_job_invariants(&outcome.job)?;

    let assigned: usize = outcome
        .bids
        .iter()
        .filter(|bid| bid.status == BidStatus::Assigned)
        .count();
    if assigned > 1 {
        return Err(CoreError::Internal(format!(
            "job {} would hold {assigned} assigned bids",
            state.job.job_id
        )));
    }

    let new_state: JobState = JobState::new(
        outcome.job,
        outcome.bids,
        outcome.payment.clone().or_else(|| state.payment.clone()),
    );

    let before: StateSnapshot = state.to_snapshot();
    let after: StateSnapshot = new_state.to_snapshot();
    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(String::from(action_name), Some(outcome.details)),
        before,
        after,
        Scope::Job(state.job.job_id),
        at,
    );

    Ok(TransitionResult {
        new_state,
        expected_status: state.job.status,
        bid_writes: outcome.bid_writes,
        payment: outcome.payment,
        audit_event,
    })
}

fn add_availability(
    state: &TeamState,
    range: DateRange,
    status: AvailabilityStatus,
) -> Result<(Vec<AvailabilityInterval>, TeamWrite, String), DomainError> {
    let plan: IntervalPlan =
        plan_interval_addition(&state.intervals, state.team.team_id, range, status)?;
    let mut intervals: Vec<AvailabilityInterval> = state.intervals.clone();
    let (write, details): (TeamWrite, String) = match plan {
        IntervalPlan::Split {
            original,
            replacements,
        } => {
            intervals.retain(|interval| interval.interval_id != original.interval_id);
            intervals.extend(replacements.iter().cloned());
            let details: String = format!(
                "Split {} {} into {} interval(s) with {range} {status}",
                original.range,
                original.status,
                replacements.len()
            );
            (
                TeamWrite::ReplaceInterval {
                    original,
                    replacements,
                },
                details,
            )
        }
        IntervalPlan::Insert(interval) => {
            intervals.push(interval.clone());
            (
                TeamWrite::InsertInterval(interval),
                format!("Added {range} {status}"),
            )
        }
    };
    intervals.sort_by_key(|interval| interval.range.start());
    validate_non_overlapping(&intervals)?;
    Ok((intervals, write, details))
}

/// Applies a command to a team, producing the new state, its row change and
/// one audit event.
///
/// # Errors
///
/// Returns an error if:
/// - A rate entry is invalid
/// - The availability range partially overlaps existing intervals
/// - The interval to delete does not belong to the team
pub fn apply_team(
    state: &TeamState,
    command: TeamCommand,
    actor: Actor,
    cause: Cause,
    at: OffsetDateTime,
) -> Result<TeamTransitionResult, CoreError> {
    let action_name: &'static str = command.action_name();
    let mut new_state: TeamState = state.clone();

    let (write, details): (TeamWrite, String) = match command {
        TeamCommand::SetRate { activity, rate } => {
            validate_rate(&activity, rate)?;
            new_state.team.rates.insert(activity.clone(), rate);
            let details: String = format!("Rate for {activity} set to {rate}");
            (TeamWrite::UpsertRate { activity, rate }, details)
        }
        TeamCommand::SetActive { active } => {
            new_state.team.is_active = active;
            let details: String = if active {
                String::from("Team activated")
            } else {
                String::from("Team deactivated")
            };
            (TeamWrite::SetActive(active), details)
        }
        TeamCommand::AddAvailability { range, status } => {
            let (intervals, write, details) = add_availability(state, range, status)?;
            new_state.intervals = intervals;
            (write, details)
        }
        TeamCommand::DeleteAvailability { interval_id } => {
            let interval: AvailabilityInterval = state
                .intervals
                .iter()
                .find(|interval| interval.interval_id == Some(interval_id))
                .cloned()
                .ok_or(DomainError::IntervalNotFound(interval_id))?;
            new_state
                .intervals
                .retain(|existing| existing.interval_id != Some(interval_id));
            let details: String = format!("Removed {} {}", interval.range, interval.status);
            (TeamWrite::DeleteInterval(interval), details)
        }
    };

    let audit_event: AuditEvent = AuditEvent::new(
        actor,
        cause,
        Action::new(String::from(action_name), Some(details)),
        state.to_snapshot(),
        new_state.to_snapshot(),
        Scope::Team(state.team.team_id),
        at,
    );

    Ok(TeamTransitionResult {
        new_state,
        write,
        audit_event,
    })
}
