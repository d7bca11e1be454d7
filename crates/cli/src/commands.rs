// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Console subcommands and their dispatch onto the engine.
//!
//! Every subcommand maps to exactly one engine operation and prints its
//! result as JSON.

use clap::Subcommand;
use mukadam_bid_api::{BidResponseRequest, MatchingEngine, PaymentRequest, RosterPreview};
use mukadam_bid_audit::{Actor, AuditEvent, Cause};
use mukadam_bid_domain::{
    Activity, AvailabilityStatus, BidDecision, BidId, CompletionRecord, CostBreakdown, DateRange,
    IntervalId, JobId, JobRequest, JobStatus, PaymentMethod, TeamId, TeamRegistration,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::str::FromStr;
use time::Date;
use time::macros::format_description;

use crate::error::CliError;

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Parses an `activity=rate` pair.
pub fn parse_rate(value: &str) -> Result<(Activity, Decimal), String> {
    let (activity, rate) = value
        .split_once('=')
        .ok_or_else(|| String::from("expected ACTIVITY=RATE"))?;
    let rate: Decimal =
        Decimal::from_str(rate.trim()).map_err(|e| format!("invalid rate '{rate}': {e}"))?;
    Ok((Activity::new(activity), rate))
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Record a farmer's request
    CreateJob {
        #[arg(long)]
        farmer: String,
        #[arg(long)]
        activity: String,
        /// Farm size in acres
        #[arg(long)]
        acres: Option<Decimal>,
        /// Requested work date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
        /// Price per acre the farmer offered
        #[arg(long)]
        farmer_price: Option<Decimal>,
        #[arg(long, default_value_t = Decimal::ZERO)]
        advance: Decimal,
        #[arg(long, default_value_t = 0)]
        workers: u32,
        #[arg(long)]
        notes: Option<String>,
        /// Record the job as confirmed straight away
        #[arg(long)]
        confirm: bool,
    },
    /// Confirm a pending request
    ConfirmJob { job_id: i64 },
    /// Set the operator's price per acre
    SetPrice { job_id: i64, price: Decimal },
    /// Notify teams about a priced job
    Notify {
        job_id: i64,
        #[arg(long = "team", required = true)]
        teams: Vec<i64>,
    },
    /// Record a team's answer to a notification
    Respond {
        bid_id: i64,
        /// `interested` or `declined`
        decision: BidDecision,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Interested bids in selection order
    RankBids { job_id: i64 },
    /// Score and order candidate teams for a job
    RankCandidates { job_id: i64 },
    /// Select the winning bid
    Finalize { job_id: i64, bid_id: i64 },
    /// Notify more teams about a job still in bidding
    Reassign {
        job_id: i64,
        #[arg(long = "team", required = true)]
        teams: Vec<i64>,
        #[arg(long)]
        reason: String,
    },
    /// Mark a finalized job as started
    StartWork { job_id: i64 },
    /// Mark a job as completed
    CompleteWork {
        job_id: i64,
        #[arg(long)]
        area: Decimal,
        #[arg(long)]
        labourers: u32,
        #[arg(long)]
        hours: Decimal,
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        summary: String,
    },
    /// Cancel a job
    Cancel {
        job_id: i64,
        #[arg(long)]
        reason: String,
    },
    /// Balance still owed on a job
    Balance { job_id: i64 },
    /// Record the payment of a completed job
    Pay {
        job_id: i64,
        #[arg(long, default_value_t = Decimal::ZERO)]
        labor: Decimal,
        #[arg(long, default_value_t = Decimal::ZERO)]
        transport: Decimal,
        #[arg(long, default_value_t = Decimal::ZERO)]
        accommodation: Decimal,
        #[arg(long, default_value_t = Decimal::ZERO)]
        other: Decimal,
        /// `cash`, `upi`, `bank_transfer` or `cheque`
        #[arg(long)]
        method: PaymentMethod,
        #[arg(long)]
        proof: Option<String>,
        #[arg(long)]
        collected_by: String,
    },
    /// Onboard a labour team
    OnboardTeam {
        #[arg(long)]
        leader: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        crew: u32,
        /// Rate per acre as ACTIVITY=RATE, repeatable
        #[arg(long = "rate", value_parser = parse_rate)]
        rates: Vec<(Activity, Decimal)>,
        #[arg(long, value_parser = parse_date)]
        from: Date,
        #[arg(long, value_parser = parse_date)]
        until: Date,
    },
    /// Set a team's rate for one activity
    SetRate {
        team_id: i64,
        activity: String,
        rate: Decimal,
    },
    /// Activate or deactivate a team
    SetActive {
        team_id: i64,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Tag a date range on a team's calendar
    AddInterval {
        team_id: i64,
        #[arg(long, value_parser = parse_date)]
        from: Date,
        #[arg(long, value_parser = parse_date)]
        until: Date,
        /// `available`, `busy` or `on_leave`
        #[arg(long)]
        status: AvailabilityStatus,
    },
    /// Remove an interval from a team's calendar
    DeleteInterval { interval_id: i64 },
    /// A team's bidding record
    Performance { team_id: i64 },
    /// Show a job with its bids and payment
    ShowJob { job_id: i64 },
    /// List jobs, newest first
    ListJobs {
        #[arg(long)]
        status: Option<JobStatus>,
    },
    /// Show a team with its calendar
    ShowTeam { team_id: i64 },
    /// List teams
    ListTeams {
        #[arg(long)]
        active_only: bool,
    },
    /// Audit trail of a job
    JobAudit { job_id: i64 },
    /// Audit trail of a team
    TeamAudit { team_id: i64 },
    /// Import teams from a roster CSV file
    ImportRoster {
        path: String,
        /// Validate only; write nothing
        #[arg(long)]
        preview: bool,
    },
}

impl Command {
    /// The subcommand's name, used as the audit cause id.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateJob { .. } => "create-job",
            Self::ConfirmJob { .. } => "confirm-job",
            Self::SetPrice { .. } => "set-price",
            Self::Notify { .. } => "notify",
            Self::Respond { .. } => "respond",
            Self::RankBids { .. } => "rank-bids",
            Self::RankCandidates { .. } => "rank-candidates",
            Self::Finalize { .. } => "finalize",
            Self::Reassign { .. } => "reassign",
            Self::StartWork { .. } => "start-work",
            Self::CompleteWork { .. } => "complete-work",
            Self::Cancel { .. } => "cancel",
            Self::Balance { .. } => "balance",
            Self::Pay { .. } => "pay",
            Self::OnboardTeam { .. } => "onboard-team",
            Self::SetRate { .. } => "set-rate",
            Self::SetActive { .. } => "set-active",
            Self::AddInterval { .. } => "add-interval",
            Self::DeleteInterval { .. } => "delete-interval",
            Self::Performance { .. } => "performance",
            Self::ShowJob { .. } => "show-job",
            Self::ListJobs { .. } => "list-jobs",
            Self::ShowTeam { .. } => "show-team",
            Self::ListTeams { .. } => "list-teams",
            Self::JobAudit { .. } => "job-audit",
            Self::TeamAudit { .. } => "team-audit",
            Self::ImportRoster { .. } => "import-roster",
        }
    }
}

/// Printable view of an audit event.
#[derive(Debug, Serialize)]
struct AuditEntry {
    event_id: Option<i64>,
    action: String,
    details: Option<String>,
    actor: String,
    cause: String,
    occurred_at: String,
    before: String,
    after: String,
}

impl From<AuditEvent> for AuditEntry {
    fn from(event: AuditEvent) -> Self {
        Self {
            event_id: event.event_id,
            action: event.action.name,
            details: event.action.details,
            actor: event.actor.id,
            cause: event.cause.description,
            occurred_at: event.occurred_at.to_string(),
            before: event.before.data,
            after: event.after.data,
        }
    }
}

fn audit_trail(events: Vec<AuditEvent>) -> Result<Value, CliError> {
    let entries: Vec<AuditEntry> = events.into_iter().map(AuditEntry::from).collect();
    Ok(serde_json::to_value(entries)?)
}

fn preview_value(preview: &RosterPreview) -> Value {
    json!({
        "rows": preview.rows,
        "importable_teams": preview.teams.len(),
        "invalid_count": preview.invalid_count(),
    })
}

fn read_file(path: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Io {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn team_ids(ids: &[i64]) -> Vec<TeamId> {
    ids.iter().copied().map(TeamId::new).collect()
}

/// Runs one subcommand against the engine.
///
/// # Returns
///
/// The operation's result as JSON.
///
/// # Errors
///
/// Returns an error if the operation fails or its input file cannot be read.
#[allow(clippy::too_many_lines)]
pub fn execute(
    engine: &MatchingEngine,
    command: Command,
    actor: &Actor,
    cause: &Cause,
) -> Result<Value, CliError> {
    let value: Value = match command {
        Command::CreateJob {
            farmer,
            activity,
            acres,
            date,
            farmer_price,
            advance,
            workers,
            notes,
            confirm,
        } => {
            let request: JobRequest = JobRequest {
                farmer,
                activity: Activity::new(&activity),
                farm_size_acres: acres,
                requested_date: date,
                farmer_price_per_acre: farmer_price,
                advance_amount: advance,
                workers_needed: workers,
                notes,
            };
            serde_json::to_value(engine.create_job(request, confirm, actor, cause)?)?
        }
        Command::ConfirmJob { job_id } => {
            serde_json::to_value(engine.confirm_job(JobId::new(job_id), actor, cause)?)?
        }
        Command::SetPrice { job_id, price } => {
            serde_json::to_value(engine.set_price(JobId::new(job_id), price, actor, cause)?)?
        }
        Command::Notify { job_id, teams } => serde_json::to_value(engine.notify_teams(
            JobId::new(job_id),
            &team_ids(&teams),
            actor,
            cause,
        )?)?,
        Command::Respond {
            bid_id,
            decision,
            price,
            days,
            comment,
        } => {
            let request: BidResponseRequest = BidResponseRequest {
                bid_id: BidId::new(bid_id),
                decision,
                price,
                estimated_days: days,
                comment,
            };
            serde_json::to_value(engine.record_bid_response(request, actor, cause)?)?
        }
        Command::RankBids { job_id } => {
            serde_json::to_value(engine.rank_bids(JobId::new(job_id))?)?
        }
        Command::RankCandidates { job_id } => {
            serde_json::to_value(engine.rank_candidates(JobId::new(job_id))?)?
        }
        Command::Finalize { job_id, bid_id } => serde_json::to_value(engine.finalize(
            JobId::new(job_id),
            BidId::new(bid_id),
            actor,
            cause,
        )?)?,
        Command::Reassign {
            job_id,
            teams,
            reason,
        } => serde_json::to_value(engine.reassign(
            JobId::new(job_id),
            &team_ids(&teams),
            &reason,
            actor,
            cause,
        )?)?,
        Command::StartWork { job_id } => {
            serde_json::to_value(engine.start_work(JobId::new(job_id), actor, cause)?)?
        }
        Command::CompleteWork {
            job_id,
            area,
            labourers,
            hours,
            rating,
            summary,
        } => {
            let record: CompletionRecord = CompletionRecord {
                actual_area_acres: area,
                labourers_used: labourers,
                hours_worked: hours,
                quality_rating: rating,
                work_summary: summary,
            };
            serde_json::to_value(engine.complete_work(JobId::new(job_id), record, actor, cause)?)?
        }
        Command::Cancel { job_id, reason } => {
            serde_json::to_value(engine.cancel(JobId::new(job_id), &reason, actor, cause)?)?
        }
        Command::Balance { job_id } => {
            let job_id: JobId = JobId::new(job_id);
            json!({ "job_id": job_id, "balance_due": engine.balance_due(job_id)? })
        }
        Command::Pay {
            job_id,
            labor,
            transport,
            accommodation,
            other,
            method,
            proof,
            collected_by,
        } => {
            let payment: PaymentRequest = PaymentRequest {
                breakdown: CostBreakdown {
                    labor,
                    transport,
                    accommodation,
                    other,
                },
                method,
                proof_reference: proof,
                collected_by,
            };
            serde_json::to_value(engine.record_payment(JobId::new(job_id), payment, actor, cause)?)?
        }
        Command::OnboardTeam {
            leader,
            phone,
            location,
            crew,
            rates,
            from,
            until,
        } => {
            let mut rate_map: BTreeMap<Activity, Decimal> = BTreeMap::new();
            for (activity, rate) in rates {
                if rate_map.insert(activity.clone(), rate).is_some() {
                    return Err(CliError::InvalidArgument {
                        argument: "rate",
                        message: format!("'{activity}' is given more than once"),
                    });
                }
            }
            let registration: TeamRegistration = TeamRegistration {
                leader_name: leader,
                phone,
                location,
                crew_size: crew,
                rates: rate_map,
                available_from: from,
                available_until: until,
            };
            serde_json::to_value(engine.onboard_team(registration, actor, cause)?)?
        }
        Command::SetRate {
            team_id,
            activity,
            rate,
        } => serde_json::to_value(engine.set_team_rate(
            TeamId::new(team_id),
            Activity::new(&activity),
            rate,
            actor,
            cause,
        )?)?,
        Command::SetActive { team_id, active } => serde_json::to_value(
            engine.set_team_active(TeamId::new(team_id), active, actor, cause)?,
        )?,
        Command::AddInterval {
            team_id,
            from,
            until,
            status,
        } => {
            let range: DateRange =
                DateRange::new(from, until).map_err(|e| CliError::InvalidArgument {
                    argument: "until",
                    message: e.to_string(),
                })?;
            serde_json::to_value(engine.add_availability_interval(
                TeamId::new(team_id),
                range,
                status,
                actor,
                cause,
            )?)?
        }
        Command::DeleteInterval { interval_id } => serde_json::to_value(
            engine.delete_availability_interval(IntervalId::new(interval_id), actor, cause)?,
        )?,
        Command::Performance { team_id } => {
            serde_json::to_value(engine.team_performance(TeamId::new(team_id))?)?
        }
        Command::ShowJob { job_id } => serde_json::to_value(engine.get_job(JobId::new(job_id))?)?,
        Command::ListJobs { status } => serde_json::to_value(engine.list_jobs(status)?)?,
        Command::ShowTeam { team_id } => {
            serde_json::to_value(engine.get_team(TeamId::new(team_id))?)?
        }
        Command::ListTeams { active_only } => {
            serde_json::to_value(engine.list_teams(active_only)?)?
        }
        Command::JobAudit { job_id } => audit_trail(engine.job_audit_trail(JobId::new(job_id))?)?,
        Command::TeamAudit { team_id } => {
            audit_trail(engine.team_audit_trail(TeamId::new(team_id))?)?
        }
        Command::ImportRoster { path, preview } => {
            let content: String = read_file(&path)?;
            if preview {
                preview_value(&engine.preview_roster_csv(&content)?)
            } else {
                serde_json::to_value(engine.import_roster_csv(&content, actor, cause)?)?
            }
        }
    };
    Ok(value)
}
