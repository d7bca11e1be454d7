// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row types and column codecs.
//!
//! Money is stored as canonical decimal text, dates as `YYYY-MM-DD` and
//! timestamps as RFC 3339. Audit payloads are JSON.

use diesel::prelude::*;
use mukadam_bid_audit::{Action, Actor, AuditEvent, Cause, Scope, StateSnapshot};
use mukadam_bid_domain::{
    Activity, AvailabilityInterval, AvailabilityStatus, Bid, BidId, BidStatus, CompletionRecord,
    CostBreakdown, DateRange, IntervalId, Job, JobId, JobStatus, PaymentMethod, PaymentRecord,
    TeamId,
};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::diesel_schema::{
    audit_events, availability_intervals, bids, jobs, labor_teams, payment_records, team_rates,
};
use crate::error::PersistenceError;

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

impl From<&Actor> for ActorData {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id.clone(),
            actor_type: actor.actor_type.clone(),
        }
    }
}

impl From<&Cause> for CauseData {
    fn from(cause: &Cause) -> Self {
        Self {
            id: cause.id.clone(),
            description: cause.description.clone(),
        }
    }
}

impl From<&Action> for ActionData {
    fn from(action: &Action) -> Self {
        Self {
            name: action.name.clone(),
            details: action.details.clone(),
        }
    }
}

impl From<&StateSnapshot> for StateSnapshotData {
    fn from(snapshot: &StateSnapshot) -> Self {
        Self {
            data: snapshot.data.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column codecs
// ---------------------------------------------------------------------------

#[must_use]
pub fn decimal_text(value: Decimal) -> String {
    value.to_string()
}

#[must_use]
pub fn optional_decimal_text(value: Option<Decimal>) -> Option<String> {
    value.map(decimal_text)
}

/// Parses a stored decimal.
///
/// # Errors
///
/// Returns `PersistenceError::ReconstructionError` naming the column.
pub fn parse_decimal(column: &str, text: &str) -> Result<Decimal, PersistenceError> {
    Decimal::from_str(text).map_err(|e| {
        PersistenceError::ReconstructionError(format!("{column}: invalid decimal '{text}': {e}"))
    })
}

fn parse_optional_decimal(
    column: &str,
    text: Option<&str>,
) -> Result<Option<Decimal>, PersistenceError> {
    text.map(|t| parse_decimal(column, t)).transpose()
}

/// Formats a date for storage.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn date_text(date: Date) -> Result<String, PersistenceError> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

fn parse_date(column: &str, text: &str) -> Result<Date, PersistenceError> {
    Date::parse(text, format_description!("[year]-[month]-[day]")).map_err(|e| {
        PersistenceError::ReconstructionError(format!("{column}: invalid date '{text}': {e}"))
    })
}

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be formatted.
pub fn timestamp_text(at: OffsetDateTime) -> Result<String, PersistenceError> {
    at.format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Formats an optional timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be formatted.
pub fn optional_timestamp_text(
    at: Option<OffsetDateTime>,
) -> Result<Option<String>, PersistenceError> {
    at.map(timestamp_text).transpose()
}

fn parse_timestamp(column: &str, text: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(text, &Rfc3339).map_err(|e| {
        PersistenceError::ReconstructionError(format!("{column}: invalid timestamp '{text}': {e}"))
    })
}

fn parse_optional_timestamp(
    column: &str,
    text: Option<&str>,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    text.map(|t| parse_timestamp(column, t)).transpose()
}

/// Converts a count to its column type.
///
/// # Errors
///
/// Returns an error if the value does not fit in a 32-bit column.
pub fn count_column(column: &str, value: u32) -> Result<i32, PersistenceError> {
    value.to_i32().ok_or_else(|| {
        PersistenceError::SerializationError(format!("{column}: {value} out of range"))
    })
}

fn parse_count(column: &str, value: i32) -> Result<u32, PersistenceError> {
    value.to_u32().ok_or_else(|| {
        PersistenceError::ReconstructionError(format!("{column}: {value} out of range"))
    })
}

fn domain_value<T, E: std::fmt::Display>(
    column: &str,
    parsed: Result<T, E>,
) -> Result<T, PersistenceError> {
    parsed.map_err(|e| PersistenceError::ReconstructionError(format!("{column}: {e}")))
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JobRow {
    pub job_id: i64,
    pub farmer: String,
    pub activity: String,
    pub farm_size_acres: Option<String>,
    pub requested_date: Option<String>,
    pub farmer_price_per_acre: Option<String>,
    pub your_price_per_acre: Option<String>,
    pub finalized_price_per_acre: Option<String>,
    pub advance_amount: String,
    pub workers_needed: i32,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub cancellation_reason: Option<String>,
    pub completion_json: Option<String>,
}

impl JobRow {
    /// Rebuilds the domain job.
    ///
    /// # Errors
    ///
    /// Returns an error if any column holds a value the domain rejects.
    pub fn into_job(self) -> Result<Job, PersistenceError> {
        let completion: Option<CompletionRecord> = self
            .completion_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(Job {
            job_id: JobId::new(self.job_id),
            farmer: self.farmer,
            activity: Activity::new(&self.activity),
            farm_size_acres: parse_optional_decimal(
                "farm_size_acres",
                self.farm_size_acres.as_deref(),
            )?,
            requested_date: self
                .requested_date
                .as_deref()
                .map(|text| parse_date("requested_date", text))
                .transpose()?,
            farmer_price_per_acre: parse_optional_decimal(
                "farmer_price_per_acre",
                self.farmer_price_per_acre.as_deref(),
            )?,
            your_price_per_acre: parse_optional_decimal(
                "your_price_per_acre",
                self.your_price_per_acre.as_deref(),
            )?,
            finalized_price_per_acre: parse_optional_decimal(
                "finalized_price_per_acre",
                self.finalized_price_per_acre.as_deref(),
            )?,
            advance_amount: parse_decimal("advance_amount", &self.advance_amount)?,
            workers_needed: parse_count("workers_needed", self.workers_needed)?,
            status: domain_value("status", JobStatus::from_str(&self.status))?,
            notes: self.notes,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            started_at: parse_optional_timestamp("started_at", self.started_at.as_deref())?,
            completed_at: parse_optional_timestamp("completed_at", self.completed_at.as_deref())?,
            cancellation_reason: self.cancellation_reason,
            completion,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = bids)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BidRow {
    pub bid_id: i64,
    pub job_id: i64,
    pub team_id: i64,
    pub status: String,
    pub bid_price_per_acre: Option<String>,
    pub estimated_days: Option<i32>,
    pub comment: Option<String>,
    pub notified_at: String,
    pub responded_at: Option<String>,
}

impl BidRow {
    /// Rebuilds the domain bid.
    ///
    /// # Errors
    ///
    /// Returns an error if any column holds a value the domain rejects.
    pub fn into_bid(self) -> Result<Bid, PersistenceError> {
        Ok(Bid {
            bid_id: Some(BidId::new(self.bid_id)),
            job_id: JobId::new(self.job_id),
            team_id: TeamId::new(self.team_id),
            status: domain_value("status", BidStatus::from_str(&self.status))?,
            bid_price_per_acre: parse_optional_decimal(
                "bid_price_per_acre",
                self.bid_price_per_acre.as_deref(),
            )?,
            estimated_days: self
                .estimated_days
                .map(|days| parse_count("estimated_days", days))
                .transpose()?,
            comment: self.comment,
            notified_at: parse_timestamp("notified_at", &self.notified_at)?,
            responded_at: parse_optional_timestamp("responded_at", self.responded_at.as_deref())?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = labor_teams)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TeamRow {
    pub team_id: i64,
    pub leader_name: String,
    pub phone: String,
    pub location: Option<String>,
    pub crew_size: i32,
    pub is_active: bool,
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = team_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RateRow {
    pub team_id: i64,
    pub activity: String,
    pub rate_per_acre: String,
}

impl RateRow {
    /// Parses the rate entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored rate is not a decimal.
    pub fn into_entry(self) -> Result<(Activity, Decimal), PersistenceError> {
        Ok((
            Activity::new(&self.activity),
            parse_decimal("rate_per_acre", &self.rate_per_acre)?,
        ))
    }
}

impl TeamRow {
    /// Crew size as the domain counts it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored crew size is negative.
    pub fn crew(&self) -> Result<u32, PersistenceError> {
        parse_count("crew_size", self.crew_size)
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = availability_intervals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IntervalRow {
    pub interval_id: i64,
    pub team_id: i64,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub leader_name: Option<String>,
    pub leader_phone: Option<String>,
}

impl IntervalRow {
    /// Rebuilds the domain interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the dates or status are invalid.
    pub fn into_interval(self) -> Result<AvailabilityInterval, PersistenceError> {
        let start: Date = parse_date("start_date", &self.start_date)?;
        let end: Date = parse_date("end_date", &self.end_date)?;
        Ok(AvailabilityInterval {
            interval_id: Some(IntervalId::new(self.interval_id)),
            team_id: TeamId::new(self.team_id),
            range: domain_value("range", DateRange::new(start, end))?,
            status: domain_value("status", AvailabilityStatus::from_str(&self.status))?,
            leader_name: self.leader_name,
            leader_phone: self.leader_phone,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = payment_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PaymentRow {
    pub job_id: i64,
    pub labor: String,
    pub transport: String,
    pub accommodation: String,
    pub other: String,
    pub method: String,
    pub proof_reference: Option<String>,
    pub collected_by: String,
    pub recorded_at: String,
}

impl PaymentRow {
    /// Rebuilds the domain payment.
    ///
    /// # Errors
    ///
    /// Returns an error if any amount, the method or the timestamp is invalid.
    pub fn into_payment(self) -> Result<PaymentRecord, PersistenceError> {
        Ok(PaymentRecord {
            job_id: JobId::new(self.job_id),
            breakdown: CostBreakdown {
                labor: parse_decimal("labor", &self.labor)?,
                transport: parse_decimal("transport", &self.transport)?,
                accommodation: parse_decimal("accommodation", &self.accommodation)?,
                other: parse_decimal("other", &self.other)?,
            },
            method: domain_value("method", PaymentMethod::from_str(&self.method))?,
            proof_reference: self.proof_reference,
            collected_by: self.collected_by,
            recorded_at: parse_timestamp("recorded_at", &self.recorded_at)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = audit_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditEventRow {
    pub event_id: i64,
    pub job_id: Option<i64>,
    pub team_id: Option<i64>,
    pub actor_json: String,
    pub cause_json: String,
    pub action_json: String,
    pub before_snapshot_json: String,
    pub after_snapshot_json: String,
    pub occurred_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = audit_events)]
pub struct NewAuditEventRow {
    pub job_id: Option<i64>,
    pub team_id: Option<i64>,
    pub action_name: String,
    pub actor_json: String,
    pub cause_json: String,
    pub action_json: String,
    pub before_snapshot_json: String,
    pub after_snapshot_json: String,
    pub occurred_at: String,
}

impl NewAuditEventRow {
    /// Encodes an audit event for insertion.
    ///
    /// # Errors
    ///
    /// Returns an error if a payload cannot be serialized.
    pub fn from_event(event: &AuditEvent) -> Result<Self, PersistenceError> {
        Ok(Self {
            job_id: event.scope.job_id().map(|id| id.value()),
            team_id: event.scope.team_id().map(|id| id.value()),
            action_name: event.action.name.clone(),
            actor_json: serde_json::to_string(&ActorData::from(&event.actor))?,
            cause_json: serde_json::to_string(&CauseData::from(&event.cause))?,
            action_json: serde_json::to_string(&ActionData::from(&event.action))?,
            before_snapshot_json: serde_json::to_string(&StateSnapshotData::from(&event.before))?,
            after_snapshot_json: serde_json::to_string(&StateSnapshotData::from(&event.after))?,
            occurred_at: timestamp_text(event.occurred_at)?,
        })
    }
}

impl AuditEventRow {
    /// Rebuilds the audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON payload cannot be decoded or the row has
    /// no scope.
    pub fn into_event(self) -> Result<AuditEvent, PersistenceError> {
        let actor_data: ActorData = serde_json::from_str(&self.actor_json)?;
        let cause_data: CauseData = serde_json::from_str(&self.cause_json)?;
        let action_data: ActionData = serde_json::from_str(&self.action_json)?;
        let before_data: StateSnapshotData = serde_json::from_str(&self.before_snapshot_json)?;
        let after_data: StateSnapshotData = serde_json::from_str(&self.after_snapshot_json)?;

        let scope: Scope = match (self.job_id, self.team_id) {
            (Some(job_id), None) => Scope::Job(JobId::new(job_id)),
            (None, Some(team_id)) => Scope::Team(TeamId::new(team_id)),
            _ => {
                return Err(PersistenceError::ReconstructionError(format!(
                    "audit event {} must belong to exactly one job or team",
                    self.event_id
                )));
            }
        };

        Ok(AuditEvent::new(
            Actor::new(actor_data.id, actor_data.actor_type),
            Cause::new(cause_data.id, cause_data.description),
            Action::new(action_data.name, action_data.details),
            StateSnapshot::new(before_data.data),
            StateSnapshot::new(after_data.data),
            scope,
            parse_timestamp("occurred_at", &self.occurred_at)?,
        )
        .with_event_id(self.event_id))
    }
}
