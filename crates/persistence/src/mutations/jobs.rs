// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use mukadam_bid::{BidWrite, JobCreation, TransitionResult};
use mukadam_bid_audit::AuditEvent;
use mukadam_bid_domain::{Bid, BidStatus, Job, JobId, PaymentRecord};
use tracing::{debug, info};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{
    count_column, date_text, decimal_text, optional_decimal_text, optional_timestamp_text,
    timestamp_text,
};
use crate::diesel_schema::{bids, jobs, payment_records};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;

/// Records a new job and its creation event.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `creation` - The validated request
///
/// # Returns
///
/// The stored job and the ID of its audit event.
///
/// # Errors
///
/// Returns an error if any insert fails. Nothing is written on failure.
pub fn persist_creation(
    conn: &mut SqliteConnection,
    creation: &JobCreation,
) -> Result<(Job, i64), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let request = &creation.request;
        diesel::insert_into(jobs::table)
            .values((
                jobs::farmer.eq(&request.farmer),
                jobs::activity.eq(request.activity.name()),
                jobs::farm_size_acres.eq(optional_decimal_text(request.farm_size_acres)),
                jobs::requested_date.eq(request.requested_date.map(date_text).transpose()?),
                jobs::farmer_price_per_acre
                    .eq(optional_decimal_text(request.farmer_price_per_acre)),
                jobs::advance_amount.eq(decimal_text(request.advance_amount)),
                jobs::workers_needed.eq(count_column("workers_needed", request.workers_needed)?),
                jobs::status.eq(creation.initial_status.as_str()),
                jobs::notes.eq(request.notes.as_deref()),
                jobs::created_at.eq(timestamp_text(creation.occurred_at)?),
            ))
            .execute(conn)?;
        let job_id: JobId = JobId::new(get_last_insert_rowid(conn)?);

        let mut job: Job = Job::from_request(job_id, request.clone(), creation.occurred_at);
        job.status = creation.initial_status;

        let event_id: i64 = persist_audit_event(conn, &creation.audit_event(&job))?;
        info!(job_id = %job_id, event_id, status = %job.status, "Recorded job");
        Ok((job, event_id))
    })
}

fn update_job(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
) -> Result<(), PersistenceError> {
    let job: &Job = &result.new_state.job;
    let completion_json: Option<String> = job
        .completion
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let updated: usize = diesel::update(
        jobs::table
            .filter(jobs::job_id.eq(job.job_id.value()))
            .filter(jobs::status.eq(result.expected_status.as_str())),
    )
    .set((
        jobs::status.eq(job.status.as_str()),
        jobs::your_price_per_acre.eq(optional_decimal_text(job.your_price_per_acre)),
        jobs::finalized_price_per_acre.eq(optional_decimal_text(job.finalized_price_per_acre)),
        jobs::started_at.eq(optional_timestamp_text(job.started_at)?),
        jobs::completed_at.eq(optional_timestamp_text(job.completed_at)?),
        jobs::cancellation_reason.eq(job.cancellation_reason.as_deref()),
        jobs::completion_json.eq(completion_json),
    ))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::Conflict(format!(
            "job {} is no longer {}",
            job.job_id, result.expected_status
        )));
    }
    Ok(())
}

fn insert_bid(conn: &mut SqliteConnection, bid: &Bid) -> Result<i64, PersistenceError> {
    diesel::insert_into(bids::table)
        .values((
            bids::job_id.eq(bid.job_id.value()),
            bids::team_id.eq(bid.team_id.value()),
            bids::status.eq(bid.status.as_str()),
            bids::bid_price_per_acre.eq(optional_decimal_text(bid.bid_price_per_acre)),
            bids::estimated_days.eq(bid
                .estimated_days
                .map(|days| count_column("estimated_days", days))
                .transpose()?),
            bids::comment.eq(bid.comment.as_deref()),
            bids::notified_at.eq(timestamp_text(bid.notified_at)?),
            bids::responded_at.eq(optional_timestamp_text(bid.responded_at)?),
        ))
        .execute(conn)?;
    let bid_id: i64 = get_last_insert_rowid(conn)?;
    debug!(bid_id, job_id = %bid.job_id, team_id = %bid.team_id, "Inserted pending bid");
    Ok(bid_id)
}

fn update_bid(
    conn: &mut SqliteConnection,
    bid: &Bid,
    expected: BidStatus,
) -> Result<(), PersistenceError> {
    let bid_id: i64 = bid
        .bid_id
        .ok_or_else(|| PersistenceError::Inconsistent(String::from("bid update without bid id")))?
        .value();

    let updated: usize = diesel::update(
        bids::table
            .filter(bids::bid_id.eq(bid_id))
            .filter(bids::job_id.eq(bid.job_id.value()))
            .filter(bids::status.eq(expected.as_str())),
    )
    .set((
        bids::status.eq(bid.status.as_str()),
        bids::bid_price_per_acre.eq(optional_decimal_text(bid.bid_price_per_acre)),
        bids::estimated_days.eq(bid
            .estimated_days
            .map(|days| count_column("estimated_days", days))
            .transpose()?),
        bids::comment.eq(bid.comment.as_deref()),
        bids::responded_at.eq(optional_timestamp_text(bid.responded_at)?),
    ))
    .execute(conn)?;

    if updated == 0 {
        return Err(PersistenceError::Conflict(format!(
            "bid {bid_id} is no longer {expected}"
        )));
    }
    debug!(bid_id, status = %bid.status, "Updated bid");
    Ok(())
}

fn insert_payment(
    conn: &mut SqliteConnection,
    payment: &PaymentRecord,
) -> Result<(), PersistenceError> {
    diesel::insert_into(payment_records::table)
        .values((
            payment_records::job_id.eq(payment.job_id.value()),
            payment_records::labor.eq(decimal_text(payment.breakdown.labor)),
            payment_records::transport.eq(decimal_text(payment.breakdown.transport)),
            payment_records::accommodation.eq(decimal_text(payment.breakdown.accommodation)),
            payment_records::other.eq(decimal_text(payment.breakdown.other)),
            payment_records::method.eq(payment.method.as_str()),
            payment_records::proof_reference.eq(payment.proof_reference.as_deref()),
            payment_records::collected_by.eq(&payment.collected_by),
            payment_records::recorded_at.eq(timestamp_text(payment.recorded_at)?),
        ))
        .execute(conn)?;
    debug!(job_id = %payment.job_id, "Inserted payment record");
    Ok(())
}

/// Persists a job transition.
///
/// Within one immediate transaction:
/// 1. Updates the job row if it still holds the status the transition was
///    computed from
/// 2. Inserts new bids and updates changed bids if they still hold the
///    status that was read
/// 3. Inserts the payment, if any
/// 4. Persists the audit event
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `result` - The transition result to persist
///
/// # Returns
///
/// The event ID assigned to the persisted audit event.
///
/// # Errors
///
/// Returns `PersistenceError::Conflict` if a conditional update matched no
/// row or a uniqueness constraint fired (a second assigned bid, a duplicate
/// bid or a second payment). Nothing is written on failure.
pub fn persist_transition(
    conn: &mut SqliteConnection,
    result: &TransitionResult,
) -> Result<i64, PersistenceError> {
    conn.immediate_transaction(|conn| {
        update_job(conn, result)?;

        for write in &result.bid_writes {
            match write {
                BidWrite::Insert(bid) => {
                    insert_bid(conn, bid)?;
                }
                BidWrite::Update { bid, expected } => update_bid(conn, bid, *expected)?,
            }
        }

        if let Some(payment) = &result.payment {
            insert_payment(conn, payment)?;
        }

        let audit_event: &AuditEvent = &result.audit_event;
        let event_id: i64 = persist_audit_event(conn, audit_event)?;

        info!(
            event_id,
            job_id = %result.new_state.job.job_id,
            action = %audit_event.action.name,
            status = %result.new_state.job.status,
            bid_writes = result.bid_writes.len(),
            "Persisted transition"
        );
        Ok(event_id)
    })
}
