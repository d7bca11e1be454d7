// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Job, bid and payment queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use mukadam_bid::JobState;
use mukadam_bid_domain::{
    Activity, Bid, BidHistoryEntry, BidId, BidStatus, Job, JobId, JobStatus, PaymentRecord, TeamId,
};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::data_models::{BidRow, JobRow, PaymentRow, parse_decimal};
use crate::diesel_schema::{bids, jobs, payment_records};
use crate::error::PersistenceError;

/// Retrieves a job by ID.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if no such job exists.
pub fn get_job(conn: &mut SqliteConnection, job_id: JobId) -> Result<Job, PersistenceError> {
    let row: JobRow = jobs::table
        .filter(jobs::job_id.eq(job_id.value()))
        .select(JobRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("job {job_id}")))?;

    row.into_job()
}

/// Lists jobs, newest first, optionally restricted to one status.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_jobs(
    conn: &mut SqliteConnection,
    status: Option<JobStatus>,
) -> Result<Vec<Job>, PersistenceError> {
    let mut query = jobs::table
        .select(JobRow::as_select())
        .order(jobs::job_id.desc())
        .into_boxed();
    if let Some(status) = status {
        query = query.filter(jobs::status.eq(status.as_str()));
    }
    let rows: Vec<JobRow> = query.load(conn)?;

    rows.into_iter().map(JobRow::into_job).collect()
}

/// Lists every bid on a job, in creation order.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_bids(conn: &mut SqliteConnection, job_id: JobId) -> Result<Vec<Bid>, PersistenceError> {
    let rows: Vec<BidRow> = bids::table
        .filter(bids::job_id.eq(job_id.value()))
        .order(bids::bid_id.asc())
        .select(BidRow::as_select())
        .load(conn)?;

    rows.into_iter().map(BidRow::into_bid).collect()
}

/// Retrieves a bid by ID.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if no such bid exists.
pub fn get_bid(conn: &mut SqliteConnection, bid_id: BidId) -> Result<Bid, PersistenceError> {
    bids::table
        .filter(bids::bid_id.eq(bid_id.value()))
        .select(BidRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("bid {bid_id}")))?
        .into_bid()
}

/// Retrieves the payment recorded for a job, if any.
///
/// # Errors
///
/// Returns an error if the query fails or the row cannot be reconstructed.
pub fn get_payment(
    conn: &mut SqliteConnection,
    job_id: JobId,
) -> Result<Option<PaymentRecord>, PersistenceError> {
    payment_records::table
        .filter(payment_records::job_id.eq(job_id.value()))
        .select(PaymentRow::as_select())
        .first(conn)
        .optional()?
        .map(PaymentRow::into_payment)
        .transpose()
}

/// Loads everything a job transition reads.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the job does not exist, or any
/// query error.
pub fn load_job_state(
    conn: &mut SqliteConnection,
    job_id: JobId,
) -> Result<JobState, PersistenceError> {
    let job: Job = get_job(conn, job_id)?;
    let bids: Vec<Bid> = list_bids(conn, job_id)?;
    let payment: Option<PaymentRecord> = get_payment(conn, job_id)?;
    Ok(JobState::new(job, bids, payment))
}

/// Most recent quoted prices for an activity, newest response first.
///
/// Only interested and assigned bids carry a price.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `activity` - The activity to look up
/// * `limit` - How many prices to return at most
///
/// # Errors
///
/// Returns an error if the query fails or a stored price is malformed.
pub fn recent_bid_prices(
    conn: &mut SqliteConnection,
    activity: &Activity,
    limit: i64,
) -> Result<Vec<Decimal>, PersistenceError> {
    let prices: Vec<Option<String>> = bids::table
        .inner_join(jobs::table)
        .filter(jobs::activity.eq(activity.name()))
        .filter(bids::status.eq_any([BidStatus::Interested.as_str(), BidStatus::Assigned.as_str()]))
        .filter(bids::bid_price_per_acre.is_not_null())
        .order((bids::responded_at.desc(), bids::bid_id.desc()))
        .limit(limit)
        .select(bids::bid_price_per_acre)
        .load(conn)?;

    prices
        .into_iter()
        .flatten()
        .map(|text| parse_decimal("bid_price_per_acre", &text))
        .collect()
}

/// A team's full bid history joined with the status of each job.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn get_bid_history(
    conn: &mut SqliteConnection,
    team_id: TeamId,
) -> Result<Vec<BidHistoryEntry>, PersistenceError> {
    let rows: Vec<(String, Option<String>, String)> = bids::table
        .inner_join(jobs::table)
        .filter(bids::team_id.eq(team_id.value()))
        .order(bids::bid_id.asc())
        .select((bids::status, bids::bid_price_per_acre, jobs::status))
        .load(conn)?;

    rows.into_iter()
        .map(|(bid_status, price, job_status)| {
            Ok(BidHistoryEntry {
                bid_status: BidStatus::from_str(&bid_status)
                    .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?,
                bid_price_per_acre: price
                    .as_deref()
                    .map(|text| parse_decimal("bid_price_per_acre", text))
                    .transpose()?,
                job_status: JobStatus::from_str(&job_status)
                    .map_err(|e| PersistenceError::ReconstructionError(e.to_string()))?,
            })
        })
        .collect()
}
