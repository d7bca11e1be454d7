// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audit event queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use mukadam_bid_audit::AuditEvent;
use mukadam_bid_domain::{JobId, TeamId};

use crate::data_models::AuditEventRow;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Retrieves an audit event by ID.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `event_id` - The event ID to retrieve
///
/// # Errors
///
/// Returns an error if the event is not found or cannot be deserialized.
pub fn get_audit_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<AuditEvent, PersistenceError> {
    let row: AuditEventRow = audit_events::table
        .filter(audit_events::event_id.eq(event_id))
        .select(AuditEventRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(PersistenceError::EventNotFound(event_id))?;

    row.into_event()
}

/// Retrieves every audit event for a job, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or an event cannot be deserialized.
pub fn get_job_audit_trail(
    conn: &mut SqliteConnection,
    job_id: JobId,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::job_id.eq(job_id.value()))
        .order(audit_events::event_id.asc())
        .select(AuditEventRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AuditEventRow::into_event).collect()
}

/// Retrieves every audit event for a team, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or an event cannot be deserialized.
pub fn get_team_audit_trail(
    conn: &mut SqliteConnection,
    team_id: TeamId,
) -> Result<Vec<AuditEvent>, PersistenceError> {
    let rows: Vec<AuditEventRow> = audit_events::table
        .filter(audit_events::team_id.eq(team_id.value()))
        .order(audit_events::event_id.asc())
        .select(AuditEventRow::as_select())
        .load(conn)?;

    rows.into_iter().map(AuditEventRow::into_event).collect()
}
