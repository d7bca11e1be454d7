// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use mukadam_bid_audit::AuditEvent;
use tracing::debug;

use crate::data_models::NewAuditEventRow;
use crate::diesel_schema::audit_events;
use crate::error::PersistenceError;

/// Writes an audit event and returns its event ID.
///
/// Callers run this inside the transaction that writes the change the
/// event records, so the event and the change commit or roll back together.
///
/// # Errors
///
/// Returns an error if a payload cannot be serialized or the insert fails.
/// A row scoped to neither or both of a job and a team is refused by the
/// schema.
pub fn persist_audit_event(
    conn: &mut SqliteConnection,
    event: &AuditEvent,
) -> Result<i64, PersistenceError> {
    let row: NewAuditEventRow = NewAuditEventRow::from_event(event)?;

    let event_id: i64 = diesel::insert_into(audit_events::table)
        .values(&row)
        .returning(audit_events::event_id)
        .get_result(conn)?;

    debug!(
        event_id,
        job_id = ?row.job_id,
        team_id = ?row.team_id,
        action = %row.action_name,
        "Persisted audit event"
    );
    Ok(event_id)
}
