// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::SqliteConnection;
use diesel::prelude::*;
use mukadam_bid::{TeamOnboarding, TeamState, TeamTransitionResult, TeamWrite};
use mukadam_bid_domain::{Activity, AvailabilityInterval, AvailabilityStatus, DateRange, TeamId};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::backend::sqlite::get_last_insert_rowid;
use crate::data_models::{count_column, date_text, decimal_text, timestamp_text};
use crate::diesel_schema::{availability_intervals, labor_teams, team_rates};
use crate::error::PersistenceError;
use crate::mutations::audit::persist_audit_event;
use crate::queries::teams::load_team_state;

fn upsert_rate(
    conn: &mut SqliteConnection,
    team_id: TeamId,
    activity: &Activity,
    rate: Decimal,
) -> Result<(), PersistenceError> {
    diesel::insert_into(team_rates::table)
        .values((
            team_rates::team_id.eq(team_id.value()),
            team_rates::activity.eq(activity.name()),
            team_rates::rate_per_acre.eq(decimal_text(rate)),
        ))
        .on_conflict((team_rates::team_id, team_rates::activity))
        .do_update()
        .set(team_rates::rate_per_acre.eq(decimal_text(rate)))
        .execute(conn)?;
    debug!(team_id = %team_id, activity = %activity, rate = %rate, "Stored rate");
    Ok(())
}

fn insert_interval(
    conn: &mut SqliteConnection,
    interval: &AvailabilityInterval,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(availability_intervals::table)
        .values((
            availability_intervals::team_id.eq(interval.team_id.value()),
            availability_intervals::start_date.eq(date_text(interval.range.start())?),
            availability_intervals::end_date.eq(date_text(interval.range.end())?),
            availability_intervals::status.eq(interval.status.as_str()),
            availability_intervals::leader_name.eq(interval.leader_name.as_deref()),
            availability_intervals::leader_phone.eq(interval.leader_phone.as_deref()),
        ))
        .execute(conn)?;
    let interval_id: i64 = get_last_insert_rowid(conn)?;
    debug!(
        interval_id,
        team_id = %interval.team_id,
        range = %interval.range,
        status = %interval.status,
        "Inserted interval"
    );
    Ok(interval_id)
}

/// Number of stored intervals of a team that share a day with `range`.
fn count_overlapping(
    conn: &mut SqliteConnection,
    team_id: TeamId,
    range: &DateRange,
) -> Result<i64, PersistenceError> {
    Ok(availability_intervals::table
        .filter(availability_intervals::team_id.eq(team_id.value()))
        .filter(availability_intervals::start_date.le(date_text(range.end())?))
        .filter(availability_intervals::end_date.ge(date_text(range.start())?))
        .count()
        .get_result(conn)?)
}

fn require_interval_id(interval: &AvailabilityInterval) -> Result<i64, PersistenceError> {
    interval.interval_id.map(|id| id.value()).ok_or_else(|| {
        PersistenceError::Inconsistent(String::from("interval change without interval id"))
    })
}

/// Onboards a team with its rates and default availability interval.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `onboarding` - The validated registration
///
/// # Returns
///
/// The stored team with its calendar, and the ID of its audit event.
///
/// # Errors
///
/// Returns an error if any insert fails. Nothing is written on failure.
pub fn persist_onboarding(
    conn: &mut SqliteConnection,
    onboarding: &TeamOnboarding,
) -> Result<(TeamState, i64), PersistenceError> {
    conn.immediate_transaction(|conn| {
        let registration = &onboarding.registration;
        diesel::insert_into(labor_teams::table)
            .values((
                labor_teams::leader_name.eq(registration.leader_name.trim()),
                labor_teams::phone.eq(registration.phone.trim()),
                labor_teams::location.eq(registration.location.as_deref()),
                labor_teams::crew_size.eq(count_column("crew_size", registration.crew_size)?),
                labor_teams::is_active.eq(true),
                labor_teams::created_at.eq(timestamp_text(onboarding.occurred_at)?),
            ))
            .execute(conn)?;
        let team_id: TeamId = TeamId::new(get_last_insert_rowid(conn)?);

        for (activity, rate) in &registration.rates {
            upsert_rate(conn, team_id, activity, *rate)?;
        }
        insert_interval(
            conn,
            &AvailabilityInterval::new(
                team_id,
                onboarding.default_range,
                AvailabilityStatus::Available,
            ),
        )?;

        let state: TeamState = load_team_state(conn, team_id)?;
        let event_id: i64 = persist_audit_event(conn, &onboarding.audit_event(&state))?;
        info!(team_id = %team_id, event_id, "Onboarded team");
        Ok((state, event_id))
    })
}

fn write_team_change(
    conn: &mut SqliteConnection,
    team_id: TeamId,
    write: &TeamWrite,
) -> Result<(), PersistenceError> {
    match write {
        TeamWrite::UpsertRate { activity, rate } => upsert_rate(conn, team_id, activity, *rate),
        TeamWrite::SetActive(active) => {
            let updated: usize = diesel::update(
                labor_teams::table.filter(labor_teams::team_id.eq(team_id.value())),
            )
            .set(labor_teams::is_active.eq(*active))
            .execute(conn)?;
            if updated == 0 {
                return Err(PersistenceError::NotFound(format!("team {team_id}")));
            }
            Ok(())
        }
        TeamWrite::InsertInterval(interval) => {
            if count_overlapping(conn, team_id, &interval.range)? > 0 {
                return Err(PersistenceError::Conflict(format!(
                    "team {team_id} calendar changed: {} now overlaps a stored interval",
                    interval.range
                )));
            }
            insert_interval(conn, interval)?;
            Ok(())
        }
        TeamWrite::ReplaceInterval {
            original,
            replacements,
        } => {
            let original_id: i64 = require_interval_id(original)?;
            let start: String = date_text(original.range.start())?;
            let end: String = date_text(original.range.end())?;
            let removed: usize = diesel::delete(
                availability_intervals::table
                    .filter(availability_intervals::interval_id.eq(original_id))
                    .filter(availability_intervals::team_id.eq(team_id.value()))
                    .filter(availability_intervals::start_date.eq(start))
                    .filter(availability_intervals::end_date.eq(end))
                    .filter(availability_intervals::status.eq(original.status.as_str())),
            )
            .execute(conn)?;
            if removed == 0 {
                return Err(PersistenceError::Conflict(format!(
                    "interval {original_id} changed since it was read"
                )));
            }
            for replacement in replacements {
                insert_interval(conn, replacement)?;
            }
            Ok(())
        }
        TeamWrite::DeleteInterval(interval) => {
            let interval_id: i64 = require_interval_id(interval)?;
            let removed: usize = diesel::delete(
                availability_intervals::table
                    .filter(availability_intervals::interval_id.eq(interval_id))
                    .filter(availability_intervals::team_id.eq(team_id.value())),
            )
            .execute(conn)?;
            if removed == 0 {
                return Err(PersistenceError::Conflict(format!(
                    "interval {interval_id} was already removed"
                )));
            }
            Ok(())
        }
    }
}

/// Persists a team transition and its audit event.
///
/// # Arguments
///
/// * `conn` - The active database connection
/// * `result` - The team transition result to persist
///
/// # Returns
///
/// The event ID assigned to the persisted audit event.
///
/// # Errors
///
/// Returns `PersistenceError::Conflict` if the calendar changed since it was
/// read. Nothing is written on failure.
pub fn persist_team_transition(
    conn: &mut SqliteConnection,
    result: &TeamTransitionResult,
) -> Result<i64, PersistenceError> {
    let team_id: TeamId = result.new_state.team.team_id;
    conn.immediate_transaction(|conn| {
        write_team_change(conn, team_id, &result.write)?;
        let event_id: i64 = persist_audit_event(conn, &result.audit_event)?;
        info!(
            team_id = %team_id,
            event_id,
            action = %result.audit_event.action.name,
            "Persisted team transition"
        );
        Ok(event_id)
    })
}
