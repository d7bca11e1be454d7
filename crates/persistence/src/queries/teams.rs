// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Labor team, rate and availability queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use mukadam_bid::TeamState;
use mukadam_bid_domain::{Activity, AvailabilityInterval, IntervalId, LaborTeam, TeamId};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::data_models::{IntervalRow, RateRow, TeamRow};
use crate::diesel_schema::{availability_intervals, labor_teams, team_rates};
use crate::error::PersistenceError;

fn load_rates(
    conn: &mut SqliteConnection,
    team_id: i64,
) -> Result<BTreeMap<Activity, Decimal>, PersistenceError> {
    let rows: Vec<RateRow> = team_rates::table
        .filter(team_rates::team_id.eq(team_id))
        .select(RateRow::as_select())
        .load(conn)?;

    rows.into_iter().map(RateRow::into_entry).collect()
}

fn assemble(conn: &mut SqliteConnection, row: TeamRow) -> Result<LaborTeam, PersistenceError> {
    let crew_size: u32 = row.crew()?;
    let rates: BTreeMap<Activity, Decimal> = load_rates(conn, row.team_id)?;
    Ok(LaborTeam {
        team_id: TeamId::new(row.team_id),
        leader_name: row.leader_name,
        phone: row.phone,
        location: row.location,
        crew_size,
        is_active: row.is_active,
        rates,
    })
}

/// Retrieves a team with its rates.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if no such team exists.
pub fn get_team(
    conn: &mut SqliteConnection,
    team_id: TeamId,
) -> Result<LaborTeam, PersistenceError> {
    let row: TeamRow = labor_teams::table
        .filter(labor_teams::team_id.eq(team_id.value()))
        .select(TeamRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("team {team_id}")))?;

    assemble(conn, row)
}

/// Lists teams in id order.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `active_only` - Skip deactivated teams
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_teams(
    conn: &mut SqliteConnection,
    active_only: bool,
) -> Result<Vec<LaborTeam>, PersistenceError> {
    let mut query = labor_teams::table
        .select(TeamRow::as_select())
        .order(labor_teams::team_id.asc())
        .into_boxed();
    if active_only {
        query = query.filter(labor_teams::is_active.eq(true));
    }
    let rows: Vec<TeamRow> = query.load(conn)?;

    rows.into_iter().map(|row| assemble(conn, row)).collect()
}

/// Lists a team's intervals ordered by start date.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be reconstructed.
pub fn list_intervals(
    conn: &mut SqliteConnection,
    team_id: TeamId,
) -> Result<Vec<AvailabilityInterval>, PersistenceError> {
    let rows: Vec<IntervalRow> = availability_intervals::table
        .filter(availability_intervals::team_id.eq(team_id.value()))
        .order((
            availability_intervals::start_date.asc(),
            availability_intervals::interval_id.asc(),
        ))
        .select(IntervalRow::as_select())
        .load(conn)?;

    rows.into_iter().map(IntervalRow::into_interval).collect()
}

/// Retrieves one availability interval.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if no such interval exists.
pub fn get_interval(
    conn: &mut SqliteConnection,
    interval_id: IntervalId,
) -> Result<AvailabilityInterval, PersistenceError> {
    availability_intervals::table
        .filter(availability_intervals::interval_id.eq(interval_id.value()))
        .select(IntervalRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("interval {interval_id}")))?
        .into_interval()
}

/// Loads a team with its calendar.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the team does not exist, or any
/// query error.
pub fn load_team_state(
    conn: &mut SqliteConnection,
    team_id: TeamId,
) -> Result<TeamState, PersistenceError> {
    let team: LaborTeam = get_team(conn, team_id)?;
    let intervals: Vec<AvailabilityInterval> = list_intervals(conn, team_id)?;
    Ok(TeamState::new(team, intervals))
}
