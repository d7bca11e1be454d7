// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::{create_test_actor, create_test_cause, now, seed_team};
use crate::{Persistence, PersistenceError};
use mukadam_bid::{TeamCommand, TeamState, TeamTransitionResult, apply_team};
use mukadam_bid_domain::{
    Activity, AvailabilityInterval, AvailabilityStatus, DateRange, LaborTeam, TeamId,
};
use rust_decimal::Decimal;
use time::Date;
use time::macros::date;

fn range(start: Date, end: Date) -> DateRange {
    DateRange::new(start, end).unwrap()
}

fn compute(state: &TeamState, command: TeamCommand) -> TeamTransitionResult {
    apply_team(
        state,
        command,
        create_test_actor(),
        create_test_cause(),
        now(),
    )
    .unwrap()
}

fn step(persistence: &mut Persistence, team_id: TeamId, command: TeamCommand) -> TeamState {
    let state: TeamState = persistence.load_team_state(team_id).unwrap();
    persistence
        .persist_team_transition(&compute(&state, command))
        .unwrap();
    persistence.load_team_state(team_id).unwrap()
}

fn on_leave(start: Date, end: Date) -> TeamCommand {
    TeamCommand::AddAvailability {
        range: range(start, end),
        status: AvailabilityStatus::OnLeave,
    }
}

#[test]
fn test_onboarding_stores_rates_and_default_interval() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();

    let state: TeamState = seed_team(&mut persistence, "  Ramesh Jadhav ", 800);

    assert_eq!(state.team.leader_name, "Ramesh Jadhav");
    assert!(state.team.is_active);
    assert_eq!(state.team.crew_size, 12);
    assert_eq!(
        state.team.rate_for(&Activity::new("harvesting")),
        Some(Decimal::from(800))
    );
    assert_eq!(state.intervals.len(), 1);
    assert_eq!(
        state.intervals[0].range,
        range(date!(2026 - 01 - 01), date!(2026 - 01 - 31))
    );
    assert_eq!(state.intervals[0].status, AvailabilityStatus::Available);
    assert!(state.intervals[0].interval_id.is_some());
}

#[test]
fn test_split_is_persisted_as_three_intervals() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let team_id: TeamId = seed_team(&mut persistence, "Ramesh Jadhav", 800).team.team_id;

    let state: TeamState = step(
        &mut persistence,
        team_id,
        on_leave(date!(2026 - 01 - 10), date!(2026 - 01 - 15)),
    );

    let stored: Vec<(DateRange, AvailabilityStatus)> = state
        .intervals
        .iter()
        .map(|interval| (interval.range, interval.status))
        .collect();
    assert_eq!(
        stored,
        vec![
            (
                range(date!(2026 - 01 - 01), date!(2026 - 01 - 09)),
                AvailabilityStatus::Available
            ),
            (
                range(date!(2026 - 01 - 10), date!(2026 - 01 - 15)),
                AvailabilityStatus::OnLeave
            ),
            (
                range(date!(2026 - 01 - 16), date!(2026 - 01 - 31)),
                AvailabilityStatus::Available
            ),
        ]
    );
}

#[test]
fn test_stale_split_is_conflict() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let team_id: TeamId = seed_team(&mut persistence, "Ramesh Jadhav", 800).team.team_id;
    let state: TeamState = persistence.load_team_state(team_id).unwrap();

    let first: TeamTransitionResult =
        compute(&state, on_leave(date!(2026 - 01 - 10), date!(2026 - 01 - 15)));
    let second: TeamTransitionResult =
        compute(&state, on_leave(date!(2026 - 01 - 20), date!(2026 - 01 - 22)));
    persistence.persist_team_transition(&first).unwrap();

    let result = persistence.persist_team_transition(&second);

    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
    assert_eq!(persistence.list_intervals(team_id).unwrap().len(), 3);
}

#[test]
fn test_insert_racing_an_overlapping_insert_is_conflict() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let team_id: TeamId = seed_team(&mut persistence, "Ramesh Jadhav", 800).team.team_id;
    let state: TeamState = persistence.load_team_state(team_id).unwrap();

    let february: TeamTransitionResult =
        compute(&state, on_leave(date!(2026 - 02 - 01), date!(2026 - 02 - 05)));
    let overlapping: TeamTransitionResult =
        compute(&state, on_leave(date!(2026 - 02 - 03), date!(2026 - 02 - 08)));
    persistence.persist_team_transition(&february).unwrap();

    let result = persistence.persist_team_transition(&overlapping);

    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
}

#[test]
fn test_delete_interval_twice_is_conflict() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let state: TeamState = seed_team(&mut persistence, "Ramesh Jadhav", 800);
    let interval: &AvailabilityInterval = &state.intervals[0];
    let delete: TeamTransitionResult = compute(
        &state,
        TeamCommand::DeleteAvailability {
            interval_id: interval.interval_id.unwrap(),
        },
    );
    persistence.persist_team_transition(&delete).unwrap();

    let result = persistence.persist_team_transition(&delete);

    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
    assert!(
        persistence
            .list_intervals(state.team.team_id)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_set_rate_replaces_existing_rate() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let team_id: TeamId = seed_team(&mut persistence, "Ramesh Jadhav", 800).team.team_id;

    step(
        &mut persistence,
        team_id,
        TeamCommand::SetRate {
            activity: Activity::new("harvesting"),
            rate: Decimal::from(820),
        },
    );
    let state: TeamState = step(
        &mut persistence,
        team_id,
        TeamCommand::SetRate {
            activity: Activity::new("weeding"),
            rate: Decimal::from(400),
        },
    );

    assert_eq!(state.team.rates.len(), 2);
    assert_eq!(
        state.team.rate_for(&Activity::new("harvesting")),
        Some(Decimal::from(820))
    );
}

#[test]
fn test_inactive_teams_are_skipped_by_active_listing() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let first: TeamId = seed_team(&mut persistence, "Ramesh Jadhav", 800).team.team_id;
    let second: TeamId = seed_team(&mut persistence, "Ganesh More", 950).team.team_id;

    step(
        &mut persistence,
        first,
        TeamCommand::SetActive { active: false },
    );

    let active: Vec<LaborTeam> = persistence.list_teams(true).unwrap();
    let all: Vec<LaborTeam> = persistence.list_teams(false).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].team_id, second);
    assert_eq!(all.len(), 2);
}

#[test]
fn test_get_interval_by_id() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let state: TeamState = seed_team(&mut persistence, "Ramesh Jadhav", 800);
    let stored: &AvailabilityInterval = &state.intervals[0];

    let fetched: AvailabilityInterval = persistence
        .get_interval(stored.interval_id.unwrap())
        .unwrap();

    assert_eq!(&fetched, stored);
    assert!(matches!(
        persistence.get_interval(mukadam_bid_domain::IntervalId::new(9_999)),
        Err(PersistenceError::NotFound(_))
    ));
}
