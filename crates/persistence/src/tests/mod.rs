// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod job_tests;
mod team_tests;

use crate::Persistence;
use mukadam_bid::{
    Command, JobCreation, JobState, TeamOnboarding, TeamState, TransitionResult, apply, create_job,
    onboard_team,
};
use mukadam_bid_audit::{Actor, Cause};
use mukadam_bid_domain::{
    Activity, BidDecision, BidId, Job, JobId, JobRequest, TeamId, TeamRegistration,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("operator-1"), String::from("operator"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-789"), String::from("Persistence test"))
}

pub fn now() -> OffsetDateTime {
    datetime!(2026-01-06 09:00 UTC)
}

pub fn create_test_request() -> JobRequest {
    JobRequest {
        farmer: String::from("Suresh Patil"),
        activity: Activity::new("harvesting"),
        farm_size_acres: Some(Decimal::from(5)),
        requested_date: Some(date!(2026 - 01 - 12)),
        farmer_price_per_acre: Some(Decimal::from(1000)),
        advance_amount: Decimal::from(500),
        workers_needed: 10,
        notes: Some(String::from("Sugarcane, north plot")),
    }
}

pub fn create_test_registration(leader: &str, rate: i64) -> TeamRegistration {
    let mut rates: BTreeMap<Activity, Decimal> = BTreeMap::new();
    rates.insert(Activity::new("harvesting"), Decimal::from(rate));
    TeamRegistration {
        leader_name: String::from(leader),
        phone: String::from("9800000000"),
        location: Some(String::from("Baramati")),
        crew_size: 12,
        rates,
        available_from: date!(2026 - 01 - 01),
        available_until: date!(2026 - 01 - 31),
    }
}

pub fn seed_job(persistence: &mut Persistence) -> Job {
    let creation: JobCreation = create_job(
        create_test_request(),
        true,
        create_test_actor(),
        create_test_cause(),
        now(),
    )
    .unwrap();
    persistence.persist_creation(&creation).unwrap().0
}

pub fn seed_team(persistence: &mut Persistence, leader: &str, rate: i64) -> TeamState {
    let onboarding: TeamOnboarding = onboard_team(
        create_test_registration(leader, rate),
        create_test_actor(),
        create_test_cause(),
        now(),
    )
    .unwrap();
    persistence.persist_onboarding(&onboarding).unwrap().0
}

/// Computes a transition against the stored state and persists it.
pub fn step(persistence: &mut Persistence, job_id: JobId, command: Command) -> JobState {
    let state: JobState = persistence.load_job_state(job_id).unwrap();
    let result: TransitionResult = compute(&state, command);
    persistence.persist_transition(&result).unwrap();
    persistence.load_job_state(job_id).unwrap()
}

pub fn compute(state: &JobState, command: Command) -> TransitionResult {
    apply(
        state,
        command,
        create_test_actor(),
        create_test_cause(),
        now(),
    )
    .unwrap()
}

pub fn bid_id_for(state: &JobState, team_id: TeamId) -> BidId {
    state
        .bids
        .iter()
        .find(|bid| bid.team_id == team_id)
        .and_then(|bid| bid.bid_id)
        .unwrap()
}

/// A stored job in `bidding` with teams A and B notified, A interested at 850
/// and B declined.
pub fn seed_answered_job(persistence: &mut Persistence) -> (JobState, TeamId, TeamId) {
    let job: Job = seed_job(persistence);
    let team_a: TeamId = seed_team(persistence, "Ramesh Jadhav", 800).team.team_id;
    let team_b: TeamId = seed_team(persistence, "Ganesh More", 950).team.team_id;

    step(
        persistence,
        job.job_id,
        Command::SetPrice {
            your_price_per_acre: Decimal::from(900),
        },
    );
    let bidding: JobState = step(
        persistence,
        job.job_id,
        Command::NotifyTeams {
            team_ids: vec![team_a, team_b],
        },
    );
    let bid_a: BidId = bid_id_for(&bidding, team_a);
    let bid_b: BidId = bid_id_for(&bidding, team_b);
    step(
        persistence,
        job.job_id,
        Command::RecordBidResponse {
            bid_id: bid_a,
            decision: BidDecision::Interested,
            price: Some(Decimal::from(850)),
            estimated_days: Some(2),
            comment: Some(String::from("Crew free that week")),
        },
    );
    let answered: JobState = step(
        persistence,
        job.job_id,
        Command::RecordBidResponse {
            bid_id: bid_b,
            decision: BidDecision::Declined,
            price: None,
            estimated_days: None,
            comment: None,
        },
    );
    (answered, team_a, team_b)
}
