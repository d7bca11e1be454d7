// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use mukadam_bid_audit::{Actor, Cause};
use mukadam_bid_domain::{
    Activity, BidDecision, BidId, JobId, JobRequest, TeamId, TeamRegistration,
};
use mukadam_bid_persistence::Persistence;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use time::macros::{date, datetime};

use crate::{BidResponseRequest, FixedClock, JobResponse, MatchingEngine, RecordingNotifier};

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("operator-1"), String::from("operator"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn create_test_engine() -> (MatchingEngine, Arc<RecordingNotifier>) {
    let notifier: Arc<RecordingNotifier> = Arc::new(RecordingNotifier::new());
    let engine: MatchingEngine = MatchingEngine::new(
        Persistence::new_in_memory().unwrap(),
        notifier.clone(),
        Arc::new(FixedClock(datetime!(2026-01-06 09:00 UTC))),
    );
    (engine, notifier)
}

/// Five acres of harvesting on 12 January at 1000 per acre, 500 advance.
pub fn create_test_request() -> JobRequest {
    JobRequest {
        farmer: String::from("Suresh Patil"),
        activity: Activity::new("harvesting"),
        farm_size_acres: Some(Decimal::from(5)),
        requested_date: Some(date!(2026 - 01 - 12)),
        farmer_price_per_acre: Some(Decimal::from(1000)),
        advance_amount: Decimal::from(500),
        workers_needed: 10,
        notes: None,
    }
}

/// A crew of 12 available through January with one harvesting rate.
pub fn create_test_registration(leader: &str, phone: &str, rate: i64) -> TeamRegistration {
    let mut rates: BTreeMap<Activity, Decimal> = BTreeMap::new();
    rates.insert(Activity::new("harvesting"), Decimal::from(rate));
    TeamRegistration {
        leader_name: String::from(leader),
        phone: String::from(phone),
        location: Some(String::from("Baramati")),
        crew_size: 12,
        rates,
        available_from: date!(2026 - 01 - 01),
        available_until: date!(2026 - 01 - 31),
    }
}

pub fn seed_team(engine: &MatchingEngine, leader: &str, phone: &str, rate: i64) -> TeamId {
    engine
        .onboard_team(
            create_test_registration(leader, phone, rate),
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap()
        .team
        .team_id
}

/// A confirmed job priced at 900.
pub fn seed_priced_job(engine: &MatchingEngine) -> JobId {
    let job_id: JobId = engine
        .create_job(
            create_test_request(),
            true,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap()
        .job
        .job_id;
    engine
        .set_price(
            job_id,
            Decimal::from(900),
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    job_id
}

pub fn respond(
    engine: &MatchingEngine,
    bid_id: BidId,
    price: Option<i64>,
) -> Result<JobResponse, crate::ApiError> {
    let decision: BidDecision = if price.is_some() {
        BidDecision::Interested
    } else {
        BidDecision::Declined
    };
    engine.record_bid_response(
        BidResponseRequest {
            bid_id,
            decision,
            price: price.map(Decimal::from),
            estimated_days: None,
            comment: None,
        },
        &create_test_actor(),
        &create_test_cause(),
    )
}

pub fn bid_id_for(job: &JobResponse, team_id: TeamId) -> BidId {
    job.bid_for(team_id).and_then(|bid| bid.bid_id).unwrap()
}

/// A job the teams have answered.
pub struct AnsweredJob {
    pub job_id: JobId,
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub bid_a: BidId,
    pub bid_b: BidId,
}

/// A job in `bidding` where team A (rate 800) is interested at 850 and team
/// B (rate 950) declined.
pub fn seed_answered_job(engine: &MatchingEngine) -> AnsweredJob {
    let team_a: TeamId = seed_team(engine, "Ramesh Jadhav", "9800000001", 800);
    let team_b: TeamId = seed_team(engine, "Ganesh More", "9800000002", 950);
    let job_id: JobId = seed_priced_job(engine);

    let notified = engine
        .notify_teams(
            job_id,
            &[team_a, team_b],
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    let bid_a: BidId = bid_id_for(&notified.job, team_a);
    let bid_b: BidId = bid_id_for(&notified.job, team_b);
    respond(engine, bid_a, Some(850)).unwrap();
    respond(engine, bid_b, None).unwrap();

    AnsweredJob {
        job_id,
        team_a,
        team_b,
        bid_a,
        bid_b,
    }
}
