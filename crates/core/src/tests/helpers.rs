// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Command, JobState, TransitionResult, apply};
use mukadam_bid_audit::{Actor, Cause};
use mukadam_bid_domain::{
    Activity, Bid, BidDecision, BidId, Job, JobId, JobRequest, JobStatus, TeamId,
};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub fn create_test_actor() -> Actor {
    Actor::new(String::from("operator-1"), String::from("operator"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Operator request"))
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
        advance_amount: Decimal::ZERO,
        workers_needed: 10,
        notes: None,
    }
}

pub fn pending_state() -> JobState {
    let job: Job = Job::from_request(JobId::new(1), create_test_request(), now());
    JobState::new(job, Vec::new(), None)
}

pub fn run(state: &JobState, command: Command) -> TransitionResult {
    apply(
        state,
        command,
        create_test_actor(),
        create_test_cause(),
        now(),
    )
    .unwrap()
}

/// Assigns sequential ids to bids that have none, as the database would.
pub fn persist_bids(mut state: JobState) -> JobState {
    let mut next: i64 = state
        .bids
        .iter()
        .filter_map(|bid| bid.bid_id.map(BidId::value))
        .max()
        .unwrap_or(0);
    for bid in &mut state.bids {
        if bid.bid_id.is_none() {
            next += 1;
            bid.bid_id = Some(BidId::new(next));
        }
    }
    state
}

pub fn priced_state() -> JobState {
    let confirmed: JobState = run(&pending_state(), Command::ConfirmJob).new_state;
    run(
        &confirmed,
        Command::SetPrice {
            your_price_per_acre: Decimal::from(900),
        },
    )
    .new_state
}

/// A job in `bidding` with pending bids for teams 1 and 2 (bid ids 1 and 2).
pub fn bidding_state() -> JobState {
    let notified: JobState = run(
        &priced_state(),
        Command::NotifyTeams {
            team_ids: vec![TeamId::new(1), TeamId::new(2)],
        },
    )
    .new_state;
    assert_eq!(notified.job.status, JobStatus::Bidding);
    persist_bids(notified)
}

pub fn respond(
    state: &JobState,
    bid_id: i64,
    decision: BidDecision,
    price: Option<i64>,
) -> JobState {
    run(
        state,
        Command::RecordBidResponse {
            bid_id: BidId::new(bid_id),
            decision,
            price: price.map(Decimal::from),
            estimated_days: Some(2),
            comment: None,
        },
    )
    .new_state
}

/// Team 1 interested at 850, team 2 declined.
pub fn answered_state() -> JobState {
    let first: JobState = respond(&bidding_state(), 1, BidDecision::Interested, Some(850));
    respond(&first, 2, BidDecision::Declined, None)
}

pub fn find_bid(state: &JobState, bid_id: i64) -> &Bid {
    state
        .bids
        .iter()
        .find(|bid| bid.bid_id == Some(BidId::new(bid_id)))
        .unwrap()
}
