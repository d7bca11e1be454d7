// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use mukadam_bid_domain::{BidId, BidStatus, JobId, JobStatus, TeamId};
use std::thread;

use crate::tests::helpers::{
    bid_id_for, create_test_actor, create_test_cause, create_test_engine, respond,
    seed_priced_job, seed_team,
};
use crate::{ApiError, JobResponse, MatchingEngine};

const RACERS: usize = 16;

/// A job in `bidding` with four interested teams quoting 800 to 830.
fn seed_contested_job(engine: &MatchingEngine) -> (JobId, Vec<BidId>) {
    let teams: Vec<TeamId> = (0..4)
        .map(|i| {
            seed_team(
                engine,
                &format!("Leader {i}"),
                &format!("98000000{i:02}"),
                800,
            )
        })
        .collect();
    let job_id: JobId = seed_priced_job(engine);
    let notified = engine
        .notify_teams(job_id, &teams, &create_test_actor(), &create_test_cause())
        .unwrap();

    let mut bids: Vec<BidId> = Vec::new();
    for (offset, team_id) in (0_i64..).zip(teams.iter()) {
        let bid_id: BidId = bid_id_for(&notified.job, *team_id);
        respond(engine, bid_id, Some(800 + offset * 10)).unwrap();
        bids.push(bid_id);
    }
    (job_id, bids)
}

#[test]
fn test_concurrent_finalize_admits_exactly_one_winner() {
    let (engine, _) = create_test_engine();
    let (job_id, bids) = seed_contested_job(&engine);

    let results: Vec<Result<JobResponse, ApiError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..RACERS)
            .map(|i| {
                let engine: &MatchingEngine = &engine;
                let bid_id: BidId = bids[i % bids.len()];
                scope.spawn(move || {
                    engine.finalize(job_id, bid_id, &create_test_actor(), &create_test_cause())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let winners: Vec<&JobResponse> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    let winning_bid: BidId = winners[0].summary.assigned_bid.unwrap();

    let losers: Vec<&ApiError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(losers.len(), RACERS - 1);
    for loser in losers {
        assert!(matches!(
            loser,
            ApiError::AlreadyFinalized { job_id: id, assigned_bid: Some(assigned) }
                if *id == job_id.value() && *assigned == winning_bid.value()
        ));
    }

    let stored: JobResponse = engine.get_job(job_id).unwrap();
    assert_eq!(stored.job.status, JobStatus::Finalized);
    let assigned: Vec<BidId> = stored
        .bids
        .iter()
        .filter(|bid| bid.status == BidStatus::Assigned)
        .filter_map(|bid| bid.bid_id)
        .collect();
    assert_eq!(assigned, vec![winning_bid]);
    assert_eq!(
        stored
            .bids
            .iter()
            .filter(|bid| bid.status == BidStatus::Interested)
            .count(),
        3
    );

    let finalize_events: usize = engine
        .job_audit_trail(job_id)
        .unwrap()
        .iter()
        .filter(|event| event.action.name == "FinalizeBid")
        .count();
    assert_eq!(finalize_events, 1);
}

#[test]
fn test_finalize_after_work_started_is_already_finalized() {
    let (engine, _) = create_test_engine();
    let (job_id, bids) = seed_contested_job(&engine);
    engine
        .finalize(job_id, bids[0], &create_test_actor(), &create_test_cause())
        .unwrap();
    engine
        .start_work(job_id, &create_test_actor(), &create_test_cause())
        .unwrap();

    let result = engine.finalize(job_id, bids[1], &create_test_actor(), &create_test_cause());

    assert!(matches!(
        result,
        Err(ApiError::AlreadyFinalized { assigned_bid: Some(assigned), .. })
            if assigned == bids[0].value()
    ));
}
