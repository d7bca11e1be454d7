// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::{
    bid_id_for, compute, create_test_actor, create_test_cause, now, seed_answered_job, seed_job,
    step,
};
use crate::{Persistence, PersistenceError};
use mukadam_bid::{BidWrite, Command, JobState, TransitionResult};
use mukadam_bid_audit::{Action, AuditEvent, Scope, StateSnapshot};
use mukadam_bid_domain::{
    Activity, Bid, BidDecision, BidHistoryEntry, BidId, BidStatus, CompletionRecord,
    CostBreakdown, Job, JobStatus, PaymentMethod, PaymentRecord, TeamId,
};
use rust_decimal::Decimal;

fn bid_for(state: &JobState, team_id: TeamId) -> &Bid {
    state.bids.iter().find(|bid| bid.team_id == team_id).unwrap()
}

fn finalize_command(bid_id: BidId) -> Command {
    Command::Finalize { bid_id }
}

#[test]
fn test_created_job_round_trips() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();

    let job: Job = seed_job(&mut persistence);

    assert_eq!(job.status, JobStatus::Confirmed);
    assert_eq!(persistence.get_job(job.job_id).unwrap(), job);
}

#[test]
fn test_list_jobs_filters_by_status() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let first: Job = seed_job(&mut persistence);
    let second: Job = seed_job(&mut persistence);
    step(
        &mut persistence,
        second.job_id,
        Command::Cancel {
            reason: String::from("Farmer postponed"),
        },
    );

    let all: Vec<Job> = persistence.list_jobs(None).unwrap();
    let confirmed: Vec<Job> = persistence.list_jobs(Some(JobStatus::Confirmed)).unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all[0].job_id, second.job_id);
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].job_id, first.job_id);
}

#[test]
fn test_notify_stores_pending_bids_and_bidding_status() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (answered, team_a, team_b) = seed_answered_job(&mut persistence);

    assert_eq!(answered.job.status, JobStatus::Bidding);
    assert_eq!(answered.bids.len(), 2);
    assert_eq!(bid_for(&answered, team_a).status, BidStatus::Interested);
    assert_eq!(
        bid_for(&answered, team_a).bid_price_per_acre,
        Some(Decimal::from(850))
    );
    assert_eq!(bid_for(&answered, team_a).responded_at, Some(now()));
    assert_eq!(bid_for(&answered, team_b).status, BidStatus::Declined);
    assert_eq!(bid_for(&answered, team_b).bid_price_per_acre, None);
}

#[test]
fn test_finalize_persists_assignment_and_price() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (answered, team_a, _) = seed_answered_job(&mut persistence);
    let job_id = answered.job.job_id;

    let finalized: JobState = step(
        &mut persistence,
        job_id,
        finalize_command(bid_id_for(&answered, team_a)),
    );

    assert_eq!(finalized.job.status, JobStatus::Finalized);
    assert_eq!(
        finalized.job.finalized_price_per_acre,
        Some(Decimal::from(850))
    );
    assert_eq!(bid_for(&finalized, team_a).status, BidStatus::Assigned);
}

#[test]
fn test_stale_job_transition_is_conflict_and_writes_nothing() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (answered, team_a, _) = seed_answered_job(&mut persistence);
    let job_id = answered.job.job_id;
    let trail_before: usize = persistence.get_job_audit_trail(job_id).unwrap().len();

    let finalize: TransitionResult =
        compute(&answered, finalize_command(bid_id_for(&answered, team_a)));
    let cancel: TransitionResult = compute(
        &answered,
        Command::Cancel {
            reason: String::from("Rain"),
        },
    );
    persistence.persist_transition(&cancel).unwrap();

    let result = persistence.persist_transition(&finalize);

    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
    let current: JobState = persistence.load_job_state(job_id).unwrap();
    assert_eq!(current.job.status, JobStatus::Cancelled);
    assert_eq!(bid_for(&current, team_a).status, BidStatus::Interested);
    assert_eq!(
        persistence.get_job_audit_trail(job_id).unwrap().len(),
        trail_before + 1
    );
}

#[test]
fn test_stale_bid_response_is_conflict() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (answered, _, _) = seed_answered_job(&mut persistence);
    let job_id = answered.job.job_id;
    let extra_team: TeamId =
        crate::tests::seed_team(&mut persistence, "Vitthal Shinde", 880).team.team_id;
    let reassigned: JobState = step(
        &mut persistence,
        job_id,
        Command::Reassign {
            team_ids: vec![extra_team],
            reason: String::from("Need a third quote"),
        },
    );
    let extra_bid: BidId = bid_id_for(&reassigned, extra_team);

    let respond = |decision: BidDecision, price: Option<i64>| Command::RecordBidResponse {
        bid_id: extra_bid,
        decision,
        price: price.map(Decimal::from),
        estimated_days: None,
        comment: None,
    };
    let interested: TransitionResult =
        compute(&reassigned, respond(BidDecision::Interested, Some(870)));
    let declined: TransitionResult = compute(&reassigned, respond(BidDecision::Declined, None));
    persistence.persist_transition(&interested).unwrap();

    let result = persistence.persist_transition(&declined);

    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
    let current: JobState = persistence.load_job_state(job_id).unwrap();
    assert_eq!(bid_for(&current, extra_team).status, BidStatus::Interested);
}

#[test]
fn test_second_assigned_bid_is_rejected_by_unique_index() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (answered, team_a, team_b) = seed_answered_job(&mut persistence);
    let job_id = answered.job.job_id;
    let finalized: JobState = step(
        &mut persistence,
        job_id,
        finalize_command(bid_id_for(&answered, team_a)),
    );
    let trail_before: usize = persistence.get_job_audit_trail(job_id).unwrap().len();

    let mut rogue: Bid = bid_for(&finalized, team_b).clone();
    rogue.status = BidStatus::Assigned;
    rogue.bid_price_per_acre = Some(Decimal::from(950));
    let forged: TransitionResult = TransitionResult {
        new_state: finalized.clone(),
        expected_status: JobStatus::Finalized,
        bid_writes: vec![BidWrite::Update {
            bid: rogue,
            expected: BidStatus::Declined,
        }],
        payment: None,
        audit_event: AuditEvent::new(
            create_test_actor(),
            create_test_cause(),
            Action::new(String::from("FinalizeBid"), None),
            finalized.to_snapshot(),
            finalized.to_snapshot(),
            Scope::Job(job_id),
            now(),
        ),
    };

    let result = persistence.persist_transition(&forged);

    assert!(matches!(result, Err(PersistenceError::Conflict(_))));
    let current: JobState = persistence.load_job_state(job_id).unwrap();
    assert_eq!(bid_for(&current, team_b).status, BidStatus::Declined);
    assert_eq!(
        persistence.get_job_audit_trail(job_id).unwrap().len(),
        trail_before
    );
}

#[test]
fn test_payment_is_stored_once() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (answered, team_a, _) = seed_answered_job(&mut persistence);
    let job_id = answered.job.job_id;
    step(
        &mut persistence,
        job_id,
        finalize_command(bid_id_for(&answered, team_a)),
    );
    step(&mut persistence, job_id, Command::StartWork);
    let completed: JobState = step(
        &mut persistence,
        job_id,
        Command::CompleteWork {
            record: CompletionRecord {
                actual_area_acres: Decimal::from(5),
                labourers_used: 11,
                hours_worked: Decimal::from(88),
                quality_rating: Some(4),
                work_summary: String::from("Harvested and bundled"),
            },
        },
    );
    assert_eq!(completed.job.status, JobStatus::Completed);
    assert!(completed.job.completion.is_some());

    // 850 x 5 acres - 500 advance
    let payment: TransitionResult = compute(
        &completed,
        Command::RecordPayment {
            breakdown: CostBreakdown {
                labor: Decimal::from(3000),
                transport: Decimal::from(500),
                accommodation: Decimal::from(250),
                other: Decimal::ZERO,
            },
            method: PaymentMethod::Upi,
            proof_reference: Some(String::from("UPI-REF-1")),
            collected_by: String::from("Operator"),
        },
    );
    persistence.persist_transition(&payment).unwrap();

    let stored: Option<PaymentRecord> = persistence.get_payment(job_id).unwrap();
    assert_eq!(stored, payment.payment);

    let again = persistence.persist_transition(&payment);
    assert!(matches!(again, Err(PersistenceError::Conflict(_))));
}

#[test]
fn test_recent_prices_and_bid_history() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (_, team_a, team_b) = seed_answered_job(&mut persistence);

    let prices: Vec<Decimal> = persistence
        .recent_bid_prices(&Activity::new("Harvesting"), 20)
        .unwrap();
    let history_a: Vec<BidHistoryEntry> = persistence.get_bid_history(team_a).unwrap();
    let history_b: Vec<BidHistoryEntry> = persistence.get_bid_history(team_b).unwrap();

    assert_eq!(prices, vec![Decimal::from(850)]);
    assert_eq!(
        history_a,
        vec![BidHistoryEntry {
            bid_status: BidStatus::Interested,
            bid_price_per_acre: Some(Decimal::from(850)),
            job_status: JobStatus::Bidding,
        }]
    );
    assert_eq!(history_b[0].bid_status, BidStatus::Declined);
    assert!(
        persistence
            .recent_bid_prices(&Activity::new("sowing"), 20)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_get_bid_resolves_owning_job() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let (state, team_a, _) = seed_answered_job(&mut persistence);
    let bid_a: BidId = bid_id_for(&state, team_a);

    let bid: Bid = persistence.get_bid(bid_a).unwrap();

    assert_eq!(bid.job_id, state.job.job_id);
    assert_eq!(bid.status, BidStatus::Interested);
    assert!(matches!(
        persistence.get_bid(BidId::new(9_999)),
        Err(PersistenceError::NotFound(_))
    ));
}

#[test]
fn test_two_handles_on_one_file_cannot_both_finalize() {
    let path: std::path::PathBuf = std::env::temp_dir().join(format!(
        "mukadam-bid-finalize-race-{}.db",
        std::process::id()
    ));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }

    let (answered, team_a, _) = {
        let mut persistence: Persistence = Persistence::new_with_file(&path).unwrap();
        seed_answered_job(&mut persistence)
    };
    let job_id = answered.job.job_id;
    let finalize: TransitionResult =
        compute(&answered, finalize_command(bid_id_for(&answered, team_a)));

    let barrier = std::sync::Barrier::new(2);
    let results: Vec<Result<i64, PersistenceError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    let mut persistence: Persistence = Persistence::new_with_file(&path).unwrap();
                    barrier.wait();
                    persistence.persist_transition(&finalize)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|result| matches!(result, Err(PersistenceError::Conflict(_))))
    );
    let mut reader: Persistence = Persistence::new_with_file(&path).unwrap();
    let current: JobState = reader.load_job_state(job_id).unwrap();
    assert_eq!(current.job.status, JobStatus::Finalized);
    let finalize_events: usize = reader
        .get_job_audit_trail(job_id)
        .unwrap()
        .iter()
        .filter(|event| event.action.name == "FinalizeBid")
        .count();
    assert_eq!(finalize_events, 1);

    drop(reader);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
