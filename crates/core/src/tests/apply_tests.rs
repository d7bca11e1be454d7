// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    answered_state, bidding_state, create_test_actor, create_test_cause, find_bid, now,
    pending_state, priced_state, respond, run,
};
use crate::{BidWrite, Command, CoreError, JobState, TransitionResult, apply};
use mukadam_bid_audit::Scope;
use mukadam_bid_domain::{
    BidDecision, BidId, BidStatus, DomainError, ErrorKind, JobId, JobStatus, TeamId,
};
use rust_decimal::Decimal;

fn apply_err(state: &JobState, command: Command) -> DomainError {
    match apply(state, command, create_test_actor(), create_test_cause(), now()) {
        Err(CoreError::DomainViolation(err)) => err,
        other => panic!("expected a domain violation, got {other:?}"),
    }
}

#[test]
fn test_valid_command_emits_audit_event() {
    let transition: TransitionResult = run(&pending_state(), Command::ConfirmJob);

    assert_eq!(transition.audit_event.action.name, "ConfirmJob");
    assert_eq!(transition.audit_event.actor.id, "operator-1");
    assert_eq!(transition.audit_event.cause.id, "req-456");
    assert_eq!(transition.audit_event.scope, Scope::Job(JobId::new(1)));
    assert_eq!(transition.audit_event.occurred_at, now());
}

#[test]
fn test_audit_event_contains_before_and_after_state() {
    let transition: TransitionResult = run(&pending_state(), Command::ConfirmJob);

    assert!(transition.audit_event.before.data.contains("status=pending"));
    assert!(transition.audit_event.after.data.contains("status=confirmed"));
}

#[test]
fn test_transition_records_expected_status() {
    let transition: TransitionResult = run(
        &pending_state(),
        Command::ConfirmJob,
    );

    assert_eq!(transition.expected_status, JobStatus::Pending);
    assert_eq!(transition.new_state.job.status, JobStatus::Confirmed);
}

#[test]
fn test_set_price_requires_confirmed() {
    let err: DomainError = apply_err(
        &pending_state(),
        Command::SetPrice {
            your_price_per_acre: Decimal::from(900),
        },
    );

    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_set_price_rejects_non_positive_price() {
    let confirmed: JobState = run(&pending_state(), Command::ConfirmJob).new_state;

    let err: DomainError = apply_err(
        &confirmed,
        Command::SetPrice {
            your_price_per_acre: Decimal::ZERO,
        },
    );

    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_notify_creates_pending_bids_and_opens_bidding() {
    let transition: TransitionResult = run(
        &priced_state(),
        Command::NotifyTeams {
            team_ids: vec![TeamId::new(1), TeamId::new(2), TeamId::new(1)],
        },
    );

    assert_eq!(transition.new_state.job.status, JobStatus::Bidding);
    assert_eq!(transition.bid_writes.len(), 2);
    assert_eq!(transition.inserted_bids().len(), 2);
    assert!(
        transition
            .new_state
            .bids
            .iter()
            .all(|bid| bid.status == BidStatus::Pending)
    );
}

#[test]
fn test_notify_skips_already_notified_teams() {
    let transition: TransitionResult = run(
        &bidding_state(),
        Command::NotifyTeams {
            team_ids: vec![TeamId::new(2), TeamId::new(3)],
        },
    );

    let inserted: Vec<TeamId> = transition
        .inserted_bids()
        .iter()
        .map(|bid| bid.team_id)
        .collect();
    assert_eq!(inserted, vec![TeamId::new(3)]);
    assert_eq!(transition.new_state.bids.len(), 3);
    assert_eq!(transition.expected_status, JobStatus::Bidding);
}

#[test]
fn test_notify_requires_teams() {
    let err: DomainError = apply_err(
        &priced_state(),
        Command::NotifyTeams {
            team_ids: Vec::new(),
        },
    );

    assert_eq!(err, DomainError::MissingField { field: "team_ids" });
}

#[test]
fn test_notify_before_pricing_is_invalid_state() {
    let err: DomainError = apply_err(
        &pending_state(),
        Command::NotifyTeams {
            team_ids: vec![TeamId::new(1)],
        },
    );

    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_interested_response_records_price() {
    let state: JobState = respond(&bidding_state(), 1, BidDecision::Interested, Some(850));

    let bid = find_bid(&state, 1);
    assert_eq!(bid.status, BidStatus::Interested);
    assert_eq!(bid.bid_price_per_acre, Some(Decimal::from(850)));
    assert_eq!(bid.responded_at, Some(now()));
}

#[test]
fn test_interested_response_requires_positive_price() {
    let missing: DomainError = apply_err(
        &bidding_state(),
        Command::RecordBidResponse {
            bid_id: BidId::new(1),
            decision: BidDecision::Interested,
            price: None,
            estimated_days: None,
            comment: None,
        },
    );
    let zero: DomainError = apply_err(
        &bidding_state(),
        Command::RecordBidResponse {
            bid_id: BidId::new(1),
            decision: BidDecision::Interested,
            price: Some(Decimal::ZERO),
            estimated_days: None,
            comment: None,
        },
    );

    assert_eq!(missing.kind(), ErrorKind::Validation);
    assert_eq!(zero.kind(), ErrorKind::Validation);
}

#[test]
fn test_declined_response_with_price_is_rejected() {
    let err: DomainError = apply_err(
        &bidding_state(),
        Command::RecordBidResponse {
            bid_id: BidId::new(2),
            decision: BidDecision::Declined,
            price: Some(Decimal::from(700)),
            estimated_days: None,
            comment: None,
        },
    );

    assert!(matches!(
        err,
        DomainError::InvalidField {
            field: "bid_price_per_acre",
            ..
        }
    ));
}

#[test]
fn test_response_is_recorded_once() {
    let err: DomainError = apply_err(
        &answered_state(),
        Command::RecordBidResponse {
            bid_id: BidId::new(1),
            decision: BidDecision::Declined,
            price: None,
            estimated_days: None,
            comment: None,
        },
    );

    assert!(matches!(err, DomainError::InvalidStatusTransition { .. }));
}

#[test]
fn test_response_write_is_conditional_on_pending() {
    let transition: TransitionResult = run(
        &bidding_state(),
        Command::RecordBidResponse {
            bid_id: BidId::new(1),
            decision: BidDecision::Interested,
            price: Some(Decimal::from(850)),
            estimated_days: Some(3),
            comment: Some(String::from("crew ready")),
        },
    );

    match &transition.bid_writes[..] {
        [BidWrite::Update { bid, expected }] => {
            assert_eq!(*expected, BidStatus::Pending);
            assert_eq!(bid.comment.as_deref(), Some("crew ready"));
        }
        other => panic!("unexpected writes: {other:?}"),
    }
}

#[test]
fn test_reassign_adds_teams_and_records_reason() {
    let transition: TransitionResult = run(
        &answered_state(),
        Command::Reassign {
            team_ids: vec![TeamId::new(1), TeamId::new(4)],
            reason: String::from("only one interested bid"),
        },
    );

    assert_eq!(transition.inserted_bids().len(), 1);
    assert_eq!(transition.bid_writes.len(), 1);
    assert_eq!(transition.new_state.job.status, JobStatus::Bidding);
    assert!(
        transition
            .audit_event
            .action
            .details
            .as_deref()
            .unwrap()
            .contains("only one interested bid")
    );
}

#[test]
fn test_reassign_requires_reason_and_bidding() {
    let no_reason: DomainError = apply_err(
        &answered_state(),
        Command::Reassign {
            team_ids: vec![TeamId::new(4)],
            reason: String::from("   "),
        },
    );
    let wrong_state: DomainError = apply_err(
        &priced_state(),
        Command::Reassign {
            team_ids: vec![TeamId::new(4)],
            reason: String::from("widen pool"),
        },
    );

    assert_eq!(no_reason.kind(), ErrorKind::Validation);
    assert_eq!(wrong_state.kind(), ErrorKind::InvalidState);
}
