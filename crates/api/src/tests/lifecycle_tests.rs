// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use mukadam_bid_audit::{AuditEvent, Scope};
use mukadam_bid_domain::{
    Activity, BidId, BidStatus, CandidateScore, CompletionRecord, ErrorKind, JobId, JobRequest,
    JobStatus, TeamId,
};
use rust_decimal::Decimal;

use crate::tests::helpers::{
    AnsweredJob, bid_id_for, create_test_actor, create_test_cause, create_test_engine,
    create_test_request, dec, respond, seed_answered_job, seed_priced_job, seed_team,
};
use crate::{ApiError, JobResponse, NotifyResponse};

fn completion() -> CompletionRecord {
    CompletionRecord {
        actual_area_acres: Decimal::from(5),
        labourers_used: 11,
        hours_worked: dec("18.5"),
        quality_rating: Some(4),
        work_summary: String::from("Harvested and bundled"),
    }
}

#[test]
fn test_end_to_end_bidding_flow() {
    let (engine, notifier) = create_test_engine();
    let team_a: TeamId = seed_team(&engine, "Ramesh Jadhav", "9800000001", 800);
    let team_b: TeamId = seed_team(&engine, "Ganesh More", "9800000002", 950);

    let created: JobResponse = engine
        .create_job(
            create_test_request(),
            true,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    let job_id: JobId = created.job.job_id;
    assert_eq!(created.job.status, JobStatus::Confirmed);

    let priced: JobResponse = engine
        .set_price(
            job_id,
            Decimal::from(900),
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    assert_eq!(priced.job.status, JobStatus::Priced);
    assert_eq!(priced.job.your_price_per_acre, Some(Decimal::from(900)));

    let notified: NotifyResponse = engine
        .notify_teams(
            job_id,
            &[team_a, team_b],
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    assert_eq!(notified.job.job.status, JobStatus::Bidding);
    assert_eq!(notified.job.bids.len(), 2);
    assert!(
        notified
            .job
            .bids
            .iter()
            .all(|bid| bid.status == BidStatus::Pending)
    );
    assert_eq!(notified.newly_notified, vec![team_a, team_b]);
    assert_eq!(notified.delivered, 2);
    assert_eq!(notifier.calls(), vec![(job_id, vec![team_a, team_b])]);

    let bid_a: BidId = bid_id_for(&notified.job, team_a);
    let bid_b: BidId = bid_id_for(&notified.job, team_b);
    respond(&engine, bid_a, Some(850)).unwrap();
    respond(&engine, bid_b, None).unwrap();

    let ranked: Vec<CandidateScore> = engine.rank_candidates(job_id).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].team_id, team_a);
    assert_eq!(ranked[0].rate_per_acre, Decimal::from(850));

    let finalized: JobResponse = engine
        .finalize(job_id, bid_a, &create_test_actor(), &create_test_cause())
        .unwrap();
    assert_eq!(finalized.job.status, JobStatus::Finalized);
    assert_eq!(
        finalized.job.finalized_price_per_acre,
        Some(Decimal::from(850))
    );
    assert_eq!(
        finalized.bid_for(team_a).unwrap().status,
        BidStatus::Assigned
    );
    assert_eq!(finalized.summary.assigned_bid, Some(bid_a));

    let second = engine.finalize(job_id, bid_b, &create_test_actor(), &create_test_cause());
    assert!(matches!(
        second,
        Err(ApiError::AlreadyFinalized { job_id: id, assigned_bid: Some(assigned) })
            if id == job_id.value() && assigned == bid_a.value()
    ));
}

#[test]
fn test_every_transition_writes_one_audit_event() {
    let (engine, _) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);
    engine
        .finalize(
            answered.job_id,
            answered.bid_a,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();

    let trail: Vec<AuditEvent> = engine.job_audit_trail(answered.job_id).unwrap();
    let names: Vec<&str> = trail.iter().map(|e| e.action.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "CreateJob",
            "SetPrice",
            "NotifyTeams",
            "RecordBidResponse",
            "RecordBidResponse",
            "FinalizeBid",
        ]
    );
    assert!(
        trail
            .iter()
            .all(|e| e.scope == Scope::Job(answered.job_id) && e.event_id.is_some())
    );
}

#[test]
fn test_failed_transition_writes_no_audit_event() {
    let (engine, _) = create_test_engine();
    let job_id: JobId = seed_priced_job(&engine);
    let before: usize = engine.job_audit_trail(job_id).unwrap().len();

    let result = engine.start_work(job_id, &create_test_actor(), &create_test_cause());

    assert!(matches!(result, Err(ApiError::InvalidState { .. })));
    assert_eq!(engine.job_audit_trail(job_id).unwrap().len(), before);
}

#[test]
fn test_confirm_requires_complete_request() {
    let (engine, _) = create_test_engine();
    let request: JobRequest = JobRequest {
        requested_date: None,
        ..create_test_request()
    };
    let job_id: JobId = engine
        .create_job(request, false, &create_test_actor(), &create_test_cause())
        .unwrap()
        .job
        .job_id;

    let result = engine.confirm_job(job_id, &create_test_actor(), &create_test_cause());

    assert!(matches!(
        result,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "requested_date"
    ));
    assert_eq!(
        engine.get_job(job_id).unwrap().job.status,
        JobStatus::Pending
    );
}

#[test]
fn test_confirm_at_creation_requires_complete_request() {
    let (engine, _) = create_test_engine();
    let request: JobRequest = JobRequest {
        farm_size_acres: None,
        ..create_test_request()
    };

    let result = engine.create_job(request, true, &create_test_actor(), &create_test_cause());

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
    assert!(engine.list_jobs(None).unwrap().is_empty());
}

#[test]
fn test_set_price_requires_confirmed_job() {
    let (engine, _) = create_test_engine();
    let job_id: JobId = engine
        .create_job(
            create_test_request(),
            false,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap()
        .job
        .job_id;

    let err: ApiError = engine
        .set_price(
            job_id,
            Decimal::from(900),
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::InvalidState));
}

#[test]
fn test_set_price_rejects_non_positive_price() {
    let (engine, _) = create_test_engine();
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

    let result = engine.set_price(
        job_id,
        Decimal::ZERO,
        &create_test_actor(),
        &create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
}

#[test]
fn test_notify_is_idempotent() {
    let (engine, notifier) = create_test_engine();
    let team_a: TeamId = seed_team(&engine, "Ramesh Jadhav", "9800000001", 800);
    let job_id: JobId = seed_priced_job(&engine);

    let first: NotifyResponse = engine
        .notify_teams(
            job_id,
            &[team_a, team_a],
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    let second: NotifyResponse = engine
        .notify_teams(job_id, &[team_a], &create_test_actor(), &create_test_cause())
        .unwrap();

    assert_eq!(first.job.bids.len(), 1);
    assert_eq!(first.newly_notified, vec![team_a]);
    assert_eq!(second.job.bids.len(), 1);
    assert!(second.newly_notified.is_empty());
    assert_eq!(second.delivered, 0);
    assert_eq!(second.job.job.status, JobStatus::Bidding);
    assert_eq!(notifier.calls().len(), 1);
}

#[test]
fn test_notify_rejects_unknown_and_inactive_teams() {
    let (engine, _) = create_test_engine();
    let team_a: TeamId = seed_team(&engine, "Ramesh Jadhav", "9800000001", 800);
    let job_id: JobId = seed_priced_job(&engine);
    engine
        .set_team_active(team_a, false, &create_test_actor(), &create_test_cause())
        .unwrap();

    let inactive = engine.notify_teams(
        job_id,
        &[team_a],
        &create_test_actor(),
        &create_test_cause(),
    );
    let unknown = engine.notify_teams(
        job_id,
        &[TeamId::new(9_999)],
        &create_test_actor(),
        &create_test_cause(),
    );
    let empty = engine.notify_teams(job_id, &[], &create_test_actor(), &create_test_cause());

    assert!(matches!(inactive, Err(ApiError::InvalidInput { .. })));
    assert!(matches!(unknown, Err(ApiError::InvalidInput { .. })));
    assert!(matches!(empty, Err(ApiError::InvalidInput { .. })));
    let job: JobResponse = engine.get_job(job_id).unwrap();
    assert_eq!(job.job.status, JobStatus::Priced);
    assert!(job.bids.is_empty());
}

#[test]
fn test_bid_response_rules() {
    let (engine, _) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);
    let team_c: TeamId = seed_team(&engine, "Vijay Shinde", "9800000003", 900);
    let notified: NotifyResponse = engine
        .notify_teams(
            answered.job_id,
            &[team_c],
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    let bid_c: BidId = bid_id_for(&notified.job, team_c);

    let interested_without_price = engine.record_bid_response(
        crate::BidResponseRequest {
            bid_id: bid_c,
            decision: mukadam_bid_domain::BidDecision::Interested,
            price: None,
            estimated_days: None,
            comment: None,
        },
        &create_test_actor(),
        &create_test_cause(),
    );
    let declined_with_price = engine.record_bid_response(
        crate::BidResponseRequest {
            bid_id: bid_c,
            decision: mukadam_bid_domain::BidDecision::Declined,
            price: Some(Decimal::from(900)),
            estimated_days: None,
            comment: None,
        },
        &create_test_actor(),
        &create_test_cause(),
    );
    let answered_twice = respond(&engine, answered.bid_a, Some(800));
    let unknown_bid = respond(&engine, BidId::new(9_999), Some(800));

    assert!(matches!(
        interested_without_price,
        Err(ApiError::InvalidInput { .. })
    ));
    assert!(matches!(declined_with_price, Err(ApiError::InvalidInput { .. })));
    assert!(matches!(answered_twice, Err(ApiError::InvalidState { .. })));
    assert!(matches!(unknown_bid, Err(ApiError::ResourceNotFound { .. })));

    let job: JobResponse = engine.get_job(answered.job_id).unwrap();
    assert_eq!(job.bid_for(team_c).unwrap().status, BidStatus::Pending);
    assert_eq!(
        job.bid_for(answered.team_a).unwrap().bid_price_per_acre,
        Some(Decimal::from(850))
    );
}

#[test]
fn test_finalize_outside_bidding_is_invalid_state() {
    let (engine, _) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);
    engine
        .cancel(
            answered.job_id,
            "Farmer postponed the harvest",
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();

    let err: ApiError = engine
        .finalize(
            answered.job_id,
            answered.bid_a,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::InvalidState));
    let job: JobResponse = engine.get_job(answered.job_id).unwrap();
    assert_eq!(
        job.bid_for(answered.team_a).unwrap().status,
        BidStatus::Interested
    );
    assert_eq!(
        job.bid_for(answered.team_b).unwrap().status,
        BidStatus::Declined
    );
    assert_eq!(job.job.finalized_price_per_acre, None);
}

#[test]
fn test_finalize_rejects_declined_bid() {
    let (engine, _) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);

    let result = engine.finalize(
        answered.job_id,
        answered.bid_b,
        &create_test_actor(),
        &create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::InvalidState { .. })));
    assert_eq!(
        engine.get_job(answered.job_id).unwrap().job.status,
        JobStatus::Bidding
    );
}

#[test]
fn test_reassign_adds_teams_without_touching_bids() {
    let (engine, notifier) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);
    let team_c: TeamId = seed_team(&engine, "Vijay Shinde", "9800000003", 900);

    let blank = engine.reassign(
        answered.job_id,
        &[team_c],
        "  ",
        &create_test_actor(),
        &create_test_cause(),
    );
    assert!(matches!(blank, Err(ApiError::InvalidInput { .. })));

    let reassigned: NotifyResponse = engine
        .reassign(
            answered.job_id,
            &[answered.team_a, team_c],
            "Only one interested team",
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();

    assert_eq!(reassigned.newly_notified, vec![team_c]);
    assert_eq!(reassigned.job.bids.len(), 3);
    assert_eq!(
        reassigned.job.bid_for(answered.team_a).unwrap().status,
        BidStatus::Interested
    );
    assert_eq!(
        reassigned.job.bid_for(team_c).unwrap().status,
        BidStatus::Pending
    );
    assert_eq!(notifier.calls().last().unwrap().1, vec![team_c]);

    let trail: Vec<AuditEvent> = engine.job_audit_trail(answered.job_id).unwrap();
    let details: &str = trail.last().unwrap().action.details.as_deref().unwrap();
    assert!(details.contains("Only one interested team"));
}

#[test]
fn test_reassign_after_finalize_is_invalid_state() {
    let (engine, _) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);
    let team_c: TeamId = seed_team(&engine, "Vijay Shinde", "9800000003", 900);
    engine
        .finalize(
            answered.job_id,
            answered.bid_a,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();

    let result = engine.reassign(
        answered.job_id,
        &[team_c],
        "Crew fell sick",
        &create_test_actor(),
        &create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::InvalidState { .. })));
}

#[test]
fn test_work_runs_from_finalized_to_completed() {
    let (engine, _) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);
    engine
        .finalize(
            answered.job_id,
            answered.bid_a,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();

    let started: JobResponse = engine
        .start_work(answered.job_id, &create_test_actor(), &create_test_cause())
        .unwrap();
    assert_eq!(started.job.status, JobStatus::InProgress);
    assert!(started.job.started_at.is_some());

    let completed: JobResponse = engine
        .complete_work(
            answered.job_id,
            completion(),
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    assert_eq!(completed.job.status, JobStatus::Completed);
    assert!(completed.job.completed_at.is_some());
    assert_eq!(completed.job.completion, Some(completion()));

    let cancel = engine.cancel(
        answered.job_id,
        "Too late",
        &create_test_actor(),
        &create_test_cause(),
    );
    assert!(matches!(cancel, Err(ApiError::InvalidState { .. })));
}

#[test]
fn test_completion_requires_summary() {
    let (engine, _) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);
    engine
        .finalize(
            answered.job_id,
            answered.bid_a,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();
    engine
        .start_work(answered.job_id, &create_test_actor(), &create_test_cause())
        .unwrap();

    let result = engine.complete_work(
        answered.job_id,
        CompletionRecord {
            work_summary: String::new(),
            ..completion()
        },
        &create_test_actor(),
        &create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
    assert_eq!(
        engine.get_job(answered.job_id).unwrap().job.status,
        JobStatus::InProgress
    );
}

#[test]
fn test_cancel_keeps_bids_and_records_reason() {
    let (engine, _) = create_test_engine();
    let answered: AnsweredJob = seed_answered_job(&engine);

    let cancelled: JobResponse = engine
        .cancel(
            answered.job_id,
            "Rain damage",
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();

    assert_eq!(cancelled.job.status, JobStatus::Cancelled);
    assert_eq!(
        cancelled.job.cancellation_reason.as_deref(),
        Some("Rain damage")
    );
    assert_eq!(cancelled.bids.len(), 2);
    assert_eq!(cancelled.job.your_price_per_acre, Some(Decimal::from(900)));
}

#[test]
fn test_unknown_job_is_not_found() {
    let (engine, _) = create_test_engine();

    let err: ApiError = engine
        .confirm_job(JobId::new(42), &create_test_actor(), &create_test_cause())
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    assert!(matches!(
        engine.get_job(JobId::new(42)),
        Err(ApiError::ResourceNotFound { .. })
    ));
}

#[test]
fn test_list_jobs_by_status() {
    let (engine, _) = create_test_engine();
    seed_priced_job(&engine);
    engine
        .create_job(
            JobRequest {
                activity: Activity::new("Sowing"),
                ..create_test_request()
            },
            false,
            &create_test_actor(),
            &create_test_cause(),
        )
        .unwrap();

    assert_eq!(engine.list_jobs(None).unwrap().len(), 2);
    let pending = engine.list_jobs(Some(JobStatus::Pending)).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].activity, Activity::new("sowing"));
}
