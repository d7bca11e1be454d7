// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::fixtures::{create_test_job, create_test_team, harvesting};
use crate::{Activity, BidDecision, BidStatus, DomainError, Job, JobStatus, PaymentMethod};
use rust_decimal::Decimal;
use std::str::FromStr;

#[test]
fn test_activity_normalized() {
    let activity: Activity = Activity::new("  Harvesting ");

    assert_eq!(activity.name(), "harvesting");
    assert_eq!(activity, harvesting());
    assert!(Activity::new("   ").is_empty());
}

#[test]
fn test_job_from_request_starts_pending() {
    let job: Job = create_test_job();

    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.your_price_per_acre.is_none());
    assert!(job.finalized_price_per_acre.is_none());
    assert!(job.completion.is_none());
}

#[test]
fn test_team_rate_lookup_uses_normalized_activity() {
    let team = create_test_team(1, Some(900), 10);

    assert_eq!(
        team.rate_for(&Activity::new("HARVESTING")),
        Some(Decimal::from(900))
    );
    assert_eq!(team.rate_for(&Activity::new("sowing")), None);
}

#[test]
fn test_bid_decision_parsing() {
    assert_eq!(
        BidDecision::from_str("Interested").unwrap(),
        BidDecision::Interested
    );
    assert_eq!(
        BidDecision::from_str("declined").unwrap().resulting_status(),
        BidStatus::Declined
    );
    assert!(matches!(
        BidDecision::from_str("maybe"),
        Err(DomainError::InvalidField {
            field: "decision",
            ..
        })
    ));
}

#[test]
fn test_payment_method_parsing() {
    assert_eq!(
        PaymentMethod::from_str("bank_transfer").unwrap(),
        PaymentMethod::BankTransfer
    );
    assert!(matches!(
        PaymentMethod::from_str("barter"),
        Err(DomainError::InvalidPaymentMethod(_))
    ));
}
