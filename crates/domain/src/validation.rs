// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::availability::DateRange;
use crate::error::DomainError;
use crate::job_status::JobStatus;
use crate::types::{Activity, CompletionRecord, Job, TeamRegistration};
use rust_decimal::Decimal;

/// Highest quality rating a farmer can give.
pub const MAX_QUALITY_RATING: u8 = 5;

/// Validates that a price or size is strictly positive.
///
/// # Arguments
///
/// * `field` - Name reported on failure
/// * `value` - The value to check
///
/// # Errors
///
/// Returns `DomainError::InvalidField` if the value is zero or negative.
pub fn validate_positive(field: &'static str, value: Decimal) -> Result<(), DomainError> {
    if value <= Decimal::ZERO {
        return Err(DomainError::InvalidField {
            field,
            reason: format!("must be greater than zero, got {value}"),
        });
    }
    Ok(())
}

/// Validates that a free-text reason is present.
///
/// # Errors
///
/// Returns `DomainError::MissingField` if the text is empty or whitespace.
pub fn validate_reason(field: &'static str, reason: &str) -> Result<(), DomainError> {
    if reason.trim().is_empty() {
        return Err(DomainError::MissingField { field });
    }
    Ok(())
}

/// Validates that a job request carries everything needed for confirmation.
///
/// # Arguments
///
/// * `job` - The job to check
///
/// # Errors
///
/// Returns an error if:
/// - The farmer reference is empty
/// - The activity is empty
/// - The farm size is absent or not positive
/// - The requested date is absent
/// - The farmer's price is absent or not positive
pub fn validate_confirmable(job: &Job) -> Result<(), DomainError> {
    if job.farmer.trim().is_empty() {
        return Err(DomainError::MissingField { field: "farmer" });
    }
    if job.activity.is_empty() {
        return Err(DomainError::MissingField { field: "activity" });
    }
    let acres: Decimal = job.farm_size_acres.ok_or(DomainError::MissingField {
        field: "farm_size_acres",
    })?;
    validate_positive("farm_size_acres", acres)?;
    if job.requested_date.is_none() {
        return Err(DomainError::MissingField {
            field: "requested_date",
        });
    }
    let farmer_price: Decimal = job.farmer_price_per_acre.ok_or(DomainError::MissingField {
        field: "farmer_price_per_acre",
    })?;
    validate_positive("farmer_price_per_acre", farmer_price)?;
    if job.advance_amount < Decimal::ZERO {
        return Err(DomainError::InvalidField {
            field: "advance_amount",
            reason: String::from("must not be negative"),
        });
    }
    Ok(())
}

/// Validates the pairing of a job's optional fields with its status.
///
/// - `your_price_per_acre` is present iff the job has been priced.
/// - `finalized_price_per_acre` is present iff a bid has been finalized.
/// - A completed job carries its completion record.
///
/// A cancelled job keeps whatever it held before cancellation, so only the
/// reverse direction is checked for it: a finalized price implies a price.
///
/// # Errors
///
/// Returns `DomainError::JobInvariantViolated` describing the broken rule.
pub fn validate_job_invariants(job: &Job) -> Result<(), DomainError> {
    let violation = |reason: &str| DomainError::JobInvariantViolated {
        job_id: job.job_id,
        reason: reason.to_string(),
    };

    if job.status == JobStatus::Cancelled {
        if job.finalized_price_per_acre.is_some() && job.your_price_per_acre.is_none() {
            return Err(violation("finalized price without operator price"));
        }
        return Ok(());
    }

    if job.status.has_passed_pricing() != job.your_price_per_acre.is_some() {
        return Err(violation(
            "operator price must be present exactly when the job has been priced",
        ));
    }
    if job.status.carries_finalized_price() != job.finalized_price_per_acre.is_some() {
        return Err(violation(
            "finalized price must be present exactly when a bid has been finalized",
        ));
    }
    if job.status == JobStatus::Completed && job.completion.is_none() {
        return Err(violation("completed job has no completion record"));
    }
    Ok(())
}

/// Validates a completion record.
///
/// # Errors
///
/// Returns an error if the work summary is empty, the rating is outside
/// 1 to 5, or the area or hours are negative.
pub fn validate_completion_record(record: &CompletionRecord) -> Result<(), DomainError> {
    validate_reason("work_summary", &record.work_summary)?;
    if let Some(rating) = record.quality_rating
        && !(1..=MAX_QUALITY_RATING).contains(&rating)
    {
        return Err(DomainError::InvalidField {
            field: "quality_rating",
            reason: format!("must be between 1 and {MAX_QUALITY_RATING}, got {rating}"),
        });
    }
    if record.actual_area_acres < Decimal::ZERO {
        return Err(DomainError::InvalidField {
            field: "actual_area_acres",
            reason: String::from("must not be negative"),
        });
    }
    if record.hours_worked < Decimal::ZERO {
        return Err(DomainError::InvalidField {
            field: "hours_worked",
            reason: String::from("must not be negative"),
        });
    }
    Ok(())
}

/// Validates a team rate entry.
///
/// # Errors
///
/// Returns an error if the activity is empty or the rate is not positive.
pub fn validate_rate(activity: &Activity, rate: Decimal) -> Result<(), DomainError> {
    if activity.is_empty() {
        return Err(DomainError::MissingField { field: "activity" });
    }
    validate_positive("rate_per_acre", rate)
}

/// Validates a new team before onboarding.
///
/// # Returns
///
/// The team's default availability range.
///
/// # Errors
///
/// Returns an error if:
/// - The leader name or phone is empty
/// - The crew is empty
/// - Any rate entry is invalid
/// - The default availability range is inverted
pub fn validate_team_registration(
    registration: &TeamRegistration,
) -> Result<DateRange, DomainError> {
    validate_reason("leader_name", &registration.leader_name)?;
    validate_reason("phone", &registration.phone)?;
    if registration.crew_size == 0 {
        return Err(DomainError::InvalidField {
            field: "crew_size",
            reason: String::from("must be at least one labourer"),
        });
    }
    for (activity, rate) in &registration.rates {
        validate_rate(activity, *rate)?;
    }
    DateRange::new(registration.available_from, registration.available_until)
}
