// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Payment reconciliation.
//!
//! A payment is accepted only when its cost breakdown sums to the balance
//! due on the job, within [`RECONCILIATION_TOLERANCE`].

use crate::error::DomainError;
use crate::types::{Job, JobId, PaymentMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Largest accepted difference between a breakdown total and the balance due.
pub const RECONCILIATION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Where the collected money goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Paid to the crew.
    pub labor: Decimal,
    /// Transport costs.
    pub transport: Decimal,
    /// Accommodation costs.
    pub accommodation: Decimal,
    /// Anything else.
    pub other: Decimal,
}

impl CostBreakdown {
    /// Sum of the four components.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ArithmeticOverflow` if the sum is not
    /// representable.
    pub fn total(&self) -> Result<Decimal, DomainError> {
        self.labor
            .checked_add(self.transport)
            .and_then(|sum| sum.checked_add(self.accommodation))
            .and_then(|sum| sum.checked_add(self.other))
            .ok_or(DomainError::ArithmeticOverflow {
                operation: "summing the cost breakdown",
            })
    }

    /// Checks that no component is negative.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidField` naming the first negative component.
    pub fn validate_components(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("labor", self.labor),
            ("transport", self.transport),
            ("accommodation", self.accommodation),
            ("other", self.other),
        ] {
            if value < Decimal::ZERO {
                return Err(DomainError::InvalidField {
                    field,
                    reason: format!("must not be negative, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// A reconciled payment for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// The paid job.
    pub job_id: JobId,
    /// The reconciled breakdown.
    pub breakdown: CostBreakdown,
    /// How the money was collected.
    pub method: PaymentMethod,
    /// Receipt or transaction reference.
    pub proof_reference: Option<String>,
    /// Who collected the money.
    pub collected_by: String,
    /// When the payment was recorded.
    pub recorded_at: OffsetDateTime,
}

/// Balance still owed on a job: the contracted total minus the advance.
///
/// # Errors
///
/// Returns:
/// - `DomainError::MissingField` if the job has no finalized price or no
///   farm size
/// - `DomainError::ArithmeticOverflow` if price times acreage is not
///   representable
pub fn balance_due(job: &Job) -> Result<Decimal, DomainError> {
    let price: Decimal = job
        .finalized_price_per_acre
        .ok_or(DomainError::MissingField {
            field: "finalized_price_per_acre",
        })?;
    let acres: Decimal = job.farm_size_acres.ok_or(DomainError::MissingField {
        field: "farm_size_acres",
    })?;
    let balance: Decimal = price
        .checked_mul(acres)
        .and_then(|total| total.checked_sub(job.advance_amount))
        .ok_or(DomainError::ArithmeticOverflow {
            operation: "computing the balance due",
        })?;
    Ok(balance.round_dp(2))
}

/// Checks a breakdown against the balance due.
///
/// # Errors
///
/// Returns:
/// - `DomainError::InvalidField` if a component is negative
/// - `DomainError::ArithmeticOverflow` if the total or its distance from
///   `balance_due` is not representable
/// - `DomainError::ReconciliationMismatch` carrying the signed difference if
///   the total is more than [`RECONCILIATION_TOLERANCE`] away from `balance_due`
pub fn validate_breakdown(
    breakdown: &CostBreakdown,
    balance_due: Decimal,
) -> Result<(), DomainError> {
    breakdown.validate_components()?;

    let total: Decimal = breakdown.total()?;
    let delta: Decimal = total
        .checked_sub(balance_due)
        .ok_or(DomainError::ArithmeticOverflow {
            operation: "comparing the breakdown with the balance due",
        })?;
    if delta.abs() > RECONCILIATION_TOLERANCE {
        return Err(DomainError::ReconciliationMismatch {
            balance_due,
            total,
            delta,
        });
    }
    Ok(())
}
