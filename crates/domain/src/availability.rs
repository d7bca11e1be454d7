// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Team availability calendar.
//!
//! Each team owns a set of closed date intervals tagged with an availability
//! status. Intervals for one team never overlap; gaps between them mean
//! "unknown". A new status is introduced inside an existing interval by
//! splitting it, so the surrounding availability is never lost.

use crate::error::DomainError;
use crate::types::{IntervalId, TeamId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Duration};

/// Availability tag carried by an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// Team can take work.
    Available,
    /// Team is committed elsewhere.
    Busy,
    /// Team is on leave.
    OnLeave,
}

impl AvailabilityStatus {
    /// Converts this status to its string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::OnLeave => "on_leave",
        }
    }
}

impl FromStr for AvailabilityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "busy" => Ok(Self::Busy),
            "on_leave" => Ok(Self::OnLeave),
            _ => Err(DomainError::InvalidAvailabilityStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A closed date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Creates a range.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidDateRange` if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day.
    #[must_use]
    pub const fn single_day(day: Date) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Last day of the range.
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Number of days covered, counting both ends.
    #[must_use]
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).whole_days() + 1
    }

    /// Returns whether `other` lies entirely within this range.
    #[must_use]
    pub fn contains_range(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns whether the two ranges share at least one day.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// A tagged date interval owned by one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityInterval {
    /// The canonical identifier assigned by the database.
    /// `None` indicates the interval has not been persisted yet.
    pub interval_id: Option<IntervalId>,
    /// Owning team.
    pub team_id: TeamId,
    /// Covered dates.
    pub range: DateRange,
    /// Availability tag.
    pub status: AvailabilityStatus,
    /// Sub-team leader for this interval, if different from the team leader.
    pub leader_name: Option<String>,
    /// Sub-team leader's phone.
    pub leader_phone: Option<String>,
}

impl AvailabilityInterval {
    /// Creates an unpersisted interval without sub-team leader details.
    #[must_use]
    pub const fn new(team_id: TeamId, range: DateRange, status: AvailabilityStatus) -> Self {
        Self {
            interval_id: None,
            team_id,
            range,
            status,
            leader_name: None,
            leader_phone: None,
        }
    }

    /// Copies ownership and leader details onto a new range and status.
    fn slice(&self, range: DateRange, status: AvailabilityStatus) -> Self {
        Self {
            interval_id: None,
            team_id: self.team_id,
            range,
            status,
            leader_name: self.leader_name.clone(),
            leader_phone: self.leader_phone.clone(),
        }
    }
}

fn shift_day(day: Date, days: i64, operation: &str) -> Result<Date, DomainError> {
    day.checked_add(Duration::days(days))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: operation.to_string(),
        })
}

/// Splits `original` so that `new_range` carries `new_status`.
///
/// Emits, in date order, up to three intervals:
/// - the part of `original` before `new_range` (original status),
/// - `new_range` itself (new status),
/// - the part of `original` after `new_range` (original status).
///
/// Slices that would be empty are omitted, so a `new_range` equal to the
/// original range yields exactly one interval. Leader details carry over to
/// every slice. The emitted intervals are unpersisted (`interval_id` is
/// `None`).
///
/// # Errors
///
/// Returns `DomainError::IntervalOutOfBounds` if `new_range` is not contained
/// in the original range.
pub fn split_interval(
    original: &AvailabilityInterval,
    new_range: DateRange,
    new_status: AvailabilityStatus,
) -> Result<Vec<AvailabilityInterval>, DomainError> {
    if !original.range.contains_range(&new_range) {
        return Err(DomainError::IntervalOutOfBounds {
            requested: new_range,
            original: original.range,
        });
    }

    let mut slices: Vec<AvailabilityInterval> = Vec::with_capacity(3);

    if new_range.start > original.range.start {
        let before_end: Date = shift_day(new_range.start, -1, "computing the day before a split")?;
        slices.push(original.slice(
            DateRange {
                start: original.range.start,
                end: before_end,
            },
            original.status,
        ));
    }

    slices.push(original.slice(new_range, new_status));

    if new_range.end < original.range.end {
        let after_start: Date = shift_day(new_range.end, 1, "computing the day after a split")?;
        slices.push(original.slice(
            DateRange {
                start: after_start,
                end: original.range.end,
            },
            original.status,
        ));
    }

    Ok(slices)
}

/// How a requested interval fits into a team's calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalPlan {
    /// The range falls inside one existing interval, which is replaced.
    Split {
        /// The interval being replaced.
        original: AvailabilityInterval,
        /// Its replacements, in date order.
        replacements: Vec<AvailabilityInterval>,
    },
    /// The range touches no existing interval and is added as-is.
    Insert(AvailabilityInterval),
}

/// Decides how to add `range` with `status` to a team's calendar.
///
/// # Arguments
///
/// * `existing` - The team's current intervals
/// * `team_id` - The owning team
/// * `range` - The requested range
/// * `status` - The status to tag it with
///
/// # Errors
///
/// Returns `DomainError::IntervalOverlap` if `range` overlaps existing
/// intervals without being contained in a single one.
pub fn plan_interval_addition(
    existing: &[AvailabilityInterval],
    team_id: TeamId,
    range: DateRange,
    status: AvailabilityStatus,
) -> Result<IntervalPlan, DomainError> {
    let overlapping: Vec<&AvailabilityInterval> = existing
        .iter()
        .filter(|interval| interval.team_id == team_id && interval.range.overlaps(&range))
        .collect();

    match overlapping.as_slice() {
        [] => Ok(IntervalPlan::Insert(AvailabilityInterval::new(
            team_id, range, status,
        ))),
        [single] if single.range.contains_range(&range) => {
            let replacements: Vec<AvailabilityInterval> = split_interval(single, range, status)?;
            Ok(IntervalPlan::Split {
                original: (*single).clone(),
                replacements,
            })
        }
        [first, ..] => Err(DomainError::IntervalOverlap {
            requested: range,
            existing: first.range,
        }),
    }
}

/// Returns whether any `Available` interval overlaps `query`.
#[must_use]
pub fn is_available(intervals: &[AvailabilityInterval], query: &DateRange) -> bool {
    intervals
        .iter()
        .any(|interval| {
            interval.status == AvailabilityStatus::Available && interval.range.overlaps(query)
        })
}

/// Checks that no two intervals of the same team overlap.
///
/// # Errors
///
/// Returns `DomainError::OverlappingIntervals` naming the first colliding pair.
pub fn validate_non_overlapping(intervals: &[AvailabilityInterval]) -> Result<(), DomainError> {
    let mut sorted: Vec<&AvailabilityInterval> = intervals.iter().collect();
    sorted.sort_by_key(|interval| (interval.team_id, interval.range.start));

    for pair in sorted.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if first.team_id == second.team_id && first.range.overlaps(&second.range) {
            return Err(DomainError::OverlappingIntervals {
                first: first.range,
                second: second.range,
            });
        }
    }
    Ok(())
}
