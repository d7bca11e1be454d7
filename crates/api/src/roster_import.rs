// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Team roster CSV parsing and validation.
//!
//! A roster lists one row per team and activity. Rows sharing a phone number
//! describe the same team: the first row supplies the leader, crew and
//! availability, and every row adds one activity rate.
//!
//! Values are normalized once here (trimmed, activity and status lowercased,
//! a blank status read as `available`). Nothing downstream re-normalizes.

use csv::StringRecord;
use mukadam_bid_domain::{
    Activity, AvailabilityStatus, TeamRegistration, validate_team_registration,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use thiserror::Error;
use time::Date;
use time::macros::format_description;

/// Errors that reject a whole roster file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosterError {
    /// The header row could not be read.
    #[error("Failed to read roster headers: {0}")]
    UnreadableHeaders(String),

    /// Required columns are absent.
    #[error("Missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),
}

/// Problems with a single roster row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    /// A required value is blank.
    #[error("{field}: required field is missing or empty")]
    Missing { field: &'static str },

    /// A value could not be parsed.
    #[error("{field}: invalid value '{value}'")]
    Malformed { field: &'static str, value: String },

    /// The row disagrees with an earlier row for the same team.
    #[error("{field}: differs from row {first_row} for the same phone")]
    Inconsistent {
        field: &'static str,
        first_row: usize,
    },

    /// The same activity is listed twice for one team.
    #[error("activity: '{activity}' is listed more than once for this team")]
    DuplicateActivity { activity: String },

    /// The team is already onboarded.
    #[error("phone: a team with phone '{phone}' is already onboarded")]
    AlreadyOnboarded { phone: String },

    /// The assembled registration fails validation.
    #[error("validation: {0}")]
    Rule(String),

    /// The record itself is malformed.
    #[error("CSV parse error: {0}")]
    Parse(String),
}

/// Status of a roster row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Row can be imported.
    Valid,
    /// Row has errors, and so does every row of its team.
    Invalid,
}

/// Validation result for one roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterRowResult {
    /// The row number (1-based, excluding header).
    pub row_number: usize,
    /// Leader name, if present.
    pub leader_name: Option<String>,
    /// Phone number, if present.
    pub phone: Option<String>,
    /// Activity, if present.
    pub activity: Option<String>,
    /// The row status.
    pub status: RowStatus,
    /// Zero or more validation errors.
    pub errors: Vec<String>,
}

/// A team assembled from one or more valid rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterTeam {
    /// The registration to onboard.
    pub registration: TeamRegistration,
    /// Status of the team's default interval.
    pub availability: AvailabilityStatus,
    /// Rows the team was assembled from.
    pub rows: Vec<usize>,
}

/// Result of validating a roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterPreview {
    /// Per-row results.
    pub rows: Vec<RosterRowResult>,
    /// Teams whose every row is valid.
    pub teams: Vec<RosterTeam>,
}

impl RosterPreview {
    /// Number of invalid rows.
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.status == RowStatus::Invalid)
            .count()
    }
}

const REQUIRED_HEADERS: &[&str] = &[
    "leader_name",
    "phone",
    "crew_size",
    "activity",
    "rate_per_acre",
    "available_from",
    "available_until",
];

/// Normalizes a header for case-insensitive, whitespace-tolerant matching.
fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

fn validate_headers(headers: &StringRecord) -> Result<HashMap<String, usize>, RosterError> {
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (normalize_header(header), idx))
        .collect();

    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|required| !header_map.contains_key(**required))
        .map(|required| String::from(*required))
        .collect();
    if !missing.is_empty() {
        return Err(RosterError::MissingHeaders(missing));
    }
    Ok(header_map)
}

/// One row after field parsing.
#[derive(Debug, Clone)]
struct ParsedRow {
    row_number: usize,
    leader_name: String,
    phone: String,
    location: Option<String>,
    crew_size: u32,
    activity: Activity,
    rate: Decimal,
    available_from: Date,
    available_until: Date,
    status: AvailabilityStatus,
}

fn parse_date(field: &'static str, value: &str) -> Result<Date, RowError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|_| {
        RowError::Malformed {
            field,
            value: value.to_string(),
        }
    })
}

fn parse_status(value: Option<String>) -> Result<AvailabilityStatus, RowError> {
    let Some(raw) = value else {
        return Ok(AvailabilityStatus::Available);
    };
    let normalized: String = raw.to_lowercase().replace([' ', '-'], "_");
    AvailabilityStatus::from_str(&normalized).map_err(|_| RowError::Malformed {
        field: "status",
        value: raw,
    })
}

fn parse_row(
    row_number: usize,
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<ParsedRow, Vec<RowError>> {
    let get_field = |name: &str| -> Option<String> {
        header_map
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    let mut errors: Vec<RowError> = Vec::new();
    let mut required = |field: &'static str| -> String {
        get_field(field).unwrap_or_else(|| {
            errors.push(RowError::Missing { field });
            String::new()
        })
    };

    let leader_name: String = required("leader_name");
    let phone: String = required("phone");
    let crew_text: String = required("crew_size");
    let activity_text: String = required("activity");
    let rate_text: String = required("rate_per_acre");
    let from_text: String = required("available_from");
    let until_text: String = required("available_until");
    if !errors.is_empty() {
        return Err(errors);
    }

    let crew_size: Option<u32> = crew_text
        .parse::<u32>()
        .map_err(|_| {
            errors.push(RowError::Malformed {
                field: "crew_size",
                value: crew_text.clone(),
            });
        })
        .ok();
    let rate: Option<Decimal> = Decimal::from_str(&rate_text)
        .map_err(|_| {
            errors.push(RowError::Malformed {
                field: "rate_per_acre",
                value: rate_text.clone(),
            });
        })
        .ok();
    let available_from: Option<Date> = parse_date("available_from", &from_text)
        .map_err(|e| errors.push(e))
        .ok();
    let available_until: Option<Date> = parse_date("available_until", &until_text)
        .map_err(|e| errors.push(e))
        .ok();
    let status: Option<AvailabilityStatus> = parse_status(get_field("status"))
        .map_err(|e| errors.push(e))
        .ok();

    match (crew_size, rate, available_from, available_until, status) {
        (Some(crew_size), Some(rate), Some(available_from), Some(available_until), Some(status))
            if errors.is_empty() =>
        {
            Ok(ParsedRow {
                row_number,
                leader_name,
                phone,
                location: get_field("location"),
                crew_size,
                activity: Activity::new(&activity_text),
                rate,
                available_from,
                available_until,
                status,
            })
        }
        _ => Err(errors),
    }
}

/// Rows grouped under one phone number, in file order.
struct TeamGroup {
    rows: Vec<ParsedRow>,
}

impl TeamGroup {
    /// Checks every row against the first and assembles the registration.
    fn assemble(&self) -> (Option<RosterTeam>, HashMap<usize, Vec<RowError>>) {
        let mut errors: HashMap<usize, Vec<RowError>> = HashMap::new();
        let Some(first) = self.rows.first() else {
            return (None, errors);
        };

        let mut rates: BTreeMap<Activity, Decimal> = BTreeMap::new();
        for row in &self.rows {
            let row_errors: &mut Vec<RowError> = errors.entry(row.row_number).or_default();
            let mismatched: [(&'static str, bool); 5] = [
                ("leader_name", row.leader_name != first.leader_name),
                ("crew_size", row.crew_size != first.crew_size),
                ("available_from", row.available_from != first.available_from),
                ("available_until", row.available_until != first.available_until),
                ("status", row.status != first.status),
            ];
            for (field, differs) in mismatched {
                if differs {
                    row_errors.push(RowError::Inconsistent {
                        field,
                        first_row: first.row_number,
                    });
                }
            }
            if rates.insert(row.activity.clone(), row.rate).is_some() {
                row_errors.push(RowError::DuplicateActivity {
                    activity: row.activity.name().to_string(),
                });
            }
        }

        let registration: TeamRegistration = TeamRegistration {
            leader_name: first.leader_name.clone(),
            phone: first.phone.clone(),
            location: first.location.clone(),
            crew_size: first.crew_size,
            rates,
            available_from: first.available_from,
            available_until: first.available_until,
        };
        if let Err(e) = validate_team_registration(&registration) {
            errors
                .entry(first.row_number)
                .or_default()
                .push(RowError::Rule(e.to_string()));
        }

        let valid: bool = errors.values().all(Vec::is_empty);
        let team: Option<RosterTeam> = valid.then(|| RosterTeam {
            registration,
            availability: first.status,
            rows: self.rows.iter().map(|row| row.row_number).collect(),
        });
        (team, errors)
    }
}

/// Parses and validates a roster without touching persistence.
///
/// # Arguments
///
/// * `csv_content` - The raw CSV content
/// * `onboarded_phones` - Phone numbers of teams that already exist
///
/// # Returns
///
/// Per-row results and the teams that can be onboarded. A team is only
/// importable if every one of its rows is valid.
///
/// # Errors
///
/// Returns an error if the header row cannot be read or lacks a required
/// column.
pub fn preview_roster(
    csv_content: &str,
    onboarded_phones: &HashSet<String>,
) -> Result<RosterPreview, RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(csv_content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| RosterError::UnreadableHeaders(e.to_string()))?
        .clone();
    let header_map: HashMap<String, usize> = validate_headers(&headers)?;

    let mut rows: Vec<RosterRowResult> = Vec::new();
    let mut groups: Vec<TeamGroup> = Vec::new();
    let mut group_by_phone: HashMap<String, usize> = HashMap::new();

    for (idx, result) in reader.records().enumerate() {
        let row_number: usize = idx + 1;
        let record: StringRecord = match result {
            Ok(record) => record,
            Err(e) => {
                rows.push(RosterRowResult {
                    row_number,
                    leader_name: None,
                    phone: None,
                    activity: None,
                    status: RowStatus::Invalid,
                    errors: vec![RowError::Parse(e.to_string()).to_string()],
                });
                continue;
            }
        };

        let cell = |name: &str| -> Option<String> {
            header_map
                .get(name)
                .and_then(|&idx| record.get(idx))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let mut result: RosterRowResult = RosterRowResult {
            row_number,
            leader_name: cell("leader_name"),
            phone: cell("phone"),
            activity: cell("activity").map(|a| Activity::new(&a).name().to_string()),
            status: RowStatus::Valid,
            errors: Vec::new(),
        };

        match parse_row(row_number, &record, &header_map) {
            Ok(parsed) => {
                if onboarded_phones.contains(&parsed.phone) {
                    result.errors.push(
                        RowError::AlreadyOnboarded {
                            phone: parsed.phone.clone(),
                        }
                        .to_string(),
                    );
                }
                let slot: usize = *group_by_phone
                    .entry(parsed.phone.clone())
                    .or_insert_with(|| {
                        groups.push(TeamGroup { rows: Vec::new() });
                        groups.len() - 1
                    });
                groups[slot].rows.push(parsed);
            }
            Err(errors) => {
                result
                    .errors
                    .extend(errors.iter().map(ToString::to_string));
            }
        }
        rows.push(result);
    }

    let mut teams: Vec<RosterTeam> = Vec::new();
    for group in &groups {
        let (team, group_errors) = group.assemble();
        for (row_number, errors) in group_errors {
            if let Some(row) = rows.iter_mut().find(|row| row.row_number == row_number) {
                row.errors.extend(errors.iter().map(ToString::to_string));
            }
        }
        if let Some(team) = team {
            teams.push(team);
        }
    }

    // A team with any bad row is not importable, so mark its siblings too.
    let mut rejected_phones: HashSet<String> = HashSet::new();
    for row in &rows {
        if !row.errors.is_empty()
            && let Some(phone) = &row.phone
        {
            rejected_phones.insert(phone.clone());
        }
    }
    teams.retain(|team| !rejected_phones.contains(&team.registration.phone));
    for row in &mut rows {
        let rejected: bool = !row.errors.is_empty()
            || row
                .phone
                .as_ref()
                .is_some_and(|phone| rejected_phones.contains(phone));
        if rejected {
            row.status = RowStatus::Invalid;
            if row.errors.is_empty() {
                row.errors
                    .push(String::from("phone: another row for this team is invalid"));
            }
        }
    }

    Ok(RosterPreview { rows, teams })
}
