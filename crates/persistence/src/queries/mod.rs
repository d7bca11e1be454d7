// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `audit` - Audit event queries
//! - `jobs` - Jobs, bids, payments and bid history
//! - `teams` - Labor teams, rates and availability intervals

pub mod audit;
pub mod jobs;
pub mod teams;

pub use audit::{get_audit_event, get_job_audit_trail, get_team_audit_trail};
pub use jobs::{
    get_bid, get_bid_history, get_job, get_payment, list_bids, list_jobs, load_job_state,
    recent_bid_prices,
};
pub use teams::{get_interval, get_team, list_intervals, list_teams, load_team_state};
