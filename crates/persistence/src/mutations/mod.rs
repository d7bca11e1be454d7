// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations for the persistence layer.
//!
//! ## Module Organization
//!
//! - `audit` - Audit event persistence
//! - `jobs` - Job creation and job transitions (job, bid and payment rows)
//! - `teams` - Team onboarding and team transitions (rates, calendar)
//!
//! Every public mutation runs inside one immediate transaction and writes
//! exactly one audit event. Updates of rows read earlier are conditional on
//! the value that was read; a mismatch aborts the transaction with
//! `PersistenceError::Conflict`.

pub mod audit;
pub mod jobs;
pub mod teams;

pub use audit::persist_audit_event;
pub use jobs::{persist_creation, persist_transition};
pub use teams::{persist_onboarding, persist_team_transition};
