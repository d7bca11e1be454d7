// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State transitions for the Mukadam job bidding engine.
//!
//! Every change to a job or a team goes through [`apply`] or [`apply_team`]:
//! a pure function from the current state and a [`Command`] to the new state,
//! the exact rows to write, and one audit event. Nothing here performs I/O.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use apply::{apply, apply_team, create_job, onboard_team};
pub use command::{Command, TeamCommand};
pub use error::CoreError;
pub use state::{
    BidWrite, JobCreation, JobState, TeamOnboarding, TeamState, TeamTransitionResult, TeamWrite,
    TransitionResult,
};
