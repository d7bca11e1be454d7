// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operation boundary of the Mukadam job bidding engine.
//!
//! [`MatchingEngine`] exposes every operation: the job lifecycle, bid
//! responses and exclusive finalization, candidate ranking, team calendars,
//! payment reconciliation, audit trails and roster import. It owns the
//! persistence handle and consumes two collaborators, a [`Notifier`] and a
//! [`Clock`].
//!
//! Domain, core and persistence errors never cross this boundary directly;
//! they are translated into [`ApiError`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

mod collaborators;
mod engine;
mod error;
mod request_response;
mod roster_import;

#[cfg(test)]
mod tests;

pub use collaborators::{Clock, FixedClock, NoopNotifier, Notifier, RecordingNotifier, SystemClock};
pub use engine::{BENCHMARK_WINDOW, MatchingEngine};
pub use error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use request_response::{
    BidResponseRequest, JobResponse, NotifyResponse, PaymentRequest, RosterImportResponse,
    TeamResponse,
};
pub use roster_import::{
    RosterError, RosterPreview, RosterRowResult, RosterTeam, RowError, RowStatus, preview_roster,
};
