// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use mukadam_bid_domain::{JobId, TeamId};
use time::OffsetDateTime;

#[cfg(test)]
mod tests;

/// Represents the entity performing an action.
///
/// An actor is any identifiable entity that initiates a state change:
/// the operator, a team leader answering a notification, or an import job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The unique identifier for this actor.
    pub id: String,
    /// The type of actor (e.g., "operator", "team", "system").
    pub actor_type: String,
}

impl Actor {
    /// Creates a new Actor.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this actor
    /// * `actor_type` - The type of actor
    #[must_use]
    pub const fn new(id: String, actor_type: String) -> Self {
        Self { id, actor_type }
    }
}

/// Represents the reason or trigger for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cause {
    /// A unique identifier for this cause (e.g., request ID, import ID).
    pub id: String,
    /// A description of the cause.
    pub description: String,
}

impl Cause {
    /// Creates a new Cause.
    ///
    /// # Arguments
    ///
    /// * `id` - The unique identifier for this cause
    /// * `description` - A description of what triggered this action
    #[must_use]
    pub const fn new(id: String, description: String) -> Self {
        Self { id, description }
    }
}

/// Represents the specific action performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// The name of the action (e.g., "`FinalizeBid`", "`SplitInterval`").
    pub name: String,
    /// Optional additional details about the action.
    pub details: Option<String>,
}

impl Action {
    /// Creates a new Action.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the action
    /// * `details` - Optional additional details
    #[must_use]
    pub const fn new(name: String, details: Option<String>) -> Self {
        Self { name, details }
    }
}

/// A serialized snapshot of the affected state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    /// JSON representation of the state.
    pub data: String,
}

impl StateSnapshot {
    /// Creates a new `StateSnapshot`.
    #[must_use]
    pub const fn new(data: String) -> Self {
        Self { data }
    }
}

/// The entity an audit event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A job and its bids.
    Job(JobId),
    /// A labor team, its rates and its calendar.
    Team(TeamId),
}

impl Scope {
    /// The job, for job-scoped events.
    #[must_use]
    pub const fn job_id(&self) -> Option<JobId> {
        match self {
            Self::Job(job_id) => Some(*job_id),
            Self::Team(_) => None,
        }
    }

    /// The team, for team-scoped events.
    #[must_use]
    pub const fn team_id(&self) -> Option<TeamId> {
        match self {
            Self::Team(team_id) => Some(*team_id),
            Self::Job(_) => None,
        }
    }
}

/// An immutable audit event representing a state transition.
///
/// Every successful state change must produce exactly one audit event.
/// Audit events are immutable once created and capture:
/// - Who performed the action (actor)
/// - Why it was performed (cause)
/// - What action was performed (action)
/// - The state before and after the transition
/// - Which job or team the transition touched (scope)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// The canonical identifier assigned by the database.
    /// `None` indicates the event has not been persisted yet.
    pub event_id: Option<i64>,
    /// The actor who initiated this state change.
    pub actor: Actor,
    /// The cause or reason for this state change.
    pub cause: Cause,
    /// The action that was performed.
    pub action: Action,
    /// The state before the transition.
    pub before: StateSnapshot,
    /// The state after the transition.
    pub after: StateSnapshot,
    /// The job or team the transition touched.
    pub scope: Scope,
    /// When the transition happened.
    pub occurred_at: OffsetDateTime,
}

impl AuditEvent {
    /// Creates a new, unpersisted `AuditEvent`.
    ///
    /// # Arguments
    ///
    /// * `actor` - The actor who initiated the change
    /// * `cause` - The reason for the change
    /// * `action` - The action that was performed
    /// * `before` - The state before the transition
    /// * `after` - The state after the transition
    /// * `scope` - The job or team the transition touched
    /// * `occurred_at` - When the transition happened
    #[must_use]
    pub const fn new(
        actor: Actor,
        cause: Cause,
        action: Action,
        before: StateSnapshot,
        after: StateSnapshot,
        scope: Scope,
        occurred_at: OffsetDateTime,
    ) -> Self {
        Self {
            event_id: None,
            actor,
            cause,
            action,
            before,
            after,
            scope,
            occurred_at,
        }
    }

    /// Returns a copy carrying the identifier assigned on insert.
    #[must_use]
    pub const fn with_event_id(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }
}
