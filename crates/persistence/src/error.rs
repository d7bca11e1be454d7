// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;

/// Errors raised by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The database could not be opened or configured.
    Open(String),
    /// An embedded migration failed to apply.
    MigrationFailed(String),
    /// A connection setting read back with the wrong value.
    SettingNotApplied {
        /// The PRAGMA name.
        setting: &'static str,
        /// The value that was set.
        expected: String,
        /// The value the connection reports.
        actual: String,
    },
    /// Any other database failure.
    Database(String),
    /// A stored row could not be turned back into a domain value.
    ReconstructionError(String),
    /// A JSON column could not be written or read.
    SerializationError(String),
    /// A write was handed a value it cannot store, such as an update for a
    /// row that was never persisted.
    Inconsistent(String),
    /// A conditional write found the row changed since it was read, or a
    /// uniqueness constraint rejected the write.
    Conflict(String),
    /// The requested audit event does not exist.
    EventNotFound(i64),
    /// The requested row does not exist.
    NotFound(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(msg) => write!(f, "Failed to open database: {msg}"),
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::SettingNotApplied {
                setting,
                expected,
                actual,
            } => write!(
                f,
                "Connection setting {setting} is '{actual}', expected '{expected}'"
            ),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::ReconstructionError(msg) => write!(f, "Row reconstruction error: {msg}"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::Inconsistent(msg) => write!(f, "Inconsistent write: {msg}"),
            Self::Conflict(msg) => write!(f, "Write conflict: {msg}"),
            Self::EventNotFound(id) => write!(f, "Event not found: {id}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound(String::from("Record not found")),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Conflict(info.message().to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
