// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Opening and configuring `SQLite` connections.
//!
//! Every connection is opened through [`open`], which applies the
//! connection settings the write discipline depends on, runs the embedded
//! migrations and reads the settings back before handing the connection out.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::PersistenceError;

/// Embedded schema migrations.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// A named shared-cache in-memory database, gone when its last
    /// connection closes.
    Memory(String),
    /// A database file, opened in WAL mode.
    File(String),
}

impl Storage {
    fn url(&self) -> String {
        match self {
            Self::Memory(name) => format!("file:{name}?mode=memory&cache=shared"),
            Self::File(path) => path.clone(),
        }
    }
}

/// A connection setting and the column its table-valued PRAGMA reports it in.
#[derive(Debug, Clone, Copy)]
struct Setting {
    pragma: &'static str,
    column: &'static str,
}

const FOREIGN_KEYS: Setting = Setting {
    pragma: "foreign_keys",
    column: "foreign_keys",
};
const BUSY_TIMEOUT: Setting = Setting {
    pragma: "busy_timeout",
    column: "timeout",
};
const JOURNAL_MODE: Setting = Setting {
    pragma: "journal_mode",
    column: "journal_mode",
};

// Read back as text so one row type serves every setting.
#[derive(QueryableByName)]
struct PragmaValue {
    #[diesel(sql_type = Text)]
    value: String,
}

fn read_setting(conn: &mut SqliteConnection, setting: Setting) -> Result<String, PersistenceError> {
    let row: PragmaValue = diesel::sql_query(format!(
        "SELECT CAST({} AS TEXT) AS value FROM pragma_{}",
        setting.column, setting.pragma
    ))
    .get_result(conn)?;
    Ok(row.value)
}

fn apply_pragma(conn: &mut SqliteConnection, statement: &str) -> Result<(), PersistenceError> {
    diesel::sql_query(statement)
        .execute(conn)
        .map_err(|e| PersistenceError::Open(format!("{statement}: {e}")))?;
    Ok(())
}

/// Fails unless the connection reports `expected` for `setting`.
fn expect_setting(
    conn: &mut SqliteConnection,
    setting: Setting,
    expected: &str,
) -> Result<(), PersistenceError> {
    let actual: String = read_setting(conn, setting)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(PersistenceError::SettingNotApplied {
            setting: setting.pragma,
            expected: expected.to_string(),
            actual,
        });
    }
    debug!(setting = setting.pragma, value = %actual, "Connection setting verified");
    Ok(())
}

/// Row ID of the last insert on this connection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

/// Reads the current busy timeout, in milliseconds.
#[cfg(test)]
pub fn busy_timeout_ms(conn: &mut SqliteConnection) -> Result<String, PersistenceError> {
    read_setting(conn, BUSY_TIMEOUT)
}

/// Opens a configured and migrated connection.
///
/// Foreign keys and the busy timeout are set before any migration runs.
/// File databases additionally switch to WAL journaling. The settings are
/// read back afterwards and a connection that did not take them is refused.
///
/// # Errors
///
/// Returns:
/// - `PersistenceError::Open` if the connection or a setting fails
/// - `PersistenceError::MigrationFailed` if a migration fails
/// - `PersistenceError::SettingNotApplied` if a setting did not stick
pub fn open(storage: &Storage) -> Result<SqliteConnection, PersistenceError> {
    let url: String = storage.url();
    info!(database = %url, "Opening SQLite database");

    let mut conn: SqliteConnection =
        SqliteConnection::establish(&url).map_err(|e| PersistenceError::Open(e.to_string()))?;

    apply_pragma(&mut conn, "PRAGMA foreign_keys = ON")?;
    apply_pragma(&mut conn, &format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"))?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    info!(applied = applied.len(), "Migrations applied");

    expect_setting(&mut conn, FOREIGN_KEYS, "1")?;
    expect_setting(&mut conn, BUSY_TIMEOUT, &BUSY_TIMEOUT_MS.to_string())?;

    if matches!(storage, Storage::File(_)) {
        apply_pragma(&mut conn, "PRAGMA journal_mode = WAL")?;
        expect_setting(&mut conn, JOURNAL_MODE, "wal")?;
    }

    Ok(conn)
}
