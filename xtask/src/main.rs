// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - Project automation for Mukadam Bid
//!
//! Wraps the cargo invocations used locally and in CI behind one entry
//! point. `cargo xtask ci` runs all of them in order.
//!
//! `cargo xtask verify-migrations` applies the `SQLite` migrations to an
//! in-memory database, checks the constraints the matching engine relies on
//! (one bid per team per job, at most one assigned bid per job, one payment
//! per job, scoped audit rows), then reverts and re-applies every migration
//! and fails if the rebuilt schema differs from the first one.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::{fmt::Debug, io, process::Output, vec};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use std::collections::{BTreeMap, BTreeSet};
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run everything CI runs: migrations, lint, deny, machete, build, test
    CI,

    /// Build every crate and target
    #[command(visible_alias = "b")]
    Build,

    /// Check dependency licenses and advisories
    #[command(visible_alias = "cd")]
    Deny,

    /// Check for unused dependencies
    #[command(visible_alias = "m")]
    Machete,

    /// Run clippy, rustdoc, rustfmt and typos checks
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy with warnings denied
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Build the docs of each workspace crate with warnings denied
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check formatting
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Check for typos
    #[command(visible_alias = "lt")]
    LintTypos,

    /// Format the workspace
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run unit, integration and doc tests
    #[command(visible_alias = "t")]
    Test,

    /// Verify that migrations build the expected schema and revert cleanly
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Deny => deny(),
            Self::Machete => machete(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => lint_format(),
            Self::LintTypos => lint_typos(),
            Self::FixFormatting => fix_format(),
            Self::Test => test(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

/// Migrations first: a broken schema fails fast without compiling the
/// workspace.
fn ci() -> Result<()> {
    verify_migrations()?;
    lint()?;
    deny()?;
    machete()?;
    build()?;
    test()
}

fn deny() -> Result<()> {
    run_cargo(vec!["deny", "check"])
}

fn machete() -> Result<()> {
    cmd!("cargo-machete").run_with_trace()?;
    Ok(())
}

fn build() -> Result<()> {
    run_cargo(vec!["build", "--workspace", "--all-targets"])
}

fn lint() -> Result<()> {
    lint_clippy()?;
    lint_docs()?;
    lint_format()?;
    lint_typos()
}

fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ])
}

/// Builds docs one package at a time so a broken intra-doc link names the
/// crate it lives in.
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .no_deps()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_packages() {
        if package.name.as_str() == "xtask" {
            continue;
        }
        cmd("cargo", ["doc", "--no-deps", "--package", package.name.as_str()])
            .env("RUSTDOCFLAGS", "-D warnings")
            .run_with_trace()?;
    }

    Ok(())
}

fn lint_format() -> Result<()> {
    run_cargo(vec!["fmt", "--all", "--check"])
}

fn fix_format() -> Result<()> {
    run_cargo(vec!["fmt", "--all"])
}

/// Uses [typos-cli](https://github.com/crate-ci/typos/).
fn lint_typos() -> Result<()> {
    cmd!("typos").run_with_trace()?;
    Ok(())
}

/// Doc tests run last; they are the slowest.
fn test() -> Result<()> {
    run_cargo(vec!["test", "--workspace", "--all-targets"])?;
    run_cargo(vec!["test", "--workspace", "--doc"])
}

fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

/// Tables the persistence layer reads and writes.
const EXPECTED_TABLES: [&str; 7] = [
    "audit_events",
    "availability_intervals",
    "bids",
    "jobs",
    "labor_teams",
    "payment_records",
    "team_rates",
];

/// Verify the `SQLite` migrations.
///
/// 1. Applies every migration to an in-memory database with foreign keys on
/// 2. Introspects the schema (tables, columns, keys, indexes)
/// 3. Checks the tables and constraints the engine depends on
/// 4. Reverts every migration and checks that no tables remain
/// 5. Re-applies and fails if the rebuilt schema differs from the first
///
/// ```bash
/// cargo xtask verify-migrations
/// ```
fn verify_migrations() -> Result<()> {
    tracing::info!("Starting migration verification");

    let mut conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("Failed to enable foreign keys on SQLite")?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply migrations: {e}"))?;
    tracing::info!("Migrations applied");

    let applied = introspect_sqlite_schema(&mut conn)?;
    check_expected_schema(&applied)?;
    tracing::info!("Schema has the expected tables and constraints");

    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to revert migrations: {e}"))?;
    let reverted = introspect_sqlite_schema(&mut conn)?;
    if !reverted.tables.is_empty() {
        return Err(eyre!(
            "❌ Migration verification FAILED: tables left after revert: {:?}",
            reverted.tables.keys().collect::<Vec<_>>()
        ));
    }
    tracing::info!("Migrations reverted cleanly");

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| eyre!("Failed to re-apply migrations: {e}"))?;
    let reapplied = introspect_sqlite_schema(&mut conn)?;
    compare_schemas(&applied, &reapplied)?;

    tracing::info!("✓ Migration verification passed");
    Ok(())
}

/// Normalized schema representation
#[derive(Debug, Clone, PartialEq, Eq)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Table {
    columns: BTreeMap<String, Column>,
    primary_keys: BTreeSet<String>,
    foreign_keys: BTreeSet<ForeignKey>,
    unique_constraints: BTreeSet<UniqueConstraint>,
    indexes: BTreeSet<Index>,
}

impl Table {
    fn has_unique(&self, columns: &[&str]) -> bool {
        self.unique_constraints
            .iter()
            .any(|u| u.columns.iter().map(String::as_str).eq(columns.iter().copied()))
    }

    fn has_foreign_key(&self, from_column: &str, to_table: &str) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.from_column == from_column && fk.to_table == to_table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Column {
    name: String,
    normalized_type: String,
    nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    from_column: String,
    to_table: String,
    to_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct UniqueConstraint {
    columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Index {
    name: String,
    columns: Vec<String>,
    unique: bool,
    partial: bool,
}

/// Introspect `SQLite` schema
fn introspect_sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    let mut schema = Schema {
        tables: BTreeMap::new(),
    };
    for table in tables {
        let table_info = introspect_table(conn, &table.name)?;
        schema.tables.insert(table.name, table_info);
    }

    Ok(schema)
}

fn introspect_table(conn: &mut SqliteConnection, table_name: &str) -> Result<Table> {
    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Integer)]
        unique: i32,
        #[diesel(sql_type = Text)]
        origin: String,
        #[diesel(sql_type = Integer)]
        partial: i32,
    }

    #[derive(QueryableByName)]
    struct IndexColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let mut table_info = Table {
        columns: BTreeMap::new(),
        primary_keys: BTreeSet::new(),
        foreign_keys: BTreeSet::new(),
        unique_constraints: BTreeSet::new(),
        indexes: BTreeSet::new(),
    };

    let columns: Vec<ColumnInfo> = diesel::sql_query(format!("PRAGMA table_info({table_name})"))
        .load(conn)
        .wrap_err(format!("Failed to get columns for table {table_name}"))?;
    for col in columns {
        table_info.columns.insert(
            col.name.clone(),
            Column {
                name: col.name.clone(),
                normalized_type: normalize_sqlite_type(&col.r#type),
                nullable: col.notnull == 0,
            },
        );
        if col.pk > 0 {
            table_info.primary_keys.insert(col.name);
        }
    }

    let fks: Vec<ForeignKeyInfo> =
        diesel::sql_query(format!("PRAGMA foreign_key_list({table_name})"))
            .load(conn)
            .wrap_err(format!("Failed to get foreign keys for table {table_name}"))?;
    for fk in fks {
        table_info.foreign_keys.insert(ForeignKey {
            from_column: fk.from,
            to_table: fk.table,
            to_column: fk.to,
        });
    }

    let indexes: Vec<IndexInfo> = diesel::sql_query(format!("PRAGMA index_list({table_name})"))
        .load(conn)
        .wrap_err(format!("Failed to get indexes for table {table_name}"))?;
    for idx in indexes {
        let index_columns: Vec<IndexColumnInfo> =
            diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                .load(conn)
                .wrap_err(format!("Failed to get index columns for {}", idx.name))?;
        let column_names: Vec<String> = index_columns.into_iter().map(|c| c.name).collect();

        // 'u' covers inline UNIQUE clauses, including sqlite_autoindex_*
        if idx.origin == "u" {
            table_info.unique_constraints.insert(UniqueConstraint {
                columns: column_names,
            });
        } else if !idx.name.starts_with("sqlite_autoindex_") {
            table_info.indexes.insert(Index {
                name: idx.name,
                columns: column_names,
                unique: idx.unique != 0,
                partial: idx.partial != 0,
            });
        }
    }

    Ok(table_info)
}

/// Normalize `SQLite` type to its storage class
fn normalize_sqlite_type(sqlite_type: &str) -> String {
    let normalized = sqlite_type.to_uppercase();
    if normalized.contains("INT") {
        "integer".to_string()
    } else if normalized.contains("REAL")
        || normalized.contains("FLOA")
        || normalized.contains("DOUB")
    {
        "real".to_string()
    } else if normalized.contains("BLOB") {
        "blob".to_string()
    } else if normalized.contains("BOOL") {
        "boolean".to_string()
    } else {
        "text".to_string()
    }
}

/// Check the tables and constraints the engine relies on
fn check_expected_schema(schema: &Schema) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    let actual: BTreeSet<&str> = schema.tables.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = EXPECTED_TABLES.into_iter().collect();
    for table in expected.difference(&actual) {
        errors.push(format!("  - Missing table '{table}'"));
    }
    for table in actual.difference(&expected) {
        errors.push(format!("  - Unexpected table '{table}'"));
    }
    if !errors.is_empty() {
        return Err(eyre!(
            "❌ Migration verification FAILED: Table mismatch\n{}",
            errors.join("\n")
        ));
    }

    let tables = &schema.tables;

    // Money is stored as canonical decimal text, never as a float
    for (table_name, table) in tables {
        for column in table.columns.values() {
            if column.normalized_type == "real" {
                errors.push(format!(
                    "  - Column '{table_name}.{}' is REAL; money columns must be TEXT",
                    column.name
                ));
            }
        }
    }

    if !tables["bids"].has_unique(&["job_id", "team_id"]) {
        errors.push(String::from("  - bids needs UNIQUE (job_id, team_id)"));
    }
    let one_assigned = tables["bids"]
        .indexes
        .iter()
        .any(|idx| idx.unique && idx.partial && idx.columns == ["job_id"]);
    if !one_assigned {
        errors.push(String::from(
            "  - bids needs a partial unique index on job_id for assigned bids",
        ));
    }
    if !tables["payment_records"].has_unique(&["job_id"]) {
        errors.push(String::from("  - payment_records needs UNIQUE (job_id)"));
    }
    let rate_key: BTreeSet<String> = [String::from("activity"), String::from("team_id")]
        .into_iter()
        .collect();
    if tables["team_rates"].primary_keys != rate_key {
        errors.push(String::from(
            "  - team_rates needs PRIMARY KEY (team_id, activity)",
        ));
    }

    let required_foreign_keys: [(&str, &str, &str); 7] = [
        ("team_rates", "team_id", "labor_teams"),
        ("availability_intervals", "team_id", "labor_teams"),
        ("bids", "job_id", "jobs"),
        ("bids", "team_id", "labor_teams"),
        ("payment_records", "job_id", "jobs"),
        ("audit_events", "job_id", "jobs"),
        ("audit_events", "team_id", "labor_teams"),
    ];
    for (table_name, column, target) in required_foreign_keys {
        if !tables[table_name].has_foreign_key(column, target) {
            errors.push(format!(
                "  - {table_name}.{column} must reference {target}"
            ));
        }
    }

    let audit_scope_nullable = ["job_id", "team_id"]
        .iter()
        .all(|column| tables["audit_events"].columns[*column].nullable);
    if !audit_scope_nullable {
        errors.push(String::from(
            "  - audit_events.job_id and audit_events.team_id must both be nullable",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(eyre!(
            "❌ Migration verification FAILED: Constraint mismatch\n{}",
            errors.join("\n")
        ))
    }
}

/// Compare the first and rebuilt schemas and fail on any difference
fn compare_schemas(applied: &Schema, reapplied: &Schema) -> Result<()> {
    let applied_tables: BTreeSet<_> = applied.tables.keys().collect();
    let reapplied_tables: BTreeSet<_> = reapplied.tables.keys().collect();

    if applied_tables != reapplied_tables {
        return Err(eyre!(
            "❌ Migration verification FAILED: re-applied tables differ\n  first: {applied_tables:?}\n  rebuilt: {reapplied_tables:?}"
        ));
    }

    for table_name in applied_tables {
        let first = &applied.tables[table_name];
        let rebuilt = &reapplied.tables[table_name];

        if first.columns != rebuilt.columns {
            return Err(eyre!(
                "❌ Migration verification FAILED: Column mismatch in table '{table_name}'\n  first: {:?}\n  rebuilt: {:?}",
                first.columns.values().collect::<Vec<_>>(),
                rebuilt.columns.values().collect::<Vec<_>>()
            ));
        }

        if first.primary_keys != rebuilt.primary_keys
            || first.foreign_keys != rebuilt.foreign_keys
            || first.unique_constraints != rebuilt.unique_constraints
        {
            return Err(eyre!(
                "❌ Migration verification FAILED: Key mismatch in table '{table_name}'"
            ));
        }

        if first.indexes != rebuilt.indexes {
            return Err(eyre!(
                "❌ Migration verification FAILED: Index mismatch in table '{table_name}'\n  first: {:?}\n  rebuilt: {:?}",
                first.indexes,
                rebuilt.indexes
            ));
        }
    }

    Ok(())
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
