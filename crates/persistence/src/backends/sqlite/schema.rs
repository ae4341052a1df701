//! SQLite schema definitions.

use rusqlite::Connection;

use crate::error::StoreResult;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initializes the database schema, creating tables as needed.
pub fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    if version.is_none() {
        create_schema_v1(conn)?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
    }

    Ok(())
}

fn create_schema_v1(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id TEXT NOT NULL,
            priority TEXT NOT NULL,
            name TEXT NOT NULL,
            action TEXT NOT NULL,
            sources TEXT NOT NULL,
            destinations TEXT NOT NULL,
            created_at TEXT NOT NULL,
            last_modified TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_rules_tenant ON rules (tenant_id)",
        [],
    )?;

    Ok(())
}
