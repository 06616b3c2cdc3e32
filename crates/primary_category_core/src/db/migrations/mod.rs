//! Schema upgrades for the reference host database.
//!
//! # Invariants
//! - Script `n` in `SCRIPTS` (1-based) brings the schema to version `n`;
//!   scripts are append-only.
//! - `PRAGMA user_version` moves with each script inside one transaction, so
//!   a failed upgrade leaves the previous version in place.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

const SCRIPTS: [&str; 3] = [
    include_str!("0001_content_terms.sql"),
    include_str!("0002_item_meta.sql"),
    include_str!("0003_transients.sql"),
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    SCRIPTS.len() as u32
}

/// Runs every script newer than the database's `user_version`.
///
/// Databases written by a newer build are refused untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let applied: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let latest = latest_version();
    if applied > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: applied,
            latest_supported: latest,
        });
    }

    let pending = &SCRIPTS[applied as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, script) in (applied + 1..).zip(pending) {
        tx.execute_batch(script)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={applied} to_version={latest}");
    Ok(())
}
