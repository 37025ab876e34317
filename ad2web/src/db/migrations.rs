// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use rusqlite::Connection;

use super::error::{StoreError, StoreResult};
use super::schema::SCHEMA_STATEMENTS;

pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Creates missing tables, then runs pending migrations up to `CURRENT_VERSION`.
pub fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(StoreError::Migration {
            message: format!(
                "database schema version {} is newer than supported version {}",
                version, CURRENT_VERSION
            ),
        });
    }

    let mut current = version;
    while current < CURRENT_VERSION {
        current += 1;
        run_migration(conn, current)?;
    }
    if version != CURRENT_VERSION {
        set_schema_version(conn, CURRENT_VERSION)?;
        log::info!(
            "Database schema migrated from version {} to {}",
            version,
            CURRENT_VERSION
        );
    }
    Ok(())
}

pub fn schema_version(conn: &Connection) -> StoreResult<i32> {
    let result: Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| StoreError::Migration {
            message: format!("invalid schema version: {}", value),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> StoreResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> StoreResult<()> {
    match version {
        // Version 1 is the base schema.
        1 => set_schema_version(conn, 1),
        _ => Err(StoreError::Migration {
            message: format!("unknown migration version: {}", version),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().expect("memory db");
        initialize_schema(&conn).expect("schema");
        assert_eq!(schema_version(&conn).expect("version"), CURRENT_VERSION);
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().expect("memory db");
        initialize_schema(&conn).expect("first");
        initialize_schema(&conn).expect("second");
        assert_eq!(schema_version(&conn).expect("version"), CURRENT_VERSION);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().expect("memory db");
        initialize_schema(&conn).expect("schema");
        set_schema_version(&conn, CURRENT_VERSION + 1).expect("bump");
        let err = initialize_schema(&conn).expect_err("newer schema");
        assert!(matches!(err, StoreError::Migration { .. }));
    }
}
