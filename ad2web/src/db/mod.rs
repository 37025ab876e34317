// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! SQLite persistence for users, user details and key-value settings.
//!
//! A single connection is shared behind a mutex. Async callers go through
//! [`Database::call`], which runs the closure on the blocking pool so request
//! handlers never hold the connection on an executor thread.

mod blocking;
mod error;
pub mod migrations;
mod schema;
pub mod settings;
pub mod users;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub use blocking::BlockingPool;
pub use error::{StoreError, StoreResult};
pub use settings::{Setting, SettingValue};
pub use users::{
    NewUser, ProfileUpdate, ProfileUpdateOutcome, RoleCode, StatusCode, User, UserDetail,
};

#[derive(Clone)]
pub struct Database {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
    pool: BlockingPool,
}

impl Database {
    /// Opens (creating if needed) the database file and brings the schema up to date.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| StoreError::Open {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;
        log::info!("Database opened at {}", path.display());
        Ok(Self::from_connection(path, conn))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self::from_connection(PathBuf::from(":memory:"), conn))
    }

    fn from_connection(path: PathBuf, conn: Connection) -> Self {
        Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
            pool: BlockingPool::default_pool(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `task` against the connection on the blocking pool, waiting for a
    /// free worker when all are taken.
    pub async fn call<F, R>(&self, context: &'static str, task: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Connection) -> StoreResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.conn.clone();
        self.pool
            .run_queued(context, move || {
                let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
                task(&mut guard)
            })
            .await?
    }

    /// Synchronous access for startup code and tests that run outside the executor.
    pub fn with_connection<F, R>(&self, task: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Connection) -> StoreResult<R>,
    {
        let mut guard = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        task(&mut guard)
    }
}
