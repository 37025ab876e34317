// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("database migration failed: {message}")]
    Migration { message: String },

    #[error("setting '{name}' holds an unreadable value: {source}")]
    SettingValue {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("{context}: blocking pool saturated")]
    Busy { context: &'static str },

    #[error("{context}: blocking task failed: {message}")]
    Blocking {
        context: &'static str,
        message: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_error_display_names_context() {
        let err = StoreError::Busy { context: "profile" };
        assert_eq!(err.to_string(), "profile: blocking pool saturated");
        assert!(err.is_busy());
    }

    #[test]
    fn from_rusqlite_error_maps_to_query() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(!err.is_busy());
    }
}
