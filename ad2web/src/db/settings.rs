// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};

/// Typed value of a named setting, stored as JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(value) => Some(*value),
            SettingValue::Text(text) => text.trim().parse().ok(),
            SettingValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(value) => Some(*value),
            SettingValue::Int(value) => Some(*value != 0),
            SettingValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            SettingValue::Text(text) => text.clone(),
            SettingValue::Int(value) => value.to_string(),
            SettingValue::Bool(value) => value.to_string(),
        }
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub name: String,
    pub value: SettingValue,
}

pub fn get_by_name(conn: &Connection, name: &str) -> StoreResult<Option<Setting>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|raw| {
        serde_json::from_str(&raw)
            .map(|value| Setting {
                name: name.to_string(),
                value,
            })
            .map_err(|source| StoreError::SettingValue {
                name: name.to_string(),
                source,
            })
    })
    .transpose()
}

/// Value of a setting, or `None` when it has never been stored.
pub fn value_of(conn: &Connection, name: &str) -> StoreResult<Option<SettingValue>> {
    Ok(get_by_name(conn, name)?.map(|setting| setting.value))
}

pub fn set(conn: &Connection, name: &str, value: &SettingValue) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::SettingValue {
        name: name.to_string(),
        source,
    })?;
    conn.execute(
        "INSERT INTO settings (name, value) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value",
        params![name, raw],
    )?;
    Ok(())
}

/// Stores every pair or none of them.
pub fn set_many(conn: &mut Connection, values: &[(&str, SettingValue)]) -> StoreResult<()> {
    let tx = conn.transaction()?;
    for (name, value) in values {
        set(&tx, name, value)?;
    }
    tx.commit()?;
    Ok(())
}
