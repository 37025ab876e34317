// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use super::error::StoreResult;

pub const DEFAULT_PASSWORD_VERSION: u32 = 1;
pub const DEFAULT_ADMIN_NAME: &str = "admin";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleCode {
    Admin,
    Staff,
    User,
}

impl RoleCode {
    pub fn code(self) -> i64 {
        match self {
            RoleCode::Admin => 0,
            RoleCode::Staff => 1,
            RoleCode::User => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RoleCode::Admin),
            1 => Some(RoleCode::Staff),
            2 => Some(RoleCode::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCode {
    Inactive,
    New,
    Active,
}

impl StatusCode {
    pub fn code(self) -> i64 {
        match self {
            StatusCode::Inactive => 0,
            StatusCode::New => 1,
            StatusCode::Active => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(StatusCode::Inactive),
            1 => Some(StatusCode::New),
            2 => Some(StatusCode::Active),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub password_version: u32,
    pub role_code: RoleCode,
    pub status_code: StatusCode,
    pub avatar: Option<String>,
    pub created_time: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role_code == RoleCode::Admin
    }

    pub fn is_active(&self) -> bool {
        self.status_code != StatusCode::Inactive
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserDetail {
    pub user_id: i64,
    pub gender_code: Option<i64>,
    pub age: Option<i64>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role_code: RoleCode,
    pub status_code: StatusCode,
}

/// Field changes submitted from the profile page. `avatar: None` keeps the current avatar.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: String,
    pub avatar: Option<String>,
    pub gender_code: Option<i64>,
    pub age: Option<i64>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, password_version, role_code, \
                            status_code, avatar, created_time";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: i64 = row.get(5)?;
    let status: i64 = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        password_version: row.get(4)?,
        role_code: RoleCode::from_code(role).ok_or_else(|| invalid_code(5, "role_code", role))?,
        status_code: StatusCode::from_code(status)
            .ok_or_else(|| invalid_code(6, "status_code", status))?,
        avatar: row.get(7)?,
        created_time: row.get(8)?,
    })
}

fn invalid_code(column: usize, name: &str, value: i64) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Integer,
        format!("invalid {} {}", name, value).into(),
    )
}

pub fn count(conn: &Connection) -> StoreResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}

pub fn find_by_name(conn: &Connection, name: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE name = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [name], row_to_user).optional()?)
}

pub fn find_by_id(conn: &Connection, id: i64) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    Ok(conn.query_row(&sql, [id], row_to_user).optional()?)
}

pub fn find_by_email(conn: &Connection, email: &str) -> StoreResult<Option<User>> {
    let sql = format!(
        "SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE",
        USER_COLUMNS
    );
    Ok(conn.query_row(&sql, [email], row_to_user).optional()?)
}

/// True when `email` belongs to a user other than `user_id`.
pub fn email_taken_by_other(conn: &Connection, email: &str, user_id: i64) -> StoreResult<bool> {
    Ok(find_by_email(conn, email)?.is_some_and(|user| user.id != user_id))
}

/// Detail record for a user; users created before their detail row exists get an empty one.
pub fn detail_for(conn: &Connection, user_id: i64) -> StoreResult<UserDetail> {
    let detail = conn
        .query_row(
            "SELECT user_id, gender_code, age, phone, url, location, bio
             FROM user_details WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(UserDetail {
                    user_id: row.get(0)?,
                    gender_code: row.get(1)?,
                    age: row.get(2)?,
                    phone: row.get(3)?,
                    url: row.get(4)?,
                    location: row.get(5)?,
                    bio: row.get(6)?,
                })
            },
        )
        .optional()?;
    Ok(detail.unwrap_or(UserDetail {
        user_id,
        ..UserDetail::default()
    }))
}

pub fn insert(conn: &mut Connection, user: &NewUser) -> StoreResult<i64> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO users (name, email, password_hash, password_version, role_code, status_code, created_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.name,
            user.email,
            user.password_hash,
            DEFAULT_PASSWORD_VERSION,
            user.role_code.code(),
            user.status_code.code(),
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO user_details (user_id, created_time) VALUES (?1, ?2)",
        params![id, now],
    )?;
    tx.commit()?;
    log::debug!("Inserted user {} with id {}", user.name, id);
    Ok(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileUpdateOutcome {
    Updated,
    /// Another user holds the email; nothing was written.
    EmailTaken,
}

/// Writes the user row and the detail row in one transaction. The email
/// uniqueness check runs inside the same transaction.
pub fn update_profile(
    conn: &mut Connection,
    user_id: i64,
    update: &ProfileUpdate,
) -> StoreResult<ProfileUpdateOutcome> {
    let tx = conn.transaction()?;
    if email_taken_by_other(&tx, &update.email, user_id)? {
        return Ok(ProfileUpdateOutcome::EmailTaken);
    }
    let written = match &update.avatar {
        Some(avatar) => tx.execute(
            "UPDATE users SET email = ?1, avatar = ?2 WHERE id = ?3",
            params![update.email, avatar, user_id],
        ),
        None => tx.execute(
            "UPDATE users SET email = ?1 WHERE id = ?2",
            params![update.email, user_id],
        ),
    };
    match written {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => return Ok(ProfileUpdateOutcome::EmailTaken),
        Err(err) => return Err(err.into()),
    }
    tx.execute(
        "INSERT INTO user_details (user_id, gender_code, age, phone, url, location, bio, created_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(user_id) DO UPDATE SET
            gender_code = excluded.gender_code,
            age = excluded.age,
            phone = excluded.phone,
            url = excluded.url,
            location = excluded.location,
            bio = excluded.bio",
        params![
            user_id,
            update.gender_code,
            update.age,
            update.phone,
            update.url,
            update.location,
            update.bio,
            Utc::now().to_rfc3339(),
        ],
    )?;
    tx.commit()?;
    Ok(ProfileUpdateOutcome::Updated)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Replaces the password hash and bumps the password version. Returns the new version.
pub fn update_password(conn: &mut Connection, user_id: i64, password_hash: &str) -> StoreResult<u32> {
    let tx = conn.transaction()?;
    tx.execute(
        "UPDATE users SET password_hash = ?1, password_version = password_version + 1 WHERE id = ?2",
        params![password_hash, user_id],
    )?;
    let version: u32 = tx.query_row(
        "SELECT password_version FROM users WHERE id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    tx.commit()?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::initialize_schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().expect("memory db");
        initialize_schema(&conn).expect("schema");
        conn
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role_code: RoleCode::User,
            status_code: StatusCode::Active,
        }
    }

    #[test]
    fn insert_and_find_by_name() {
        let mut conn = conn();
        let id = insert(&mut conn, &new_user("alice", "alice@example.com")).expect("insert");
        let user = find_by_name(&conn, "alice").expect("query").expect("user");
        assert_eq!(user.id, id);
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role_code, RoleCode::User);
        assert_eq!(user.password_version, DEFAULT_PASSWORD_VERSION);
        assert!(user.avatar.is_none());
        assert!(find_by_name(&conn, "bob").expect("query").is_none());
    }

    #[test]
    fn email_taken_ignores_own_record() {
        let mut conn = conn();
        let alice = insert(&mut conn, &new_user("alice", "alice@example.com")).expect("insert");
        let bob = insert(&mut conn, &new_user("bob", "bob@example.com")).expect("insert");
        assert!(!email_taken_by_other(&conn, "alice@example.com", alice).expect("query"));
        assert!(email_taken_by_other(&conn, "ALICE@example.com", bob).expect("query"));
        assert!(!email_taken_by_other(&conn, "new@example.com", bob).expect("query"));
    }

    #[test]
    fn update_profile_writes_user_and_detail() {
        let mut conn = conn();
        let id = insert(&mut conn, &new_user("alice", "alice@example.com")).expect("insert");
        let update = ProfileUpdate {
            email: "alice@new.example.com".to_string(),
            avatar: Some("abc_2026-01-01.png".to_string()),
            gender_code: Some(2),
            age: Some(33),
            phone: Some("555-0100".to_string()),
            url: None,
            location: Some("Lisbon".to_string()),
            bio: Some("hello".to_string()),
        };
        let outcome = update_profile(&mut conn, id, &update).expect("update");
        assert_eq!(outcome, ProfileUpdateOutcome::Updated);

        let user = find_by_id(&conn, id).expect("query").expect("user");
        assert_eq!(user.email, "alice@new.example.com");
        assert_eq!(user.avatar.as_deref(), Some("abc_2026-01-01.png"));

        let detail = detail_for(&conn, id).expect("detail");
        assert_eq!(detail.gender_code, Some(2));
        assert_eq!(detail.age, Some(33));
        assert_eq!(detail.location.as_deref(), Some("Lisbon"));
    }

    #[test]
    fn update_profile_without_avatar_keeps_existing() {
        let mut conn = conn();
        let id = insert(&mut conn, &new_user("alice", "alice@example.com")).expect("insert");
        let mut update = ProfileUpdate {
            email: "alice@example.com".to_string(),
            avatar: Some("first.png".to_string()),
            ..ProfileUpdate::default()
        };
        update_profile(&mut conn, id, &update).expect("first");
        update.avatar = None;
        update_profile(&mut conn, id, &update).expect("second");
        let user = find_by_id(&conn, id).expect("query").expect("user");
        assert_eq!(user.avatar.as_deref(), Some("first.png"));
    }

    #[test]
    fn update_profile_refuses_email_of_other_user() {
        let mut conn = conn();
        insert(&mut conn, &new_user("alice", "alice@example.com")).expect("insert");
        let bob = insert(&mut conn, &new_user("bob", "bob@example.com")).expect("insert");
        let update = ProfileUpdate {
            email: "Alice@Example.com".to_string(),
            location: Some("Porto".to_string()),
            ..ProfileUpdate::default()
        };

        let outcome = update_profile(&mut conn, bob, &update).expect("update");
        assert_eq!(outcome, ProfileUpdateOutcome::EmailTaken);
        let user = find_by_id(&conn, bob).expect("query").expect("user");
        assert_eq!(user.email, "bob@example.com");
        assert!(detail_for(&conn, bob).expect("detail").location.is_none());
    }

    #[test]
    fn email_uniqueness_ignores_case() {
        let mut conn = conn();
        insert(&mut conn, &new_user("alice", "alice@example.com")).expect("insert");
        let err = insert(&mut conn, &new_user("bob", "ALICE@example.com"))
            .expect_err("duplicate email");
        assert!(matches!(err, crate::db::StoreError::Query(ref e) if is_unique_violation(e)));
    }

    #[test]
    fn update_password_bumps_version() {
        let mut conn = conn();
        let id = insert(&mut conn, &new_user("alice", "alice@example.com")).expect("insert");
        let version = update_password(&mut conn, id, "new-hash").expect("update");
        assert_eq!(version, DEFAULT_PASSWORD_VERSION + 1);
        let user = find_by_id(&conn, id).expect("query").expect("user");
        assert_eq!(user.password_hash, "new-hash");
    }

    #[test]
    fn detail_for_missing_row_is_empty() {
        let conn = conn();
        let detail = detail_for(&conn, 42).expect("detail");
        assert_eq!(detail.user_id, 42);
        assert!(detail.age.is_none());
    }
}
