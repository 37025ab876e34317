// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action, log_warning};
use crate::config::ValidatedConfig;
use crate::db::users::{self, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_NAME};
use crate::db::{Database, NewUser, RoleCode, StatusCode};
use crate::iam::password::{generate_password, hash_password};

const ADMIN_PASSWORD_LENGTH: usize = 16;

/// Creates the `admin` account when the user table is empty. Returns whether it was created.
pub fn ensure_admin(db: &Database, config: &ValidatedConfig) -> Result<bool, BootstrapError> {
    if db.with_connection(|conn| users::count(conn))? > 0 {
        return Ok(false);
    }

    let password = generate_password(ADMIN_PASSWORD_LENGTH);
    let password_hash = hash_password(&password, &config.auth.password)?;

    let admin = NewUser {
        name: DEFAULT_ADMIN_NAME.to_string(),
        email: DEFAULT_ADMIN_EMAIL.to_string(),
        password_hash,
        role_code: RoleCode::Admin,
        status_code: StatusCode::Active,
    };
    db.with_connection(|conn| users::insert(conn, &admin))?;

    log_action(format!("created user {}", DEFAULT_ADMIN_NAME));
    log_warning(format!(
        "{} password: {} (change this immediately)",
        DEFAULT_ADMIN_NAME, password
    ));

    Ok(true)
}
