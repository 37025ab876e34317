// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};

use crate::db::users::DEFAULT_PASSWORD_VERSION;

fn default_password_version() -> u32 {
    DEFAULT_PASSWORD_VERSION
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // User name
    pub uid: i64,    // User id
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
    #[serde(default = "default_password_version")]
    pub password_version: u32, // Bumped on password change to revoke old tokens
}

#[derive(Debug, Clone)]
pub enum JwtError {
    TokenCreation(String),
    TokenVerification(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenCreation(msg) => write!(f, "Token creation error: {}", msg),
            JwtError::TokenVerification(msg) => write!(f, "Token verification error: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}
