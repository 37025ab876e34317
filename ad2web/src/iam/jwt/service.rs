// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{Claims, JwtError};
use crate::config::ValidatedConfig;
use crate::db::User;
use actix_web::cookie::time::OffsetDateTime;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

pub struct JwtService {
    secret: String,
    issuer: String,
    audience: String,
    expiration_hours: u64,
    cookie_name: String,
    is_localhost: bool,
}

impl JwtService {
    pub fn new(config: &ValidatedConfig) -> Self {
        let jwt_config = &config.auth.jwt;
        JwtService {
            secret: jwt_config.secret.clone(),
            issuer: jwt_config.issuer.clone(),
            audience: jwt_config.audience.clone(),
            expiration_hours: jwt_config.expiration_hours,
            cookie_name: jwt_config.cookie_name.clone(),
            is_localhost: config.is_localhost_only(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Create a JWT token for a user
    pub fn create_token(&self, user: &User) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.expiration_hours as i64);

        let claims = Claims {
            sub: user.name.clone(),
            uid: user.id,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            password_version: user.password_version,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| JwtError::TokenCreation(e.to_string()))
    }

    /// Verify a JWT token and return claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|e| JwtError::TokenVerification(e.to_string()))?;

        Ok(token_data.claims)
    }

    /// HTTP-only session cookie carrying the token. `Secure` is dropped only when
    /// every listener is on localhost.
    pub fn create_auth_cookie<'a>(&self, token: &str) -> Cookie<'a> {
        let expiration = Utc::now() + Duration::hours(self.expiration_hours as i64);
        let expires = match OffsetDateTime::from_unix_timestamp(expiration.timestamp()) {
            Ok(val) => val,
            Err(e) => {
                log::error!(
                    "Failed to convert expiration timestamp for auth cookie: {}",
                    e
                );
                OffsetDateTime::UNIX_EPOCH
            }
        };

        Cookie::build(self.cookie_name.clone(), token.to_string())
            .path("/")
            .secure(!self.is_localhost)
            .http_only(true)
            .same_site(SameSite::Lax)
            .expires(expires)
            .finish()
    }

    /// Create a cookie for logout (removes the JWT)
    pub fn create_logout_cookie<'a>(&self) -> Cookie<'a> {
        Cookie::build(self.cookie_name.clone(), "")
            .path("/")
            .secure(!self.is_localhost)
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .finish()
    }
}
