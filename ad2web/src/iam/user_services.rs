// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::jwt::{Claims, JwtError, JwtService};
use super::password::{PasswordError, hash_password, verify_password};
use crate::config::{PasswordHashingParams, ValidatedConfig};
use crate::db::{BlockingPool, Database, StoreError, User, users};
use std::fmt;

/// Account operations shared by the login, session and password handlers.
pub struct UserServices {
    db: Database,
    hash_pool: BlockingPool,
    jwt_service: JwtService,
    password_params: PasswordHashingParams,
    dummy_stored_hash: String,
}

pub type UserServiceResult<T> = Result<T, UserServiceError>;

#[derive(Debug)]
pub enum UserServiceError {
    NotFound(i64),
    Store(StoreError),
    Password(PasswordError),
    Jwt(JwtError),
}

impl fmt::Display for UserServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserServiceError::NotFound(id) => write!(f, "User {} not found", id),
            UserServiceError::Store(err) => write!(f, "{}", err),
            UserServiceError::Password(err) => write!(f, "{}", err),
            UserServiceError::Jwt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for UserServiceError {}

impl From<StoreError> for UserServiceError {
    fn from(err: StoreError) -> Self {
        UserServiceError::Store(err)
    }
}

impl From<PasswordError> for UserServiceError {
    fn from(err: PasswordError) -> Self {
        UserServiceError::Password(err)
    }
}

impl From<JwtError> for UserServiceError {
    fn from(err: JwtError) -> Self {
        UserServiceError::Jwt(err)
    }
}

impl UserServices {
    pub fn new(config: &ValidatedConfig, db: Database) -> UserServiceResult<Self> {
        let password_params = config.auth.password;
        // Verified against for unknown names so both login paths cost the same.
        let dummy_stored_hash = hash_password("dummy-password", &password_params)?;
        Ok(UserServices {
            db,
            hash_pool: BlockingPool::default_pool(),
            jwt_service: JwtService::new(config),
            password_params,
            dummy_stored_hash,
        })
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn password_params(&self) -> &PasswordHashingParams {
        &self.password_params
    }

    pub async fn find_by_name(&self, name: &str) -> UserServiceResult<Option<User>> {
        let name = name.to_string();
        Ok(self
            .db
            .call("find user by name", move |conn| users::find_by_name(conn, &name))
            .await?)
    }

    /// Returns the user when the name exists, the password matches and the
    /// account is not inactive.
    pub async fn authenticate(&self, name: &str, password: &str) -> UserServiceResult<Option<User>> {
        let user = self.find_by_name(name).await?;
        let stored_hash = user
            .as_ref()
            .map(|user| user.password_hash.clone())
            .unwrap_or_else(|| self.dummy_stored_hash.clone());

        let valid = self.verify_in_background(password.to_string(), stored_hash).await?;
        match user {
            Some(user) if valid => {
                if !user.is_active() {
                    log::warn!("Login refused for inactive user {}", user.name);
                    return Ok(None);
                }
                Ok(Some(user))
            }
            _ => Ok(None),
        }
    }

    pub async fn check_password(&self, user: &User, password: &str) -> UserServiceResult<bool> {
        self.verify_in_background(password.to_string(), user.password_hash.clone())
            .await
    }

    /// Stores a new hash, bumps the password version and returns the updated user.
    pub async fn change_password(&self, user_id: i64, new_password: &str) -> UserServiceResult<User> {
        let params = self.password_params;
        let new_password = new_password.to_string();
        let hash = self
            .hash_pool
            .run_blocking("hash password", move || hash_password(&new_password, &params))
            .await??;

        let user = self
            .db
            .call("update password", move |conn| {
                users::update_password(conn, user_id, &hash)?;
                users::find_by_id(conn, user_id)
            })
            .await?;
        let user = user.ok_or(UserServiceError::NotFound(user_id))?;
        log::info!(
            "Password updated for user {} (version {})",
            user.name,
            user.password_version
        );
        Ok(user)
    }

    /// Argon2 verification runs on the hashing pool, which refuses work when saturated.
    async fn verify_in_background(
        &self,
        password: String,
        stored_hash: String,
    ) -> UserServiceResult<bool> {
        let valid = self
            .hash_pool
            .run_blocking("verify password", move || {
                verify_password(&password, &stored_hash)
            })
            .await??;
        Ok(valid)
    }

    /// Resolves a session token to its still-valid user. Tokens issued before the
    /// last password change and tokens of inactive users are rejected.
    pub async fn validate_jwt(&self, token: &str) -> Option<(User, Claims)> {
        let claims = self.jwt_service.verify_token(token).ok()?;
        let uid = claims.uid;
        let user = match self
            .db
            .call("load session user", move |conn| users::find_by_id(conn, uid))
            .await
        {
            Ok(user) => user?,
            Err(err) => {
                log::error!("Failed to load session user {}: {}", claims.sub, err);
                return None;
            }
        };

        if user.name != claims.sub {
            log::warn!("JWT subject mismatch for user id {}", uid);
            return None;
        }
        if user.password_version != claims.password_version {
            log::warn!("JWT password version mismatch for user {}", claims.sub);
            return None;
        }
        if !user.is_active() {
            log::warn!("JWT presented for inactive user {}", claims.sub);
            return None;
        }
        Some((user, claims))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, RoleCode, StatusCode};
    use crate::util::test_config::test_config;

    fn services_with_user(status: StatusCode) -> (UserServices, i64) {
        let config = test_config();
        let db = Database::open_in_memory().expect("db");
        let hash = hash_password("secret-pass", &config.auth.password).expect("hash");
        let id = db
            .with_connection(|conn| {
                users::insert(
                    conn,
                    &NewUser {
                        name: "alice".to_string(),
                        email: "alice@example.com".to_string(),
                        password_hash: hash,
                        role_code: RoleCode::User,
                        status_code: status,
                    },
                )
            })
            .expect("insert");
        (UserServices::new(&config, db).expect("services"), id)
    }

    #[tokio::test]
    async fn authenticate_accepts_correct_password() {
        let (services, id) = services_with_user(StatusCode::Active);
        let user = services
            .authenticate("alice", "secret-pass")
            .await
            .expect("authenticate");
        assert_eq!(user.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_password_and_unknown_name() {
        let (services, _) = services_with_user(StatusCode::Active);
        assert!(
            services
                .authenticate("alice", "wrong-pass")
                .await
                .expect("authenticate")
                .is_none()
        );
        assert!(
            services
                .authenticate("bob", "secret-pass")
                .await
                .expect("authenticate")
                .is_none()
        );
    }

    #[tokio::test]
    async fn authenticate_rejects_inactive_user() {
        let (services, _) = services_with_user(StatusCode::Inactive);
        assert!(
            services
                .authenticate("alice", "secret-pass")
                .await
                .expect("authenticate")
                .is_none()
        );
    }

    #[tokio::test]
    async fn validate_jwt_accepts_matching_password_version() {
        let (services, id) = services_with_user(StatusCode::Active);
        let user = services
            .database()
            .with_connection(|conn| users::find_by_id(conn, id))
            .expect("query")
            .expect("user");
        let token = services.jwt_service().create_token(&user).expect("token");

        let (session_user, claims) = services.validate_jwt(&token).await.expect("session");
        assert_eq!(session_user.id, id);
        assert_eq!(claims.sub, "alice");
    }

    #[tokio::test]
    async fn validate_jwt_survives_concurrent_sessions() {
        let (services, id) = services_with_user(StatusCode::Active);
        let user = services
            .database()
            .with_connection(|conn| users::find_by_id(conn, id))
            .expect("query")
            .expect("user");
        let token = services.jwt_service().create_token(&user).expect("token");
        let services = std::sync::Arc::new(services);

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let services = services.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                services.validate_jwt(&token).await.map(|(user, _)| user.id)
            }));
        }
        for task in tasks {
            assert_eq!(task.await.expect("join"), Some(id));
        }
    }

    #[tokio::test]
    async fn change_password_revokes_old_tokens() {
        let (services, id) = services_with_user(StatusCode::Active);
        let user = services
            .database()
            .with_connection(|conn| users::find_by_id(conn, id))
            .expect("query")
            .expect("user");
        let old_token = services.jwt_service().create_token(&user).expect("token");

        let updated = services
            .change_password(id, "brand-new-pass")
            .await
            .expect("change password");
        assert_eq!(updated.password_version, user.password_version + 1);
        assert!(services.validate_jwt(&old_token).await.is_none());
        assert!(
            services
                .check_password(&updated, "brand-new-pass")
                .await
                .expect("check")
        );

        let new_token = services.jwt_service().create_token(&updated).expect("token");
        assert!(services.validate_jwt(&new_token).await.is_some());
    }
}
