// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::iam::AuthRequest;
use actix_web::HttpRequest;
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

const CSRF_TOKEN_EXPIRY_SECONDS: u64 = 3600;

/// Hidden form field carrying the token.
pub const CSRF_FIELD_NAME: &str = "csrf_token";

#[derive(Clone, Debug)]
struct CsrfTokenData {
    created_at: Instant,
    jwt_id: String,
}

/// Form tokens bound to a session's JWT id. State lives on a dedicated worker
/// thread; handles talk to it over a channel.
#[derive(Clone)]
pub struct CsrfTokenStore {
    sender: mpsc::Sender<CsrfCommand>,
}

enum CsrfCommand {
    GetOrRefresh {
        jwt_id: String,
        reply: mpsc::Sender<String>,
    },
    ValidateAndRenew {
        token_value: String,
        jwt_id: String,
        reply: mpsc::Sender<bool>,
    },
    CleanupTokens {
        jwt_id: String,
    },
    #[cfg(test)]
    SnapshotJwtIds {
        reply: mpsc::Sender<HashMap<String, String>>,
    },
}

/// Token for the session behind `req`, or an empty string for anonymous requests.
pub fn issue_csrf_token(req: &HttpRequest, csrf_store: &CsrfTokenStore) -> String {
    match req.jwt_id() {
        Some(jwt_id) => csrf_store.get_or_refresh_token(&jwt_id),
        None => String::new(),
    }
}

/// Checks a submitted form token against the session behind `req`.
pub fn validate_csrf_token(req: &HttpRequest, csrf_store: &CsrfTokenStore, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    match req.jwt_id() {
        Some(jwt_id) => csrf_store.validate_and_renew_token(token, &jwt_id),
        None => false,
    }
}

impl Default for CsrfTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrfTokenStore {
    pub fn new() -> Self {
        CsrfTokenStore {
            sender: start_csrf_worker(),
        }
    }

    pub fn expiry_seconds(&self) -> u64 {
        CSRF_TOKEN_EXPIRY_SECONDS
    }

    fn generate_new_token_value() -> String {
        Uuid::new_v4().to_string()
    }

    fn request<T>(&self, build: impl FnOnce(mpsc::Sender<T>) -> CsrfCommand, fallback: T) -> T {
        let (reply, receive) = mpsc::channel();
        if self.sender.send(build(reply)).is_err() {
            log::error!("CsrfTokenStore channel closed");
            return fallback;
        }
        receive.recv().unwrap_or(fallback)
    }

    /// Validates a token against the JWT id. A valid token is renewed, a token
    /// presented with the wrong JWT id is dropped.
    pub fn validate_and_renew_token(&self, token_value: &str, jwt_id: &str) -> bool {
        self.request(
            |reply| CsrfCommand::ValidateAndRenew {
                token_value: token_value.to_string(),
                jwt_id: jwt_id.to_string(),
                reply,
            },
            false,
        )
    }

    /// Clean up all tokens associated with a specific JWT ID (for logout)
    pub fn cleanup_tokens_for_jwt_id(&self, jwt_id: &str) {
        if self
            .sender
            .send(CsrfCommand::CleanupTokens {
                jwt_id: jwt_id.to_string(),
            })
            .is_err()
        {
            log::error!("CsrfTokenStore channel closed");
        }
    }

    /// Returns the live token for the JWT id, creating one if needed.
    pub fn get_or_refresh_token(&self, jwt_id: &str) -> String {
        self.request(
            |reply| CsrfCommand::GetOrRefresh {
                jwt_id: jwt_id.to_string(),
                reply,
            },
            String::new(),
        )
    }

    #[cfg(test)]
    fn snapshot_jwt_ids(&self) -> HashMap<String, String> {
        self.request(
            |reply| CsrfCommand::SnapshotJwtIds { reply },
            HashMap::new(),
        )
    }
}

fn start_csrf_worker() -> mpsc::Sender<CsrfCommand> {
    let (sender, receiver) = mpsc::channel();
    let thread = thread::Builder::new().name("csrf-token-store".to_string());
    if let Err(err) = thread.spawn(move || run_csrf_worker(receiver)) {
        log::error!("CsrfTokenStore worker failed to start: {}", err);
    }
    sender
}

fn run_csrf_worker(receiver: mpsc::Receiver<CsrfCommand>) {
    let mut tokens: HashMap<String, CsrfTokenData> = HashMap::new();
    while let Ok(command) = receiver.recv() {
        let now = Instant::now();
        cleanup_expired_tokens(&mut tokens, now);
        match command {
            CsrfCommand::GetOrRefresh { jwt_id, reply } => {
                let existing = tokens
                    .iter_mut()
                    .find(|(_, data)| data.jwt_id == jwt_id)
                    .map(|(token_value, data)| {
                        data.created_at = now;
                        token_value.clone()
                    });

                let token_value = existing.unwrap_or_else(|| {
                    let new_token_value = CsrfTokenStore::generate_new_token_value();
                    tokens.insert(
                        new_token_value.clone(),
                        CsrfTokenData {
                            created_at: now,
                            jwt_id: jwt_id.clone(),
                        },
                    );
                    log::debug!("Created new CSRF token for JWT ID: {}", jwt_id);
                    new_token_value
                });

                let _ = reply.send(token_value);
            }
            CsrfCommand::ValidateAndRenew {
                token_value,
                jwt_id,
                reply,
            } => {
                let is_valid = match tokens.get_mut(&token_value) {
                    Some(token_data) if token_data.jwt_id == jwt_id => {
                        token_data.created_at = now;
                        true
                    }
                    Some(token_data) => {
                        log::warn!(
                            "CSRF token JWT ID mismatch. Expected: {}, Got: {}",
                            token_data.jwt_id,
                            jwt_id
                        );
                        tokens.remove(&token_value);
                        false
                    }
                    None => false,
                };
                let _ = reply.send(is_valid);
            }
            CsrfCommand::CleanupTokens { jwt_id } => {
                tokens.retain(|_, token_data| token_data.jwt_id != jwt_id);
                log::debug!("Cleaned up CSRF tokens for JWT ID: {}", jwt_id);
            }
            #[cfg(test)]
            CsrfCommand::SnapshotJwtIds { reply } => {
                let snapshot = tokens
                    .iter()
                    .map(|(token, data)| (token.clone(), data.jwt_id.clone()))
                    .collect();
                let _ = reply.send(snapshot);
            }
        }
    }
}

fn cleanup_expired_tokens(tokens: &mut HashMap<String, CsrfTokenData>, now: Instant) {
    tokens.retain(|_, token_data| {
        now.duration_since(token_data.created_at) < Duration::from_secs(CSRF_TOKEN_EXPIRY_SECONDS)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_refresh_reuses_token_per_session() {
        let store = CsrfTokenStore::new();
        let first = store.get_or_refresh_token("session-a");
        let second = store.get_or_refresh_token("session-a");
        let other = store.get_or_refresh_token("session-b");

        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.len(), 36);
    }

    #[test]
    fn valid_token_is_renewed_not_consumed() {
        let store = CsrfTokenStore::new();
        let token = store.get_or_refresh_token("session");
        assert!(store.validate_and_renew_token(&token, "session"));
        assert!(store.validate_and_renew_token(&token, "session"));
        assert!(store.snapshot_jwt_ids().contains_key(&token));
    }

    #[test]
    fn wrong_session_drops_token() {
        let store = CsrfTokenStore::new();
        let token = store.get_or_refresh_token("session");
        assert!(!store.validate_and_renew_token(&token, "intruder"));
        assert!(!store.snapshot_jwt_ids().contains_key(&token));
        assert!(!store.validate_and_renew_token(&token, "session"));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let store = CsrfTokenStore::new();
        assert!(!store.validate_and_renew_token("not-issued", "session"));
    }

    #[test]
    fn cleanup_removes_only_that_session() {
        let store = CsrfTokenStore::new();
        let first = store.get_or_refresh_token("session-a");
        let second = store.get_or_refresh_token("session-b");

        store.cleanup_tokens_for_jwt_id("session-a");

        assert!(!store.validate_and_renew_token(&first, "session-a"));
        assert!(store.validate_and_renew_token(&second, "session-b"));
        assert_ne!(store.get_or_refresh_token("session-a"), first);
    }

    #[test]
    fn expired_tokens_are_purged() {
        let now = Instant::now();
        let mut tokens = HashMap::new();
        if let Some(old) = now.checked_sub(Duration::from_secs(CSRF_TOKEN_EXPIRY_SECONDS + 1)) {
            tokens.insert(
                "old".to_string(),
                CsrfTokenData {
                    created_at: old,
                    jwt_id: "session".to_string(),
                },
            );
        }
        tokens.insert(
            "fresh".to_string(),
            CsrfTokenData {
                created_at: now,
                jwt_id: "session".to_string(),
            },
        );

        cleanup_expired_tokens(&mut tokens, now);
        assert!(!tokens.contains_key("old"));
        assert!(tokens.contains_key("fresh"));
    }

    #[test]
    fn anonymous_requests_get_no_token() {
        let store = CsrfTokenStore::new();
        let req = actix_web::test::TestRequest::default().to_http_request();
        assert_eq!(issue_csrf_token(&req, &store), "");
        assert!(!validate_csrf_token(&req, &store, "anything"));
    }
}
