// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use ad2web::app_state::AppState;
use ad2web::config::ValidatedConfig;
use ad2web::db::{Database, NewUser, RoleCode, StatusCode, User, users};
use ad2web::iam::password::hash_password;
use ad2web::iam::{JwtAuthMiddlewareFactory, UserServices};
use ad2web::runtime_paths::RuntimePaths;
use ad2web::util::test_config::TEST_PASSWORD_PARAMS;
use ad2web::util::test_fixtures::TestFixtureRoot;
use ad2web::util::{CsrfTokenStore, TestConfigBuilder};
use std::sync::Arc;

pub const ADMIN_NAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const USER_NAME: &str = "alice";
pub const USER_EMAIL: &str = "alice@example.com";
pub const USER_PASSWORD: &str = "alice-password";
pub const SESSION_COOKIE: &str = "ad2web_session";

const MULTIPART_BOUNDARY: &str = "ad2web-test-boundary";

pub struct TestHarness {
    pub fixture: TestFixtureRoot,
    pub config: Arc<ValidatedConfig>,
    pub runtime_paths: RuntimePaths,
    pub database: Database,
    pub app_state: Arc<AppState>,
    pub user_services: Arc<UserServices>,
    pub csrf_store: Arc<CsrfTokenStore>,
    pub admin_user: User,
    pub normal_user: User,
}

pub struct AuthSession {
    pub user: User,
    pub jwt_token: String,
    pub jwt_id: String,
    pub cookie: Cookie<'static>,
    pub csrf_token: String,
}

impl TestHarness {
    pub fn new(prefix: &str) -> Self {
        Self::with_config(prefix, TestConfigBuilder::new().build())
    }

    pub fn with_config(prefix: &str, config: ValidatedConfig) -> Self {
        let fixture = TestFixtureRoot::new_unique(prefix).expect("fixture root");
        let config = Arc::new(config);
        let runtime_paths = fixture.runtime_paths(&config).expect("runtime paths");
        let database = Database::open(&runtime_paths.database_file).expect("database");

        let admin_user = seed_user(
            &database,
            ADMIN_NAME,
            ADMIN_EMAIL,
            ADMIN_PASSWORD,
            RoleCode::Admin,
        );
        let normal_user = seed_user(
            &database,
            USER_NAME,
            USER_EMAIL,
            USER_PASSWORD,
            RoleCode::User,
        );

        let user_services =
            Arc::new(UserServices::new(&config, database.clone()).expect("user services"));
        let app_state = Arc::new(AppState::new(
            &config.app.name,
            runtime_paths.clone(),
            database.clone(),
        ));
        let csrf_store = Arc::new(CsrfTokenStore::new());

        Self {
            fixture,
            config,
            runtime_paths,
            database,
            app_state,
            user_services,
            csrf_store,
            admin_user,
            normal_user,
        }
    }

    pub fn admin_auth(&self) -> AuthSession {
        self.session_for(&self.admin_user)
    }

    pub fn user_auth(&self) -> AuthSession {
        self.session_for(&self.normal_user)
    }

    pub fn session_for(&self, user: &User) -> AuthSession {
        let jwt_service = self.user_services.jwt_service();
        let token = jwt_service.create_token(user).expect("jwt token");
        let claims = jwt_service.verify_token(&token).expect("jwt claims");
        let cookie = jwt_service.create_auth_cookie(&token).into_owned();
        let csrf_token = self.csrf_store.get_or_refresh_token(&claims.jti);

        AuthSession {
            user: user.clone(),
            jwt_token: token,
            jwt_id: claims.jti,
            cookie,
            csrf_token,
        }
    }

    /// Reads a user back from the database.
    pub fn reload_user(&self, name: &str) -> User {
        self.database
            .with_connection(|conn| users::find_by_name(conn, name))
            .expect("query user")
            .expect("user exists")
    }
}

fn seed_user(db: &Database, name: &str, email: &str, password: &str, role: RoleCode) -> User {
    let new_user = NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password, &TEST_PASSWORD_PARAMS).expect("hash"),
        role_code: role,
        status_code: StatusCode::Active,
    };
    db.with_connection(|conn| {
        let id = users::insert(conn, &new_user)?;
        users::find_by_id(conn, id)
    })
    .expect("insert user")
    .expect("user inserted")
}

pub fn build_test_app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::from(harness.config.clone()))
        .app_data(web::Data::from(harness.app_state.clone()))
        .app_data(web::Data::from(harness.user_services.clone()))
        .app_data(web::Data::from(harness.csrf_store.clone()))
        .wrap(JwtAuthMiddlewareFactory)
        .configure(ad2web::configure)
}

pub fn with_session(req: test::TestRequest, session: &AuthSession) -> test::TestRequest {
    req.cookie(session.cookie.clone())
}

/// Builds a `multipart/form-data` body from text fields and an optional
/// `(field, filename, bytes)` file part.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    (
        format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        body,
    )
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn response_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.into_owned())
}

pub async fn body_text<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
