// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{SESSION_COOKIE, body_text, build_test_app, location, response_cookie, with_session};

#[actix_web::test]
async fn login_page_renders_form_with_next() {
    let harness = common::TestHarness::new("login-page");
    let app = test::init_service(build_test_app(&harness)).await;

    let req = test::TestRequest::get()
        .uri("/login?next=%2Fsettings%2Fpassword")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.contains("name=\"password\""));
    assert!(body.contains("value=\"/settings/password\""));
}

#[actix_web::test]
async fn login_with_valid_credentials_sets_cookie_and_redirects() {
    let harness = common::TestHarness::new("login-success");
    let app = test::init_service(build_test_app(&harness)).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([
            ("name", common::USER_NAME),
            ("password", common::USER_PASSWORD),
            ("next", "/settings/password"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/settings/password");

    let cookie = response_cookie(&resp, SESSION_COOKIE).expect("session cookie");
    assert!(cookie.http_only().unwrap_or(false));
    let claims = harness
        .user_services
        .jwt_service()
        .verify_token(cookie.value())
        .expect("valid token");
    assert_eq!(claims.sub, common::USER_NAME);
}

#[actix_web::test]
async fn login_ignores_offsite_next() {
    let harness = common::TestHarness::new("login-offsite");
    let app = test::init_service(build_test_app(&harness)).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([
            ("name", common::USER_NAME),
            ("password", common::USER_PASSWORD),
            ("next", "//evil.example/steal"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/settings/profile");
}

#[actix_web::test]
async fn login_with_wrong_password_shows_error_without_cookie() {
    let harness = common::TestHarness::new("login-wrong");
    let app = test::init_service(build_test_app(&harness)).await;

    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([
            ("name", common::USER_NAME),
            ("password", "not-the-password"),
            ("next", ""),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(response_cookie(&resp, SESSION_COOKIE).is_none());
    let body = body_text(resp).await;
    assert!(body.contains("Invalid name or password."));
    assert!(body.contains(&format!("value=\"{}\"", common::USER_NAME)));
}

#[actix_web::test]
async fn login_page_redirects_signed_in_users() {
    let harness = common::TestHarness::new("login-signed-in");
    let app = test::init_service(build_test_app(&harness)).await;
    let session = harness.user_auth();

    let req = with_session(test::TestRequest::get().uri("/login"), &session).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/settings/profile");
}

#[actix_web::test]
async fn logout_clears_cookie_and_csrf_tokens() {
    let harness = common::TestHarness::new("logout");
    let app = test::init_service(build_test_app(&harness)).await;
    let session = harness.user_auth();

    let req = with_session(test::TestRequest::post().uri("/logout"), &session)
        .set_form([("csrf_token", session.csrf_token.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/login");

    let cookie = response_cookie(&resp, SESSION_COOKIE).expect("logout cookie");
    assert_eq!(cookie.value(), "");
    assert!(
        !harness
            .csrf_store
            .validate_and_renew_token(&session.csrf_token, &session.jwt_id)
    );
}

#[actix_web::test]
async fn root_redirects_to_profile() {
    let harness = common::TestHarness::new("root-redirect");
    let app = test::init_service(build_test_app(&harness)).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/settings/profile");
}

#[actix_web::test]
async fn unknown_path_renders_not_found_page() {
    let harness = common::TestHarness::new("not-found");
    let app = test::init_service(build_test_app(&harness)).await;

    let req = test::TestRequest::get().uri("/no/such/page").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_text(resp).await;
    assert!(body.contains("404 - Page Not Found"));
}
