// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, web};
use minijinja::context;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::iam::{AuthRequest, UserServices};
use crate::security::sanitize_next_path;
use crate::templates::FlashMessage;
use crate::util::CsrfTokenStore;

pub const DEFAULT_NEXT_PATH: &str = "/settings/profile";

const LOGIN_FAILED_MESSAGE: &str = "Invalid name or password.";

#[derive(Debug, Deserialize)]
pub(super) struct LoginQuery {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    next: String,
}

fn next_path(raw: Option<&str>) -> String {
    raw.and_then(sanitize_next_path)
        .unwrap_or_else(|| DEFAULT_NEXT_PATH.to_string())
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, location.to_string()))
        .finish()
}

/// `GET /login`
pub(super) async fn login_page(
    req: HttpRequest,
    query: web::Query<LoginQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let next = next_path(query.next.as_deref());
    if req.is_authenticated() {
        return redirect(&next);
    }
    render_login(&state, "", &next, None)
}

/// `POST /login`
pub(super) async fn login_submit(
    state: web::Data<AppState>,
    user_services: web::Data<UserServices>,
    form: web::Form<LoginForm>,
) -> HttpResponse {
    let form = form.into_inner();
    let next = next_path(Some(&form.next));
    let name = form.name.trim();

    if name.is_empty() || form.password.is_empty() {
        return render_login(
            &state,
            name,
            &next,
            Some(FlashMessage::danger(LOGIN_FAILED_MESSAGE)),
        );
    }

    let user = match user_services.authenticate(name, &form.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            log::warn!("Failed login attempt for {}", name);
            return render_login(
                &state,
                name,
                &next,
                Some(FlashMessage::danger(LOGIN_FAILED_MESSAGE)),
            );
        }
        Err(err) => return state.internal_error("Login failed", err),
    };

    let jwt_service = user_services.jwt_service();
    let token = match jwt_service.create_token(&user) {
        Ok(token) => token,
        Err(err) => return state.internal_error("Failed to create session token", err),
    };

    log::info!("User {} logged in", user.name);
    HttpResponse::Found()
        .insert_header((LOCATION, next))
        .cookie(jwt_service.create_auth_cookie(&token))
        .finish()
}

/// `POST /logout`
pub(super) async fn handle_logout(
    req: HttpRequest,
    user_services: web::Data<UserServices>,
    csrf_store: web::Data<CsrfTokenStore>,
) -> HttpResponse {
    if let Some(jwt_id) = req.jwt_id() {
        csrf_store.cleanup_tokens_for_jwt_id(&jwt_id);
    }
    if let Some(user) = req.current_user() {
        log::info!("User {} logged out", user.name);
    }

    HttpResponse::Found()
        .insert_header((LOCATION, "/login"))
        .cookie(user_services.jwt_service().create_logout_cookie())
        .finish()
}

fn render_login(
    state: &AppState,
    name: &str,
    next: &str,
    flash: Option<FlashMessage>,
) -> HttpResponse {
    let mut page = state.page();
    if let Some(message) = flash {
        page.flash(message);
    }
    state.render_page(
        "login/login_page.html",
        page.to_value(context! { name => name, next => next }),
    )
}
