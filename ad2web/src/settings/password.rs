// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::cookie::Cookie;
use actix_web::{HttpRequest, HttpResponse, web};
use minijinja::context;

use super::NextQuery;
use super::forms::{CSRF_ERROR_MESSAGE, PasswordForm, WRONG_PASSWORD_MESSAGE};
use crate::app_state::AppState;
use crate::db::{User, users};
use crate::forms::FormData;
use crate::iam::{AuthRequest, UserServices};
use crate::templates::FlashMessage;
use crate::util::{CSRF_FIELD_NAME, CsrfTokenStore, issue_csrf_token, validate_csrf_token};

/// `GET /settings/password`
pub async fn password_page(
    req: HttpRequest,
    query: web::Query<NextQuery>,
    state: web::Data<AppState>,
    csrf_store: web::Data<CsrfTokenStore>,
) -> HttpResponse {
    let user = match load_current_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let form = PasswordForm::new(query.into_inner().next);
    let csrf_token = issue_csrf_token(&req, &csrf_store);
    render_password(&state, &user, &form, csrf_token, None)
}

/// `POST /settings/password`
pub async fn password_submit(
    req: HttpRequest,
    state: web::Data<AppState>,
    user_services: web::Data<UserServices>,
    csrf_store: web::Data<CsrfTokenStore>,
    submitted: web::Form<Vec<(String, String)>>,
) -> HttpResponse {
    let user = match load_current_user(&req, &state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let data = FormData::from_pairs(submitted.into_inner());
    let mut form = PasswordForm::from_submission(&data);
    if !validate_csrf_token(&req, &csrf_store, &data.text(CSRF_FIELD_NAME)) {
        form.errors.add("csrf_token", CSRF_ERROR_MESSAGE);
    }
    form.validate();

    if !form.errors.has("password") {
        match user_services.check_password(&user, &form.password).await {
            Ok(true) => {}
            Ok(false) => form.errors.add("password", WRONG_PASSWORD_MESSAGE),
            Err(err) => return state.internal_error("Failed to verify password", err),
        }
    }

    if !form.errors.is_empty() {
        let csrf_token = issue_csrf_token(&req, &csrf_store);
        return render_password(&state, &user, &form, csrf_token, None);
    }

    let updated = match user_services.change_password(user.id, &form.new_password).await {
        Ok(updated) => updated,
        Err(err) => return state.internal_error("Failed to update password", err),
    };

    // The version bump invalidated the current session; hand out a fresh one.
    let (cookie, csrf_token) = match reissue_session(&req, &user_services, &csrf_store, &updated) {
        Ok(session) => session,
        Err(err) => return state.internal_error("Failed to reissue session", err),
    };

    let mut response = render_password(
        &state,
        &updated,
        &PasswordForm::new(Some(form.next.clone())),
        csrf_token,
        Some(FlashMessage::success("Password updated.")),
    );
    if let Err(err) = response.add_cookie(&cookie) {
        return state.internal_error("Failed to set session cookie", err);
    }
    response
}

fn reissue_session(
    req: &HttpRequest,
    user_services: &UserServices,
    csrf_store: &CsrfTokenStore,
    user: &User,
) -> Result<(Cookie<'static>, String), crate::iam::JwtError> {
    let jwt_service = user_services.jwt_service();
    let token = jwt_service.create_token(user)?;
    let claims = jwt_service.verify_token(&token)?;

    if let Some(old_jwt_id) = req.jwt_id() {
        csrf_store.cleanup_tokens_for_jwt_id(&old_jwt_id);
    }
    let csrf_token = csrf_store.get_or_refresh_token(&claims.jti);
    Ok((jwt_service.create_auth_cookie(&token), csrf_token))
}

async fn load_current_user(req: &HttpRequest, state: &AppState) -> Result<User, HttpResponse> {
    let Some(session_user) = req.current_user() else {
        return Err(state.not_found());
    };
    let name = session_user.name;
    match state
        .db
        .call("load user", move |conn| users::find_by_name(conn, &name))
        .await
    {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(state.not_found()),
        Err(err) => Err(state.internal_error("Failed to load user", err)),
    }
}

fn render_password(
    state: &AppState,
    user: &User,
    form: &PasswordForm,
    csrf_token: String,
    flash: Option<FlashMessage>,
) -> HttpResponse {
    let mut page = state
        .page()
        .with_user(user)
        .with_csrf_token(csrf_token)
        .with_active("password");
    if let Some(message) = flash {
        page.flash(message);
    }
    state.render_page("settings/password.html", page.to_value(context! { form => form }))
}
