// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_multipart::{Multipart, MultipartError};
use actix_web::{HttpRequest, HttpResponse, web};
use futures_util::StreamExt;
use minijinja::context;

use super::NextQuery;
use super::avatar::{AvatarUpload, save_avatar};
use super::forms::{CSRF_ERROR_MESSAGE, EMAIL_TAKEN_MESSAGE, GENDER_CHOICES, ProfileForm};
use crate::app_state::AppState;
use crate::config::ValidatedConfig;
use crate::db::{ProfileUpdateOutcome, StoreResult, User, UserDetail, users};
use crate::forms::FormData;
use crate::iam::AuthRequest;
use crate::templates::FlashMessage;
use crate::util::{CSRF_FIELD_NAME, CsrfTokenStore, issue_csrf_token, validate_csrf_token};

const AVATAR_FIELD_NAME: &str = "avatar_file";
const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;
/// Text parts kept from a submission; anything else is drained and dropped.
const PROFILE_FIELD_NAMES: [&str; 9] = [
    CSRF_FIELD_NAME,
    "next",
    "email",
    "gender_code",
    "age",
    "phone",
    "url",
    "location",
    "bio",
];

/// `GET /settings/profile`
pub async fn profile_page(
    req: HttpRequest,
    query: web::Query<NextQuery>,
    state: web::Data<AppState>,
    csrf_store: web::Data<CsrfTokenStore>,
) -> HttpResponse {
    let (user, detail) = match load_current_profile(&req, &state).await {
        Ok(profile) => profile,
        Err(response) => return response,
    };
    let form = ProfileForm::from_user(&user, &detail, query.into_inner().next);
    render_profile(&req, &state, &csrf_store, &user, &form, None)
}

/// `POST /settings/profile` (multipart/form-data)
pub async fn profile_submit(
    req: HttpRequest,
    state: web::Data<AppState>,
    config: web::Data<ValidatedConfig>,
    csrf_store: web::Data<CsrfTokenStore>,
    payload: Multipart,
) -> HttpResponse {
    let (user, _) = match load_current_profile(&req, &state).await {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    let (data, avatar) = match read_profile_submission(payload, config.max_avatar_bytes()).await {
        Ok(submission) => submission,
        Err(err) => {
            log::warn!("Rejected profile submission from {}: {}", user.name, err);
            return HttpResponse::BadRequest().body("Malformed form submission");
        }
    };

    let mut form = ProfileForm::from_submission(&data);
    if !validate_csrf_token(&req, &csrf_store, &data.text(CSRF_FIELD_NAME)) {
        form.errors.add("csrf_token", CSRF_ERROR_MESSAGE);
    }
    form.validate(avatar.as_ref(), &config);

    if !form.errors.has("email") {
        let email = form.email.clone();
        let user_id = user.id;
        match state
            .db
            .call("check email", move |conn| {
                users::email_taken_by_other(conn, &email, user_id)
            })
            .await
        {
            Ok(true) => form.errors.add("email", EMAIL_TAKEN_MESSAGE),
            Ok(false) => {}
            Err(err) => return state.internal_error("Failed to check email", err),
        }
    }

    if !form.errors.is_empty() {
        return render_profile(&req, &state, &csrf_store, &user, &form, None);
    }

    let avatar_name = match avatar {
        Some(upload) => {
            let paths = state.runtime_paths.clone();
            let user_id = user.id;
            match web::block(move || save_avatar(&paths, user_id, &upload)).await {
                Ok(Ok(file_name)) => Some(file_name),
                Ok(Err(err)) => return state.internal_error("Failed to store avatar", err),
                Err(err) => return state.internal_error("Avatar task failed", err),
            }
        }
        None => None,
    };

    let update = form.to_update(avatar_name);
    let user_id = user.id;
    let updated = state
        .db
        .call("update profile", move |conn| {
            let outcome = users::update_profile(conn, user_id, &update)?;
            Ok((outcome, users::find_by_id(conn, user_id)?))
        })
        .await;
    let user = match updated {
        Ok((ProfileUpdateOutcome::Updated, Some(user))) => user,
        Ok((ProfileUpdateOutcome::EmailTaken, Some(current))) => {
            form.errors.add("email", EMAIL_TAKEN_MESSAGE);
            return render_profile(&req, &state, &csrf_store, &current, &form, None);
        }
        Ok((_, None)) => return state.not_found(),
        Err(err) => return state.internal_error("Failed to update profile", err),
    };

    log::info!("Profile updated for user {}", user.name);
    render_profile(
        &req,
        &state,
        &csrf_store,
        &user,
        &form,
        Some(FlashMessage::success("Public profile updated.")),
    )
}

/// Reloads the session user and their detail record; a vanished user is a 404.
async fn load_current_profile(
    req: &HttpRequest,
    state: &AppState,
) -> Result<(User, UserDetail), HttpResponse> {
    let Some(session_user) = req.current_user() else {
        return Err(state.not_found());
    };
    match load_profile(state, &session_user.name).await {
        Ok(Some(profile)) => Ok(profile),
        Ok(None) => Err(state.not_found()),
        Err(err) => Err(state.internal_error("Failed to load profile", err)),
    }
}

async fn load_profile(state: &AppState, name: &str) -> StoreResult<Option<(User, UserDetail)>> {
    let name = name.to_string();
    state
        .db
        .call("load profile", move |conn| {
            let Some(user) = users::find_by_name(conn, &name)? else {
                return Ok(None);
            };
            let detail = users::detail_for(conn, user.id)?;
            Ok(Some((user, detail)))
        })
        .await
}

fn render_profile(
    req: &HttpRequest,
    state: &AppState,
    csrf_store: &CsrfTokenStore,
    user: &User,
    form: &ProfileForm,
    flash: Option<FlashMessage>,
) -> HttpResponse {
    let mut page = state
        .page()
        .with_user(user)
        .with_csrf_token(issue_csrf_token(req, csrf_store))
        .with_active("profile");
    if let Some(message) = flash {
        page.flash(message);
    }

    let avatar_url = user
        .avatar
        .as_ref()
        .map(|avatar| format!("/user/{}/avatar/{}", user.id, avatar));
    state.render_page(
        "settings/profile.html",
        page.to_value(context! {
            form => form,
            gender_choices => GENDER_CHOICES,
            avatar_url => avatar_url,
        }),
    )
}

/// Splits a multipart profile submission into text fields and the optional
/// avatar. Avatar bytes past `max_avatar_bytes` are discarded and the upload is
/// flagged as oversized. Text fields are capped at a fixed size and only the
/// profile form's own field names are kept.
async fn read_profile_submission(
    mut payload: Multipart,
    max_avatar_bytes: usize,
) -> Result<(FormData, Option<AvatarUpload>), MultipartError> {
    let mut data = FormData::new();
    let mut avatar = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        if name == AVATAR_FIELD_NAME {
            let mut bytes = Vec::new();
            let mut oversized = false;
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if bytes.len() + chunk.len() > max_avatar_bytes {
                    oversized = true;
                } else if !oversized {
                    bytes.extend_from_slice(&chunk);
                }
            }
            // An empty file input still sends a part with a blank file name.
            if let Some(filename) = filename.filter(|f| !f.is_empty())
                && (!bytes.is_empty() || oversized)
            {
                avatar = Some(AvatarUpload::new(&filename, bytes, oversized));
            }
            continue;
        }

        let mut value = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if value.len() + chunk.len() <= MAX_TEXT_FIELD_BYTES {
                value.extend_from_slice(&chunk);
            }
        }
        if filename.is_none() && PROFILE_FIELD_NAMES.contains(&name.as_str()) {
            data.insert(name, String::from_utf8_lossy(&value).into_owned());
        }
    }

    Ok((data, avatar))
}
