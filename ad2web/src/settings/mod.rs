// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! User settings pages: public profile, password and (admin only) device.

pub mod avatar;
pub mod device;
pub mod forms;
pub mod password;
pub mod profile;

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::iam::{RequireAdminMiddleware, RequireLoginMiddleware};

pub const PROFILE_PATH: &str = "/settings/profile";

/// `?next=` carried through settings pages as a hidden field.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/settings")
            .wrap(RequireLoginMiddleware)
            .route("", web::get().to(redirect_to_profile))
            .route("/", web::get().to(redirect_to_profile))
            .service(
                web::resource("/profile")
                    .route(web::get().to(profile::profile_page))
                    .route(web::post().to(profile::profile_submit)),
            )
            .service(
                web::resource("/password")
                    .route(web::get().to(password::password_page))
                    .route(web::post().to(password::password_submit)),
            )
            .service(
                web::resource("/device")
                    .wrap(RequireAdminMiddleware)
                    .route(web::get().to(device::device_page))
                    .route(web::post().to(device::device_submit)),
            ),
    )
    .service(
        web::resource("/user/{id}/avatar/{filename}")
            .wrap(RequireLoginMiddleware)
            .route(web::get().to(avatar::serve_avatar)),
    );
}

pub async fn redirect_to_profile() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, PROFILE_PATH))
        .finish()
}
