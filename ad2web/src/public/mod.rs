// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpResponse, web};

use crate::app_state::AppState;

pub mod error;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(crate::settings::redirect_to_profile));
}

/// Fallback for unmatched routes.
pub async fn not_found(state: web::Data<AppState>) -> HttpResponse {
    state.not_found()
}
