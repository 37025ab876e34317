// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web;

pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod forms;
pub mod iam;
pub mod login;
pub mod public;
pub mod runtime_paths;
pub mod security;
pub mod settings;
pub mod templates;
pub mod util;

/// Registers every route of the web interface. Callers add app data and the JWT middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(login::configure)
        .configure(settings::configure)
        .configure(public::configure)
        .default_service(web::to(public::not_found));
}
