// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod csrf_helper;
pub mod log_level_changer;
pub mod test_config;
pub mod test_fixtures;
pub mod upload_temp;

pub use csrf_helper::{CSRF_FIELD_NAME, CsrfTokenStore, issue_csrf_token, validate_csrf_token};
pub use log_level_changer::{default_level_rules, init_logger};
pub use test_config::{TestConfigBuilder, test_config};
pub use upload_temp::{is_temp_upload_name, write_atomically};
