// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::db::User;
use minijinja::{Value, context};
use serde::Serialize;

const BULMA_CSS: &str = "https://cdn.jsdelivr.net/npm/bulma@1.0.2/css/bulma.min.css";

#[derive(Debug, Clone)]
pub struct ErrorPageContext {
    app_name: String,
}

impl ErrorPageContext {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        context! {
            bulma_css => BULMA_CSS,
            app_name => &self.app_name
        }
    }
}

/// One-shot notice shown above the page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub category: &'static str,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: &str) -> Self {
        Self {
            category: "success",
            message: message.to_string(),
        }
    }

    pub fn danger(message: &str) -> Self {
        Self {
            category: "danger",
            message: message.to_string(),
        }
    }
}

/// Values every page template expects: layout chrome, session user, CSRF token,
/// flashed notices and the active settings tab.
#[derive(Debug, Clone)]
pub struct PageContext {
    app_name: String,
    user: Option<User>,
    csrf_token: String,
    flashes: Vec<FlashMessage>,
    active: Option<&'static str>,
}

impl PageContext {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            user: None,
            csrf_token: String::new(),
            flashes: Vec::new(),
            active: None,
        }
    }

    pub fn with_user(mut self, user: &User) -> Self {
        self.user = Some(user.clone());
        self
    }

    pub fn with_csrf_token(mut self, token: String) -> Self {
        self.csrf_token = token;
        self
    }

    pub fn with_active(mut self, active: &'static str) -> Self {
        self.active = Some(active);
        self
    }

    pub fn flash(&mut self, message: FlashMessage) {
        self.flashes.push(message);
    }

    pub fn flashes(&self) -> &[FlashMessage] {
        &self.flashes
    }

    /// Merges the shared values with page-specific ones; `extra` wins on clashes.
    pub fn to_value(&self, extra: Value) -> Value {
        context! {
            ..extra,
            ..context! {
                bulma_css => BULMA_CSS,
                app_name => &self.app_name,
                current_user => &self.user,
                user => &self.user,
                csrf_token => &self.csrf_token,
                flashes => &self.flashes,
                active => self.active,
            }
        }
    }
}
