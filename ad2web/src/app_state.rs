// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::db::Database;
use crate::public::error::{ErrorRenderer, serve_404, serve_500};
use crate::runtime_paths::RuntimePaths;
use crate::templates::{MiniJinjaEngine, PageContext, TemplateEngine};
use actix_web::HttpResponse;

pub struct AppState {
    pub app_name: String,
    pub templates: Arc<dyn TemplateEngine>,
    pub error_renderer: ErrorRenderer,
    pub runtime_paths: RuntimePaths,
    pub db: Database,
}

impl AppState {
    pub fn new(app_name: &str, runtime_paths: RuntimePaths, db: Database) -> Self {
        Self {
            app_name: app_name.to_string(),
            templates: Arc::new(MiniJinjaEngine::new()),
            error_renderer: ErrorRenderer::new(app_name.to_string()),
            runtime_paths,
            db,
        }
    }

    pub fn page(&self) -> PageContext {
        PageContext::new(&self.app_name)
    }

    pub fn not_found(&self) -> HttpResponse {
        serve_404(&self.error_renderer, Some(self.templates.as_ref()))
    }

    /// Logs `err` and answers with the 500 page.
    pub fn internal_error(&self, context: &str, err: impl std::fmt::Display) -> HttpResponse {
        log::error!("{}: {}", context, err);
        serve_500(&self.error_renderer, Some(self.templates.as_ref()))
    }

    /// Renders a page template, falling back to the 500 page on template errors.
    pub fn render_page(&self, template_name: &str, context: minijinja::Value) -> HttpResponse {
        match crate::templates::render_html_page(self.templates.as_ref(), template_name, context) {
            Ok(response) => response,
            Err(err) => self.internal_error(&format!("Failed to render {}", template_name), err),
        }
    }
}
