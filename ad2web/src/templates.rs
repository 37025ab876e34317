// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::HttpResponse;
use minijinja::Value;

mod context;
mod engine;

pub use context::{ErrorPageContext, FlashMessage, PageContext};
pub use engine::{MiniJinjaEngine, TemplateEngine};

/// Render a minijinja template with the given context
pub fn render_minijinja_template(
    engine: &dyn TemplateEngine,
    template_name: &str,
    context: Value,
) -> Result<String, minijinja::Error> {
    engine.render(template_name, context)
}

/// Renders a full HTML page with status 200.
pub fn render_html_page(
    engine: &dyn TemplateEngine,
    template_name: &str,
    context: Value,
) -> Result<HttpResponse, minijinja::Error> {
    let html = render_minijinja_template(engine, template_name, context)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .insert_header(("Cache-Control", "no-store"))
        .body(html))
}
