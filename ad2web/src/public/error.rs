// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::templates::{ErrorPageContext, TemplateEngine, render_minijinja_template};
use actix_web::HttpResponse;
use actix_web::http::StatusCode;

#[derive(Clone)]
pub struct ErrorRenderer {
    app_name: String,
}

impl ErrorRenderer {
    pub fn new(app_name: String) -> Self {
        Self { app_name }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

pub fn serve_403(
    renderer: &ErrorRenderer,
    template_engine: Option<&dyn TemplateEngine>,
) -> HttpResponse {
    serve_error_page(
        renderer.app_name(),
        template_engine,
        StatusCode::FORBIDDEN,
        "error_403.html",
        "403 - Forbidden",
    )
}

pub fn serve_404(
    renderer: &ErrorRenderer,
    template_engine: Option<&dyn TemplateEngine>,
) -> HttpResponse {
    serve_error_page(
        renderer.app_name(),
        template_engine,
        StatusCode::NOT_FOUND,
        "error_404.html",
        "404 - Page Not Found",
    )
}

pub fn serve_500(
    renderer: &ErrorRenderer,
    template_engine: Option<&dyn TemplateEngine>,
) -> HttpResponse {
    serve_error_page(
        renderer.app_name(),
        template_engine,
        StatusCode::INTERNAL_SERVER_ERROR,
        "error_500.html",
        "500 - Internal Server Error",
    )
}

fn serve_error_page(
    app_name: &str,
    template_engine: Option<&dyn TemplateEngine>,
    status: StatusCode,
    template_name: &str,
    title: &str,
) -> HttpResponse {
    let context = ErrorPageContext::new(app_name).to_value();

    let html = match template_engine {
        Some(engine) => match render_minijinja_template(engine, template_name, context) {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to render {} template: {}", template_name, e);
                fallback_html(app_name, title)
            }
        },
        None => fallback_html(app_name, title),
    };

    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
        .insert_header(("Pragma", "no-cache"))
        .insert_header(("Expires", "0"))
        .body(html)
}

fn fallback_html(app_name: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>{} | {}</title></head>
<body><h1>{}</h1></body></html>"#,
        title, app_name, title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::MiniJinjaEngine;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn error_pages_use_matching_status() {
        let renderer = ErrorRenderer::new("ad2web".to_string());
        let engine = MiniJinjaEngine::new();

        assert_eq!(serve_403(&renderer, Some(&engine)).status(), StatusCode::FORBIDDEN);
        assert_eq!(serve_404(&renderer, Some(&engine)).status(), StatusCode::NOT_FOUND);
        let resp = serve_500(&renderer, Some(&engine));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.expect("body");
        assert!(String::from_utf8_lossy(&body).contains("ad2web"));
    }

    #[actix_web::test]
    async fn fallback_is_used_without_engine() {
        let renderer = ErrorRenderer::new("ad2web".to_string());
        let resp = serve_404(&renderer, None);
        let body = to_bytes(resp.into_body()).await.expect("body");
        assert!(String::from_utf8_lossy(&body).contains("404 - Page Not Found"));
    }
}
