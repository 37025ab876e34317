// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::app_state::AppState;
use crate::iam::AuthRequest;
use crate::public::error::serve_403;
use actix_web::{
    Error, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::LOCATION,
    web,
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Redirects anonymous requests to `/login?next=<original path>`.
pub struct RequireLoginMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequireLoginMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireLoginMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireLoginMiddlewareService { service }))
    }
}

pub struct RequireLoginMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireLoginMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !req.request().is_authenticated() {
            let (req, _) = req.into_parts();
            let response = HttpResponse::Found()
                .insert_header((LOCATION, login_redirect_location(&req)))
                .finish()
                .map_into_right_body();
            return Box::pin(async move { Ok(ServiceResponse::new(req, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

/// Answers 403 unless the current user has the admin role. Anonymous requests
/// are sent to the login page like [`RequireLoginMiddleware`] does.
pub struct RequireAdminMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequireAdminMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAdminMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAdminMiddlewareService { service }))
    }
}

pub struct RequireAdminMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireAdminMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let is_authenticated = req.request().is_authenticated();
        let is_admin = req.request().is_admin();

        if !is_admin {
            let (req, _) = req.into_parts();
            let response = if is_authenticated {
                log::warn!("Non-admin user denied access to {}", req.path());
                forbidden_response(&req)
            } else {
                HttpResponse::Found()
                    .insert_header((LOCATION, login_redirect_location(&req)))
                    .finish()
            };
            return Box::pin(async move {
                Ok(ServiceResponse::new(req, response.map_into_right_body()))
            });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

fn login_redirect_location(req: &HttpRequest) -> String {
    let current_path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(req.uri().path());
    format!("/login?next={}", urlencoding::encode(current_path))
}

fn forbidden_response(req: &HttpRequest) -> HttpResponse {
    match req.app_data::<web::Data<AppState>>() {
        Some(state) => serve_403(&state.error_renderer, Some(state.templates.as_ref())),
        None => serve_403_fallback(),
    }
}

fn serve_403_fallback() -> HttpResponse {
    HttpResponse::Forbidden()
        .content_type("text/html; charset=utf-8")
        .body("<h1>403 - Forbidden</h1>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn login_redirect_keeps_path_and_query() {
        let req = TestRequest::with_uri("/settings/profile?next=%2Fsettings").to_http_request();
        assert_eq!(
            login_redirect_location(&req),
            "/login?next=%2Fsettings%2Fprofile%3Fnext%3D%252Fsettings"
        );
    }
}
