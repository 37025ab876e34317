// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::web::Data;
use actix_web::{HttpMessage, HttpRequest};
use std::future::{Ready, ready};
use std::pin::Pin;
use std::rc::Rc;

use super::jwt::Claims;
use crate::db::User;
use crate::iam::user_services::UserServices;

/// Trait to add authentication methods to HttpRequest
pub trait AuthRequest {
    fn current_user(&self) -> Option<User>;
    fn jwt_claims(&self) -> Option<Claims>;
    fn jwt_id(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool;
    fn is_admin(&self) -> bool;
}

impl AuthRequest for HttpRequest {
    fn current_user(&self) -> Option<User> {
        self.extensions().get::<User>().cloned()
    }

    fn jwt_claims(&self) -> Option<Claims> {
        self.extensions().get::<Claims>().cloned()
    }

    fn jwt_id(&self) -> Option<String> {
        self.jwt_claims().map(|claims| claims.jti)
    }

    fn is_authenticated(&self) -> bool {
        self.extensions().get::<User>().is_some()
    }

    fn is_admin(&self) -> bool {
        self.extensions()
            .get::<User>()
            .map(|user| user.is_admin())
            .unwrap_or(false)
    }
}

/// Resolves the session cookie into a `User` and its `Claims` in the request
/// extensions. Requests without a valid session pass through untouched.
pub struct JwtAuthMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user_services = req.app_data::<Data<UserServices>>().cloned();
        let service = self.service.clone();

        Box::pin(async move {
            if let Some(user_services) = user_services {
                let cookie_name = user_services.jwt_service().cookie_name().to_string();
                if let Some(cookie) = req.cookie(&cookie_name) {
                    match user_services.validate_jwt(cookie.value()).await {
                        Some((user, claims)) => {
                            req.extensions_mut().insert(claims);
                            req.extensions_mut().insert(user);
                        }
                        None => log::debug!("Ignoring invalid session cookie"),
                    }
                }
            } else {
                log::error!("UserServices missing from app data; sessions disabled");
            }

            service.call(req).await
        })
    }
}
