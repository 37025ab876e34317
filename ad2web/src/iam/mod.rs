// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Identity and access: password hashing, session tokens and the request
//! middleware that turns a session cookie into the current user.

pub mod guards;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod user_services;

pub use guards::{RequireAdminMiddleware, RequireLoginMiddleware};
pub use jwt::{Claims, JwtError, JwtService};
pub use middleware::{AuthRequest, JwtAuthMiddlewareFactory};
pub use user_services::{UserServiceError, UserServiceResult, UserServices};
