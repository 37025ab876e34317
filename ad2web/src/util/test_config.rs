// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use crate::config::{
    AppConfig, AuthConfig, DatabaseConfig, JwtConfig, LoggingConfig, PasswordHashingParams,
    ServerConfig, UploadConfig, ValidatedConfig,
};

/// Argon2 costs low enough for test suites to hash freely.
pub const TEST_PASSWORD_PARAMS: PasswordHashingParams = PasswordHashingParams {
    memory_kib: 1024,
    iterations: 1,
    parallelism: 1,
};

#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: ValidatedConfig,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ValidatedConfig {
                server: ServerConfig {
                    host: "127.0.0.1".to_string(),
                    port: 5000,
                    workers: 1,
                },
                app: AppConfig {
                    name: "Test App".to_string(),
                    description: "Test Description".to_string(),
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                },
                auth: AuthConfig {
                    jwt: JwtConfig {
                        secret: "test-secret-key-with-enough-length".to_string(),
                        issuer: "ad2web".to_string(),
                        audience: "ad2web".to_string(),
                        expiration_hours: 12,
                        cookie_name: "ad2web_session".to_string(),
                    },
                    password: TEST_PASSWORD_PARAMS,
                },
                database: DatabaseConfig::default(),
                upload: UploadConfig::default(),
            },
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.config.server.host = host.to_string();
        self
    }

    pub fn with_max_avatar_size_mb(mut self, size_mb: u64) -> Self {
        self.config.upload.max_avatar_size_mb = size_mb;
        self
    }

    pub fn build(self) -> ValidatedConfig {
        self.config
    }
}

pub fn test_config() -> ValidatedConfig {
    TestConfigBuilder::new().build()
}
