// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    2
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    #[serde(default = "default_jwt_audience")]
    pub audience: String,
    #[serde(default = "default_jwt_expiration_hours")]
    pub expiration_hours: u64,
    #[serde(default = "default_jwt_cookie_name")]
    pub cookie_name: String,
}

fn default_jwt_issuer() -> String {
    "ad2web".to_string()
}

fn default_jwt_audience() -> String {
    "ad2web".to_string()
}

fn default_jwt_expiration_hours() -> u64 {
    12
}

fn default_jwt_cookie_name() -> String {
    "ad2web_session".to_string()
}

/// Argon2id cost parameters for stored password hashes.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashingParams {
    #[serde(default = "default_argon2_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_argon2_iterations")]
    pub iterations: u32,
    #[serde(default = "default_argon2_parallelism")]
    pub parallelism: u32,
}

pub const DEFAULT_PASSWORD_HASHING_PARAMS: PasswordHashingParams = PasswordHashingParams {
    memory_kib: 19456,
    iterations: 2,
    parallelism: 1,
};

impl Default for PasswordHashingParams {
    fn default() -> Self {
        DEFAULT_PASSWORD_HASHING_PARAMS
    }
}

fn default_argon2_memory_kib() -> u32 {
    DEFAULT_PASSWORD_HASHING_PARAMS.memory_kib
}

fn default_argon2_iterations() -> u32 {
    DEFAULT_PASSWORD_HASHING_PARAMS.iterations
}

fn default_argon2_parallelism() -> u32 {
    DEFAULT_PASSWORD_HASHING_PARAMS.parallelism
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordHashingParams,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_file")]
    pub file: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: default_database_file(),
        }
    }
}

fn default_database_file() -> String {
    "ad2web.db".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_upload_folder")]
    pub folder: String,
    #[serde(default = "default_max_avatar_size_mb")]
    pub max_avatar_size_mb: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            folder: default_upload_folder(),
            max_avatar_size_mb: default_max_avatar_size_mb(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_upload_folder() -> String {
    "uploads".to_string()
}

fn default_max_avatar_size_mb() -> u64 {
    2
}

fn default_allowed_extensions() -> Vec<String> {
    vec![
        "png".to_string(),
        "jpg".to_string(),
        "jpeg".to_string(),
        "gif".to_string(),
    ]
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
}

impl ValidatedConfig {
    /// True when the listener only accepts loopback connections, which lets
    /// session cookies drop the `Secure` flag for plain-HTTP development.
    pub fn is_localhost_only(&self) -> bool {
        matches!(
            self.server.host.as_str(),
            "127.0.0.1" | "localhost" | "::1"
        )
    }

    pub fn max_avatar_bytes(&self) -> usize {
        (self.upload.max_avatar_size_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        let extension = extension.to_ascii_lowercase();
        self.upload
            .allowed_extensions
            .iter()
            .any(|allowed| *allowed == extension)
    }
}

const MIN_JWT_SECRET_CHARS: usize = 16;
const MAX_AVATAR_SIZE_MB: u64 = 64;

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::parse(&config_content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        Self::validate_server(&self.server)?;
        Self::validate_logging(&self.logging)?;
        Self::validate_auth(&self.auth)?;

        if self.database.file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.file cannot be empty".to_string(),
            ));
        }

        let upload = Self::validate_upload(self.upload)?;

        Ok(ValidatedConfig {
            server: self.server,
            app: self.app,
            logging: self.logging,
            auth: self.auth,
            database: self.database,
            upload,
        })
    }

    fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
        if server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }
        if server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let level = logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error", "off"].contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of trace, debug, info, warn, error, off; got: {}",
                logging.level
            )));
        }
        Ok(())
    }

    fn validate_auth(auth: &AuthConfig) -> Result<(), ConfigError> {
        if auth.jwt.secret.chars().count() < MIN_JWT_SECRET_CHARS {
            return Err(ConfigError::ValidationError(format!(
                "auth.jwt.secret must be at least {} characters",
                MIN_JWT_SECRET_CHARS
            )));
        }
        if auth.jwt.expiration_hours == 0 {
            return Err(ConfigError::ValidationError(
                "auth.jwt.expiration_hours must be at least 1".to_string(),
            ));
        }
        if auth.jwt.cookie_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt.cookie_name cannot be empty".to_string(),
            ));
        }

        let password = &auth.password;
        if password.iterations == 0 || password.parallelism == 0 {
            return Err(ConfigError::ValidationError(
                "auth.password iterations and parallelism must be at least 1".to_string(),
            ));
        }
        if password.memory_kib < 8 * password.parallelism {
            return Err(ConfigError::ValidationError(format!(
                "auth.password.memory_kib must be at least {} for parallelism {}",
                8 * password.parallelism,
                password.parallelism
            )));
        }
        Ok(())
    }

    fn validate_upload(mut upload: UploadConfig) -> Result<UploadConfig, ConfigError> {
        if upload.folder.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.folder cannot be empty".to_string(),
            ));
        }
        if !(1..=MAX_AVATAR_SIZE_MB).contains(&upload.max_avatar_size_mb) {
            return Err(ConfigError::ValidationError(format!(
                "upload.max_avatar_size_mb must be between 1 and {}, got: {}",
                MAX_AVATAR_SIZE_MB, upload.max_avatar_size_mb
            )));
        }
        if upload.allowed_extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.allowed_extensions cannot be empty".to_string(),
            ));
        }

        let mut normalized = Vec::with_capacity(upload.allowed_extensions.len());
        for extension in &upload.allowed_extensions {
            let extension = extension.trim().trim_start_matches('.').to_ascii_lowercase();
            if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::ValidationError(format!(
                    "upload.allowed_extensions contains an invalid entry: '{}'",
                    extension
                )));
            }
            normalized.push(extension);
        }
        upload.allowed_extensions = normalized;
        Ok(upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    const MINIMAL_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 5000
app:
  name: "AlarmDecoder"
logging:
  level: "debug"
auth:
  jwt:
    secret: "0123456789abcdef0123456789abcdef"
"#;

    #[test]
    fn parse_applies_defaults() {
        let config = Config::parse(MINIMAL_YAML).expect("parse");
        let validated = config.validate().expect("valid");
        assert_eq!(validated.server.workers, 2);
        assert_eq!(validated.database.file, "ad2web.db");
        assert_eq!(validated.upload.folder, "uploads");
        assert_eq!(validated.auth.jwt.cookie_name, "ad2web_session");
        assert_eq!(validated.auth.password, DEFAULT_PASSWORD_HASHING_PARAMS);
        assert_eq!(validated.logging.level_filter(), LevelFilter::Debug);
        assert!(validated.is_localhost_only());
    }

    #[test]
    fn validate_rejects_short_jwt_secret() {
        let mut config = Config::parse(MINIMAL_YAML).expect("parse");
        config.auth.jwt.secret = "short".to_string();
        let err = config.validate().expect_err("short secret");
        assert!(err.to_string().contains("auth.jwt.secret"));
    }

    #[test]
    fn validate_rejects_unknown_log_level() {
        let mut config = Config::parse(MINIMAL_YAML).expect("parse");
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_normalizes_allowed_extensions() {
        let mut config = Config::parse(MINIMAL_YAML).expect("parse");
        config.upload.allowed_extensions = vec![".PNG".to_string(), "Gif".to_string()];
        let validated = config.validate().expect("valid");
        assert_eq!(validated.upload.allowed_extensions, vec!["png", "gif"]);
        assert!(validated.is_allowed_extension("GIF"));
        assert!(!validated.is_allowed_extension("exe"));
    }

    #[test]
    fn validate_rejects_oversized_avatar_limit() {
        let mut config = Config::parse(MINIMAL_YAML).expect("parse");
        config.upload.max_avatar_size_mb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let fixture = TestFixtureRoot::new_unique("config-missing").expect("fixture");
        let err = Config::load(fixture.path()).expect_err("missing config");
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn load_and_validate_reads_file() {
        let fixture = TestFixtureRoot::new_unique("config-load").expect("fixture");
        fs::write(fixture.path().join(CONFIG_FILE_NAME), MINIMAL_YAML).expect("write");
        let validated = Config::load_and_validate(fixture.path()).expect("config");
        assert_eq!(validated.app.name, "AlarmDecoder");
    }
}
