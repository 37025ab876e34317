// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{Config, ConfigError, ValidatedConfig};
use crate::db::{Database, StoreError};
use crate::iam::password::PasswordError;
use crate::runtime_paths::RuntimePaths;
use std::error::Error;
use std::fmt;
use std::path::Path;

pub mod config;
pub mod users;

#[derive(Clone)]
pub struct BootstrapResult {
    pub validated_config: ValidatedConfig,
    pub runtime_paths: RuntimePaths,
    pub database: Database,
    pub created_config: bool,
    pub created_admin: bool,
}

#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    Io(std::io::Error),
    Store(StoreError),
    Password(PasswordError),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::Config(err) => write!(f, "{}", err),
            BootstrapError::Io(err) => write!(f, "Bootstrap I/O error: {}", err),
            BootstrapError::Store(err) => write!(f, "Bootstrap database error: {}", err),
            BootstrapError::Password(err) => write!(f, "Bootstrap password error: {}", err),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BootstrapError::Config(err) => Some(err),
            BootstrapError::Io(err) => Some(err),
            BootstrapError::Store(err) => Some(err),
            BootstrapError::Password(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BootstrapError {
    fn from(err: ConfigError) -> Self {
        BootstrapError::Config(err)
    }
}

impl From<std::io::Error> for BootstrapError {
    fn from(err: std::io::Error) -> Self {
        BootstrapError::Io(err)
    }
}

impl From<StoreError> for BootstrapError {
    fn from(err: StoreError) -> Self {
        BootstrapError::Store(err)
    }
}

impl From<PasswordError> for BootstrapError {
    fn from(err: PasswordError) -> Self {
        BootstrapError::Password(err)
    }
}

/// Prepares a runtime root: config file, directories, database and the first admin account.
pub fn bootstrap_runtime(root: &Path) -> Result<BootstrapResult, BootstrapError> {
    let created_config = config::ensure_config(root)?;

    let validated_config = Config::load_and_validate(root)?;
    let runtime_paths = RuntimePaths::from_root(root, &validated_config)?;
    let database = Database::open(&runtime_paths.database_file)?;

    let created_admin = users::ensure_admin(&database, &validated_config)?;

    Ok(BootstrapResult {
        validated_config,
        runtime_paths,
        database,
        created_config,
        created_admin,
    })
}

pub(crate) fn log_action(message: impl AsRef<str>) {
    eprintln!("[bootstrap] {}", message.as_ref());
}

pub(crate) fn log_warning(message: impl AsRef<str>) {
    eprintln!("[bootstrap] WARNING: {}", message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users;
    use crate::util::test_fixtures::TestFixtureRoot;
    use std::fs;

    const FAST_PASSWORD_YAML: &str = "  password:\n    memory_kib: 1024\n    iterations: 1\n    parallelism: 1\n";

    fn write_fast_config(fixture: &TestFixtureRoot) {
        let secret = "0123456789abcdef0123456789abcdef";
        let yaml = format!(
            "server:\n  host: \"127.0.0.1\"\n  port: 5000\n  workers: 1\napp:\n  name: \"AlarmDecoder\"\nlogging:\n  level: \"info\"\nauth:\n  jwt:\n    secret: \"{}\"\n{}",
            secret, FAST_PASSWORD_YAML
        );
        fs::write(fixture.path().join("config.yaml"), yaml).expect("write config");
    }

    #[test]
    fn bootstrap_creates_config_and_admin() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-default").expect("fixture");
        let result = bootstrap_runtime(fixture.path()).expect("bootstrap should succeed");

        assert!(result.created_config);
        assert!(result.created_admin);
        assert!(fixture.path().join("config.yaml").exists());
        assert!(result.runtime_paths.upload_dir.is_dir());

        let admin = result
            .database
            .with_connection(|conn| users::find_by_name(conn, users::DEFAULT_ADMIN_NAME))
            .expect("query")
            .expect("admin exists");
        assert!(admin.is_admin());
        assert!(admin.password_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn bootstrap_keeps_existing_config_and_users() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-existing").expect("fixture");
        write_fast_config(&fixture);
        let before = fs::read_to_string(fixture.path().join("config.yaml")).expect("read");

        let first = bootstrap_runtime(fixture.path()).expect("first bootstrap");
        assert!(!first.created_config);
        assert!(first.created_admin);
        drop(first);

        let second = bootstrap_runtime(fixture.path()).expect("second bootstrap");
        assert!(!second.created_config);
        assert!(!second.created_admin);
        assert_eq!(
            before,
            fs::read_to_string(fixture.path().join("config.yaml")).expect("read")
        );
        let count = second
            .database
            .with_connection(|conn| users::count(conn))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn bootstrap_reports_invalid_config() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-invalid").expect("fixture");
        fs::write(fixture.path().join("config.yaml"), "server: [").expect("write");

        let err = match bootstrap_runtime(fixture.path()) {
            Ok(_) => panic!("bootstrap should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, BootstrapError::Config(_)));
        assert!(err.to_string().contains("config.yaml"));
    }
}
