// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{CONFIG_FILE_NAME, ConfigError, ValidatedConfig};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
    pub upload_dir: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path, config: &ValidatedConfig) -> Result<Self, ConfigError> {
        let root_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };

        if !root_path.exists() {
            fs::create_dir_all(&root_path).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "Failed to create runtime root '{}': {}",
                    root_path.display(),
                    e
                ))
            })?;
        }

        let root_canonical = root_path.canonicalize().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to canonicalize runtime root '{}': {}",
                root_path.display(),
                e
            ))
        })?;

        let config_file = root_canonical.join(CONFIG_FILE_NAME);
        let database_file = resolve_under_root(&root_canonical, &config.database.file);
        if let Some(parent) = database_file.parent() {
            ensure_dir_exists(parent)?;
        }

        let upload_dir = resolve_under_root(&root_canonical, &config.upload.folder);
        ensure_dir_exists(&upload_dir)?;
        let upload_dir = upload_dir.canonicalize().map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to canonicalize upload directory '{}': {}",
                upload_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            root: root_canonical,
            config_file,
            database_file,
            upload_dir,
        })
    }

    /// Directory holding one user's uploaded files.
    pub fn user_upload_dir(&self, user_id: i64) -> PathBuf {
        self.upload_dir.join(format!("user_{}", user_id))
    }
}

fn resolve_under_root(root: &Path, configured: &str) -> PathBuf {
    let configured = Path::new(configured);
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

fn ensure_dir_exists(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to create directory '{}': {}",
                path.display(),
                e
            ))
        })?;
    }

    let metadata = fs::metadata(path).map_err(|e| {
        ConfigError::ValidationError(format!(
            "Failed to inspect directory '{}': {}",
            path.display(),
            e
        ))
    })?;
    if !metadata.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "Path is not a directory: {}",
            path.display()
        )));
    }
    if metadata.permissions().readonly() {
        return Err(ConfigError::ValidationError(format!(
            "Directory must be writable: {}",
            path.display()
        )));
    }
    Ok(())
}
