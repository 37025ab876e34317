// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Avatar uploads: content-addressed file names inside a per-user directory.

use actix_files::NamedFile;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{Local, NaiveDate};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_state::AppState;
use crate::public::error::serve_404;
use crate::runtime_paths::RuntimePaths;
use crate::security::is_plain_file_name;
use crate::util::write_atomically;

/// An avatar file received in a profile submission.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Set when the upload exceeded the configured size and `bytes` was truncated.
    pub oversized: bool,
}

impl AvatarUpload {
    pub fn new(filename: &str, bytes: Vec<u8>, oversized: bool) -> Self {
        Self {
            filename: filename.to_string(),
            bytes,
            oversized,
        }
    }

    /// Lower-cased extension of the submitted file name, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// `<sha256 hex of content>_<YYYY-MM-DD>.<ext>`
pub fn avatar_file_name(bytes: &[u8], extension: &str, date: NaiveDate) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    format!("{}_{}.{}", digest, date.format("%Y-%m-%d"), extension)
}

/// Writes the avatar under the user's upload directory and returns its file name.
pub fn save_avatar(
    paths: &RuntimePaths,
    user_id: i64,
    upload: &AvatarUpload,
) -> std::io::Result<String> {
    let extension = upload.extension().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "avatar file has no extension",
        )
    })?;

    let user_upload_dir = paths.user_upload_dir(user_id);
    log::debug!("Avatar upload directory: {}", user_upload_dir.display());
    fs::create_dir_all(&user_upload_dir)?;

    let file_name = avatar_file_name(&upload.bytes, &extension, Local::now().date_naive());
    write_atomically(&user_upload_dir.join(&file_name), &upload.bytes)?;
    log::info!("Stored avatar {} for user {}", file_name, user_id);
    Ok(file_name)
}

fn resolve_avatar_path(paths: &RuntimePaths, user_id: i64, file_name: &str) -> Option<PathBuf> {
    if !is_plain_file_name(file_name) {
        return None;
    }
    let path = paths.user_upload_dir(user_id).join(file_name);
    path.is_file().then_some(path)
}

/// `GET /user/{id}/avatar/{filename}`
pub async fn serve_avatar(
    req: HttpRequest,
    path: web::Path<(i64, String)>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let (user_id, file_name) = path.into_inner();
    match resolve_avatar_path(&state.runtime_paths, user_id, &file_name) {
        Some(avatar_path) => match NamedFile::open_async(&avatar_path).await {
            Ok(file) => file.into_response(&req),
            Err(err) => {
                log::error!("Failed to open avatar {}: {}", avatar_path.display(), err);
                serve_404(&state.error_renderer, Some(state.templates.as_ref()))
            }
        },
        None => serve_404(&state.error_renderer, Some(state.templates.as_ref())),
    }
}
