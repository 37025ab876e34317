// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Temporary files created while an upload is being written.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const TEMP_UPLOAD_PREFIX: &str = ".ad2web-upload-";
pub const TEMP_UPLOAD_SUFFIX: &str = ".tmp";

pub fn is_temp_upload_name(name: &str) -> bool {
    name.starts_with(TEMP_UPLOAD_PREFIX) || name.ends_with(TEMP_UPLOAD_SUFFIX)
}

pub fn temp_upload_path(dir: &Path) -> PathBuf {
    dir.join(format!(
        "{}{}{}",
        TEMP_UPLOAD_PREFIX,
        Uuid::new_v4().simple(),
        TEMP_UPLOAD_SUFFIX
    ))
}

/// Writes `bytes` next to `target` and renames it into place, so readers never
/// observe a partially written file.
pub fn write_atomically(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let temp_path = temp_upload_path(dir);

    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&temp_path, target)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_fixtures::TestFixtureRoot;

    #[test]
    fn temp_names_are_recognised() {
        let path = temp_upload_path(Path::new("/tmp"));
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(is_temp_upload_name(name));
        assert!(!is_temp_upload_name("avatar_2025-01-01.png"));
    }

    #[test]
    fn write_atomically_leaves_only_target() {
        let fixture = TestFixtureRoot::new_unique("upload-temp").expect("fixture");
        let target = fixture.path().join("avatar.png");

        write_atomically(&target, b"first").expect("write");
        write_atomically(&target, b"second").expect("overwrite");

        assert_eq!(fs::read(&target).expect("read"), b"second");
        let leftovers: Vec<_> = fs::read_dir(fixture.path())
            .expect("list")
            .filter_map(|entry| entry.ok())
            .filter(|entry| is_temp_upload_name(&entry.file_name().to_string_lossy()))
            .collect();
        assert!(leftovers.is_empty());
    }
}
