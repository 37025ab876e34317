// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use validator::{ValidateEmail, ValidateUrl};

pub const MAX_EMAIL_CHARS: usize = 128;

/// Validate user email input
pub fn validate_email_field(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("This field is required.".to_string());
    }
    if trimmed.chars().count() > MAX_EMAIL_CHARS {
        return Err(format!(
            "Field cannot be longer than {} characters.",
            MAX_EMAIL_CHARS
        ));
    }
    if !trimmed.validate_email() {
        return Err("Invalid email address.".to_string());
    }
    Ok(())
}

/// Accepts absolute `http`/`https` URLs with a host.
pub fn validate_http_url(url: &str) -> Result<(), String> {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();
    let has_scheme = lower.starts_with("http://") || lower.starts_with("https://");
    if !has_scheme || !trimmed.validate_url() {
        return Err("Invalid URL.".to_string());
    }
    Ok(())
}

/// Reduces a user-supplied `next` value to a same-site absolute path, or `None`
/// when it could send the browser elsewhere.
pub fn sanitize_next_path(raw_path: &str) -> Option<String> {
    let cleaned = raw_path.trim().replace(['\r', '\n'], "");
    if cleaned.is_empty() {
        return None;
    }
    if !cleaned.starts_with('/') || cleaned.starts_with("//") || cleaned.contains('\\') {
        return None;
    }
    let path_part = cleaned.split(['?', '#']).next().unwrap_or_default();
    if path_part.split('/').any(|segment| segment == "..") {
        return None;
    }
    Some(cleaned)
}

/// True for a bare file name: no separators, no parent references, no NUL.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_field_rules() {
        assert!(validate_email_field("user@example.com").is_ok());
        assert_eq!(
            validate_email_field("  ").unwrap_err(),
            "This field is required."
        );
        assert_eq!(
            validate_email_field("not-an-email").unwrap_err(),
            "Invalid email address."
        );
        let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_CHARS));
        assert!(validate_email_field(&long).unwrap_err().contains("128"));
    }

    #[test]
    fn url_requires_http_scheme() {
        assert!(validate_http_url("https://example.com/me").is_ok());
        assert!(validate_http_url("http://example.com").is_ok());
        assert!(validate_http_url("ftp://example.com").is_err());
        assert!(validate_http_url("example.com").is_err());
        assert!(validate_http_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn next_path_stays_on_site() {
        assert_eq!(
            sanitize_next_path("/settings/password"),
            Some("/settings/password".to_string())
        );
        assert_eq!(
            sanitize_next_path("/settings/device?x=1"),
            Some("/settings/device?x=1".to_string())
        );
        assert_eq!(sanitize_next_path("https://evil.example"), None);
        assert_eq!(sanitize_next_path("//evil.example"), None);
        assert_eq!(sanitize_next_path("/\\evil.example"), None);
        assert_eq!(sanitize_next_path("/settings/../../etc"), None);
        assert_eq!(sanitize_next_path(""), None);
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("abc_2025-01-01.png"));
        assert!(!is_plain_file_name("../secret.png"));
        assert!(!is_plain_file_name("a/b.png"));
        assert!(!is_plain_file_name("a\\b.png"));
        assert!(!is_plain_file_name(""));
    }
}
