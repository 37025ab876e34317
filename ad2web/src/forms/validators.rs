// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Field checks returning the message shown next to the field on failure.

pub const REQUIRED_MESSAGE: &str = "This field is required.";

pub fn required(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(REQUIRED_MESSAGE.to_string());
    }
    Ok(())
}

pub fn max_length(value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("Field cannot be longer than {} characters.", max));
    }
    Ok(())
}

pub fn length_between(value: &str, min: usize, max: usize) -> Result<(), String> {
    let count = value.chars().count();
    if count < min || count > max {
        return Err(format!(
            "Field must be between {} and {} characters long.",
            min, max
        ));
    }
    Ok(())
}

/// Parses an optional integer field; empty input is `Ok(None)`.
pub fn optional_int(value: &str) -> Result<Option<i64>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| "Not a valid integer value.".to_string())
}

pub fn required_int(value: &str) -> Result<i64, String> {
    optional_int(value)?.ok_or_else(|| REQUIRED_MESSAGE.to_string())
}

pub fn int_range(value: i64, min: i64, max: i64) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("Number must be between {} and {}.", min, max));
    }
    Ok(())
}

pub fn one_of(value: i64, choices: &[i64]) -> Result<(), String> {
    if !choices.contains(&value) {
        return Err("Not a valid choice.".to_string());
    }
    Ok(())
}

pub fn equal_to(value: &str, other: &str, message: &str) -> Result<(), String> {
    if value != other {
        return Err(message.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_checks_count_characters() {
        assert!(max_length("ééé", 3).is_ok());
        assert!(max_length("abcd", 3).is_err());
        assert!(length_between("abcdef", 6, 16).is_ok());
        assert_eq!(
            length_between("abc", 6, 16).unwrap_err(),
            "Field must be between 6 and 16 characters long."
        );
        assert!(length_between(&"a".repeat(17), 6, 16).is_err());
    }

    #[test]
    fn integer_parsing() {
        assert_eq!(optional_int(""), Ok(None));
        assert_eq!(optional_int(" 42 "), Ok(Some(42)));
        assert!(optional_int("forty").is_err());
        assert_eq!(required_int("").unwrap_err(), REQUIRED_MESSAGE);
        assert!(int_range(0, 1, 300).is_err());
        assert!(int_range(300, 1, 300).is_ok());
        assert!(one_of(2, &[1, 2, 3]).is_ok());
        assert!(one_of(4, &[1, 2, 3]).is_err());
    }

    #[test]
    fn required_rejects_blank() {
        assert!(required("  ").is_err());
        assert!(required("x").is_ok());
        assert!(equal_to("a", "b", "Passwords must match").is_err());
    }
}
