// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::Serialize;

use super::avatar::AvatarUpload;
use crate::config::ValidatedConfig;
use crate::db::{ProfileUpdate, SettingValue, User, UserDetail};
use crate::forms::validators::{
    equal_to, int_range, length_between, max_length, one_of, optional_int, required,
    required_int,
};
use crate::forms::{FieldErrors, FormData};
use crate::security::{validate_email_field, validate_http_url};

pub const CSRF_ERROR_MESSAGE: &str = "The CSRF token is missing or invalid.";
pub const EMAIL_TAKEN_MESSAGE: &str = "This email is taken";
pub const WRONG_PASSWORD_MESSAGE: &str = "Password is wrong.";

pub const GENDER_CHOICES: [(i64, &str); 3] = [(1, "Male"), (2, "Female"), (3, "Other")];
pub const DEVICE_TYPE_CHOICES: [(i64, &str); 2] = [(0, "Network"), (1, "Serial")];
pub const BAUDRATE_CHOICES: [i64; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

pub const DEVICE_TYPE_NETWORK: i64 = 0;
pub const DEVICE_TYPE_SERIAL: i64 = 1;

const AGE_MIN: i64 = 1;
const AGE_MAX: i64 = 300;
const PHONE_MAX: usize = 64;
const LOCATION_MAX: usize = 64;
const BIO_MAX: usize = 1024;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 16;
const DEVICE_TEXT_MAX: usize = 255;
const PORT_MIN: i64 = 1;
const PORT_MAX: i64 = 65535;

fn optional_text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn choice_values(choices: &[(i64, &str)]) -> Vec<i64> {
    choices.iter().map(|(value, _)| *value).collect()
}

fn setting_text(value: Option<&SettingValue>) -> String {
    value.map(SettingValue::as_text).unwrap_or_default()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileForm {
    pub next: String,
    pub email: String,
    pub gender_code: String,
    pub age: String,
    pub phone: String,
    pub url: String,
    pub location: String,
    pub bio: String,
    pub errors: FieldErrors,
}

impl ProfileForm {
    pub fn from_user(user: &User, detail: &UserDetail, next: Option<String>) -> Self {
        Self {
            next: next.unwrap_or_default(),
            email: user.email.clone(),
            gender_code: detail
                .gender_code
                .map(|code| code.to_string())
                .unwrap_or_default(),
            age: detail.age.map(|age| age.to_string()).unwrap_or_default(),
            phone: detail.phone.clone().unwrap_or_default(),
            url: detail.url.clone().unwrap_or_default(),
            location: detail.location.clone().unwrap_or_default(),
            bio: detail.bio.clone().unwrap_or_default(),
            errors: FieldErrors::new(),
        }
    }

    pub fn from_submission(data: &FormData) -> Self {
        Self {
            next: data.text("next"),
            email: data.text("email"),
            gender_code: data.text("gender_code"),
            age: data.text("age"),
            phone: data.text("phone"),
            url: data.text("url"),
            location: data.text("location"),
            bio: data.text("bio"),
            errors: FieldErrors::new(),
        }
    }

    /// Field rules that need no storage lookup. Returns true when every field passed.
    pub fn validate(&mut self, avatar: Option<&AvatarUpload>, config: &ValidatedConfig) -> bool {
        let errors = &mut self.errors;

        errors.check("email", validate_email_field(&self.email));

        if let Some(upload) = avatar {
            let allowed = upload
                .extension()
                .map(|ext| config.is_allowed_extension(&ext))
                .unwrap_or(false);
            if !allowed {
                errors.add(
                    "avatar_file",
                    format!(
                        "Images only! Allowed: {}.",
                        config.upload.allowed_extensions.join(", ")
                    ),
                );
            } else if upload.oversized {
                errors.add(
                    "avatar_file",
                    format!(
                        "File is too large (max {} MB).",
                        config.upload.max_avatar_size_mb
                    ),
                );
            }
        }

        match optional_int(&self.gender_code) {
            Ok(Some(code)) => errors.check("gender_code", one_of(code, &choice_values(&GENDER_CHOICES))),
            Ok(None) => {}
            Err(_) => errors.add("gender_code", "Not a valid choice."),
        }

        match optional_int(&self.age) {
            Ok(Some(age)) => errors.check("age", int_range(age, AGE_MIN, AGE_MAX)),
            Ok(None) => {}
            Err(message) => errors.add("age", message),
        }

        errors.check("phone", max_length(&self.phone, PHONE_MAX));
        if !self.url.is_empty() {
            errors.check("url", validate_http_url(&self.url));
        }
        errors.check("location", max_length(&self.location, LOCATION_MAX));
        errors.check("bio", max_length(&self.bio, BIO_MAX));

        errors.is_empty()
    }

    /// Values to persist; call only after [`ProfileForm::validate`] succeeded.
    pub fn to_update(&self, avatar: Option<String>) -> ProfileUpdate {
        ProfileUpdate {
            email: self.email.clone(),
            avatar,
            gender_code: optional_int(&self.gender_code).ok().flatten(),
            age: optional_int(&self.age).ok().flatten(),
            phone: optional_text(&self.phone),
            url: optional_text(&self.url),
            location: optional_text(&self.location),
            bio: optional_text(&self.bio),
        }
    }
}

/// Password fields are never serialized so they cannot be echoed into the page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PasswordForm {
    pub next: String,
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub new_password: String,
    #[serde(skip)]
    pub password_again: String,
    pub errors: FieldErrors,
}

impl PasswordForm {
    pub fn new(next: Option<String>) -> Self {
        Self {
            next: next.unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn from_submission(data: &FormData) -> Self {
        Self {
            next: data.text("next"),
            password: data.raw("password"),
            new_password: data.raw("new_password"),
            password_again: data.raw("password_again"),
            errors: FieldErrors::new(),
        }
    }

    /// Shape checks only; the current password is verified by the caller.
    pub fn validate(&mut self) -> bool {
        let errors = &mut self.errors;
        errors.check("password", required(&self.password));

        match required(&self.new_password) {
            Ok(()) => errors.check(
                "new_password",
                length_between(&self.new_password, PASSWORD_MIN, PASSWORD_MAX),
            ),
            Err(message) => errors.add("new_password", message),
        }

        match required(&self.password_again) {
            Ok(()) => {
                errors.check(
                    "password_again",
                    length_between(&self.password_again, PASSWORD_MIN, PASSWORD_MAX),
                );
                errors.check(
                    "password_again",
                    equal_to(
                        &self.password_again,
                        &self.new_password,
                        "Passwords must match.",
                    ),
                );
            }
            Err(message) => errors.add("password_again", message),
        }

        errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceTypeForm {
    pub device_type: String,
    pub errors: FieldErrors,
}

impl DeviceTypeForm {
    pub fn from_submission(data: &FormData) -> Self {
        Self {
            device_type: data.text("device_type"),
            errors: FieldErrors::new(),
        }
    }

    pub fn from_setting(device_type: Option<&SettingValue>) -> Self {
        Self {
            device_type: setting_text(device_type),
            errors: FieldErrors::new(),
        }
    }

    pub fn validate(&mut self) -> Option<i64> {
        let Ok(device_type) = required_int(&self.device_type) else {
            self.errors.add("device_type", "Not a valid choice.");
            return None;
        };
        self.errors.check(
            "device_type",
            one_of(device_type, &choice_values(&DEVICE_TYPE_CHOICES)),
        );
        self.errors.is_empty().then_some(device_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    pub device_address: String,
    pub device_port: i64,
    pub use_ssl: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkDeviceForm {
    pub device_address: String,
    pub device_port: String,
    pub ssl: bool,
    pub errors: FieldErrors,
}

impl NetworkDeviceForm {
    pub fn from_submission(data: &FormData) -> Self {
        Self {
            device_address: data.text("device_address"),
            device_port: data.text("device_port"),
            ssl: data.checked("ssl"),
            errors: FieldErrors::new(),
        }
    }

    pub fn from_settings(
        device_address: Option<&SettingValue>,
        device_port: Option<&SettingValue>,
        use_ssl: Option<&SettingValue>,
    ) -> Self {
        Self {
            device_address: setting_text(device_address),
            device_port: setting_text(device_port),
            ssl: use_ssl.and_then(SettingValue::as_bool).unwrap_or(false),
            errors: FieldErrors::new(),
        }
    }

    pub fn validate(&mut self) -> Option<NetworkSettings> {
        match required(&self.device_address) {
            Ok(()) => self.errors.check(
                "device_address",
                max_length(&self.device_address, DEVICE_TEXT_MAX),
            ),
            Err(message) => self.errors.add("device_address", message),
        }

        let port = match required_int(&self.device_port) {
            Ok(port) => {
                self.errors
                    .check("device_port", int_range(port, PORT_MIN, PORT_MAX));
                Some(port)
            }
            Err(message) => {
                self.errors.add("device_port", message);
                None
            }
        };

        match port {
            Some(device_port) if self.errors.is_empty() => Some(NetworkSettings {
                device_address: self.device_address.clone(),
                device_port,
                use_ssl: self.ssl,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub device_path: String,
    pub baudrate: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SerialDeviceForm {
    pub device_path: String,
    pub baudrate: String,
    pub errors: FieldErrors,
}

impl SerialDeviceForm {
    pub fn from_submission(data: &FormData) -> Self {
        Self {
            device_path: data.text("device_path"),
            baudrate: data.text("baudrate"),
            errors: FieldErrors::new(),
        }
    }

    pub fn from_settings(
        device_path: Option<&SettingValue>,
        baudrate: Option<&SettingValue>,
    ) -> Self {
        Self {
            device_path: setting_text(device_path),
            baudrate: setting_text(baudrate),
            errors: FieldErrors::new(),
        }
    }

    pub fn validate(&mut self) -> Option<SerialSettings> {
        match required(&self.device_path) {
            Ok(()) => self.errors.check(
                "device_path",
                max_length(&self.device_path, DEVICE_TEXT_MAX),
            ),
            Err(message) => self.errors.add("device_path", message),
        }

        let baudrate = match required_int(&self.baudrate) {
            Ok(baudrate) => {
                self.errors
                    .check("baudrate", one_of(baudrate, &BAUDRATE_CHOICES));
                Some(baudrate)
            }
            Err(message) => {
                self.errors.add("baudrate", message);
                None
            }
        };

        match baudrate {
            Some(baudrate) if self.errors.is_empty() => Some(SerialSettings {
                device_path: self.device_path.clone(),
                baudrate,
            }),
            _ => None,
        }
    }
}

/// The step of the device wizard a request is on. Serialized with a `kind` tag
/// so the template can pick the matching fieldset.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceForm {
    DeviceType(DeviceTypeForm),
    Network(NetworkDeviceForm),
    Serial(SerialDeviceForm),
}

impl DeviceForm {
    /// Picks the form by which fields were posted: an address means the network
    /// step, a path means the serial step, anything else the type step.
    pub fn select(data: &FormData) -> Self {
        if data.contains("device_address") {
            DeviceForm::Network(NetworkDeviceForm::from_submission(data))
        } else if data.contains("device_path") {
            DeviceForm::Serial(SerialDeviceForm::from_submission(data))
        } else {
            DeviceForm::DeviceType(DeviceTypeForm::from_submission(data))
        }
    }

    pub fn errors_mut(&mut self) -> &mut FieldErrors {
        match self {
            DeviceForm::DeviceType(form) => &mut form.errors,
            DeviceForm::Network(form) => &mut form.errors,
            DeviceForm::Serial(form) => &mut form.errors,
        }
    }
}
