// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Device wizard: choose network or serial, then fill in that connection's
//! parameters. Every value is a named setting.

use actix_web::{HttpRequest, HttpResponse, web};
use minijinja::context;

use super::forms::{
    BAUDRATE_CHOICES, CSRF_ERROR_MESSAGE, DEVICE_TYPE_CHOICES, DEVICE_TYPE_NETWORK,
    DEVICE_TYPE_SERIAL, DeviceForm, DeviceTypeForm, NetworkDeviceForm, NetworkSettings,
    SerialDeviceForm, SerialSettings,
};
use crate::app_state::AppState;
use crate::db::{Database, SettingValue, StoreResult, settings};
use crate::forms::FormData;
use crate::iam::AuthRequest;
use crate::templates::FlashMessage;
use crate::util::{CSRF_FIELD_NAME, CsrfTokenStore, issue_csrf_token, validate_csrf_token};

pub const DEVICE_TYPE: &str = "device_type";
pub const DEVICE_ADDRESS: &str = "device_address";
pub const DEVICE_PORT: &str = "device_port";
pub const USE_SSL: &str = "use_ssl";
pub const DEVICE_PATH: &str = "device_path";
pub const BAUDRATE: &str = "baudrate";

const SAVED_MESSAGE: &str = "Device settings saved.";

/// Current values of every device setting; unset ones are `None`.
#[derive(Debug, Clone, Default)]
pub struct StoredDevice {
    pub device_type: Option<SettingValue>,
    pub device_address: Option<SettingValue>,
    pub device_port: Option<SettingValue>,
    pub use_ssl: Option<SettingValue>,
    pub device_path: Option<SettingValue>,
    pub baudrate: Option<SettingValue>,
}

impl StoredDevice {
    fn network_form(&self) -> NetworkDeviceForm {
        NetworkDeviceForm::from_settings(
            self.device_address.as_ref(),
            self.device_port.as_ref(),
            self.use_ssl.as_ref(),
        )
    }

    fn serial_form(&self) -> SerialDeviceForm {
        SerialDeviceForm::from_settings(self.device_path.as_ref(), self.baudrate.as_ref())
    }
}

pub async fn load_stored_device(db: &Database) -> StoreResult<StoredDevice> {
    db.call("load device settings", |conn| {
        Ok(StoredDevice {
            device_type: settings::value_of(conn, DEVICE_TYPE)?,
            device_address: settings::value_of(conn, DEVICE_ADDRESS)?,
            device_port: settings::value_of(conn, DEVICE_PORT)?,
            use_ssl: settings::value_of(conn, USE_SSL)?,
            device_path: settings::value_of(conn, DEVICE_PATH)?,
            baudrate: settings::value_of(conn, BAUDRATE)?,
        })
    })
    .await
}

async fn save_network(db: &Database, network: NetworkSettings) -> StoreResult<()> {
    db.call("save network device", move |conn| {
        settings::set_many(
            conn,
            &[
                (DEVICE_ADDRESS, network.device_address.into()),
                (DEVICE_PORT, network.device_port.into()),
                (USE_SSL, network.use_ssl.into()),
            ],
        )
    })
    .await
}

async fn save_serial(db: &Database, serial: SerialSettings) -> StoreResult<()> {
    db.call("save serial device", move |conn| {
        settings::set_many(
            conn,
            &[
                (DEVICE_PATH, serial.device_path.into()),
                (BAUDRATE, serial.baudrate.into()),
            ],
        )
    })
    .await
}

async fn save_device_type(db: &Database, device_type: i64) -> StoreResult<()> {
    db.call("save device type", move |conn| {
        settings::set(conn, DEVICE_TYPE, &SettingValue::Int(device_type))
    })
    .await
}

/// `GET /settings/device`
pub async fn device_page(
    req: HttpRequest,
    state: web::Data<AppState>,
    csrf_store: web::Data<CsrfTokenStore>,
) -> HttpResponse {
    let stored = match load_stored_device(&state.db).await {
        Ok(stored) => stored,
        Err(err) => return state.internal_error("Failed to load device settings", err),
    };
    let form = DeviceForm::DeviceType(DeviceTypeForm::from_setting(stored.device_type.as_ref()));
    render_device(&req, &state, &csrf_store, &form, None)
}

/// `POST /settings/device`
pub async fn device_submit(
    req: HttpRequest,
    state: web::Data<AppState>,
    csrf_store: web::Data<CsrfTokenStore>,
    submitted: web::Form<Vec<(String, String)>>,
) -> HttpResponse {
    let data = FormData::from_pairs(submitted.into_inner());
    let mut form = DeviceForm::select(&data);
    if !validate_csrf_token(&req, &csrf_store, &data.text(CSRF_FIELD_NAME)) {
        form.errors_mut().add("csrf_token", CSRF_ERROR_MESSAGE);
    }

    let mut flash = None;
    let form = match form {
        DeviceForm::Network(mut network_form) => {
            if let Some(network) = network_form.validate() {
                if let Err(err) = save_network(&state.db, network).await {
                    return state.internal_error("Failed to save network device", err);
                }
                log::info!("Network device settings saved");
                flash = Some(FlashMessage::success(SAVED_MESSAGE));
            }
            DeviceForm::Network(network_form)
        }
        DeviceForm::Serial(mut serial_form) => {
            if let Some(serial) = serial_form.validate() {
                if let Err(err) = save_serial(&state.db, serial).await {
                    return state.internal_error("Failed to save serial device", err);
                }
                log::info!("Serial device settings saved");
                flash = Some(FlashMessage::success(SAVED_MESSAGE));
            }
            DeviceForm::Serial(serial_form)
        }
        DeviceForm::DeviceType(mut type_form) => match type_form.validate() {
            Some(device_type) => {
                if let Err(err) = save_device_type(&state.db, device_type).await {
                    return state.internal_error("Failed to save device type", err);
                }
                let stored = match load_stored_device(&state.db).await {
                    Ok(stored) => stored,
                    Err(err) => return state.internal_error("Failed to load device settings", err),
                };
                next_step(device_type, type_form, &stored)
            }
            None => {
                let stored = match load_stored_device(&state.db).await {
                    Ok(stored) => stored,
                    Err(err) => return state.internal_error("Failed to load device settings", err),
                };
                let errors = type_form.errors;
                let mut type_form = DeviceTypeForm::from_setting(stored.device_type.as_ref());
                type_form.errors = errors;
                DeviceForm::DeviceType(type_form)
            }
        },
    };

    render_device(&req, &state, &csrf_store, &form, flash)
}

/// The form following a saved device type, pre-filled from stored settings.
fn next_step(device_type: i64, type_form: DeviceTypeForm, stored: &StoredDevice) -> DeviceForm {
    match device_type {
        DEVICE_TYPE_NETWORK => DeviceForm::Network(stored.network_form()),
        DEVICE_TYPE_SERIAL => DeviceForm::Serial(stored.serial_form()),
        _ => DeviceForm::DeviceType(type_form),
    }
}

fn render_device(
    req: &HttpRequest,
    state: &AppState,
    csrf_store: &CsrfTokenStore,
    form: &DeviceForm,
    flash: Option<FlashMessage>,
) -> HttpResponse {
    let mut page = state
        .page()
        .with_csrf_token(issue_csrf_token(req, csrf_store))
        .with_active("device");
    if let Some(user) = req.current_user() {
        page = page.with_user(&user);
    }
    if let Some(message) = flash {
        page.flash(message);
    }
    state.render_page(
        "settings/device.html",
        page.to_value(context! {
            form => form,
            device_type_choices => DEVICE_TYPE_CHOICES,
            baudrate_choices => BAUDRATE_CHOICES,
        }),
    )
}
