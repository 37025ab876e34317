// This file is part of the product ad2web.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use ad2web::app_state::AppState;
use ad2web::bootstrap::{self, BootstrapResult};
use ad2web::config::ValidatedConfig;
use ad2web::iam::{JwtAuthMiddlewareFactory, UserServices};
use ad2web::runtime_paths::RuntimePaths;
use ad2web::util::{self, CsrfTokenStore};

const HELP_TEXT: &str = "\
Usage: ad2web [-C <root>]

Options:
  -C <root>   Runtime directory holding config.yaml, the database and uploads (default: .)
  -h, --help  Show this help
";

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if matches!(parsed_args.mode, RunMode::Help) {
        print!("{}", HELP_TEXT);
        return 0;
    }

    let bootstrap = match bootstrap::bootstrap_runtime(&parsed_args.runtime_root) {
        Ok(result) => result,
        Err(error) => {
            eprintln!("❌ Bootstrap error: {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    match System::new().block_on(run_server(bootstrap)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(bootstrap: BootstrapResult) -> std::io::Result<()> {
    let validated_config = Arc::new(bootstrap.validated_config);
    let runtime_paths = bootstrap.runtime_paths;
    let database = bootstrap.database;

    // Configure logging with a stable format
    let logger = env_logger::Builder::from_default_env()
        .filter_level(validated_config.logging.level_filter())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build();

    util::init_logger(util::default_level_rules(), logger).map_err(|error| {
        eprintln!("❌ Failed to initialize logger: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    log_startup_info(&validated_config, &runtime_paths);

    let user_services = match UserServices::new(&validated_config, database.clone()) {
        Ok(services) => Arc::new(services),
        Err(error) => {
            eprintln!("❌ Failed to initialize user services: {}", error);
            eprintln!("❌ Application cannot start without user services.");
            return Err(std::io::Error::other(error.to_string()));
        }
    };
    info!("✅ User services initialized successfully");

    let app_state = Arc::new(AppState::new(
        &validated_config.app.name,
        runtime_paths,
        database,
    ));
    info!(
        "✅ App state initialized with app name: {}",
        validated_config.app.name
    );

    let csrf_store = Arc::new(CsrfTokenStore::new());
    info!("✅ CSRF token store initialized successfully");

    let bind_address = (
        validated_config.server.host.clone(),
        validated_config.server.port,
    );
    let workers = validated_config.server.workers;

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(validated_config.clone()))
            .app_data(web::Data::from(app_state.clone()))
            .app_data(web::Data::from(user_services.clone()))
            .app_data(web::Data::from(csrf_store.clone()))
            .wrap(JwtAuthMiddlewareFactory)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .configure(ad2web::configure)
    })
    .workers(workers)
    .bind(bind_address)?
    .run()
    .await
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    info!("Starting {} - {}", config.app.name, config.app.description);
    info!("Workers: {}", config.server.workers);
    info!(
        "Listening on http://{}:{}",
        config.server.host, config.server.port
    );
    if !config.is_localhost_only() {
        info!("Session cookies are marked Secure; serve through HTTPS");
    }

    info!("Config file: {}", runtime_paths.config_file.display());
    info!(
        "Database file (canonical): {}",
        runtime_paths.database_file.display()
    );
    info!(
        "Upload directory (canonical): {}",
        runtime_paths.upload_dir.display()
    );
    info!("Runtime root: {}", runtime_paths.root.display());

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {}", current_dir.display());
    }
}

#[derive(Debug)]
enum RunMode {
    Serve,
    Help,
}

struct ParsedArgs {
    runtime_root: PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            return Err(format!("Unexpected argument: {}", arg));
        }
    }

    Ok(ParsedArgs {
        runtime_root: make_runtime_root_absolute(runtime_root)?,
        mode: RunMode::Serve,
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}
