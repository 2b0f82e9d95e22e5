use std::process::ExitCode;
use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

mod api;
mod auth;
mod config;
mod docs;
mod gateway;
mod lifecycle;
mod model;
mod models;
mod routes;
mod store;
mod utils;
mod view;

use auth::policy::PermissionPolicy;
use config::Config;
use gateway::{Gateway, Outbox};
use lifecycle::OtgulService;
use store::RecordStore;

use crate::docs::ApiDoc;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Otgul bot is running"
}

/// Queues a fresh card for every pending request so the gateway can
/// re-attach the approve/reject/delete buttons after a restart.
fn restore_pending(service: &OtgulService, outbox: &Outbox) -> anyhow::Result<usize> {
    let pending = service.list_pending_on_startup()?;
    for request in &pending {
        outbox.render_status(request);
    }
    Ok(pending.len())
}

#[actix_web::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Ошибка: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Otgul bot starting...");

    let outbox = Arc::new(Outbox::new(config.outbox_capacity));
    let store = RecordStore::open(&config.data_file);
    let service = Data::new(OtgulService::new(
        store,
        PermissionPolicy::new(config.moderator_roles.clone()),
        outbox.clone(),
        config.default_department.clone(),
    ));

    match restore_pending(&service, &outbox) {
        Ok(0) => {}
        Ok(count) => info!(count, "restored pending otgul requests"),
        Err(e) => {
            error!(error = %e, file = %config.data_file.display(), "Failed to load otgul requests");
            eprintln!("❌ Не удалось прочитать {}: {e}", config.data_file.display());
            return ExitCode::FAILURE;
        }
    }

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let outbox_data = Data::from(outbox);

    let server = match HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(outbox_data.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, addr = %server_addr, "Failed to bind");
            eprintln!("❌ Не удалось открыть {server_addr}: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(addr = %server_addr, "🚀 Otgul bot ready");
    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server stopped with error");
            ExitCode::FAILURE
        }
    }
}
