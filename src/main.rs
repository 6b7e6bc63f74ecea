use std::fs::OpenOptions;

use actix_web::{web, App, HttpServer};
use migration::{Migrator, MigratorTrait as _};
use sea_orm::Database;
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{filter, fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::{
    auth::Authority,
    payroll::generation::PayrollJob,
    scheduler::SystemClock,
};

mod config;
mod consts;
mod utils;

mod entity;
mod auth;
mod pages;
mod payroll;
mod scheduler;

#[actix_web::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open("trace.log")
        .expect("Unable to open `trace.log`");

    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_line_number(true)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(log_file)
                .with_filter(filter::LevelFilter::from_level(Level::TRACE))
        );

    tracing::subscriber::set_global_default(subscriber).expect("Unable to install tracing subscriber");

    let config::Config {
        host_address,
        database_opt,
        jwt_key,
        scheduler: scheduler_config,
        generation,
    } = config::load();

    let database = Database::connect(database_opt).await.expect("Unable to connect to database");
    Migrator::up(&database, None).await.expect("Unable to run database migrations");

    let database = web::Data::new(database);

    let scheduler_handle = scheduler::start_scheduler(
        scheduler_config,
        PayrollJob::new(database.clone().into_inner(), generation),
        SystemClock,
    );

    let authority = web::Data::new(Authority::new(jwt_key.as_bytes()));
    let generation = web::Data::new(generation);
    let scheduler_config = web::Data::new(scheduler_config);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(database.clone())
            .app_data(authority.clone())
            .app_data(generation.clone())
            .app_data(scheduler_config.clone())
            .wrap(TracingLogger::default())
            .configure(pages::config)
    });

    let result = match server.bind(host_address) {
        Ok(server) => {
            info!(%host_address, "payroll service listening");
            server.run().await
        }
        Err(e) => Err(e),
    };

    scheduler_handle.stop().await;

    result.expect("HTTP server failed");
}
