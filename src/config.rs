use std::{env, net::{SocketAddr, ToSocketAddrs as _}, str::FromStr, time::Duration};

use chrono_tz::Tz;
use sea_orm::ConnectOptions;
use tracing::info;

use crate::{
    consts::{
        DEFAULT_PAY_CYCLE_LENGTH_MONTHS, DEFAULT_PAY_CYCLE_START_DAY, DEFAULT_STORAGE_TIMEOUT_SECS, DEFAULT_TICK_SECS,
        DEFAULT_TIMEZONE, DEFAULT_WORKER_POOL,
    },
    payroll::{generation::GenerationSettings, window::PayCycle},
    scheduler::{SchedulerConfig, TriggerPoint},
};

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    pub scheduler: SchedulerConfig,

    pub generation: GenerationSettings,
}

pub fn load() -> Config {
    Config {
        host_address: load_host_address(),
        database_opt: load_database_opt().into(),
        jwt_key: load_jwt_key(),
        scheduler: SchedulerConfig {
            trigger: load_trigger(),
            timezone: load_timezone(),
            tick: Duration::from_secs(load_parsed("PAYROLL_TICK_SECS", DEFAULT_TICK_SECS).max(1)),
        },
        generation: GenerationSettings {
            cycle: load_pay_cycle(),
            generate_entries: load_parsed("PAYROLL_GENERATE_ENTRIES", true),
            worker_pool: load_parsed("PAYROLL_WORKER_POOL", DEFAULT_WORKER_POOL).max(1),
            storage_timeout: Duration::from_secs(load_parsed("STORAGE_TIMEOUT_SECS", DEFAULT_STORAGE_TIMEOUT_SECS)),
        },
    }
}

fn load_host_address() -> SocketAddr {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());

    var.to_socket_addrs()
        .expect("`HOST_ADDRESS` is not in a valid format").nth(0)
        .expect("unable to resolve host from `HOST_ADDRESS`")
}

fn load_database_opt() -> impl Into<ConnectOptions> {
    info!("Loading environment `DATABASE_URL`");

    env::var("DATABASE_URL").expect("Environment `DATABASE_URL` is required to be set")
}

fn load_jwt_key() -> String {
    info!("Loading environment `JWT_SECRET`");

    env::var("JWT_SECRET").expect("Environment `JWT_SECRET` is required to be set")
}

fn load_timezone() -> Tz {
    info!("Loading environment `PAYROLL_TIMEZONE`");

    let var = env::var("PAYROLL_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());

    var.parse().expect("`PAYROLL_TIMEZONE` is not a known IANA time zone")
}

fn load_trigger() -> TriggerPoint {
    info!("Loading environment `PAYROLL_TRIGGER`");

    match env::var("PAYROLL_TRIGGER") {
        Ok(var) => var.parse().expect("`PAYROLL_TRIGGER` is not in HH:MM format"),
        Err(_) => TriggerPoint::default(),
    }
}

fn load_pay_cycle() -> PayCycle {
    let start_day = load_parsed("PAY_CYCLE_START_DAY", DEFAULT_PAY_CYCLE_START_DAY);
    let length_months = load_parsed("PAY_CYCLE_LENGTH_MONTHS", DEFAULT_PAY_CYCLE_LENGTH_MONTHS);

    PayCycle::new(start_day, length_months).expect("`PAY_CYCLE_START_DAY` or `PAY_CYCLE_LENGTH_MONTHS` is out of range")
}

/// Reads an optional variable, panicking when it is set but unparseable.
fn load_parsed<T: FromStr>(name: &str, default: T) -> T {
    info!("Loading environment `{name}`");

    match env::var(name) {
        Ok(var) => var.trim().parse().unwrap_or_else(|_| panic!("`{name}` is not in a valid format")),
        Err(_) => default,
    }
}
