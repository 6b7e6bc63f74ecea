use std::str::FromStr;

use actix_web::{delete, dev, get, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::Admin,
    entity::payroll_run,
    payroll::{
        builder,
        generation::{self, GenerationSettings},
        model::{EntryFilter, NewRun, RunFilter},
        query, run, PayrollError,
    },
    scheduler::SchedulerConfig,
};

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(list_runs)
        .service(generate_run)
        .service(create_run)
        .service(get_run)
        .service(pay_run)
        .service(reset_run)
        .service(create_current_entry)
        .service(create_entry)
        .service(get_worker_entries)
        .service(get_month_entries);
}

#[get("/runs")]
async fn list_runs(db: web::Data<DatabaseConnection>, _admin: Admin, filter: web::Query<RunFilter>) -> Result<impl Responder, PayrollError> {
    let runs = query::list_runs(db.as_ref(), &filter).await?;

    Ok(web::Json(runs))
}

/// Generates today's run on demand, the same way the scheduler does.
#[post("/runs/generate")]
async fn generate_run(
    db: web::Data<DatabaseConnection>,
    _admin: Admin,
    settings: web::Data<GenerationSettings>,
    scheduler: web::Data<SchedulerConfig>,
) -> Result<impl Responder, PayrollError> {
    let today = Utc::now().with_timezone(&scheduler.timezone).date_naive();

    let report = generation::generate_run(db.as_ref(), &settings, today).await?;

    Ok(HttpResponse::Created().json(web::Json(report)))
}

#[post("/runs")]
async fn create_run(db: web::Data<DatabaseConnection>, _admin: Admin, payload: web::Json<NewRun>) -> Result<impl Responder, PayrollError> {
    let run = run::create_run(db.as_ref(), payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(web::Json(run)))
}

#[get("/runs/{run_id}")]
async fn get_run(_admin: Admin, run: payroll_run::Model) -> impl Responder {
    web::Json(run)
}

#[post("/runs/{run_id}/pay")]
async fn pay_run(db: web::Data<DatabaseConnection>, _admin: Admin, run: payroll_run::Model) -> Result<impl Responder, PayrollError> {
    let run = run::mark_run_paid(db.as_ref(), run.id).await?;

    Ok(web::Json(run))
}

/// Runs are never removed; deleting one only reverts it to unpaid.
#[delete("/runs/{run_id}")]
async fn reset_run(db: web::Data<DatabaseConnection>, _admin: Admin, run: payroll_run::Model) -> Result<impl Responder, PayrollError> {
    let run = run::reset_run_to_unpaid(db.as_ref(), run.id).await?;

    Ok(web::Json(run))
}

/// Adds an entry to the run with the most recent date.
#[post("/runs/current/entries")]
async fn create_current_entry(
    db: web::Data<DatabaseConnection>,
    _admin: Admin,
    settings: web::Data<GenerationSettings>,
    payload: web::Json<CreateEntry>,
) -> Result<impl Responder, PayrollError> {
    let entry = builder::generate_entry_for_current_run(db.as_ref(), &settings.cycle, payload.worker_id).await?;

    Ok(HttpResponse::Created().json(web::Json(entry)))
}

#[post("/runs/{run_id}/entries")]
async fn create_entry(
    db: web::Data<DatabaseConnection>,
    _admin: Admin,
    settings: web::Data<GenerationSettings>,
    run: payroll_run::Model,
    payload: web::Json<CreateEntry>,
) -> Result<impl Responder, PayrollError> {
    let entry = builder::generate_entry_for_worker(db.as_ref(), &settings.cycle, payload.worker_id, run.id).await?;

    Ok(HttpResponse::Created().json(web::Json(entry)))
}

#[get("/workers/{worker_id}/entries")]
async fn get_worker_entries(
    db: web::Data<DatabaseConnection>,
    _admin: Admin,
    worker_id: web::Path<Uuid>,
    filter: web::Query<EntryFilter>,
) -> Result<impl Responder, PayrollError> {
    let entries = query::list_worker_entries(db.as_ref(), worker_id.into_inner(), &filter).await?;

    Ok(web::Json(entries))
}

#[get("/entries")]
async fn get_month_entries(db: web::Data<DatabaseConnection>, _admin: Admin, period: web::Query<MonthQuery>) -> Result<impl Responder, PayrollError> {
    let entries = query::list_month_entries(db.as_ref(), period.month, period.year).await?;

    Ok(web::Json(entries))
}
