use chrono::Local;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, ConnectionTrait, DatabaseConnection,
    EntityTrait as _, PaginatorTrait as _, QueryFilter as _, TransactionTrait as _,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entity::{payroll_entry, payroll_run, prelude::*, worker};

use super::{
    aggregator,
    model::EntryWithWorker,
    query,
    window::{entry_details, PayCycle},
    PayrollError,
};

/// Builds and stores the entry of `worker_id` in run `run_id`.
///
/// Everything happens in one transaction: when any step fails nothing is written.
pub async fn generate_entry_for_worker(
    db: &DatabaseConnection,
    cycle: &PayCycle,
    worker_id: Uuid,
    run_id: Uuid,
) -> Result<EntryWithWorker, PayrollError> {
    if worker_id.is_nil() {
        return Err(PayrollError::invalid("`worker_id` is required"));
    }
    if run_id.is_nil() {
        return Err(PayrollError::invalid("`run_id` is required"));
    }

    let txn = db.begin().await?;

    let Some(worker) = Worker::find_by_id(worker_id).one(&txn).await? else {
        return Err(PayrollError::WorkerNotFound(worker_id));
    };

    let Some(run) = PayrollRun::find_by_id(run_id).one(&txn).await? else {
        return Err(PayrollError::RunNotFound(run_id));
    };

    let existing = PayrollEntry::find()
        .filter(payroll_entry::Column::WorkerId.eq(worker_id))
        .filter(payroll_entry::Column::PayrollRunId.eq(run_id))
        .count(&txn).await?;

    if existing > 0 {
        return Err(PayrollError::DuplicateEntry { worker_id, run_id });
    }

    let window = cycle.window_for(run.date)?;
    let incidence_total = aggregator::incidence_total(&txn, worker_id, &window).await?;

    debug!(
        worker_id = %worker_id,
        run_id = %run_id,
        window_start = %window.start,
        window_end = %window.end,
        incidence_total,
        "incidences aggregated"
    );

    let entry = new_entry(&worker, &run, incidence_total)?
        .insert(&txn).await
        .map_err(|e| PayrollError::from_entry_insert(e, worker_id, run_id))?;

    refresh_run_total(&txn, run_id).await?;

    txn.commit().await?;

    info!(
        worker_id = %worker_id,
        run_id = %run_id,
        base_salary = entry.base_salary,
        total = ?entry.total,
        "payroll entry generated"
    );

    Ok(EntryWithWorker::new(entry, &worker))
}

/// Targets the run with the most recent date.
pub async fn generate_entry_for_current_run(
    db: &DatabaseConnection,
    cycle: &PayCycle,
    worker_id: Uuid,
) -> Result<EntryWithWorker, PayrollError> {
    let Some(run) = query::current_run(db).await? else {
        return Err(PayrollError::NoRuns);
    };

    generate_entry_for_worker(db, cycle, worker_id, run.id).await
}

/// Snapshot of the worker's salary plus the aggregated incidences.
fn new_entry(
    worker: &worker::Model,
    run: &payroll_run::Model,
    incidence_total: i64,
) -> Result<payroll_entry::ActiveModel, PayrollError> {
    let total = worker.base_salary.checked_add(incidence_total).ok_or_else(|| {
        PayrollError::invalid(format!(
            "total of worker {} overflows: base salary {} plus incidences {incidence_total}",
            worker.id, worker.base_salary
        ))
    })?;

    Ok(payroll_entry::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(Local::now().fixed_offset()),
        base_salary: Set(worker.base_salary),
        incidence_total: Set(Some(incidence_total)),
        total: Set(Some(total)),
        details: Set(Some(entry_details(run.date))),
        worker_id: Set(worker.id),
        payroll_run_id: Set(run.id),
    })
}

/// Recomputes a run's stored total from its entries.
pub(crate) async fn refresh_run_total<C: ConnectionTrait>(db: &C, run_id: Uuid) -> Result<i64, PayrollError> {
    let total = query::run_total(db, run_id).await?;

    PayrollRun::update_many()
        .col_expr(payroll_run::Column::TotalAmount, Expr::value(total))
        .filter(payroll_run::Column::Id.eq(run_id))
        .exec(db).await?;

    Ok(total)
}
