use std::{future::Future, sync::Arc, time::Duration};

use chrono::{Local, NaiveDate};
use futures_util::{stream, StreamExt as _};
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ColumnTrait as _, Condition, ConnectionTrait, DatabaseConnection,
    EntityTrait as _, QueryFilter as _, QueryOrder as _,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    consts::{DEFAULT_STORAGE_TIMEOUT_SECS, DEFAULT_WORKER_POOL, GENERATION_MARKER_KEY},
    entity::{prelude::*, scheduler_state, worker},
    scheduler::ScheduledJob,
};

use super::{
    builder,
    model::{EntryWithWorker, GenerationReport, NewRun, WorkerFailure},
    query, run,
    window::PayCycle,
    PayrollError,
};

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub cycle: PayCycle,
    /// When unset, generation only creates the run.
    pub generate_entries: bool,
    /// Maximum number of entries built at once.
    pub worker_pool: usize,
    pub storage_timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            cycle: PayCycle::default(),
            generate_entries: true,
            worker_pool: DEFAULT_WORKER_POOL,
            storage_timeout: Duration::from_secs(DEFAULT_STORAGE_TIMEOUT_SECS),
        }
    }
}

async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, PayrollError>>,
) -> Result<T, PayrollError> {
    tokio::time::timeout(limit, call).await
        .map_err(|_| PayrollError::StorageTimeout(limit))?
}

/// Workers employed on `day`: started on or before it and not retired by then.
pub async fn active_workers<C: ConnectionTrait>(db: &C, day: NaiveDate) -> Result<Vec<worker::Model>, PayrollError> {
    Ok(Worker::find()
        .filter(worker::Column::ActiveSince.lte(day))
        .filter(
            Condition::any()
                .add(worker::Column::RetiredAt.is_null())
                .add(worker::Column::RetiredAt.gt(day)),
        )
        .order_by_asc(worker::Column::LastName)
        .order_by_asc(worker::Column::FirstName)
        .all(db).await?)
}

/// Creates the run dated `day` and, unless disabled, builds an entry for every active worker.
///
/// A worker whose entry fails is reported in [`GenerationReport::failed`] and does not stop the others.
pub async fn generate_run(
    db: &DatabaseConnection,
    settings: &GenerationSettings,
    day: NaiveDate,
) -> Result<GenerationReport, PayrollError> {
    let limit = settings.storage_timeout;
    let run = with_timeout(limit, run::create_run(db, NewRun { date: day, status: None })).await?;

    if !settings.generate_entries {
        info!(run_id = %run.id, date = %day, "payroll run generated without entries");
        return Ok(GenerationReport { run, entries: Vec::new(), failed: Vec::new() });
    }

    let workers = with_timeout(limit, active_workers(db, day)).await?;
    let cycle = settings.cycle;
    let run_id = run.id;

    let outcomes: Vec<(Uuid, Result<EntryWithWorker, PayrollError>)> = stream::iter(workers)
        .map(|worker| async move {
            let outcome = with_timeout(limit, builder::generate_entry_for_worker(db, &cycle, worker.id, run_id)).await;
            (worker.id, outcome)
        })
        .buffer_unordered(settings.worker_pool.max(1))
        .collect().await;

    let mut entries = Vec::with_capacity(outcomes.len());
    let mut failed = Vec::new();

    for (worker_id, outcome) in outcomes {
        match outcome {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(worker_id = %worker_id, run_id = %run_id, error = %e, "unable to generate payroll entry");
                failed.push(WorkerFailure { worker_id, error: e.to_string() });
            }
        }
    }

    entries.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));

    // Entries built concurrently may each have missed the others in their own recount
    with_timeout(limit, builder::refresh_run_total(db, run_id)).await?;
    let run = with_timeout(limit, query::get_run(db, run_id)).await?
        .ok_or(PayrollError::RunNotFound(run_id))?;

    let report = GenerationReport { run, entries, failed };

    info!(
        run_id = %run_id,
        date = %day,
        total_amount = report.run.total_amount,
        generated = report.entries.len(),
        failed = ?report.failed_worker_ids(),
        "payroll run generated"
    );

    Ok(report)
}

/// Scheduled payroll generation, with its marker kept in `scheduler_state`.
///
/// Shares the connection pool of the HTTP side.
pub struct PayrollJob {
    db: Arc<DatabaseConnection>,
    settings: GenerationSettings,
}

impl PayrollJob {
    pub fn new(db: Arc<DatabaseConnection>, settings: GenerationSettings) -> Self {
        Self { db, settings }
    }
}

impl ScheduledJob for PayrollJob {
    type Output = GenerationReport;
    type Error = PayrollError;

    async fn last_fired(&self) -> Result<Option<NaiveDate>, PayrollError> {
        let marker = with_timeout(self.settings.storage_timeout, async {
            Ok::<_, PayrollError>(SchedulerState::find_by_id(GENERATION_MARKER_KEY).one(self.db.as_ref()).await?)
        })
        .await?;

        Ok(marker.map(|m| m.last_fired_on))
    }

    async fn mark_fired(&self, day: NaiveDate) -> Result<(), PayrollError> {
        let marker = scheduler_state::ActiveModel {
            key: Set(GENERATION_MARKER_KEY.to_string()),
            last_fired_on: Set(day),
            updated_at: Set(Local::now().fixed_offset()),
        };

        let upsert = SchedulerState::insert(marker)
            .on_conflict(
                OnConflict::column(scheduler_state::Column::Key)
                    .update_columns([scheduler_state::Column::LastFiredOn, scheduler_state::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref());

        with_timeout(self.settings.storage_timeout, async { Ok::<_, PayrollError>(upsert.await?) }).await?;

        Ok(())
    }

    async fn run(&self, day: NaiveDate) -> Result<GenerationReport, PayrollError> {
        generate_run(&self.db, &self.settings, day).await
    }
}
