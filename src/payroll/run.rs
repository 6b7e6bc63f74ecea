use std::{fmt, str::FromStr};

use chrono::Local;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait as _, ActiveValue::Set, ColumnTrait as _, ConnectionTrait, EntityTrait as _,
    QueryFilter as _,
};
use tracing::info;
use uuid::Uuid;

use crate::entity::{payroll_run, prelude::*, sea_orm_active_enums::RunStatus};

use super::{model::NewRun, PayrollError};

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Unpaid => "UNPAID",
            RunStatus::Paid => "PAID",
        }
    }

    /// Status after applying `transition` to a run currently in `self`.
    pub fn apply(self, transition: RunTransition, run_id: Uuid) -> Result<RunStatus, PayrollError> {
        match (self, transition) {
            (RunStatus::Unpaid, RunTransition::Pay) => Ok(RunStatus::Paid),
            (RunStatus::Paid, RunTransition::Pay) => Err(PayrollError::AlreadyPaid(run_id)),
            (_, RunTransition::Reset) => Ok(RunStatus::Unpaid),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = PayrollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(RunStatus::Unpaid),
            "PAID" => Ok(RunStatus::Paid),
            other => Err(PayrollError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTransition {
    Pay,
    /// Administrative reversal, also what deleting a run amounts to.
    Reset,
}

pub async fn create_run<C: ConnectionTrait>(db: &C, new_run: NewRun) -> Result<payroll_run::Model, PayrollError> {
    if let Some(status) = &new_run.status {
        status.parse::<RunStatus>()?;
    }

    let run = payroll_run::ActiveModel {
        id: Set(Uuid::new_v4()),
        created_at: Set(Local::now().fixed_offset()),
        date: Set(new_run.date),
        total_amount: Set(0),
        status: Set(RunStatus::Unpaid),
    }
    .insert(db).await?;

    info!(run_id = %run.id, date = %run.date, "payroll run created");

    Ok(run)
}

pub async fn mark_run_paid<C: ConnectionTrait>(db: &C, run_id: Uuid) -> Result<payroll_run::Model, PayrollError> {
    transition(db, run_id, RunTransition::Pay).await
}

pub async fn reset_run_to_unpaid<C: ConnectionTrait>(db: &C, run_id: Uuid) -> Result<payroll_run::Model, PayrollError> {
    transition(db, run_id, RunTransition::Reset).await
}

async fn transition<C: ConnectionTrait>(
    db: &C,
    run_id: Uuid,
    transition: RunTransition,
) -> Result<payroll_run::Model, PayrollError> {
    let run = find_run(db, run_id).await?;
    let next = run.status.apply(transition, run_id)?;

    let mut update = PayrollRun::update_many()
        .col_expr(payroll_run::Column::Status, Expr::value(next))
        .filter(payroll_run::Column::Id.eq(run_id));

    if transition == RunTransition::Pay {
        // A concurrent payment must not be applied twice
        update = update.filter(payroll_run::Column::Status.eq(RunStatus::Unpaid));
    }

    if update.exec(db).await?.rows_affected == 0 {
        return Err(match transition {
            RunTransition::Pay => PayrollError::AlreadyPaid(run_id),
            RunTransition::Reset => PayrollError::RunNotFound(run_id),
        });
    }

    info!(run_id = %run_id, from = %run.status, to = %next, "payroll run status changed");

    Ok(payroll_run::Model { status: next, ..run })
}

async fn find_run<C: ConnectionTrait>(db: &C, run_id: Uuid) -> Result<payroll_run::Model, PayrollError> {
    PayrollRun::find_by_id(run_id)
        .one(db).await?
        .ok_or(PayrollError::RunNotFound(run_id))
}
