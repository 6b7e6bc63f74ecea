use chrono::NaiveDate;
use sea_orm::{prelude::DateTimeWithTimeZone, FromQueryResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{payroll_entry, payroll_run, sea_orm_active_enums::RunStatus, worker};

use super::PayrollError;

/// A payroll entry joined with the display name of its worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
pub struct EntryWithWorker {
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub base_salary: i64,
    pub incidence_total: Option<i64>,
    pub total: Option<i64>,
    pub details: Option<String>,
    pub worker_id: Uuid,
    pub payroll_run_id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl EntryWithWorker {
    pub fn new(entry: payroll_entry::Model, worker: &worker::Model) -> Self {
        Self {
            id: entry.id,
            created_at: entry.created_at,
            base_salary: entry.base_salary,
            incidence_total: entry.incidence_total,
            total: entry.total,
            details: entry.details,
            worker_id: entry.worker_id,
            payroll_run_id: entry.payroll_run_id,
            first_name: worker.first_name.clone(),
            last_name: worker.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRun {
    pub date: NaiveDate,
    /// Validated, but every run starts `UNPAID` regardless.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunFilter {
    pub date: Option<NaiveDate>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl RunFilter {
    pub fn validate(&self) -> Result<(), PayrollError> {
        if let Some(month) = self.month {
            validate_month(month)?;
        }
        if let Some(year) = self.year {
            validate_year(year)?;
        }

        Ok(())
    }
}

/// Filters for a worker's entries. `paid` wins when both `paid` and `unpaid` are set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub unpaid: bool,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl EntryFilter {
    pub fn status(&self) -> Option<RunStatus> {
        if self.paid {
            Some(RunStatus::Paid)
        } else if self.unpaid {
            Some(RunStatus::Unpaid)
        } else {
            None
        }
    }

    /// Month and year only filter together.
    pub fn period(&self) -> Result<Option<(i32, u32)>, PayrollError> {
        match (self.month, self.year) {
            (Some(month), Some(year)) => Ok(Some((validate_year(year)?, validate_month(month)?))),
            (None, None) => Ok(None),
            _ => Err(PayrollError::invalid("`month` and `year` must be given together")),
        }
    }
}

pub fn validate_month(month: u32) -> Result<u32, PayrollError> {
    if !(1..=12).contains(&month) {
        return Err(PayrollError::invalid(format!("month must be within 1..=12, got {month}")));
    }

    Ok(month)
}

pub fn validate_year(year: i32) -> Result<i32, PayrollError> {
    if year < 1 {
        return Err(PayrollError::invalid(format!("year must be positive, got {year}")));
    }

    Ok(year)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub worker_id: Uuid,
    pub error: String,
}

/// Outcome of generating one run, including the workers whose entry could not be built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run: payroll_run::Model,
    pub entries: Vec<EntryWithWorker>,
    pub failed: Vec<WorkerFailure>,
}

impl GenerationReport {
    pub fn failed_worker_ids(&self) -> Vec<Uuid> {
        self.failed.iter().map(|f| f.worker_id).collect()
    }
}
