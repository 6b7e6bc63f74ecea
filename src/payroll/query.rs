use chrono::Datelike as _;
use sea_orm::{
    ColumnTrait as _, ConnectionTrait, EntityTrait as _, JoinType, QueryFilter as _, QueryOrder as _, QuerySelect as _,
    RelationTrait as _,
};
use uuid::Uuid;

use crate::{
    entity::{payroll_entry, payroll_run, prelude::*, worker},
    utils,
};

use super::{
    model::{validate_month, validate_year, EntryFilter, EntryWithWorker, RunFilter},
    PayrollError,
};

/// Runs matching every given filter, most recent first.
pub async fn list_runs<C: ConnectionTrait>(db: &C, filter: &RunFilter) -> Result<Vec<payroll_run::Model>, PayrollError> {
    filter.validate()?;

    let mut select = PayrollRun::find();

    if let Some(date) = filter.date {
        select = select.filter(payroll_run::Column::Date.eq(date));
    }

    match (filter.month, filter.year) {
        (Some(month), Some(year)) => {
            let (start, end) = month_bounds(year, month)?;
            select = select.filter(payroll_run::Column::Date.between(start, end));
        }
        (None, Some(year)) => {
            let (start, end) = utils::year_range(year)
                .ok_or_else(|| PayrollError::invalid(format!("year {year} is out of range")))?;
            select = select.filter(payroll_run::Column::Date.between(start, end));
        }
        _ => {}
    }

    let runs = select
        .order_by_desc(payroll_run::Column::Date)
        .all(db).await?;

    // A month without a year matches that month of any year
    Ok(match (filter.month, filter.year) {
        (Some(month), None) => runs.into_iter().filter(|run| run.date.month() == month).collect(),
        _ => runs,
    })
}

pub async fn get_run<C: ConnectionTrait>(db: &C, run_id: Uuid) -> Result<Option<payroll_run::Model>, PayrollError> {
    Ok(PayrollRun::find_by_id(run_id).one(db).await?)
}

/// The run with the most recent date, if any run exists.
pub async fn current_run<C: ConnectionTrait>(db: &C) -> Result<Option<payroll_run::Model>, PayrollError> {
    Ok(PayrollRun::find()
        .order_by_desc(payroll_run::Column::Date)
        .order_by_desc(payroll_run::Column::CreatedAt)
        .one(db).await?)
}

pub async fn list_worker_entries<C: ConnectionTrait>(
    db: &C,
    worker_id: Uuid,
    filter: &EntryFilter,
) -> Result<Vec<payroll_entry::Model>, PayrollError> {
    if worker_id.is_nil() {
        return Err(PayrollError::invalid("`worker_id` is required"));
    }
    let period = filter.period()?;

    let mut select = PayrollEntry::find()
        .join(JoinType::InnerJoin, payroll_entry::Relation::PayrollRun.def())
        .filter(payroll_entry::Column::WorkerId.eq(worker_id));

    if filter.current {
        let Some(current) = current_run(db).await? else {
            return Ok(Vec::new());
        };
        select = select.filter(payroll_run::Column::Date.eq(current.date));
    }

    if let Some(status) = filter.status() {
        select = select.filter(payroll_run::Column::Status.eq(status));
    }

    if let Some((year, month)) = period {
        let (start, end) = month_bounds(year, month)?;
        select = select.filter(payroll_run::Column::Date.between(start, end));
    }

    Ok(select
        .order_by_desc(payroll_run::Column::Date)
        .all(db).await?)
}

/// Every entry whose run falls in the given month, with worker names, for reporting.
pub async fn list_month_entries<C: ConnectionTrait>(
    db: &C,
    month: u32,
    year: i32,
) -> Result<Vec<EntryWithWorker>, PayrollError> {
    let (start, end) = month_bounds(year, month)?;

    Ok(PayrollEntry::find()
        .column_as(worker::Column::FirstName, "first_name")
        .column_as(worker::Column::LastName, "last_name")
        .join(JoinType::InnerJoin, payroll_entry::Relation::Worker.def())
        .join(JoinType::InnerJoin, payroll_entry::Relation::PayrollRun.def())
        .filter(payroll_run::Column::Date.between(start, end))
        .order_by_asc(worker::Column::LastName)
        .order_by_asc(worker::Column::FirstName)
        .into_model::<EntryWithWorker>()
        .all(db).await?)
}

/// Sum of the totals of a run's entries. Entries without a total count as zero.
pub async fn run_total<C: ConnectionTrait>(db: &C, run_id: Uuid) -> Result<i64, PayrollError> {
    let totals: Vec<Option<i64>> = PayrollEntry::find()
        .select_only()
        .column(payroll_entry::Column::Total)
        .filter(payroll_entry::Column::PayrollRunId.eq(run_id))
        .into_tuple()
        .all(db).await?;

    Ok(totals.into_iter().flatten().sum())
}

fn month_bounds(year: i32, month: u32) -> Result<(chrono::NaiveDate, chrono::NaiveDate), PayrollError> {
    let month = validate_month(month)?;
    let year = validate_year(year)?;

    utils::month_range(year, month)
        .ok_or_else(|| PayrollError::invalid(format!("{year}-{month:02} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        entity::sea_orm_active_enums::RunStatus,
        payroll::{
            builder::generate_entry_for_worker,
            model::NewRun,
            run::{create_run, mark_run_paid},
            testing::{date, insert_worker, setup_db},
            window::PayCycle,
        },
    };

    #[actix_web::test]
    async fn test_list_runs_filters() {
        let db = setup_db().await;

        let jan = create_run(&db, NewRun { date: date(2024, 1, 20), status: None }).await.unwrap();
        let feb = create_run(&db, NewRun { date: date(2024, 2, 20), status: None }).await.unwrap();
        let old_jan = create_run(&db, NewRun { date: date(2023, 1, 20), status: None }).await.unwrap();

        let all = list_runs(&db, &RunFilter::default()).await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![feb.id, jan.id, old_jan.id]);

        let by_month = list_runs(&db, &RunFilter { month: Some(1), year: Some(2024), date: None }).await.unwrap();
        assert_eq!(by_month, vec![jan.clone()]);

        let any_january = list_runs(&db, &RunFilter { month: Some(1), ..Default::default() }).await.unwrap();
        assert_eq!(any_january.iter().map(|r| r.id).collect::<Vec<_>>(), vec![jan.id, old_jan.id]);

        let by_year = list_runs(&db, &RunFilter { year: Some(2023), ..Default::default() }).await.unwrap();
        assert_eq!(by_year, vec![old_jan]);

        let by_date = list_runs(&db, &RunFilter { date: Some(date(2024, 2, 20)), ..Default::default() }).await.unwrap();
        assert_eq!(by_date, vec![feb.clone()]);

        // Filters combine with AND
        let none = list_runs(&db, &RunFilter { date: Some(date(2024, 2, 20)), month: Some(1), year: Some(2024) }).await.unwrap();
        assert!(none.is_empty());

        assert!(matches!(
            list_runs(&db, &RunFilter { month: Some(13), ..Default::default() }).await,
            Err(PayrollError::InvalidInput(_))
        ));

        assert_eq!(get_run(&db, feb.id).await.unwrap(), Some(feb));
        assert_eq!(get_run(&db, Uuid::new_v4()).await.unwrap(), None);
    }

    #[actix_web::test]
    async fn test_worker_entry_filters() {
        let db = setup_db().await;
        let cycle = PayCycle::default();

        let worker = insert_worker(&db, "Ana", 2_000_000, date(2020, 1, 1), None).await;

        let jan = create_run(&db, NewRun { date: date(2024, 1, 20), status: None }).await.unwrap();
        let feb = create_run(&db, NewRun { date: date(2024, 2, 20), status: None }).await.unwrap();

        let jan_entry = generate_entry_for_worker(&db, &cycle, worker.id, jan.id).await.unwrap();
        let feb_entry = generate_entry_for_worker(&db, &cycle, worker.id, feb.id).await.unwrap();

        mark_run_paid(&db, jan.id).await.unwrap();

        let ids = |entries: Vec<payroll_entry::Model>| entries.into_iter().map(|e| e.id).collect::<Vec<_>>();

        let all = list_worker_entries(&db, worker.id, &EntryFilter::default()).await.unwrap();
        assert_eq!(ids(all), vec![feb_entry.id, jan_entry.id]);

        let current = list_worker_entries(&db, worker.id, &EntryFilter { current: true, ..Default::default() }).await.unwrap();
        assert_eq!(ids(current), vec![feb_entry.id]);

        let paid = list_worker_entries(&db, worker.id, &EntryFilter { paid: true, ..Default::default() }).await.unwrap();
        assert_eq!(ids(paid), vec![jan_entry.id]);

        let unpaid = list_worker_entries(&db, worker.id, &EntryFilter { unpaid: true, ..Default::default() }).await.unwrap();
        assert_eq!(ids(unpaid), vec![feb_entry.id]);

        // `paid` wins over `unpaid`
        let both = list_worker_entries(&db, worker.id, &EntryFilter { paid: true, unpaid: true, ..Default::default() }).await.unwrap();
        assert_eq!(ids(both), vec![jan_entry.id]);

        let current_paid = list_worker_entries(&db, worker.id, &EntryFilter { current: true, paid: true, ..Default::default() }).await.unwrap();
        assert!(current_paid.is_empty());

        let feb_only = list_worker_entries(&db, worker.id, &EntryFilter { month: Some(2), year: Some(2024), ..Default::default() }).await.unwrap();
        assert_eq!(ids(feb_only), vec![feb_entry.id]);

        assert!(list_worker_entries(&db, Uuid::new_v4(), &EntryFilter::default()).await.unwrap().is_empty());
        assert!(matches!(
            list_worker_entries(&db, Uuid::nil(), &EntryFilter::default()).await,
            Err(PayrollError::InvalidInput(_))
        ));
    }

    #[actix_web::test]
    async fn test_paid_filter_without_paid_runs_is_empty() {
        let db = setup_db().await;
        let worker = insert_worker(&db, "Ana", 2_000_000, date(2020, 1, 1), None).await;
        let run = create_run(&db, NewRun { date: date(2024, 1, 20), status: None }).await.unwrap();
        generate_entry_for_worker(&db, &PayCycle::default(), worker.id, run.id).await.unwrap();

        let filter = EntryFilter { paid: true, month: Some(1), year: Some(2024), ..Default::default() };
        let entries = list_worker_entries(&db, worker.id, &filter).await.unwrap();

        assert!(entries.is_empty());
        assert_eq!(run.status, RunStatus::Unpaid);
    }

    #[actix_web::test]
    async fn test_current_without_runs_is_empty() {
        let db = setup_db().await;
        let worker = insert_worker(&db, "Ana", 2_000_000, date(2020, 1, 1), None).await;

        let entries = list_worker_entries(&db, worker.id, &EntryFilter { current: true, ..Default::default() }).await.unwrap();

        assert!(entries.is_empty());
        assert_eq!(current_run(&db).await.unwrap(), None);
    }

    #[actix_web::test]
    async fn test_month_report() {
        let db = setup_db().await;
        let cycle = PayCycle::default();

        let ana = insert_worker(&db, "Ana", 2_000_000, date(2020, 1, 1), None).await;
        let luis = insert_worker(&db, "Luis", 1_000_000, date(2020, 1, 1), None).await;

        let jan = create_run(&db, NewRun { date: date(2024, 1, 20), status: None }).await.unwrap();
        let feb = create_run(&db, NewRun { date: date(2024, 2, 20), status: None }).await.unwrap();

        generate_entry_for_worker(&db, &cycle, ana.id, jan.id).await.unwrap();
        generate_entry_for_worker(&db, &cycle, luis.id, jan.id).await.unwrap();
        generate_entry_for_worker(&db, &cycle, ana.id, feb.id).await.unwrap();

        let report = list_month_entries(&db, 1, 2024).await.unwrap();

        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|e| e.payroll_run_id == jan.id));
        assert_eq!(report.iter().map(|e| e.first_name.as_str()).collect::<Vec<_>>(), vec!["Ana", "Luis"]);
        assert_eq!(report[1].total, Some(1_000_000));
        assert_eq!(report[1].last_name, "Doe");

        assert!(list_month_entries(&db, 3, 2024).await.unwrap().is_empty());
        assert!(matches!(list_month_entries(&db, 0, 2024).await, Err(PayrollError::InvalidInput(_))));
        assert!(matches!(list_month_entries(&db, 1, 0).await, Err(PayrollError::InvalidInput(_))));
    }

    #[actix_web::test]
    async fn test_run_total() {
        let db = setup_db().await;
        let cycle = PayCycle::default();

        let ana = insert_worker(&db, "Ana", 2_000_000, date(2020, 1, 1), None).await;
        let luis = insert_worker(&db, "Luis", 1_000_000, date(2020, 1, 1), None).await;
        let run = create_run(&db, NewRun { date: date(2024, 1, 20), status: None }).await.unwrap();

        assert_eq!(run_total(&db, run.id).await.unwrap(), 0);

        generate_entry_for_worker(&db, &cycle, ana.id, run.id).await.unwrap();
        generate_entry_for_worker(&db, &cycle, luis.id, run.id).await.unwrap();

        assert_eq!(run_total(&db, run.id).await.unwrap(), 3_000_000);
        assert_eq!(get_run(&db, run.id).await.unwrap().unwrap().total_amount, 3_000_000);
    }
}
