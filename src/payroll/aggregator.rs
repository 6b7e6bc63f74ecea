use sea_orm::{ColumnTrait as _, ConnectionTrait, EntityTrait as _, QueryFilter as _};
use uuid::Uuid;

use crate::entity::{incidence, prelude::*};

use super::{window::DateWindow, PayrollError};

/// Signed sum of incidences: additions add, deductions subtract.
pub fn aggregate<'a>(incidences: impl IntoIterator<Item = &'a incidence::Model>) -> i64 {
    incidences.into_iter().map(incidence::Model::signed_amount).sum()
}

/// Loads a worker's incidences for `window` and aggregates them. Zero when there are none.
pub async fn incidence_total<C: ConnectionTrait>(
    db: &C,
    worker_id: Uuid,
    window: &DateWindow,
) -> Result<i64, PayrollError> {
    let incidences = Incidence::find()
        .filter(incidence::Column::WorkerId.eq(worker_id))
        .filter(incidence::Column::Date.between(window.start, window.end))
        .all(db).await?;

    Ok(aggregate(&incidences))
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate};

    use super::*;

    use crate::payroll::testing::{date, insert_incidence, insert_worker, setup_db};

    fn incidence(worker_id: Option<Uuid>, date: NaiveDate, amount: i64, is_deduction: bool) -> incidence::Model {
        incidence::Model {
            id: Uuid::new_v4(),
            created_at: Local::now().into(),
            date,
            amount,
            is_deduction,
            reason: String::new(),
            worker_id,
        }
    }

    #[test]
    fn test_aggregate() {
        let worker = Some(Uuid::new_v4());
        let incidences = [
            incidence(worker, date(2024, 10, 1), 50_000, false),
            incidence(worker, date(2024, 10, 2), 20_000, true),
        ];

        assert_eq!(aggregate(&incidences), 30_000);
        assert_eq!(aggregate(&[] as &[incidence::Model]), 0);
    }

    #[actix_web::test]
    async fn test_incidence_total() {
        let db = setup_db().await;

        let worker = insert_worker(&db, "Ana", 2_000_000, date(2023, 1, 1), None).await;
        let other = insert_worker(&db, "Luis", 1_500_000, date(2023, 1, 1), None).await;

        insert_incidence(&db, Some(worker.id), date(2024, 9, 25), 50_000, false).await;
        insert_incidence(&db, Some(worker.id), date(2024, 10, 20), 20_000, true).await;
        insert_incidence(&db, Some(worker.id), date(2024, 10, 21), 70_000, false).await;
        insert_incidence(&db, Some(other.id), date(2024, 10, 1), 10_000, false).await;
        insert_incidence(&db, Some(other.id), date(2024, 9, 20), 5_000, false).await;
        insert_incidence(&db, Some(other.id), date(2024, 9, 19), 8_000, false).await;
        insert_incidence(&db, None, date(2024, 10, 1), 10_000, true).await;

        let window = DateWindow::new(date(2024, 9, 20), date(2024, 10, 20)).unwrap();

        assert_eq!(incidence_total(&db, worker.id, &window).await.unwrap(), 30_000);
        assert_eq!(incidence_total(&db, other.id, &window).await.unwrap(), 15_000);
        assert_eq!(incidence_total(&db, Uuid::new_v4(), &window).await.unwrap(), 0);
    }
}
