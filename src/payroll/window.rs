use chrono::{Datelike as _, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PAY_CYCLE_LENGTH_MONTHS, DEFAULT_PAY_CYCLE_START_DAY, MAX_PAY_CYCLE_START_DAY};

use super::PayrollError;

/// Closed date range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PayrollError> {
        if end < start {
            return Err(PayrollError::invalid(format!("window end {end} is before its start {start}")));
        }

        Ok(Self { start, end })
    }
}

/// Boundaries of the period over which incidences are aggregated for one run.
///
/// A cycle anchored on a run date ends on `start_day` of the run's month and
/// starts on `start_day` of the month `length_months` earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayCycle {
    start_day: u32,
    length_months: u32,
}

impl Default for PayCycle {
    fn default() -> Self {
        Self {
            start_day: DEFAULT_PAY_CYCLE_START_DAY,
            length_months: DEFAULT_PAY_CYCLE_LENGTH_MONTHS,
        }
    }
}

impl PayCycle {
    pub fn new(start_day: u32, length_months: u32) -> Result<Self, PayrollError> {
        if !(1..=MAX_PAY_CYCLE_START_DAY).contains(&start_day) {
            return Err(PayrollError::invalid(format!(
                "pay cycle start day must be within 1..={MAX_PAY_CYCLE_START_DAY}, got {start_day}"
            )));
        }

        if length_months == 0 {
            return Err(PayrollError::invalid("pay cycle must last at least one month"));
        }

        Ok(Self { start_day, length_months })
    }

    pub fn window_for(&self, anchor: NaiveDate) -> Result<DateWindow, PayrollError> {
        let out_of_range = || PayrollError::invalid(format!("date {anchor} is out of the supported range"));

        let end = anchor.with_day(self.start_day).ok_or_else(out_of_range)?;
        let start = end.checked_sub_months(Months::new(self.length_months)).ok_or_else(out_of_range)?;

        DateWindow::new(start, end)
    }
}

/// Human readable description stored on every generated entry.
pub fn entry_details(anchor: NaiveDate) -> String {
    format!("Payroll for month of {}, plus incidences if applicable", anchor.format("%B"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::payroll::testing::date;

    #[test]
    fn test_default_window() {
        let window = PayCycle::default().window_for(date(2024, 10, 1)).unwrap();

        assert_eq!(window, DateWindow { start: date(2024, 9, 20), end: date(2024, 10, 20) });
    }

    #[test]
    fn test_window_crosses_year() {
        let window = PayCycle::default().window_for(date(2024, 1, 31)).unwrap();

        assert_eq!(window.start, date(2023, 12, 20));
        assert_eq!(window.end, date(2024, 1, 20));
    }

    #[test]
    fn test_configured_window() {
        let cycle = PayCycle::new(1, 3).unwrap();
        let window = cycle.window_for(date(2024, 5, 17)).unwrap();

        assert_eq!(window.start, date(2024, 2, 1));
        assert_eq!(window.end, date(2024, 5, 1));
    }

    #[test]
    fn test_invalid_cycle() {
        assert!(matches!(PayCycle::new(0, 1), Err(PayrollError::InvalidInput(_))));
        assert!(matches!(PayCycle::new(29, 1), Err(PayrollError::InvalidInput(_))));
        assert!(matches!(PayCycle::new(20, 0), Err(PayrollError::InvalidInput(_))));
    }

    #[test]
    fn test_window_bounds() {
        assert!(DateWindow::new(date(2024, 10, 20), date(2024, 10, 20)).is_ok());
        assert!(matches!(
            DateWindow::new(date(2024, 10, 21), date(2024, 10, 20)),
            Err(PayrollError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_entry_details() {
        assert_eq!(entry_details(date(2024, 10, 1)), "Payroll for month of October, plus incidences if applicable");
    }
}
