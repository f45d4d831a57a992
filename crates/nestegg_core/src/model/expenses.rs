//! Expense budget and ledger
//!
//! The budget is a list of [`ExpenseCategory`] annual amounts. The optional
//! ledger of [`Expense`] entries is used to derive an annualized recurring
//! cost and to project lumpy future expenses (multi-year cycles such as a
//! roof or a car, and dated one-time purchases).

use jiff::ToSpan;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::ExpenseId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub name: String,
    pub annual_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExpenseType {
    #[default]
    Household,
    OneTime,
    Recurring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period")]
pub enum Recurrence {
    Monthly,
    Quarterly,
    Yearly,
    /// Repeats every `interval_years` years (must be at least 1)
    MultiYear { interval_years: u32 },
}

impl Recurrence {
    /// Number of occurrences per year, fractional for multi-year cycles
    pub fn per_year(self) -> f64 {
        match self {
            Recurrence::Monthly => 12.0,
            Recurrence::Quarterly => 4.0,
            Recurrence::Yearly => 1.0,
            Recurrence::MultiYear { interval_years } if interval_years > 0 => {
                1.0 / f64::from(interval_years)
            }
            Recurrence::MultiYear { .. } => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub expense_id: ExpenseId,
    pub category: String,
    pub amount: f64,
    pub date: Date,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub expense_type: ExpenseType,
    /// `None` for non-recurring entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

impl Expense {
    /// Annualized recurring cost. Non-recurring entries contribute nothing.
    pub fn annualized_amount(&self) -> f64 {
        self.recurrence
            .map_or(0.0, |recurrence| self.amount * recurrence.per_year())
    }

    /// Lazily project future occurrences of this expense from `as_of` out to
    /// the end of the calendar year `years` years later.
    ///
    /// Only lumpy expenses are projected: multi-year cycles repeat every
    /// interval after the entry date, and dated one-time entries appear once if
    /// they fall inside the window. Regular monthly/quarterly/yearly costs are
    /// part of the annual budget and yield nothing here.
    ///
    /// The iterator is finite and `Clone`, so it can be restarted from any point.
    pub fn occurrences(&self, as_of: Date, years: u16) -> ExpenseOccurrences<'_> {
        let schedule = match (self.recurrence, self.expense_type) {
            (Some(Recurrence::MultiYear { interval_years }), _) if interval_years > 0 => {
                Schedule::Every {
                    interval_years,
                    step: 0,
                }
            }
            (None, ExpenseType::OneTime) => Schedule::Once { done: false },
            _ => Schedule::Once { done: true },
        };
        ExpenseOccurrences {
            expense: self,
            as_of,
            horizon_year: as_of
                .year()
                .saturating_add(i16::try_from(years).unwrap_or(i16::MAX)),
            schedule,
        }
    }
}

#[derive(Debug, Clone)]
enum Schedule {
    Once { done: bool },
    Every { interval_years: u32, step: u32 },
}

/// Iterator over projected future occurrences of one expense
#[derive(Debug, Clone)]
pub struct ExpenseOccurrences<'a> {
    expense: &'a Expense,
    as_of: Date,
    horizon_year: i16,
    schedule: Schedule,
}

fn project(expense: &Expense, as_of: Date, date: Date) -> ProjectedExpense {
    ProjectedExpense {
        expense_id: expense.expense_id,
        category: expense.category.clone(),
        description: expense.description.clone(),
        amount: expense.amount,
        date,
        years_from_now: date.year() - as_of.year(),
    }
}

impl Iterator for ExpenseOccurrences<'_> {
    type Item = ProjectedExpense;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.schedule {
            Schedule::Once { done } => {
                if *done {
                    return None;
                }
                *done = true;
                let date = self.expense.date;
                (date >= self.as_of && date.year() <= self.horizon_year)
                    .then(|| project(self.expense, self.as_of, date))
            }
            Schedule::Every {
                interval_years,
                step,
            } => loop {
                *step += 1;
                let offset = i64::from(*interval_years) * i64::from(*step);
                let date = self.expense.date.checked_add(offset.years()).ok()?;
                if date.year() > self.horizon_year {
                    return None;
                }
                if date >= self.as_of {
                    return Some(project(self.expense, self.as_of, date));
                }
            },
        }
    }
}

/// A future expense occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedExpense {
    pub expense_id: ExpenseId,
    pub category: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: Date,
    pub years_from_now: i16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn expense(amount: f64, on: Date, kind: ExpenseType, recurrence: Option<Recurrence>) -> Expense {
        Expense {
            expense_id: ExpenseId(1),
            category: "Home".to_string(),
            amount,
            date: on,
            description: Some("Roof".to_string()),
            expense_type: kind,
            recurrence,
        }
    }

    #[test]
    fn test_annualized_amounts() {
        let day = date(2024, 1, 15);
        let monthly = expense(1_000.0, day, ExpenseType::Recurring, Some(Recurrence::Monthly));
        let quarterly = expense(900.0, day, ExpenseType::Recurring, Some(Recurrence::Quarterly));
        let yearly = expense(2_400.0, day, ExpenseType::Recurring, Some(Recurrence::Yearly));
        let multi = expense(
            30_000.0,
            day,
            ExpenseType::Recurring,
            Some(Recurrence::MultiYear { interval_years: 5 }),
        );
        let once = expense(5_000.0, day, ExpenseType::OneTime, None);

        assert_eq!(monthly.annualized_amount(), 12_000.0);
        assert_eq!(quarterly.annualized_amount(), 3_600.0);
        assert_eq!(yearly.annualized_amount(), 2_400.0);
        assert_eq!(multi.annualized_amount(), 6_000.0);
        assert_eq!(once.annualized_amount(), 0.0);
    }

    #[test]
    fn test_multi_year_occurrences_are_bounded_by_horizon() {
        let roof = expense(
            25_000.0,
            date(2020, 6, 1),
            ExpenseType::Recurring,
            Some(Recurrence::MultiYear { interval_years: 3 }),
        );
        let dates: Vec<Date> = roof
            .occurrences(date(2024, 1, 1), 10)
            .map(|e| e.date)
            .collect();
        // 2023 is before as_of; 2035 is past the horizon year 2034
        assert_eq!(
            dates,
            vec![
                date(2026, 6, 1),
                date(2029, 6, 1),
                date(2032, 6, 1)
            ]
        );
    }

    #[test]
    fn test_long_horizon_does_not_wrap() {
        let roof = expense(
            25_000.0,
            date(2020, 6, 1),
            ExpenseType::Recurring,
            Some(Recurrence::MultiYear { interval_years: 5 }),
        );
        let as_of = date(2025, 1, 1);
        let near: Vec<Date> = roof.occurrences(as_of, 10).map(|e| e.date).collect();
        assert_eq!(near.len(), 3);

        let far: Vec<Date> = roof.occurrences(as_of, 40_000).map(|e| e.date).collect();
        assert_eq!(&far[..3], &near[..]);
        // Stops at the last representable date instead of yielding nothing
        assert_eq!(far.last(), Some(&date(9995, 6, 1)));
    }

    #[test]
    fn test_occurrences_restart_from_clone() {
        let car = expense(
            40_000.0,
            date(2024, 3, 1),
            ExpenseType::Recurring,
            Some(Recurrence::MultiYear { interval_years: 2 }),
        );
        let mut iter = car.occurrences(date(2024, 1, 1), 6);
        let first = iter.next();
        let checkpoint = iter.clone();
        let rest: Vec<_> = iter.collect();
        let replay: Vec<_> = checkpoint.collect();
        assert_eq!(first.map(|e| e.years_from_now), Some(2));
        assert_eq!(rest, replay);
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn test_one_time_expense_inside_window() {
        let wedding = expense(30_000.0, date(2026, 9, 12), ExpenseType::OneTime, None);
        let projected: Vec<_> = wedding.occurrences(date(2025, 1, 1), 5).collect();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].years_from_now, 1);

        let past = expense(30_000.0, date(2020, 9, 12), ExpenseType::OneTime, None);
        assert_eq!(past.occurrences(date(2025, 1, 1), 5).count(), 0);
    }

    #[test]
    fn test_monthly_expenses_are_not_projected() {
        let rent = expense(
            2_000.0,
            date(2024, 1, 1),
            ExpenseType::Recurring,
            Some(Recurrence::Monthly),
        );
        assert_eq!(rent.occurrences(date(2024, 1, 1), 5).count(), 0);
    }
}
