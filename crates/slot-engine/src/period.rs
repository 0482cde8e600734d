//! Inclusive calendar-date periods.

use chrono::{Days, NaiveDate};

use crate::error::{EngineError, Result};

/// An inclusive `[from, to]` range of calendar dates with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatePeriod {
    from: NaiveDate,
    to: NaiveDate,
}

impl DatePeriod {
    /// # Errors
    /// Returns [`EngineError::InvalidPeriod`] when `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(EngineError::InvalidPeriod(format!(
                "from {} is after to {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// A one-day period.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Number of dates in the period (always at least 1).
    pub fn len_days(&self) -> u64 {
        (self.to - self.from).num_days() as u64 + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Iterate the dates of the period in ascending order.
    ///
    /// Each call returns a fresh iterator, so a period can be walked any number
    /// of times.
    pub fn days(&self) -> PeriodDays {
        PeriodDays {
            next: Some(self.from),
            last: self.to,
        }
    }
}

impl IntoIterator for &DatePeriod {
    type Item = NaiveDate;
    type IntoIter = PeriodDays;

    fn into_iter(self) -> Self::IntoIter {
        self.days()
    }
}

/// Lazy iterator over the dates of a [`DatePeriod`].
#[derive(Debug, Clone)]
pub struct PeriodDays {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl Iterator for PeriodDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current < self.last {
            current.checked_add_days(Days::new(1))
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(next) => {
                let remaining = (self.last - next).num_days() as usize + 1;
                (remaining, Some(remaining))
            }
            None => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for PeriodDays {}

impl std::iter::FusedIterator for PeriodDays {}
