//! Calendar rules that open or exclude a daily UTC window for one resource.
//!
//! A [`Rule`] pairs a date-matching [`RulePattern`] with a [`DailyWindow`]. Each
//! pattern variant carries only the fields its kind uses, so a weekly rule
//! cannot accidentally carry a day-of-month.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::TimeSpan;

/// Identifier of a schedulable resource. Zero is never a valid id.
pub type ResourceId = u32;

/// Identifier of a calendar rule.
pub type RuleId = u64;

/// The five shapes a rule can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    RecurringWeekly,
    SingleDate,
    DateRange,
    Monthly,
    IntervalDays,
}

/// A UTC time-of-day window `[start, end)` that does not cross midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DailyWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl DailyWindow {
    /// # Errors
    /// Returns [`EngineError::InvalidWindow`] unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if end <= start {
            return Err(EngineError::InvalidWindow(format!(
                "end {} is not after start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// The concrete UTC span this window covers on `date`.
    pub fn on(&self, date: NaiveDate) -> TimeSpan {
        TimeSpan::from_ordered(
            date.and_time(self.start).and_utc(),
            date.and_time(self.end).and_utc(),
        )
    }
}

/// Seven-bit day-of-week mask, bit 0 = Sunday through bit 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    pub const ALL: WeekdayMask = WeekdayMask(0b111_1111);
    pub const MONDAY_TO_FRIDAY: WeekdayMask = WeekdayMask(0b011_1110);

    /// # Errors
    /// Returns [`EngineError::InvalidRule`] when any bit above bit 6 is set.
    pub fn new(bits: u8) -> Result<Self> {
        if bits > Self::ALL.0 {
            return Err(EngineError::InvalidRule(format!(
                "days-of-week mask {:#b} uses more than 7 bits",
                bits
            )));
        }
        Ok(Self(bits))
    }

    pub fn from_weekdays<I>(days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        Self(
            days.into_iter()
                .fold(0, |bits, day| bits | (1 << day.num_days_from_sunday())),
        )
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }
}

/// Which dates a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulePattern {
    /// Every date whose weekday is in `days`, within optional bounds.
    RecurringWeekly {
        days: WeekdayMask,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// Exactly one date.
    SingleDate { date: NaiveDate },
    /// Every date within the bounds; a missing bound is open-ended.
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// The `day_of_month`-th day of each month, within optional bounds.
    /// Months shorter than `day_of_month` have no match.
    Monthly {
        day_of_month: u32,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// Every `every` days counted from `anchor`, up to an optional `until`.
    /// Without an anchor the pattern never matches.
    IntervalDays {
        anchor: Option<NaiveDate>,
        every: u32,
        until: Option<NaiveDate>,
    },
}

impl RulePattern {
    pub fn kind(&self) -> RuleKind {
        match self {
            RulePattern::RecurringWeekly { .. } => RuleKind::RecurringWeekly,
            RulePattern::SingleDate { .. } => RuleKind::SingleDate,
            RulePattern::DateRange { .. } => RuleKind::DateRange,
            RulePattern::Monthly { .. } => RuleKind::Monthly,
            RulePattern::IntervalDays { .. } => RuleKind::IntervalDays,
        }
    }

    /// Whether the pattern selects `date`.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            RulePattern::RecurringWeekly { days, from, to } => {
                days.contains(date.weekday()) && within(date, from, to)
            }
            RulePattern::SingleDate { date: single } => date == single,
            RulePattern::DateRange { from, to } => within(date, from, to),
            RulePattern::Monthly {
                day_of_month,
                from,
                to,
            } => date.day() == day_of_month && within(date, from, to),
            RulePattern::IntervalDays {
                anchor,
                every,
                until,
            } => match anchor {
                Some(anchor) if date >= anchor && within(date, None, until) => {
                    (date - anchor).num_days() % i64::from(every) == 0
                }
                _ => false,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        let bounds = match *self {
            RulePattern::RecurringWeekly { from, to, .. }
            | RulePattern::DateRange { from, to }
            | RulePattern::Monthly { from, to, .. } => (from, to),
            RulePattern::IntervalDays { anchor, until, .. } => (anchor, until),
            RulePattern::SingleDate { .. } => (None, None),
        };
        if let (Some(from), Some(to)) = bounds {
            if from > to {
                return Err(EngineError::InvalidRule(format!(
                    "from date {} is after to date {}",
                    from, to
                )));
            }
        }

        match *self {
            RulePattern::Monthly { day_of_month, .. } if !(1..=31).contains(&day_of_month) => {
                Err(EngineError::InvalidRule(format!(
                    "day of month {} is outside 1..=31",
                    day_of_month
                )))
            }
            RulePattern::IntervalDays { every: 0, .. } => Err(EngineError::InvalidRule(
                "interval days must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn within(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
}

/// One calendar rule bound to exactly one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    id: RuleId,
    resource_id: ResourceId,
    pattern: RulePattern,
    window: DailyWindow,
    is_exclude: bool,
}

impl Rule {
    /// Build an include rule.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidRule`] for a zero resource id, inverted
    /// date bounds, a day of month outside `1..=31`, or a zero day interval.
    pub fn new(
        id: RuleId,
        resource_id: ResourceId,
        pattern: RulePattern,
        window: DailyWindow,
    ) -> Result<Self> {
        if resource_id == 0 {
            return Err(EngineError::InvalidRule(format!(
                "rule {} is bound to resource id 0",
                id
            )));
        }
        pattern.validate()?;
        Ok(Self {
            id,
            resource_id,
            pattern,
            window,
            is_exclude: false,
        })
    }

    /// Turn this rule into an exclusion.
    pub fn excluding(mut self) -> Self {
        self.is_exclude = true;
        self
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    pub fn pattern(&self) -> &RulePattern {
        &self.pattern
    }

    pub fn kind(&self) -> RuleKind {
        self.pattern.kind()
    }

    pub fn window(&self) -> DailyWindow {
        self.window
    }

    pub fn is_exclude(&self) -> bool {
        self.is_exclude
    }

    /// The span this rule contributes on `date`, if it matches.
    pub fn candidate_on(&self, date: NaiveDate) -> Option<TimeSpan> {
        self.pattern.matches(date).then(|| self.window.on(date))
    }
}
