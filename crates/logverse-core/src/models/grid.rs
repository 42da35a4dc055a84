//! Hour grid model: months of day/hour cells tagged with activities.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ActivityId;
use crate::{Error, Result};

/// Month identifier, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(0..=9999).contains(&year) {
            return Err(Error::InvalidInput(format!("year out of range: {year}")));
        }
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidInput(format!("month out of range: {month}")));
        }
        Ok(Self { year, month })
    }

    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month containing today's local date.
    #[must_use]
    pub fn current() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    #[must_use]
    pub const fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    #[must_use]
    pub fn days_in_month(self) -> u32 {
        self.next()
            .first_day()
            .pred_opt()
            .map_or(31, |last_day| last_day.day())
    }

    /// Every date of the month in order.
    #[must_use]
    pub fn dates(self) -> Vec<NaiveDate> {
        (1..=self.days_in_month())
            .filter_map(|day| NaiveDate::from_ymd_opt(self.year, self.month, day))
            .collect()
    }

    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidInput(format!("invalid month key '{s}', expected YYYY-MM"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

/// Hour of day (0-23), labelled `12am`, `1am`, ..., `12pm`, ..., `11pm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hour(u8);

impl Hour {
    #[must_use]
    pub const fn new(hour: u8) -> Option<Self> {
        if hour < 24 {
            Some(Self(hour))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// All 24 hours starting at midnight.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..24).map(Self)
    }

    #[must_use]
    pub fn label(self) -> String {
        let period = if self.0 < 12 { "am" } else { "pm" };
        let hour = match self.0 {
            0 => 12,
            hour if hour > 12 => hour - 12,
            hour => hour,
        };
        format!("{hour}{period}")
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Hour {
    type Err = Error;

    /// Accepts labels (`3pm`) as well as plain 24h numbers (`15`).
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidInput(format!("invalid hour '{s}'"));
        let value = s.trim().to_ascii_lowercase();

        if let Ok(hour) = value.parse::<u8>() {
            return Self::new(hour).ok_or_else(invalid);
        }

        let (digits, pm) = if let Some(digits) = value.strip_suffix("am") {
            (digits, false)
        } else if let Some(digits) = value.strip_suffix("pm") {
            (digits, true)
        } else {
            return Err(invalid());
        };
        let hour: u8 = digits.parse().map_err(|_| invalid())?;
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (1..=11, false) => hour,
            (1..=11, true) => hour + 12,
            _ => return Err(invalid()),
        };
        Ok(Self(hour))
    }
}

/// Key of one cell within a month: `YYYY-MM-DD_<hourLabel>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellKey {
    pub date: NaiveDate,
    pub hour: Hour,
}

impl CellKey {
    #[must_use]
    pub const fn new(date: NaiveDate, hour: Hour) -> Self {
        Self { date, hour }
    }

    /// Date part of the key, `YYYY-MM-DD`.
    #[must_use]
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.date_key(), self.hour)
    }
}

impl FromStr for CellKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (date, hour) = s
            .split_once('_')
            .ok_or_else(|| Error::InvalidInput(format!("invalid cell key '{s}'")))?;
        Ok(Self::new(parse_date_key(date)?, hour.parse()?))
    }
}

impl TryFrom<String> for CellKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CellKey> for String {
    fn from(value: CellKey) -> Self {
        value.to_string()
    }
}

/// One tagged hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub activity_id: ActivityId,
    #[serde(default)]
    pub note: String,
}

pub type MonthGrid = BTreeMap<CellKey, GridCell>;

/// All tagged cells of a user, grouped by month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridData(BTreeMap<MonthKey, MonthGrid>);

impl GridData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn month(&self, month: MonthKey) -> Option<&MonthGrid> {
        self.0.get(&month)
    }

    #[must_use]
    pub fn cell(&self, month: MonthKey, key: CellKey) -> Option<&GridCell> {
        self.0.get(&month)?.get(&key)
    }

    pub fn months(&self) -> impl Iterator<Item = (&MonthKey, &MonthGrid)> {
        self.0.iter()
    }

    pub fn set_cell(&mut self, month: MonthKey, key: CellKey, cell: GridCell) {
        self.0.entry(month).or_default().insert(key, cell);
    }

    /// Remove a cell. The month entry is kept (possibly empty) so that a
    /// later save still replaces that month everywhere.
    pub fn remove_cell(&mut self, month: MonthKey, key: CellKey) -> Option<GridCell> {
        self.0.entry(month).or_default().remove(&key)
    }

    /// Replace a whole month.
    pub fn insert_month(&mut self, month: MonthKey, cells: MonthGrid) {
        self.0.insert(month, cells);
    }

    /// Drop every cell tagged with `activity_id` across all months.
    ///
    /// Returns the number of removed cells.
    pub fn remove_activity(&mut self, activity_id: &ActivityId) -> usize {
        let mut removed = 0;
        for cells in self.0.values_mut() {
            let before = cells.len();
            cells.retain(|_, cell| &cell.activity_id != activity_id);
            removed += before - cells.len();
        }
        removed
    }

    /// Overlay `other` month by month: its months replace ours, months only
    /// present here are kept.
    pub fn merge_months(&mut self, other: Self) {
        for (month, cells) in other.0 {
            self.0.insert(month, cells);
        }
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// True when no month holds any cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Tagged hours per activity for one month.
    #[must_use]
    pub fn hours_by_activity(&self, month: MonthKey) -> BTreeMap<ActivityId, usize> {
        let mut totals = BTreeMap::new();
        if let Some(cells) = self.0.get(&month) {
            for cell in cells.values() {
                *totals.entry(cell.activity_id.clone()).or_insert(0) += 1;
            }
        }
        totals
    }
}

/// Parse a `YYYY-MM-DD` date key.
pub fn parse_date_key(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|error| Error::InvalidInput(format!("invalid date '{value}': {error}")))
}

/// Short day label, e.g. `05 Jan`.
#[must_use]
pub fn format_day(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}
