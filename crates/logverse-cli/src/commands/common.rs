use std::env;
use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::NaiveDate;
use logverse_core::models::{format_day, parse_date_key, Activity, GridCell, Hour, MonthGrid};
use logverse_core::remote::RemoteStore;
use logverse_core::session::Authenticator;
use logverse_core::{ActivityLog, MonthKey};

use crate::context::AppContext;
use crate::error::CliError;

/// A cell addressed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTarget {
    pub month: MonthKey,
    pub date: NaiveDate,
    pub date_key: String,
    pub hour: Hour,
}

impl CellTarget {
    pub fn label(&self) -> String {
        format!("{} {}", format_day(self.date), self.hour)
    }
}

pub fn parse_cell_target(date: &str, hour: &str) -> Result<CellTarget, CliError> {
    let date = parse_date_key(date)?;
    Ok(CellTarget {
        month: MonthKey::from_date(date),
        date,
        date_key: date.format("%Y-%m-%d").to_string(),
        hour: hour.parse()?,
    })
}

pub fn parse_month(month: Option<&str>) -> Result<MonthKey, CliError> {
    month.map_or_else(|| Ok(MonthKey::current()), |value| Ok(value.trim().parse()?))
}

/// Load the user's log, apply `apply`, then wait for its writes.
pub async fn with_log<A, R, T, F>(context: &AppContext<A, R>, apply: F) -> Result<T, CliError>
where
    A: Authenticator,
    R: RemoteStore,
    F: FnOnce(&mut ActivityLog<R>) -> Result<T, CliError>,
{
    let mut log = context.open_log().await?;
    let result = apply(&mut log);
    log.close().await;
    result
}

pub fn activity_name(activities: &[Activity], id: &str) -> String {
    activities
        .iter()
        .find(|activity| activity.id.as_str() == id)
        .map_or_else(|| format!("unknown ({id})"), |activity| activity.name.clone())
}

pub fn format_activity_lines(activities: &[Activity]) -> Vec<String> {
    activities
        .iter()
        .map(|activity| format!("{}  {}  {}", activity.id, activity.color, activity.name))
        .collect()
}

pub fn format_cell(activities: &[Activity], cell: &GridCell) -> String {
    let mut line = activity_name(activities, cell.activity_id.as_str());
    if !cell.note.trim().is_empty() {
        let _ = write!(line, " ({})", cell.note.trim());
    }
    line
}

/// One line per day with tagged hours, then hours per activity.
pub fn format_grid_lines(
    month: MonthKey,
    cells: Option<&MonthGrid>,
    activities: &[Activity],
) -> Vec<String> {
    let Some(cells) = cells.filter(|cells| !cells.is_empty()) else {
        return vec![format!("No hours logged in {month}")];
    };

    let mut lines = Vec::new();
    for date in month.dates() {
        let entries = cells
            .iter()
            .filter(|(key, _)| key.date == date)
            .map(|(key, cell)| format!("{} {}", key.hour, format_cell(activities, cell)))
            .collect::<Vec<_>>();
        if !entries.is_empty() {
            lines.push(format!("{}: {}", format_day(date), entries.join(", ")));
        }
    }

    let mut totals = std::collections::BTreeMap::<String, usize>::new();
    for cell in cells.values() {
        *totals
            .entry(activity_name(activities, cell.activity_id.as_str()))
            .or_default() += 1;
    }
    lines.push(String::new());
    for (name, hours) in totals {
        lines.push(format!("{name}: {hours}h"));
    }
    lines
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("LOGVERSE_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("logverse")
        .join("logverse.db")
}
