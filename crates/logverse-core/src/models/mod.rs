//! Data models for LogVerse

mod activity;
mod grid;
mod theme;

pub use activity::{default_activities, normalize_color, normalize_name, Activity, ActivityId};
pub use grid::{format_day, parse_date_key, CellKey, GridCell, GridData, Hour, MonthGrid, MonthKey};
pub use theme::Theme;
