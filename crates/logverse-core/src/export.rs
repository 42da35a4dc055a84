//! Export of a user's activity log.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{format_day, Activity, GridData, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Everything a user has logged, in the shape it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub exported_at: i64,
    pub theme: Theme,
    pub activities: Vec<Activity>,
    pub grid_data: GridData,
}

/// Render the log as pretty-printed JSON.
pub fn render_json_export(document: &ExportDocument) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}

/// Render a per-month summary: hours per activity followed by the noted
/// cells.
#[must_use]
pub fn render_markdown_export(document: &ExportDocument) -> String {
    let mut output = String::new();
    let name_of = |id: &str| {
        document
            .activities
            .iter()
            .find(|activity| activity.id.as_str() == id)
            .map_or_else(|| id.to_string(), |activity| activity.name.clone())
    };

    let _ = writeln!(output, "# Activity log");
    for (month, cells) in document.grid_data.months() {
        if cells.is_empty() {
            continue;
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "## {month}");
        let _ = writeln!(output);
        for (activity_id, hours) in document.grid_data.hours_by_activity(*month) {
            let _ = writeln!(output, "- {}: {hours}h", name_of(activity_id.as_str()));
        }

        let mut noted = cells.iter().filter(|(_, cell)| !cell.note.trim().is_empty()).peekable();
        if noted.peek().is_some() {
            let _ = writeln!(output);
            for (key, cell) in noted {
                let _ = writeln!(
                    output,
                    "- {} {} ({}): {}",
                    format_day(key.date),
                    key.hour,
                    name_of(cell.activity_id.as_str()),
                    cell.note.trim()
                );
            }
        }
    }
    output
}

pub fn render_export(document: &ExportDocument, format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(document),
        ExportFormat::Markdown => Ok(render_markdown_export(document)),
    }
}

#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp: i64) -> String {
    format!("logverse-export-{timestamp}.{}", format.extension())
}
