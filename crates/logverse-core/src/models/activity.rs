//! Activity model

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Opaque activity identifier.
///
/// New ids are UUID v7 strings (time-sortable); ids created by older clients
/// or by the remote backend are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    /// Create a new unique, time-based id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ActivityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A labelled, coloured category that can be assigned to grid cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    /// Hex colour, `#rrggbb` or `#rgb`
    pub color: String,
}

impl Activity {
    /// Create an activity with a fresh id after validating name and colour
    pub fn new(name: &str, color: &str) -> Result<Self> {
        Ok(Self {
            id: ActivityId::new(),
            name: normalize_name(name)?,
            color: normalize_color(color)?,
        })
    }
}

/// The activities seeded for a user with no saved activities.
#[must_use]
pub fn default_activities() -> Vec<Activity> {
    [
        ("1", "Sleep", "#9b59b6"),
        ("2", "Work", "#3498db"),
        ("3", "Exercise", "#e74c3c"),
        ("4", "Social", "#f39c12"),
        ("5", "Learning", "#2ecc71"),
    ]
    .into_iter()
    .map(|(id, name, color)| Activity {
        id: ActivityId::from(id),
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

/// Trim an activity name, rejecting empty names.
pub fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput(
            "activity name cannot be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Validate a hex colour and return it lowercased.
pub fn normalize_color(color: &str) -> Result<String> {
    static HEX_COLOR: OnceLock<Regex> = OnceLock::new();
    let re = HEX_COLOR.get_or_init(|| {
        Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("Invalid regex")
    });

    let color = color.trim();
    if re.is_match(color) {
        Ok(color.to_ascii_lowercase())
    } else {
        Err(Error::InvalidInput(format!(
            "activity color must be a hex value like #3498db, got '{color}'"
        )))
    }
}
