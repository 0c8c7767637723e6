//! Error types for the report core.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// One of the four aggregated report views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    ByProject,
    ByTag,
    ByTagPerProject,
    ByDay,
}

impl View {
    /// Section title shown above the view's chart.
    pub const fn title(self) -> &'static str {
        match self {
            Self::ByProject => "Project Time Spent",
            Self::ByTag => "Tags Time Spent",
            Self::ByTagPerProject => "Tags per Project",
            Self::ByDay => "Daily Working Time",
        }
    }

    /// Text printed in place of a chart when the view has no rows.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::ByProject => "No time logged yet",
            Self::ByTag => "No tags found",
            Self::ByTagPerProject => "No tagged time found",
            Self::ByDay => "No daily data found",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ByProject => "by_project",
            Self::ByTag => "by_tag",
            Self::ByTagPerProject => "by_tag_per_project",
            Self::ByDay => "by_day",
        };
        write!(f, "{s}")
    }
}

/// Errors produced by the report core.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The view has no qualifying rows. Not fatal; callers print a placeholder.
    #[error("no data for {0} view")]
    EmptyAggregate(View),

    /// No palette with the requested name is configured.
    #[error("unknown palette: {name} (available: {available})")]
    UnknownPalette { name: String, available: String },
}

impl CoreError {
    /// Returns the view when this is an empty-aggregate signal.
    pub const fn empty_view(&self) -> Option<View> {
        match self {
            Self::EmptyAggregate(view) => Some(*view),
            Self::UnknownPalette { .. } => None,
        }
    }
}
