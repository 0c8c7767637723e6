//! Core logic for klog time reports.
//!
//! This crate contains:
//! - Model: projects, days and time entries as loaded from klog
//! - Aggregation: rolling entries up by project, tag, tag-per-project and day
//! - Palette: stable tag-to-color assignment with overflow colors
//! - Rendering: proportional, tag-segmented terminal bar charts
//! - Duration: the `2h15m` notation

pub mod aggregate;
pub mod duration;
mod error;
pub mod model;
pub mod palette;
pub mod render;

pub use aggregate::{
    AggregatedRow, ProjectTags, TagSegment, aggregate_by_day, aggregate_by_project,
    aggregate_by_tag, aggregate_by_tag_per_project, view_max,
};
pub use error::{CoreError, View};
pub use model::{Day, Project, TimeEntry};
pub use palette::{
    ColorAssignment, ColorCode, DEFAULT_PALETTE, Palette, PaletteSet, assign_tag_colors,
};
pub use render::{BarRenderer, DEFAULT_BAR_WIDTH, bar_length, max_label_width, segment_lengths};
