//! Roll-ups of entry durations into the four report views.
//!
//! Every reducer is a pure fold over the project list. Accumulations keyed by
//! label are kept in first-seen order (or in a sorted map for dates) and then
//! sorted explicitly, so output never depends on hash iteration order.
//!
//! An entry carrying several tags counts its full duration toward each of
//! them. Tag totals are therefore a breakdown by category, not a partition,
//! and can add up to more than the project totals.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{CoreError, View};
use crate::model::{Project, TimeEntry};

/// One tag's share of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSegment {
    pub tag: String,
    pub minutes: u64,
}

/// One renderable line of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedRow {
    pub label: String,
    pub total_minutes: u64,
    /// Tag breakdown, largest first. Empty for views without one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<TagSegment>,
}

impl AggregatedRow {
    fn plain(label: impl Into<String>, total_minutes: u64) -> Self {
        Self {
            label: label.into(),
            total_minutes,
            segments: Vec::new(),
        }
    }
}

/// Tag rows scoped to a single project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTags {
    pub project: String,
    /// The project's grand total, which orders projects in this view.
    pub total_minutes: u64,
    pub rows: Vec<AggregatedRow>,
}

/// Per-tag minute totals in first-seen order.
#[derive(Debug, Default)]
struct TagTally {
    index: HashMap<String, usize>,
    totals: Vec<(String, u64)>,
}

impl TagTally {
    fn add_entry(&mut self, entry: &TimeEntry) {
        for tag in entry.tags() {
            self.add(tag, entry.total_minutes());
        }
    }

    fn add(&mut self, tag: &str, minutes: u64) {
        if let Some(&i) = self.index.get(tag) {
            self.totals[i].1 += minutes;
        } else {
            self.index.insert(tag.to_string(), self.totals.len());
            self.totals.push((tag.to_string(), minutes));
        }
    }

    /// Totals, largest first; ties keep first-seen order.
    fn into_sorted(self) -> Vec<(String, u64)> {
        let mut totals = self.totals;
        // sort_by_key is stable
        totals.sort_by_key(|(_, minutes)| Reverse(*minutes));
        totals
    }

    /// Segments only carry time, so zero totals are left out.
    fn into_segments(self) -> Vec<TagSegment> {
        self.into_sorted()
            .into_iter()
            .filter(|(_, minutes)| *minutes > 0)
            .map(|(tag, minutes)| TagSegment { tag, minutes })
            .collect()
    }

    /// One row per tag seen, including tags whose entries total zero.
    fn into_rows(self) -> Vec<AggregatedRow> {
        self.into_sorted()
            .into_iter()
            .map(|(tag, minutes)| AggregatedRow::plain(tag, minutes))
            .collect()
    }
}

fn project_tally(project: &Project) -> TagTally {
    let mut tally = TagTally::default();
    for entry in project.entries() {
        tally.add_entry(entry);
    }
    tally
}

fn non_empty<T>(rows: Vec<T>, view: View) -> Result<Vec<T>, CoreError> {
    if rows.is_empty() {
        Err(CoreError::EmptyAggregate(view))
    } else {
        Ok(rows)
    }
}

/// Total time per project with its tag breakdown, largest project first.
///
/// Projects with no logged time are left out.
pub fn aggregate_by_project(projects: &[Project]) -> Result<Vec<AggregatedRow>, CoreError> {
    let mut rows: Vec<AggregatedRow> = projects
        .iter()
        .filter_map(|project| {
            let total_minutes = project.total_minutes();
            (total_minutes > 0).then(|| AggregatedRow {
                label: project.name().to_string(),
                total_minutes,
                segments: project_tally(project).into_segments(),
            })
        })
        .collect();

    rows.sort_by_key(|row| Reverse(row.total_minutes));
    non_empty(rows, View::ByProject)
}

/// Total time per tag across every project, largest first.
pub fn aggregate_by_tag(projects: &[Project]) -> Result<Vec<AggregatedRow>, CoreError> {
    let mut tally = TagTally::default();
    for entry in projects.iter().flat_map(Project::entries) {
        tally.add_entry(entry);
    }
    non_empty(tally.into_rows(), View::ByTag)
}

/// Tag totals within each project.
///
/// Projects are ordered by their grand total (not their tag total), largest
/// first. Projects with no tagged entries are left out; a tag whose entries
/// total zero still gets a row.
pub fn aggregate_by_tag_per_project(projects: &[Project]) -> Result<Vec<ProjectTags>, CoreError> {
    let mut groups: Vec<ProjectTags> = projects
        .iter()
        .filter_map(|project| {
            let rows = project_tally(project).into_rows();
            (!rows.is_empty()).then(|| ProjectTags {
                project: project.name().to_string(),
                total_minutes: project.total_minutes(),
                rows,
            })
        })
        .collect();

    groups.sort_by_key(|group| Reverse(group.total_minutes));
    non_empty(groups, View::ByTagPerProject)
}

/// Total time per calendar date across all projects, oldest first.
pub fn aggregate_by_day(projects: &[Project]) -> Result<Vec<AggregatedRow>, CoreError> {
    let mut days: BTreeMap<&str, (u64, TagTally)> = BTreeMap::new();
    for day in projects.iter().flat_map(Project::days) {
        let (total, tally) = days.entry(day.date()).or_default();
        *total += day.total_minutes();
        for entry in day.entries() {
            tally.add_entry(entry);
        }
    }

    // BTreeMap iterates in ascending date order
    let rows = days
        .into_iter()
        .map(|(date, (total_minutes, tally))| AggregatedRow {
            label: date.to_string(),
            total_minutes,
            segments: tally.into_segments(),
        })
        .collect();

    non_empty(rows, View::ByDay)
}

/// Largest row total in a view, the scale for its bars.
pub fn view_max(rows: &[AggregatedRow]) -> u64 {
    rows.iter().map(|row| row.total_minutes).max().unwrap_or(0)
}
