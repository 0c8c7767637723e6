//! Project, day and entry records as loaded from the data source.
//!
//! These are built once during ingestion and only read afterwards.

/// One logged unit of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    summary: String,
    total_minutes: u64,
    tags: Vec<String>,
}

impl TimeEntry {
    /// Creates an entry. Repeated tags are dropped, keeping the first occurrence.
    pub fn new<I, S>(summary: impl Into<String>, total_minutes: u64, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }

        Self {
            summary: summary.into(),
            total_minutes,
            tags: unique,
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub const fn total_minutes(&self) -> u64 {
        self.total_minutes
    }

    /// Distinct tags in first-seen order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// One calendar date's entries for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    date: String,
    entries: Vec<TimeEntry>,
    total_minutes: u64,
}

impl Day {
    /// Creates a day whose total is the sum of its entries.
    pub fn new(date: impl Into<String>, entries: Vec<TimeEntry>) -> Self {
        let total_minutes = entries.iter().map(TimeEntry::total_minutes).sum();
        Self {
            date: date.into(),
            entries,
            total_minutes,
        }
    }

    /// Creates a day with a total supplied by the data source.
    ///
    /// The total is trusted as-is; consistency with `entries` is the
    /// caller's responsibility.
    pub fn with_total(date: impl Into<String>, entries: Vec<TimeEntry>, total_minutes: u64) -> Self {
        Self {
            date: date.into(),
            entries,
            total_minutes,
        }
    }

    /// Calendar-date key, lexically sortable (e.g. `2025-01-29`).
    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub const fn total_minutes(&self) -> u64 {
        self.total_minutes
    }
}

/// A named collection of days, typically one `.klg` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    name: String,
    days: Vec<Day>,
}

impl Project {
    pub fn new(name: impl Into<String>, days: Vec<Day>) -> Self {
        Self {
            name: name.into(),
            days,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    /// Grand total across all days.
    pub fn total_minutes(&self) -> u64 {
        self.days.iter().map(Day::total_minutes).sum()
    }

    /// Every entry of every day, in order.
    pub fn entries(&self) -> impl Iterator<Item = &TimeEntry> {
        self.days.iter().flat_map(|day| day.entries.iter())
    }
}
