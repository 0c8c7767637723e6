//! Proportional bar-chart rendering.
//!
//! Bar lengths are scaled against the largest row of the view. Any nonzero
//! value gets at least one cell, and the segments of a bar always add up to
//! exactly the bar's length: the last segment takes whatever the earlier,
//! floored segments left over.

use anstyle::{AnsiColor, Color, Style};

use crate::aggregate::TagSegment;
use crate::duration;
use crate::palette::{ColorAssignment, ColorCode};

/// Width of the longest bar in a view, in cells.
pub const DEFAULT_BAR_WIDTH: usize = 30;

/// One cell of a bar.
pub const BAR_CELL: &str = "█";

/// Length of a bar for `row_total` in a view whose largest row is `view_max`.
///
/// A zero `view_max` gives zero for every row.
pub fn bar_length(row_total: u64, view_max: u64, bar_width: usize) -> usize {
    if view_max == 0 {
        return 0;
    }
    let length = scale(row_total, bar_width, view_max);
    if length == 0 && row_total > 0 {
        1
    } else {
        length
    }
}

/// Splits a bar of `total_length` cells among segments of the given minutes.
///
/// Every segment but the last gets its floored share, raised to one cell when
/// it has time but would round to nothing, and never more than what is still
/// unallocated. The last segment absorbs the rest, so the result always sums
/// to `total_length` when `minutes` is non-empty.
pub fn segment_lengths(minutes: &[u64], row_total: u64, total_length: usize) -> Vec<usize> {
    let mut lengths = Vec::with_capacity(minutes.len());
    let mut used = 0;

    for (i, &segment) in minutes.iter().enumerate() {
        let remaining = total_length - used;
        let length = if i + 1 == minutes.len() {
            remaining
        } else {
            let share = if row_total == 0 {
                0
            } else {
                scale(segment, total_length, row_total)
            };
            let share = if share == 0 && segment > 0 { 1 } else { share };
            share.min(remaining)
        };
        used += length;
        lengths.push(length);
    }

    lengths
}

/// Width of the label column: the longest label, in characters.
pub fn max_label_width<'a, I>(labels: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    labels
        .into_iter()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or(0)
}

/// `floor(value * width / whole)` without intermediate overflow.
fn scale(value: u64, width: usize, whole: u64) -> usize {
    let scaled = u128::from(value) * width as u128 / u128::from(whole);
    usize::try_from(scaled).unwrap_or(usize::MAX)
}

/// Formats chart rows, headings and placeholders.
#[derive(Debug, Clone)]
pub struct BarRenderer {
    bar_width: usize,
    use_color: bool,
    duration_style: Style,
    heading_style: Style,
    subheading_style: Style,
    dim_style: Style,
}

impl Default for BarRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_BAR_WIDTH, false)
    }
}

impl BarRenderer {
    /// Creates a renderer. With `use_color` off, all output is plain text.
    pub fn new(bar_width: usize, use_color: bool) -> Self {
        Self {
            bar_width,
            use_color,
            duration_style: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightWhite))),
            heading_style: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightCyan))),
            subheading_style: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightYellow))),
            dim_style: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
        }
    }

    pub const fn bar_width(&self) -> usize {
        self.bar_width
    }

    pub const fn use_color(&self) -> bool {
        self.use_color
    }

    /// One single-color bar line.
    pub fn render_bar(
        &self,
        label: &str,
        minutes: u64,
        view_max: u64,
        color: Option<ColorCode>,
        label_width: usize,
    ) -> String {
        let length = bar_length(minutes, view_max, self.bar_width);
        let bar = self.paint_bar(color, length);
        self.line(label, &bar, minutes, label_width)
    }

    /// One bar line split into colored tag segments.
    ///
    /// A row without segments is drawn as a single uncolored bar.
    pub fn render_segmented_bar(
        &self,
        label: &str,
        segments: &[TagSegment],
        row_total: u64,
        view_max: u64,
        colors: &ColorAssignment,
        label_width: usize,
    ) -> String {
        let total_length = bar_length(row_total, view_max, self.bar_width);

        if segments.is_empty() {
            let bar = self.paint_bar(None, total_length);
            return self.line(label, &bar, row_total, label_width);
        }

        let minutes: Vec<u64> = segments.iter().map(|s| s.minutes).collect();
        let lengths = segment_lengths(&minutes, row_total, total_length);

        let bar: String = segments
            .iter()
            .zip(lengths)
            .filter(|(_, length)| *length > 0)
            .map(|(segment, length)| self.paint_bar(colors.get(&segment.tag), length))
            .collect();

        self.line(label, &bar, row_total, label_width)
    }

    /// Bright heading text.
    pub fn heading(&self, text: &str) -> String {
        self.paint(self.heading_style, text)
    }

    /// Subsection heading text.
    pub fn subheading(&self, text: &str) -> String {
        self.paint(self.subheading_style, text)
    }

    /// De-emphasized text for placeholders and footers.
    pub fn dim(&self, text: &str) -> String {
        self.paint(self.dim_style, text)
    }

    /// A run of `length` cells in the given color.
    pub fn paint_bar(&self, color: Option<ColorCode>, length: usize) -> String {
        let cells = BAR_CELL.repeat(length);
        match color {
            Some(color) => self.paint(color.style(), &cells),
            None => cells,
        }
    }

    fn line(&self, label: &str, bar: &str, minutes: u64, label_width: usize) -> String {
        let duration = self.paint(self.duration_style, &duration::encode(minutes));
        format!("  {label:<label_width$} {bar} {duration}")
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.use_color && !text.is_empty() {
            format!("{}{text}{}", style.render(), style.render_reset())
        } else {
            text.to_string()
        }
    }
}
