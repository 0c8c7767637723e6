//! Report command for charting logged time.
//!
//! This module implements `klog-report report`: four bar-chart sections (by
//! project, by tag, tags per project, by day) in human-readable form, or the
//! same aggregates as JSON.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kr_core::{
    AggregatedRow, BarRenderer, ColorAssignment, CoreError, Project, ProjectTags, View,
    aggregate_by_day, aggregate_by_project, aggregate_by_tag, aggregate_by_tag_per_project,
    assign_tag_colors, max_label_width, view_max,
};
use serde::Serialize;

use crate::Config;
use crate::source::KlogSource;

/// Width of the report banner and footer rules.
const BANNER_WIDTH: usize = 59;
const FOOTER_WIDTH: usize = 61;

/// Indent for tag rows nested under a project heading.
const NESTED_INDENT: &str = "  ";

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Directory containing `.klg` files (defaults to `KLOG_DIR` or ~/klog).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Color palette for tags.
    #[arg(short, long)]
    pub palette: Option<String>,

    /// Length of the longest bar.
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub width: Option<u16>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Disable colored output (also respects `NO_COLOR`).
    #[arg(long)]
    pub no_color: bool,

    /// Extra arguments passed to every `klog json` call (e.g. `-- --this-week`).
    #[arg(last = true)]
    pub klog_args: Vec<String>,
}

/// Loaded projects and their tag colors.
#[derive(Debug)]
pub struct ReportData {
    pub projects: Vec<Project>,
    pub colors: ColorAssignment,
}

impl ReportData {
    /// Assigns colors once over the global tag set.
    pub fn new(projects: Vec<Project>, palette: &kr_core::Palette) -> Self {
        let colors = assign_tag_colors(&projects, palette);
        Self { projects, colors }
    }
}

/// Whether to emit ANSI colors on stdout.
pub fn color_enabled(no_color: bool) -> bool {
    !no_color && std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal()
}

// ========== Human-Readable Output ==========

/// Writes the full report: banner, four sections and footer.
pub fn write_report<W: Write>(
    writer: &mut W,
    data: &ReportData,
    renderer: &BarRenderer,
) -> io::Result<()> {
    write_banner(writer, renderer)?;

    write_section_header(writer, renderer, View::ByProject.title())?;
    match aggregate_by_project(&data.projects) {
        Ok(rows) => write_segmented_rows(writer, renderer, &rows, &data.colors)?,
        Err(e) => write_empty(writer, renderer, &e)?,
    }

    write_section_header(writer, renderer, View::ByTag.title())?;
    match aggregate_by_tag(&data.projects) {
        Ok(rows) => write_tag_rows(writer, renderer, &rows, &data.colors, "")?,
        Err(e) => write_empty(writer, renderer, &e)?,
    }

    write_section_header(writer, renderer, View::ByTagPerProject.title())?;
    match aggregate_by_tag_per_project(&data.projects) {
        Ok(groups) => {
            for group in &groups {
                writeln!(writer, "  {}", renderer.subheading(&group.project))?;
                write_tag_rows(writer, renderer, &group.rows, &data.colors, NESTED_INDENT)?;
                writeln!(writer)?;
            }
        }
        Err(e) => write_empty(writer, renderer, &e)?,
    }

    write_section_header(writer, renderer, View::ByDay.title())?;
    match aggregate_by_day(&data.projects) {
        Ok(rows) => write_segmented_rows(writer, renderer, &rows, &data.colors)?,
        Err(e) => write_empty(writer, renderer, &e)?,
    }

    write_footer(writer, renderer, data.projects.len())
}

fn write_banner<W: Write>(writer: &mut W, renderer: &BarRenderer) -> io::Result<()> {
    let rule = "═".repeat(BANNER_WIDTH);
    writeln!(writer)?;
    writeln!(writer, "{}", renderer.heading(&rule))?;
    writeln!(
        writer,
        "{}",
        renderer.heading(&format!("{:^BANNER_WIDTH$}", "KLOG TIME REPORT"))
    )?;
    writeln!(writer, "{}", renderer.heading(&rule))
}

fn write_section_header<W: Write>(
    writer: &mut W,
    renderer: &BarRenderer,
    title: &str,
) -> io::Result<()> {
    let rule = "─".repeat(title.chars().count() + 2);
    writeln!(writer)?;
    writeln!(writer, "{}", renderer.heading(&format!("┌{rule}┐")))?;
    writeln!(writer, "{}", renderer.heading(&format!("│ {title} │")))?;
    writeln!(writer, "{}", renderer.heading(&format!("└{rule}┘")))?;
    writeln!(writer)
}

fn write_footer<W: Write>(
    writer: &mut W,
    renderer: &BarRenderer,
    project_count: usize,
) -> io::Result<()> {
    let rule = "─".repeat(FOOTER_WIDTH);
    writeln!(writer)?;
    writeln!(writer, "{}", renderer.dim(&rule))?;
    writeln!(
        writer,
        "{}",
        renderer.dim(&format!("{project_count} project(s) processed"))
    )?;
    writeln!(writer, "{}", renderer.dim(&rule))
}

/// Prints the placeholder for an empty view.
fn write_empty<W: Write>(writer: &mut W, renderer: &BarRenderer, err: &CoreError) -> io::Result<()> {
    let Some(view) = err.empty_view() else {
        return Err(io::Error::other(err.clone()));
    };
    writeln!(writer, "  {}", renderer.dim(view.placeholder()))
}

/// Rows drawn as bars split by tag.
fn write_segmented_rows<W: Write>(
    writer: &mut W,
    renderer: &BarRenderer,
    rows: &[AggregatedRow],
    colors: &ColorAssignment,
) -> io::Result<()> {
    let max = view_max(rows);
    let label_width = max_label_width(rows.iter().map(|row| row.label.as_str()));

    for row in rows {
        let line = renderer.render_segmented_bar(
            &row.label,
            &row.segments,
            row.total_minutes,
            max,
            colors,
            label_width,
        );
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Rows whose labels are tags, each drawn in its tag's color.
fn write_tag_rows<W: Write>(
    writer: &mut W,
    renderer: &BarRenderer,
    rows: &[AggregatedRow],
    colors: &ColorAssignment,
    indent: &str,
) -> io::Result<()> {
    let max = view_max(rows);
    let labels: Vec<String> = rows.iter().map(|row| format!("{indent}{}", row.label)).collect();
    let label_width = max_label_width(labels.iter().map(String::as_str));

    for (row, label) in rows.iter().zip(&labels) {
        let line = renderer.render_bar(
            label,
            row.total_minutes,
            max,
            colors.get(&row.label),
            label_width,
        );
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub by_project: Vec<AggregatedRow>,
    pub by_tag: Vec<AggregatedRow>,
    pub by_tag_per_project: Vec<ProjectTags>,
    pub by_day: Vec<AggregatedRow>,
    pub colors: &'a ColorAssignment,
    pub project_count: usize,
}

/// Formats report data as JSON. Empty views become empty arrays.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let report = JsonReport {
        by_project: aggregate_by_project(&data.projects).unwrap_or_default(),
        by_tag: aggregate_by_tag(&data.projects).unwrap_or_default(),
        by_tag_per_project: aggregate_by_tag_per_project(&data.projects).unwrap_or_default(),
        by_day: aggregate_by_day(&data.projects).unwrap_or_default(),
        colors: &data.colors,
        project_count: data.projects.len(),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run(args: &ReportArgs, config: &Config) -> Result<()> {
    let palettes = config.palette_set();
    let palette_name = args.palette.as_deref().unwrap_or(&config.palette);
    let palette = palettes.get(palette_name)?;

    let bar_width = args.width.map_or(config.bar_width, usize::from);
    anyhow::ensure!(bar_width > 0, "bar width must be at least 1");

    let dir = args.dir.as_ref().unwrap_or(&config.klog_dir);
    let source = KlogSource::new(config.klog_command.clone(), args.klog_args.clone());
    let projects = source.load_projects(dir)?;
    tracing::debug!(
        projects = projects.len(),
        palette = palette.name(),
        bar_width,
        "generating report"
    );

    let data = ReportData::new(projects, palette);
    let mut stdout = io::stdout().lock();

    if args.json {
        let output = format_report_json(&data)?;
        writeln!(stdout, "{output}")?;
    } else {
        let renderer = BarRenderer::new(bar_width, color_enabled(args.no_color));
        write_report(&mut stdout, &data, &renderer).context("failed to write report")?;
    }

    Ok(())
}
