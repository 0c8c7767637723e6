//! Loading projects from `.klg` files through `klog json`.
//!
//! Each `.klg` file under the data directory is one project, named after the
//! file stem. Files are read with the external `klog` program; a file that
//! cannot be read or parsed is skipped with a warning.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use kr_core::{Day, Project, TimeEntry, duration};
use rayon::prelude::*;
use serde::Deserialize;

/// Extension of klog data files.
const KLOG_EXTENSION: &str = "klg";

/// How to invoke klog for each file.
#[derive(Debug, Clone)]
pub struct KlogSource {
    /// Program name or path.
    pub command: String,
    /// Extra arguments appended after `json <file>`, e.g. `--this-week`.
    pub args: Vec<String>,
}

impl KlogSource {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Loads every `.klg` file under `dir`, in path order.
    pub fn load_projects(&self, dir: &Path) -> Result<Vec<Project>> {
        let files = discover_files(dir)?;
        if files.is_empty() {
            anyhow::bail!("no .klg files found in {}", dir.display());
        }
        tracing::debug!(count = files.len(), dir = %dir.display(), "discovered klog files");

        let projects: Vec<Project> = files
            .par_iter()
            .filter_map(|path| match self.load_project(path) {
                Ok(project) => Some(project),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "skipping klog file");
                    None
                }
            })
            .collect();

        if projects.is_empty() {
            anyhow::bail!(
                "none of the {} .klg files in {} could be read",
                files.len(),
                dir.display()
            );
        }
        Ok(projects)
    }

    /// Runs klog on one file and parses its output.
    pub fn load_project(&self, path: &Path) -> Result<Project> {
        let name = project_name(path)
            .with_context(|| format!("invalid file name: {}", path.display()))?;
        let output = self.run(path)?;
        parse_klog_json(name, &output)
            .with_context(|| format!("failed to parse klog output for {}", path.display()))
    }

    fn run(&self, path: &Path) -> Result<String> {
        let output = Command::new(&self.command)
            .arg("json")
            .arg(path)
            .args(&self.args)
            .output()
            .with_context(|| format!("failed to run {}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} json exited with status {}: {}",
                self.command,
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("klog output is not valid UTF-8")
    }
}

/// Finds `.klg` files under `dir` recursively, sorted by path.
///
/// Symlinked directories are not descended into.
pub fn discover_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    let mut is_root = true;

    while let Some(current) = pending.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(e) if is_root => {
                return Err(e).with_context(|| format!("failed to read {}", current.display()));
            }
            Err(e) => {
                tracing::warn!(path = %current.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        is_root = false;

        for entry in entries.flatten() {
            let path = entry.path();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == KLOG_EXTENSION) {
                files.push(path);
            }
        }
    }

    // fs::read_dir order is platform-dependent
    files.sort();
    Ok(files)
}

fn project_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

/// Top-level document printed by `klog json`.
#[derive(Debug, Deserialize)]
struct KlogDocument {
    #[serde(default)]
    records: Option<Vec<KlogRecord>>,
    #[serde(default)]
    errors: Option<Vec<KlogError>>,
}

#[derive(Debug, Deserialize)]
struct KlogRecord {
    date: String,
    #[serde(default)]
    total_mins: Option<i64>,
    #[serde(default)]
    entries: Vec<KlogEntry>,
}

#[derive(Debug, Deserialize)]
struct KlogEntry {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    total: String,
    #[serde(default)]
    total_mins: Option<i64>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KlogError {
    #[serde(default)]
    line: Option<u64>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    details: String,
}

/// Parses `klog json` output into a project.
///
/// Entries without `total_mins` fall back to decoding `total`; records
/// without `total_mins` use the sum of their entries. Negative durations
/// count as zero.
pub fn parse_klog_json(name: &str, json: &str) -> Result<Project> {
    let document: KlogDocument = serde_json::from_str(json)?;

    if let Some(error) = document.errors.as_ref().and_then(|errors| errors.first()) {
        let line = error.line.map(|l| format!(" (line {l})")).unwrap_or_default();
        anyhow::bail!("klog reported an error{line}: {} {}", error.title, error.details.trim());
    }

    let days = document
        .records
        .unwrap_or_default()
        .into_iter()
        .map(into_day)
        .collect();

    Ok(Project::new(name, days))
}

fn into_day(record: KlogRecord) -> Day {
    let entries: Vec<TimeEntry> = record.entries.into_iter().map(into_entry).collect();
    match record.total_mins {
        Some(total) => Day::with_total(record.date, entries, non_negative(total)),
        None => Day::new(record.date, entries),
    }
}

fn into_entry(entry: KlogEntry) -> TimeEntry {
    let minutes = entry.total_mins.map_or_else(
        || {
            tracing::debug!(total = %entry.total, "entry has no total_mins, decoding total");
            duration::decode(&entry.total)
        },
        non_negative,
    );
    TimeEntry::new(entry.summary, minutes, entry.tags)
}

fn non_negative(minutes: i64) -> u64 {
    u64::try_from(minutes).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    const SAMPLE: &str = r##"{
      "records": [
        {
          "date": "2024-03-17",
          "summary": "",
          "total": "3h",
          "total_mins": 180,
          "should_total": "0m",
          "should_total_mins": 0,
          "tags": [],
          "entries": [
            {
              "type": "range",
              "summary": "Write #docs",
              "tags": ["#docs"],
              "total": "2h",
              "total_mins": 120,
              "start": "9:00",
              "start_mins": 540,
              "end": "11:00",
              "end_mins": 660
            },
            {
              "type": "duration",
              "summary": "#meeting with #docs team",
              "tags": ["#meeting", "#docs"],
              "total": "1h",
              "total_mins": 60
            }
          ]
        }
      ],
      "errors": null
    }"##;

    #[test]
    fn test_parse_klog_json() {
        let project = parse_klog_json("work", SAMPLE).unwrap();
        assert_eq!(project.name(), "work");
        assert_eq!(project.days().len(), 1);

        let day = &project.days()[0];
        assert_eq!(day.date(), "2024-03-17");
        assert_eq!(day.total_minutes(), 180);
        assert_eq!(day.entries()[1].tags(), ["#meeting", "#docs"]);
        assert_eq!(day.entries()[0].total_minutes(), 120);
    }

    #[test]
    fn test_parse_falls_back_to_duration_text() {
        let json = r#"{"records": [{"date": "2024-03-18", "entries": [
            {"summary": "a", "total": "1h30m", "tags": []},
            {"summary": "b", "total": "15m", "tags": ["x"]}
        ]}]}"#;
        let project = parse_klog_json("p", json).unwrap();
        let day = &project.days()[0];
        assert_eq!(day.entries()[0].total_minutes(), 90);
        assert_eq!(day.total_minutes(), 105);
    }

    #[test]
    fn test_parse_negative_durations_are_zero() {
        let json = r#"{"records": [{"date": "2024-03-18", "total_mins": -30, "entries": [
            {"summary": "undo", "total": "-30m", "total_mins": -30, "tags": []}
        ]}]}"#;
        let project = parse_klog_json("p", json).unwrap();
        assert_eq!(project.total_minutes(), 0);
    }

    #[test]
    fn test_parse_null_records() {
        let project = parse_klog_json("p", r#"{"records": null, "errors": null}"#).unwrap();
        assert!(project.days().is_empty());
    }

    #[test]
    fn test_parse_reports_klog_errors() {
        let json = r#"{"records": null, "errors": [
            {"line": 3, "column": 0, "length": 4, "title": "Invalid date", "details": "Please check the format "}
        ]}"#;
        let err = parse_klog_json("p", json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "klog reported an error (line 3): Invalid date Please check the format"
        );
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_klog_json("p", "not json").is_err());
    }

    #[test]
    fn test_discover_files_recursive_and_sorted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("clients/acme")).unwrap();
        fs::write(root.join("zeta.klg"), "").unwrap();
        fs::write(root.join("alpha.klg"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();
        fs::write(root.join("clients/acme/beta.klg"), "").unwrap();

        let files = discover_files(root).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            [
                PathBuf::from("alpha.klg"),
                PathBuf::from("clients/acme/beta.klg"),
                PathBuf::from("zeta.klg"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_files_does_not_follow_directory_symlinks() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("a.klg"), "").unwrap();
        std::os::unix::fs::symlink(root, root.join("loop")).unwrap();

        let files = discover_files(root).unwrap();
        assert_eq!(files, [root.join("a.klg")]);
    }

    #[test]
    fn test_discover_files_missing_dir_is_error() {
        let temp = TempDir::new().unwrap();
        let err = discover_files(&temp.path().join("missing")).unwrap_err();
        assert!(err.to_string().contains("failed to read"), "{err}");
    }

    #[test]
    fn test_load_projects_without_files_is_error() {
        let temp = TempDir::new().unwrap();
        let source = KlogSource::new("klog", vec![]);
        let err = source.load_projects(temp.path()).unwrap_err();
        assert!(err.to_string().starts_with("no .klg files found in"), "{err}");
    }

    #[cfg(unix)]
    fn fake_klog(dir: &Path, script: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-klog");
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[test]
    fn test_load_projects_runs_klog_per_file() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("data");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("alpha.klg"), "").unwrap();
        fs::write(data.join("beta.klg"), "").unwrap();
        fs::write(data.join("alpha.klg.json"), SAMPLE).unwrap();
        fs::write(data.join("beta.klg.json"), r#"{"records": []}"#).unwrap();

        // prints the fixture next to the file and records the arguments
        let command = fake_klog(
            temp.path(),
            r#"echo "$@" >> "$(dirname "$2")/calls.log"; cat "$2.json""#,
        );
        let source = KlogSource::new(command, vec!["--this-week".to_string()]);

        let projects = source.load_projects(&data).unwrap();
        let names: Vec<_> = projects.iter().map(Project::name).collect();
        assert_eq!(names, ["alpha", "beta"]);
        assert_eq!(projects[0].total_minutes(), 180);

        let calls = fs::read_to_string(data.join("calls.log")).unwrap();
        assert!(calls.lines().all(|line| line.starts_with("json ") && line.ends_with(" --this-week")));
        assert_eq!(calls.lines().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_projects_skips_failing_files() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("data");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("good.klg"), "").unwrap();
        fs::write(data.join("bad.klg"), "").unwrap();
        fs::write(data.join("good.klg.json"), SAMPLE).unwrap();

        let command = fake_klog(
            temp.path(),
            r#"if [ -f "$2.json" ]; then cat "$2.json"; else echo "parse error" >&2; exit 1; fi"#,
        );
        let source = KlogSource::new(command, vec![]);

        let projects = source.load_projects(&data).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name(), "good");
    }

    #[cfg(unix)]
    #[test]
    fn test_load_project_reports_exit_status() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.klg"), "").unwrap();
        let command = fake_klog(temp.path(), "echo 'boom' >&2; exit 2");
        let source = KlogSource::new(command, vec![]);

        let err = source.load_project(&temp.path().join("bad.klg")).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("boom"), "{message}");
    }

    #[test]
    fn test_load_project_missing_command() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.klg"), "").unwrap();
        let source = KlogSource::new("definitely-not-a-klog-binary", vec![]);
        let err = source.load_project(&temp.path().join("a.klg")).unwrap_err();
        assert!(err.to_string().starts_with("failed to run"), "{err}");
    }
}
