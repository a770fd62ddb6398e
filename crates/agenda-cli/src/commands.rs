use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use agenda_core::draft::{DraftPolicy, TaskDraft};
use agenda_core::event::CalendarEvent;
use agenda_core::task::TaskRecord;
use agenda_core::weekday::{WeekdayMask, parse_weekday_name, weekday_key};
use agenda_core::{decode_weekday_bitmask, encode_weekday_toggle, format_duration, project_events};
use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::config::{self, Config};

#[tracing::instrument(skip(cfg, out))]
pub fn dispatch(cfg: &Config, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Project { file } => {
            let raw = read_records(file.as_deref())?;
            let rendered = project_json(cfg, &raw)?;
            writeln!(out, "{rendered}")?;
        }
        Command::Check { file } => {
            let raw = read_records(file.as_deref())?;
            let report = check_json(cfg, &raw)?;
            for line in &report.lines {
                writeln!(out, "{line}")?;
            }
            if report.blocking > 0 {
                return Err(anyhow!("{} task(s) failed validation", report.blocking));
            }
        }
        Command::Days { mask } => {
            writeln!(out, "{}", days_text(mask))?;
        }
        Command::Toggle { mask, day } => {
            writeln!(out, "{}", toggle_mask(mask, &day)?)?;
        }
        Command::Duration { start, end } => {
            if let Some(text) = format_duration(Some(start.as_str()), Some(end.as_str()))? {
                writeln!(out, "{text}")?;
            }
        }
        Command::Config => {
            let mut entries: Vec<_> = cfg.iter().collect();
            entries.sort();
            for (key, value) in entries {
                writeln!(out, "{key}={value}")?;
            }
        }
    }
    Ok(())
}

fn read_records(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read task records from {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read task records from stdin")?;
            Ok(buf)
        }
    }
}

/// Projects an API listing and renders the events as JSON. Records that fail
/// are skipped with a warning unless `projection.skip_invalid` is off.
#[tracing::instrument(skip_all)]
pub fn project_json(cfg: &Config, raw: &str) -> anyhow::Result<String> {
    let tasks: Vec<TaskRecord> =
        serde_json::from_str(raw).context("task records must be a JSON array of todos")?;
    let batch = project_events(&tasks);

    if !batch.is_clean() {
        let skip_invalid = cfg.get_bool(config::PROJECTION_SKIP_INVALID).unwrap_or(true);
        if !skip_invalid && let Some(first) = batch.failures.first() {
            return Err(anyhow!("task {} could not be projected: {}", first.id, first.error));
        }
        warn!(skipped = batch.failures.len(), "skipped tasks that could not be projected");
    }

    info!(events = batch.events.len(), "projected tasks");
    render_json(cfg, &batch.events)
}

fn render_json(cfg: &Config, events: &[CalendarEvent]) -> anyhow::Result<String> {
    let pretty = cfg.get_bool(config::OUTPUT_PRETTY).unwrap_or(true);
    let rendered = if pretty {
        serde_json::to_string_pretty(events)
    } else {
        serde_json::to_string(events)
    };
    rendered.context("failed to render events as JSON")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub lines: Vec<String>,
    pub blocking: usize,
}

/// Loads each record back into a draft and reports every issue found.
#[tracing::instrument(skip_all)]
pub fn check_json(cfg: &Config, raw: &str) -> anyhow::Result<CheckReport> {
    let tasks: Vec<TaskRecord> =
        serde_json::from_str(raw).context("task records must be a JSON array of todos")?;
    let policy = match cfg.get_i64(config::DRAFT_FREQUENCY_MAX)? {
        Some(max_frequency) => DraftPolicy { max_frequency },
        None => DraftPolicy::default(),
    };

    let mut report = CheckReport::default();
    for task in &tasks {
        let draft = match TaskDraft::from_record(task) {
            Ok(draft) => draft,
            Err(err) => {
                report.blocking += 1;
                report.lines.push(format!("task {}: error: {err}", task.id));
                continue;
            }
        };
        let (issues, blocked) = match draft.validate(&policy) {
            Ok(advisories) => (advisories, false),
            Err(issues) => (issues, true),
        };
        if blocked {
            report.blocking += 1;
        }
        for issue in issues {
            let level = if issue.is_blocking() { "error" } else { "warning" };
            report.lines.push(format!("task {}: {level}: {issue}", task.id));
        }
    }

    debug!(tasks = tasks.len(), blocking = report.blocking, "checked tasks");
    Ok(report)
}

pub fn days_text(mask: u16) -> String {
    decode_weekday_bitmask(mask)
        .into_iter()
        .map(weekday_key)
        .collect::<Vec<_>>()
        .join(",")
}

/// `day` is either a weekday name or the raw bit, decimal or `0b`-prefixed.
pub fn toggle_mask(mask: u16, day: &str) -> anyhow::Result<u16> {
    let bit = match parse_weekday_name(day) {
        Some(weekday) => u16::from(WeekdayMask::bit_for(weekday)),
        None => parse_bit(day)?,
    };
    debug!(mask, bit, "toggling weekday bit");
    Ok(encode_weekday_toggle(mask, bit)?)
}

fn parse_bit(raw: &str) -> anyhow::Result<u16> {
    let trimmed = raw.trim();
    let parsed = match trimmed.strip_prefix("0b") {
        Some(binary) => u16::from_str_radix(&binary.replace('_', ""), 2),
        None => trimmed.parse::<u16>(),
    };
    parsed.with_context(|| format!("expected a weekday name or bit value, got {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_lists_keys_sunday_first() {
        assert_eq!(days_text(0b010_1001), "mon,wed,sat");
        assert_eq!(days_text(0), "sun,mon,tue,wed,thu,fri,sat");
    }

    #[test]
    fn toggle_accepts_names_and_bits() {
        assert_eq!(toggle_mask(0, "Monday").expect("toggle"), 32);
        assert_eq!(toggle_mask(32, "32").expect("toggle"), 0);
        assert_eq!(toggle_mask(0, "0b000_0001").expect("toggle"), 1);
        assert!(toggle_mask(0, "3").is_err());
        assert!(toggle_mask(0, "someday").is_err());
    }
}
