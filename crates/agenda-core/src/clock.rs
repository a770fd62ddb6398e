use chrono::{
  NaiveDate,
  NaiveTime,
  Timelike
};

use crate::error::ProjectError;

/// Parses a same-day time of day, `HH:MM` or the
/// API's `HH:MM:SS`, keeping any seconds.
pub fn parse_time_of_day(
  field: &'static str,
  raw: &str
) -> Result<NaiveTime, ProjectError> {
  let trimmed = raw.trim();
  NaiveTime::parse_from_str(
    trimmed, "%H:%M"
  )
  .or_else(|_| {
    NaiveTime::parse_from_str(
      trimmed, "%H:%M:%S"
    )
  })
  .map_err(|_| malformed(field, raw))
}

/// Minute-granular time of day: `HH:MM` is the
/// form the forms produce, and seconds from the
/// API's `HH:MM:SS` echo are dropped.
pub fn parse_clock(
  field: &'static str,
  raw: &str
) -> Result<NaiveTime, ProjectError> {
  let time = parse_time_of_day(field, raw)?;
  NaiveTime::from_hms_opt(
    time.hour(),
    time.minute(),
    0
  )
  .ok_or_else(|| malformed(field, raw))
}

fn malformed(
  field: &'static str,
  raw: &str
) -> ProjectError {
  ProjectError::MalformedTime {
    field,
    value: raw.to_string()
  }
}

/// Like [`parse_clock`] but treats a missing or
/// blank value as absent.
pub fn parse_optional_clock(
  field: &'static str,
  raw: Option<&str>
) -> Result<Option<NaiveTime>, ProjectError>
{
  present(raw)
    .map(|value| parse_clock(field, value))
    .transpose()
}

fn present(raw: Option<&str>) -> Option<&str> {
  raw.filter(|value| !value.trim().is_empty())
}

#[must_use]
pub fn format_clock(
  time: NaiveTime
) -> String {
  time.format("%H:%M").to_string()
}

/// `YYYY-MM-DD` alone, or `YYYY-MM-DDTHH:MM` when a
/// time of day is known.
#[must_use]
pub fn date_time_text(
  date: NaiveDate,
  time: Option<NaiveTime>
) -> String {
  let day =
    date.format("%Y-%m-%d").to_string();
  match time {
    | Some(time) => {
      format!("{day}T{}", format_clock(time))
    }
    | None => day
  }
}

/// Signed difference in fractional hours. An end
/// before the start yields a negative value.
#[must_use]
pub fn duration_hours(
  start: NaiveTime,
  end: NaiveTime
) -> f64 {
  (end - start).num_minutes() as f64 / 60.0
}

#[tracing::instrument(level = "trace")]
pub fn format_duration(
  start: Option<&str>,
  end: Option<&str>
) -> Result<Option<String>, ProjectError> {
  let (Some(start), Some(end)) =
    (present(start), present(end))
  else {
    return Ok(None);
  };
  let hours = duration_hours(
    parse_clock("start", start)?,
    parse_clock("end", end)?
  );
  Ok(Some(render_hours(hours)))
}

fn render_hours(hours_f: f64) -> String {
  let mut hours = hours_f.trunc() as i64;
  let mut minutes = ((hours_f
    - hours_f.trunc())
    * 60.0)
    .round() as i64;
  if minutes.abs() == 60 {
    hours += minutes.signum();
    minutes = 0;
  }

  match (hours, minutes) {
    | (0, minutes) => counted(minutes, "minute"),
    | (hours, 0) => counted(hours, "hour"),
    | (hours, minutes) => format!(
      "{} {}",
      counted(hours, "hour"),
      counted(minutes, "minute")
    )
  }
}

fn counted(
  n: i64,
  unit: &str
) -> String {
  if n == 1 {
    format!("{n} {unit}")
  } else {
    format!("{n} {unit}s")
  }
}
