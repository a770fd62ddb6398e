//! The task form as one immutable value.
//!
//! Every edit consumes the draft and hands back a
//! new one, so a half-applied edit can never be
//! observed. Checks the projector deliberately
//! skips (end after start, `until` after the due
//! date, interval range) live here, on the
//! producing side.

use std::collections::BTreeMap;

use chrono::{
  DateTime,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Weekday
};
use thiserror::Error;
use tracing::debug;

use crate::clock::parse_time_of_day;
use crate::error::ProjectError;
use crate::task::{
  RepeatKind,
  TaskRecord,
  TodoType
};
use crate::weekday::WeekdayMask;

/// Time of day written for a draft's repeat end
/// date, so the whole final day is included.
const REPEAT_END_OF_DAY: &str = "23:59:59";

const DEFAULT_MAX_FREQUENCY: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftPolicy {
  pub max_frequency: i64
}

impl Default for DraftPolicy {
  fn default() -> Self {
    Self {
      max_frequency: DEFAULT_MAX_FREQUENCY
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftIssue {
  #[error("title is blank")]
  BlankTitle,

  #[error(transparent)]
  MalformedTime(ProjectError),

  #[error(
    "end time {end} is not after start \
     time {start}"
  )]
  EndNotAfterStart {
    start: String,
    end:   String
  },

  #[error(
    "repeat frequency {frequency} is \
     outside 1..={max}"
  )]
  FrequencyOutOfRange {
    frequency: i64,
    max:       i64
  },

  #[error(
    "repeat end {value:?} is not a date"
  )]
  MalformedRepeatEnd {
    value: String
  },

  #[error(
    "repeat ends {until} before the due \
     date {due}"
  )]
  RepeatEndsBeforeDue {
    due:   NaiveDate,
    until: NaiveDate
  },

  #[error(
    "no weekdays selected; the task will \
     repeat every day"
  )]
  ImplicitEveryDay
}

impl DraftIssue {
  /// Blocking issues keep the draft from being
  /// submitted; the rest are advisory.
  #[must_use]
  pub fn is_blocking(&self) -> bool {
    !matches!(self, Self::ImplicitEveryDay)
  }
}

/// Fields the form never edits (delivery state,
/// server timestamps, unknown API keys) ride along
/// so that loading a record and encoding it again
/// gives the same record back.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
  title:            String,
  description:      String,
  todo_type:        TodoType,
  due_date:         NaiveDate,
  start_time:       Option<String>,
  end_time:         Option<String>,
  completed:        bool,
  notify_time:      Option<String>,
  repeat:           RepeatKind,
  repeat_frequency: i64,
  repeat_days:      WeekdayMask,
  repeat_end:       Option<String>,
  delivered:        bool,
  created_at:       Option<String>,
  repeat_start:     Option<String>,
  extra:            BTreeMap<String, serde_json::Value>
}

impl TaskDraft {
  #[must_use]
  pub fn new(
    title: impl Into<String>,
    due_date: NaiveDate
  ) -> Self {
    Self {
      title: title.into(),
      description: String::new(),
      todo_type: TodoType::Todo,
      due_date,
      start_time: None,
      end_time: None,
      completed: false,
      notify_time: None,
      repeat: RepeatKind::Never,
      repeat_frequency: 1,
      repeat_days: WeekdayMask::EMPTY,
      repeat_end: None,
      delivered: false,
      created_at: None,
      repeat_start: None,
      extra: BTreeMap::new()
    }
  }

  /// Loads a stored record back into the form for
  /// editing. The repeat end is kept as stored;
  /// [`Self::validate`] reports it if it is not a
  /// date.
  pub fn from_record(
    record: &TaskRecord
  ) -> Result<Self, ProjectError> {
    Ok(Self {
      title: record.title.clone(),
      description: record
        .description
        .clone(),
      todo_type: record.todo_type,
      due_date: record.due_date,
      start_time: record.start_time.clone(),
      end_time: record.end_time.clone(),
      completed: record.completed,
      notify_time: record
        .notify_time
        .clone(),
      repeat: record.repeat_kind()?,
      repeat_frequency: record
        .repeat_frequency,
      repeat_days: record.weekday_mask(),
      repeat_end: record
        .repeat_end_time
        .clone(),
      delivered: record.delivered,
      created_at: record.created_at.clone(),
      repeat_start: record
        .repeat_start_time
        .clone(),
      extra: record.extra.clone()
    })
  }

  #[must_use]
  pub fn with_title(
    self,
    title: impl Into<String>
  ) -> Self {
    Self {
      title: title.into(),
      ..self
    }
  }

  #[must_use]
  pub fn with_description(
    self,
    description: impl Into<String>
  ) -> Self {
    Self {
      description: description.into(),
      ..self
    }
  }

  #[must_use]
  pub fn with_todo_type(
    self,
    todo_type: TodoType
  ) -> Self {
    Self { todo_type, ..self }
  }

  #[must_use]
  pub fn with_due_date(
    self,
    due_date: NaiveDate
  ) -> Self {
    Self { due_date, ..self }
  }

  #[must_use]
  pub fn with_times(
    self,
    start: Option<&str>,
    end: Option<&str>
  ) -> Self {
    Self {
      start_time: start.map(str::to_string),
      end_time: end.map(str::to_string),
      ..self
    }
  }

  #[must_use]
  pub fn with_completed(
    self,
    completed: bool
  ) -> Self {
    Self { completed, ..self }
  }

  /// A new notify time has not been delivered yet.
  #[must_use]
  pub fn with_notify_time(
    self,
    notify_time: Option<&str>
  ) -> Self {
    let notify_time =
      notify_time.map(str::to_string);
    let delivered = self.delivered
      && notify_time == self.notify_time;
    Self {
      notify_time,
      delivered,
      ..self
    }
  }

  #[must_use]
  pub fn with_repeat(
    self,
    repeat: RepeatKind,
    frequency: i64
  ) -> Self {
    Self {
      repeat,
      repeat_frequency: frequency,
      ..self
    }
  }

  /// Stores the last day as
  /// `YYYY-MM-DDT23:59:59`.
  #[must_use]
  pub fn with_repeat_end(
    self,
    repeat_end: Option<NaiveDate>
  ) -> Self {
    Self {
      repeat_end: repeat_end.map(|day| {
        format!(
          "{}T{REPEAT_END_OF_DAY}",
          day.format("%Y-%m-%d")
        )
      }),
      ..self
    }
  }

  #[must_use]
  pub fn toggle_weekday(
    self,
    day: Weekday
  ) -> Self {
    Self {
      repeat_days: self
        .repeat_days
        .toggle_day(day),
      ..self
    }
  }

  /// Raw-bit variant of [`Self::toggle_weekday`];
  /// a non-canonical bit leaves the draft as is.
  pub fn toggle_weekday_bit(
    self,
    bit: u16
  ) -> Result<Self, ProjectError> {
    Ok(Self {
      repeat_days: self
        .repeat_days
        .toggle_bit(bit)?,
      ..self
    })
  }

  #[must_use]
  pub fn repeat(&self) -> RepeatKind {
    self.repeat
  }

  #[must_use]
  pub fn repeat_days(&self) -> WeekdayMask {
    self.repeat_days
  }

  #[must_use]
  pub fn title(&self) -> &str {
    &self.title
  }

  #[must_use]
  pub fn due_date(&self) -> NaiveDate {
    self.due_date
  }

  #[must_use]
  pub fn repeat_end(&self) -> Option<&str> {
    self.repeat_end.as_deref()
  }

  /// Collects every issue with the draft. `Ok`
  /// carries advisory issues only; `Err` carries
  /// the full list when anything blocks
  /// submission.
  #[tracing::instrument(
    level = "debug",
    skip_all
  )]
  pub fn validate(
    &self,
    policy: &DraftPolicy
  ) -> Result<Vec<DraftIssue>, Vec<DraftIssue>>
  {
    let mut issues = Vec::new();

    if self.title.trim().is_empty() {
      issues.push(DraftIssue::BlankTitle);
    }

    let start = exact_time(
      "start",
      self.start_time.as_deref()
    );
    let end =
      exact_time("end", self.end_time.as_deref());
    match (start, end) {
      | (
        Ok(Some((start, start_raw))),
        Ok(Some((end, end_raw)))
      ) if end <= start => {
        issues.push(
          DraftIssue::EndNotAfterStart {
            start: start_raw.to_string(),
            end:   end_raw.to_string()
          }
        );
      }
      | (start, end) => {
        for err in [start.err(), end.err()]
          .into_iter()
          .flatten()
        {
          issues.push(
            DraftIssue::MalformedTime(err)
          );
        }
      }
    }

    if self.repeat.is_repeating() {
      if !(1..=policy.max_frequency)
        .contains(&self.repeat_frequency)
      {
        issues.push(
          DraftIssue::FrequencyOutOfRange {
            frequency: self.repeat_frequency,
            max:       policy.max_frequency
          }
        );
      }

      if let Some(raw) = self
        .repeat_end
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
      {
        match repeat_end_date(raw) {
          | Some(until)
            if until < self.due_date =>
          {
            issues.push(
              DraftIssue::RepeatEndsBeforeDue {
                due: self.due_date,
                until
              }
            );
          }
          | Some(_) => {}
          | None => issues.push(
            DraftIssue::MalformedRepeatEnd {
              value: raw.to_string()
            }
          )
        }
      }

      if self.repeat == RepeatKind::Weekly
        && self.repeat_days.is_empty()
      {
        issues
          .push(DraftIssue::ImplicitEveryDay);
      }
    }

    debug!(
      issues = issues.len(),
      "draft validated"
    );
    if issues.iter().any(DraftIssue::is_blocking)
    {
      Err(issues)
    } else {
      Ok(issues)
    }
  }

  /// Encodes the draft into the stored record
  /// shape, with the letter repeat code and the
  /// numeric weekday mask.
  #[must_use]
  pub fn into_record(
    self,
    id: u64
  ) -> TaskRecord {
    let mut record =
      TaskRecord::new(id, self.title, self.due_date);
    record.description = self.description;
    record.todo_type = self.todo_type;
    record.start_time = self.start_time;
    record.end_time = self.end_time;
    record.completed = self.completed;
    record.notify_time = self.notify_time;
    record.repeat_type =
      self.repeat.code().to_string();
    record.repeat_frequency =
      self.repeat_frequency;
    record.repeat_days =
      u16::from(self.repeat_days.bits());
    record.repeat_end_time = self.repeat_end;
    record.delivered = self.delivered;
    record.created_at = self.created_at;
    record.repeat_start_time = self.repeat_start;
    record.extra = self.extra;
    record
  }
}

/// Parses a present time keeping its seconds,
/// paired with the trimmed text for messages.
fn exact_time<'a>(
  field: &'static str,
  raw: Option<&'a str>
) -> Result<Option<(NaiveTime, &'a str)>, ProjectError>
{
  raw
    .map(str::trim)
    .filter(|value| !value.is_empty())
    .map(|value| {
      parse_time_of_day(field, value)
        .map(|time| (time, value))
    })
    .transpose()
}

/// Day part of a stored repeat end: an RFC 3339
/// timestamp, a naive `YYYY-MM-DDTHH:MM[:SS]`, or
/// a bare date.
fn repeat_end_date(raw: &str) -> Option<NaiveDate> {
  let trimmed = raw.trim();
  if let Ok(stamp) =
    DateTime::parse_from_rfc3339(trimmed)
  {
    return Some(stamp.date_naive());
  }
  for format in
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
  {
    if let Ok(stamp) =
      NaiveDateTime::parse_from_str(trimmed, format)
    {
      return Some(stamp.date());
    }
  }
  NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
    .ok()
}
