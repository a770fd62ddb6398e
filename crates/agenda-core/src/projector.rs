//! Turns stored task records into calendar events.
//!
//! Projection is a pure mapping over one record: it
//! never mutates the record, performs no I/O, and
//! re-deriving an event from an unchanged record
//! yields an identical value. Business validity
//! (end before start, `until` before the anchor, a
//! zero interval) is passed through untouched; only
//! structural problems are reported.

use tracing::{
  debug,
  warn
};

use crate::clock::{
  date_time_text,
  duration_hours,
  parse_optional_clock
};
use crate::error::ProjectError;
use crate::event::{
  CalendarEvent,
  ColorTag,
  Frequency,
  RecurrenceRule,
  RecurringEvent,
  SimpleEvent
};
use crate::task::TaskRecord;

#[tracing::instrument(
  level = "debug",
  skip_all,
  fields(id = task.id)
)]
pub fn project_event(
  task: &TaskRecord
) -> Result<CalendarEvent, ProjectError> {
  let kind = task.repeat_kind()?;
  let color_tag = task
    .completed
    .then_some(ColorTag::Completed);

  let start_time = parse_optional_clock(
    "start",
    task.start_time.as_deref()
  )?;
  let end_time = parse_optional_clock(
    "end",
    task.end_time.as_deref()
  )?;
  let start =
    date_time_text(task.due_date, start_time);

  let Some(frequency) =
    Frequency::for_kind(kind)
  else {
    debug!(%kind, "projected simple event");
    return Ok(CalendarEvent::Simple(
      SimpleEvent {
        id: task.id,
        title: task.title.clone(),
        start,
        end: end_time.map(|end| {
          date_time_text(
            task.due_date,
            Some(end)
          )
        }),
        color_tag
      }
    ));
  };

  let weekdays = (frequency
    == Frequency::Weekly)
    .then(|| task.weekday_mask().days());
  let duration = match (start_time, end_time)
  {
    | (Some(start), Some(end)) => {
      Some(duration_hours(start, end))
    }
    | _ => None
  };
  let until = task
    .repeat_end_time
    .clone()
    .filter(|until| !until.trim().is_empty());

  debug!(
    %kind,
    interval = task.repeat_frequency,
    until = ?until,
    "projected recurring event"
  );

  Ok(CalendarEvent::Recurring(
    RecurringEvent {
      id: task.id,
      title: task.title.clone(),
      color_tag,
      recurrence_rule: RecurrenceRule {
        frequency,
        interval: task.repeat_frequency,
        anchor: start,
        until,
        weekdays
      },
      duration_hours: duration
    }
  ))
}

/// A record that could not be projected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionFailure {
  pub id:    u64,
  pub error: ProjectError
}

/// Outcome of projecting a set of records. Each
/// record is projected on its own, so one bad
/// record never hides the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchProjection {
  pub events:   Vec<CalendarEvent>,
  pub failures: Vec<ProjectionFailure>
}

impl BatchProjection {
  #[must_use]
  pub fn is_clean(&self) -> bool {
    self.failures.is_empty()
  }
}

#[tracing::instrument(
  skip_all,
  fields(count = tasks.len())
)]
pub fn project_events(
  tasks: &[TaskRecord]
) -> BatchProjection {
  let mut batch = BatchProjection::default();
  for task in tasks {
    match project_event(task) {
      | Ok(event) => batch.events.push(event),
      | Err(error) => {
        warn!(
          id = task.id,
          error = %error,
          "task could not be projected"
        );
        batch.failures.push(
          ProjectionFailure {
            id: task.id,
            error
          }
        );
      }
    }
  }
  debug!(
    events = batch.events.len(),
    failures = batch.failures.len(),
    "batch projected"
  );
  batch
}
