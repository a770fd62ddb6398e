use thiserror::Error;

/// Structural failures of a single projection or
/// mask edit. Business-level oddities (negative
/// durations, an `until` before the anchor, a zero
/// interval) are not errors here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
  #[error(
    "unsupported recurrence kind: \
     {kind:?}"
  )]
  UnsupportedRecurrenceKind {
    kind: String
  },

  #[error(
    "invalid weekday bit: {bit} \
     (expected one of 0b1000000 .. \
     0b0000001)"
  )]
  InvalidWeekdayBit { bit: u16 },

  #[error(
    "malformed {field} time {value:?}; \
     expected HH:MM"
  )]
  MalformedTime {
    field: &'static str,
    value: String
  }
}
