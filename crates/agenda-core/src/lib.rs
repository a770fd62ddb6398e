pub mod clock;
pub mod draft;
pub mod error;
pub mod event;
pub mod projector;
pub mod task;
pub mod weekday;

pub use clock::format_duration;
pub use error::ProjectError;
pub use event::CalendarEvent;
pub use projector::{
  BatchProjection,
  project_event,
  project_events
};
pub use task::TaskRecord;
pub use weekday::{
  WeekdayMask,
  decode_weekday_bitmask,
  encode_weekday_toggle
};
