use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::task::RepeatKind;
use crate::weekday::weekday_keys;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// `None` for records that do not repeat.
    pub const fn for_kind(kind: RepeatKind) -> Option<Self> {
        match kind {
            RepeatKind::Never => None,
            RepeatKind::Weekly => Some(Self::Weekly),
            RepeatKind::Monthly => Some(Self::Monthly),
            RepeatKind::Yearly => Some(Self::Yearly),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,

    pub interval: i64,

    /// First occurrence, same rendering as a simple event's `start`.
    pub anchor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,

    /// Only present on weekly rules.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "weekday_keys")]
    pub weekdays: Option<Vec<Weekday>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimpleEvent {
    pub id: u64,
    pub title: String,
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_tag: Option<ColorTag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringEvent {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_tag: Option<ColorTag>,
    pub recurrence_rule: RecurrenceRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<f64>,
}

/// What the calendar surface receives for one record. Rebuilt on every
/// projection and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CalendarEvent {
    Simple(SimpleEvent),
    Recurring(RecurringEvent),
}

impl CalendarEvent {
    pub fn id(&self) -> u64 {
        match self {
            Self::Simple(event) => event.id,
            Self::Recurring(event) => event.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Simple(event) => &event.title,
            Self::Recurring(event) => &event.title,
        }
    }

    pub fn color_tag(&self) -> Option<ColorTag> {
        match self {
            Self::Simple(event) => event.color_tag,
            Self::Recurring(event) => event.color_tag,
        }
    }

    pub fn recurrence_rule(&self) -> Option<&RecurrenceRule> {
        match self {
            Self::Simple(_) => None,
            Self::Recurring(event) => Some(&event.recurrence_rule),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Self::Recurring(_))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn recurring_event_renders_camel_case_with_weekday_keys() {
        let event = CalendarEvent::Recurring(RecurringEvent {
            id: 3,
            title: "Seminar".to_string(),
            color_tag: None,
            recurrence_rule: RecurrenceRule {
                frequency: Frequency::Weekly,
                interval: 2,
                anchor: "2024-03-04T10:00".to_string(),
                until: None,
                weekdays: Some(vec![Weekday::Mon, Weekday::Wed]),
            },
            duration_hours: Some(1.5),
        });

        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(
            value,
            json!({
                "id": 3,
                "title": "Seminar",
                "recurrenceRule": {
                    "frequency": "weekly",
                    "interval": 2,
                    "anchor": "2024-03-04T10:00",
                    "weekdays": ["mon", "wed"]
                },
                "durationHours": 1.5
            })
        );

        let back: CalendarEvent = serde_json::from_value(value).expect("deserialize event");
        assert_eq!(back, event);
    }

    #[test]
    fn simple_event_omits_absent_fields() {
        let event = CalendarEvent::Simple(SimpleEvent {
            id: 1,
            title: "Dentist".to_string(),
            start: "2024-03-01".to_string(),
            end: None,
            color_tag: Some(ColorTag::Completed),
        });
        assert_eq!(
            serde_json::to_value(&event).expect("serialize event"),
            json!({
                "id": 1,
                "title": "Dentist",
                "start": "2024-03-01",
                "colorTag": "completed"
            })
        );
        assert!(!event.is_recurring());
        assert_eq!(event.recurrence_rule(), None);
    }
}
