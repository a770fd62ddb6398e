use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ProjectError;
use crate::weekday::WeekdayMask;

/// Display category of a record. Never affects recurrence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TodoType {
    #[default]
    Todo,
    Class,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatKind {
    Never,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatKind {
    /// Single-letter code the task API stores.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Never => "N",
            Self::Weekly => "W",
            Self::Monthly => "M",
            Self::Yearly => "Y",
        }
    }

    pub const fn is_repeating(self) -> bool {
        !matches!(self, Self::Never)
    }
}

impl FromStr for RepeatKind {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" | "NEVER" => Ok(Self::Never),
            "W" | "WEEKLY" => Ok(Self::Weekly),
            "M" | "MONTHLY" => Ok(Self::Monthly),
            "Y" | "YEARLY" => Ok(Self::Yearly),
            _ => Err(ProjectError::UnsupportedRecurrenceKind {
                kind: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RepeatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Never => "never",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

/// A todo as the task API lists it. Field names follow the API's JSON keys.
///
/// `repeat_type` stays in its wire form so that a single record with an
/// unknown code fails its own projection instead of the whole batch load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub id: u64,

    #[serde(default)]
    pub todo_type: TodoType,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub due_date: NaiveDate,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub notify_time: Option<String>,

    #[serde(default)]
    pub delivered: bool,

    #[serde(default = "default_repeat_type")]
    pub repeat_type: String,

    #[serde(default = "default_repeat_frequency")]
    pub repeat_frequency: i64,

    #[serde(default)]
    pub repeat_days: u16,

    #[serde(default)]
    pub repeat_start_time: Option<String>,

    #[serde(default)]
    pub repeat_end_time: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_repeat_type() -> String {
    RepeatKind::Never.code().to_string()
}

fn default_repeat_frequency() -> i64 {
    1
}

impl TaskRecord {
    pub fn new(id: u64, title: String, due_date: NaiveDate) -> Self {
        Self {
            id,
            todo_type: TodoType::Todo,
            title,
            description: String::new(),
            due_date,
            start_time: None,
            end_time: None,
            completed: false,
            created_at: None,
            notify_time: None,
            delivered: false,
            repeat_type: default_repeat_type(),
            repeat_frequency: default_repeat_frequency(),
            repeat_days: 0,
            repeat_start_time: None,
            repeat_end_time: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn repeat_kind(&self) -> Result<RepeatKind, ProjectError> {
        self.repeat_type.parse()
    }

    pub fn weekday_mask(&self) -> WeekdayMask {
        WeekdayMask::from_bits(self.repeat_days)
    }
}
