use agenda_core::event::{CalendarEvent, ColorTag, Frequency};
use agenda_core::task::TaskRecord;
use agenda_core::weekday::WeekdayMask;
use agenda_core::{ProjectError, project_event, project_events};
use chrono::{NaiveDate, Weekday};

fn record(json: &str) -> TaskRecord {
    serde_json::from_str(json).expect("decode task record")
}

fn weekly_seminar() -> TaskRecord {
    let mut task = TaskRecord::new(
        5,
        "Seminar".to_string(),
        NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date"),
    );
    task.repeat_type = "W".to_string();
    task.repeat_frequency = 2;
    task.repeat_days = u16::from(WeekdayMask::MONDAY | WeekdayMask::WEDNESDAY);
    task.repeat_end_time = Some("2024-06-01T23:59:59".to_string());
    task
}

#[test]
fn non_recurring_task_projects_to_simple_event() {
    let task = record(
        r#"{"id": 1, "title": "Dentist", "due_date": "2024-03-01",
            "start_time": "14:00", "end_time": "15:00", "repeat_type": "N"}"#,
    );

    let event = project_event(&task).expect("project task");
    let CalendarEvent::Simple(simple) = event else {
        panic!("expected a simple event, got {event:?}");
    };
    assert_eq!(simple.start, "2024-03-01T14:00");
    assert_eq!(simple.end.as_deref(), Some("2024-03-01T15:00"));
    assert_eq!(simple.color_tag, None);
}

#[test]
fn weekly_task_projects_to_rule_with_weekdays() {
    let event = project_event(&weekly_seminar()).expect("project task");
    let rule = event.recurrence_rule().expect("recurring event");

    assert_eq!(rule.frequency, Frequency::Weekly);
    assert_eq!(rule.interval, 2);
    assert_eq!(rule.anchor, "2024-03-04");
    assert_eq!(rule.weekdays, Some(vec![Weekday::Mon, Weekday::Wed]));
    assert_eq!(rule.until.as_deref(), Some("2024-06-01T23:59:59"));
}

#[test]
fn weekly_task_without_days_repeats_every_day() {
    let mut task = weekly_seminar();
    task.repeat_days = 0;

    let event = project_event(&task).expect("project task");
    let rule = event.recurrence_rule().expect("recurring event");
    assert_eq!(
        rule.weekdays,
        Some(vec![
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ])
    );
}

#[test]
fn monthly_and_yearly_rules_never_carry_weekdays() {
    for (code, frequency) in [("M", Frequency::Monthly), ("Y", Frequency::Yearly)] {
        for days in [0_u16, 0b010_1000, 0b111_1111] {
            let mut task = weekly_seminar();
            task.repeat_type = code.to_string();
            task.repeat_days = days;

            let event = project_event(&task).expect("project task");
            let rule = event.recurrence_rule().expect("recurring event");
            assert_eq!(rule.frequency, frequency);
            assert_eq!(rule.weekdays, None);

            let json = serde_json::to_value(&event).expect("serialize event");
            assert!(json["recurrenceRule"].get("weekdays").is_none());
        }
    }
}

#[test]
fn projection_is_deterministic() {
    let mut task = weekly_seminar();
    task.start_time = Some("09:15".to_string());
    task.end_time = Some("10:45".to_string());
    task.completed = true;

    let first = project_event(&task).expect("project task");
    let second = project_event(&task).expect("project task");
    assert_eq!(first, second);
    assert_eq!(first.color_tag(), Some(ColorTag::Completed));
}

#[test]
fn contradictory_bounds_pass_through() {
    let mut task = weekly_seminar();
    task.repeat_frequency = 0;
    task.repeat_end_time = Some("2023-01-01T00:00:00".to_string());
    task.start_time = Some("11:00".to_string());
    task.end_time = Some("10:00".to_string());

    let event = project_event(&task).expect("project task");
    let CalendarEvent::Recurring(recurring) = event else {
        panic!("expected a recurring event");
    };
    assert_eq!(recurring.recurrence_rule.interval, 0);
    assert_eq!(
        recurring.recurrence_rule.until.as_deref(),
        Some("2023-01-01T00:00:00")
    );
    assert_eq!(recurring.duration_hours, Some(-1.0));
}

#[test]
fn api_listing_projects_with_failures_isolated() {
    let tasks: Vec<TaskRecord> = serde_json::from_str(
        r#"[
            {"id": 1, "title": "Essay", "due_date": "2024-03-01", "completed": true},
            {"id": 2, "title": "Broken", "due_date": "2024-03-01", "repeat_type": "Q"},
            {"id": 3, "title": "Lecture", "todo_type": "CLASS", "due_date": "2024-03-05",
             "start_time": "08:00:00", "end_time": "09:30:00",
             "repeat_type": "W", "repeat_frequency": 1, "repeat_days": 16}
        ]"#,
    )
    .expect("decode listing");

    let batch = project_events(&tasks);
    assert_eq!(batch.events.len(), 2);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].id, 2);
    assert_eq!(
        batch.failures[0].error,
        ProjectError::UnsupportedRecurrenceKind {
            kind: "Q".to_string()
        }
    );

    let lecture = serde_json::to_value(&batch.events[1]).expect("serialize event");
    assert_eq!(lecture["recurrenceRule"]["anchor"], "2024-03-05T08:00");
    assert_eq!(lecture["recurrenceRule"]["weekdays"], serde_json::json!(["tue"]));
    assert_eq!(lecture["durationHours"], 1.5);
}
