use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use meetwidget::{schedule_from_ics, ScheduleResult, WidgetConfig, WindowSpec};

fn feed(body: &str) -> String {
    let lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    format!(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//meetwidget//integration//EN\r\n{}\r\nEND:VCALENDAR\r\n",
        lines.join("\r\n")
    )
}

fn team_feed() -> String {
    feed(
        r"
        BEGIN:VEVENT
        UID:breakfast@example.com
        DTSTART:20250312T070000Z
        DTEND:20250312T073000Z
        SUMMARY:Breakfast
        END:VEVENT
        BEGIN:VEVENT
        UID:standup@example.com
        DTSTART:20250310T090000Z
        DTEND:20250310T091500Z
        RRULE:FREQ=DAILY;COUNT=5
        SUMMARY:Daily   standup
        LOCATION:https://zoom.us/j/4442113587
        END:VEVENT
        BEGIN:VEVENT
        UID:review@example.com
        DTSTART:20250312T093000Z
        SUMMARY:Design\, review
        DESCRIPTION:Agenda in doc.\nJoin at meet.google.com/abc-defg-hij
        END:VEVENT
        BEGIN:VEVENT
        UID:offsite@example.com
        DTSTART:20250313T100000Z
        DTEND:20250313T110000Z
        SUMMARY:Offsite planning
        END:VEVENT
        ",
    )
}

// 09:12 UTC seen from a UTC+2 desk
fn now() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 3, 12, 11, 12, 0)
        .unwrap()
}

#[test]
fn test_today_schedule_end_to_end() {
    let schedule = schedule_from_ics(&team_feed(), &now(), &WidgetConfig::default()).unwrap();

    let titles: Vec<&str> = schedule.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Breakfast", "Daily standup", "Design, review"]);

    let labels: Vec<&str> = schedule.events.iter().map(|e| e.relative_label.as_str()).collect();
    assert_eq!(labels, ["ended 102 mins ago", "current", "in 18 mins"]);

    assert_eq!(schedule.active_index, Some(1));
    assert_eq!(schedule.events.iter().filter(|e| e.is_active).count(), 1);

    let standup = &schedule.events[1];
    assert_eq!(standup.start.to_rfc3339(), "2025-03-12T11:00:00+02:00");
    assert_eq!(standup.join_url.as_deref(), Some("https://zoom.us/j/4442113587"));
    assert!(standup
        .native_url
        .as_deref()
        .unwrap()
        .starts_with("zoommtg://zoom.us/join?action=join&confno=4442113587"));

    let review = &schedule.events[2];
    assert_eq!(review.end, Utc.with_ymd_and_hms(2025, 3, 12, 10, 0, 0).unwrap());
    assert_eq!(review.description.as_deref(), Some("Agenda in doc. Join at meet.google.com/abc-defg-hij"));
    assert_eq!(review.join_url.as_deref(), Some("https://meet.google.com/abc-defg-hij"));
    assert_eq!(review.native_url, None);
}

#[test]
fn test_serialized_shape() {
    let schedule = schedule_from_ics(&team_feed(), &now(), &WidgetConfig::default()).unwrap();
    let json = serde_json::to_value(ScheduleResult::from(schedule)).unwrap();

    assert_eq!(json["active_index"], 1);
    let standup = &json["events"][1];
    assert_eq!(standup["start"], "2025-03-12T11:00:00+02:00");
    assert_eq!(standup["end"], "2025-03-12T11:15:00+02:00");
    assert_eq!(standup["relative_label"], "current");
    assert_eq!(standup["is_active"], true);
    assert!(standup["id"].as_str().unwrap().ends_with("-1"));
    assert!(json["events"][0]["join_url"].is_null());
}

#[test]
fn test_rolling_window_reaches_following_days() {
    let config = WidgetConfig {
        window: WindowSpec::Rolling { hours_before: 1, hours_ahead: 48 },
        ..WidgetConfig::default()
    };
    let schedule = schedule_from_ics(&team_feed(), &now(), &config).unwrap();

    let titles: Vec<&str> = schedule.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        ["Daily standup", "Design, review", "Daily standup", "Offsite planning", "Daily standup"]
    );
    assert_eq!(schedule.active_index, Some(0));
}

#[test]
fn test_meeting_host_allow_list() {
    let config = WidgetConfig {
        meeting_hosts: vec!["zoom.us".to_string()],
        ..WidgetConfig::default()
    };
    let schedule = schedule_from_ics(&team_feed(), &now(), &config).unwrap();

    assert!(schedule.events[1].join_url.is_some());
    assert_eq!(schedule.events[2].join_url, None);
}

#[test]
fn test_same_inputs_same_output() {
    let first = schedule_from_ics(&team_feed(), &now(), &WidgetConfig::default()).unwrap();
    let second = schedule_from_ics(&team_feed(), &now(), &WidgetConfig::default()).unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_relabel_later_in_the_day() {
    let schedule = schedule_from_ics(&team_feed(), &now(), &WidgetConfig::default()).unwrap();
    let later = schedule.at(&Utc.with_ymd_and_hms(2025, 3, 12, 9, 45, 0).unwrap());

    assert_eq!(later.active_index, Some(2));
    assert_eq!(later.events[1].relative_label, "ended 30 mins ago");
    assert_eq!(schedule.active_index, Some(1));
}

#[test]
fn test_malformed_feed_is_an_error() {
    let err = schedule_from_ics("<html>not a calendar</html>", &now(), &WidgetConfig::default()).unwrap_err();
    let result = ScheduleResult::from(err);

    assert!(result.is_error());
    assert!(result.events().is_empty());
    assert!(result.error_message().unwrap().starts_with("Failed to parse calendar feed"));
}

#[test]
fn test_truncated_feed_is_an_error_with_no_events() {
    let full = team_feed();
    let truncated = &full[..full.find("END:VEVENT").unwrap()];

    let err = schedule_from_ics(truncated, &now(), &WidgetConfig::default()).unwrap_err();
    let result = ScheduleResult::from(err);

    assert!(result.events().is_empty());
    assert!(result.error_message().unwrap().starts_with("Failed to parse calendar feed"));
}
