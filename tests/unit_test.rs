use chrono::{NaiveDate, Utc};
use sports_central::lifecycle::{plan_transition, prepare_event, StatusAction};
use sports_central::models::*;
use sports_central::scoring::{
    apply_score_update, coerce_number, compute_winner, normalize_overs, winning_margin, Outcome,
};
use sports_central::views::{filter_by_tab, summarize, tab_counts, Tab};
use sports_central::{AppError, TransitionError};
use uuid::Uuid;

fn fixture(sport: Sport, status: EventStatus) -> Event {
    NewEvent {
        name: "Fixture".to_string(),
        sport,
        date: NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
        time: None,
        venue: None,
        team1: "North".to_string(),
        team2: "South".to_string(),
        status,
        created_at: Utc::now(),
        created_by: "admin".to_string(),
    }
    .into_event(Uuid::new_v4())
}

fn balls(value: f64) -> i64 {
    ((value - value.floor()) * 10.0).round() as i64
}

/// Unit tests for score entry
#[test]
fn test_garbage_input_stores_zero() {
    let cricket = fixture(Sport::Cricket, EventStatus::Live);
    for field in ScoreField::ALL {
        for raw in ["", "abc", "--", "NaN", "Infinity", " "] {
            assert_eq!(apply_score_update(&cricket, field, raw), 0.0, "{} <- {:?}", field, raw);
        }
    }
}

#[test]
fn test_leading_number_is_kept() {
    assert_eq!(coerce_number("145/3"), 145.0);
    assert_eq!(coerce_number("12.5 overs"), 12.5);
}

#[test]
fn test_cricket_overs_always_normalized() {
    let cricket = fixture(Sport::Cricket, EventStatus::Live);
    for whole in 0..50 {
        for digit in 0..10 {
            let raw = format!("{}.{}", whole, digit);
            let stored = apply_score_update(&cricket, ScoreField::Overs1, &raw);
            assert!(balls(stored) <= 5, "{} stored as {}", raw, stored);
            assert!((normalize_overs(stored) - stored).abs() < 1e-9);
        }
    }
}

#[test]
fn test_overs_examples() {
    let cricket = fixture(Sport::Cricket, EventStatus::Live);
    let cases = [("2.7", 3.1), ("4.6", 5.0), ("3.5", 3.5), ("10", 10.0)];
    for (raw, expected) in cases {
        let stored = apply_score_update(&cricket, ScoreField::Overs2, raw);
        assert!((stored - expected).abs() < 1e-9, "{} -> {}", raw, stored);
    }
}

#[test]
fn test_other_sports_keep_overs_as_typed() {
    let tennis = fixture(Sport::Tennis, EventStatus::Live);
    assert_eq!(apply_score_update(&tennis, ScoreField::Overs1, "2.7"), 2.7);
}

/// Unit tests for results
#[test]
fn test_winner_only_when_completed() {
    for status in EventStatus::ALL {
        let mut event = fixture(Sport::Football, status);
        event.score1 = 2.0;
        event.score2 = 1.0;
        let expected = (status == EventStatus::Completed).then(|| Outcome::Winner("North".to_string()));
        assert_eq!(compute_winner(&event), expected);
    }
}

#[test]
fn test_tied_completed_game_is_draw() {
    let mut event = fixture(Sport::Cricket, EventStatus::Completed);
    event.score1 = 180.0;
    event.score2 = 180.0;
    assert_eq!(compute_winner(&event), Some(Outcome::Draw));
    assert_eq!(winning_margin(&event), None);
    assert_eq!(summarize(&event).result_label(), Some("Draw"));
}

#[test]
fn test_cricket_margin_in_runs() {
    let mut event = fixture(Sport::Cricket, EventStatus::Completed);
    event.score1 = 160.0;
    event.score2 = 201.0;
    assert_eq!(compute_winner(&event), Some(Outcome::Winner("South".to_string())));
    assert_eq!(winning_margin(&event), Some(41.0));
}

/// Unit tests for dashboard tabs
#[test]
fn test_tabs_partition_by_status() {
    let events: Vec<Event> = EventStatus::ALL
        .into_iter()
        .map(|status| fixture(Sport::Volleyball, status))
        .collect();

    let counts = tab_counts(&events);
    assert_eq!(counts.all, events.len());
    assert_eq!(counts.upcoming + counts.live + counts.completed, events.len() - 1);

    for tab in Tab::ALL {
        let listed = filter_by_tab(&events, tab);
        assert_eq!(listed.len(), counts.get(tab));
        let has_delayed = listed.iter().any(|e| e.status == EventStatus::Delayed);
        assert_eq!(has_delayed, tab == Tab::All);
    }
}

/// Unit tests for the status machine
#[test]
fn test_full_path_through_status_machine() {
    let mut event = fixture(Sport::Cricket, EventStatus::Scheduled);
    let path = [
        StatusAction::StartLive,
        StatusAction::Delay {
            reason: "Rain".to_string(),
        },
        StatusAction::Resume,
        StatusAction::Complete,
    ];

    for action in path {
        let change = plan_transition(&event, &action)
            .expect("transition allowed")
            .expect("status write");
        event.apply_patch(&change.into());
    }

    assert_eq!(event.status, EventStatus::Completed);
    assert_eq!(event.delay_reason, None);
}

#[test]
fn test_scheduled_cannot_complete() {
    let event = fixture(Sport::Cricket, EventStatus::Scheduled);
    let err = plan_transition(&event, &StatusAction::Complete).unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            to: EventStatus::Completed,
            reason: TransitionError::NotAllowedFrom(EventStatus::Scheduled),
        }
    ));
    assert!(err.is_rejection());
}

#[test]
fn test_blank_delay_reason_is_rejected() {
    let event = fixture(Sport::Cricket, EventStatus::Live);
    let err = plan_transition(
        &event,
        &StatusAction::Delay {
            reason: "   ".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            to: EventStatus::Delayed,
            reason: TransitionError::MissingDelayReason,
        }
    ));
    assert_eq!(err.notice(), "Please enter a reason for the delay.");

    // Same answer when the delay is reached from an illegal status
    let scheduled = fixture(Sport::Cricket, EventStatus::Scheduled);
    let err = plan_transition(
        &scheduled,
        &StatusAction::Delay {
            reason: String::new(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

/// Unit tests for event creation
#[test]
fn test_new_event_starts_scheduled_and_zeroed() {
    let draft = EventDraft {
        name: "Open Final".to_string(),
        sport: "tennis".to_string(),
        date: "2025-09-07".to_string(),
        team1: "Player A".to_string(),
        team2: "Player B".to_string(),
        ..EventDraft::default()
    };

    let event = prepare_event(&draft, "uid-1", Utc::now())
        .unwrap()
        .into_event(Uuid::new_v4());
    assert_eq!(event.sport, Sport::Tennis);
    assert_eq!(event.status, EventStatus::Scheduled);
    assert_eq!(event.created_by, "uid-1");
    for field in ScoreField::ALL {
        assert_eq!(event.field_value(field), 0.0);
    }
}

#[test]
fn test_missing_fields_notice() {
    let draft = EventDraft {
        name: "No teams".to_string(),
        sport: "Football".to_string(),
        date: "2025-09-07".to_string(),
        ..EventDraft::default()
    };
    let err = prepare_event(&draft, "uid-1", Utc::now()).unwrap_err();
    assert_eq!(err.notice(), "Please fill in: team1, team2");
}
