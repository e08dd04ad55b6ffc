//! End-to-end tests of the orchestrator over a SQLite store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use studyroom_core::{
    Config, CoreError, Database, DerivedIds, Event, FixedClock, NextSession, Orchestrator,
    RecallQuality, RecurrenceKind, RecurrenceRule, SchedulingError, SessionState, SessionType,
    SilentNotifier, Store, TaskStatus,
};

type TestOrchestrator = Orchestrator<Database, FixedClock<Utc>, SilentNotifier>;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

fn orchestrator(config: Config) -> TestOrchestrator {
    Orchestrator::new(
        Database::open_in_memory().unwrap(),
        FixedClock::new(start()),
        SilentNotifier,
        config,
    )
    .with_ids(DerivedIds)
}

#[test]
fn card_review_flow() {
    let mut orch = orchestrator(Config::default());
    let card = orch.add_card("annyeonghaseyo").unwrap();
    assert_eq!(orch.due_cards().unwrap().len(), 1);

    let reviewed = orch.review_card(&card.id, RecallQuality::Good).unwrap();
    assert_eq!(reviewed.interval_days, 1);
    assert!(orch.due_cards().unwrap().is_empty());

    orch.clock_mut().set(start() + Duration::days(1));
    let due = orch.due_cards().unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, card.id);

    let summary = orch.deck_summary(7).unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.review, 1);

    let history = orch.history(10).unwrap();
    assert!(matches!(&history[0], Event::CardReviewed { quality: RecallQuality::Good, .. }));
}

#[test]
fn inconsistent_review_policy_is_rejected_before_engine_runs() {
    let mut config = Config::default();
    config.review.minimum_ease = 5.0;
    let orch = orchestrator(config);
    let err = orch.add_card("x").unwrap_err();
    assert!(matches!(
        err,
        CoreError::Scheduling(SchedulingError::InvalidPolicy { .. })
    ));
}

#[test]
fn completing_recurring_task_creates_successor() {
    let orch = orchestrator(Config::default());
    let task = orch
        .add_task(
            "Stretch",
            Some(start()),
            Some(RecurrenceRule::new(RecurrenceKind::Daily, 1)),
            vec!["neck".into(), "back".into()],
        )
        .unwrap();

    let outcome = orch.complete_task(&task.id).unwrap();
    assert_eq!(outcome.completed.status, TaskStatus::Completed);
    let successor = outcome.successor.expect("daily task recurs");
    assert_eq!(successor.due_at, Some(start() + Duration::days(1)));

    let tasks = orch.list_tasks().unwrap();
    assert_eq!(tasks.len(), 2);

    // Completing again does nothing new.
    let again = orch.complete_task(&task.id).unwrap();
    assert!(again.successor.is_none());
    assert_eq!(orch.list_tasks().unwrap().len(), 2);
}

#[test]
fn ended_recurrence_completes_without_successor() {
    let orch = orchestrator(Config::default());
    let rule = RecurrenceRule::new(RecurrenceKind::Weekly, 2).until(start() + Duration::days(9));
    let task = orch.add_task("Sprint demo", Some(start()), Some(rule), vec![]).unwrap();

    let outcome = orch.complete_task(&task.id).unwrap();
    assert!(outcome.successor.is_none());
    assert_eq!(orch.list_tasks().unwrap().len(), 1);
    let history = orch.history(5).unwrap();
    assert!(matches!(&history[0], Event::RecurrenceEnded { .. }));
}

#[test]
fn non_recurring_task_completes_plainly() {
    let orch = orchestrator(Config::default());
    let task = orch.add_task("Buy milk", None, None, vec![]).unwrap();
    let outcome = orch.complete_task(&task.id).unwrap();
    assert!(outcome.successor.is_none());
    assert!(matches!(
        orch.upcoming(&task.id, 3),
        Err(CoreError::Scheduling(SchedulingError::NoRecurrenceConfigured { .. }))
    ));
}

#[test]
fn recurring_task_without_due_date_is_refused() {
    let orch = orchestrator(Config::default());
    let err = orch
        .add_task("Floss", None, Some(RecurrenceRule::new(RecurrenceKind::Daily, 1)), vec![])
        .unwrap_err();
    assert!(matches!(err, CoreError::Scheduling(SchedulingError::InvalidPolicy { .. })));
}

#[test]
fn pomodoro_cycle_with_manual_focus_start() {
    let mut config = Config::default();
    config.auto_start.breaks = true;
    config.auto_start.focus = false;
    let mut orch = orchestrator(config);

    let focus = orch.start_session(SessionType::Focus).unwrap();
    orch.pause().unwrap();
    orch.resume().unwrap();
    let done = orch.tick(focus.duration_secs).unwrap();
    assert_eq!(done.state, SessionState::Completed);

    let next = orch.advance().unwrap();
    let brk = match next {
        NextSession::Started(s) => s,
        other => panic!("breaks auto-start, got {other:?}"),
    };
    assert_eq!(brk.session_type, SessionType::ShortBreak);
    assert_eq!(orch.current_session().unwrap().unwrap().id, brk.id);

    // Let the break run out on the wall clock.
    orch.clock_mut().set(start() + Duration::minutes(10));
    let synced = orch.sync().unwrap().unwrap();
    assert_eq!(synced.state, SessionState::Completed);

    let next = orch.advance().unwrap();
    assert!(matches!(next, NextSession::Pending(_)));
    assert_eq!(
        orch.current_session().unwrap().unwrap().state,
        SessionState::Completed
    );

    let focus2 = orch.start_pending().unwrap();
    assert_eq!(focus2.session_type, SessionType::Focus);
    assert_eq!(focus2.completed_focus_count, 1);
    assert!(orch.pending_session().unwrap().is_none());

    let canceled = orch.cancel().unwrap();
    assert_eq!(canceled.state, SessionState::Canceled);

    let kinds: Vec<&str> = orch.history(10).unwrap().iter().map(Event::kind).collect();
    assert_eq!(
        kinds,
        vec!["session_canceled", "session_completed", "session_completed"]
    );
    assert_eq!(orch.store().list_sessions(10).unwrap().len(), 3);
}

#[test]
fn advance_before_completion_is_invalid() {
    let orch = orchestrator(Config::default());
    orch.start_session(SessionType::Focus).unwrap();
    assert!(matches!(
        orch.advance(),
        Err(CoreError::Scheduling(SchedulingError::InvalidTransition { .. }))
    ));
}

#[test]
fn starting_sessions_directly_counts_completed_focus() {
    let orch = orchestrator(Config::default());
    let mut counts = Vec::new();
    for _ in 0..4 {
        let focus = orch.start_session(SessionType::Focus).unwrap();
        counts.push(focus.completed_focus_count);
        orch.tick(focus.duration_secs).unwrap();
    }
    assert_eq!(counts, vec![0, 1, 2, 3]);

    let long_break = orch.start_session(SessionType::LongBreak).unwrap();
    assert_eq!(long_break.completed_focus_count, 4);
    orch.tick(long_break.duration_secs).unwrap();

    let focus = orch.start_session(SessionType::Focus).unwrap();
    assert_eq!(focus.completed_focus_count, 0);
}

#[test]
fn canceled_focus_does_not_count() {
    let orch = orchestrator(Config::default());
    let focus = orch.start_session(SessionType::Focus).unwrap();
    orch.tick(focus.duration_secs).unwrap();
    let second = orch.start_session(SessionType::Focus).unwrap();
    assert_eq!(second.completed_focus_count, 1);
    orch.cancel().unwrap();

    let third = orch.start_session(SessionType::Focus).unwrap();
    assert_eq!(third.completed_focus_count, 1);
}

#[test]
fn state_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studyroom.db");
    let card_id = {
        let orch = Orchestrator::new(
            Database::open_at(&path).unwrap(),
            FixedClock::new(start()),
            SilentNotifier,
            Config::default(),
        );
        let card = orch.add_card("persist me").unwrap();
        orch.start_session(SessionType::Focus).unwrap();
        orch.tick(60).unwrap();
        card.id
    };

    let orch = Orchestrator::new(
        Database::open_at(&path).unwrap(),
        FixedClock::new(start()),
        SilentNotifier,
        Config::default(),
    );
    assert_eq!(orch.list_cards().unwrap()[0].id, card_id);
    let session = orch.current_session().unwrap().unwrap();
    assert_eq!(session.elapsed_secs, 60);
    assert_eq!(session.state, SessionState::Running);
}
