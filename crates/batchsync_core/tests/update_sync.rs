use std::sync::Once;
use std::time::Duration;

use batchsync_core::{
    update, ApiError, CacheKey, CachedValue, Effect, FetchTicket, Job, JobCounts, JobStatus, Msg,
    PollPolicy, Severity, SyncState,
};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(sync_logging::initialize_for_tests);
}

fn job(id: &str, status: JobStatus, completed: u32, failed: u32, total: u32) -> Job {
    Job {
        id: id.to_string(),
        status,
        total_count: total,
        target_languages: vec!["es".to_string()],
        completed_count: completed,
        failed_count: failed,
        pending_count: total - completed - failed,
        created_at: format!("2026-02-0{}T00:00:00Z", id.len()),
        updated_at: "2026-02-01T00:00:00Z".to_string(),
        items: Vec::new(),
    }
}

fn fetch_ticket(effects: &[Effect]) -> FetchTicket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Fetch(ticket) => Some(ticket.clone()),
            _ => None,
        })
        .expect("fetch effect")
}

fn resolve(state: SyncState, ticket: FetchTicket, value: CachedValue) -> (SyncState, Vec<Effect>) {
    update(
        state,
        Msg::FetchResolved {
            ticket,
            result: Ok(value),
            received_at: "2026-02-01T00:00:10Z".to_string(),
        },
    )
}

fn scheduled_delay(effects: &[Effect]) -> Option<Duration> {
    effects.iter().find_map(|effect| match effect {
        Effect::SchedulePoll { delay, .. } => Some(*delay),
        _ => None,
    })
}

fn cached_job(state: &SyncState, id: &str) -> Job {
    match state.cache().value(&CacheKey::Job(id.to_string())) {
        Some(CachedValue::Job(job)) => job.clone(),
        other => panic!("unexpected cache value {other:?}"),
    }
}

#[test]
fn three_item_batch_notifies_once_with_final_counts() {
    init_logging();
    let key = CacheKey::Job("b1".to_string());
    let policy = PollPolicy::default();

    let (state, effects) = update(SyncState::with_policy(policy), Msg::Subscribe(key.clone()));
    let ticket = fetch_ticket(&effects);
    let (state, effects) = resolve(state, ticket, CachedValue::Job(job("b1", JobStatus::Running, 0, 0, 3)));
    assert_eq!(scheduled_delay(&effects), Some(policy.job_interval));

    let (state, effects) = update(state, Msg::PollDue(key.clone()));
    let ticket = fetch_ticket(&effects);
    let (state, effects) = resolve(state, ticket, CachedValue::Job(job("b1", JobStatus::Running, 2, 0, 3)));
    assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));

    let (state, effects) = update(state, Msg::PollDue(key.clone()));
    let ticket = fetch_ticket(&effects);
    let (state, effects) = resolve(
        state,
        ticket,
        CachedValue::Job(job("b1", JobStatus::DoneWithErrors, 2, 1, 3)),
    );

    let notices: Vec<_> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::Notify(notice) => Some(notice.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].event.to, JobStatus::DoneWithErrors);
    assert_eq!(
        notices[0].event.counts,
        JobCounts {
            completed: 2,
            failed: 1,
            total: 3
        }
    );
    assert_eq!(notices[0].severity, Severity::Warning);
    assert!(effects.contains(&Effect::CancelPoll(key.clone())));
    assert_eq!(scheduled_delay(&effects), None);

    assert_eq!(state.notifications().len(), 1);
    let entry = state.notifications().entries().next().unwrap();
    assert_eq!(entry.href, "/batch?id=b1");
    assert!(!entry.is_read());
}

#[test]
fn newer_fetch_wins_over_late_stale_response() {
    init_logging();
    let key = CacheKey::Job("A".to_string());
    let (state, effects) = update(SyncState::new(), Msg::Subscribe(key.clone()));
    let older = fetch_ticket(&effects);
    let (state, effects) = update(state, Msg::Refresh(key.clone()));
    let newer = fetch_ticket(&effects);
    assert!(newer.generation > older.generation);

    let (state, _) = resolve(state, newer, CachedValue::Job(job("A", JobStatus::Running, 0, 0, 2)));
    let (state, effects) = resolve(state, older, CachedValue::Job(job("A", JobStatus::Queued, 0, 0, 2)));

    assert!(effects.is_empty());
    assert_eq!(cached_job(&state, "A").status, JobStatus::Running);
    assert!(!state.cache().entry(&key).unwrap().is_fetching());
}

#[test]
fn poll_tick_during_outstanding_fetch_is_skipped() {
    init_logging();
    let key = CacheKey::Job("c".to_string());
    let (state, _) = update(SyncState::new(), Msg::Subscribe(key.clone()));
    let (_state, effects) = update(state, Msg::PollDue(key));
    assert!(effects.is_empty());
}

#[test]
fn transport_failure_keeps_value_and_keeps_polling() {
    init_logging();
    let key = CacheKey::Job("d".to_string());
    let policy = PollPolicy::default();
    let (state, effects) = update(SyncState::with_policy(policy), Msg::Subscribe(key.clone()));
    let (state, _) = resolve(
        state,
        fetch_ticket(&effects),
        CachedValue::Job(job("d", JobStatus::Running, 1, 0, 4)),
    );

    let (state, effects) = update(state, Msg::PollDue(key.clone()));
    let (state, effects) = update(
        state,
        Msg::FetchResolved {
            ticket: fetch_ticket(&effects),
            result: Err(ApiError::Transport("timed out".to_string())),
            received_at: "2026-02-01T00:00:20Z".to_string(),
        },
    );

    assert_eq!(cached_job(&state, "d").completed_count, 1);
    assert_eq!(scheduled_delay(&effects), Some(policy.job_interval));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::ReportError {
            transient: true,
            polling_stopped: false,
            ..
        }
    )));
    let view = state.view();
    assert_eq!(view.jobs[0].error.as_deref(), Some("Something went wrong"));
}

#[test]
fn missing_job_stops_polling_and_reports() {
    init_logging();
    let key = CacheKey::Job("gone".to_string());
    let (state, effects) = update(SyncState::new(), Msg::Subscribe(key.clone()));
    let (_state, effects) = update(
        state,
        Msg::FetchResolved {
            ticket: fetch_ticket(&effects),
            result: Err(ApiError::NotFound("Batch not found".to_string())),
            received_at: "2026-02-01T00:00:20Z".to_string(),
        },
    );
    assert!(effects.contains(&Effect::CancelPoll(key)));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::ReportError {
            message,
            transient: false,
            polling_stopped: true,
            ..
        } if message == "Batch not found"
    )));
}

#[test]
fn response_after_unsubscribe_is_dropped() {
    init_logging();
    let key = CacheKey::Job("e".to_string());
    let (state, effects) = update(SyncState::new(), Msg::Subscribe(key.clone()));
    let ticket = fetch_ticket(&effects);
    let (state, effects) = update(state, Msg::Unsubscribe(key.clone()));
    assert_eq!(effects, vec![Effect::CancelPoll(key.clone())]);

    let (state, effects) = resolve(state, ticket, CachedValue::Job(job("e", JobStatus::Done, 1, 0, 1)));
    assert!(effects.is_empty());
    assert!(state.cache().entry(&key).is_none());
    assert_eq!(state.detector().last_seen("e"), None);
}

fn stamped(mut job: Job, updated_at: &str) -> Job {
    job.updated_at = updated_at.to_string();
    job
}

#[test]
fn late_list_response_does_not_announce_a_job_twice() {
    init_logging();
    let job_key = CacheKey::Job("j".to_string());
    let (state, effects) = update(SyncState::new(), Msg::Subscribe(CacheKey::JobList));
    let early_list = fetch_ticket(&effects);
    let (state, effects) = update(state, Msg::Subscribe(job_key.clone()));
    let first = fetch_ticket(&effects);

    let running = stamped(job("j", JobStatus::Running, 1, 0, 2), "2026-02-01T00:00:01Z");
    let done = stamped(job("j", JobStatus::Done, 2, 0, 2), "2026-02-01T00:00:04Z");

    let (state, _) = resolve(state, first, CachedValue::Job(running.clone()));
    let (state, effects) = update(state, Msg::PollDue(job_key.clone()));
    let (state, effects) = resolve(state, fetch_ticket(&effects), CachedValue::Job(done.clone()));
    assert_eq!(effects.iter().filter(|e| matches!(e, Effect::Notify(_))).count(), 1);

    // The list was requested before the job finished and answers last.
    let (state, effects) = resolve(state, early_list, CachedValue::List(vec![running]));
    assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));
    assert_eq!(state.detector().last_seen("j"), Some(JobStatus::Done));

    let (state, effects) = update(state, Msg::PollDue(CacheKey::JobList));
    let (state, effects) = resolve(state, fetch_ticket(&effects), CachedValue::List(vec![done]));
    assert!(!effects.iter().any(|e| matches!(e, Effect::Notify(_))));
    assert_eq!(state.notifications().len(), 1);
}

#[test]
fn list_polls_while_any_job_is_active() {
    init_logging();
    let policy = PollPolicy::default();
    let (state, effects) = update(SyncState::with_policy(policy), Msg::Subscribe(CacheKey::JobList));
    let (state, effects) = resolve(
        state,
        fetch_ticket(&effects),
        CachedValue::List(vec![
            job("x", JobStatus::Done, 2, 0, 2),
            job("yy", JobStatus::Running, 0, 0, 2),
        ]),
    );
    assert_eq!(scheduled_delay(&effects), Some(policy.list_interval));

    let (state, effects) = update(state, Msg::PollDue(CacheKey::JobList));
    let (state, effects) = resolve(
        state,
        fetch_ticket(&effects),
        CachedValue::List(vec![
            job("x", JobStatus::Done, 2, 0, 2),
            job("yy", JobStatus::Done, 2, 0, 2),
        ]),
    );
    assert_eq!(scheduled_delay(&effects), None);
    assert!(effects.contains(&Effect::CancelPoll(CacheKey::JobList)));
    // Only the job seen finishing live is announced.
    assert_eq!(state.notifications().len(), 1);

    let view = state.view();
    let list = view.list.expect("list view");
    let ids: Vec<_> = list.jobs.iter().map(|row| row.job_id.as_str()).collect();
    assert_eq!(ids, vec!["yy", "x"]);
}

#[test]
fn notification_messages_update_state() {
    init_logging();
    let key = CacheKey::Job("f".to_string());
    let (state, effects) = update(SyncState::new(), Msg::Subscribe(key.clone()));
    let (state, _) = resolve(state, fetch_ticket(&effects), CachedValue::Job(job("f", JobStatus::Running, 0, 0, 1)));
    let (state, effects) = update(state, Msg::Refresh(key));
    let (mut state, _) = resolve(state, fetch_ticket(&effects), CachedValue::Job(job("f", JobStatus::Done, 1, 0, 1)));
    assert!(state.consume_dirty());
    assert_eq!(state.view().unread, 1);

    let (state, effects) = update(state, Msg::MarkAllRead);
    assert_eq!(effects, vec![Effect::NotificationsChanged]);
    assert_eq!(state.view().unread, 0);

    let (state, _) = update(state, Msg::ClearNotifications);
    assert!(state.view().notifications.is_empty());
}
