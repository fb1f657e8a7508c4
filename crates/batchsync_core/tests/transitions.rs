use batchsync_core::{Job, JobStatus, TransitionDetector};

fn job(id: &str, status: JobStatus, completed: u32, failed: u32, total: u32) -> Job {
    Job {
        id: id.to_string(),
        status,
        total_count: total,
        target_languages: vec!["de".to_string()],
        completed_count: completed,
        failed_count: failed,
        pending_count: total - completed - failed,
        created_at: "2026-01-01T00:00:00Z".to_string(),
        updated_at: "2026-01-01T00:00:00Z".to_string(),
        items: Vec::new(),
    }
}

#[test]
fn first_observation_never_emits_even_when_terminal() {
    let mut detector = TransitionDetector::new();
    assert!(detector.observe(&job("a", JobStatus::Done, 3, 0, 3)).is_none());
    assert_eq!(detector.last_seen("a"), Some(JobStatus::Done));
    // Further terminal observations stay quiet too.
    assert!(detector.observe(&job("a", JobStatus::Done, 3, 0, 3)).is_none());
}

#[test]
fn live_edge_into_terminal_emits_exactly_once() {
    let mut detector = TransitionDetector::new();
    let sequence = [
        job("a", JobStatus::Queued, 0, 0, 3),
        job("a", JobStatus::Running, 1, 0, 3),
        job("a", JobStatus::Running, 2, 0, 3),
        job("a", JobStatus::DoneWithErrors, 2, 1, 3),
        job("a", JobStatus::DoneWithErrors, 2, 1, 3),
    ];
    let events: Vec<_> = sequence
        .iter()
        .filter_map(|snapshot| detector.observe(snapshot))
        .collect();

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.from, JobStatus::Running);
    assert_eq!(event.to, JobStatus::DoneWithErrors);
    assert_eq!(
        event.summary(),
        "Batch finished with errors: 2/3 images translated, 1 failed"
    );
}

fn at(mut job: Job, updated_at: &str) -> Job {
    job.updated_at = updated_at.to_string();
    job
}

#[test]
fn each_return_to_progress_allows_another_edge() {
    // A retried item can put a finished batch back into processing.
    let mut detector = TransitionDetector::new();
    let sequence = [
        (JobStatus::Running, "2026-01-01T00:00:01Z"),
        (JobStatus::DoneWithErrors, "2026-01-01T00:00:02Z"),
        (JobStatus::Running, "2026-01-01T00:00:03Z"),
        (JobStatus::Done, "2026-01-01T00:00:04Z"),
    ];
    let count = sequence
        .iter()
        .filter_map(|(status, stamp)| detector.observe(&at(job("a", *status, 0, 0, 1), stamp)))
        .count();
    assert_eq!(count, 2);
}

#[test]
fn older_snapshot_cannot_rearm_a_finished_job() {
    let mut detector = TransitionDetector::new();
    let running = at(job("a", JobStatus::Running, 1, 0, 2), "2026-01-01T00:00:05Z");
    let done = at(job("a", JobStatus::Done, 2, 0, 2), "2026-01-01T00:00:09Z");

    detector.observe(&running);
    assert!(detector.observe(&done).is_some());
    // A list taken before the job finished arrives late.
    assert!(detector.observe(&running).is_none());
    assert_eq!(detector.last_seen("a"), Some(JobStatus::Done));
    assert!(detector.observe(&done).is_none());
}

#[test]
fn finished_job_does_not_reopen_at_the_same_instant() {
    let mut detector = TransitionDetector::new();
    detector.observe(&job("a", JobStatus::Running, 0, 0, 1));
    assert!(detector.observe(&job("a", JobStatus::Done, 1, 0, 1)).is_some());
    assert!(detector.observe(&job("a", JobStatus::Running, 0, 0, 1)).is_none());
    assert!(detector.observe(&job("a", JobStatus::Done, 1, 0, 1)).is_none());
}

#[test]
fn jobs_are_tracked_independently() {
    let mut detector = TransitionDetector::new();
    detector.observe(&job("a", JobStatus::Running, 0, 0, 2));
    assert!(detector.observe(&job("b", JobStatus::Failed, 0, 2, 2)).is_none());
    let event = detector
        .observe(&job("a", JobStatus::Cancelled, 1, 0, 2))
        .expect("edge for a");
    assert_eq!(event.job_id, "a");
    assert_eq!(event.summary(), "Batch cancelled: 1/2 images translated");
}
