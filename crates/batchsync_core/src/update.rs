use sync_logging::{sync_debug, sync_info, sync_warn};

use crate::cache::Completion;
use crate::effect::Notice;
use crate::{
    friendly_message, CacheKey, CachedValue, Effect, Msg, NewNotification, SyncState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SyncState, msg: Msg) -> (SyncState, Vec<Effect>) {
    let effects = match msg {
        Msg::Subscribe(key) => {
            if state.cache.subscribe(key.clone()) {
                issue_fetch(&mut state, &key, false)
            } else {
                Vec::new()
            }
        }
        Msg::Unsubscribe(key) => {
            if state.cache.unsubscribe(&key) {
                sync_debug!("Evicted {} after last subscriber left", key);
                state.mark_dirty();
                vec![Effect::CancelPoll(key)]
            } else {
                Vec::new()
            }
        }
        Msg::PollDue(key) => {
            if !state.cache.is_subscribed(&key) {
                return (state, Vec::new());
            }
            let effects = issue_fetch(&mut state, &key, false);
            if effects.is_empty() {
                sync_debug!("Skipped poll for {}: previous fetch still outstanding", key);
            }
            effects
        }
        Msg::Refresh(key) => issue_fetch(&mut state, &key, true),
        Msg::FetchResolved {
            ticket,
            result,
            received_at,
        } => {
            let key = ticket.key.clone();
            match state.cache.complete(&ticket, result, &received_at) {
                Completion::Applied => apply_fresh_value(&mut state, &key, &received_at),
                Completion::Failed(err) => {
                    state.mark_dirty();
                    let value = state.cache.value(&key);
                    let delay = state.policy.delay_after_failure(&key, value, &err);
                    let transient = err.is_transient();
                    if transient {
                        sync_warn!("Fetch for {} failed, keeping last value: {}", key, err);
                    } else {
                        sync_warn!("Fetch for {} failed: {}", key, err);
                    }
                    let mut effects = vec![
                        Effect::CacheUpdated(key.clone()),
                        Effect::ReportError {
                            key: key.clone(),
                            message: friendly_message(&err, None),
                            transient,
                            polling_stopped: delay.is_none(),
                        },
                    ];
                    effects.push(schedule_or_stop(key, delay));
                    effects
                }
                Completion::Stale => {
                    sync_debug!(
                        "Discarded stale response for {} (generation {})",
                        key,
                        ticket.generation
                    );
                    Vec::new()
                }
                Completion::Unsubscribed => {
                    sync_debug!("Discarded response for unsubscribed {}", key);
                    Vec::new()
                }
            }
        }
        Msg::MarkRead(id) => {
            state.notifications.mark_read(id);
            state.mark_dirty();
            vec![Effect::NotificationsChanged]
        }
        Msg::MarkAllRead => {
            state.notifications.mark_all_read();
            state.mark_dirty();
            vec![Effect::NotificationsChanged]
        }
        Msg::ClearNotifications => {
            state.notifications.clear();
            state.mark_dirty();
            vec![Effect::NotificationsChanged]
        }
    };

    (state, effects)
}

fn issue_fetch(state: &mut SyncState, key: &CacheKey, force: bool) -> Vec<Effect> {
    match state.cache.begin_fetch(key, force) {
        Some(ticket) => {
            sync_debug!("Fetch issued for {} (generation {})", key, ticket.generation);
            state.mark_dirty();
            vec![Effect::Fetch(ticket)]
        }
        None => Vec::new(),
    }
}

fn apply_fresh_value(state: &mut SyncState, key: &CacheKey, received_at: &str) -> Vec<Effect> {
    state.mark_dirty();
    let mut effects = vec![Effect::CacheUpdated(key.clone())];

    let Some(value) = state.cache.value(key) else {
        return effects;
    };
    let delay = state.policy.next_delay(key, Some(value));
    let jobs = value.jobs().to_vec();
    if let CachedValue::List(_) = value {
        sync_debug!("List refreshed with {} jobs", jobs.len());
    }

    let mut notified = false;
    for job in &jobs {
        if !job.is_consistent() {
            sync_warn!(
                "Job {} reports {} with {}/{} settled",
                job.id,
                job.status,
                job.counts().settled(),
                job.total_count
            );
        }
        let Some(event) = state.detector.observe(job) else {
            continue;
        };
        sync_info!(
            "Job {} moved {:?} -> {:?} ({}/{} completed, {} failed)",
            event.job_id,
            event.from,
            event.to,
            event.counts.completed,
            event.counts.total,
            event.counts.failed
        );
        let notification = NewNotification::for_transition(&event, received_at);
        let message = notification.message.clone();
        let severity = notification.severity;
        let notification_id = state.notifications.push(notification);
        effects.push(Effect::Notify(Notice {
            notification_id,
            event,
            message,
            severity,
        }));
        notified = true;
    }
    if notified {
        effects.push(Effect::NotificationsChanged);
    }

    effects.push(schedule_or_stop(key.clone(), delay));
    effects
}

fn schedule_or_stop(key: CacheKey, delay: Option<std::time::Duration>) -> Effect {
    match delay {
        Some(delay) => Effect::SchedulePoll { key, delay },
        None => {
            sync_debug!("Polling stopped for {}", key);
            Effect::CancelPoll(key)
        }
    }
}
