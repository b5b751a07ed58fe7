//! Periodic background refresh of a [`ResourceCache`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::resources::cache::ResourceCache;
use crate::resources::resource::Resource;

/// Longest supported refresh interval (about 100 years).
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Handle to a scheduled refresh task.
///
/// Dropping the handle leaves the task running; call
/// [`RefreshSchedule::unschedule`] to stop it.
#[derive(Debug)]
pub struct RefreshSchedule {
    resource: &'static str,
    interval: Duration,
    next_run: Arc<Mutex<Option<DateTime<Utc>>>>,
    task: JoinHandle<()>,
}

impl RefreshSchedule {
    /// Returns the resource type being refreshed.
    #[must_use]
    pub const fn resource(&self) -> &'static str {
        self.resource
    }

    /// Returns the time between refreshes.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns when the next refresh is due, or `None` once unscheduled.
    #[must_use]
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        if self.task.is_finished() {
            return None;
        }
        *self.next_run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` while the task is running.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the task. A refresh already in flight is cancelled between
    /// requests; the persisted snapshot is never left half-written.
    pub fn unschedule(self) {
        tracing::debug!(resource = self.resource, "Unscheduling ConvertKit resource refresh");
        self.task.abort();
        *self.next_run.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn after(interval: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(interval)
        .ok()
        .and_then(|step| Utc::now().checked_add_signed(step))
}

impl<R: Resource> ResourceCache<R> {
    /// Spawns a task calling [`ResourceCache::refresh`] every `interval`,
    /// starting one interval from now.
    ///
    /// Refresh errors are logged and the schedule keeps running. The
    /// interval is clamped to between one millisecond and
    /// [`MAX_REFRESH_INTERVAL`]. Must be called from within a tokio runtime.
    #[must_use = "dropping the schedule detaches the task; keep it to unschedule"]
    pub fn schedule_refresh(self: &Arc<Self>, interval: Duration) -> RefreshSchedule {
        let interval = interval.clamp(Duration::from_millis(1), MAX_REFRESH_INTERVAL);
        let next_run = Arc::new(Mutex::new(after(interval)));
        let cache = Arc::clone(self);
        let task_next_run = Arc::clone(&next_run);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                *task_next_run.lock().unwrap_or_else(PoisonError::into_inner) = after(interval);
                if let Err(error) = cache.refresh().await {
                    tracing::warn!(
                        resource = R::TYPE,
                        code = error.code(),
                        "Scheduled ConvertKit resource refresh failed: {error}"
                    );
                }
            }
        });

        tracing::debug!(
            resource = R::TYPE,
            interval_secs = interval.as_secs(),
            "Scheduled ConvertKit resource refresh"
        );

        RefreshSchedule {
            resource: R::TYPE,
            interval,
            next_run,
            task,
        }
    }
}
