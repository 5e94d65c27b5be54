//! Wall-clock update scheduling and graceful shutdown.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_SHUTDOWN_GRACE;
use crate::pipeline::{CycleOutcome, UpdatePipeline};

/// Returns the first configured wall-clock time strictly after `now`.
///
/// Times are interpreted in the time zone of `now`. A time falling in a
/// daylight-saving gap is skipped for that day; an ambiguous time resolves
/// to its earliest occurrence.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, times: &[NaiveTime]) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..=2)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .flat_map(|date| times.iter().map(move |time| date.and_time(*time)))
        .filter_map(|local| tz.from_local_datetime(&local).earliest())
        .filter(|candidate| candidate > now)
        .min()
}

/// Runs update cycles at fixed local times.
pub struct UpdateScheduler {
    pipeline: Arc<UpdatePipeline>,
    times: Vec<NaiveTime>,
    run_at_startup: bool,
    shutdown_grace: Duration,
}

impl UpdateScheduler {
    /// Creates a scheduler running `pipeline` at each of `times`, local time.
    pub fn new(pipeline: Arc<UpdatePipeline>, times: Vec<NaiveTime>) -> Self {
        Self {
            pipeline,
            times,
            run_at_startup: true,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Whether a cycle runs as soon as the scheduler starts. Defaults to true.
    pub fn with_startup_run(mut self, enabled: bool) -> Self {
        self.run_at_startup = enabled;
        self
    }

    /// How long [`SchedulerHandle::shutdown`] waits for running cycles.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Spawns the scheduling loop on the current tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_loop(
            self.pipeline.clone(),
            self.times,
            self.run_at_startup,
            cancel.clone(),
        ));

        SchedulerHandle {
            pipeline: self.pipeline,
            cancel,
            task,
            on_demand: Mutex::new(Vec::new()),
            grace: self.shutdown_grace,
        }
    }
}

/// Control handle of a running [`UpdateScheduler`].
pub struct SchedulerHandle {
    pipeline: Arc<UpdatePipeline>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    on_demand: Mutex<Vec<JoinHandle<()>>>,
    grace: Duration,
}

impl SchedulerHandle {
    /// Starts an on-demand cycle in the background.
    ///
    /// Returns false if the scheduler is shutting down or a cycle is already
    /// running. Triggers are never queued.
    pub fn trigger_now(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if self.pipeline.container().is_updating() {
            tracing::debug!(trigger = "on-demand", "update already in progress, trigger ignored");
            return false;
        }

        let pipeline = self.pipeline.clone();
        let handle = tokio::spawn(async move { run_logged(&pipeline, "on-demand").await });

        let mut tasks = self.on_demand.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
        true
    }

    /// A token that is cancelled when shutdown begins.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops scheduling new cycles and waits for running ones.
    ///
    /// Waits at most the grace period, then aborts whatever is still
    /// running. Returns true if everything finished in time.
    pub async fn shutdown(self) -> bool {
        self.cancel.cancel();

        let mut tasks = self
            .on_demand
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        tasks.push(self.task);
        let aborts: Vec<_> = tasks.iter().map(JoinHandle::abort_handle).collect();

        match tokio::time::timeout(self.grace, join_all(tasks)).await {
            Ok(_) => {
                tracing::info!("scheduler stopped");
                true
            }
            Err(_) => {
                tracing::warn!(
                    grace_secs = self.grace.as_secs(),
                    "update cycle still running after grace period, aborting"
                );
                for abort in aborts {
                    abort.abort();
                }
                false
            }
        }
    }
}

async fn run_loop(
    pipeline: Arc<UpdatePipeline>,
    times: Vec<NaiveTime>,
    run_at_startup: bool,
    cancel: CancellationToken,
) {
    if run_at_startup {
        run_logged(&pipeline, "startup").await;
    }

    loop {
        let now = Local::now();
        let Some(next) = next_run_after(&now, &times) else {
            tracing::warn!("no update time configured, scheduled updates disabled");
            cancel.cancelled().await;
            break;
        };
        let wait = next.signed_duration_since(now).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(next_run = %next, "next update scheduled");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        run_logged(&pipeline, "scheduled").await;
    }
}

/// Runs one cycle and reports its outcome. Failures never propagate.
async fn run_logged(pipeline: &UpdatePipeline, trigger: &'static str) {
    match pipeline.run_cycle().await {
        Ok(CycleOutcome::Published(summary)) => {
            tracing::debug!(trigger, generation = summary.generation, "update cycle finished");
        }
        Ok(CycleOutcome::AlreadyRunning) => {
            tracing::debug!(trigger, "update already in progress, trigger ignored");
        }
        Err(e) => {
            tracing::error!(trigger, error = %e, "update cycle failed, keeping previous snapshot");
        }
    }
}
