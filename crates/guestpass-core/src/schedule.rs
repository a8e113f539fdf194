// ── Scheduled rotation ──
//
// The rotation worker: sleeps until the next trigger, runs one attempt,
// repeats. The next trigger is computed only after the previous attempt
// returned, so attempts never overlap. A stop request interrupts the
// sleep, never an attempt in progress.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Days, Local, TimeDelta, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::pipeline::RotationPipeline;
use crate::service::ServiceUnit;

/// Bounds applied to [`Schedule::Every`] periods.
const MIN_PERIOD: Duration = Duration::from_secs(1);
const MAX_PERIOD: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// When rotations fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Once a day at `hour:minute` wall-clock time.
    Daily { hour: u32, minute: u32 },
    /// At a fixed period, starting one period from now. The period is
    /// clamped to between one second and 366 days.
    Every(Duration),
}

impl Schedule {
    /// The first trigger strictly after `now`.
    ///
    /// If the trigger cannot be represented, the latest representable
    /// instant is returned, which in practice never fires.
    pub fn next_run<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match *self {
            Self::Every(period) => {
                let step = TimeDelta::from_std(period.clamp(MIN_PERIOD, MAX_PERIOD))
                    .unwrap_or(TimeDelta::days(366));
                now.clone()
                    .checked_add_signed(step)
                    .unwrap_or_else(|| far_future(now))
            }
            Self::Daily { hour, minute } => {
                let today = now.date_naive();
                // A DST gap can swallow today's slot; tomorrow's is then used.
                for offset in 0..=2 {
                    let Some(date) = today.checked_add_days(Days::new(offset)) else {
                        break;
                    };
                    let Some(naive) = date.and_hms_opt(hour, minute, 0) else {
                        break;
                    };
                    if let Some(candidate) = now.timezone().from_local_datetime(&naive).earliest() {
                        if candidate > *now {
                            return candidate;
                        }
                    }
                }
                now.clone()
                    .checked_add_signed(TimeDelta::days(1))
                    .unwrap_or_else(|| far_future(now))
            }
        }
    }

    /// Time to sleep from `now` until the next trigger, never less than a second.
    pub fn delay_from<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        delay_until(&self.next_run(now), now)
    }
}

fn delay_until<Tz: TimeZone>(next: &DateTime<Tz>, now: &DateTime<Tz>) -> Duration {
    next.clone()
        .signed_duration_since(now.clone())
        .to_std()
        .map_or(MIN_PERIOD, |d| d.max(MIN_PERIOD))
}

fn far_future<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    DateTime::<Utc>::MAX_UTC.with_timezone(&now.timezone())
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily { hour, minute } => write!(f, "daily at {hour:02}:{minute:02}"),
            Self::Every(period) => write!(f, "every {}s", period.as_secs()),
        }
    }
}

/// Service unit running the rotation pipeline on a [`Schedule`].
#[derive(Debug)]
pub struct RotationScheduler {
    pipeline: RotationPipeline,
    schedule: Schedule,
    rotate_on_start: bool,
}

impl RotationScheduler {
    pub fn new(pipeline: RotationPipeline, schedule: Schedule) -> Self {
        Self {
            pipeline,
            schedule,
            rotate_on_start: false,
        }
    }

    /// Also run one attempt immediately when the unit starts.
    pub fn rotate_on_start(mut self, enabled: bool) -> Self {
        self.rotate_on_start = enabled;
        self
    }
}

impl ServiceUnit for RotationScheduler {
    fn name(&self) -> &'static str {
        "rotation"
    }

    async fn run(self, stop: CancellationToken) {
        info!(schedule = %self.schedule, "rotation scheduler started");

        if self.rotate_on_start && !stop.is_cancelled() {
            self.pipeline.run_once().await;
        }

        loop {
            let now = Local::now();
            let next = self.schedule.next_run(&now);
            let delay = delay_until(&next, &now);
            info!(next_run = %next.format("%Y-%m-%d %H:%M:%S %Z"), "next rotation scheduled");

            tokio::select! {
                biased;
                () = stop.cancelled() => break,
                () = tokio::time::sleep(delay) => {
                    self.pipeline.run_once().await;
                }
            }
        }

        info!("rotation scheduler stopped");
    }
}
