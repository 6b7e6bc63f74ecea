//! Background task that fires payroll generation once a day at a wall-clock trigger point.
//!
//! Every tick the scheduler reads the current instant from a [`Clock`], converts it to the
//! configured zone and fires the [`ScheduledJob`] once the local time of day is at or past
//! the trigger and the job has not fired yet on that local day. A tick longer than a minute,
//! or a trigger skipped by a DST gap, still fires on the first tick after the trigger. The
//! last fired day is kept in memory and persisted through the job, so a restart later the
//! same day does not fire twice.

use std::{fmt, future::Future, str::FromStr, time::Duration};

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tokio::{task::JoinHandle, time::{interval, MissedTickBehavior}};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{consts::{DEFAULT_TICK_SECS, DEFAULT_TIMEZONE, DEFAULT_TRIGGER}, payroll::PayrollError};

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Work fired by the [`Scheduler`], together with its persisted "last fired" marker.
pub trait ScheduledJob: Send + Sync + 'static {
    type Output: Send;
    type Error: fmt::Display + Send;

    fn last_fired(&self) -> impl Future<Output = Result<Option<NaiveDate>, Self::Error>> + Send;

    fn mark_fired(&self, day: NaiveDate) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn run(&self, day: NaiveDate) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Local hour and minute at which the job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPoint {
    hour: u32,
    minute: u32,
}

impl Default for TriggerPoint {
    fn default() -> Self {
        let (hour, minute) = DEFAULT_TRIGGER;
        Self { hour, minute }
    }
}

impl TriggerPoint {
    pub fn new(hour: u32, minute: u32) -> Result<Self, PayrollError> {
        if hour > 23 || minute > 59 {
            return Err(PayrollError::invalid(format!("trigger {hour:02}:{minute:02} is not a time of day")));
        }

        Ok(Self { hour, minute })
    }

    /// Whether `time` is at or past the trigger on its own day.
    pub fn reached(&self, time: &impl Timelike) -> bool {
        (time.hour(), time.minute()) >= (self.hour, self.minute)
    }
}

impl FromStr for TriggerPoint {
    type Err = PayrollError;

    /// Parses `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PayrollError::invalid(format!("trigger `{s}` is not in HH:MM form"));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(malformed)?;
        let hour = hour.parse().map_err(|_| malformed())?;
        let minute = minute.parse().map_err(|_| malformed())?;

        Self::new(hour, minute)
    }
}

impl fmt::Display for TriggerPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub trigger: TriggerPoint,
    pub timezone: Tz,
    pub tick: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerPoint::default(),
            timezone: DEFAULT_TIMEZONE.parse().unwrap_or(chrono_tz::America::Bogota),
            tick: Duration::from_secs(DEFAULT_TICK_SECS),
        }
    }
}

pub struct Scheduler<J, C> {
    config: SchedulerConfig,
    job: J,
    clock: C,
    last_fired: Option<NaiveDate>,
}

impl<J: ScheduledJob, C: Clock> Scheduler<J, C> {
    pub fn new(config: SchedulerConfig, job: J, clock: C) -> Self {
        Self { config, job, clock, last_fired: None }
    }

    /// Decides whether the job is due at the clock's current instant and fires it if so.
    ///
    /// Returns `None` when nothing fired, otherwise the job's outcome.
    pub async fn tick(&mut self) -> Option<Result<J::Output, J::Error>> {
        let now = self.clock.now().with_timezone(&self.config.timezone);
        if !self.config.trigger.reached(&now) {
            return None;
        }

        let today = now.date_naive();
        if self.last_fired == Some(today) {
            return None;
        }

        match self.job.last_fired().await {
            Ok(Some(day)) if day == today => {
                debug!(%today, "payroll generation already fired today");
                self.last_fired = Some(today);
                return None;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "unable to read the last fired marker"),
        }

        // Recorded before running so a crash mid-run does not fire again today
        self.last_fired = Some(today);
        if let Err(e) = self.job.mark_fired(today).await {
            warn!(error = %e, %today, "unable to persist the last fired marker");
        }

        info!(%today, trigger = %self.config.trigger, timezone = %self.config.timezone, "payroll generation triggered");

        let outcome = self.job.run(today).await;
        match &outcome {
            Ok(_) => info!(%today, "scheduled payroll generation finished"),
            Err(e) => error!(error = %e, %today, "scheduled payroll generation failed"),
        }

        Some(outcome)
    }

    /// Ticks until `cancel` fires. A tick in progress always completes first.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            trigger = %self.config.trigger,
            timezone = %self.config.timezone,
            tick_secs = self.config.tick.as_secs_f64(),
            "payroll scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("payroll scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }
}

pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Cancels the loop and waits for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();

        if let Err(e) = self.task.await {
            error!(error = %e, "payroll scheduler task did not exit cleanly");
        }
    }
}

pub fn start_scheduler<J: ScheduledJob, C: Clock>(config: SchedulerConfig, job: J, clock: C) -> SchedulerHandle {
    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(config, job, clock);

    let task = tokio::spawn(scheduler.run(cancel.clone()));

    SchedulerHandle { cancel, task }
}
