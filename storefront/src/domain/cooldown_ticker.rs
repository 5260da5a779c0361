//! Owned one-second tick source for the resend cooldown.
//!
//! The ticker spawns a single interval task feeding a bounded channel. The
//! task is aborted on [`CooldownTicker::stop`] and when the ticker is dropped,
//! so no tick outlives the session that owns it.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Default spacing between cooldown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Explicit tick source owned by a verification controller.
#[derive(Debug)]
pub struct CooldownTicker {
    period: Duration,
    task: Option<JoinHandle<()>>,
    ticks: Option<mpsc::Receiver<()>>,
}

impl Default for CooldownTicker {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

impl CooldownTicker {
    /// Creates an idle ticker emitting one tick per `period` once started.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            task: None,
            ticks: None,
        }
    }

    /// Starts the tick task unless one is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn ensure_running(&mut self) {
        if self.is_running() {
            return;
        }
        self.stop();

        let (tx, rx) = mpsc::channel(1);
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        debug!(?period, "cooldown ticker started");
        self.task = Some(task);
        self.ticks = Some(rx);
    }

    /// Whether a tick task is live.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits for the next tick. Returns `None` when the ticker is idle.
    pub async fn next_tick(&mut self) -> Option<()> {
        match self.ticks.as_mut() {
            Some(ticks) => ticks.recv().await,
            None => None,
        }
    }

    /// Aborts the tick task and discards pending ticks.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("cooldown ticker stopped");
        }
        self.ticks = None;
    }
}

impl Drop for CooldownTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn idle_ticker_yields_nothing() {
        let mut ticker = CooldownTicker::default();
        assert!(!ticker.is_running());
        assert_eq!(ticker.next_tick().await, None);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let mut ticker = CooldownTicker::default();
        let started = Instant::now();
        ticker.ensure_running();

        for _ in 0..3 {
            assert_eq!(ticker.next_tick().await, Some(()));
        }
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn ensure_running_never_double_schedules() {
        let mut ticker = CooldownTicker::default();
        let started = Instant::now();
        ticker.ensure_running();
        ticker.ensure_running();
        ticker.ensure_running();

        for _ in 0..4 {
            ticker.next_tick().await;
        }
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_ticks() {
        let mut ticker = CooldownTicker::default();
        ticker.ensure_running();
        ticker.next_tick().await;

        ticker.stop();
        assert!(!ticker.is_running());
        assert_eq!(ticker.next_tick().await, None);

        ticker.ensure_running();
        assert!(ticker.is_running());
        assert_eq!(ticker.next_tick().await, Some(()));
    }
}
