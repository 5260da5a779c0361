//! Resend cooldown as a pure value.
//!
//! The countdown itself never reads a clock. Time advances only when the
//! owner feeds it a tick, which keeps the value deterministic under test and
//! lets [`super::CooldownTicker`] decide where ticks come from.

use serde::{Deserialize, Serialize};

/// Seconds a user waits before a code may be resent.
pub const DEFAULT_COOLDOWN_SECONDS: u32 = 60;

/// Countdown gating the resend action.
///
/// # Examples
/// ```
/// use storefront::domain::Cooldown;
///
/// let cooldown = Cooldown::new(2).start();
/// assert!(!cooldown.can_resend());
/// let cooldown = cooldown.tick().tick();
/// assert!(cooldown.can_resend());
/// assert!(!cooldown.is_running());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cooldown {
    duration: u32,
    remaining: u32,
    running: bool,
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECONDS)
    }
}

impl Cooldown {
    /// Idle cooldown that restarts at `duration` seconds.
    pub const fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: 0,
            running: false,
        }
    }

    /// Starts counting down from the full duration.
    #[must_use]
    pub const fn start(self) -> Self {
        Self {
            remaining: self.duration,
            running: self.duration > 0,
            ..self
        }
    }

    /// Resets to the full duration; equivalent to [`Cooldown::start`].
    #[must_use]
    pub const fn restart(self) -> Self {
        self.start()
    }

    /// Advances one second. Ticks on an idle countdown are ignored.
    #[must_use]
    pub const fn tick(self) -> Self {
        if !self.running {
            return self;
        }
        let remaining = self.remaining.saturating_sub(1);
        Self {
            remaining,
            running: remaining > 0,
            ..self
        }
    }

    /// Halts the countdown where it stands.
    #[must_use]
    pub const fn stop(self) -> Self {
        Self {
            running: false,
            ..self
        }
    }

    /// Seconds left before resend is allowed.
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Full countdown length.
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    /// Whether ticks are still expected.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the resend action is enabled.
    pub const fn can_resend(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn tick_n(mut cooldown: Cooldown, n: u32) -> Cooldown {
        for _ in 0..n {
            cooldown = cooldown.tick();
        }
        cooldown
    }

    #[rstest]
    fn starts_at_sixty_by_default() {
        let cooldown = Cooldown::default().start();
        assert_eq!(cooldown.remaining(), 60);
        assert!(cooldown.is_running());
        assert!(!cooldown.can_resend());
    }

    #[rstest]
    #[case(0, 60)]
    #[case(1, 59)]
    #[case(59, 1)]
    #[case(60, 0)]
    #[case(90, 0)]
    fn ticks_count_down_and_never_go_negative(#[case] ticks: u32, #[case] expected: u32) {
        let cooldown = tick_n(Cooldown::default().start(), ticks);
        assert_eq!(cooldown.remaining(), expected);
        assert_eq!(cooldown.can_resend(), expected == 0);
        assert_eq!(cooldown.is_running(), expected > 0);
    }

    #[rstest]
    fn restart_resets_mid_countdown() {
        let cooldown = tick_n(Cooldown::default().start(), 25).restart();
        assert_eq!(cooldown.remaining(), 60);
        assert!(cooldown.is_running());
    }

    #[rstest]
    fn idle_and_stopped_countdowns_ignore_ticks() {
        let idle = Cooldown::default();
        assert_eq!(idle.tick(), idle);

        let stopped = tick_n(Cooldown::default().start(), 10).stop();
        assert_eq!(stopped.tick().remaining(), 50);
    }

    #[rstest]
    fn zero_duration_never_runs() {
        let cooldown = Cooldown::new(0).start();
        assert!(!cooldown.is_running());
        assert!(cooldown.can_resend());
    }
}
