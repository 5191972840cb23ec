//! Pure countdown state for the session clock.
//!
//! These types hold no task or interval of their own; the services layer
//! drives them from a one-second tick and reacts to the outcomes.

//
// ─── GLOBAL COUNTDOWN ─────────────────────────────────────────────────────────
//

/// What a single one-second tick did to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time was deducted; the exam continues.
    Running { remaining_seconds: u32 },
    /// The pause flag is set; nothing moved.
    Paused,
    /// The zero crossing. Reported exactly once per arming; the caller is
    /// expected to trigger auto-submit on it.
    Expired,
    /// The countdown is stopped or has already reported its expiry.
    Inert,
}

/// Global exam countdown.
///
/// Remaining time starts at `duration − elapsed_at_load` (clamped at zero)
/// and is monotonically non-increasing while running. Pausing freezes it
/// without resetting; stopping makes it permanently inert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining_seconds: u32,
    paused: bool,
    expiry_reported: bool,
    stopped: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(duration_seconds: u32, elapsed_at_load_seconds: u32) -> Self {
        Self {
            remaining_seconds: duration_seconds.saturating_sub(elapsed_at_load_seconds),
            paused: false,
            expiry_reported: false,
            stopped: false,
        }
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn pause(&mut self) {
        if !self.stopped {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Permanently stop the countdown (terminal submission).
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Let the auto-submit trigger fire again after a failed submission,
    /// provided the deadline is still crossed.
    pub fn rearm_expiry(&mut self) {
        if self.remaining_seconds == 0 && !self.stopped {
            self.expiry_reported = false;
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.stopped {
            return TickOutcome::Inert;
        }
        if self.paused {
            return TickOutcome::Paused;
        }

        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }

        if self.remaining_seconds == 0 {
            if self.expiry_reported {
                TickOutcome::Inert
            } else {
                self.expiry_reported = true;
                TickOutcome::Expired
            }
        } else {
            TickOutcome::Running {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }
}

//
// ─── PER-QUESTION TIMER ───────────────────────────────────────────────────────
//

/// Seconds spent on the question currently in view.
///
/// Informational only: it affects no scoring or persistence and does not
/// survive a submit. Reset on every cursor change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionTimer {
    elapsed_seconds: u32,
}

impl QuestionTimer {
    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn tick(&mut self) {
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.elapsed_seconds = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_decrements_one_per_tick() {
        let mut countdown = Countdown::new(60, 0);
        for n in 1..=5 {
            let outcome = countdown.tick();
            assert_eq!(
                outcome,
                TickOutcome::Running {
                    remaining_seconds: 60 - n
                }
            );
        }
        assert_eq!(countdown.remaining_seconds(), 55);
    }

    #[test]
    fn elapsed_at_load_is_deducted_up_front() {
        let countdown = Countdown::new(3_600, 600);
        assert_eq!(countdown.remaining_seconds(), 3_000);
    }

    #[test]
    fn overspent_attempt_expires_on_first_tick() {
        let mut countdown = Countdown::new(600, 900);
        assert_eq!(countdown.remaining_seconds(), 0);
        assert_eq!(countdown.tick(), TickOutcome::Expired);
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let mut countdown = Countdown::new(10, 0);
        countdown.tick();
        countdown.pause();
        for _ in 0..5 {
            assert_eq!(countdown.tick(), TickOutcome::Paused);
        }
        assert_eq!(countdown.remaining_seconds(), 9);

        countdown.resume();
        assert_eq!(
            countdown.tick(),
            TickOutcome::Running {
                remaining_seconds: 8
            }
        );
    }

    #[test]
    fn expiry_is_reported_exactly_once() {
        let mut countdown = Countdown::new(2, 0);
        assert!(matches!(countdown.tick(), TickOutcome::Running { .. }));
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::Inert);
        assert_eq!(countdown.tick(), TickOutcome::Inert);
        assert_eq!(countdown.remaining_seconds(), 0);
    }

    #[test]
    fn rearm_allows_a_second_expiry() {
        let mut countdown = Countdown::new(1, 0);
        assert_eq!(countdown.tick(), TickOutcome::Expired);
        assert_eq!(countdown.tick(), TickOutcome::Inert);

        countdown.rearm_expiry();
        assert_eq!(countdown.tick(), TickOutcome::Expired);
    }

    #[test]
    fn rearm_is_a_noop_while_time_remains() {
        let mut countdown = Countdown::new(30, 0);
        countdown.tick();
        countdown.rearm_expiry();
        assert!(matches!(countdown.tick(), TickOutcome::Running { .. }));
    }

    #[test]
    fn stopped_countdown_is_inert() {
        let mut countdown = Countdown::new(30, 0);
        countdown.stop();
        assert_eq!(countdown.tick(), TickOutcome::Inert);
        assert_eq!(countdown.remaining_seconds(), 30);
    }

    #[test]
    fn question_timer_counts_and_resets() {
        let mut timer = QuestionTimer::default();
        timer.tick();
        timer.tick();
        timer.tick();
        assert_eq!(timer.elapsed_seconds(), 3);
        timer.reset();
        assert_eq!(timer.elapsed_seconds(), 0);
    }
}
