//! Per-connection liveness probing.
//!
//! [`ProbeTimer`] is the connection's failure detector, a three-state
//! machine: `Alive → Probing → (Alive on reply | timed out)`. On a fixed
//! interval it asks the connection task to send a probe and arms a
//! deadline; a probe reply observed before the deadline cancels it, and a
//! deadline that fires first means the transport silently died and the
//! connection must be evicted.
//!
//! Cancellation is race-free by construction: the connection task's select
//! loop observes either the reply or the deadline first, never both.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep, interval_at, sleep};

/// What the connection task must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEvent {
    /// The probe interval elapsed: send a ping to the peer. The timer is
    /// now `Probing` with an armed deadline.
    SendProbe,
    /// No reply arrived within the timeout window: terminate, unregister,
    /// and broadcast presence.
    TimedOut,
}

/// Liveness state of the connection, as seen by the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    /// No probe outstanding.
    Alive,
    /// A probe was sent and its deadline is armed.
    Probing,
}

/// Probe scheduler and deadline for a single connection.
///
/// Independent per connection; one connection's timeout does not affect
/// any other. Exposes a single [`ProbeTimer::next_event`] future so the
/// select loop holds exactly one mutable borrow of the timer.
#[derive(Debug)]
pub struct ProbeTimer {
    interval: Interval,
    timeout: Duration,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl ProbeTimer {
    /// Creates a timer that requests a probe every `period` and evicts
    /// after `timeout` without a reply.
    ///
    /// The first probe is due one full `period` after creation, not
    /// immediately.
    #[must_use]
    pub fn new(period: Duration, timeout: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            timeout,
            deadline: None,
        }
    }

    /// Returns the current liveness state.
    #[must_use]
    pub const fn state(&self) -> LivenessState {
        if self.deadline.is_some() {
            LivenessState::Probing
        } else {
            LivenessState::Alive
        }
    }

    /// Records a probe reply, cancelling the pending deadline.
    ///
    /// First-class cancellation: a reply observed after the deadline has
    /// internally elapsed but before [`Self::next_event`] reported it
    /// still cancels — the connection is never torn down for a reply that
    /// was seen first.
    pub fn observe_reply(&mut self) {
        if self.deadline.take().is_some() {
            tracing::trace!("probe reply observed");
        }
    }

    /// Waits for the next probe event.
    ///
    /// Cancel-safe: dropping the future mid-wait loses neither the armed
    /// deadline nor the interval schedule, so it can be raced inside
    /// `tokio::select!` against socket traffic.
    pub async fn next_event(&mut self) -> ProbeEvent {
        match self.deadline.as_mut() {
            Some(deadline) => {
                deadline.await;
                self.deadline = None;
                ProbeEvent::TimedOut
            }
            None => {
                self.interval.tick().await;
                self.deadline = Some(Box::pin(sleep(self.timeout)));
                ProbeEvent::SendProbe
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_secs(5);
    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn first_probe_due_after_one_period() {
        let start = Instant::now();
        let mut timer = ProbeTimer::new(PERIOD, TIMEOUT);
        assert_eq!(timer.state(), LivenessState::Alive);

        assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);
        assert_eq!(start.elapsed(), PERIOD);
        assert_eq!(timer.state(), LivenessState::Probing);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_reply_times_out_after_the_window() {
        let start = Instant::now();
        let mut timer = ProbeTimer::new(PERIOD, TIMEOUT);

        assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);
        assert_eq!(timer.next_event().await, ProbeEvent::TimedOut);
        assert_eq!(start.elapsed(), PERIOD + TIMEOUT);
        assert_eq!(timer.state(), LivenessState::Alive);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_cancels_the_deadline() {
        let mut timer = ProbeTimer::new(PERIOD, TIMEOUT);

        assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);
        timer.observe_reply();
        assert_eq!(timer.state(), LivenessState::Alive);

        // The next event is the next probe, not a timeout.
        let start = Instant::now();
        assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);
        assert_eq!(start.elapsed(), PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_still_cancels_if_observed_first() {
        let mut timer = ProbeTimer::new(PERIOD, TIMEOUT);
        assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);

        // Let the deadline elapse on the clock without polling the timer,
        // then observe the reply before asking for the next event. The
        // reply wins: cancel-or-terminate, never both.
        tokio::time::advance(TIMEOUT + Duration::from_millis(100)).await;
        timer.observe_reply();

        assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_while_alive_is_a_no_op() {
        let mut timer = ProbeTimer::new(PERIOD, TIMEOUT);
        timer.observe_reply();
        assert_eq!(timer.state(), LivenessState::Alive);

        let start = Instant::now();
        assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);
        assert_eq!(start.elapsed(), PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn probing_continues_after_successful_cycles() {
        let mut timer = ProbeTimer::new(PERIOD, TIMEOUT);
        for _ in 0..3 {
            assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);
            timer.observe_reply();
        }
        assert_eq!(timer.next_event().await, ProbeEvent::SendProbe);
        assert_eq!(timer.next_event().await, ProbeEvent::TimedOut);
    }
}
