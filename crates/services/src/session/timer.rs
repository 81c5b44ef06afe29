use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One countdown tick, stamped with the epoch of the timer that produced it.
///
/// The event loop compares the epoch against the live timer and discards
/// anything stale, so a timer bound to an earlier question can never touch a
/// later question's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimerMessage {
    pub epoch: u64,
    pub remaining: u32,
}

/// Countdown for exactly one question instance.
///
/// Emits one message per interval, counting `limit - 1` down to `0`, then
/// stops itself; the `0` message is the timeout trigger and is emitted at
/// most once. Cancelling (or dropping) aborts the task. Timers are acquired
/// and released in matched pairs: whoever starts one must cancel it before
/// starting the next.
#[derive(Debug)]
pub(crate) struct QuestionTimer {
    epoch: u64,
    handle: JoinHandle<()>,
}

impl QuestionTimer {
    pub(crate) fn start(
        seconds: u32,
        epoch: u64,
        tick_interval: Duration,
        sender: mpsc::UnboundedSender<TimerMessage>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately;
            // consume it so the countdown starts a full interval from now.
            interval.tick().await;

            let mut remaining = seconds;
            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                if sender.send(TimerMessage { epoch, remaining }).is_err() {
                    return;
                }
            }
        });
        Self { epoch, handle }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
