//! One-shot flush timer.
//!
//! The timer is a command slot plus a runner future. Whoever holds the
//! capture lock posts [`TimerCommand`]s; the runner waits for the latest
//! command or for the armed instant, whichever comes first.
//!
//! ```text
//!   edge IRQ ──Arm(t)──┐
//!   suspend ──Cancel───┼──► [command slot] ──► run() ──expiry──► on_expiry(now)
//!   teardown ─Shutdown─┘                        │
//!                                               └──exit──► exited
//! ```
//!
//! The slot holds one value: a newer command replaces an unread one. Since
//! every post happens under the capture lock, the slot always holds the most
//! recent decision and a late `Arm` can never overwrite `Shutdown`.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};


/// Request for the flush timer runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerCommand {
    /// (Re)arm for this instant, replacing any pending expiry.
    Arm(Instant),
    /// Drop the pending expiry, keep running.
    Cancel,
    /// Stop the runner.
    Shutdown,
}

/// Command slot and exit notification for one flush timer runner.
pub struct FlushTimer {
    command: Signal<CriticalSectionRawMutex, TimerCommand>,
    exited: Signal<CriticalSectionRawMutex, ()>,
}

impl FlushTimer {
    /// Idle timer with nothing armed.
    pub const fn new() -> Self {
        Self {
            command: Signal::new(),
            exited: Signal::new(),
        }
    }

    /// Post a command, replacing any unread one.
    pub fn post(&self, command: TimerCommand) {
        self.command.signal(command);
    }

    /// Shorthand for `post(TimerCommand::Arm(at))`.
    pub fn arm(&self, at: Instant) {
        self.post(TimerCommand::Arm(at));
    }

    /// Shorthand for `post(TimerCommand::Cancel)`.
    pub fn cancel(&self) {
        self.post(TimerCommand::Cancel);
    }

    /// Shorthand for `post(TimerCommand::Shutdown)`.
    pub fn shutdown(&self) {
        self.post(TimerCommand::Shutdown);
    }

    /// Forget a previous run's exit notification.
    pub fn reset_exited(&self) {
        self.exited.reset();
    }

    /// Mark the runner as finished.
    pub fn notify_exited(&self) {
        self.exited.signal(());
    }

    /// Resolves once the runner has finished.
    pub async fn exited(&self) {
        self.exited.wait().await;
    }

    /// Serve commands until `Shutdown`.
    ///
    /// On expiry `on_expiry(now)` is called; it returns the next instant to
    /// wait for, or `None` to go idle until the next `Arm`. Does not signal
    /// [`exited`](Self::exited); the owner does that once its own cleanup is
    /// done.
    pub async fn run<F>(&self, mut on_expiry: F)
    where
        F: FnMut(Instant) -> Option<Instant>,
    {
        let mut deadline: Option<Instant> = None;
        loop {
            let command = match deadline {
                None => Some(self.command.wait().await),
                Some(at) => match select(self.command.wait(), Timer::at(at)).await {
                    Either::First(command) => Some(command),
                    Either::Second(()) => None,
                },
            };
            match command {
                Some(TimerCommand::Arm(at)) => deadline = Some(at),
                Some(TimerCommand::Cancel) => deadline = None,
                Some(TimerCommand::Shutdown) => break,
                None => deadline = on_expiry(Instant::now()),
            }
        }
        trace!("flush timer runner stopped");
    }
}

impl Default for FlushTimer {
    fn default() -> Self {
        Self::new()
    }
}
