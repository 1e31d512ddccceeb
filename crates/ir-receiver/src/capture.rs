//! Capture engine: edge interrupt + flush timer logic.
//!
//! ## Phases
//! ```text
//! [Idle] --arm()--> [Capturing] --stop()--> [Stopped]
//!                     |    ^
//!              pause()|    |arm()
//!                     v    |
//!                    [Paused]        (suspend: edges ignored, deadline kept)
//! ```
//!
//! ## Adaptive flush deadline
//! Every edge pushes the deadline to `now + timeout`, replacing whatever was
//! pending. The timer never re-arms itself, so a `Timeout` is only produced
//! after a genuine pause in transitions.
//!
//! The engine is clock-agnostic: callers pass `now`. All methods run under
//! the device's capture lock, so at most one of {edge, timer} is executing
//! here at any instant.

use embassy_time::Instant;

use crate::config::TimeoutUs;
use crate::event::{EventSink, RawEvent};
use crate::registers::{Register, RegisterBlock, RegisterInterface, STATUS_IR_DEC_IN};

/// Capture phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapturePhase {
    /// Not armed: edges are ignored and no deadline is pending.
    Idle,
    /// Armed: edges are forwarded and the flush deadline is maintained.
    Capturing,
    /// Suspended: edges are ignored, but a pending deadline still closes
    /// the open frame when it comes due.
    Paused,
    /// Terminal: nothing is produced any more.
    Stopped,
}

/// Result of a flush timer expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerOutcome {
    /// `Timeout` was emitted; no deadline remains.
    Fired,
    /// An edge moved the deadline after the timer was scheduled. Nothing was
    /// emitted; wait until the returned instant instead.
    Rescheduled(Instant),
    /// No deadline pending (already fired, flushed, or never armed).
    Idle,
}

/// Edge/timeout state shared by the interrupt handler and the flush timer.
#[derive(Debug)]
pub struct CaptureEngine {
    phase: CapturePhase,
    last_level: Option<bool>,
    deadline: Option<Instant>,
    timeout: TimeoutUs,
}

impl CaptureEngine {
    /// New idle engine.
    pub const fn new(timeout: TimeoutUs) -> Self {
        Self {
            phase: CapturePhase::Idle,
            last_level: None,
            deadline: None,
            timeout,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Level reported by the most recent edge, if any.
    pub fn last_level(&self) -> Option<bool> {
        self.last_level
    }

    /// Pending flush deadline.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Inactivity timeout.
    pub fn timeout(&self) -> TimeoutUs {
        self.timeout
    }

    /// Change the inactivity timeout. Applies from the next edge; a pending
    /// deadline keeps its instant.
    pub fn set_timeout(&mut self, timeout: TimeoutUs) {
        self.timeout = timeout;
    }

    /// `Idle | Paused → Capturing`.
    ///
    /// Reads STATUS once to drop stale latched state. That read produces no
    /// event. A deadline left pending by [`pause`](Self::pause) is kept.
    /// No-op once stopped.
    pub fn arm<B: RegisterBlock>(&mut self, regs: &mut RegisterInterface<B>) {
        if self.phase == CapturePhase::Stopped {
            return;
        }
        let _ = regs.read(Register::Status);
        self.phase = CapturePhase::Capturing;
        trace!("capture armed");
    }

    /// Edge interrupt.
    ///
    /// Emits `Edge` with the level read from STATUS, even when it equals the
    /// previous level, and pushes the flush deadline to `now + timeout`.
    /// Returns the new deadline, or `None` when not capturing.
    pub fn on_edge<B: RegisterBlock, S: EventSink>(
        &mut self,
        regs: &mut RegisterInterface<B>,
        sink: &mut S,
        now: Instant,
    ) -> Option<Instant> {
        if self.phase != CapturePhase::Capturing {
            debug!("edge ignored outside capture");
            return None;
        }
        let level = regs.read(Register::Status) & STATUS_IR_DEC_IN != 0;
        sink.on_event(RawEvent::Edge { level });
        self.last_level = Some(level);

        let deadline = now
            .checked_add(self.timeout.as_duration())
            .unwrap_or(Instant::MAX);
        self.deadline = Some(deadline);
        trace!("edge level={} deadline={}", level, deadline.as_micros());
        Some(deadline)
    }

    /// Flush timer expiry at `now`.
    ///
    /// Emits `Timeout` only if a deadline is pending and has been reached.
    /// Does not re-arm; the next edge does.
    pub fn on_timer<S: EventSink>(&mut self, sink: &mut S, now: Instant) -> TimerOutcome {
        if !matches!(self.phase, CapturePhase::Capturing | CapturePhase::Paused) {
            return TimerOutcome::Idle;
        }
        match self.deadline {
            None => TimerOutcome::Idle,
            Some(deadline) if now < deadline => {
                debug!(
                    "stale flush at {}, deadline moved to {}",
                    now.as_micros(),
                    deadline.as_micros()
                );
                TimerOutcome::Rescheduled(deadline)
            }
            Some(_) => {
                self.deadline = None;
                sink.on_event(RawEvent::Timeout);
                trace!("frame closed at {}", now.as_micros());
                TimerOutcome::Fired
            }
        }
    }

    /// `Capturing → Paused`.
    ///
    /// Emits nothing. Edges are ignored from here on; an open frame still
    /// gets its `Timeout` from [`on_timer`](Self::on_timer) once a full quiet
    /// window has passed. Returns whether a frame was left open.
    pub fn pause(&mut self) -> bool {
        if self.phase != CapturePhase::Capturing {
            return false;
        }
        self.phase = CapturePhase::Paused;
        self.deadline.is_some()
    }

    /// Terminal stop: drops the deadline and ignores everything afterwards.
    pub fn stop(&mut self) {
        self.phase = CapturePhase::Stopped;
        self.deadline = None;
        trace!("capture stopped");
    }
}
