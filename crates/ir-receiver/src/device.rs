//! Device lifecycle: configure, capture, suspend/resume, teardown.
//!
//! ```text
//! Unconfigured --configure--> Armed --suspend--> Suspended
//!                               ^                   |
//!                               +------resume-------+
//! Armed | Suspended | Unconfigured --teardown--> Removed
//! ```
//!
//! Every entry point takes the single capture lock, a critical-section
//! mutex, so the edge interrupt, the flush timer and process-context calls
//! never interleave inside the capture engine. Timer commands are posted
//! while that lock is held.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{with_timeout, Duration, Instant};

use crate::capture::{CaptureEngine, TimerOutcome};
use crate::config::{RateDivisor, ReceiverConfig, TimeoutUs};
use crate::error::{Error, Result};
use crate::event::EventSink;
use crate::mode::{program_raw_decode, program_wake_decode, RawSettings};
use crate::registers::{Register, RegisterBlock, RegisterInterface, REG1_ENABLE};
use crate::snapshot::RegisterSnapshot;
use crate::timer::FlushTimer;
use crate::variant::{select_variant, HardwareVariant};

/// The receiver's interrupt line, already claimed from the platform.
pub trait InterruptLine {
    /// Unmask the edge interrupt.
    fn enable(&mut self);
    /// Mask the edge interrupt.
    fn disable(&mut self);
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Created, registers untouched.
    Unconfigured,
    /// Raw capture running.
    Armed,
    /// On-chip NEC decoder owns the line; configuration saved.
    Suspended,
    /// Torn down. Terminal.
    Removed,
}

impl DeviceState {
    /// Lower-case name, for logs and error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Armed => "armed",
            Self::Suspended => "suspended",
            Self::Removed => "removed",
        }
    }
}

struct Inner<B, I, S> {
    regs: RegisterInterface<B>,
    irq: I,
    sink: S,
    variant: Option<HardwareVariant>,
    settings: RawSettings,
    snapshot: Option<RegisterSnapshot>,
    engine: CaptureEngine,
    state: DeviceState,
    timer_running: bool,
}

impl<B: RegisterBlock, I: InterruptLine, S: EventSink> Inner<B, I, S> {
    fn require(&self, allowed: &[DeviceState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            debug!("lifecycle call rejected while {}", self.state.as_str());
            Err(Error::InvalidState(self.state))
        }
    }

    fn configured_variant(&self) -> Result<HardwareVariant> {
        self.variant.ok_or(Error::InvalidState(self.state))
    }

    /// Hand the line to the NEC decoder. An open frame keeps its deadline.
    fn enter_wake_decode(&mut self) -> Result<()> {
        let variant = self.configured_variant()?;
        program_wake_decode(&mut self.regs, variant)?;
        if self.engine.pause() {
            debug!("suspending with an open frame");
        }
        self.irq.disable();
        self.state = DeviceState::Suspended;
        Ok(())
    }
}

/// One IR receiver instance.
///
/// Owns the register block `B`, the interrupt line `I` and the decoder sink
/// `S` until [`into_parts`](Self::into_parts). Meant to live in a `static`
/// (or be otherwise shared by reference) between the interrupt handler, the
/// [`run_flush_timer`](Self::run_flush_timer) task and process code.
pub struct Device<B, I, S> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<B, I, S>>>,
    timer: FlushTimer,
}

impl<B: RegisterBlock, I: InterruptLine, S: EventSink> Device<B, I, S> {
    /// Take ownership of the hardware handles. Touches no register.
    pub const fn new(regs: B, irq: I, sink: S) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                regs: RegisterInterface::new(regs),
                irq,
                sink,
                variant: None,
                settings: RawSettings {
                    rate: RateDivisor::DEFAULT,
                    pulse_inverted: false,
                },
                snapshot: None,
                engine: CaptureEngine::new(TimeoutUs::DEFAULT),
                state: DeviceState::Unconfigured,
                timer_running: false,
            })),
            timer: FlushTimer::new(),
        }
    }

    fn locked<R>(&self, f: impl FnOnce(&mut Inner<B, I, S>) -> R) -> R {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            f(&mut *inner)
        })
    }

    /// Bring the receiver up in raw capture mode.
    ///
    /// The identity is resolved before any register is touched. On success
    /// the configuration registers are snapshotted, the capture engine armed
    /// and the interrupt enabled. On failure the device stays
    /// `Unconfigured`; a failed verification may leave partial register
    /// state behind, but the interrupt is never enabled.
    pub fn configure(&self, config: &ReceiverConfig<'_>) -> Result<()> {
        self.locked(|inner| {
            inner.require(&[DeviceState::Unconfigured])?;
            let variant = select_variant(config.identity())?;
            let settings = RawSettings {
                rate: config.rate(),
                pulse_inverted: config.pulse_inverted(),
            };
            program_raw_decode(&mut inner.regs, variant, settings)?;

            inner.snapshot = Some(RegisterSnapshot::capture(&mut inner.regs));
            inner.variant = Some(variant);
            inner.settings = settings;
            inner.engine.set_timeout(config.timeout());
            inner.engine.arm(&mut inner.regs);
            inner.irq.enable();
            inner.state = DeviceState::Armed;
            info!(
                "receiver configured: layout {} timeout {} us resolution {} us",
                variant.as_str(),
                config.timeout().get(),
                config.rate().resolution_us()
            );
            Ok(())
        })
    }

    /// Edge interrupt handler. Never blocks.
    ///
    /// Emits one `Edge` and re-arms the flush timer. Interrupts outside
    /// `Armed` are absorbed.
    pub fn on_interrupt(&self, now: Instant) {
        self.locked(|inner| {
            if let Some(deadline) = inner.engine.on_edge(&mut inner.regs, &mut inner.sink, now) {
                self.timer.arm(deadline);
            }
        });
    }

    /// Flush timer expiry at `now`.
    ///
    /// Returns the instant to wait for next when an edge moved the deadline
    /// after the timer was scheduled.
    pub fn on_flush_timer(&self, now: Instant) -> Option<Instant> {
        self.locked(|inner| match inner.engine.on_timer(&mut inner.sink, now) {
            TimerOutcome::Rescheduled(at) => Some(at),
            TimerOutcome::Fired | TimerOutcome::Idle => None,
        })
    }

    /// Flush timer task. Run exactly one per device, e.g. from an Embassy
    /// task, for as long as the device lives.
    ///
    /// Returns after [`teardown`](Self::teardown), or immediately if the
    /// device is already removed.
    pub async fn run_flush_timer(&self) {
        let started = self.locked(|inner| {
            if inner.state == DeviceState::Removed {
                return false;
            }
            inner.timer_running = true;
            self.timer.reset_exited();
            true
        });
        if !started {
            debug!("flush timer not started: device removed");
            return;
        }

        self.timer.run(|now| self.on_flush_timer(now)).await;

        self.locked(|inner| inner.timer_running = false);
        self.timer.notify_exited();
    }

    /// Switch to hardware NEC decode for system suspend.
    ///
    /// Masks the interrupt; later edges are ignored. An open frame is not
    /// closed early: the flush timer still delivers its `Timeout` once the
    /// quiet window ends. The decoder stays enabled so the on-chip NEC
    /// decoder can wake the system.
    pub fn suspend(&self) -> Result<()> {
        self.locked(|inner| {
            inner.require(&[DeviceState::Armed])?;
            inner.enter_wake_decode()?;
            info!("receiver suspended");
            Ok(())
        })
    }

    /// Restore the configuration saved at `configure` and resume raw capture.
    pub fn resume(&self) -> Result<()> {
        self.locked(|inner| {
            inner.require(&[DeviceState::Suspended])?;
            let variant = inner.configured_variant()?;
            let snapshot = inner.snapshot.ok_or(Error::InvalidState(inner.state))?;
            snapshot.restore(&mut inner.regs);
            program_raw_decode(&mut inner.regs, variant, inner.settings)?;
            inner.engine.arm(&mut inner.regs);
            inner.irq.enable();
            inner.state = DeviceState::Armed;
            info!("receiver resumed");
            Ok(())
        })
    }

    /// Power-off hook: leave the NEC decoder in charge so the bootloader can
    /// power the system back on from the remote.
    ///
    /// From `Armed` this behaves like [`suspend`](Self::suspend); from
    /// `Suspended` it reapplies the wake programming.
    pub fn prepare_power_off(&self) -> Result<()> {
        self.locked(|inner| {
            inner.require(&[DeviceState::Armed, DeviceState::Suspended])?;
            inner.enter_wake_decode()?;
            info!("receiver prepared for power-off");
            Ok(())
        })
    }

    /// Change the inactivity timeout. Takes effect from the next edge.
    ///
    /// Before `configure` the timeout comes from [`ReceiverConfig`], so the
    /// call is rejected there.
    pub fn set_timeout(&self, timeout: TimeoutUs) -> Result<()> {
        self.locked(|inner| {
            inner.require(&[DeviceState::Armed, DeviceState::Suspended])?;
            inner.engine.set_timeout(timeout);
            debug!("timeout set to {} us", timeout.get());
            Ok(())
        })
    }

    /// Stop capture for good.
    ///
    /// Under the lock: clear the decoder enable bit, mask the interrupt and
    /// stop the engine, so no event is produced once this is entered. Then
    /// wait up to `bound` for the flush timer task to exit.
    ///
    /// Calling it again touches no register. It only waits, again up to
    /// `bound`, if the timer task has still not exited.
    ///
    /// # Errors
    ///
    /// [`Error::TimerCancelTimeout`] if the timer task did not exit in time.
    /// The hardware handles must then not be reused, and
    /// [`into_parts`](Self::into_parts) refuses them until the task exits.
    pub async fn teardown(&self, bound: Duration) -> Result<()> {
        let timer_running = self.locked(|inner| {
            match inner.state {
                DeviceState::Removed => return inner.timer_running,
                DeviceState::Armed | DeviceState::Suspended => {
                    inner.regs.update(Register::Reg1, REG1_ENABLE, 0);
                    inner.irq.disable();
                }
                DeviceState::Unconfigured => {}
            }
            inner.engine.stop();
            inner.state = DeviceState::Removed;
            self.timer.shutdown();
            info!("receiver removed");
            inner.timer_running
        });

        if !timer_running {
            return Ok(());
        }
        with_timeout(bound, self.timer.exited())
            .await
            .map_err(|_| {
                error!("flush timer still running after {} us", bound.as_micros());
                Error::TimerCancelTimeout
            })
    }

    /// Give back the hardware handles.
    ///
    /// Only after teardown (or before configure), and never while the flush
    /// timer task is still running; otherwise the device is handed back
    /// unchanged.
    pub fn into_parts(self) -> core::result::Result<(B, I, S), Self> {
        let (state, timer_running) = self.locked(|inner| (inner.state, inner.timer_running));
        if !timer_running && matches!(state, DeviceState::Removed | DeviceState::Unconfigured) {
            let inner = self.inner.into_inner().into_inner();
            Ok((inner.regs.into_inner(), inner.irq, inner.sink))
        } else {
            Err(self)
        }
    }

    /// Run `f` on the register interface under the capture lock.
    pub fn with_registers<R>(&self, f: impl FnOnce(&mut RegisterInterface<B>) -> R) -> R {
        self.locked(|inner| f(&mut inner.regs))
    }

    /// Run `f` on the decoder sink under the capture lock.
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.locked(|inner| f(&mut inner.sink))
    }

    /// Registers saved at configure.
    pub fn snapshot(&self) -> Option<RegisterSnapshot> {
        self.locked(|inner| inner.snapshot)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DeviceState {
        self.locked(|inner| inner.state)
    }

    /// Layout selected at configure.
    pub fn variant(&self) -> Option<HardwareVariant> {
        self.locked(|inner| inner.variant)
    }

    /// Current inactivity timeout.
    pub fn timeout(&self) -> TimeoutUs {
        self.locked(|inner| inner.engine.timeout())
    }
}
