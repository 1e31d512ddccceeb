//! Raw-pulse capture and timeout framing for Meson-family IR receivers
//!
//! The receiver latches every transition on the IR input line and raises an
//! interrupt. This crate turns those interrupts into a stream of
//! [`RawEvent`]s for a downstream protocol decoder, and synthesizes an
//! end-of-frame [`RawEvent::Timeout`] with a software flush timer whenever
//! the line stays quiet for the configured inactivity window.
//!
//! # Architecture Layers
//!
//! ```text
//! Protocol decoder (NEC / RC5 / ..., not in this crate)
//!         ↑ RawEvent
//! Device (lifecycle: configure / suspend / resume / teardown)
//!         ↓                         ↓
//! CaptureEngine + FlushTimer     RegisterSnapshot (power transitions)
//!         ↓
//! RegisterInterface → RegisterBlock (MMIO or test double)
//! ```
//!
//! # Execution contexts
//!
//! - **Interrupt**: [`Device::on_interrupt`], never blocks.
//! - **Timer task**: [`Device::run_flush_timer`], one Embassy task per device.
//! - **Process**: configure, suspend, resume, teardown.
//!
//! All three serialize on a single critical-section mutex owned by the
//! [`Device`].
//!
//! # Features
//!
//! - `defmt`: defmt logging and `defmt::Format` derives (hardware builds)
//! - `tracing`: host logging through `tracing`
//!
//! # Example
//!
//! ```no_run
//! use embassy_time::Duration;
//! use ir_receiver::{Device, InterruptLine, RawEvent, ReceiverConfig, RegisterBlock};
//!
//! async fn receiver<B, I>(regs: B, irq: I) -> ir_receiver::Result<()>
//! where
//!     B: RegisterBlock + Send,
//!     I: InterruptLine + Send,
//! {
//!     let sink = |event: RawEvent| {
//!         let _ = event; // hand over to the protocol decoder
//!     };
//!     let device = Device::new(regs, irq, sink);
//!     device.configure(&ReceiverConfig::new("amlogic,meson-gxbb-ir"))?;
//!     // Spawn `device.run_flush_timer()` and route the IRQ to
//!     // `device.on_interrupt(Instant::now())`.
//!     device.teardown(Duration::from_millis(10)).await
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware driver crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Must come first: the logging macros are used by every module below.
#[macro_use]
mod fmt;

pub mod capture;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod mode;
pub mod registers;
pub mod snapshot;
pub mod timer;
pub mod variant;

pub use capture::{CaptureEngine, CapturePhase, TimerOutcome};
pub use config::{OutOfRangeError, RateDivisor, ReceiverConfig, TimeoutUs};
pub use device::{Device, DeviceState, InterruptLine};
pub use error::{Error, Result};
pub use event::{ChannelSink, EventSink, RawEvent};
pub use mode::DecodeMode;
pub use registers::{MmioRegisterBlock, Register, RegisterBlock, RegisterInterface};
pub use snapshot::RegisterSnapshot;
pub use timer::{FlushTimer, TimerCommand};
pub use variant::{select_variant, HardwareVariant, ModeField};
