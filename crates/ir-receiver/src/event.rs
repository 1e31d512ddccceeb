//! Raw events and the decoder seam.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Sender;

/// One unit of the raw capture stream.
///
/// Pulse widths are reconstructed by the decoder from delivery time; the
/// stream carries only levels and frame boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RawEvent {
    /// A transition was observed; `level` is the line level read after it.
    Edge {
        /// Input level (post-polarity) sampled from STATUS.
        level: bool,
    },
    /// No transition within the inactivity window: the frame is complete.
    Timeout,
}

/// Downstream protocol decoder.
///
/// Called synchronously from interrupt and timer context with the capture
/// lock held. Implementations must not block and must not call back into the
/// [`Device`](crate::Device).
pub trait EventSink {
    /// Consume one event. Events arrive in capture order.
    fn on_event(&mut self, event: RawEvent);
}

impl<F: FnMut(RawEvent)> EventSink for F {
    fn on_event(&mut self, event: RawEvent) {
        self(event);
    }
}

/// Forwards events into an Embassy [`Channel`](embassy_sync::channel::Channel)
/// for a decoder running in its own task.
///
/// Never waits: if the channel is full the event is dropped and counted, so
/// a stalled decoder cannot stall the interrupt handler.
pub struct ChannelSink<'ch, M: RawMutex, const N: usize> {
    tx: Sender<'ch, M, RawEvent, N>,
    dropped: u32,
}

impl<'ch, M: RawMutex, const N: usize> ChannelSink<'ch, M, N> {
    /// Wrap a channel sender.
    pub fn new(tx: Sender<'ch, M, RawEvent, N>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Events dropped because the channel was full. Saturates.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<M: RawMutex, const N: usize> EventSink for ChannelSink<'_, M, N> {
    fn on_event(&mut self, event: RawEvent) {
        if self.tx.try_send(event).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            warn!("raw event channel full, {} events dropped", self.dropped);
        }
    }
}
