//! Event delivery seam between the scheduler and observers.
//!
//! The scheduler emits every [`ObserverEvent`] through an [`EventSink`]
//! after the corresponding write has been persisted. Delivery is
//! fire-and-forget: a sink must not block and has no way to report
//! failure back to the tick.

use binwatch_types::ObserverEvent;
use tokio::sync::broadcast;

/// Receives events produced by the scheduler.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Must not block.
    fn emit(&self, event: ObserverEvent);
}

/// Broadcast to every subscribed receiver. Having no receivers is not an
/// error; the event is dropped.
impl EventSink for broadcast::Sender<ObserverEvent> {
    fn emit(&self, event: ObserverEvent) {
        let kind = event.kind();
        if self.send(event).is_err() {
            tracing::trace!(kind, "No observers connected, event dropped");
        }
    }
}

/// Discards everything. For processes with no observers attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ObserverEvent) {}
}
