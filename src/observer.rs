use std::sync::Arc;

use arc_swap::ArcSwap;
use service::SourceHandler;

use crate::rtcp_session::RtcpEvent;

/// Session-lifecycle, per-source, and per-packet notifications, with a
/// structured-logging default so every build has a record of what happened
/// even with no other observer wired up.
///
/// An observer is handed to a session wrapped in a [`HandlerSlot`], which
/// can swap it for another implementation at any time; the observer itself
/// only needs to be `Send + Sync`, since a given call always runs against
/// one complete snapshot, never a half-replaced one.
#[allow(unused_variables)]
pub trait SessionObserver: Send + Sync + 'static {
    fn session_started(&self, session_id: &str) {}

    fn session_closed(&self, session_id: &str) {}

    /// An inbound RTP packet was accepted onto the receive path.
    fn on_packet_received(&self, session_id: &str, ssrc: u32, sequence_number: u16) {}

    /// An inbound RTCP compound packet yielded this event.
    fn on_rtcp_received(&self, session_id: &str, event: &RtcpEvent) {}

    fn on_source_added(&self, session_id: &str, ssrc: u32) {}

    fn on_source_removed(&self, session_id: &str, ssrc: u32) {}

    fn on_rate_limited(&self, session_id: &str, ssrc: u32, limited: bool) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl SessionObserver for LoggingObserver {
    fn session_started(&self, session_id: &str) {
        log::info!("session started: id={session_id}");
    }

    fn session_closed(&self, session_id: &str) {
        log::info!("session closed: id={session_id}");
    }

    fn on_rtcp_received(&self, session_id: &str, event: &RtcpEvent) {
        log::debug!("rtcp event: session={session_id}, event={event:?}");
    }

    fn on_source_added(&self, session_id: &str, ssrc: u32) {
        log::info!("source added: session={session_id}, ssrc={ssrc:#x}");
    }

    fn on_source_removed(&self, session_id: &str, ssrc: u32) {
        log::info!("source removed: session={session_id}, ssrc={ssrc:#x}");
    }

    fn on_rate_limited(&self, session_id: &str, ssrc: u32, limited: bool) {
        if limited {
            log::warn!("source rate limited: session={session_id}, ssrc={ssrc:#x}");
        } else {
            log::info!("source rate limit cleared: session={session_id}, ssrc={ssrc:#x}");
        }
    }
}

/// Holds one session's current [`SessionObserver`] behind an atomically
/// swappable pointer. `swap` may be called at any time, including while a
/// dispatch is in flight on another thread: readers always see either the
/// whole old observer or the whole new one, never a torn mix of both.
pub struct HandlerSlot {
    observer: ArcSwap<dyn SessionObserver>,
    session_id: String,
}

impl HandlerSlot {
    pub fn new(session_id: String, observer: Arc<dyn SessionObserver>) -> Arc<Self> {
        Arc::new(Self {
            observer: ArcSwap::from(observer),
            session_id,
        })
    }

    /// Replaces the observer. Safe to call concurrently with dispatch.
    pub fn swap(&self, observer: Arc<dyn SessionObserver>) {
        self.observer.store(observer);
    }

    fn current(&self) -> Arc<dyn SessionObserver> {
        self.observer.load_full()
    }

    pub fn session_started(&self) {
        self.current().session_started(&self.session_id);
    }

    pub fn session_closed(&self) {
        self.current().session_closed(&self.session_id);
    }

    pub fn on_packet_received(&self, ssrc: u32, sequence_number: u16) {
        self.current().on_packet_received(&self.session_id, ssrc, sequence_number);
    }

    pub fn on_rtcp_received(&self, event: &RtcpEvent) {
        self.current().on_rtcp_received(&self.session_id, event);
    }
}

/// Adapts a [`HandlerSlot`] into the narrower [`SourceHandler`] contract the
/// source tracker itself depends on.
pub struct ObserverSourceHandler {
    slot: Arc<HandlerSlot>,
}

impl ObserverSourceHandler {
    pub fn new(slot: Arc<HandlerSlot>) -> Self {
        Self { slot }
    }
}

impl SourceHandler for ObserverSourceHandler {
    fn on_source_added(&self, ssrc: u32) {
        self.slot.current().on_source_added(&self.slot.session_id, ssrc);
    }

    fn on_source_removed(&self, ssrc: u32) {
        self.slot.current().on_source_removed(&self.slot.session_id, ssrc);
    }

    fn on_rate_limited(&self, ssrc: u32, limited: bool) {
        self.slot.current().on_rate_limited(&self.slot.session_id, ssrc, limited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_forwards_to_observer() {
        let slot = HandlerSlot::new("sess-1".to_string(), Arc::new(LoggingObserver));
        let handler = ObserverSourceHandler::new(slot);
        handler.on_source_added(0xdead_beef);
        handler.on_rate_limited(0xdead_beef, true);
    }

    #[derive(Default)]
    struct CountingObserver(std::sync::atomic::AtomicU32);

    impl SessionObserver for CountingObserver {
        fn on_source_added(&self, _session_id: &str, _ssrc: u32) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn swap_takes_effect_for_subsequent_calls() {
        let slot = HandlerSlot::new("sess-1".to_string(), Arc::new(LoggingObserver));
        let handler = ObserverSourceHandler::new(slot.clone());

        handler.on_source_added(1); // goes to LoggingObserver, nothing to assert

        let counting = Arc::new(CountingObserver::default());
        slot.swap(counting.clone());
        handler.on_source_added(2);
        assert_eq!(counting.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
