// ABOUTME: Presenter navigation state for hyperslide
// ABOUTME: Records the current slide index and broadcasts it to followers

use crate::hub::SessionHub;
use crate::message::PushMessage;
use log::debug;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Updating,
}

#[derive(Debug)]
struct SyncState {
    index: usize,
    phase: SyncPhase,
}

/// Holds the presenter's current slide and relays changes through the hub.
pub struct SyncCoordinator {
    hub: SessionHub,
    state: Mutex<SyncState>,
}

impl SyncCoordinator {
    pub fn new(hub: SessionHub) -> Self {
        Self {
            hub,
            state: Mutex::new(SyncState {
                index: 0,
                phase: SyncPhase::Idle,
            }),
        }
    }

    pub fn current_index(&self) -> usize {
        self.state.lock().index
    }

    pub fn phase(&self) -> SyncPhase {
        self.state.lock().phase
    }

    /// Record `index` and broadcast exactly one `sync` message.
    /// Returns how many viewers accepted it.
    pub fn set_index(&self, index: usize) -> usize {
        let mut state = self.state.lock();
        state.phase = SyncPhase::Updating;
        state.index = index;
        let delivered = self.hub.broadcast(&PushMessage::Sync { index });
        state.phase = SyncPhase::Idle;
        debug!("Presenter at slide {} ({} viewers)", index, delivered);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::tests::RecordingSink;

    #[test]
    fn test_defaults() {
        let sync = SyncCoordinator::new(SessionHub::new());
        assert_eq!(sync.current_index(), 0);
        assert_eq!(sync.phase(), SyncPhase::Idle);
    }

    #[test]
    fn test_sync_fan_out() {
        let hub = SessionHub::new();
        let sync = SyncCoordinator::new(hub.clone());

        let sinks: Vec<RecordingSink> = (0..3).map(|_| RecordingSink::default()).collect();
        let _guards: Vec<_> = sinks
            .iter()
            .map(|sink| hub.register(Box::new(sink.clone())))
            .collect();

        assert_eq!(sync.set_index(2), 3);
        assert_eq!(sync.current_index(), 2);
        assert_eq!(sync.phase(), SyncPhase::Idle);

        let late = RecordingSink::default();
        let _late = hub.register(Box::new(late.clone()));

        let expected = PushMessage::Sync { index: 2 }.frame().unwrap();
        for sink in &sinks {
            assert_eq!(*sink.frames.lock(), vec![expected.clone()]);
        }
        assert!(late.frames.lock().is_empty());
    }
}
