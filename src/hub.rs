// ABOUTME: Session hub tracking connected slide viewers
// ABOUTME: Registers push channels and fans broadcast messages out to all of them

use crate::errors::{Result, SlideError};
use crate::message::PushMessage;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{mpsc, Arc};
use uuid::Uuid;

/// Opaque identifier for one viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The sending half of a push channel.
pub trait PushSink: Send {
    /// Queue one serialized frame for delivery.
    fn push(&self, frame: &str) -> Result<()>;
}

impl PushSink for mpsc::Sender<String> {
    fn push(&self, frame: &str) -> Result<()> {
        self.send(frame.to_string())
            .map_err(|_| SlideError::ServerError("push channel closed".into()))
    }
}

/// In-memory registry of open push channels.
#[derive(Clone, Default)]
pub struct SessionHub {
    connections: Arc<Mutex<HashMap<ConnectionId, Box<dyn PushSink>>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink. It stays registered until the returned guard is dropped.
    pub fn register(&self, sink: Box<dyn PushSink>) -> Registration {
        let id = ConnectionId::new();
        let count = {
            let mut connections = self.connections.lock();
            connections.insert(id, sink);
            connections.len()
        };
        info!("Viewer {} connected ({} open)", id, count);
        Registration {
            id,
            hub: self.clone(),
        }
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.lock().remove(&id).is_some();
        if removed {
            info!("Viewer {} disconnected", id);
        }
        removed
    }

    /// Push `message` to every registered sink. Failing sinks are skipped,
    /// not removed. Returns the number of sinks that accepted the frame.
    pub fn broadcast(&self, message: &PushMessage) -> usize {
        let frame = match message.frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to serialize {:?}: {}", message, e);
                return 0;
            }
        };

        let connections = self.connections.lock();
        let mut delivered = 0;
        for (id, sink) in connections.iter() {
            match sink.push(&frame) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Push to viewer {} failed: {}", id, e),
            }
        }
        debug!(
            "Broadcast {} to {}/{} viewers",
            frame.trim_end(),
            delivered,
            connections.len()
        );
        delivered
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// Drop every sink, ending all push channels.
    pub fn close_all(&self) {
        let closed = {
            let mut connections = self.connections.lock();
            let count = connections.len();
            connections.clear();
            count
        };
        if closed > 0 {
            info!("Closed {} viewer connections", closed);
        }
    }
}

/// Keeps a connection registered; unregisters it when dropped.
pub struct Registration {
    id: ConnectionId,
    hub: SessionHub,
}

impl Registration {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}
