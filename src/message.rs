//! Message and sender types shared by both relay directions.

use std::time::{Duration, Instant};

/// Which side of the relay submitted a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderKind {
    /// A mobile application instance.
    Mobile,
    /// A physical controller device.
    Controller,
}

/// Identifies the peer that submitted a message.
///
/// The relay core treats every field as opaque: the routing layer decides
/// what goes into `source_addr` (usually the network source address) and
/// `identity` (usually the authenticated account id, when one is known).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderDescriptor {
    /// Which class of peer this is.
    pub kind: SenderKind,
    /// Network source address as seen by the routing layer.
    pub source_addr: String,
    /// Authenticated identity, if the request carried one.
    pub identity: Option<String>,
}

impl SenderDescriptor {
    /// Descriptor for a mobile client.
    pub fn mobile(source_addr: impl Into<String>, identity: Option<String>) -> Self {
        Self {
            kind: SenderKind::Mobile,
            source_addr: source_addr.into(),
            identity,
        }
    }

    /// Descriptor for a controller device.
    pub fn controller(source_addr: impl Into<String>, identity: Option<String>) -> Self {
        Self {
            kind: SenderKind::Controller,
            source_addr: source_addr.into(),
            identity,
        }
    }
}

/// A single buffered message.
///
/// Entries are immutable once created: they are stamped with their creation
/// instant and absolute expiry on the way into a queue, and afterwards only
/// ever removed, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Uninterpreted payload bytes.
    pub payload: Vec<u8>,
    /// Who submitted the message.
    pub sender: SenderDescriptor,
    /// When the entry was accepted.
    pub created_at: Instant,
    /// Absolute expiry instant (`created_at + ttl`).
    pub expires_at: Instant,
}

impl QueueEntry {
    pub(crate) fn new(
        payload: Vec<u8>,
        sender: SenderDescriptor,
        now: Instant,
        ttl: Duration,
    ) -> Self {
        Self {
            payload,
            sender,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// An entry is expired from the instant `created_at + ttl` onwards,
    /// whether or not a sweep has physically removed it yet.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
