//! In-memory store-and-forward queues with time-based expiry.

use crate::config::QueueConfig;
use crate::message::{QueueEntry, SenderDescriptor};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::trace;

/// Outcome of a command enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The command was appended to the controller's backlog.
    Queued,
    /// The controller's backlog is at its configured cap.
    BacklogFull { limit: usize },
}

/// Aggregate queue counters, computed by full traversal.
///
/// Counts are physical: an expired entry that no sweep or read has removed
/// yet is still counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Controllers with at least one queued command.
    pub controllers_with_backlog: usize,
    /// Total queued commands across all controllers.
    pub queued_commands: usize,
    /// Controllers with an unread status entry.
    pub controllers_with_pending_status: usize,
}

/// Entries removed by one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    /// Expired commands removed from backlogs.
    pub expired_commands: usize,
    /// Expired status entries removed from slots.
    pub expired_statuses: usize,
}

#[derive(Default)]
struct QueueState {
    /// mobile -> controller: FIFO command backlog per controller key.
    commands: HashMap<String, VecDeque<QueueEntry>>,
    /// controller -> mobile: latest status per controller key.
    statuses: HashMap<String, QueueEntry>,
}

/// Message queue engine for both relay directions.
///
/// Commands (mobile to controller) queue FIFO per controller key: each one is
/// a discrete instruction that must be delivered at most once and in order.
/// Statuses (controller to mobile) occupy a single latest-wins slot per key:
/// only the most recent device status is meaningful, and older ones are
/// discarded unread the moment a newer one arrives.
///
/// Every entry carries an absolute expiry (`now + ttl` at acceptance) and is
/// treated as absent from that instant on, whether or not it has been
/// physically removed. Reads prune what they encounter; [`sweep_expired`]
/// reclaims the rest.
///
/// All operations take one internal lock, so compound steps such as dequeue's
/// expire-then-pop are atomic with respect to concurrent callers. Every
/// public operation also has an `*_at` variant taking an explicit clock
/// reading; the plain form uses [`Instant::now`].
///
/// [`sweep_expired`]: MessageQueue::sweep_expired
pub struct MessageQueue {
    ttl: Duration,
    max_backlog: Option<usize>,
    state: Mutex<QueueState>,
}

impl MessageQueue {
    /// Create a new message queue engine from configuration
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            ttl: config.ttl(),
            max_backlog: config.max_backlog_per_controller,
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Append a command to the backlog for `key`, creating it if absent.
    pub fn enqueue_command(
        &self,
        key: &str,
        sender: SenderDescriptor,
        payload: Vec<u8>,
    ) -> EnqueueOutcome {
        self.enqueue_command_at(key, sender, payload, Instant::now())
    }

    /// [`enqueue_command`](Self::enqueue_command) with an explicit clock reading.
    pub fn enqueue_command_at(
        &self,
        key: &str,
        sender: SenderDescriptor,
        payload: Vec<u8>,
        now: Instant,
    ) -> EnqueueOutcome {
        let mut state = self.state.lock();

        if let Some(limit) = self.max_backlog {
            let pending = state.commands.get(key).map_or(0, VecDeque::len);
            if pending >= limit {
                return EnqueueOutcome::BacklogFull { limit };
            }
        }

        state
            .commands
            .entry(key.to_string())
            .or_default()
            .push_back(QueueEntry::new(payload, sender, now, self.ttl));
        EnqueueOutcome::Queued
    }

    /// Remove and return the earliest unexpired command for `key`.
    ///
    /// Returns `None` both when the key was never seen and when every queued
    /// command has expired; callers cannot distinguish the two cases.
    pub fn dequeue_command(&self, key: &str) -> Option<QueueEntry> {
        self.dequeue_command_at(key, Instant::now())
    }

    /// [`dequeue_command`](Self::dequeue_command) with an explicit clock reading.
    pub fn dequeue_command_at(&self, key: &str, now: Instant) -> Option<QueueEntry> {
        let mut state = self.state.lock();
        let backlog = state.commands.get_mut(key)?;

        // Entries are appended in time order with a constant TTL, so only a
        // prefix of the backlog can be stale.
        while backlog.front().is_some_and(|e| e.is_expired(now)) {
            backlog.pop_front();
        }

        let entry = backlog.pop_front();
        if backlog.is_empty() {
            state.commands.remove(key);
        }
        entry
    }

    /// Store the latest status for `key`, unconditionally replacing any
    /// previous entry regardless of whether it was read or has expired.
    pub fn put_status(&self, key: &str, sender: SenderDescriptor, payload: Vec<u8>) {
        self.put_status_at(key, sender, payload, Instant::now());
    }

    /// [`put_status`](Self::put_status) with an explicit clock reading.
    pub fn put_status_at(
        &self,
        key: &str,
        sender: SenderDescriptor,
        payload: Vec<u8>,
        now: Instant,
    ) {
        let entry = QueueEntry::new(payload, sender, now, self.ttl);
        self.state.lock().statuses.insert(key.to_string(), entry);
    }

    /// Remove and return the pending status for `key`, if present and unexpired.
    ///
    /// Delete-on-read: a second immediate call returns `None` until a new
    /// status arrives. The consumer's read doubles as the "I saw it" signal,
    /// which means two concurrent pollers of the same key can never both
    /// observe one status update. An expired entry is deleted without being
    /// returned.
    pub fn take_status(&self, key: &str) -> Option<QueueEntry> {
        self.take_status_at(key, Instant::now())
    }

    /// [`take_status`](Self::take_status) with an explicit clock reading.
    pub fn take_status_at(&self, key: &str, now: Instant) -> Option<QueueEntry> {
        let entry = self.state.lock().statuses.remove(key)?;
        if entry.is_expired(now) {
            return None;
        }
        Some(entry)
    }

    /// Current queue counters (full traversal; safe alongside mutations).
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            controllers_with_backlog: state.commands.len(),
            queued_commands: state.commands.values().map(VecDeque::len).sum(),
            controllers_with_pending_status: state.statuses.len(),
        }
    }

    /// Remove every expired entry from both maps.
    ///
    /// Unlike the read paths, this is a global catch-up pass: it scans whole
    /// backlogs rather than stale prefixes and drops keys left empty. It is
    /// the only mechanism that reclaims memory for keys nobody polls again.
    pub fn sweep_expired(&self) -> SweepStats {
        self.sweep_expired_at(Instant::now())
    }

    /// [`sweep_expired`](Self::sweep_expired) with an explicit clock reading.
    pub fn sweep_expired_at(&self, now: Instant) -> SweepStats {
        let mut state = self.state.lock();
        let mut stats = SweepStats::default();

        state.commands.retain(|_, backlog| {
            let before = backlog.len();
            backlog.retain(|entry| !entry.is_expired(now));
            stats.expired_commands += before - backlog.len();
            !backlog.is_empty()
        });

        let before = state.statuses.len();
        state.statuses.retain(|_, entry| !entry.is_expired(now));
        stats.expired_statuses = before - state.statuses.len();

        if stats.expired_commands > 0 || stats.expired_statuses > 0 {
            trace!(
                expired_commands = stats.expired_commands,
                expired_statuses = stats.expired_statuses,
                "removed expired queue entries"
            );
        }
        stats
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new(&QueueConfig::default())
    }
}
