//! Relay service facade
//!
//! Wires the rate limiter, the message queues, and the association store
//! into the request-level operations the routing layer drives.

use crate::associations::AssociationStore;
use crate::config::RelayConfig;
use crate::message::{QueueEntry, SenderDescriptor};
use crate::queue::{EnqueueOutcome, MessageQueue, QueueStats, SweepStats};
use crate::ratelimit::{RateLimiter, RateLimiterStats};

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of a message submission (command enqueue or status report)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was accepted.
    Accepted,
    /// The request exceeded the sliding-window budget for `key`.
    RateLimited { key: String },
    /// The controller's command backlog is at its configured cap.
    BacklogFull { limit: usize },
}

/// Outcome of a poll (command dequeue or status take)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The earliest command, or the pending status, for the polled key.
    Delivered(QueueEntry),
    /// Nothing pending: the key is unknown, drained, or held only expired
    /// entries. Callers cannot tell these cases apart.
    Empty,
    /// The request exceeded the sliding-window budget for `key`.
    RateLimited { key: String },
}

/// Combined health counters for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    /// Message queue counters.
    pub queue: QueueStats,
    /// Rate limiter counters.
    pub rate_limiter: RateLimiterStats,
    /// Stored account associations.
    pub associations: usize,
}

/// Result of one sweep pass over both engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Expired entries removed from the queues.
    pub queue: SweepStats,
    /// Idle keys dropped from the rate limiter.
    pub idle_rate_keys: usize,
}

/// Store-and-forward relay service.
///
/// One instance per running server, created at startup and shared across all
/// request handlers. Controller keys and payloads pass through opaque: the
/// routing layer validates key format and interprets payload bytes, never
/// this service.
pub struct RelayService {
    queue: Arc<MessageQueue>,
    limiter: Arc<RateLimiter>,
    associations: AssociationStore,
}

impl RelayService {
    /// Create a relay service with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(RelayConfig::default())
    }

    /// Create a relay service with the given configuration
    pub fn with_config(config: RelayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            queue: Arc::new(MessageQueue::new(&config.queue)),
            limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            associations: AssociationStore::new(),
        })
    }

    /// Queue a command from a mobile client for a controller.
    pub fn send_command(
        &self,
        controller_key: &str,
        sender: SenderDescriptor,
        payload: Vec<u8>,
    ) -> SendOutcome {
        let now = Instant::now();
        if let Some(key) = self.check_and_record(&sender, now) {
            info!(controller = %controller_key, key = %key, "command rate limited");
            return SendOutcome::RateLimited { key };
        }

        match self
            .queue
            .enqueue_command_at(controller_key, sender, payload, now)
        {
            EnqueueOutcome::Queued => {
                debug!(controller = %controller_key, "command queued");
                SendOutcome::Accepted
            }
            EnqueueOutcome::BacklogFull { limit } => {
                info!(controller = %controller_key, limit, "command backlog full");
                SendOutcome::BacklogFull { limit }
            }
        }
    }

    /// Deliver the earliest pending command to a polling controller.
    pub fn poll_command(&self, controller_key: &str, sender: &SenderDescriptor) -> PollOutcome {
        let now = Instant::now();
        if let Some(key) = self.check_and_record(sender, now) {
            info!(controller = %controller_key, key = %key, "command poll rate limited");
            return PollOutcome::RateLimited { key };
        }

        match self.queue.dequeue_command_at(controller_key, now) {
            Some(entry) => {
                debug!(controller = %controller_key, size = entry.payload.len(), "command delivered");
                PollOutcome::Delivered(entry)
            }
            None => PollOutcome::Empty,
        }
    }

    /// Record the latest status heartbeat from a controller.
    pub fn report_status(
        &self,
        controller_key: &str,
        sender: SenderDescriptor,
        payload: Vec<u8>,
    ) -> SendOutcome {
        let now = Instant::now();
        if let Some(key) = self.check_and_record(&sender, now) {
            info!(controller = %controller_key, key = %key, "status report rate limited");
            return SendOutcome::RateLimited { key };
        }

        self.queue
            .put_status_at(controller_key, sender, payload, now);
        debug!(controller = %controller_key, "status stored");
        SendOutcome::Accepted
    }

    /// Deliver the pending status to a polling mobile client.
    pub fn poll_status(&self, controller_key: &str, sender: &SenderDescriptor) -> PollOutcome {
        let now = Instant::now();
        if let Some(key) = self.check_and_record(sender, now) {
            info!(controller = %controller_key, key = %key, "status poll rate limited");
            return PollOutcome::RateLimited { key };
        }

        match self.queue.take_status_at(controller_key, now) {
            Some(entry) => {
                debug!(controller = %controller_key, size = entry.payload.len(), "status delivered");
                PollOutcome::Delivered(entry)
            }
            None => PollOutcome::Empty,
        }
    }

    /// The account to controller association store.
    pub fn associations(&self) -> &AssociationStore {
        &self.associations
    }

    /// Combined counters from all components (read-only, safe at any time).
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            queue: self.queue.stats(),
            rate_limiter: self.limiter.stats(),
            associations: self.associations.len(),
        }
    }

    /// One sweep pass over both engines; the background sweeper's entry point.
    pub fn sweep(&self) -> SweepReport {
        SweepReport {
            queue: self.queue.sweep_expired(),
            idle_rate_keys: self.limiter.sweep(),
        }
    }

    /// Rate-limit one logical request attributed to `sender`.
    ///
    /// Two keys are consulted: the account identity (when the request carried
    /// one) and the network source address. All keys are checked before any
    /// is recorded, so a denied request never consumes budget and an accepted
    /// one is counted exactly once per key. Returns the first key over its
    /// budget, or `None` when the request may proceed.
    fn check_and_record(&self, sender: &SenderDescriptor, now: Instant) -> Option<String> {
        let keys = rate_keys(sender);
        for key in &keys {
            if !self.limiter.is_allowed_at(key, now) {
                return Some(key.clone());
            }
        }
        for key in &keys {
            self.limiter.record_request_at(key, now);
        }
        None
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new().expect("Failed to create default RelayService")
    }
}

/// Rate-limit keys for a request from `sender`.
fn rate_keys(sender: &SenderDescriptor) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if let Some(identity) = &sender.identity {
        keys.push(format!("acct:{identity}"));
    }
    keys.push(format!("addr:{}", sender.source_addr));
    keys
}
