//! Message queue module
//!
//! Provides the in-memory store-and-forward queues for both relay directions.

mod engine;

pub use engine::{EnqueueOutcome, MessageQueue, QueueStats, SweepStats};
