//! Store-and-forward relay core for mobile clients and controller devices
//!
//! This crate buffers traffic between two classes of peer that cannot always
//! reach each other directly:
//!
//! - **Command queue**: FIFO per-controller backlog for mobile-to-controller
//!   commands, delivered at most once and in order
//! - **Status slot**: latest-wins heartbeat store for controller-to-mobile
//!   status, delete-on-read
//! - **TTL expiry**: every entry expires a fixed time after acceptance
//!   (11 minutes by default) and is treated as absent from that instant on
//! - **Rate limiting**: per-key sliding-window budget (25 requests per 30
//!   seconds by default) checked before any queue is touched
//! - **Background sweep**: periodic pass reclaiming expired entries and idle
//!   rate-limit keys for peers that never poll again
//!
//! # Architecture
//!
//! The crate is transport-agnostic. A routing layer (HTTP, whatever) owns
//! authentication, key validation, and payload interpretation; it hands this
//! core an opaque controller key, a [`message::SenderDescriptor`], and raw
//! payload bytes, and drives [`RelayService`]'s enqueue/poll operations. All
//! operations are synchronous, non-blocking, and in-memory; the only async
//! surface is the [`sweeper`] task.
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "queue": {
//!     "ttl-secs": 660,
//!     "max-backlog-per-controller": 64
//!   },
//!   "rate-limit": {
//!     "enabled": true,
//!     "window-secs": 30,
//!     "max-requests": 25
//!   },
//!   "sweep": {
//!     "interval-secs": 60
//!   }
//! }
//! ```

pub mod associations;
pub mod config;
pub mod message;
pub mod queue;
pub mod ratelimit;
pub mod service;
pub mod sweeper;

// Re-export main types
pub use config::RelayConfig;
pub use service::RelayService;
