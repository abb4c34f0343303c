//! tenki-core
//!
//! Building blocks for a chat-command weather bot on a host that offers no
//! task queue: only a key/value cache with per-entry expiry, one-shot
//! clock triggers and a short-lived script lock. The broker turns those
//! three primitives into a deferred-job system; the rest is the command
//! surface around it.
//!
//! - **domain**: job records, lifecycle states, identifiers
//! - **ports**: the host primitives as injectable seams (Clock, CacheStore,
//!   TriggerScheduler, LockService)
//! - **impls**: in-memory adapters for development and tests
//! - **registry**: named job handlers the trigger scheduler can re-invoke
//! - **broker**: enqueue / dequeue / consume with sweeping and timeouts
//! - **dispatch**: slash-command verification, replay suppression, routing
//! - **jma**: weather-area hierarchy and overview forecast client

pub mod broker;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod impls;
pub mod jma;
pub mod ports;
pub mod registry;

pub use broker::{BrokerConfig, Consumed, Dequeued, DequeuedJob, JobBroker};
pub use error::BrokerError;
pub use registry::{HandlerRegistry, JobHandler};
