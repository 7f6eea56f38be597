//! An in-process, time-boxed cache with bounded capacity.
//!
//! # Features
//! - **TTL**: every entry carries a time-to-live; expired entries are never
//!   returned and are purged on the next touch or by the periodic sweep.
//! - **Eviction**: when an insert would exceed `max_entries`, a tenth of the
//!   capacity (at least one entry) is evicted in LRU or FIFO order.
//! - **Statistics**: cumulative hit/miss counters, hit rate, eviction counters
//!   and an optional serialized-size estimate of the stored values.
//! - **Owned sweeper**: the background sweep thread belongs to the cache and
//!   is stopped by [`Cache::destroy`] or when the last handle is dropped.

pub mod builder;
pub mod error;
pub mod handles;
pub mod metrics;
pub mod policy;

// Internal, crate-only modules
mod entry;
mod shared;
mod size;
mod store;
mod task;
mod time;

pub use builder::{CacheBuilder, CacheConfig, EvictionPolicy};
pub use entry::EntryInfo;
pub use error::BuildError;
pub use handles::Cache;
pub use metrics::CacheStats;
