//! Fingerprint cache for generated responses.
//!
//! Content-addressed: the key is the SHA-256 digest of the prompt text and
//! nothing else. Two requests that differ only in sampling parameters share
//! a cache entry.
//!
//! # Architecture
//!
//! The cache sits in [`Router`](crate::Router), in front of the provider
//! fallback chain. A hit bypasses provider selection, quota accounting and
//! retry logic entirely. Entries live in a [`KvStore`](crate::store::KvStore)
//! as JSON with the configured TTL; there is no explicit deletion path. A
//! lookup also checks `created_at` against the injected clock, so expiry is
//! deterministic under [`ManualClock`](crate::ManualClock).
//!
//! Store failures are soft: a failed read is a miss, a failed write only
//! loses the caching benefit.

mod fingerprint;

pub use fingerprint::{CacheConfig, CacheEntry, FingerprintCache, fingerprint};
