//! # planhub-cache
//!
//! In-process permission cache for PlanHub, built on
//! [moka](https://crates.io/crates/moka) with per-entry TTLs and a
//! tag index for bulk invalidation.
//!
//! Cached values are advisory: correctness after a role or grant change
//! depends on the mutating caller invalidating the affected tags before
//! returning, not on expiry.

pub mod keys;
pub mod store;

pub use store::AuthzCache;
