//! # planhub-authz
//!
//! Hierarchical authorization resolution engine for PlanHub.
//!
//! Given a user and a target entity anywhere in the workspace containment
//! hierarchy, the engine decides what the user may do, accounting for
//! workspace-wide roles, explicit per-entity access grants, per-level
//! privacy flags, and creator/suspension/ban state — under a tag-aware
//! cache.
//!
//! Resolution order ("private-first waterfall"):
//! 1. Resolve the target's ancestor chain.
//! 2. Suspended or absent membership — deny outright.
//! 3. Adopt the nearest explicit grant along the chain; a private node
//!    without a grant at or above it blocks role-derived inheritance.
//! 4. Map the grant or the workspace role through the permission matrix;
//!    the workspace creator holds the full mask unconditionally.
//! 5. For chat targets, apply ban/mute adjustments.

pub mod batch;
pub mod engine;
pub mod grants;
pub mod matrix;
pub mod path;
pub mod store;
pub mod waterfall;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::PermissionEngine;
pub use grants::GrantService;
pub use store::{ChatStore, GrantStore, HierarchyStore, MembershipStore, NewGrant};
pub use waterfall::ResolvedPermission;
