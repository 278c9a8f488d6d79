//! # planhub-entity
//!
//! Domain entity models and enums for PlanHub: containment layers,
//! workspace roles, access levels, the permission bitmask, hierarchy
//! path types, chat membership state, and the resolved permission
//! context.

pub mod access;
pub mod chat;
pub mod context;
pub mod hierarchy;
pub mod layer;
pub mod permission;
pub mod role;

pub use access::{AccessGrant, AccessLevel};
pub use chat::{ChatMemberState, ChatRoomRole};
pub use context::PermissionContext;
pub use hierarchy::{HierarchyNode, HierarchyPath, HierarchyRecord};
pub use layer::EntityLayer;
pub use permission::Permission;
pub use role::{Membership, MembershipStatus, WorkspaceRole};
