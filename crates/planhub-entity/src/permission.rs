//! Fine-grained permission action bitmask.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Fine-grained actions that can be checked against a resolved
    /// permission mask.
    ///
    /// Roles and access levels each map to a fixed subset through the
    /// permission matrix; callers check individual bits for UI gating
    /// and request authorization.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Permission: u32 {
        /// View the entity and its contents.
        const VIEW = 1 << 0;

        /// Create child entities (tasks in a list, messages in a room).
        const CREATE = 1 << 1;

        /// Edit the entity's fields.
        const EDIT = 1 << 2;

        /// Delete the entity.
        const DELETE = 1 << 3;

        /// Add comments.
        const COMMENT = 1 << 4;

        /// Attach files.
        const UPLOAD_ATTACHMENT = 1 << 5;

        /// Archive or unarchive the entity.
        const ARCHIVE = 1 << 6;

        /// Change entity settings (privacy flag, defaults).
        const MANAGE_SETTINGS = 1 << 7;

        /// Invite members to the workspace or entity.
        const INVITE_MEMBER = 1 << 8;

        /// Remove members.
        const REMOVE_MEMBER = 1 << 9;

        /// Change workspace roles.
        const MANAGE_ROLES = 1 << 10;

        /// Create and revoke access grants.
        const MANAGE_GRANTS = 1 << 11;
    }
}

impl Permission {
    /// Content actions: everything a project member does day to day,
    /// without administrative bits.
    pub const CONTENT: Permission = Permission::VIEW
        .union(Permission::CREATE)
        .union(Permission::EDIT)
        .union(Permission::DELETE)
        .union(Permission::COMMENT)
        .union(Permission::UPLOAD_ATTACHMENT)
        .union(Permission::ARCHIVE);

    /// Write actions: everything except viewing. A chat ban strips these.
    pub const WRITE: Permission = Permission::all().difference(Permission::VIEW);

    /// Whether the mask allows every action in `required`.
    pub fn allows(&self, required: Permission) -> bool {
        self.contains(required)
    }
}
