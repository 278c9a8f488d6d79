//! The permission matrix — pure lookup tables from roles and access
//! levels to permission masks.
//!
//! These are allocation-free O(1) functions with no I/O, kept separate
//! from the waterfall so they can be unit-tested in isolation.

use planhub_entity::access::AccessLevel;
use planhub_entity::permission::Permission;
use planhub_entity::role::WorkspaceRole;

/// Map a workspace role to the permission set it implies.
pub fn role_permissions(role: WorkspaceRole) -> Permission {
    match role {
        WorkspaceRole::Owner => Permission::all(),
        WorkspaceRole::Admin => Permission::CONTENT
            | Permission::MANAGE_SETTINGS
            | Permission::INVITE_MEMBER
            | Permission::REMOVE_MEMBER
            | Permission::MANAGE_GRANTS,
        WorkspaceRole::Member => Permission::VIEW
            | Permission::CREATE
            | Permission::EDIT
            | Permission::COMMENT
            | Permission::UPLOAD_ATTACHMENT,
        WorkspaceRole::Guest => Permission::VIEW,
        WorkspaceRole::None => Permission::empty(),
    }
}

/// Map an explicit access level to the permission set it implies.
///
/// An `Editor` may delete only entities they created; that is the one
/// place creator state changes a mask, and it applies uniformly at every
/// layer.
pub fn access_permissions(level: AccessLevel, is_creator: bool) -> Permission {
    match level {
        AccessLevel::Manager => Permission::CONTENT,
        AccessLevel::Editor => {
            let base = Permission::VIEW
                | Permission::CREATE
                | Permission::EDIT
                | Permission::COMMENT
                | Permission::UPLOAD_ATTACHMENT;
            if is_creator {
                base | Permission::DELETE
            } else {
                base
            }
        }
        AccessLevel::Viewer => Permission::VIEW,
    }
}

/// Whether `role` allows every action in `required`.
pub fn role_can(role: WorkspaceRole, required: Permission) -> bool {
    role_permissions(role).allows(required)
}

/// Whether `level` allows every action in `required`.
pub fn access_can(level: AccessLevel, required: Permission, is_creator: bool) -> bool {
    access_permissions(level, is_creator).allows(required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_has_everything() {
        assert_eq!(role_permissions(WorkspaceRole::Owner), Permission::all());
        assert!(role_can(WorkspaceRole::Owner, Permission::MANAGE_ROLES));
    }

    #[test]
    fn test_admin_is_not_full() {
        let admin = role_permissions(WorkspaceRole::Admin);
        assert!(admin.contains(Permission::DELETE));
        assert!(admin.contains(Permission::REMOVE_MEMBER));
        assert!(!admin.contains(Permission::MANAGE_ROLES));
    }

    #[test]
    fn test_member_cannot_delete() {
        assert!(role_can(WorkspaceRole::Member, Permission::EDIT));
        assert!(!role_can(WorkspaceRole::Member, Permission::DELETE));
    }

    #[test]
    fn test_guest_view_only() {
        assert_eq!(role_permissions(WorkspaceRole::Guest), Permission::VIEW);
        assert!(!role_can(WorkspaceRole::Guest, Permission::COMMENT));
    }

    #[test]
    fn test_none_is_empty() {
        assert_eq!(role_permissions(WorkspaceRole::None), Permission::empty());
    }

    #[test]
    fn test_manager_includes_delete() {
        assert!(access_can(AccessLevel::Manager, Permission::DELETE, false));
        assert!(access_can(AccessLevel::Manager, Permission::ARCHIVE, false));
        assert!(!access_can(
            AccessLevel::Manager,
            Permission::MANAGE_ROLES,
            false
        ));
    }

    #[test]
    fn test_editor_delete_only_as_creator() {
        assert!(!access_can(AccessLevel::Editor, Permission::DELETE, false));
        assert!(access_can(AccessLevel::Editor, Permission::DELETE, true));
        assert!(access_can(AccessLevel::Editor, Permission::EDIT, false));
    }

    #[test]
    fn test_viewer_view_only() {
        assert!(access_can(AccessLevel::Viewer, Permission::VIEW, false));
        assert!(!access_can(AccessLevel::Viewer, Permission::EDIT, true));
    }
}
