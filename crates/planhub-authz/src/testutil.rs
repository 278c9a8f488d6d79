//! In-memory store fakes backing the engine-level tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use planhub_core::result::AppResult;
use planhub_entity::access::{AccessGrant, AccessLevel};
use planhub_entity::chat::{ChatMemberState, ChatRoomRole};
use planhub_entity::hierarchy::HierarchyRecord;
use planhub_entity::layer::EntityLayer;
use planhub_entity::role::{Membership, MembershipStatus, WorkspaceRole};

use crate::store::{ChatStore, GrantStore, HierarchyStore, MembershipStore, NewGrant};

struct StoredGrant {
    level: AccessLevel,
    expires_at: Option<DateTime<Utc>>,
}

/// One fake implementing all four store ports, with call counters so
/// tests can assert cache hit behavior.
#[derive(Default)]
pub(crate) struct FakeStores {
    nodes: Mutex<HashMap<Uuid, HierarchyRecord>>,
    memberships: Mutex<HashMap<(Uuid, Uuid), Membership>>,
    grants: Mutex<HashMap<(Uuid, Uuid), StoredGrant>>,
    chat: Mutex<HashMap<(Uuid, Uuid), ChatMemberState>>,
    pub membership_fetches: AtomicUsize,
    pub grant_fetches: AtomicUsize,
}

impl FakeStores {
    fn insert_node(&self, record: HierarchyRecord) -> Uuid {
        let id = record.id;
        self.nodes.lock().unwrap().insert(id, record);
        id
    }

    pub fn add_workspace(&self, creator_id: Uuid) -> Uuid {
        self.insert_node(HierarchyRecord {
            id: Uuid::new_v4(),
            layer: EntityLayer::Workspace,
            is_private: false,
            parent_id: None,
            parent_layer: None,
            creator_id,
            is_archived: false,
        })
    }

    pub fn add_space(&self, workspace_id: Uuid, is_private: bool) -> Uuid {
        self.insert_node(HierarchyRecord {
            id: Uuid::new_v4(),
            layer: EntityLayer::Space,
            is_private,
            parent_id: Some(workspace_id),
            parent_layer: Some(EntityLayer::Workspace),
            creator_id: Uuid::new_v4(),
            is_archived: false,
        })
    }

    pub fn add_folder(&self, space_id: Uuid, is_private: bool) -> Uuid {
        self.insert_node(HierarchyRecord {
            id: Uuid::new_v4(),
            layer: EntityLayer::Folder,
            is_private,
            parent_id: Some(space_id),
            parent_layer: Some(EntityLayer::Space),
            creator_id: Uuid::new_v4(),
            is_archived: false,
        })
    }

    pub fn add_list(&self, space_id: Uuid, folder_id: Option<Uuid>, is_private: bool) -> Uuid {
        let (parent_id, parent_layer) = match folder_id {
            Some(folder) => (folder, EntityLayer::Folder),
            None => (space_id, EntityLayer::Space),
        };
        self.insert_node(HierarchyRecord {
            id: Uuid::new_v4(),
            layer: EntityLayer::List,
            is_private,
            parent_id: Some(parent_id),
            parent_layer: Some(parent_layer),
            creator_id: Uuid::new_v4(),
            is_archived: false,
        })
    }

    pub fn add_task(&self, list_id: Uuid, creator_id: Uuid) -> Uuid {
        self.insert_node(HierarchyRecord {
            id: Uuid::new_v4(),
            layer: EntityLayer::Task,
            is_private: false,
            parent_id: Some(list_id),
            parent_layer: Some(EntityLayer::List),
            creator_id,
            is_archived: false,
        })
    }

    pub fn add_chat_room(&self, workspace_id: Uuid, is_private: bool) -> Uuid {
        self.insert_node(HierarchyRecord {
            id: Uuid::new_v4(),
            layer: EntityLayer::ChatRoom,
            is_private,
            parent_id: Some(workspace_id),
            parent_layer: Some(EntityLayer::Workspace),
            creator_id: Uuid::new_v4(),
            is_archived: false,
        })
    }

    pub fn add_chat_message(&self, chat_room_id: Uuid, creator_id: Uuid) -> Uuid {
        self.insert_node(HierarchyRecord {
            id: Uuid::new_v4(),
            layer: EntityLayer::ChatMessage,
            is_private: false,
            parent_id: Some(chat_room_id),
            parent_layer: Some(EntityLayer::ChatRoom),
            creator_id,
            is_archived: false,
        })
    }

    pub fn add_member(&self, user_id: Uuid, workspace_id: Uuid, role: WorkspaceRole) {
        self.add_member_with_status(user_id, workspace_id, role, MembershipStatus::Active);
    }

    pub fn add_member_with_status(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        role: WorkspaceRole,
        status: MembershipStatus,
    ) {
        self.memberships.lock().unwrap().insert(
            (user_id, workspace_id),
            Membership {
                user_id,
                workspace_id,
                role,
                status,
                created_at: Utc::now(),
            },
        );
    }

    pub fn add_grant(&self, user_id: Uuid, entity_id: Uuid, level: AccessLevel) {
        self.grants.lock().unwrap().insert(
            (user_id, entity_id),
            StoredGrant {
                level,
                expires_at: None,
            },
        );
    }

    pub fn set_chat_state(
        &self,
        user_id: Uuid,
        chat_room_id: Uuid,
        is_banned: bool,
        muted_until: Option<DateTime<Utc>>,
    ) {
        self.chat.lock().unwrap().insert(
            (user_id, chat_room_id),
            ChatMemberState {
                chat_room_id,
                user_id,
                role: ChatRoomRole::Member,
                is_banned,
                muted_until,
            },
        );
    }

    pub fn grant_fetch_count(&self) -> usize {
        self.grant_fetches.load(Ordering::SeqCst)
    }

    pub fn membership_fetch_count(&self) -> usize {
        self.membership_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HierarchyStore for FakeStores {
    async fn get_nodes(
        &self,
        layer: EntityLayer,
        ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, HierarchyRecord>> {
        let nodes = self.nodes.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| nodes.get(id).filter(|r| r.layer == layer))
            .map(|r| (r.id, r.clone()))
            .collect())
    }
}

#[async_trait]
impl MembershipStore for FakeStores {
    async fn get_membership(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
    ) -> AppResult<Option<Membership>> {
        self.membership_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .get(&(user_id, workspace_id))
            .cloned())
    }
}

#[async_trait]
impl GrantStore for FakeStores {
    async fn get_grants(
        &self,
        user_id: Uuid,
        entity_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, AccessLevel>> {
        self.grant_fetches.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let grants = self.grants.lock().unwrap();
        Ok(entity_ids
            .iter()
            .filter_map(|id| {
                grants
                    .get(&(user_id, *id))
                    .filter(|g| g.expires_at.map(|exp| exp > now).unwrap_or(true))
                    .map(|g| (*id, g.level))
            })
            .collect())
    }

    async fn grant(&self, grant: NewGrant) -> AppResult<AccessGrant> {
        self.grants.lock().unwrap().insert(
            (grant.user_id, grant.entity_id),
            StoredGrant {
                level: grant.level,
                expires_at: grant.expires_at,
            },
        );
        Ok(AccessGrant {
            id: Uuid::new_v4(),
            entity_id: grant.entity_id,
            entity_layer: grant.entity_layer,
            user_id: grant.user_id,
            level: grant.level,
            granted_by: grant.granted_by,
            expires_at: grant.expires_at,
            created_at: Utc::now(),
        })
    }

    async fn revoke(
        &self,
        entity_id: Uuid,
        _entity_layer: EntityLayer,
        user_id: Uuid,
    ) -> AppResult<bool> {
        Ok(self
            .grants
            .lock()
            .unwrap()
            .remove(&(user_id, entity_id))
            .is_some())
    }
}

#[async_trait]
impl ChatStore for FakeStores {
    async fn get_chat_state(
        &self,
        user_id: Uuid,
        chat_room_id: Uuid,
    ) -> AppResult<Option<ChatMemberState>> {
        Ok(self
            .chat
            .lock()
            .unwrap()
            .get(&(user_id, chat_room_id))
            .cloned())
    }
}
