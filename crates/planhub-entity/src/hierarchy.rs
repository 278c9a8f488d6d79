//! Hierarchy path types produced by the path resolver.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::layer::EntityLayer;

/// Raw hierarchy record as read from the hierarchy store.
///
/// One row per entity, regardless of layer. A task never carries its own
/// privacy flag; the store reports `is_private = false` for tasks and the
/// list's flag blocks during the ancestor walk instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyRecord {
    /// Entity identifier.
    pub id: Uuid,
    /// Layer of the entity.
    pub layer: EntityLayer,
    /// Privacy flag; always false for workspaces and tasks.
    pub is_private: bool,
    /// Direct parent, None only for workspaces.
    pub parent_id: Option<Uuid>,
    /// Layer of the direct parent.
    pub parent_layer: Option<EntityLayer>,
    /// User who created the entity.
    pub creator_id: Uuid,
    /// Whether the entity is archived.
    pub is_archived: bool,
}

/// One resolved node in an ancestor chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Entity identifier.
    pub id: Uuid,
    /// Layer of the entity.
    pub layer: EntityLayer,
    /// Privacy flag.
    pub is_private: bool,
    /// Direct parent, None for the workspace root.
    pub parent_id: Option<Uuid>,
    /// Layer of the direct parent.
    pub parent_layer: Option<EntityLayer>,
}

impl HierarchyNode {
    /// Build a node from a raw store record.
    pub fn from_record(record: &HierarchyRecord) -> Self {
        Self {
            id: record.id,
            layer: record.layer,
            is_private: record.is_private,
            parent_id: record.parent_id,
            parent_layer: record.parent_layer,
        }
    }
}

/// Full ancestor chain for a target entity, nearest ancestor first.
///
/// For a workspace target the ancestor list is empty and `workspace_id`
/// equals `target_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyPath {
    /// The target entity.
    pub target_id: Uuid,
    /// Layer of the target.
    pub target_layer: EntityLayer,
    /// Privacy flag of the target itself.
    pub target_is_private: bool,
    /// User who created the target.
    pub target_creator_id: Uuid,
    /// Whether the target is archived.
    pub target_is_archived: bool,
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// User who created the owning workspace.
    pub workspace_creator_id: Uuid,
    /// Ancestors from the direct parent up to and including the workspace.
    pub ancestors: Vec<HierarchyNode>,
}

impl HierarchyPath {
    /// All entity ids in the chain: the target first, then ancestors
    /// nearest to farthest. This is the key set for the batched grant fetch.
    pub fn chain_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(1 + self.ancestors.len());
        ids.push(self.target_id);
        ids.extend(self.ancestors.iter().map(|node| node.id));
        ids
    }

    /// The chat room in this chain, if the target is a chat entity.
    pub fn chat_room_id(&self) -> Option<Uuid> {
        match self.target_layer {
            EntityLayer::ChatRoom => Some(self.target_id),
            EntityLayer::ChatMessage => self
                .ancestors
                .iter()
                .find(|node| node.layer == EntityLayer::ChatRoom)
                .map(|node| node.id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(layer: EntityLayer) -> HierarchyNode {
        HierarchyNode {
            id: Uuid::new_v4(),
            layer,
            is_private: false,
            parent_id: None,
            parent_layer: None,
        }
    }

    #[test]
    fn test_chain_ids_order() {
        let target = Uuid::new_v4();
        let list = node(EntityLayer::List);
        let space = node(EntityLayer::Space);
        let ws = node(EntityLayer::Workspace);
        let path = HierarchyPath {
            target_id: target,
            target_layer: EntityLayer::Task,
            target_is_private: false,
            target_creator_id: Uuid::new_v4(),
            target_is_archived: false,
            workspace_id: ws.id,
            workspace_creator_id: Uuid::new_v4(),
            ancestors: vec![list.clone(), space.clone(), ws.clone()],
        };
        assert_eq!(path.chain_ids(), vec![target, list.id, space.id, ws.id]);
    }

    #[test]
    fn test_chat_room_id() {
        let room = node(EntityLayer::ChatRoom);
        let ws = node(EntityLayer::Workspace);
        let message = Uuid::new_v4();
        let path = HierarchyPath {
            target_id: message,
            target_layer: EntityLayer::ChatMessage,
            target_is_private: false,
            target_creator_id: Uuid::new_v4(),
            target_is_archived: false,
            workspace_id: ws.id,
            workspace_creator_id: Uuid::new_v4(),
            ancestors: vec![room.clone(), ws],
        };
        assert_eq!(path.chat_room_id(), Some(room.id));

        let room_path = HierarchyPath {
            target_id: room.id,
            target_layer: EntityLayer::ChatRoom,
            ..path
        };
        assert_eq!(room_path.chat_room_id(), Some(room.id));
    }
}
