//! Serializable references to content items for queued work.

use serde::{Deserialize, Serialize};

use crate::types::content_item::ItemKind;

/// Minimal reference used to re-fetch a full `ContentItem` for queued work.
///
/// Created by a save/delete hook or a bulk reindex trigger and consumed once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct IndexableItemDescriptor {
    pub item_id: u64,
    pub site_id: u64,
    pub kind: ItemKind,
}

impl IndexableItemDescriptor {
    pub fn new(item_id: u64, site_id: u64, kind: ItemKind) -> Self {
        Self {
            item_id,
            site_id,
            kind,
        }
    }
}
