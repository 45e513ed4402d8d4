//! Cache of decoded rasters, keyed by item id.
//!
//! An item's encoded asset never changes after creation, so the id is a
//! sufficient key. Decode failures are remembered so a broken asset is not
//! re-decoded every frame.

use crate::decode::{decode_asset, DecodedImage};
use moodboard_core::{Board, Item, ItemId, ItemKind};
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct RasterCache {
    entries: HashMap<ItemId, Option<DecodedImage>>,
}

impl RasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded raster for an image item, decoding on first use. Returns
    /// `None` for text items and for assets that failed to decode.
    pub fn get(&mut self, item: &Item) -> Option<&DecodedImage> {
        let ItemKind::Image { data, .. } = &item.kind else {
            return None;
        };
        self.entries
            .entry(item.id.clone())
            .or_insert_with(|| match decode_asset(data) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    log::warn!("failed to decode asset for item {}: {e}", item.id);
                    None
                }
            })
            .as_ref()
    }

    /// Drop entries for items no longer on the board.
    pub fn prune(&mut self, board: &Board) {
        let live: HashSet<ItemId> = board.items().iter().map(|item| item.id.clone()).collect();
        self.entries.retain(|id, _| live.contains(id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
