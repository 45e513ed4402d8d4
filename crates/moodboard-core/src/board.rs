//! The board: an ordered collection of placed items.
//!
//! Sequence position is the z-order (low to high); the last item paints
//! last and is hit-tested first. Order only ever changes through
//! manipulation, so the most recently touched item wins visually.

use crate::geometry;
use crate::item::{Item, ItemId};
use kurbo::Point;
use std::collections::HashSet;

/// Ordered scene model plus a generation counter for invalidating stale
/// asynchronous completions.
#[derive(Debug, Default)]
pub struct Board {
    items: Vec<Item>,
    epoch: u64,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items in paint order (back to front).
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current generation. Bumped whenever the scene is discarded
    /// wholesale, so in-flight asset loads can detect they are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Append an item as topmost and return its id.
    pub fn insert(&mut self, item: Item) -> ItemId {
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    /// Move an item to the top of the paint order. Returns false if the id
    /// is unknown.
    pub fn bring_to_front(&mut self, id: &ItemId) -> bool {
        match self.items.iter().position(|item| &item.id == id) {
            Some(index) => {
                let item = self.items.remove(index);
                self.items.push(item);
                true
            }
            None => false,
        }
    }

    /// Remove an item, returning it if present.
    pub fn remove(&mut self, id: &ItemId) -> Option<Item> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn find(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn find_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    /// Empty the board and start a new generation.
    pub fn clear(&mut self) {
        self.items.clear();
        self.epoch += 1;
    }

    /// Replace the whole scene (load or restore). Duplicate ids are dropped,
    /// keeping the first occurrence. Starts a new generation.
    pub fn replace_all(&mut self, items: Vec<Item>) {
        let mut seen = HashSet::new();
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        self.epoch += 1;
    }

    /// Topmost item whose body contains the point.
    pub fn topmost_at(&self, point: Point) -> Option<ItemId> {
        self.items
            .iter()
            .rev()
            .find(|item| geometry::contains_point(&item.frame, point))
            .map(|item| item.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::item::{FontWeight, Rgba};

    fn image_at(x: f64, y: f64, w: f64, h: f64) -> Item {
        Item::image("img", Frame::new(x, y, w, h), String::new(), None)
    }

    #[test]
    fn insert_appends_topmost() {
        let mut board = Board::new();
        let a = board.insert(image_at(0.0, 0.0, 100.0, 100.0));
        let b = board.insert(image_at(50.0, 50.0, 100.0, 100.0));
        assert_eq!(board.items()[0].id, a);
        assert_eq!(board.items()[1].id, b);
    }

    #[test]
    fn topmost_wins_hit_testing() {
        let mut board = Board::new();
        let a = board.insert(image_at(0.0, 0.0, 100.0, 100.0));
        let b = board.insert(image_at(50.0, 50.0, 100.0, 100.0));

        // Overlap region belongs to the later item.
        assert_eq!(board.topmost_at(Point::new(75.0, 75.0)), Some(b.clone()));
        // Region only covered by the first.
        assert_eq!(board.topmost_at(Point::new(25.0, 25.0)), Some(a.clone()));
        assert_eq!(board.topmost_at(Point::new(500.0, 500.0)), None);

        board.bring_to_front(&a);
        assert_eq!(board.topmost_at(Point::new(75.0, 75.0)), Some(a));
    }

    #[test]
    fn bring_to_front_reorders() {
        let mut board = Board::new();
        let a = board.insert(image_at(0.0, 0.0, 10.0, 10.0));
        let b = board.insert(image_at(0.0, 0.0, 10.0, 10.0));
        assert!(board.bring_to_front(&a));
        assert_eq!(board.items()[0].id, b);
        assert_eq!(board.items()[1].id, a);
        assert!(!board.bring_to_front(&ItemId::from("missing")));
    }

    #[test]
    fn remove_and_find() {
        let mut board = Board::new();
        let id = board.insert(image_at(0.0, 0.0, 10.0, 10.0));
        assert!(board.find(&id).is_some());
        assert!(board.remove(&id).is_some());
        assert!(board.find(&id).is_none());
        assert!(board.remove(&id).is_none());
    }

    #[test]
    fn clear_bumps_epoch() {
        let mut board = Board::new();
        board.insert(image_at(0.0, 0.0, 10.0, 10.0));
        let before = board.epoch();
        board.clear();
        assert!(board.is_empty());
        assert_eq!(board.epoch(), before + 1);
    }

    #[test]
    fn replace_all_dedups_keeping_first() {
        let mut board = Board::new();
        let first = image_at(0.0, 0.0, 10.0, 10.0);
        let mut dup = Item::text(
            Frame::new(5.0, 5.0, 20.0, 20.0),
            "dup",
            Rgba::BLACK,
            None,
            FontWeight::Normal,
        );
        dup.id = first.id.clone();
        let other = image_at(1.0, 1.0, 10.0, 10.0);

        board.replace_all(vec![first.clone(), dup, other]);
        assert_eq!(board.len(), 2);
        assert_eq!(board.items()[0], first);
    }

    #[test]
    fn replace_all_with_empty_clears() {
        let mut board = Board::new();
        board.insert(image_at(0.0, 0.0, 10.0, 10.0));
        let before = board.epoch();
        board.replace_all(Vec::new());
        assert!(board.is_empty());
        assert!(board.epoch() > before);
    }
}
