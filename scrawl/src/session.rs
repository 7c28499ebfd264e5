//! An in-memory store for annotations being edited.
//!
//! The store is an explicit value owned by the caller — one per editing
//! session, passed into the export by reference — rather than ambient
//! process-wide state. Items are recorded as `(page, item)` operations in
//! the order the user drew them, which is also the order they will render
//! in (later items paint on top).

use std::collections::BTreeMap;

use crate::model::CanvasItem;

/// One recorded drawing operation.
#[derive(Debug, Clone)]
pub struct SessionOp {
    /// The zero-based page the item targets.
    pub page: usize,
    /// The drawn item.
    pub item: CanvasItem,
}

/// The annotations of one editing session, with undo/redo.
#[derive(Debug, Clone, Default)]
pub struct Session {
    operations: Vec<SessionOp>,
    redo_stack: Vec<SessionOp>,
}

impl Session {
    /// Record a newly drawn item. Clears the redo stack.
    pub fn push(&mut self, page: usize, item: CanvasItem) {
        self.operations.push(SessionOp { page, item });
        self.redo_stack.clear();
    }

    /// Take back the most recent operation. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        if let Some(operation) = self.operations.pop() {
            self.redo_stack.push(operation);
            true
        } else {
            false
        }
    }

    /// Re-apply the most recently undone operation.
    pub fn redo(&mut self) -> bool {
        if let Some(operation) = self.redo_stack.pop() {
            self.operations.push(operation);
            true
        } else {
            false
        }
    }

    /// Remove every operation.
    pub fn clear(&mut self) {
        self.operations.clear();
        self.redo_stack.clear();
    }

    /// Remove every operation targeting one page. Clears the redo stack,
    /// since undo history for the page is gone with them.
    pub fn clear_page(&mut self, page: usize) {
        self.operations.retain(|op| op.page != page);
        self.redo_stack.clear();
    }

    /// Whether no operations are recorded.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Total number of recorded operations.
    pub fn item_count(&self) -> usize {
        self.operations.len()
    }

    /// Number of operations targeting one page.
    pub fn page_item_count(&self, page: usize) -> usize {
        self.operations.iter().filter(|op| op.page == page).count()
    }

    /// The items of one page in draw order.
    pub fn page_items(&self, page: usize) -> Vec<CanvasItem> {
        self.operations
            .iter()
            .filter(|op| op.page == page)
            .map(|op| op.item.clone())
            .collect()
    }

    /// All items grouped by page, each page's list in draw order.
    pub fn grouped(&self) -> BTreeMap<usize, Vec<CanvasItem>> {
        let mut grouped = BTreeMap::<usize, Vec<CanvasItem>>::new();
        for op in &self.operations {
            grouped.entry(op.page).or_default().push(op.item.clone());
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemStyle, LineItem};

    fn sample_item(x: f32) -> CanvasItem {
        CanvasItem::Line(LineItem {
            style: ItemStyle::default(),
            x1: x,
            y1: 0.0,
            x2: x + 1.0,
            y2: 1.0,
        })
    }

    #[test]
    fn undo_redo_roundtrip() {
        let mut session = Session::default();
        session.push(0, sample_item(1.0));
        session.push(0, sample_item(2.0));

        assert_eq!(session.item_count(), 2);
        assert!(session.undo());
        assert_eq!(session.item_count(), 1);
        assert!(session.redo());
        assert_eq!(session.item_count(), 2);
        assert!(!session.redo());
    }

    #[test]
    fn new_push_clears_redo_stack() {
        let mut session = Session::default();
        session.push(0, sample_item(1.0));
        assert!(session.undo());

        session.push(1, sample_item(2.0));
        assert!(!session.redo());
        assert_eq!(session.item_count(), 1);
    }

    #[test]
    fn grouping_preserves_page_buckets_and_order() {
        let mut session = Session::default();
        session.push(1, sample_item(1.0));
        session.push(0, sample_item(2.0));
        session.push(1, sample_item(3.0));

        let grouped = session.grouped();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&0].len(), 1);
        assert_eq!(grouped[&1].len(), 2);

        let CanvasItem::Line(first) = &grouped[&1][0] else {
            panic!("expected line");
        };
        assert_eq!(first.x1, 1.0);
    }

    #[test]
    fn clear_page_leaves_other_pages() {
        let mut session = Session::default();
        session.push(0, sample_item(1.0));
        session.push(1, sample_item(2.0));
        session.push(0, sample_item(3.0));

        session.clear_page(0);
        assert_eq!(session.page_item_count(0), 0);
        assert_eq!(session.page_item_count(1), 1);
        assert!(!session.is_empty());
    }
}
