//! Selection tracking across the furniture and drawing collections.
//!
//! A selection is an ordered set of `(id, kind)` pairs. Single-select
//! replaces the whole set; additive (shift-click) select toggles membership.
//! Insertion order is kept so collaborators that only understand a single
//! selected object per kind can ask for the most recently selected one.

use crate::types::{EntityId, EntityKind};

/// A selected entity reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedRef {
    /// The entity's id.
    pub id: EntityId,
    /// Which collection it belongs to.
    pub kind: EntityKind,
}

/// The current selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    // Ordered by insertion time; a pair appears at most once.
    items: Vec<SelectedRef>,
}

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects an entity.
    ///
    /// Non-additive select collapses the set to just this entity. Additive
    /// select toggles: an already-selected entity is removed, an unselected
    /// one is appended.
    pub fn select(&mut self, id: EntityId, kind: EntityKind, additive: bool) {
        let entry = SelectedRef { id, kind };
        if !additive {
            self.items.clear();
            self.items.push(entry);
            return;
        }
        if let Some(pos) = self.items.iter().position(|s| *s == entry) {
            self.items.remove(pos);
        } else {
            self.items.push(entry);
        }
    }

    /// Removes an entity from the selection if present (used when an entity
    /// is deleted out from under the selection).
    pub fn remove(&mut self, id: EntityId) {
        self.items.retain(|s| s.id != id);
    }

    /// Empties the selection.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Whether the given entity is selected.
    pub fn contains(&self, id: EntityId) -> bool {
        self.items.iter().any(|s| s.id == id)
    }

    /// All selected references in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SelectedRef> {
        self.items.iter()
    }

    /// Number of selected entities.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The single selected entity, if exactly one is selected.
    pub fn single(&self) -> Option<SelectedRef> {
        match self.items.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// The most recently selected entity of the given kind, if any.
    /// Derived from insertion order; legacy single-selection collaborators
    /// read this instead of the full set.
    pub fn last_selected(&self, kind: EntityKind) -> Option<EntityId> {
        self.items.iter().rev().find(|s| s.kind == kind).map(|s| s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_single_select_collapses_to_singleton() {
        let mut sel = Selection::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        sel.select(a, EntityKind::Furniture, false);
        sel.select(b, EntityKind::Drawing, true);
        assert_eq!(sel.len(), 2);

        sel.select(a, EntityKind::Furniture, false);
        assert_eq!(sel.len(), 1);
        assert!(sel.contains(a));
        assert!(!sel.contains(b));
    }

    #[test]
    fn test_additive_select_toggles_membership() {
        let mut sel = Selection::new();
        let a = Uuid::new_v4();

        sel.select(a, EntityKind::Drawing, true);
        assert!(sel.contains(a));

        sel.select(a, EntityKind::Drawing, true);
        assert!(!sel.contains(a));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_pair_appears_at_most_once() {
        let mut sel = Selection::new();
        let a = Uuid::new_v4();
        sel.select(a, EntityKind::Furniture, true);
        sel.select(a, EntityKind::Furniture, true);
        sel.select(a, EntityKind::Furniture, true);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn test_last_selected_per_kind_follows_insertion_order() {
        let mut sel = Selection::new();
        let f1 = Uuid::new_v4();
        let f2 = Uuid::new_v4();
        let d1 = Uuid::new_v4();

        sel.select(f1, EntityKind::Furniture, true);
        sel.select(d1, EntityKind::Drawing, true);
        sel.select(f2, EntityKind::Furniture, true);

        assert_eq!(sel.last_selected(EntityKind::Furniture), Some(f2));
        assert_eq!(sel.last_selected(EntityKind::Drawing), Some(d1));

        // Toggling f2 off falls back to f1
        sel.select(f2, EntityKind::Furniture, true);
        assert_eq!(sel.last_selected(EntityKind::Furniture), Some(f1));
    }

    #[test]
    fn test_remove_deleted_entity() {
        let mut sel = Selection::new();
        let a = Uuid::new_v4();
        sel.select(a, EntityKind::Furniture, false);
        sel.remove(a);
        assert!(sel.is_empty());
        assert_eq!(sel.single(), None);
    }
}
