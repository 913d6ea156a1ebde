//! Snapshot-based undo/redo history.
//!
//! The history is a bounded linear list of full-document snapshots with a
//! cursor. Saving after an undo discards the truncated future — redo is
//! gone once a new edit happens at an earlier point. Undo at the start and
//! redo at the end are no-ops, not errors; these are common user actions.

use crate::constants::MAX_HISTORY_SNAPSHOTS;
use crate::types::{Entity, EntityId, Layer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A deep copy of the document's mutable state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// All entities, keyed by id.
    pub entities: HashMap<EntityId, Entity>,
    /// All layers.
    pub layers: Vec<Layer>,
}

/// Bounded linear history with a cursor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct History {
    #[serde(skip)]
    snapshots: Vec<Snapshot>,
    #[serde(skip)]
    cursor: usize,
}

impl History {
    /// Creates a history seeded with the document's initial state so the
    /// very first edit can be undone back to it.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    /// Records a new snapshot after an edit.
    ///
    /// Truncates everything past the cursor first (branch discard), then
    /// appends and advances. Evicts the oldest snapshot once the cap is
    /// exceeded. Identical consecutive snapshots are skipped so a drag that
    /// ends where it started does not pollute the history.
    pub fn save(&mut self, snapshot: Snapshot) {
        if self.snapshots.get(self.cursor) == Some(&snapshot) {
            return;
        }
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        self.cursor += 1;

        if self.snapshots.len() > MAX_HISTORY_SNAPSHOTS {
            self.snapshots.remove(0);
            self.cursor -= 1;
        }
    }

    /// Steps the cursor back and returns the snapshot to restore, or `None`
    /// when already at the beginning.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    /// Steps the cursor forward and returns the snapshot to restore, or
    /// `None` when already at the end.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    /// Whether an undo step is available.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Whether a redo step is available.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Drops all history and reseeds with the given state. Used when a new
    /// document is loaded.
    pub fn reset(&mut self, initial: Snapshot) {
        self.snapshots = vec![initial];
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntityKind, Shape};

    fn snapshot_with_rect_at(x: f32) -> Snapshot {
        let layer = Layer::new("Base".into(), 0.0);
        let entity = Entity::new(
            "Box".into(),
            EntityKind::Furniture,
            Shape::Rect {
                x,
                y: 0.0,
                width: 200.0,
                height: 100.0,
            },
            layer.id,
        );
        let mut entities = HashMap::new();
        entities.insert(entity.id, entity);
        Snapshot {
            entities,
            layers: vec![layer],
        }
    }

    fn rect_x(s: &Snapshot) -> f32 {
        let e = s.entities.values().next().unwrap();
        match e.shape {
            Shape::Rect { x, .. } => x,
            _ => panic!("expected rect"),
        }
    }

    #[test]
    fn test_undo_restores_previous_snapshot() {
        let mut h = History::new(snapshot_with_rect_at(0.0));
        h.save(snapshot_with_rect_at(100.0));

        assert!(h.can_undo());
        let restored = h.undo().unwrap();
        assert_eq!(rect_x(restored), 0.0);
        assert!(!h.can_undo());
        assert!(h.can_redo());
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let mut h = History::new(snapshot_with_rect_at(0.0));
        assert!(h.undo().is_none());
        assert!(h.undo().is_none());
    }

    #[test]
    fn test_redo_at_end_is_noop() {
        let mut h = History::new(snapshot_with_rect_at(0.0));
        h.save(snapshot_with_rect_at(100.0));
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_branch_discard_kills_redo() {
        // States [A, B, C]; undo twice to A; save D; redo must be a no-op.
        let mut h = History::new(snapshot_with_rect_at(0.0)); // A
        h.save(snapshot_with_rect_at(1.0)); // B
        h.save(snapshot_with_rect_at(2.0)); // C

        h.undo();
        h.undo();
        h.save(snapshot_with_rect_at(9.0)); // D

        assert!(h.redo().is_none());
        let restored = h.undo().unwrap();
        assert_eq!(rect_x(restored), 0.0); // back to A, not B
    }

    #[test]
    fn test_identical_snapshot_is_not_recorded() {
        let mut h = History::new(snapshot_with_rect_at(0.0));
        let snap = snapshot_with_rect_at(100.0);
        h.save(snap.clone());
        h.save(snap);

        // Only one real edit was recorded.
        let mut depth = 0;
        while h.undo().is_some() {
            depth += 1;
        }
        assert_eq!(depth, 1);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut h = History::new(snapshot_with_rect_at(0.0));
        let total = MAX_HISTORY_SNAPSHOTS * 2;
        for i in 1..=total {
            h.save(snapshot_with_rect_at(i as f32));
        }

        // Walk back as far as possible; the original state (x = 0) must have
        // been evicted, and the earliest reachable one sits a full cap behind
        // the latest edit.
        let mut earliest = None;
        while let Some(s) = h.undo() {
            earliest = Some(rect_x(s));
        }
        let expected = (total - (MAX_HISTORY_SNAPSHOTS - 1)) as f32;
        assert_eq!(earliest, Some(expected));
    }
}
