use crate::draw::composite::RgbaBuffer;
use std::sync::Arc;

/// Linear undo/redo over immutable full-canvas snapshots.
///
/// `snapshots[0]` is always the pristine canvas and `cursor` always indexes
/// the snapshot on display. Entries past the cursor are the redo branch.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    snapshots: Vec<Arc<RgbaBuffer>>,
    cursor: usize,
}

impl SnapshotHistory {
    pub fn new(initial: Arc<RgbaBuffer>) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
        }
    }

    /// Drops the redo branch, appends `canvas` and moves the cursor onto it.
    pub fn commit(&mut self, canvas: Arc<RgbaBuffer>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(canvas);
        self.cursor = self.snapshots.len() - 1;
        debug_assert_eq!(
            self.cursor,
            self.snapshots.len() - 1,
            "history cursor must sit on the newest snapshot after commit"
        );
    }

    pub fn undo(&mut self) -> Option<Arc<RgbaBuffer>> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(Arc::clone(&self.snapshots[self.cursor]))
    }

    pub fn redo(&mut self) -> Option<Arc<RgbaBuffer>> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(Arc::clone(&self.snapshots[self.cursor]))
    }

    pub fn current(&self) -> Arc<RgbaBuffer> {
        Arc::clone(&self.snapshots[self.cursor])
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn snapshot(&self, index: usize) -> Option<&Arc<RgbaBuffer>> {
        self.snapshots.get(index)
    }
}
