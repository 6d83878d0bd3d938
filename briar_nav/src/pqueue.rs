// Indexed min-heap keyed by f32 priority.
//
// Dijkstra's relaxation loop re-keys queue entries constantly, so the queue
// must support update-priority in O(log n) — a plain `BinaryHeap` would
// force remove+reinsert at O(n). This heap keeps a positions table mapping
// item id -> heap slot, giving O(1) membership tests and O(log n) re-keying
// (sift in whichever direction the new priority demands).
//
// Item ids are dense `usize` handles (node-table indices). Priorities are
// `f32` ordered with `total_cmp`; ties are broken arbitrarily by heap
// layout, which callers must not rely on.
//
// See also: `search.rs`, the only consumer.

/// Binary min-heap over dense item ids with priority re-keying.
#[derive(Clone, Debug)]
pub struct IndexedMinHeap {
    /// Heap array of item ids; `heap[0]` has the minimum priority.
    heap: Vec<usize>,
    /// positions[id] = slot in `heap`, or None when not enqueued.
    positions: Vec<Option<usize>>,
    /// priorities[id] = current priority (meaningful while enqueued).
    priorities: Vec<f32>,
}

impl IndexedMinHeap {
    /// An empty heap able to hold ids `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
            priorities: vec![0.0; capacity],
        }
    }

    /// A heap pre-filled with every id in `0..count` at `priority`.
    ///
    /// Equal priorities mean the array is already heap-ordered.
    pub fn filled(count: usize, priority: f32) -> Self {
        Self {
            heap: (0..count).collect(),
            positions: (0..count).map(Some).collect(),
            priorities: vec![priority; count],
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// True if `id` is currently enqueued.
    pub fn contains(&self, id: usize) -> bool {
        id < self.positions.len() && self.positions[id].is_some()
    }

    /// Current priority of an enqueued id. Callers check `contains` first.
    pub fn priority_of(&self, id: usize) -> f32 {
        debug_assert!(self.contains(id), "priority_of: id {id} not enqueued");
        self.priorities[id]
    }

    /// Insert an id that is not currently enqueued.
    pub fn insert(&mut self, id: usize, priority: f32) {
        assert!(!self.contains(id), "insert: id {id} already enqueued");
        self.priorities[id] = priority;
        let slot = self.heap.len();
        self.heap.push(id);
        self.positions[id] = Some(slot);
        self.sift_up(slot);
    }

    /// Re-key an enqueued id, restoring heap order in O(log n).
    /// No-op if the id is not enqueued.
    pub fn update_priority(&mut self, id: usize, priority: f32) {
        let Some(slot) = self.positions.get(id).copied().flatten() else {
            return;
        };
        self.priorities[id] = priority;
        self.sift_up(slot);
        if let Some(slot) = self.positions[id] {
            self.sift_down(slot);
        }
    }

    /// Pop the minimum-priority id.
    pub fn pop(&mut self) -> Option<(usize, f32)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap_slots(0, last);
        let id = self.heap.pop()?;
        self.positions[id] = None;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((id, self.priorities[id]))
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.priorities[self.heap[a]].total_cmp(&self.priorities[self.heap[b]])
            == std::cmp::Ordering::Less
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a]] = Some(a);
        self.positions[self.heap[b]] = Some(b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.less(slot, parent) {
                self.swap_slots(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < self.heap.len() && self.less(right, left) {
                smallest = right;
            }
            if self.less(smallest, slot) {
                self.swap_slots(slot, smallest);
                slot = smallest;
            } else {
                break;
            }
        }
    }
}
