use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Default number of results retained per worker and partition.
pub const MAX_RESULTS: usize = 500;

/// A min-heap that keeps only the `capacity` largest items pushed into it.
///
/// Every push goes onto the heap and, once the heap grows past capacity, the
/// smallest entry is evicted. Push is `O(log capacity)`.
#[derive(Debug, Clone)]
pub struct BoundedTopKHeap<T: Ord> {
    heap: BinaryHeap<Reverse<T>>,
    capacity: usize,
}

impl<T: Ord> BoundedTopKHeap<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        self.heap.push(Reverse(item));
        if self.heap.len() > self.capacity {
            self.heap.pop();
        }
    }

    /// The smallest retained entry, i.e. the next one to be evicted.
    pub fn peek_min(&self) -> Option<&T> {
        self.heap.peek().map(|Reverse(item)| item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Consumes the heap, yielding entries in ascending order.
    pub fn into_sorted_vec(self) -> Vec<T> {
        let mut items: Vec<T> = self.heap.into_iter().map(|Reverse(item)| item).collect();
        items.sort();
        items
    }
}
