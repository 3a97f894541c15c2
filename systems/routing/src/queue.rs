//! Frontier queues shared by every route query.

use civitas_core::{Grid, GridOffset, GRID_CELLS};

/// Bounded FIFO ring buffer driving breadth-first flood fills.
///
/// Capacity equals the number of grid tiles. A flood enqueues every tile at
/// most once, and drag re-pushes follow a pop, so the ring never overruns.
#[derive(Debug)]
pub(crate) struct RingQueue {
    items: Vec<GridOffset>,
    head: usize,
    tail: usize,
}

impl RingQueue {
    pub(crate) fn new() -> Self {
        Self {
            items: vec![GridOffset::new(0); GRID_CELLS],
            head: 0,
            tail: 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    pub(crate) fn push(&mut self, offset: GridOffset) {
        self.items[self.tail] = offset;
        self.tail += 1;
        if self.tail >= self.items.len() {
            self.tail = 0;
        }
    }

    pub(crate) fn pop(&mut self) -> Option<GridOffset> {
        if self.head == self.tail {
            return None;
        }
        let offset = self.items[self.head];
        self.head += 1;
        if self.head >= self.items.len() {
            self.head = 0;
        }
        Some(offset)
    }
}

/// Array-backed binary min-heap of offsets keyed by an external priority grid.
///
/// Priorities live in the distance field's `possible` grid; the heap only
/// orders offsets. `positions` maps an offset to its slot plus one so a queued
/// tile can have its key decreased in place.
#[derive(Debug)]
pub(crate) struct OrderedQueue {
    items: Vec<GridOffset>,
    positions: Grid<u32>,
}

impl OrderedQueue {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            positions: Grid::new(),
        }
    }

    pub(crate) fn clear(&mut self) {
        for offset in self.items.drain(..) {
            self.positions[offset] = 0;
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Inserts `offset`, or restores heap order after its priority dropped.
    pub(crate) fn push_or_decrease(&mut self, offset: GridOffset, priorities: &Grid<i16>) {
        let index = match self.positions[offset] {
            0 => {
                self.items.push(offset);
                let index = self.items.len() - 1;
                self.positions[offset] = index as u32 + 1;
                index
            }
            slot => slot as usize - 1,
        };
        self.sift_up(index, priorities);
    }

    /// Removes the offset with the lowest priority.
    pub(crate) fn pop(&mut self, priorities: &Grid<i16>) -> Option<GridOffset> {
        let last = self.items.pop()?;
        let min = match self.items.first().copied() {
            Some(root) => {
                self.items[0] = last;
                self.positions[last] = 1;
                self.sift_down(0, priorities);
                root
            }
            None => last,
        };
        self.positions[min] = 0;
        Some(min)
    }

    fn sift_up(&mut self, mut index: usize, priorities: &Grid<i16>) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if priorities[self.items[parent]] <= priorities[self.items[index]] {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize, priorities: &Grid<i16>) {
        loop {
            let left = 2 * index + 1;
            if left >= self.items.len() {
                return;
            }
            let right = left + 1;
            let mut smallest = index;
            if priorities[self.items[left]] < priorities[self.items[smallest]] {
                smallest = left;
            }
            if right < self.items.len()
                && priorities[self.items[right]] < priorities[self.items[smallest]]
            {
                smallest = right;
            }
            if smallest == index {
                return;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }

    fn swap(&mut self, first: usize, second: usize) {
        self.items.swap(first, second);
        self.positions[self.items[first]] = first as u32 + 1;
        self.positions[self.items[second]] = second as u32 + 1;
    }

    #[cfg(test)]
    pub(crate) fn is_heap(&self, priorities: &Grid<i16>) -> bool {
        (1..self.items.len()).all(|index| {
            let parent = (index - 1) / 2;
            priorities[self.items[parent]] <= priorities[self.items[index]]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(value: i32) -> GridOffset {
        GridOffset::new(value)
    }

    #[test]
    fn ring_queue_is_first_in_first_out() {
        let mut queue = RingQueue::new();
        queue.push(offset(5));
        queue.push(offset(9));
        assert_eq!(queue.pop(), Some(offset(5)));
        queue.push(offset(2));
        assert_eq!(queue.pop(), Some(offset(9)));
        assert_eq!(queue.pop(), Some(offset(2)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn ring_queue_wraps_around() {
        let mut queue = RingQueue::new();
        queue.head = GRID_CELLS - 1;
        queue.tail = GRID_CELLS - 1;
        queue.push(offset(1));
        queue.push(offset(2));
        assert_eq!(queue.tail, 1);
        assert_eq!(queue.pop(), Some(offset(1)));
        assert_eq!(queue.pop(), Some(offset(2)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn ordered_queue_keeps_heap_order_through_mixed_operations() {
        let mut priorities: Grid<i16> = Grid::new();
        let mut queue = OrderedQueue::new();
        let keys: [i16; 12] = [40, 7, 19, 3, 25, 3, 88, 12, 1, 60, 14, 9];

        for (index, key) in keys.iter().enumerate() {
            let tile = offset(1000 + index as i32);
            priorities[tile] = *key;
            queue.push_or_decrease(tile, &priorities);
            assert!(queue.is_heap(&priorities), "heap broken after insert {index}");
        }

        let mut popped = Vec::new();
        while let Some(tile) = queue.pop(&priorities) {
            assert!(queue.is_heap(&priorities), "heap broken after extract");
            popped.push(priorities[tile]);
        }
        let mut expected = keys.to_vec();
        expected.sort_unstable();
        assert_eq!(popped, expected);
    }

    #[test]
    fn decrease_key_moves_tile_forward_without_duplicating() {
        let mut priorities: Grid<i16> = Grid::new();
        let mut queue = OrderedQueue::new();
        for (value, key) in [(10, 5), (11, 8), (12, 9), (13, 20)] {
            priorities[offset(value)] = key;
            queue.push_or_decrease(offset(value), &priorities);
        }

        priorities[offset(13)] = 2;
        queue.push_or_decrease(offset(13), &priorities);

        assert_eq!(queue.len(), 4);
        assert!(queue.is_heap(&priorities));
        assert_eq!(queue.pop(&priorities), Some(offset(13)));
        assert_eq!(queue.pop(&priorities), Some(offset(10)));
    }

    #[test]
    fn clear_forgets_positions() {
        let mut priorities: Grid<i16> = Grid::new();
        let mut queue = OrderedQueue::new();
        priorities[offset(50)] = 4;
        queue.push_or_decrease(offset(50), &priorities);
        queue.clear();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop(&priorities), None);

        queue.push_or_decrease(offset(50), &priorities);
        assert_eq!(queue.len(), 1);
    }
}
