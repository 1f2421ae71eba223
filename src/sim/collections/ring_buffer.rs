//! Fixed-capacity circular buffer.
//!
//! `head` is the slot of the oldest entry and `tail` the slot the next push
//! writes to. When full they coincide and a push advances both.

use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> RingBuffer<T> {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            warn!("[COLLECTIONS] RingBuffer created with zero capacity; using 1");
        }
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    #[inline]
    fn slot(&self, index: usize) -> usize {
        (self.head + index) % self.capacity()
    }

    /// Append `item`, returning the entry it overwrote if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let cap = self.capacity();
        let evicted = self.slots[self.tail].replace(item);
        self.tail = (self.tail + 1) % cap;
        if self.count == cap {
            self.head = (self.head + 1) % cap;
        } else {
            self.count += 1;
        }
        evicted
    }

    /// Entry `index` positions after the oldest (0 = oldest, `len() - 1` = newest).
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.count {
            return None;
        }
        self.slots[self.slot(index)].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.count {
            return None;
        }
        let slot = self.slot(index);
        self.slots[slot].as_mut()
    }

    pub fn oldest(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn newest(&self) -> Option<&T> {
        self.count.checked_sub(1).and_then(|last| self.get(last))
    }

    pub fn pop_oldest(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let item = self.slots[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.count -= 1;
        item
    }

    /// Drop the newest entry. Used to discard speculative history.
    pub fn pop_newest(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let cap = self.capacity();
        self.tail = (self.tail + cap - 1) % cap;
        self.count -= 1;
        self.slots[self.tail].take()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        (0..self.count).filter_map(move |i| self.slots[self.slot(i)].as_ref())
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Rebuild with `new_capacity` slots, keeping the most recent entries that fit.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(1);
        if new_capacity == self.capacity() {
            return;
        }
        let mut rebuilt = RingBuffer::new(new_capacity);
        while let Some(item) = self.pop_oldest() {
            // Entries popped while `count` still fills the new capacity are too old to keep.
            if self.count >= new_capacity {
                continue;
            }
            rebuilt.push(item);
        }
        *self = rebuilt;
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Owned copy, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}
