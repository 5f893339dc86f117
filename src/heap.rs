//! Index-tracked binary heap
//!
//! A fixed-capacity priority queue whose items remember their own slot in the
//! backing array. Knowing the slot lets callers re-sift an item after its
//! priority changed (`update_item`) and test membership in O(1) (`contains`),
//! which is what open-set handling in grid pathfinding needs.
//!
//! Items are usually cheap shared handles (`Rc<Node>`, arena keys with a
//! `Cell` for the index) so the caller keeps its own copy after `add`.
//!
//! ```
//! use std::cell::Cell;
//! use std::cmp::Ordering;
//! use std::rc::Rc;
//! use gameplay_core::heap::{Heap, HeapItem, HeapOrder, HeapSlot};
//!
//! #[derive(Clone)]
//! struct Open(Rc<(Cell<u32>, HeapSlot)>);
//!
//! impl HeapItem for Open {
//!     fn heap_index(&self) -> Option<usize> { self.0 .1.get() }
//!     fn set_heap_index(&self, index: usize) { self.0 .1.set(index) }
//!     fn compare_priority(&self, other: &Self) -> Ordering {
//!         self.0 .0.get().cmp(&other.0 .0.get())
//!     }
//!     fn is_same_item(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
//! }
//!
//! let mut open = Heap::new(8, HeapOrder::Min);
//! let a = Open(Rc::new((Cell::new(7), HeapSlot::default())));
//! let b = Open(Rc::new((Cell::new(3), HeapSlot::default())));
//! open.add(a.clone()).unwrap();
//! open.add(b.clone()).unwrap();
//!
//! a.0 .0.set(1);
//! open.update_item(&a).unwrap();
//! assert!(open.remove_first().unwrap().is_same_item(&a));
//! ```

use std::cell::Cell;
use std::cmp::Ordering;

use crate::error::HeapError;

/// Which end of the priority order sits at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeapOrder {
    /// Greatest priority first.
    #[default]
    Max,
    /// Smallest priority first (lowest path cost wins).
    Min,
}

/// An entity that can live in a [`Heap`].
///
/// The heap is the only writer of the index. Implementors store it behind
/// interior mutability so handles held by the caller observe every move.
pub trait HeapItem {
    /// Slot this item occupies, `None` if it was never added to a heap.
    fn heap_index(&self) -> Option<usize>;
    fn set_heap_index(&self, index: usize);
    /// Total order over priorities.
    fn compare_priority(&self, other: &Self) -> Ordering;
    /// Identity, not equality: two distinct nodes with the same cost are different items.
    fn is_same_item(&self, other: &Self) -> bool;
}

/// Ready-made storage for a heap index.
#[derive(Debug, Default, Clone)]
pub struct HeapSlot(Cell<Option<usize>>);

impl HeapSlot {
    pub fn get(&self) -> Option<usize> {
        self.0.get()
    }

    pub fn set(&self, index: usize) {
        self.0.set(Some(index));
    }
}

/// Fixed-capacity binary heap.
#[derive(Debug)]
pub struct Heap<T: HeapItem> {
    items: Vec<T>,
    capacity: usize,
    order: HeapOrder,
}

impl<T: HeapItem> Heap<T> {
    /// Create a heap that can hold at most `capacity` items.
    pub fn new(capacity: usize, order: HeapOrder) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn order(&self) -> HeapOrder {
        self.order
    }

    /// The item `remove_first` would return.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Items in backing-array order (not priority order).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Drop every item. Indices held by removed items become stale.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Append `item` and sift it up to its place.
    pub fn add(&mut self, item: T) -> Result<(), HeapError> {
        if self.items.len() >= self.capacity {
            return Err(HeapError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let index = self.items.len();
        item.set_heap_index(index);
        self.items.push(item);
        self.sift_up(index);
        Ok(())
    }

    /// Take the root, move the last item into its slot and sift it down.
    pub fn remove_first(&mut self) -> Result<T, HeapError> {
        if self.items.is_empty() {
            return Err(HeapError::Empty);
        }

        let first = self.items.swap_remove(0);
        if let Some(moved) = self.items.first() {
            moved.set_heap_index(0);
            self.sift_down(0);
        }
        Ok(first)
    }

    /// Restore heap order after `item`'s priority changed outside the heap.
    ///
    /// Pathfinding only ever improves a cost, so the item normally moves up;
    /// a worsened priority is sifted down as well.
    pub fn update_item(&mut self, item: &T) -> Result<(), HeapError> {
        let index = self.tracked_index(item)?;
        let index = self.sift_up(index);
        self.sift_down(index);
        Ok(())
    }

    /// Whether `item` is stored at its recorded slot.
    ///
    /// Items that were added and later removed report `false`. Asking about an
    /// item that never entered a heap is an error.
    pub fn contains(&self, item: &T) -> Result<bool, HeapError> {
        let index = item.heap_index().ok_or(HeapError::UntrackedItem)?;
        Ok(self
            .items
            .get(index)
            .is_some_and(|stored| stored.is_same_item(item)))
    }

    fn tracked_index(&self, item: &T) -> Result<usize, HeapError> {
        let index = item.heap_index().ok_or(HeapError::UntrackedItem)?;
        match self.items.get(index) {
            Some(stored) if stored.is_same_item(item) => Ok(index),
            _ => Err(HeapError::UntrackedItem),
        }
    }

    /// `true` when `a` belongs above `b`.
    fn outranks(&self, a: &T, b: &T) -> bool {
        match self.order {
            HeapOrder::Max => a.compare_priority(b) == Ordering::Greater,
            HeapOrder::Min => a.compare_priority(b) == Ordering::Less,
        }
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.outranks(&self.items[index], &self.items[parent]) {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
        index
    }

    fn sift_down(&mut self, mut index: usize) {
        loop {
            let left = index * 2 + 1;
            let right = left + 1;
            if left >= self.items.len() {
                return;
            }

            let mut child = left;
            if right < self.items.len() && self.outranks(&self.items[right], &self.items[left]) {
                child = right;
            }

            if !self.outranks(&self.items[child], &self.items[index]) {
                return;
            }
            self.swap(index, child);
            index = child;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
        self.items[a].set_heap_index(a);
        self.items[b].set_heap_index(b);
    }
}
