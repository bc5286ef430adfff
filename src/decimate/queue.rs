/*!
Indexed priority queue over handles. The position of every queued handle in
the binary heap is tracked, so that its cost can be changed or the handle
removed in logarithmic time, by sifting it up or down from where it is.
*/

use crate::Handle;
use std::{cmp::Ordering, ops::Range};

/// Heap positions indexed by handle.
struct Positions {
    slots: Vec<Option<usize>>,
}

impl Positions {
    fn get(&self, i: usize) -> Option<usize> {
        self.slots.get(i).copied().flatten()
    }

    fn set(&mut self, i: usize, pos: Option<usize>) {
        if i >= self.slots.len() {
            if pos.is_none() {
                return;
            }
            self.slots.resize(i + 1, None);
        }
        self.slots[i] = pos;
    }
}

pub struct Queue<H, Cost>
where
    H: Handle,
    Cost: PartialOrd,
{
    items: Vec<(H, Cost)>,
    positions: Positions,
}

const fn heap_parent(index: usize) -> Option<usize> {
    if index > 0 {
        Some((index - 1) >> 1)
    } else {
        None
    }
}

const fn heap_children(index: usize) -> Range<usize> {
    let off = index << 1;
    (off + 1)..(off + 3)
}

impl<H, Cost> Queue<H, Cost>
where
    H: Handle,
    Cost: PartialOrd,
{
    /// Create a queue with room for handles up to `num_items`. Larger handles
    /// are accepted, the position table grows as needed.
    pub fn new(num_items: usize) -> Self {
        Queue {
            items: Vec::with_capacity(num_items),
            positions: Positions {
                slots: vec![None; num_items],
            },
        }
    }

    pub fn clear(&mut self) {
        for (h, _) in self.items.drain(..) {
            self.positions.set(h.index() as usize, None);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, val: H) -> bool {
        self.positions.get(val.index() as usize).is_some()
    }

    /// Queued cost of `val`.
    pub fn cost(&self, val: H) -> Option<&Cost> {
        self.positions
            .get(val.index() as usize)
            .map(|i| &self.items[i].1)
    }

    /// The cheapest item, without removing it.
    pub fn peek(&self) -> Option<&(H, Cost)> {
        self.items.first()
    }

    fn less(&self, i: usize, j: usize) -> bool {
        matches!(
            self.items[i].1.partial_cmp(&self.items[j].1),
            Some(Ordering::Less)
        )
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.positions.set(self.items[i].0.index() as usize, Some(j));
        self.positions.set(self.items[j].0.index() as usize, Some(i));
        self.items.swap(i, j);
    }

    fn sift_up(&mut self, mut index: usize) {
        while let Some(pi) = heap_parent(index) {
            if !self.less(index, pi) {
                break;
            }
            self.swap(index, pi);
            index = pi;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        loop {
            let smallest = heap_children(index)
                .filter(|ci| *ci < self.len())
                .fold(None, |best: Option<usize>, ci| match best {
                    Some(b) if !self.less(ci, b) => Some(b),
                    _ => Some(ci),
                });
            match smallest {
                Some(child) if self.less(child, index) => {
                    self.swap(index, child);
                    index = child;
                }
                _ => break,
            }
        }
    }

    /// Restore the heap around `index` after its cost changed.
    fn fix(&mut self, index: usize) {
        self.sift_down(index);
        self.sift_up(index);
    }

    /// Queue `val` with `cost`. If `val` is already queued, its cost is
    /// updated in place.
    pub fn insert(&mut self, val: H, cost: Cost) {
        match self.positions.get(val.index() as usize) {
            Some(index) => {
                self.items[index].1 = cost;
                self.fix(index);
            }
            None => {
                let index = self.items.len();
                self.positions.set(val.index() as usize, Some(index));
                self.items.push((val, cost));
                self.sift_up(index);
            }
        }
    }

    /// Remove `val` if it is queued, returning its cost.
    pub fn remove(&mut self, val: H) -> Option<Cost> {
        let index = self.positions.get(val.index() as usize)?;
        let last = self.len() - 1;
        if index != last {
            self.swap(index, last);
        }
        let (h, cost) = self.items.pop()?;
        self.positions.set(h.index() as usize, None);
        if index != last {
            self.fix(index);
        }
        Some(cost)
    }

    /// Remove and return the cheapest item.
    pub fn pop(&mut self) -> Option<(H, Cost)> {
        let last = self.len().checked_sub(1)?;
        self.swap(0, last);
        let out = self.items.pop()?;
        self.positions.set(out.0.index() as usize, None);
        self.sift_down(0);
        Some(out)
    }
}
