use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/**
 * Everything that is identified by a 32 bit index implements this trait: darts
 * and the lines of attribute containers.
 */
pub trait Handle: Copy {
    /**
     * The index of the element.
     */
    fn index(&self) -> u32;
}

impl Handle for u32 {
    fn index(&self) -> u32 {
        *self
    }
}

/**
 * Dart handle. A dart is the atomic element of a combinatorial map: an oriented
 * half of an edge, belonging to exactly one face.
 */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dart {
    idx: u32,
}

impl Handle for Dart {
    fn index(&self) -> u32 {
        self.idx
    }
}

impl From<u32> for Dart {
    fn from(idx: u32) -> Self {
        Dart { idx }
    }
}

impl From<&u32> for Dart {
    fn from(idx: &u32) -> Self {
        Dart { idx: *idx }
    }
}

impl From<Dart> for u32 {
    fn from(d: Dart) -> Self {
        d.idx
    }
}

impl Display for Dart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.idx)
    }
}

impl Debug for Dart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.idx)
    }
}

/// Allocator for dart slots. Released slots are recycled in LIFO order.
#[derive(Clone, Default, Serialize, Deserialize)]
pub(crate) struct DartStore {
    live: Vec<bool>,
    free: Vec<u32>,
}

impl DartStore {
    /// Number of slots, live or free.
    pub fn capacity(&self) -> usize {
        self.live.len()
    }

    /// Number of live darts.
    pub fn len(&self) -> usize {
        self.live.len() - self.free.len()
    }

    pub fn is_live(&self, d: Dart) -> bool {
        self.live.get(d.index() as usize).copied().unwrap_or(false)
    }

    /// Make sure `n` darts can be allocated without growing any buffer. Slots
    /// returned by `allocate` after this call are either recycled or one past
    /// the current end.
    pub fn reserve(&mut self, n: usize) -> Result<(), std::collections::TryReserveError> {
        let fresh = n.saturating_sub(self.free.len());
        self.live.try_reserve(fresh)?;
        self.free.try_reserve(fresh)
    }

    /// Every released slot must be listed once in the free list, and no live
    /// slot at all.
    pub fn check_free_list(&self) -> Result<(), Error> {
        let mut listed = vec![false; self.live.len()];
        for &i in &self.free {
            match (listed.get_mut(i as usize), self.live.get(i as usize).copied()) {
                (Some(seen), Some(false)) if !*seen => *seen = true,
                _ => return Err(Error::CorruptFreeList(i)),
            }
        }
        match self.live.iter().zip(&listed).position(|(live, seen)| !live && !seen) {
            Some(i) => Err(Error::CorruptFreeList(i as u32)),
            None => Ok(()),
        }
    }

    /// New index of every slot once the free slots are removed, or `None` for
    /// free slots.
    pub fn compacted_slots(&self) -> Result<Vec<Option<u32>>, Error> {
        let mut out = Vec::new();
        out.try_reserve(self.live.len())?;
        let mut next = 0u32;
        out.extend(self.live.iter().map(|l| {
            l.then(|| {
                next += 1;
                next - 1
            })
        }));
        Ok(out)
    }

    /// Drop the free slots. Indices must be remapped with `compacted_slots`.
    pub fn compact(&mut self) {
        let n = self.len();
        self.live.clear();
        self.live.resize(n, true);
        self.free.clear();
    }

    pub fn allocate(&mut self) -> Dart {
        match self.free.pop() {
            Some(i) => {
                self.live[i as usize] = true;
                i.into()
            }
            None => {
                self.live.push(true);
                ((self.live.len() - 1) as u32).into()
            }
        }
    }

    pub fn release(&mut self, d: Dart) {
        debug_assert!(self.is_live(d), "Releasing a dart that is not live");
        self.live[d.index() as usize] = false;
        self.free.push(d.index());
    }

    /// Live darts in storage order.
    pub fn iter(&self) -> impl Iterator<Item = Dart> + use<'_> {
        self.live
            .iter()
            .enumerate()
            .filter_map(|(i, live)| if *live { Some(Dart::from(i as u32)) } else { None })
    }
}

#[cfg(test)]
mod test {
    use super::{Dart, DartStore};
    use crate::{Error, Handle};

    #[test]
    fn t_dart_store_recycles_lifo() {
        let mut store = DartStore::default();
        let darts: Vec<Dart> = (0..5).map(|_| store.allocate()).collect();
        assert_eq!(
            darts.iter().map(|d| d.index()).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        store.release(darts[1]);
        store.release(darts[3]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.capacity(), 5);
        assert!(!store.is_live(darts[3]));
        assert_eq!(store.allocate().index(), 3);
        assert_eq!(store.allocate().index(), 1);
        assert_eq!(store.allocate().index(), 5);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn t_dart_store_iter_skips_released() {
        let mut store = DartStore::default();
        for _ in 0..4 {
            store.allocate();
        }
        store.release(2.into());
        assert_eq!(
            store.iter().map(|d| d.index()).collect::<Vec<_>>(),
            vec![0, 1, 3]
        );
        assert!(!store.is_live(100.into()));
    }

    #[test]
    fn t_dart_store_free_list_errors() {
        let mut store = DartStore::default();
        for _ in 0..4 {
            store.allocate();
        }
        store.release(1.into());
        store.release(3.into());
        store.check_free_list().expect("Free list is inconsistent");
        // A live slot listed as free.
        let mut live = store.clone();
        live.free.push(0);
        assert!(matches!(live.check_free_list(), Err(Error::CorruptFreeList(0))));
        // The same slot listed twice.
        let mut twice = store.clone();
        twice.free.push(3);
        assert!(matches!(twice.check_free_list(), Err(Error::CorruptFreeList(3))));
        // A slot past the end.
        let mut outside = store.clone();
        outside.free.push(9);
        assert!(matches!(outside.check_free_list(), Err(Error::CorruptFreeList(9))));
        // A released slot missing from the list.
        let mut missing = store.clone();
        missing.free.retain(|i| *i != 1);
        assert!(matches!(missing.check_free_list(), Err(Error::CorruptFreeList(1))));
    }
}
