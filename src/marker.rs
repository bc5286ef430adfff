/*!
Markers are scratch boolean flags over the darts of a map, used by traversals
and algorithms to remember what they have already visited.

Each marker owns a buffer taken from a pool shared with the map it was created
for. Markers never borrow the map, so they can be held across edits, and two
markers never observe each other's marks. When a marker is dropped, only the
darts it touched are cleared before the buffer goes back to the pool.
*/

use crate::{
    Handle,
    dart::Dart,
    map::Map,
    orbit::Orbit,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Pool of cleared mark buffers shared between a map and its markers.
#[derive(Default)]
pub(crate) struct MarkerPool {
    buffers: Mutex<Vec<Vec<u8>>>,
}

const CLEAR: u8 = 0;
const MARKED: u8 = 1;
const TOUCHED: u8 = 2;

impl MarkerPool {
    fn take(&self, size: usize) -> Vec<u8> {
        let mut buf = self.buffers.lock().pop().unwrap_or_default();
        if buf.len() < size {
            buf.resize(size, CLEAR);
        }
        buf
    }

    fn give_back(&self, buf: Vec<u8>) {
        debug_assert!(
            buf.iter().all(|b| *b == CLEAR),
            "Returned marker buffer is not clear"
        );
        self.buffers.lock().push(buf);
    }

    #[cfg(test)]
    pub(crate) fn num_pooled(&self) -> usize {
        self.buffers.lock().len()
    }
}

/// Marks individual darts.
pub struct DartMarker {
    pool: Arc<MarkerPool>,
    marks: Vec<u8>,
    touched: Vec<Dart>,
    count: usize,
}

impl DartMarker {
    pub fn new(map: &Map) -> Self {
        let pool = map.marker_pool();
        let marks = pool.take(map.dart_capacity());
        DartMarker {
            pool,
            marks,
            touched: Vec::new(),
            count: 0,
        }
    }

    pub fn mark(&mut self, d: Dart) {
        let i = d.index() as usize;
        if i >= self.marks.len() {
            self.marks.resize(i + 1, CLEAR);
        }
        match self.marks[i] {
            MARKED => {}
            state => {
                if state == CLEAR {
                    self.touched.push(d);
                }
                self.marks[i] = MARKED;
                self.count += 1;
            }
        }
    }

    pub fn unmark(&mut self, d: Dart) {
        if let Some(m) = self.marks.get_mut(d.index() as usize) {
            if *m == MARKED {
                *m = TOUCHED;
                self.count -= 1;
            }
        }
    }

    pub fn is_marked(&self, d: Dart) -> bool {
        self.marks.get(d.index() as usize).copied() == Some(MARKED)
    }

    /// Mark every dart of the `orbit` containing `d`.
    pub fn mark_orbit(&mut self, map: &Map, orbit: Orbit, d: Dart) {
        for od in map.orbit(orbit, d) {
            self.mark(od);
        }
    }

    pub fn unmark_orbit(&mut self, map: &Map, orbit: Orbit, d: Dart) {
        for od in map.orbit(orbit, d) {
            self.unmark(od);
        }
    }

    /// Number of currently marked darts.
    pub fn num_marked(&self) -> usize {
        self.count
    }

    /// Currently marked darts, in the order they were first marked.
    pub fn marked(&self) -> impl Iterator<Item = Dart> + use<'_> {
        self.touched.iter().copied().filter(|d| self.is_marked(*d))
    }

    pub fn unmark_all(&mut self) {
        for d in self.touched.drain(..) {
            self.marks[d.index() as usize] = CLEAR;
        }
        self.count = 0;
    }
}

impl Drop for DartMarker {
    fn drop(&mut self) {
        self.unmark_all();
        self.pool.give_back(std::mem::take(&mut self.marks));
    }
}

/// Marks whole cells of one orbit kind. Marking a cell marks all its darts,
/// so membership queries are answered from any dart of the cell.
pub struct CellMarker {
    orbit: Orbit,
    inner: DartMarker,
    cells: usize,
}

impl CellMarker {
    pub fn new(map: &Map, orbit: Orbit) -> Self {
        CellMarker {
            orbit,
            inner: DartMarker::new(map),
            cells: 0,
        }
    }

    pub fn orbit(&self) -> Orbit {
        self.orbit
    }

    pub fn mark(&mut self, map: &Map, d: Dart) {
        if !self.inner.is_marked(d) {
            self.inner.mark_orbit(map, self.orbit, d);
            self.cells += 1;
        }
    }

    pub fn unmark(&mut self, map: &Map, d: Dart) {
        if self.inner.is_marked(d) {
            self.inner.unmark_orbit(map, self.orbit, d);
            self.cells -= 1;
        }
    }

    pub fn is_marked(&self, d: Dart) -> bool {
        self.inner.is_marked(d)
    }

    /// Number of marked cells.
    pub fn num_marked(&self) -> usize {
        self.cells
    }

    pub fn unmark_all(&mut self) {
        self.inner.unmark_all();
        self.cells = 0;
    }
}

#[cfg(test)]
mod test {
    use super::{CellMarker, DartMarker};
    use crate::{Map, Orbit};

    #[test]
    fn t_markers_are_isolated() {
        let map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let darts: Vec<_> = map.darts().collect();
        let mut a = DartMarker::new(&map);
        let mut b = DartMarker::new(&map);
        a.mark(darts[0]);
        a.mark(darts[3]);
        b.mark(darts[1]);
        assert!(a.is_marked(darts[0]));
        assert!(!b.is_marked(darts[0]));
        assert!(!a.is_marked(darts[1]));
        assert!(b.is_marked(darts[1]));
        b.unmark_all();
        assert!(a.is_marked(darts[3]));
        assert_eq!(a.num_marked(), 2);
        assert_eq!(b.num_marked(), 0);
    }

    #[test]
    fn t_marker_cleared_on_drop() {
        let map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let darts: Vec<_> = map.darts().collect();
        {
            let mut m = DartMarker::new(&map);
            for &d in &darts {
                m.mark(d);
            }
            assert_eq!(m.num_marked(), darts.len());
        }
        let pooled = map.marker_pool().num_pooled();
        assert!(pooled >= 1);
        let m = DartMarker::new(&map);
        assert!(darts.iter().all(|d| !m.is_marked(*d)));
        assert_eq!(map.marker_pool().num_pooled(), pooled - 1);
    }

    #[test]
    fn t_marker_cleared_on_panic() {
        let map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let darts: Vec<_> = map.darts().collect();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut m = DartMarker::new(&map);
            m.mark(darts[2]);
            panic!("Interrupted traversal");
        }));
        assert!(result.is_err());
        let m = DartMarker::new(&map);
        assert!(!m.is_marked(darts[2]));
    }

    #[test]
    fn t_cell_marker_marks_whole_orbit() {
        let map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let d = map.darts().next().expect("Cannot find a dart");
        let mut cm = CellMarker::new(&map, Orbit::Face);
        cm.mark(&map, d);
        cm.mark(&map, map.phi1(d));
        assert_eq!(cm.num_marked(), 1);
        assert!(cm.is_marked(map.phi_1(d)));
        assert!(!cm.is_marked(map.phi2(d)));
        cm.unmark(&map, map.phi1(d));
        assert!(!cm.is_marked(d));
        assert_eq!(cm.num_marked(), 0);
    }
}
