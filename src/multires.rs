/*!
Stack of map levels for multiresolution editing.

Every level is a complete map. Level 0 is the coarsest and
[`MultiresMap::max_level`] the finest. Moving the cursor with
[`MultiresMap::coarsen`] and [`MultiresMap::refine`] never touches any level;
edits only ever apply to the level under the cursor, through
[`MultiresMap::map_mut`].

Misusing the cursor is a programming error and panics.
*/

use crate::map::Map;

pub struct MultiresMap {
    levels: Vec<Map>,
    current: usize,
    saved: Vec<usize>,
}

impl MultiresMap {
    /// A stack with `map` as its only level.
    pub fn new(map: Map) -> Self {
        MultiresMap {
            levels: vec![map],
            current: 0,
            saved: Vec::new(),
        }
    }

    pub fn current_level(&self) -> usize {
        self.current
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// The map at the current level.
    pub fn map(&self) -> &Map {
        &self.levels[self.current]
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.levels[self.current]
    }

    pub fn level(&self, level: usize) -> &Map {
        assert!(
            level <= self.max_level(),
            "Level {level} is beyond the max level {}",
            self.max_level()
        );
        &self.levels[level]
    }

    /// Save the current level, to be restored by [`MultiresMap::pop_level`].
    pub fn push_level(&mut self) {
        self.saved.push(self.current);
    }

    pub fn pop_level(&mut self) {
        match self.saved.pop() {
            Some(level) => self.current = level,
            None => panic!("No saved level to pop"),
        }
    }

    /**
     * Insert a copy of the coarsest level below it, as the new level 0. The
     * current and saved levels are shifted so they keep naming the same maps.
     */
    pub fn add_front_level(&mut self) {
        let copy = self.levels[0].clone();
        self.levels.insert(0, copy);
        self.current += 1;
        for level in self.saved.iter_mut() {
            *level += 1;
        }
        log::debug!("Added a coarse level, max level is {}", self.max_level());
    }

    /// Append a copy of the finest level, as the new max level.
    pub fn add_back_level(&mut self) {
        let copy = self.levels[self.max_level()].clone();
        self.levels.push(copy);
        log::debug!("Added a fine level, max level is {}", self.max_level());
    }

    pub fn set_current_level(&mut self, level: usize) {
        assert!(
            level <= self.max_level(),
            "Level {level} is beyond the max level {}",
            self.max_level()
        );
        self.current = level;
    }

    pub fn inc_current_level(&mut self) {
        assert!(
            self.current < self.max_level(),
            "Already at the max level {}",
            self.current
        );
        self.current += 1;
    }

    pub fn dec_current_level(&mut self) {
        assert!(self.current > 0, "Already at level 0");
        self.current -= 1;
    }

    /// Move to the next coarser level.
    pub fn coarsen(&mut self) {
        assert!(self.current > 0, "coarsen called on level 0");
        self.dec_current_level();
    }

    /// Move to the next finer level.
    pub fn refine(&mut self) {
        assert!(
            self.current < self.max_level(),
            "refine called on the max level"
        );
        self.inc_current_level();
    }
}

#[cfg(test)]
mod test {
    use super::MultiresMap;
    use crate::{Map, collapse::test::find_dart};

    fn three_levels() -> MultiresMap {
        let map = Map::grid_topology(2, 2).expect("Cannot create grid");
        let mut mr = MultiresMap::new(map);
        mr.add_back_level();
        mr.add_back_level();
        mr
    }

    #[test]
    fn t_levels_round_trip() {
        let mut mr = three_levels();
        assert_eq!(mr.max_level(), 2);
        assert_eq!(mr.current_level(), 0);
        mr.set_current_level(2);
        mr.push_level();
        mr.coarsen();
        mr.coarsen();
        assert_eq!(mr.current_level(), 0);
        mr.refine();
        assert_eq!(mr.current_level(), 1);
        mr.pop_level();
        assert_eq!(mr.current_level(), 2);
    }

    #[test]
    fn t_edits_stay_on_their_level() {
        let mut mr = three_levels();
        mr.set_current_level(0);
        let d = find_dart(mr.map(), 0, 1).expect("Cannot find dart");
        mr.map_mut().collapse_edge(d).expect("Cannot collapse edge");
        mr.map().check().expect("Map is inconsistent");
        assert_eq!(mr.map().num_vertices(), 8);
        mr.refine();
        assert_eq!(mr.map().num_vertices(), 9);
        assert_eq!(mr.level(2).num_vertices(), 9);
        assert_eq!(mr.level(0).num_vertices(), 8);
    }

    #[test]
    fn t_add_front_level_shifts_cursors() {
        let mut mr = three_levels();
        mr.set_current_level(1);
        mr.push_level();
        mr.set_current_level(0);
        let d = find_dart(mr.map(), 0, 1).expect("Cannot find dart");
        mr.map_mut().collapse_edge(d).expect("Cannot collapse edge");
        mr.add_front_level();
        assert_eq!(mr.max_level(), 3);
        // Still on the level that was just edited.
        assert_eq!(mr.current_level(), 1);
        assert_eq!(mr.map().num_vertices(), 8);
        // The new coarsest level is a copy of it.
        assert_eq!(mr.level(0).num_vertices(), 8);
        mr.pop_level();
        assert_eq!(mr.current_level(), 2);
        assert_eq!(mr.map().num_vertices(), 9);
    }

    #[test]
    #[should_panic]
    fn t_coarsen_at_level_zero() {
        let mut mr = three_levels();
        mr.coarsen();
    }

    #[test]
    #[should_panic]
    fn t_refine_at_max_level() {
        let mut mr = three_levels();
        mr.set_current_level(2);
        mr.refine();
    }

    #[test]
    #[should_panic]
    fn t_pop_empty_stack() {
        let mut mr = three_levels();
        mr.pop_level();
    }

    #[test]
    #[should_panic]
    fn t_set_level_out_of_range() {
        let mut mr = three_levels();
        mr.set_current_level(3);
    }
}
