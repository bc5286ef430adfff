use crate::{
    adaptor::Adaptor,
    attribute::AttributeHandle,
    decimate::{CollapseDetail, DecimationConfig, Decimater},
    error::Error,
    map::Map,
    multires::MultiresMap,
};

/**
 * Progressive mesh: a level stack whose coarser levels are built by
 * decimating copies of the coarsest one.
 *
 * The position attribute handle is valid on every level, because every level
 * starts out as a copy of another. When the approximator has a predictor, the
 * details of the collapses that built each level are kept with it.
 */
pub struct ProgressiveMesh<A: Adaptor> {
    levels: MultiresMap,
    position: AttributeHandle<A::Vector>,
    decimater: Decimater,
    details: Vec<Vec<CollapseDetail<A::Vector>>>,
}

impl<A: Adaptor + 'static> ProgressiveMesh<A> {
    pub fn new(map: Map, position: AttributeHandle<A::Vector>, config: DecimationConfig) -> Self {
        ProgressiveMesh {
            levels: MultiresMap::new(map),
            position,
            decimater: Decimater::new(config),
            details: Vec::new(),
        }
    }

    pub fn position(&self) -> AttributeHandle<A::Vector> {
        self.position
    }

    pub fn levels(&self) -> &MultiresMap {
        &self.levels
    }

    /// The map at the current level.
    pub fn map(&self) -> &Map {
        self.levels.map()
    }

    pub fn current_level(&self) -> usize {
        self.levels.current_level()
    }

    pub fn max_level(&self) -> usize {
        self.levels.max_level()
    }

    /// Details of the collapses that built `level` from the next finer one.
    /// Empty for the finest level, and for approximators without a
    /// predictor.
    pub fn details(&self, level: usize) -> &[CollapseDetail<A::Vector>] {
        self.details.get(level).map(Vec::as_slice).unwrap_or_default()
    }

    /// Insert a copy of the coarsest level as the new level 0. The current
    /// level keeps naming the same map.
    pub fn add_new_level(&mut self) {
        self.levels.add_front_level();
        self.details.insert(0, Vec::new());
    }

    /**
     * Add a new coarsest level, decimated down to `percent_wanted_vertices`
     * percent of the vertices of the previous coarsest level. The current
     * level is left unchanged. Returns the number of collapsed edges.
     */
    pub fn create_pm(&mut self, percent_wanted_vertices: u32) -> Result<usize, Error> {
        self.levels.push_level();
        self.add_new_level();
        self.levels.set_current_level(0);
        let nverts = self.levels.map().num_vertices();
        let wanted = nverts * percent_wanted_vertices as usize / 100;
        log::debug!("Creating a progressive mesh level, from {nverts} to {wanted} vertices");
        let mut selector = self.decimater.make_selector::<A>();
        let mut approx = self.decimater.make_approximator::<A>();
        let result = Decimater::decimate_with(
            self.levels.map_mut(),
            &self.position,
            selector.as_mut(),
            approx.as_mut(),
            |_n, v, _f| v > wanted,
        );
        self.levels.pop_level();
        if let Some(details) = self.details.first_mut() {
            *details = approx.take_details();
        }
        result
    }

    /// Move to the next coarser level. Panics at level 0.
    pub fn coarsen(&mut self) {
        self.levels.coarsen();
    }

    /// Move to the next finer level. Panics at the max level.
    pub fn refine(&mut self) {
        self.levels.refine();
    }
}
