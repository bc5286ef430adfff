use crate::{
    Handle,
    dart::Dart,
    error::Error,
    map::{Map, NIL},
};

fn remap_line(lines: &[Option<u32>], line: u32) -> u32 {
    match line {
        NIL => NIL,
        line => lines
            .get(line as usize)
            .copied()
            .flatten()
            .unwrap_or(NIL),
    }
}

impl Map {
    /**
     * Remove the released darts and the released lines of every attribute
     * container, so that dart indices and lines are dense again. The relative
     * order of live darts and of used lines is preserved.
     *
     * Darts and lines held by the caller are invalidated, and so are the marks
     * of markers created before the call. Attribute handles stay valid.
     */
    pub fn garbage_collection(&mut self) -> Result<(), Error> {
        let slots = self.darts.compacted_slots()?;
        let ndarts = self.num_darts();
        let mut phi1 = Vec::new();
        let mut phi_1 = Vec::new();
        let mut phi2 = Vec::new();
        let mut boundary = Vec::new();
        phi1.try_reserve(ndarts)?;
        phi_1.try_reserve(ndarts)?;
        phi2.try_reserve(ndarts)?;
        boundary.try_reserve(ndarts)?;
        let remap = |d: Dart| Dart::from(slots[d.index() as usize].unwrap_or(NIL));
        for d in self.darts() {
            let i = d.index() as usize;
            phi1.push(remap(self.phi1[i]));
            phi_1.push(remap(self.phi_1[i]));
            phi2.push(remap(self.phi2[i]));
            boundary.push(self.boundary[i]);
        }
        let mut tables: [Option<Vec<u32>>; 4] = Default::default();
        for (table, (old, container)) in tables
            .iter_mut()
            .zip(self.embeddings.iter().zip(self.containers.iter()))
        {
            let Some(old) = old else {
                continue;
            };
            let lines = container.compacted_lines()?;
            let mut new = Vec::new();
            new.try_reserve(ndarts)?;
            new.extend(
                self.darts
                    .iter()
                    .map(|d| remap_line(&lines, old[d.index() as usize])),
            );
            *table = Some(new);
        }
        // Commit.
        let before = self.dart_capacity();
        self.darts.compact();
        self.phi1 = phi1;
        self.phi_1 = phi_1;
        self.phi2 = phi2;
        self.boundary = boundary;
        self.embeddings = tables;
        for container in self.containers.iter_mut() {
            container.compact();
        }
        log::debug!(
            "Garbage collection removed {} darts",
            before - self.dart_capacity()
        );
        Ok(())
    }
}
