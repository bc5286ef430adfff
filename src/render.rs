/*!
Index buffers for drawing a map as points, lines or triangles.

Indices are vertex lines, so they index directly into the columns of vertex
attributes such as positions and normals. Faces are triangulated as fans
around their smallest dart. Every function takes a predicate on the
representative dart of each cell, to draw only part of the map.

The `_coherent` variants visit cells with the coherent traversor, so
consecutive primitives tend to share vertices.
*/

use crate::{dart::Dart, error::Error, map::Map, orbit::Orbit};

fn push_edge(map: &Map, e: Dart, out: &mut Vec<u32>) -> Result<(), Error> {
    out.push(map.cell_index(e, Orbit::Vertex)?);
    out.push(map.cell_index(map.phi1(e), Orbit::Vertex)?);
    Ok(())
}

/// Fans from the smallest dart of the face, whichever dart `f` is.
fn push_fan(map: &Map, f: Dart, out: &mut Vec<u32>) -> Result<(), Error> {
    let f = map.orbit(Orbit::Face, f).min().unwrap_or(f);
    let a = map.cell_index(f, Orbit::Vertex)?;
    let mut b = map.phi1(f);
    let mut c = map.phi1(b);
    while c != f {
        out.push(a);
        out.push(map.cell_index(b, Orbit::Vertex)?);
        out.push(map.cell_index(c, Orbit::Vertex)?);
        b = c;
        c = map.phi1(c);
    }
    Ok(())
}

impl Map {
    /// One index per selected vertex.
    pub fn point_indices<P>(&self, pred: P) -> Result<Vec<u32>, Error>
    where
        P: Fn(Dart) -> bool,
    {
        self.vertices()
            .filter(|v| pred(*v))
            .map(|v| self.cell_index(v, Orbit::Vertex))
            .collect()
    }

    /// Two indices per selected edge.
    pub fn line_indices<P>(&self, pred: P) -> Result<Vec<u32>, Error>
    where
        P: Fn(Dart) -> bool,
    {
        let mut out = Vec::with_capacity(self.num_edges() * 2);
        for e in self.edges().filter(|e| pred(*e)) {
            push_edge(self, e, &mut out)?;
        }
        Ok(out)
    }

    /// Three indices per triangle of the selected faces.
    pub fn triangle_indices<P>(&self, pred: P) -> Result<Vec<u32>, Error>
    where
        P: Fn(Dart) -> bool,
    {
        let mut out = Vec::with_capacity(self.num_faces() * 3);
        for f in self.faces().filter(|f| pred(*f)) {
            push_fan(self, f, &mut out)?;
        }
        Ok(out)
    }

    pub fn line_indices_coherent<P>(&self, pred: P) -> Result<Vec<u32>, Error>
    where
        P: Fn(Dart) -> bool,
    {
        let mut out = Vec::with_capacity(self.num_edges() * 2);
        for e in self.cells_coherent(Orbit::Edge).filter(|e| pred(*e)) {
            push_edge(self, e, &mut out)?;
        }
        Ok(out)
    }

    pub fn triangle_indices_coherent<P>(&self, pred: P) -> Result<Vec<u32>, Error>
    where
        P: Fn(Dart) -> bool,
    {
        let mut out = Vec::with_capacity(self.num_faces() * 3);
        for f in self.cells_coherent(Orbit::Face).filter(|f| pred(*f)) {
            push_fan(self, f, &mut out)?;
        }
        Ok(out)
    }
}
