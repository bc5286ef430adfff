use crate::{
    adaptor::Adaptor, attribute::AttributeHandle, error::Error, map::Map, orbit::Orbit,
};
use std::{
    io::{BufRead, Write},
    path::Path,
};

fn map_from_models<A: Adaptor>(
    models: Vec<tobj::Model>,
) -> Result<(Map, AttributeHandle<A::Vector>), Error> {
    let mut points = Vec::new();
    let mut faces: Vec<Vec<u32>> = Vec::new();
    for model in models {
        let mesh = model.mesh;
        let voffset = points.len() as u32;
        points.extend(mesh.positions.chunks_exact(3).map(|c| {
            A::vector([
                A::scalarf64(c[0]),
                A::scalarf64(c[1]),
                A::scalarf64(c[2]),
            ])
        }));
        let offset = |i: &u32| i + voffset;
        if mesh.face_arities.is_empty() {
            // All triangles.
            faces.extend(
                mesh.indices
                    .chunks_exact(3)
                    .map(|t| t.iter().map(offset).collect()),
            );
        } else {
            let mut start = 0usize;
            for size in mesh.face_arities {
                let size = size as usize;
                let indices = mesh
                    .indices
                    .get(start..(start + size))
                    .ok_or_else(|| Error::ObjLoadFailed("Face indices out of range".into()))?;
                faces.push(indices.iter().map(offset).collect());
                start += size;
            }
        }
    }
    Map::from_positions::<A, _>(&points, &faces)
}

impl Map {
    /// Load a polygon mesh from an OBJ file. Every object in the file is
    /// added to the same map.
    pub fn load_obj<A: Adaptor>(path: &Path) -> Result<(Map, AttributeHandle<A::Vector>), Error> {
        let options = tobj::LoadOptions::default();
        let (models, _) =
            tobj::load_obj(path, &options).map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
        map_from_models::<A>(models)
    }

    /// Like [`Map::load_obj`], reading from a buffer. Material libraries are
    /// not supported.
    pub fn load_obj_buf<A: Adaptor, B: BufRead>(
        reader: &mut B,
    ) -> Result<(Map, AttributeHandle<A::Vector>), Error> {
        let options = tobj::LoadOptions::default();
        let (models, _) =
            tobj::load_obj_buf(reader, &options, |_| Err(tobj::LoadError::OpenFileFailed))
                .map_err(|e| Error::ObjLoadFailed(format!("{}", e)))?;
        map_from_models::<A>(models)
    }

    /**
     * Write the non-boundary faces of the map in OBJ format. Vertices are
     * written in line order, skipping released lines, so the indices in the
     * file are compacted.
     */
    pub fn write_obj<A: Adaptor, W: Write>(
        &self,
        position: &AttributeHandle<A::Vector>,
        mut writer: W,
    ) -> Result<(), Error> {
        let container = self.container(Orbit::Vertex);
        let mut index = vec![0u32; container.num_lines()];
        for (i, (line, p)) in self.attribute_iter(position)?.enumerate() {
            index[line as usize] = i as u32 + 1;
            let [x, y, z] = A::to_f64_array(p);
            writeln!(writer, "v {x} {y} {z}")?;
        }
        for f in self.faces() {
            write!(writer, "f")?;
            for d in self.orbit(Orbit::Face, f) {
                write!(writer, " {}", index[self.cell_index(d, Orbit::Vertex)? as usize])?;
            }
            writeln!(writer)?;
        }
        log::debug!(
            "Wrote {} vertices and {} faces",
            container.num_used(),
            self.num_faces()
        );
        Ok(())
    }
}
