/*!
Binary serialization of maps with `bincode`.

The file starts with a format version, followed by the dart table, the
relations, the boundary marks, the embedding tables and every attribute
container. Attribute values are written as individually encoded lines, so a
map can be read back without knowing the types of its attributes. Loaded
columns stay encoded until they are claimed with [`Map::attribute`], which
checks the stored type name and decodes them.
*/

use crate::{
    attribute::{AttributeContainer, EncodedColumn},
    dart::{Dart, DartStore},
    error::Error,
    map::Map,
    orbit::Orbit,
};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ColumnData {
    name: String,
    type_name: String,
    lines: Vec<Option<Vec<u8>>>,
}

#[derive(Serialize, Deserialize)]
struct ContainerData {
    used: Vec<bool>,
    columns: Vec<ColumnData>,
}

#[derive(Serialize, Deserialize)]
struct MapData {
    darts: DartStore,
    phi1: Vec<Dart>,
    phi_1: Vec<Dart>,
    phi2: Vec<Dart>,
    boundary: Vec<bool>,
    embeddings: [Option<Vec<u32>>; 4],
    containers: [ContainerData; 4],
}

impl ContainerData {
    fn new(container: &AttributeContainer) -> Result<Self, Error> {
        let columns = container
            .slots()
            .map(|slot| {
                Ok(ColumnData {
                    name: slot.name.clone(),
                    type_name: slot.column.type_name().to_string(),
                    lines: slot.column.encode()?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(ContainerData {
            used: container.used_flags().to_vec(),
            columns,
        })
    }

    fn into_container(self) -> Result<AttributeContainer, Error> {
        let nlines = self.used.len();
        let mut container = AttributeContainer::from_parts(self.used);
        for col in self.columns {
            if col.lines.len() != nlines {
                return Err(Error::MismatchedArrayLengths(col.lines.len(), nlines));
            }
            container.add_column(
                &col.name,
                Box::new(EncodedColumn::new(col.type_name, col.lines)),
            )?;
        }
        Ok(container)
    }
}

impl Map {
    /// Write the map and all its attributes to `writer`.
    pub fn save_bin<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let [c0, c1, c2, c3] = &self.containers;
        let data = MapData {
            darts: self.darts.clone(),
            phi1: self.phi1.clone(),
            phi_1: self.phi_1.clone(),
            phi2: self.phi2.clone(),
            boundary: self.boundary.clone(),
            embeddings: self.embeddings.clone(),
            containers: [
                ContainerData::new(c0)?,
                ContainerData::new(c1)?,
                ContainerData::new(c2)?,
                ContainerData::new(c3)?,
            ],
        };
        bincode::serialize_into(&mut writer, &FORMAT_VERSION)?;
        bincode::serialize_into(&mut writer, &data)?;
        log::debug!("Saved a map with {} darts", self.num_darts());
        Ok(())
    }

    /// Read a map written by [`Map::save_bin`]. The result is checked for
    /// consistency before it is returned.
    pub fn load_bin<R: Read>(mut reader: R) -> Result<Map, Error> {
        let version: u32 = bincode::deserialize_from(&mut reader)?;
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedFormat(version));
        }
        let data: MapData = bincode::deserialize_from(&mut reader)?;
        let mut map = Map::new();
        map.darts = data.darts;
        map.phi1 = data.phi1;
        map.phi_1 = data.phi_1;
        map.phi2 = data.phi2;
        map.boundary = data.boundary;
        map.embeddings = data.embeddings;
        for (orbit, cdata) in Orbit::ALL.into_iter().zip(data.containers) {
            *map.container_mut(orbit) = cdata.into_container()?;
        }
        map.check()?;
        log::debug!("Loaded a map with {} darts", map.num_darts());
        Ok(map)
    }
}

#[cfg(test)]
mod test {
    use super::MapData;
    use crate::{
        Dart, Error, Map, Orbit, POSITION, collapse::test::find_dart, use_glam::BuiltInAdaptorF32,
    };
    use glam::Vec3;
    use serde::{Deserialize, Serialize};

    fn saved_box() -> (Map, Vec<u8>) {
        let (mut qbox, pos) = Map::quad_box::<BuiltInAdaptorF32>(Vec3::ZERO, Vec3::ONE)
            .expect("Cannot create box");
        let tags = qbox
            .add_attribute::<u32>(Orbit::Face, "tag")
            .expect("Cannot add attribute");
        let faces: Vec<_> = qbox.faces().collect();
        for (i, f) in faces.into_iter().enumerate() {
            qbox.set(&tags, f, 10 + i as u32)
                .expect("Cannot write attribute");
        }
        let d = qbox.darts().next().expect("Cannot find a dart");
        qbox.set(&pos, d, Vec3::splat(-1.0))
            .expect("Cannot write position");
        let mut bytes = Vec::new();
        qbox.save_bin(&mut bytes).expect("Cannot save map");
        (qbox, bytes)
    }

    #[test]
    fn t_save_load_round_trip() {
        let (qbox, bytes) = saved_box();
        let mut loaded = Map::load_bin(bytes.as_slice()).expect("Cannot load map");
        assert_eq!(loaded.num_darts(), qbox.num_darts());
        assert_eq!(loaded.num_vertices(), 8);
        assert_eq!(loaded.num_edges(), 12);
        assert_eq!(loaded.num_faces(), 6);
        for d in qbox.darts() {
            assert_eq!(loaded.phi1(d), qbox.phi1(d));
            assert_eq!(loaded.phi2(d), qbox.phi2(d));
        }
        let pos = loaded
            .attribute::<Vec3>(Orbit::Vertex, POSITION)
            .expect("Cannot find positions");
        let tags = loaded
            .attribute::<u32>(Orbit::Face, "tag")
            .expect("Cannot find tags");
        let d = loaded.darts().next().expect("Cannot find a dart");
        assert_eq!(*loaded.get(&pos, d).expect("Cannot read position"), Vec3::splat(-1.0));
        let mut values: Vec<u32> = loaded
            .attribute_iter(&tags)
            .expect("Cannot read tags")
            .map(|(_, t)| *t)
            .collect();
        values.sort();
        assert_eq!(values, (10..16).collect::<Vec<_>>());
    }

    #[test]
    fn t_loaded_attribute_type_is_checked() {
        let (_, bytes) = saved_box();
        let mut loaded = Map::load_bin(bytes.as_slice()).expect("Cannot load map");
        assert!(matches!(
            loaded.attribute::<f64>(Orbit::Face, "tag"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(loaded.attribute::<u32>(Orbit::Face, "tag").is_ok());
    }

    #[test]
    fn t_edit_before_claiming_attributes() {
        let (_, bytes) = saved_box();
        let mut loaded = Map::load_bin(bytes.as_slice()).expect("Cannot load map");
        // Columns are still encoded while the map is edited.
        let d = find_dart(&loaded, 5, 6).expect("Cannot find dart");
        loaded.collapse_edge(d).expect("Cannot collapse edge");
        let d = find_dart(&loaded, 0, 1).expect("Cannot find dart");
        let nd = loaded.cut_edge(d).expect("Cannot cut edge");
        loaded.check().expect("Map is inconsistent");
        // The new vertex recycles the line of the removed vertex.
        assert_eq!(loaded.embedding(nd, Orbit::Vertex), Some(5));
        let pos = loaded
            .attribute::<Vec3>(Orbit::Vertex, POSITION)
            .expect("Cannot find positions");
        assert_eq!(loaded.num_vertices(), 8);
        assert_eq!(*loaded.get(&pos, nd).expect("Cannot read position"), Vec3::ZERO);
        assert_eq!(*loaded.value(&pos, 6).expect("Cannot read position"), Vec3::ONE);
    }

    /// Same layout as the dart store, with its fields open for editing.
    #[derive(Serialize, Deserialize)]
    struct RawDartStore {
        live: Vec<bool>,
        free: Vec<u32>,
    }

    /// Save `map`, let `edit` change the free list of its dart store, and
    /// return the resulting bytes.
    fn with_free_list(map: &Map, edit: impl FnOnce(&mut Vec<u32>)) -> Vec<u8> {
        let mut bytes = Vec::new();
        map.save_bin(&mut bytes).expect("Cannot save map");
        let (version, mut data): (u32, MapData) =
            bincode::deserialize(&bytes).expect("Cannot decode map");
        let mut raw: RawDartStore = bincode::deserialize(
            &bincode::serialize(&data.darts).expect("Cannot encode darts"),
        )
        .expect("Cannot decode darts");
        edit(&mut raw.free);
        data.darts = bincode::deserialize(&bincode::serialize(&raw).expect("Cannot encode darts"))
            .expect("Cannot decode darts");
        bincode::serialize(&(version, &data)).expect("Cannot encode map")
    }

    #[test]
    fn t_corrupt_free_list_is_rejected() {
        let mut tet = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        // A live dart listed as free.
        let bytes = with_free_list(&tet, |free| free.push(0));
        assert!(matches!(
            Map::load_bin(bytes.as_slice()),
            Err(Error::CorruptFreeList(0))
        ));
        let d = tet.darts().next().expect("Cannot find a dart");
        tet.collapse_edge(d).expect("Cannot collapse edge");
        let released: Vec<u32> = (0..tet.dart_capacity() as u32)
            .filter(|i| !tet.is_valid(Dart::from(*i)))
            .collect();
        assert_eq!(released.len(), 6);
        // A released dart listed twice, or missing.
        let twice = with_free_list(&tet, |free| free.push(released[0]));
        assert!(matches!(
            Map::load_bin(twice.as_slice()),
            Err(Error::CorruptFreeList(_))
        ));
        let missing = with_free_list(&tet, |free| free.clear());
        assert!(matches!(
            Map::load_bin(missing.as_slice()),
            Err(Error::CorruptFreeList(_))
        ));
        // The untouched file still loads and recycles only released darts.
        let intact = with_free_list(&tet, |_| {});
        let mut loaded = Map::load_bin(intact.as_slice()).expect("Cannot load map");
        assert_eq!(loaded.num_darts(), 6);
        let d = loaded.darts().next().expect("Cannot find a dart");
        loaded.cut_edge(d).expect("Cannot cut edge");
        loaded.check().expect("Map is inconsistent");
        assert_eq!(loaded.num_darts(), 8);
        assert_eq!(loaded.dart_capacity(), 12);
    }

    #[test]
    fn t_unsupported_format() {
        let mut bytes = bincode::serialize(&7u32).expect("Cannot serialize");
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            Map::load_bin(bytes.as_slice()),
            Err(Error::UnsupportedFormat(7))
        ));
    }

    #[test]
    fn t_truncated_file() {
        let (_, bytes) = saved_box();
        assert!(matches!(
            Map::load_bin(&bytes[..bytes.len() / 2]),
            Err(Error::Serialization(_))
        ));
    }
}
