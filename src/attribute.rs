/*!
Attribute containers store the per-cell data of a map.

Each orbit kind has one container. A container is a table of *lines*; every
embedded cell owns exactly one line, and every named attribute is a column
with one value per line. Lines are used or free. Free lines are recycled, and
a recycled line is reset to the default value of every column.

Columns are type erased behind [`GenericColumn`] so that attributes of
different types can live in the same container. Typed access goes through
[`AttributeHandle`], which remembers the value type at compile time.
*/

use crate::{dart::Dart, error::Error, map::Map, orbit::Orbit};
use serde::{Serialize, de::DeserializeOwned};
use std::{any::Any, marker::PhantomData};

/// Types that can be stored in an attribute column.
pub trait AttributeValue:
    Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> AttributeValue for T where
    T: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Typed reference to an attribute column of a map.
pub struct AttributeHandle<T> {
    orbit: Orbit,
    slot: u32,
    id: u64,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for AttributeHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttributeHandle<T> {}

impl<T> std::fmt::Debug for AttributeHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AttributeHandle({}, {})", self.orbit, self.slot)
    }
}

impl<T> AttributeHandle<T> {
    pub fn orbit(&self) -> Orbit {
        self.orbit
    }
}

pub(crate) trait GenericColumn: Send + Sync {
    fn type_name(&self) -> &str;

    fn len(&self) -> usize;

    fn try_reserve(&mut self, n: usize) -> Result<(), Error>;

    fn push_default(&mut self);

    fn reset(&mut self, line: usize);

    fn copy(&mut self, src: usize, dst: usize);

    /// Drop the lines whose `keep` flag is false, preserving the order of the
    /// others.
    fn retain_lines(&mut self, keep: &[bool]);

    fn encode(&self) -> Result<Vec<Option<Vec<u8>>>, Error>;

    fn clone_box(&self) -> Box<dyn GenericColumn>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Column<T: AttributeValue> {
    values: Vec<T>,
}

impl<T: AttributeValue> GenericColumn for Column<T> {
    fn type_name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn try_reserve(&mut self, n: usize) -> Result<(), Error> {
        Ok(self.values.try_reserve(n)?)
    }

    fn push_default(&mut self) {
        self.values.push(T::default());
    }

    fn reset(&mut self, line: usize) {
        self.values[line] = T::default();
    }

    fn copy(&mut self, src: usize, dst: usize) {
        self.values[dst] = self.values[src].clone();
    }

    fn retain_lines(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.values.retain(|_| flags.next().copied().unwrap_or(false));
    }

    fn encode(&self) -> Result<Vec<Option<Vec<u8>>>, Error> {
        self.values
            .iter()
            .map(|v| Ok(Some(bincode::serialize(v)?)))
            .collect()
    }

    fn clone_box(&self) -> Box<dyn GenericColumn> {
        Box::new(Column {
            values: self.values.clone(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A column read from a serialized map that has not yet been claimed with a
/// concrete type. Values stay encoded; `None` stands for the default value.
pub(crate) struct EncodedColumn {
    type_name: String,
    lines: Vec<Option<Vec<u8>>>,
}

impl EncodedColumn {
    pub fn new(type_name: String, lines: Vec<Option<Vec<u8>>>) -> Self {
        EncodedColumn { type_name, lines }
    }

    fn decode<T: AttributeValue>(&self) -> Result<Column<T>, Error> {
        let values = self
            .lines
            .iter()
            .map(|line| match line {
                Some(bytes) => Ok(bincode::deserialize(bytes)?),
                None => Ok(T::default()),
            })
            .collect::<Result<Vec<T>, Error>>()?;
        Ok(Column { values })
    }
}

impl GenericColumn for EncodedColumn {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn try_reserve(&mut self, n: usize) -> Result<(), Error> {
        Ok(self.lines.try_reserve(n)?)
    }

    fn push_default(&mut self) {
        self.lines.push(None);
    }

    fn reset(&mut self, line: usize) {
        self.lines[line] = None;
    }

    fn copy(&mut self, src: usize, dst: usize) {
        self.lines[dst] = self.lines[src].clone();
    }

    fn retain_lines(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.lines.retain(|_| flags.next().copied().unwrap_or(false));
    }

    fn encode(&self) -> Result<Vec<Option<Vec<u8>>>, Error> {
        Ok(self.lines.clone())
    }

    fn clone_box(&self) -> Box<dyn GenericColumn> {
        Box::new(EncodedColumn {
            type_name: self.type_name.clone(),
            lines: self.lines.clone(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) struct Slot {
    pub id: u64,
    pub name: String,
    pub column: Box<dyn GenericColumn>,
}

impl Clone for Slot {
    fn clone(&self) -> Self {
        Slot {
            id: self.id,
            name: self.name.clone(),
            column: self.column.clone_box(),
        }
    }
}

/// The line table and attribute columns of one orbit kind.
#[derive(Clone, Default)]
pub struct AttributeContainer {
    used: Vec<bool>,
    free: Vec<u32>,
    slots: Vec<Option<Slot>>,
    next_id: u64,
}

impl AttributeContainer {
    /// Number of lines, used or free.
    pub fn num_lines(&self) -> usize {
        self.used.len()
    }

    /// Number of used lines.
    pub fn num_used(&self) -> usize {
        self.used.len() - self.free.len()
    }

    pub fn is_line_used(&self, line: u32) -> bool {
        self.used.get(line as usize).copied().unwrap_or(false)
    }

    /// Used lines in physical order.
    pub fn lines(&self) -> impl Iterator<Item = u32> + use<'_> {
        self.used
            .iter()
            .enumerate()
            .filter_map(|(i, u)| if *u { Some(i as u32) } else { None })
    }

    /// Names of the attributes in this container.
    pub fn names(&self) -> impl Iterator<Item = &str> + use<'_> {
        self.slots.iter().flatten().map(|s| s.name.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub(crate) fn find(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.name == name))
    }

    /// Make sure `n` lines can be allocated without growing any buffer.
    pub(crate) fn reserve(&mut self, n: usize) -> Result<(), Error> {
        let fresh = n.saturating_sub(self.free.len());
        self.used.try_reserve(fresh)?;
        for slot in self.slots.iter_mut().flatten() {
            slot.column.try_reserve(fresh)?;
        }
        Ok(())
    }

    /// Allocate a line, recycling a free one if possible. Call `reserve` first
    /// to make this infallible.
    pub(crate) fn allocate_line(&mut self) -> u32 {
        match self.free.pop() {
            Some(line) => {
                self.used[line as usize] = true;
                for slot in self.slots.iter_mut().flatten() {
                    slot.column.reset(line as usize);
                }
                line
            }
            None => {
                self.used.push(true);
                for slot in self.slots.iter_mut().flatten() {
                    slot.column.push_default();
                }
                (self.used.len() - 1) as u32
            }
        }
    }

    pub(crate) fn release_line(&mut self, line: u32) {
        debug_assert!(self.is_line_used(line), "Releasing a line that is not used");
        self.used[line as usize] = false;
        self.free.push(line);
    }

    pub(crate) fn copy_line(&mut self, src: u32, dst: u32) {
        for slot in self.slots.iter_mut().flatten() {
            slot.column.copy(src as usize, dst as usize);
        }
    }

    /// New index of every line once the free lines are removed, or `None` for
    /// free lines.
    pub(crate) fn compacted_lines(&self) -> Result<Vec<Option<u32>>, Error> {
        let mut out = Vec::new();
        out.try_reserve(self.used.len())?;
        let mut next = 0u32;
        out.extend(self.used.iter().map(|u| {
            u.then(|| {
                next += 1;
                next - 1
            })
        }));
        Ok(out)
    }

    /// Remove the free lines from every column, keeping the used lines in
    /// order.
    pub(crate) fn compact(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.column.retain_lines(&self.used);
        }
        let n = self.num_used();
        self.used.clear();
        self.used.resize(n, true);
        self.free.clear();
    }

    fn check_line(&self, line: u32) -> Result<(), Error> {
        match self.used.get(line as usize) {
            Some(true) => Ok(()),
            Some(false) => Err(Error::ReleasedLine(line)),
            None => Err(Error::OutOfBoundsAccess(line)),
        }
    }

    pub(crate) fn add_column(
        &mut self,
        name: &str,
        column: Box<dyn GenericColumn>,
    ) -> Result<(usize, u64), Error> {
        if self.has_attribute(name) {
            return Err(Error::DuplicateAttribute(name.to_string()));
        }
        debug_assert_eq!(column.len(), self.used.len());
        let id = self.next_id;
        self.next_id += 1;
        let slot = Slot {
            id,
            name: name.to_string(),
            column,
        };
        let index = match self.slots.iter().position(|s| s.is_none()) {
            Some(i) => {
                self.slots[i] = Some(slot);
                i
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        Ok((index, id))
    }

    fn add<T: AttributeValue>(&mut self, name: &str) -> Result<(usize, u64), Error> {
        if self.has_attribute(name) {
            return Err(Error::DuplicateAttribute(name.to_string()));
        }
        let mut values = Vec::new();
        values.try_reserve(self.used.len())?;
        values.resize(self.used.len(), T::default());
        self.add_column(name, Box::new(Column { values }))
    }

    fn slot(&self, index: u32, id: u64) -> Result<&Slot, Error> {
        match self.slots.get(index as usize) {
            Some(Some(s)) if s.id == id => Ok(s),
            _ => Err(Error::StaleAttributeHandle),
        }
    }

    fn slot_mut(&mut self, index: u32, id: u64) -> Result<&mut Slot, Error> {
        match self.slots.get_mut(index as usize) {
            Some(Some(s)) if s.id == id => Ok(s),
            _ => Err(Error::StaleAttributeHandle),
        }
    }

    fn typed<T: AttributeValue>(&self, index: u32, id: u64) -> Result<&Vec<T>, Error> {
        let slot = self.slot(index, id)?;
        match slot.column.as_any().downcast_ref::<Column<T>>() {
            Some(col) => Ok(&col.values),
            None => Err(mismatch::<T>(slot.column.type_name())),
        }
    }

    fn typed_mut<T: AttributeValue>(&mut self, index: u32, id: u64) -> Result<&mut Vec<T>, Error> {
        let slot = self.slot_mut(index, id)?;
        let stored = slot.column.type_name().to_string();
        match slot.column.as_any_mut().downcast_mut::<Column<T>>() {
            Some(col) => Ok(&mut col.values),
            None => Err(mismatch::<T>(&stored)),
        }
    }

    /// Typed lookup by name. Encoded columns read from a file are decoded
    /// here, after checking the stored type name.
    fn claim<T: AttributeValue>(&mut self, name: &str) -> Result<(usize, u64), Error> {
        let index = self
            .find(name)
            .ok_or_else(|| Error::AttributeNotFound(name.to_string()))?;
        let Some(slot) = self.slots[index].as_mut() else {
            return Err(Error::AttributeNotFound(name.to_string()));
        };
        if slot.column.as_any().is::<Column<T>>() {
            return Ok((index, slot.id));
        }
        if slot.column.type_name() != std::any::type_name::<T>() {
            return Err(mismatch::<T>(slot.column.type_name()));
        }
        let decoded = match slot.column.as_any().downcast_ref::<EncodedColumn>() {
            Some(enc) => enc.decode::<T>()?,
            None => return Err(mismatch::<T>(slot.column.type_name())),
        };
        slot.column = Box::new(decoded);
        Ok((index, slot.id))
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = &Slot> + use<'_> {
        self.slots.iter().flatten()
    }

    pub(crate) fn from_parts(used: Vec<bool>) -> Self {
        let free = used
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(i, u)| if *u { None } else { Some(i as u32) })
            .collect();
        AttributeContainer {
            used,
            free,
            slots: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn used_flags(&self) -> &[bool] {
        &self.used
    }
}

fn mismatch<T>(stored: &str) -> Error {
    Error::TypeMismatch {
        stored: stored.to_string(),
        requested: std::any::type_name::<T>().to_string(),
    }
}

/// Attribute API of the map.
impl Map {
    /**
     * Add an attribute named `name` on cells of `orbit`. All existing cells
     * get the default value. The orbit is embedded first if it is not yet.
     */
    pub fn add_attribute<T: AttributeValue>(
        &mut self,
        orbit: Orbit,
        name: &str,
    ) -> Result<AttributeHandle<T>, Error> {
        if self.container(orbit).has_attribute(name) {
            return Err(Error::DuplicateAttribute(name.to_string()));
        }
        self.embed_orbit(orbit)?;
        let (slot, id) = self.container_mut(orbit).add::<T>(name)?;
        Ok(AttributeHandle {
            orbit,
            slot: slot as u32,
            id,
            _phantom: PhantomData,
        })
    }

    /// Look up an existing attribute by name, checking its value type.
    pub fn attribute<T: AttributeValue>(
        &mut self,
        orbit: Orbit,
        name: &str,
    ) -> Result<AttributeHandle<T>, Error> {
        let (slot, id) = self.container_mut(orbit).claim::<T>(name)?;
        Ok(AttributeHandle {
            orbit,
            slot: slot as u32,
            id,
            _phantom: PhantomData,
        })
    }

    pub fn remove_attribute<T: AttributeValue>(
        &mut self,
        handle: AttributeHandle<T>,
    ) -> Result<(), Error> {
        let container = self.container_mut(handle.orbit);
        container.slot(handle.slot, handle.id)?;
        container.slots[handle.slot as usize] = None;
        Ok(())
    }

    /// Value of the attribute on the cell of `d`.
    pub fn get<T: AttributeValue>(&self, handle: &AttributeHandle<T>, d: Dart) -> Result<&T, Error> {
        let line = self.cell_index(d, handle.orbit)?;
        self.value(handle, line)
    }

    pub fn get_mut<T: AttributeValue>(
        &mut self,
        handle: &AttributeHandle<T>,
        d: Dart,
    ) -> Result<&mut T, Error> {
        let line = self.cell_index(d, handle.orbit)?;
        self.value_mut(handle, line)
    }

    pub fn set<T: AttributeValue>(
        &mut self,
        handle: &AttributeHandle<T>,
        d: Dart,
        val: T,
    ) -> Result<(), Error> {
        *self.get_mut(handle, d)? = val;
        Ok(())
    }

    /// Value of the attribute at a line of the container.
    pub fn value<T: AttributeValue>(
        &self,
        handle: &AttributeHandle<T>,
        line: u32,
    ) -> Result<&T, Error> {
        let container = self.container(handle.orbit);
        let values = container.typed::<T>(handle.slot, handle.id)?;
        container.check_line(line)?;
        Ok(&values[line as usize])
    }

    pub fn value_mut<T: AttributeValue>(
        &mut self,
        handle: &AttributeHandle<T>,
        line: u32,
    ) -> Result<&mut T, Error> {
        let container = self.container_mut(handle.orbit);
        container.check_line(line)?;
        let values = container.typed_mut::<T>(handle.slot, handle.id)?;
        Ok(&mut values[line as usize])
    }

    /// The whole column, indexed by line. Released lines hold stale values.
    pub fn column<T: AttributeValue>(&self, handle: &AttributeHandle<T>) -> Result<&[T], Error> {
        self.container(handle.orbit)
            .typed::<T>(handle.slot, handle.id)
            .map(|v| v.as_slice())
    }

    pub fn column_mut<T: AttributeValue>(
        &mut self,
        handle: &AttributeHandle<T>,
    ) -> Result<&mut [T], Error> {
        self.container_mut(handle.orbit)
            .typed_mut::<T>(handle.slot, handle.id)
            .map(|v| v.as_mut_slice())
    }

    /// Used lines and their values, in physical order.
    pub fn attribute_iter<T: AttributeValue>(
        &self,
        handle: &AttributeHandle<T>,
    ) -> Result<impl Iterator<Item = (u32, &T)> + use<'_, T>, Error> {
        let container = self.container(handle.orbit);
        let values = container.typed::<T>(handle.slot, handle.id)?;
        Ok(container.lines().map(move |line| (line, &values[line as usize])))
    }

    /// Copy every attribute value of line `src` to line `dst`.
    pub fn copy_line(&mut self, orbit: Orbit, src: u32, dst: u32) -> Result<(), Error> {
        let container = self.container_mut(orbit);
        container.check_line(src)?;
        container.check_line(dst)?;
        container.copy_line(src, dst);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{Error, Map, Orbit};

    #[test]
    fn t_attribute_defaults_and_set() {
        let mut map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let weight = map
            .add_attribute::<f64>(Orbit::Face, "weight")
            .expect("Cannot add attribute");
        assert_eq!(map.num_cells(Orbit::Face), 4);
        let faces: Vec<_> = map.faces().collect();
        for &f in &faces {
            assert_eq!(*map.get(&weight, f).expect("Cannot read attribute"), 0.0);
        }
        map.set(&weight, faces[1], 2.5).expect("Cannot write attribute");
        // Any dart of the face reads the same value.
        assert_eq!(
            *map.get(&weight, map.phi1(faces[1]))
                .expect("Cannot read attribute"),
            2.5
        );
        assert_eq!(
            map.attribute_iter(&weight)
                .expect("Cannot iterate attribute")
                .map(|(_, v)| *v)
                .sum::<f64>(),
            2.5
        );
    }

    #[test]
    fn t_attribute_duplicate_and_mismatch() {
        let mut map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        map.add_attribute::<u32>(Orbit::Edge, "id")
            .expect("Cannot add attribute");
        assert!(matches!(
            map.add_attribute::<u32>(Orbit::Edge, "id"),
            Err(Error::DuplicateAttribute(_))
        ));
        // Same name on another orbit is fine.
        map.add_attribute::<u32>(Orbit::Vertex, "id")
            .expect("Cannot add attribute");
        assert!(matches!(
            map.attribute::<f32>(Orbit::Edge, "id"),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            map.attribute::<u32>(Orbit::Face, "id"),
            Err(Error::AttributeNotFound(_))
        ));
        assert!(map.attribute::<u32>(Orbit::Edge, "id").is_ok());
    }

    #[test]
    fn t_attribute_removed_handle_is_stale() {
        let mut map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let a = map
            .add_attribute::<i32>(Orbit::Vertex, "a")
            .expect("Cannot add attribute");
        map.remove_attribute(a).expect("Cannot remove attribute");
        let b = map
            .add_attribute::<i32>(Orbit::Vertex, "b")
            .expect("Cannot add attribute");
        let d = map.darts().next().expect("Cannot find a dart");
        assert!(matches!(map.get(&a, d), Err(Error::StaleAttributeHandle)));
        assert!(map.get(&b, d).is_ok());
    }

    #[test]
    fn t_attribute_line_errors() {
        let mut map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let a = map
            .add_attribute::<i32>(Orbit::Vertex, "a")
            .expect("Cannot add attribute");
        assert!(matches!(
            map.value(&a, 100),
            Err(Error::OutOfBoundsAccess(100))
        ));
        assert_eq!(map.column(&a).expect("Cannot read column").len(), 4);
        map.column_mut(&a).expect("Cannot read column")[2] = 7;
        map.copy_line(Orbit::Vertex, 2, 0).expect("Cannot copy line");
        assert_eq!(*map.value(&a, 0).expect("Cannot read value"), 7);
    }

    #[test]
    fn t_recycled_line_is_reset() {
        let mut map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let a = map
            .add_attribute::<i32>(Orbit::Face, "a")
            .expect("Cannot add attribute");
        map.column_mut(&a).expect("Cannot read column").fill(9);
        let c = map.container_mut(Orbit::Face);
        c.release_line(1);
        c.reserve(1).expect("Cannot reserve");
        assert_eq!(c.allocate_line(), 1);
        assert_eq!(*map.value(&a, 1).expect("Cannot read value"), 0);
        assert_eq!(*map.value(&a, 0).expect("Cannot read value"), 9);
    }
}
