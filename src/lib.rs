/*!
A combinatorial 2-map library, for representing and editing oriented surface
meshes.

# Overview

+ The topology of a [`Map`] is made of *darts*, oriented halves of edges, and
  two relations over them: `phi1` links each dart to the next dart of its
  face, and `phi2` pairs the two darts of an edge. Vertices, edges, faces and
  connected components are the *orbits* of these relations, see [`Orbit`].
  Holes in open surfaces are closed by boundary faces, so `phi2` never has a
  fixed point.

+ Data is attached to cells through attribute containers. Adding the first
  attribute on an orbit *embeds* it: every cell of that kind gets a line in the
  container of that orbit. Attributes are typed columns accessed through an
  [`AttributeHandle`].

+ [`DartMarker`] and [`CellMarker`] flag darts and cells during traversals.
  [`Traversor`] visits every cell of a kind once, and [`CoherentTraversor`]
  does the same in an order where consecutive cells tend to be neighbors.

+ Edit operations cut edges, split faces, collapse edges and cut the map with
  a plane. Every edit checks its preconditions before it changes anything, so
  a failed edit leaves the map as it was.

+ Geometry is not part of the map. Algorithms that need positions are generic
  over an [`Adaptor`] that tells them how to work with vectors and scalars.
  Built-in adaptors for [`glam`](https://crates.io/crates/glam) vectors are in
  [`use_glam`].

+ With the `decimate` feature, which is enabled by default, the [`decimate`]
  module provides edge collapse decimation, and [`ProgressiveMesh`] builds a
  stack of coarser levels on top of [`MultiresMap`].
*/

mod adaptor;
mod attribute;
mod builder;
mod check;
mod collapse;
mod compact;
mod dart;
mod edit;
mod error;
mod macros;
mod map;
mod marker;
mod math;
mod multires;
mod obj;
mod orbit;
mod plane_cut;
mod primitive;
mod query;
mod render;
mod serialize;
mod traversor;

pub mod use_glam;

#[cfg(feature = "decimate")]
pub mod decimate;
#[cfg(feature = "decimate")]
mod pm;

pub use adaptor::Adaptor;
pub use attribute::{AttributeContainer, AttributeHandle, AttributeValue};
pub use builder::POSITION;
pub use dart::{Dart, Handle};
pub use error::Error;
pub use map::Map;
pub use marker::{CellMarker, DartMarker};
pub use math::NORMAL;
pub use multires::MultiresMap;
pub use orbit::{Orbit, OrbitIter};
pub use plane_cut::{ContourLoop, CutContour, Plane, PlaneCutOptions};
pub use query::{DEFAULT_FEATURE_ANGLE, feature_edge_detection, squared_distance_point_to_face};
pub use traversor::{COHERENT_WINDOW, CoherentTraversor, Traversor};

#[cfg(feature = "decimate")]
pub use pm::ProgressiveMesh;
