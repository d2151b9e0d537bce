//! Polycrystal mesh data structures.
//!
//! A [`Mesh`] holds nodes, bulk elements grouped into grains, and the
//! zero-thickness cohesive elements that join neighbouring grains. Every
//! grain owns its own copy of each node on its boundary, so two grains that
//! touch have coincident but distinct nodes, paired up by the cohesive
//! elements between them.
//!
//! # Identifiers
//!
//! Entities are keyed by the labels of the input deck:
//! - [`NodeId`] - a node label
//! - [`ElementId`] - a bulk, cohesive or generated element label
//! - [`GrainId`] - the integer suffix of a grain's element set name
//!
//! # Construction
//!
//! Meshes are usually read with [`crate::io::load`]; [`MeshBuilder`] builds
//! them from records directly and validates the topology:
//!
//! ```
//! use grainlayer::mesh::{ElementId, GrainId, MeshBuilder, NodeId};
//! use nalgebra::Point2;
//!
//! let mut b = MeshBuilder::new();
//! for (id, x, y) in [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0), (4, 0.0, 1.0)] {
//!     b.add_node(NodeId::new(id), Point2::new(x, y));
//! }
//! let tri = |a, b, c| vec![NodeId::new(a), NodeId::new(b), NodeId::new(c)];
//! b.add_element(ElementId::new(1), "CPE3", tri(1, 2, 3)).unwrap();
//! b.add_element(ElementId::new(2), "CPE3", tri(1, 3, 4)).unwrap();
//! b.add_element_set("face1", vec![ElementId::new(1), ElementId::new(2)]);
//!
//! let mesh = b.build().unwrap();
//! let ring: Vec<_> = mesh.boundary_nodes(GrainId::new(1)).map(NodeId::get).collect();
//! assert_eq!(ring, vec![1, 2, 3, 4]);
//! ```

mod boundary;
mod builder;
mod element;
pub mod geometry;
mod index;
mod model;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::{MeshBuilder, DEFAULT_GRAIN_PREFIX};
pub use element::{BulkElement, CohesiveElement, ElementEdge, ElementKind, Grain, Node};
pub use geometry::{Axis, DomainBox};
pub use index::{ElementId, GrainId, NodeId};
pub use model::{ElementSet, Mesh, NodeSet};
