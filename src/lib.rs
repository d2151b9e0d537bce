//! # Grainlayer
//!
//! Converts 2D polycrystal meshes with zero-thickness cohesive elements
//! into meshes with finite-thickness grain boundary layers.
//!
//! Each grain is shrunk towards its centroid. The two sides of every
//! cohesive element separate, and the gap between them becomes an interface
//! element. Holes opened where three or more grains meet are filled with
//! triangles. Periodic meshes stay periodic.
//!
//! ## Features
//!
//! - **Abaqus input decks**: nodes, element blocks and sets are read and
//!   written back with the original layout preserved
//! - **Identifier-keyed mesh model**: grains, cohesive sides and boundary
//!   rings are resolved once at load time
//! - **Periodicity**: nodes on opposite domain faces are matched with a
//!   tolerance and checked again after shrinkage
//! - **Fail-fast validation**: every error names the offending node, element
//!   or grain and no output is written on failure
//!
//! ## Quick Start
//!
//! ```no_run
//! use grainlayer::prelude::*;
//!
//! let config = Config::new("tess.inp", "tess.cent")
//!     .with_periodic(true)
//!     .with_shrink_factor(0.05);
//! let summary = grainlayer::pipeline::run(&config).unwrap();
//! println!(
//!     "{} interface elements written to {}",
//!     summary.conversion.interfaces.len(),
//!     summary.output.display()
//! );
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use grainlayer::prelude::*;
//! use grainlayer::algo::{shrink_grains, stitch_interfaces, ShrinkOptions};
//! use nalgebra::Point2;
//!
//! let mut builder = MeshBuilder::new();
//! for (id, x, y) in [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0),
//!                    (4, 1.0, 0.0), (5, 2.0, 0.0), (6, 1.0, 1.0)] {
//!     builder.add_node(NodeId::new(id), Point2::new(x, y));
//! }
//! builder.add_element(ElementId::new(1), "CPE3", vec![NodeId::new(1), NodeId::new(2), NodeId::new(3)]).unwrap();
//! builder.add_element(ElementId::new(2), "CPE3", vec![NodeId::new(4), NodeId::new(5), NodeId::new(6)]).unwrap();
//! builder.add_element(
//!     ElementId::new(3),
//!     "COH2D4",
//!     vec![NodeId::new(2), NodeId::new(3), NodeId::new(6), NodeId::new(4)],
//! ).unwrap();
//! builder.add_element_set("face1", vec![ElementId::new(1)]);
//! builder.add_element_set("face2", vec![ElementId::new(2)]);
//! let mut mesh = builder.build().unwrap();
//!
//! mesh.set_centroid(GrainId::new(1), Point2::new(2.0 / 3.0, 1.0 / 3.0));
//! mesh.set_centroid(GrainId::new(2), Point2::new(4.0 / 3.0, 1.0 / 3.0));
//!
//! shrink_grains(&mut mesh, &[], &ShrinkOptions::default().free_domain_faces()).unwrap();
//! let interfaces = stitch_interfaces(&mesh, ElementId::new(4)).unwrap();
//! assert_eq!(interfaces.len(), 1);
//! assert_eq!(interfaces[0].nodes.len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;
pub mod pipeline;

/// Prelude module for convenient imports.
///
/// ```
/// use grainlayer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::io::Deck;
    pub use crate::mesh::{
        CohesiveElement, ElementId, Grain, GrainId, Mesh, MeshBuilder, Node, NodeId,
    };
}

pub use error::{Error, Result};

// Re-export nalgebra types for convenience
pub use nalgebra;
