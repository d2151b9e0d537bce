//! Grain shrinkage.
//!
//! Every grain is scaled towards its centroid by a factor `s`:
//!
//! ```text
//! new = old - s * (old - centroid)
//! ```
//!
//! Because each grain owns its own copies of the boundary nodes, shrinking
//! grains independently opens a gap of finite thickness along every grain
//! boundary. Nodes on the outer faces of the domain may be held on their
//! face so the domain stays rectangular.
//!
//! After the move the grain rings are checked: each must keep its
//! orientation and a non-vanishing area, and must stay a simple polygon.
//!
//! # Example
//!
//! ```
//! use grainlayer::algo::shrink::{shrink_grains, ShrinkOptions};
//! use grainlayer::mesh::{ElementId, GrainId, MeshBuilder, NodeId};
//! use nalgebra::Point2;
//!
//! let mut b = MeshBuilder::new();
//! for (id, x, y) in [(1, 0.0, 0.0), (2, 2.0, 0.0), (3, 0.0, 2.0)] {
//!     b.add_node(NodeId::new(id), Point2::new(x, y));
//! }
//! b.add_element(ElementId::new(1), "CPE3", (1..=3).map(NodeId::new).collect()).unwrap();
//! b.add_element_set("face1", vec![ElementId::new(1)]);
//! let mut mesh = b.build().unwrap();
//! mesh.set_centroid(GrainId::new(1), Point2::new(0.5, 0.5));
//!
//! let options = ShrinkOptions::default().with_factor(0.5).free_domain_faces();
//! shrink_grains(&mut mesh, &[], &options).unwrap();
//! assert_eq!(mesh.position(NodeId::new(2)), Some(Point2::new(1.25, 0.25)));
//! ```

use std::collections::HashMap;

use log::{debug, info};
use nalgebra::Point2;

use super::periodic::{reconcile_periodicity, verify_periodicity, PeriodicLink};
use crate::error::{Error, GeometryError, Result, StructuralError};
use crate::mesh::geometry::{is_simple, signed_area};
use crate::mesh::{Axis, GrainId, Mesh, NodeId};

/// A ring whose area falls below this fraction of its original area has
/// collapsed.
const COLLAPSE_RATIO: f64 = 1e-14;

/// Options for grain shrinkage.
#[derive(Debug, Clone)]
pub struct ShrinkOptions {
    /// Shrink factor `s`, in `[0, 1)`. Zero leaves the mesh unchanged.
    pub factor: f64,

    /// Distance used to decide whether a node lies on a domain face, and the
    /// allowed periodic deviation after shrinkage.
    pub tolerance: f64,

    /// Keep nodes on domain faces on their face (corners stay fixed).
    pub constrain_domain_faces: bool,

    /// Restore periodic pairs after shrinkage instead of failing on them.
    pub reconcile_periodic: bool,
}

impl Default for ShrinkOptions {
    fn default() -> Self {
        Self {
            factor: 0.1,
            tolerance: 1e-6,
            constrain_domain_faces: true,
            reconcile_periodic: false,
        }
    }
}

impl ShrinkOptions {
    /// Set the shrink factor.
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Set the face and periodicity tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Let nodes on domain faces move freely.
    pub fn free_domain_faces(mut self) -> Self {
        self.constrain_domain_faces = false;
        self
    }

    /// Set whether periodic pairs are restored after shrinkage.
    pub fn with_reconcile_periodic(mut self, reconcile: bool) -> Self {
        self.reconcile_periodic = reconcile;
        self
    }
}

/// What a shrink pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShrinkReport {
    /// Grains shrunk.
    pub grains: usize,
    /// Nodes moved.
    pub moved_nodes: usize,
    /// Maximum-face nodes moved to restore periodicity.
    pub reconciled_nodes: usize,
    /// Smallest ratio of shrunk to original ring area over all grains.
    pub min_area_ratio: f64,
}

/// Shrink every grain towards its centroid.
///
/// `links` are the periodic links of the mesh (empty when not periodic);
/// they are verified, or reconciled first, after the move.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] if the factor is outside `[0, 1)`
/// - [`StructuralError::SharedNode`] if a node belongs to two grains
/// - [`StructuralError::MissingCentroid`] if a grain has no centroid
/// - [`crate::error::PeriodicityError::Inconsistent`] if a periodic pair broke
/// - [`GeometryError`] if a grain ring inverts, collapses or self-intersects
pub fn shrink_grains(
    mesh: &mut Mesh,
    links: &[PeriodicLink],
    options: &ShrinkOptions,
) -> Result<ShrinkReport> {
    let s = options.factor;
    if !(0.0..1.0).contains(&s) {
        return Err(Error::invalid_param("shrink factor", s, "must be in [0, 1)"));
    }
    let domain = mesh.domain().ok_or(StructuralError::EmptyMesh)?;

    let mut centroids: HashMap<GrainId, Point2<f64>> = HashMap::with_capacity(mesh.num_grains());
    for grain in mesh.grains() {
        let centroid = grain
            .centroid
            .ok_or(StructuralError::MissingCentroid { grain: grain.id })?;
        centroids.insert(grain.id, centroid);
    }

    for node in mesh.nodes() {
        let mut grains = node.grains.iter();
        if let (Some(&first), Some(&second)) = (grains.next(), grains.next()) {
            return Err(StructuralError::SharedNode {
                node: node.id,
                first,
                second,
            }
            .into());
        }
    }

    let areas_before = ring_areas(mesh);

    let owned: Vec<(NodeId, GrainId)> = mesh
        .nodes()
        .filter_map(|n| n.sole_grain().map(|g| (n.id, g)))
        .collect();
    let mut moved = 0;
    for (id, grain) in owned {
        let Some(node) = mesh.node_mut(id) else {
            continue;
        };
        let old = node.position;
        let mut new = old - (old - centroids[&grain]) * s;
        if options.constrain_domain_faces {
            for axis in Axis::ALL {
                if domain.on_face(&old, axis, options.tolerance) {
                    new[axis.index()] = old[axis.index()];
                }
            }
        }
        if new != old {
            node.position = new;
            moved += 1;
        }
    }
    debug!("moved {} node(s) at shrink factor {}", moved, s);

    let mut reconciled = 0;
    if !links.is_empty() {
        if options.reconcile_periodic {
            reconciled = reconcile_periodicity(mesh, links);
            debug!("reconciled {} periodic node(s)", reconciled);
        }
        verify_periodicity(mesh, links, options.tolerance)?;
    }

    let mut min_area_ratio = f64::INFINITY;
    for (grain, before) in areas_before {
        let Some(g) = mesh.grain(grain) else {
            continue;
        };
        for (ring, &area_before) in g.boundary.iter().zip(before.iter()) {
            let points = mesh.ring_positions(ring);
            let area_after = signed_area(&points);
            if area_before.signum() != area_after.signum()
                || area_after.abs() <= COLLAPSE_RATIO * area_before.abs()
            {
                return Err(GeometryError::Inverted {
                    grain,
                    factor: s,
                    before: area_before,
                    after: area_after,
                }
                .into());
            }
            if !is_simple(&points) {
                return Err(GeometryError::SelfIntersection { grain, factor: s }.into());
            }
            min_area_ratio = min_area_ratio.min(area_after / area_before);
        }
    }

    info!(
        "Shrunk {} grains by factor {} ({} nodes moved)",
        mesh.num_grains(),
        s,
        moved
    );

    Ok(ShrinkReport {
        grains: mesh.num_grains(),
        moved_nodes: moved,
        reconciled_nodes: reconciled,
        min_area_ratio: if min_area_ratio.is_finite() {
            min_area_ratio
        } else {
            1.0
        },
    })
}

/// Signed area of every boundary ring, per grain in ascending order.
fn ring_areas(mesh: &Mesh) -> Vec<(GrainId, Vec<f64>)> {
    mesh.grains()
        .map(|g| {
            let areas = g
                .boundary
                .iter()
                .map(|ring| signed_area(&mesh.ring_positions(ring)))
                .collect();
            (g.id, areas)
        })
        .collect()
}
