//! Periodic node matching.
//!
//! In a periodic polycrystal every node on a minimum face of the bounding box
//! has a counterpart on the opposite maximum face, one period away. Where
//! grains meet on a face there are several coincident copies of a node, so
//! matching works on coincident groups: each minimum-face group is linked to
//! the maximum-face group at `position + period`.
//!
//! After shrinkage the copies inside a group have moved apart.
//! [`verify_periodicity`] checks that every pair still differs by exactly
//! the period and [`reconcile_periodicity`] restores that by moving the
//! maximum-face copies.
//!
//! # Example
//!
//! ```
//! use grainlayer::algo::periodic::{resolve_periodicity, PeriodicOptions};
//! use grainlayer::mesh::{ElementId, MeshBuilder, NodeId};
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
//! let mesh = b.build().unwrap();
//!
//! let links = resolve_periodicity(&mesh, &PeriodicOptions::default()).unwrap();
//! // Two links per axis: one per corner pair
//! assert_eq!(links.len(), 4);
//! ```

use log::{debug, info};
use nalgebra::Vector2;

use crate::error::{PeriodicityError, Result, StructuralError};
use crate::mesh::{Axis, DomainBox, Mesh, NodeId};

/// Default distance within which nodes count as matching.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default margin the best match must hold over the runner-up.
pub const DEFAULT_TIE_EPSILON: f64 = 1e-9;

/// Options for periodic matching.
#[derive(Debug, Clone)]
pub struct PeriodicOptions {
    /// Distance within which nodes count as coincident or matching.
    pub tolerance: f64,

    /// The closest candidate wins only if it beats the runner-up by more
    /// than this distance.
    pub tie_epsilon: f64,
}

impl Default for PeriodicOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            tie_epsilon: DEFAULT_TIE_EPSILON,
        }
    }
}

impl PeriodicOptions {
    /// Set the matching tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the tie-break margin.
    pub fn with_tie_epsilon(mut self, tie_epsilon: f64) -> Self {
        self.tie_epsilon = tie_epsilon;
        self
    }
}

/// A group of coincident nodes on a minimum face and its image on the
/// opposite maximum face.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicLink {
    /// Axis normal to the linked faces.
    pub axis: Axis,
    /// Copies on the minimum face, ascending by label.
    pub lower: Vec<NodeId>,
    /// Copies on the maximum face, ascending by label.
    pub upper: Vec<NodeId>,
    /// Translation from the minimum face to the maximum face.
    pub translation: Vector2<f64>,
}

impl PeriodicLink {
    /// Pair the copies of both groups one to one.
    ///
    /// Both groups are ordered by their current coordinate along the face
    /// (ties broken by label) and zipped.
    pub fn node_pairs(&self, mesh: &Mesh) -> Vec<(NodeId, NodeId)> {
        let lower = sorted_along_face(mesh, &self.lower, self.axis);
        let upper = sorted_along_face(mesh, &self.upper, self.axis);
        lower.into_iter().zip(upper).collect()
    }
}

fn sorted_along_face(mesh: &Mesh, group: &[NodeId], axis: Axis) -> Vec<NodeId> {
    let along = axis.other().index();
    let mut keyed: Vec<(f64, NodeId)> = group
        .iter()
        .filter_map(|&id| mesh.position(id).map(|p| (p[along], id)))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, id)| id).collect()
}

/// Periodic translation vectors of the mesh domain, x first.
pub fn domain_periods(mesh: &Mesh) -> Result<Vec<Vector2<f64>>> {
    let domain = mesh.domain().ok_or(StructuralError::EmptyMesh)?;
    Ok(Axis::ALL.iter().map(|&axis| domain.period(axis)).collect())
}

/// Match every minimum-face node group to its image on the maximum face.
///
/// Only nodes referenced by an element take part. Links are returned for
/// the x faces first, then the y faces, each ordered along the face.
///
/// # Errors
///
/// - [`PeriodicityError::Unmatched`] if a group on either face has no
///   counterpart within tolerance
/// - [`PeriodicityError::Ambiguous`] if two candidates are equally close
/// - [`PeriodicityError::ClaimedTwice`] if two groups map onto one image
/// - [`PeriodicityError::GroupSizeMismatch`] if the copy counts differ
pub fn resolve_periodicity(mesh: &Mesh, options: &PeriodicOptions) -> Result<Vec<PeriodicLink>> {
    let domain = mesh.domain().ok_or(StructuralError::EmptyMesh)?;
    let active = mesh.referenced_node_ids();

    let mut links = Vec::new();
    for axis in Axis::ALL {
        if domain.extent(axis) <= options.tolerance {
            return Err(PeriodicityError::DegenerateDomain { axis: axis.label() }.into());
        }
        let axis_links = resolve_axis(mesh, &domain, &active, axis, options)?;
        debug!(
            "{} faces: {} periodic node group(s) linked",
            axis.label(),
            axis_links.len()
        );
        links.extend(axis_links);
    }

    info!("Resolved {} periodic links", links.len());
    Ok(links)
}

fn resolve_axis(
    mesh: &Mesh,
    domain: &DomainBox,
    active: &[NodeId],
    axis: Axis,
    options: &PeriodicOptions,
) -> Result<Vec<PeriodicLink>> {
    let tol = options.tolerance;
    let on_face = |min: bool| -> Vec<NodeId> {
        active
            .iter()
            .copied()
            .filter(|&id| {
                mesh.position(id).is_some_and(|p| {
                    if min {
                        domain.on_min_face(&p, axis, tol)
                    } else {
                        domain.on_max_face(&p, axis, tol)
                    }
                })
            })
            .collect()
    };

    let mut lower_groups = mesh.coincident_groups(&on_face(true), tol);
    let upper_groups = mesh.coincident_groups(&on_face(false), tol);
    let along = axis.other().index();
    lower_groups.sort_by(|a, b| {
        group_coordinate(mesh, a, along).total_cmp(&group_coordinate(mesh, b, along))
    });

    let translation = domain.period(axis);
    let mut claimed: Vec<Option<NodeId>> = vec![None; upper_groups.len()];
    let mut links = Vec::with_capacity(lower_groups.len());

    for lower in lower_groups {
        let node = lower[0];
        let Some(origin) = mesh.position(node) else {
            continue;
        };
        let target = origin + translation;

        let mut candidates: Vec<(f64, usize)> = upper_groups
            .iter()
            .enumerate()
            .filter_map(|(i, g)| mesh.position(g[0]).map(|p| ((p - target).norm(), i)))
            .filter(|(d, _)| *d <= tol)
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let Some(&(best_distance, best)) = candidates.first() else {
            return Err(PeriodicityError::Unmatched {
                node,
                face: axis.min_face(),
            }
            .into());
        };
        if let Some(&(runner_up, second)) = candidates.get(1) {
            if runner_up - best_distance <= options.tie_epsilon {
                return Err(PeriodicityError::Ambiguous {
                    node,
                    first: upper_groups[best][0],
                    second: upper_groups[second][0],
                }
                .into());
            }
        }

        let upper = &upper_groups[best];
        if let Some(first) = claimed[best] {
            return Err(PeriodicityError::ClaimedTwice {
                upper: upper[0],
                first,
                second: node,
            }
            .into());
        }
        claimed[best] = Some(node);

        if lower.len() != upper.len() {
            return Err(PeriodicityError::GroupSizeMismatch {
                lower: node,
                lower_len: lower.len(),
                upper: upper[0],
                upper_len: upper.len(),
            }
            .into());
        }

        links.push(PeriodicLink {
            axis,
            lower,
            upper: upper.clone(),
            translation,
        });
    }

    if let Some(i) = claimed.iter().position(Option::is_none) {
        return Err(PeriodicityError::Unmatched {
            node: upper_groups[i][0],
            face: axis.max_face(),
        }
        .into());
    }

    Ok(links)
}

fn group_coordinate(mesh: &Mesh, group: &[NodeId], along: usize) -> f64 {
    group
        .first()
        .and_then(|&id| mesh.position(id))
        .map_or(0.0, |p| p[along])
}

/// Check that every linked pair differs by exactly its translation.
pub fn verify_periodicity(mesh: &Mesh, links: &[PeriodicLink], tolerance: f64) -> Result<()> {
    for link in links {
        for (lower, upper) in link.node_pairs(mesh) {
            let (Some(p), Some(q)) = (mesh.position(lower), mesh.position(upper)) else {
                continue;
            };
            let deviation = (q - p - link.translation).norm();
            if deviation > tolerance {
                return Err(PeriodicityError::Inconsistent {
                    lower,
                    upper,
                    deviation,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Give every maximum-face copy the coordinate along the face of its
/// minimum-face partner. Returns the number of nodes moved.
pub fn reconcile_periodicity(mesh: &mut Mesh, links: &[PeriodicLink]) -> usize {
    let mut moved = 0;
    for link in links {
        let along = link.axis.other().index();
        for (lower, upper) in link.node_pairs(mesh) {
            let Some(source) = mesh.position(lower) else {
                continue;
            };
            if let Some(node) = mesh.node_mut(upper) {
                if node.position[along] != source[along] {
                    node.position[along] = source[along];
                    moved += 1;
                }
            }
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mesh::fixtures;
    use nalgebra::Point2;

    fn raw(ids: &[NodeId]) -> Vec<u64> {
        ids.iter().map(|n| n.get()).collect()
    }

    #[test]
    fn test_two_grain_links() {
        let mesh = fixtures::two_grains();
        let links = resolve_periodicity(&mesh, &PeriodicOptions::default()).unwrap();

        let x: Vec<_> = links.iter().filter(|l| l.axis == Axis::X).collect();
        assert_eq!(x.len(), 2);
        assert_eq!(raw(&x[0].lower), vec![1]);
        assert_eq!(raw(&x[0].upper), vec![6]);
        assert_eq!(x[0].translation, Vector2::new(4.0, 0.0));

        let y: Vec<_> = links.iter().filter(|l| l.axis == Axis::Y).collect();
        assert_eq!(y.len(), 3);
        // The shared-boundary copies link as a group
        assert_eq!(raw(&y[1].lower), vec![2, 5]);
        assert_eq!(raw(&y[1].upper), vec![3, 8]);
        assert_eq!(y[1].translation, Vector2::new(0.0, 2.0));
    }

    #[test]
    fn test_grid_links_pair_copies_along_face() {
        let mut mesh = fixtures::grid(false);
        let links = resolve_periodicity(&mesh, &PeriodicOptions::default()).unwrap();
        let middle = links
            .iter()
            .find(|l| l.axis == Axis::X && l.lower.len() == 2)
            .unwrap();
        assert_eq!(raw(&middle.lower), vec![14, 31]);
        assert_eq!(raw(&middle.upper), vec![23, 42]);

        // Separate the copies so the pairing is decided by position
        mesh.node_mut(NodeId::new(14)).unwrap().position.y = 0.95;
        mesh.node_mut(NodeId::new(31)).unwrap().position.y = 1.05;
        mesh.node_mut(NodeId::new(23)).unwrap().position.y = 0.95;
        mesh.node_mut(NodeId::new(42)).unwrap().position.y = 1.05;
        let pairs = middle.node_pairs(&mesh);
        assert_eq!(
            pairs,
            vec![
                (NodeId::new(14), NodeId::new(23)),
                (NodeId::new(31), NodeId::new(42))
            ]
        );
        verify_periodicity(&mesh, &links, 1e-9).unwrap();
    }

    #[test]
    fn test_skewed_face_is_unmatched() {
        let mut b = fixtures::two_grains_builder();
        let mut mesh = b.clone().build().unwrap();
        mesh.node_mut(NodeId::new(7)).unwrap().position = Point2::new(3.0, 0.5);
        match resolve_periodicity(&mesh, &PeriodicOptions::default()) {
            Err(Error::Periodicity(PeriodicityError::Unmatched { node, face })) => {
                assert_eq!(node, NodeId::new(4));
                assert_eq!(face, "x-min");
            }
            other => panic!("expected unmatched node, got {other:?}"),
        }

        // A lone node on the maximum face is reported from that side
        b.add_node(NodeId::new(9), Point2::new(3.0, 0.0));
        b.add_element(
            crate::mesh::ElementId::new(9),
            "CPE3",
            vec![NodeId::new(6), NodeId::new(9), NodeId::new(7)],
        )
        .unwrap();
        let mesh = b.build().unwrap();
        match resolve_periodicity(&mesh, &PeriodicOptions::default()) {
            Err(Error::Periodicity(PeriodicityError::Unmatched { node, face })) => {
                assert_eq!(node, NodeId::new(9));
                assert_eq!(face, "x-max");
            }
            other => panic!("expected unmatched node, got {other:?}"),
        }
    }

    #[test]
    fn test_equidistant_candidates_are_ambiguous() {
        let mesh = fixtures::ambiguous_square();
        let options = PeriodicOptions::default().with_tolerance(1e-3);
        match resolve_periodicity(&mesh, &options) {
            Err(Error::Periodicity(PeriodicityError::Ambiguous {
                node,
                first,
                second,
            })) => {
                assert_eq!(node, NodeId::new(7));
                let mut both = [first.get(), second.get()];
                both.sort();
                assert_eq!(both, [3, 4]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_free_nodes_do_not_take_part() {
        let mut b = fixtures::two_grains_builder();
        b.add_node(NodeId::new(9), Point2::new(-1.0, 0.0));
        let mesh = b.build().unwrap();
        resolve_periodicity(&mesh, &PeriodicOptions::default()).unwrap();
    }

    #[test]
    fn test_group_size_mismatch() {
        let mut mesh = fixtures::two_grains();
        // Pull node 8 off the y-max face so only node 3 remains there
        mesh.node_mut(NodeId::new(8)).unwrap().position = Point2::new(1.0, 0.5);
        match resolve_periodicity(&mesh, &PeriodicOptions::default()) {
            Err(Error::Periodicity(PeriodicityError::GroupSizeMismatch {
                lower_len,
                upper_len,
                ..
            })) => {
                assert_eq!(lower_len, 2);
                assert_eq!(upper_len, 1);
            }
            other => panic!("expected group size mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_reconcile_restores_consistency() {
        let mut mesh = fixtures::grid(false);
        let links = resolve_periodicity(&mesh, &PeriodicOptions::default()).unwrap();
        mesh.node_mut(NodeId::new(23)).unwrap().position.y = 0.96;
        mesh.node_mut(NodeId::new(14)).unwrap().position.y = 0.95;
        mesh.node_mut(NodeId::new(31)).unwrap().position.y = 1.05;
        mesh.node_mut(NodeId::new(42)).unwrap().position.y = 1.05;

        match verify_periodicity(&mesh, &links, 1e-6) {
            Err(Error::Periodicity(PeriodicityError::Inconsistent { lower, upper, .. })) => {
                assert_eq!(lower, NodeId::new(14));
                assert_eq!(upper, NodeId::new(23));
            }
            other => panic!("expected inconsistency, got {other:?}"),
        }

        assert_eq!(reconcile_periodicity(&mut mesh, &links), 1);
        verify_periodicity(&mesh, &links, 1e-6).unwrap();
        assert_eq!(mesh.position(NodeId::new(23)).unwrap().y, 0.95);
    }

    #[test]
    fn test_domain_periods() {
        let mesh = fixtures::two_grains();
        let periods = domain_periods(&mesh).unwrap();
        assert_eq!(periods, vec![Vector2::new(4.0, 0.0), Vector2::new(0.0, 2.0)]);
    }
}
