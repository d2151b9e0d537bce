//! The in-memory polycrystal mesh.

use std::collections::{BTreeMap, HashMap, HashSet};

use nalgebra::{Point2, Vector2};

use super::element::{BulkElement, CohesiveElement, Grain, Node};
use super::geometry::DomainBox;
use super::index::{ElementId, GrainId, NodeId};
use crate::error::{Error, ParseError, Result, StructuralError};

/// A named list of elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSet {
    /// Set name as written in the deck.
    pub name: String,
    /// Members in deck order.
    pub elements: Vec<ElementId>,
}

/// A named list of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSet {
    /// Set name as written in the deck.
    pub name: String,
    /// Members in deck order.
    pub nodes: Vec<NodeId>,
}

/// A 2D polycrystal mesh with cohesive elements at grain boundaries.
///
/// Nodes and elements are keyed by their labels; insertion order is kept so
/// that output follows the input numbering. Meshes are created with
/// [`MeshBuilder`](super::MeshBuilder).
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) node_order: Vec<NodeId>,
    pub(crate) bulk: HashMap<ElementId, BulkElement>,
    pub(crate) bulk_order: Vec<ElementId>,
    pub(crate) cohesive: HashMap<ElementId, CohesiveElement>,
    pub(crate) cohesive_order: Vec<ElementId>,
    pub(crate) grains: BTreeMap<GrainId, Grain>,
    pub(crate) pairs: HashMap<(GrainId, GrainId), Vec<ElementId>>,
    pub(crate) element_sets: Vec<ElementSet>,
    pub(crate) node_sets: Vec<NodeSet>,
}

impl Mesh {
    /// Number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.node_order.len()
    }

    /// Number of bulk elements.
    #[inline]
    pub fn num_bulk_elements(&self) -> usize {
        self.bulk_order.len()
    }

    /// Number of cohesive elements.
    #[inline]
    pub fn num_cohesive_elements(&self) -> usize {
        self.cohesive_order.len()
    }

    /// Number of grains.
    #[inline]
    pub fn num_grains(&self) -> usize {
        self.grains.len()
    }

    /// Look up a node.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Look up a node for modification.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Position of a node.
    #[inline]
    pub fn position(&self, id: NodeId) -> Option<Point2<f64>> {
        self.nodes.get(&id).map(|n| n.position)
    }

    /// Iterate over nodes in input order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.node_order.iter().map(move |id| &self.nodes[id])
    }

    /// Iterate over node labels in input order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_order.iter().copied()
    }

    /// Look up a bulk element.
    pub fn bulk_element(&self, id: ElementId) -> Option<&BulkElement> {
        self.bulk.get(&id)
    }

    /// Iterate over bulk elements in input order.
    pub fn bulk_elements(&self) -> impl Iterator<Item = &BulkElement> + '_ {
        self.bulk_order.iter().map(move |id| &self.bulk[id])
    }

    /// Look up a cohesive element.
    pub fn cohesive_element(&self, id: ElementId) -> Option<&CohesiveElement> {
        self.cohesive.get(&id)
    }

    /// Iterate over cohesive elements in input order.
    pub fn cohesive_elements(&self) -> impl Iterator<Item = &CohesiveElement> + '_ {
        self.cohesive_order.iter().map(move |id| &self.cohesive[id])
    }

    /// Look up a grain.
    pub fn grain(&self, id: GrainId) -> Option<&Grain> {
        self.grains.get(&id)
    }

    /// Iterate over grains in ascending label order.
    pub fn grains(&self) -> impl Iterator<Item = &Grain> + '_ {
        self.grains.values()
    }

    /// Iterate over grain labels in ascending order.
    pub fn grain_ids(&self) -> impl Iterator<Item = GrainId> + '_ {
        self.grains.keys().copied()
    }

    /// Boundary nodes of a grain in polygon order, ring after ring.
    pub fn boundary_nodes(&self, grain: GrainId) -> impl Iterator<Item = NodeId> + '_ {
        self.grains
            .get(&grain)
            .into_iter()
            .flat_map(|g| g.boundary.iter().flatten().copied())
    }

    /// Positions along one boundary ring.
    pub fn ring_positions(&self, ring: &[NodeId]) -> Vec<Point2<f64>> {
        ring.iter().filter_map(|&id| self.position(id)).collect()
    }

    /// Cohesive elements joining two grains, in either orientation.
    pub fn cohesive_between(&self, a: GrainId, b: GrainId) -> &[ElementId] {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.pairs.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Grain pairs that share at least one cohesive element, ascending.
    pub fn grain_pairs(&self) -> Vec<(GrainId, GrainId)> {
        let mut pairs: Vec<_> = self.pairs.keys().copied().collect();
        pairs.sort();
        pairs
    }

    /// Element sets in deck order (grain sets included).
    pub fn element_sets(&self) -> &[ElementSet] {
        &self.element_sets
    }

    /// Node sets in deck order.
    pub fn node_sets(&self) -> &[NodeSet] {
        &self.node_sets
    }

    /// Bounding box of all nodes.
    pub fn domain(&self) -> Option<DomainBox> {
        DomainBox::from_points(self.nodes.values().map(|n| &n.position))
    }

    /// Largest node label in use.
    pub fn max_node_id(&self) -> Option<NodeId> {
        self.node_order.iter().copied().max()
    }

    /// Largest element label in use (bulk or cohesive).
    pub fn max_element_id(&self) -> Option<ElementId> {
        self.bulk_order
            .iter()
            .chain(self.cohesive_order.iter())
            .copied()
            .max()
    }

    /// Nodes referenced by at least one bulk or cohesive element, in input order.
    pub fn referenced_node_ids(&self) -> Vec<NodeId> {
        let mut used: HashSet<NodeId> = HashSet::new();
        for e in self.bulk.values() {
            used.extend(e.nodes.iter().copied());
        }
        for c in self.cohesive.values() {
            used.extend(c.nodes());
        }
        self.node_order
            .iter()
            .copied()
            .filter(|id| used.contains(id))
            .collect()
    }

    /// Cluster nodes into groups of coincident copies.
    ///
    /// Two nodes share a group when they lie within `tol` of the group's
    /// first node. Groups are ordered by position (x, then y) and each
    /// group lists its nodes by ascending label. Unknown labels are ignored.
    pub fn coincident_groups(&self, ids: &[NodeId], tol: f64) -> Vec<Vec<NodeId>> {
        let mut points: Vec<(NodeId, Point2<f64>)> = ids
            .iter()
            .filter_map(|&id| self.position(id).map(|p| (id, p)))
            .collect();
        points.sort_by(|a, b| {
            a.1.x
                .total_cmp(&b.1.x)
                .then(a.1.y.total_cmp(&b.1.y))
                .then(a.0.cmp(&b.0))
        });

        let mut assigned = vec![false; points.len()];
        let mut groups = Vec::new();
        for i in 0..points.len() {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;
            let anchor = points[i].1;
            let mut group = vec![points[i].0];
            // Sweep forward while x stays within reach
            for j in (i + 1)..points.len() {
                if points[j].1.x - anchor.x > tol {
                    break;
                }
                if !assigned[j] && (points[j].1 - anchor).norm() <= tol {
                    assigned[j] = true;
                    group.push(points[j].0);
                }
            }
            group.sort();
            groups.push(group);
        }
        groups
    }

    /// Add a node that no element references yet, labelled after the current maximum.
    ///
    /// Fails with [`Error::InvalidParameter`] when the largest label is already
    /// in use.
    pub fn add_free_node(&mut self, position: Point2<f64>) -> Result<NodeId> {
        let id = match self.max_node_id() {
            Some(max) => max
                .next()
                .ok_or_else(|| Error::invalid_param("node id", max, "no label left after it"))?,
            None => NodeId::new(1),
        };
        self.nodes.insert(id, Node::new(id, position));
        self.node_order.push(id);
        Ok(id)
    }

    /// Set the centroid of one grain.
    ///
    /// Returns `false` if the grain does not exist.
    pub fn set_centroid(&mut self, grain: GrainId, centroid: Point2<f64>) -> bool {
        match self.grains.get_mut(&grain) {
            Some(g) => {
                g.centroid = Some(centroid);
                true
            }
            None => false,
        }
    }

    /// Assign centroids to all grains.
    ///
    /// The map must name exactly the grains of the mesh: a missing grain
    /// fails with [`ParseError::MissingCentroid`], an unknown one with
    /// [`ParseError::UnknownCentroid`].
    pub fn assign_centroids(&mut self, centroids: &BTreeMap<GrainId, Point2<f64>>) -> Result<()> {
        if let Some(&grain) = self.grains.keys().find(|g| !centroids.contains_key(g)) {
            return Err(ParseError::MissingCentroid { grain }.into());
        }
        if let Some(&grain) = centroids.keys().find(|g| !self.grains.contains_key(g)) {
            return Err(ParseError::UnknownCentroid { grain }.into());
        }
        for (grain, centroid) in centroids {
            self.set_centroid(*grain, *centroid);
        }
        Ok(())
    }

    /// Check that every cohesive element is zero-thickness.
    ///
    /// Paired nodes must coincide within `tol`, or differ by a sum of the
    /// given period vectors (for elements spanning a periodic seam).
    pub fn check_cohesive_coincidence(&self, tol: f64, periods: &[Vector2<f64>]) -> Result<()> {
        let mut offsets = vec![Vector2::zeros()];
        for period in periods {
            let current = offsets.clone();
            for o in current {
                offsets.push(o + period);
                offsets.push(o - period);
            }
        }

        for c in self.cohesive_elements() {
            if c.minus.len() != c.plus.len() {
                return Err(StructuralError::MismatchedSides {
                    element: c.id,
                    minus: c.minus.len(),
                    plus: c.plus.len(),
                }
                .into());
            }
            for (&m, &p) in c.minus.iter().zip(c.plus.iter()) {
                let (Some(pm), Some(pp)) = (self.position(m), self.position(p)) else {
                    continue;
                };
                let d = pp - pm;
                let distance = offsets
                    .iter()
                    .map(|o| (d - o).norm())
                    .fold(f64::INFINITY, f64::min);
                if distance > tol {
                    return Err(StructuralError::NonCoincidentSides {
                        element: c.id,
                        minus: m,
                        plus: p,
                        distance: d.norm(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mesh::fixtures;

    #[test]
    fn test_lookups() {
        let mesh = fixtures::two_grains();
        assert_eq!(mesh.num_nodes(), 8);
        assert_eq!(mesh.num_bulk_elements(), 4);
        assert_eq!(mesh.num_cohesive_elements(), 1);
        assert_eq!(mesh.num_grains(), 2);

        let n = mesh.node(NodeId::new(3)).unwrap();
        assert_eq!(n.position, Point2::new(1.0, 1.0));
        assert_eq!(n.sole_grain(), Some(GrainId::new(1)));

        let g = mesh.grain(GrainId::new(2)).unwrap();
        assert_eq!(g.set_name, "face2");
        assert_eq!(g.elements.len(), 2);
    }

    #[test]
    fn test_boundary_nodes_in_polygon_order() {
        let mesh = fixtures::two_grains();
        let ring: Vec<u64> = mesh.boundary_nodes(GrainId::new(1)).map(NodeId::get).collect();
        assert_eq!(ring, vec![1, 2, 3, 4]);
        let ring: Vec<u64> = mesh.boundary_nodes(GrainId::new(2)).map(NodeId::get).collect();
        assert_eq!(ring, vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_cohesive_between_is_symmetric() {
        let mesh = fixtures::two_grains();
        let a = GrainId::new(1);
        let b = GrainId::new(2);
        assert_eq!(mesh.cohesive_between(a, b), &[ElementId::new(5)]);
        assert_eq!(mesh.cohesive_between(b, a), &[ElementId::new(5)]);
        assert!(mesh.cohesive_between(a, a).is_empty());
        assert_eq!(mesh.grain_pairs(), vec![(a, b)]);
    }

    #[test]
    fn test_add_free_node_allocates_next_label() {
        let mut mesh = fixtures::two_grains();
        let id = mesh.add_free_node(Point2::new(1.0, 0.0)).unwrap();
        assert_eq!(id, NodeId::new(9));
        assert!(mesh.node(id).unwrap().grains.is_empty());
        assert_eq!(mesh.num_nodes(), 9);
        assert!(!mesh.referenced_node_ids().contains(&id));
    }

    #[test]
    fn test_add_free_node_after_largest_label_fails() {
        let mut mesh = fixtures::two_grains();
        let last = NodeId::new(u64::MAX);
        mesh.nodes.insert(last, Node::new(last, Point2::new(5.0, 5.0)));
        mesh.node_order.push(last);

        match mesh.add_free_node(Point2::new(1.0, 0.0)) {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "node id"),
            other => panic!("expected invalid node id, got {other:?}"),
        }
        assert_eq!(mesh.num_nodes(), 9);
    }

    #[test]
    fn test_assign_centroids_requires_exact_grain_set() {
        let mut mesh = fixtures::two_grains();

        let mut partial = BTreeMap::new();
        partial.insert(GrainId::new(1), Point2::new(0.0, 0.0));
        match mesh.assign_centroids(&partial) {
            Err(Error::Parse(ParseError::MissingCentroid { grain })) => {
                assert_eq!(grain, GrainId::new(2))
            }
            other => panic!("expected missing centroid, got {other:?}"),
        }

        let mut extra = partial.clone();
        extra.insert(GrainId::new(2), Point2::new(2.0, 0.0));
        extra.insert(GrainId::new(3), Point2::new(4.0, 0.0));
        match mesh.assign_centroids(&extra) {
            Err(Error::Parse(ParseError::UnknownCentroid { grain })) => {
                assert_eq!(grain, GrainId::new(3))
            }
            other => panic!("expected unknown centroid, got {other:?}"),
        }
    }

    #[test]
    fn test_coincidence_check() {
        let mesh = fixtures::two_grains();
        mesh.check_cohesive_coincidence(1e-9, &[]).unwrap();

        let mut moved = mesh.clone();
        moved.node_mut(NodeId::new(8)).unwrap().position = Point2::new(1.5, 1.0);
        match moved.check_cohesive_coincidence(1e-9, &[]) {
            Err(Error::Structural(StructuralError::NonCoincidentSides { element, .. })) => {
                assert_eq!(element, ElementId::new(5))
            }
            other => panic!("expected non-coincident sides, got {other:?}"),
        }
    }

    #[test]
    fn test_coincidence_across_periodic_seam() {
        let mut mesh = fixtures::two_grains();
        // Move the plus side by one period along x
        for id in [5, 8] {
            mesh.node_mut(NodeId::new(id)).unwrap().position.x += 4.0;
        }
        assert!(mesh.check_cohesive_coincidence(1e-9, &[]).is_err());
        mesh.check_cohesive_coincidence(1e-9, &[Vector2::new(4.0, 0.0)])
            .unwrap();
    }

    #[test]
    fn test_coincident_groups() {
        let mesh = fixtures::two_grains();
        let groups = mesh.coincident_groups(&mesh.node_ids().collect::<Vec<_>>(), 1e-9);
        let raw: Vec<Vec<u64>> = groups
            .iter()
            .map(|g| g.iter().map(|n| n.get()).collect())
            .collect();
        assert_eq!(raw, vec![vec![1], vec![4], vec![2, 5], vec![3, 8], vec![6], vec![7]]);
    }

    #[test]
    fn test_domain() {
        let mesh = fixtures::two_grains();
        let domain = mesh.domain().unwrap();
        assert_eq!(domain.min, Point2::new(-1.0, -1.0));
        assert_eq!(domain.max, Point2::new(3.0, 1.0));
    }
}
