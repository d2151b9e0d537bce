//! Node, element and grain records.

use std::collections::BTreeSet;

use nalgebra::Point2;

use super::index::{ElementId, GrainId, NodeId};

/// Shape of a supported element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Linear triangle (3 nodes).
    Tri3,
    /// Quadratic triangle (3 corners, then 3 mid-side nodes).
    Tri6,
    /// Linear quadrilateral (4 nodes).
    Quad4,
    /// Quadratic quadrilateral (4 corners, then 4 mid-side nodes).
    Quad8,
    /// Zero-thickness cohesive element with `nodes` in total, half per side.
    Cohesive {
        /// Total node count.
        nodes: usize,
    },
}

impl ElementKind {
    /// Classify an Abaqus element type label such as `CPE3`, `CPS8R` or `COH2D4`.
    ///
    /// Returns `None` for types outside the planar triangle/quad/cohesive family.
    pub fn from_type_name(name: &str) -> Option<ElementKind> {
        let upper = name.trim().to_ascii_uppercase();

        if let Some(rest) = upper.strip_prefix("COH2D") {
            let nodes = leading_number(rest)?;
            return if nodes >= 4 && nodes % 2 == 0 {
                Some(ElementKind::Cohesive { nodes })
            } else {
                None
            };
        }

        let rest = ["CPEG", "CPE", "CPS", "CAX"]
            .iter()
            .find_map(|prefix| upper.strip_prefix(prefix))?;
        match leading_number(rest)? {
            3 => Some(ElementKind::Tri3),
            4 => Some(ElementKind::Quad4),
            6 => Some(ElementKind::Tri6),
            8 => Some(ElementKind::Quad8),
            _ => None,
        }
    }

    /// Number of nodes in one record of this kind.
    pub fn num_nodes(self) -> usize {
        match self {
            ElementKind::Tri3 => 3,
            ElementKind::Tri6 => 6,
            ElementKind::Quad4 => 4,
            ElementKind::Quad8 => 8,
            ElementKind::Cohesive { nodes } => nodes,
        }
    }

    /// Number of corner nodes (the leading entries of the connectivity).
    pub fn num_corners(self) -> usize {
        match self {
            ElementKind::Tri3 | ElementKind::Tri6 => 3,
            ElementKind::Quad4 | ElementKind::Quad8 => 4,
            ElementKind::Cohesive { nodes } => nodes,
        }
    }

    /// Whether this is a quadratic (mid-side node) element.
    pub fn is_quadratic(self) -> bool {
        matches!(self, ElementKind::Tri6 | ElementKind::Quad8)
    }

    /// Whether this is a cohesive element.
    pub fn is_cohesive(self) -> bool {
        matches!(self, ElementKind::Cohesive { .. })
    }
}

fn leading_number(s: &str) -> Option<usize> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// An edge of a bulk element in local order: start corner, optional mid-side
/// node, end corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementEdge {
    /// First corner.
    pub start: NodeId,
    /// Mid-side node for quadratic elements.
    pub mid: Option<NodeId>,
    /// Second corner.
    pub end: NodeId,
}

impl ElementEdge {
    /// The same edge walked the other way.
    pub fn reversed(self) -> Self {
        Self {
            start: self.end,
            mid: self.mid,
            end: self.start,
        }
    }
}

/// A mesh node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node label.
    pub id: NodeId,
    /// Position in the plane.
    pub position: Point2<f64>,
    /// Grains whose bulk elements reference this node.
    ///
    /// Empty for free nodes such as the centre node left at a triple junction.
    pub grains: BTreeSet<GrainId>,
}

impl Node {
    /// Create a node that no grain references yet.
    pub fn new(id: NodeId, position: Point2<f64>) -> Self {
        Self {
            id,
            position,
            grains: BTreeSet::new(),
        }
    }

    /// The grain owning this node, if exactly one does.
    pub fn sole_grain(&self) -> Option<GrainId> {
        if self.grains.len() == 1 {
            self.grains.iter().next().copied()
        } else {
            None
        }
    }
}

/// A continuum element of a grain.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkElement {
    /// Element label.
    pub id: ElementId,
    /// Shape.
    pub kind: ElementKind,
    /// Type label from the deck, written back unchanged.
    pub type_name: String,
    /// Connectivity in local order.
    pub nodes: Vec<NodeId>,
    /// Owning grain, if the element is listed in a grain set.
    pub grain: Option<GrainId>,
}

impl BulkElement {
    /// The corner nodes in local order.
    pub fn corners(&self) -> &[NodeId] {
        &self.nodes[..self.kind.num_corners()]
    }

    /// Edges in local order.
    pub fn edges(&self) -> Vec<ElementEdge> {
        let corners = self.kind.num_corners();
        (0..corners)
            .map(|i| ElementEdge {
                start: self.nodes[i],
                mid: if self.kind.is_quadratic() {
                    Some(self.nodes[corners + i])
                } else {
                    None
                },
                end: self.nodes[(i + 1) % corners],
            })
            .collect()
    }
}

/// A zero-thickness element joining two grains.
#[derive(Debug, Clone, PartialEq)]
pub struct CohesiveElement {
    /// Element label.
    pub id: ElementId,
    /// Type label from the deck.
    pub type_name: String,
    /// Nodes of the first side in local order.
    pub minus: Vec<NodeId>,
    /// Nodes of the second side; `plus[i]` pairs with `minus[i]`.
    pub plus: Vec<NodeId>,
    /// Grains owning the minus and plus sides.
    pub grains: (GrainId, GrainId),
}

impl CohesiveElement {
    /// Split Abaqus connectivity `n1 .. nk, nk+1 .. n2k` into aligned sides.
    ///
    /// The second half runs backwards relative to the first, so the plus
    /// side is reversed to pair each node with its coincident partner. An odd
    /// count leaves the sides unequal.
    pub fn split_connectivity(nodes: &[NodeId]) -> (Vec<NodeId>, Vec<NodeId>) {
        let half = nodes.len() / 2;
        let minus = nodes[..half].to_vec();
        let plus = nodes[half..].iter().rev().copied().collect();
        (minus, plus)
    }

    /// The grain pair in ascending order.
    pub fn grain_pair(&self) -> (GrainId, GrainId) {
        let (a, b) = self.grains;
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// All node labels, minus side first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.minus.iter().chain(self.plus.iter()).copied()
    }
}

/// A grain of the polycrystal.
#[derive(Debug, Clone, PartialEq)]
pub struct Grain {
    /// Grain label.
    pub id: GrainId,
    /// Name of the element set that defined the grain.
    pub set_name: String,
    /// Centroid used as the shrink centre.
    pub centroid: Option<Point2<f64>>,
    /// Bulk elements of the grain.
    pub elements: Vec<ElementId>,
    /// Closed boundary rings in polygon order, counter-clockwise for outer rings.
    pub boundary: Vec<Vec<NodeId>>,
}
