//! Mesh construction.
//!
//! [`MeshBuilder`] collects raw node, element and set records in deck order
//! and validates them into a [`Mesh`]: labels are resolved, grains are
//! assigned from their element sets, cohesive sides are attached to grains
//! and every grain boundary is traced.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use nalgebra::Point2;

use super::boundary::trace_rings;
use super::element::{BulkElement, CohesiveElement, ElementKind, Grain, Node};
use super::index::{ElementId, GrainId, NodeId};
use super::model::{ElementSet, Mesh, NodeSet};
use crate::error::{Error, ParseError, Result, StructuralError};

/// Default prefix of grain element set names (`face1`, `face2`, ...).
pub const DEFAULT_GRAIN_PREFIX: &str = "face";

#[derive(Debug, Clone)]
struct RawElement {
    id: ElementId,
    kind: ElementKind,
    type_name: String,
    nodes: Vec<NodeId>,
}

/// Collects mesh records and validates them into a [`Mesh`].
///
/// # Example
/// ```
/// use grainlayer::mesh::{MeshBuilder, NodeId, ElementId};
/// use nalgebra::Point2;
///
/// let mut b = MeshBuilder::new();
/// b.add_node(NodeId::new(1), Point2::new(0.0, 0.0))
///     .add_node(NodeId::new(2), Point2::new(1.0, 0.0))
///     .add_node(NodeId::new(3), Point2::new(0.0, 1.0));
/// b.add_element(ElementId::new(1), "CPE3", vec![1, 2, 3].into_iter().map(NodeId::new).collect())
///     .unwrap();
/// b.add_element_set("face1", vec![ElementId::new(1)]);
///
/// let mesh = b.build().unwrap();
/// assert_eq!(mesh.num_grains(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    nodes: Vec<(NodeId, Point2<f64>)>,
    elements: Vec<RawElement>,
    element_sets: Vec<ElementSet>,
    node_sets: Vec<NodeSet>,
    grain_prefix: String,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshBuilder {
    /// Create an empty builder using the default grain prefix.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            elements: Vec::new(),
            element_sets: Vec::new(),
            node_sets: Vec::new(),
            grain_prefix: DEFAULT_GRAIN_PREFIX.to_string(),
        }
    }

    /// Set the prefix that marks grain element sets.
    pub fn with_grain_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.grain_prefix = prefix.into();
        self
    }

    /// Add a node record.
    pub fn add_node(&mut self, id: NodeId, position: Point2<f64>) -> &mut Self {
        self.nodes.push((id, position));
        self
    }

    /// Add an element record.
    ///
    /// `type_name` is an Abaqus type label; the node count must match it.
    pub fn add_element(
        &mut self,
        id: ElementId,
        type_name: &str,
        nodes: Vec<NodeId>,
    ) -> Result<&mut Self> {
        let kind = ElementKind::from_type_name(type_name).ok_or_else(|| {
            Error::invalid_param("element type", type_name, "not a supported 2D element")
        })?;
        if nodes.len() != kind.num_nodes() {
            return Err(Error::invalid_param(
                "element node count",
                nodes.len(),
                "does not match element type",
            ));
        }
        self.elements.push(RawElement {
            id,
            kind,
            type_name: type_name.to_string(),
            nodes,
        });
        Ok(self)
    }

    /// Add an element set. Sets named after the grain prefix define grains.
    pub fn add_element_set(&mut self, name: impl Into<String>, elements: Vec<ElementId>) -> &mut Self {
        self.element_sets.push(ElementSet {
            name: name.into(),
            elements,
        });
        self
    }

    /// Add a node set.
    pub fn add_node_set(&mut self, name: impl Into<String>, nodes: Vec<NodeId>) -> &mut Self {
        self.node_sets.push(NodeSet {
            name: name.into(),
            nodes,
        });
        self
    }

    /// Grain label encoded in an element set name, if the set defines a grain.
    pub fn grain_label(&self, set_name: &str) -> Option<GrainId> {
        let prefix_len = self.grain_prefix.len();
        if set_name.len() <= prefix_len
            || !set_name.is_char_boundary(prefix_len)
            || !set_name[..prefix_len].eq_ignore_ascii_case(&self.grain_prefix)
        {
            return None;
        }
        let digits = &set_name[prefix_len..];
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(GrainId::new)
    }

    /// Validate the records and build the mesh.
    pub fn build(self) -> Result<Mesh> {
        let mut mesh = Mesh::default();

        // Nodes
        for &(id, position) in &self.nodes {
            if let Some(existing) = mesh.nodes.get(&id) {
                if existing.position == position {
                    warn!("node {} is defined twice; keeping the first record", id);
                    continue;
                }
                return Err(ParseError::ConflictingNode {
                    node: id,
                    first: [existing.position.x, existing.position.y],
                    second: [position.x, position.y],
                }
                .into());
            }
            mesh.nodes.insert(id, Node::new(id, position));
            mesh.node_order.push(id);
        }
        if mesh.nodes.is_empty() {
            return Err(StructuralError::EmptyMesh.into());
        }

        // Elements
        for raw in &self.elements {
            if mesh.bulk.contains_key(&raw.id) || mesh.cohesive.contains_key(&raw.id) {
                return Err(ParseError::DuplicateElement { element: raw.id }.into());
            }
            if let Some(&node) = raw.nodes.iter().find(|n| !mesh.nodes.contains_key(n)) {
                return Err(StructuralError::UndefinedNode {
                    element: raw.id,
                    node,
                }
                .into());
            }

            if raw.kind.is_cohesive() {
                let (minus, plus) = CohesiveElement::split_connectivity(&raw.nodes);
                mesh.cohesive.insert(
                    raw.id,
                    CohesiveElement {
                        id: raw.id,
                        type_name: raw.type_name.clone(),
                        minus,
                        plus,
                        // Placeholder until the sides are attached below
                        grains: (GrainId::new(0), GrainId::new(0)),
                    },
                );
                mesh.cohesive_order.push(raw.id);
            } else {
                mesh.bulk.insert(
                    raw.id,
                    BulkElement {
                        id: raw.id,
                        kind: raw.kind,
                        type_name: raw.type_name.clone(),
                        nodes: raw.nodes.clone(),
                        grain: None,
                    },
                );
                mesh.bulk_order.push(raw.id);
            }
        }

        // Grains from their element sets
        let mut grains: BTreeMap<GrainId, Grain> = BTreeMap::new();
        for set in &self.element_sets {
            let Some(grain) = self.grain_label(&set.name) else {
                continue;
            };
            let entry = grains.entry(grain).or_insert_with(|| Grain {
                id: grain,
                set_name: set.name.clone(),
                centroid: None,
                elements: Vec::new(),
                boundary: Vec::new(),
            });
            for &element in &set.elements {
                let bulk = mesh
                    .bulk
                    .get_mut(&element)
                    .ok_or(StructuralError::UndefinedElement { grain, element })?;
                match bulk.grain {
                    Some(first) if first == grain => continue,
                    Some(first) => {
                        return Err(StructuralError::ElementInTwoGrains {
                            element,
                            first,
                            second: grain,
                        }
                        .into())
                    }
                    None => bulk.grain = Some(grain),
                }
                entry.elements.push(element);
            }
        }
        if grains.is_empty() {
            return Err(ParseError::NoGrains.into());
        }
        if let Some(grain) = grains.values().find(|g| g.elements.is_empty()) {
            return Err(StructuralError::EmptyGrain { grain: grain.id }.into());
        }

        for bulk in mesh.bulk.values() {
            if let Some(grain) = bulk.grain {
                for id in &bulk.nodes {
                    if let Some(node) = mesh.nodes.get_mut(id) {
                        node.grains.insert(grain);
                    }
                }
            }
        }

        for grain in grains.values_mut() {
            let elements: Vec<&BulkElement> = grain
                .elements
                .iter()
                .filter_map(|id| mesh.bulk.get(id))
                .collect();
            grain.boundary = trace_rings(grain.id, &elements, &mesh.nodes)?;
            debug!(
                "grain {}: {} elements, {} boundary ring(s)",
                grain.id,
                grain.elements.len(),
                grain.boundary.len()
            );
        }
        mesh.grains = grains;

        // Attach cohesive sides to grains
        let mut pairs: HashMap<(GrainId, GrainId), Vec<ElementId>> = HashMap::new();
        for id in &mesh.cohesive_order {
            let Some(element) = mesh.cohesive.get(id) else {
                continue;
            };
            let minus = side_grain(&mesh, *id, &element.minus)?;
            let plus = side_grain(&mesh, *id, &element.plus)?;
            if minus == plus {
                return Err(StructuralError::SameGrainSides {
                    element: *id,
                    grain: minus,
                }
                .into());
            }
            let key = if minus <= plus { (minus, plus) } else { (plus, minus) };
            pairs.entry(key).or_default().push(*id);
            if let Some(element) = mesh.cohesive.get_mut(id) {
                element.grains = (minus, plus);
            }
        }
        mesh.pairs = pairs;

        mesh.element_sets = self.element_sets;
        mesh.node_sets = self.node_sets;

        Ok(mesh)
    }
}

/// The single grain owning every node of a cohesive side.
fn side_grain(mesh: &Mesh, element: ElementId, side: &[NodeId]) -> Result<GrainId> {
    let mut found: Option<GrainId> = None;
    for &node in side {
        let grain = mesh
            .nodes
            .get(&node)
            .and_then(Node::sole_grain)
            .ok_or(StructuralError::UngrainedSide { element, node })?;
        match found {
            Some(g) if g != grain => {
                return Err(StructuralError::UngrainedSide { element, node }.into())
            }
            _ => found = Some(grain),
        }
    }
    found.ok_or_else(|| {
        Error::invalid_param("cohesive side", element, "has no nodes")
    })
}
