//! Junction filling.
//!
//! Where three or more grains meet, shrinking opens a small polygonal hole
//! bounded by the copies of the junction node. The hole is not covered by
//! any interface element, so it is fanned into linear triangles around a
//! centre node. Tessellation pipelines usually leave a free node at every
//! junction; it is reused as the centre when present.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use nalgebra::Point2;

use crate::error::{Error, GeometryError, Result, StructuralError};
use crate::mesh::geometry::{incenter, mean, orient};
use crate::mesh::{ElementId, GrainId, Mesh, NodeId};

/// A point where copies from three or more grains coincide.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    /// Location before shrinkage.
    pub location: Point2<f64>,
    /// The grain copies meeting here, ascending by label.
    pub copies: Vec<NodeId>,
    /// A free node at the same location, if one exists.
    pub free_node: Option<NodeId>,
}

/// A linear triangle covering part of a junction hole.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionElement {
    /// New element label.
    pub id: ElementId,
    /// Type label, e.g. `CPE3`.
    pub type_name: String,
    /// `[centre, copy, next copy]`, counter-clockwise.
    pub nodes: [NodeId; 3],
}

/// Triangles and nodes added by [`fill_junctions`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JunctionFill {
    /// Fill triangles, labelled contiguously.
    pub elements: Vec<JunctionElement>,
    /// Centre nodes that had to be created.
    pub new_nodes: Vec<NodeId>,
}

/// Find the junctions of the mesh.
///
/// Must run before shrinkage, while the copies still coincide. Points on
/// the domain faces are skipped.
pub fn detect_junctions(mesh: &Mesh, tolerance: f64) -> Result<Vec<Junction>> {
    let domain = mesh.domain().ok_or(StructuralError::EmptyMesh)?;
    let referenced: BTreeSet<NodeId> = mesh.referenced_node_ids().into_iter().collect();

    // Grain copies and free nodes; nodes of carried elements stay out
    let candidates: Vec<NodeId> = mesh
        .nodes()
        .filter(|n| !n.grains.is_empty() || !referenced.contains(&n.id))
        .map(|n| n.id)
        .collect();

    let mut junctions = Vec::new();
    for group in mesh.coincident_groups(&candidates, tolerance) {
        let Some(location) = mesh.position(group[0]) else {
            continue;
        };
        if domain.on_boundary(&location, tolerance) {
            continue;
        }

        let mut copies = Vec::new();
        let mut grains: BTreeSet<GrainId> = BTreeSet::new();
        let mut free_node = None;
        for id in group {
            let Some(node) = mesh.node(id) else {
                continue;
            };
            match node.sole_grain() {
                Some(grain) => {
                    copies.push(id);
                    grains.insert(grain);
                }
                None if node.grains.is_empty() && free_node.is_none() => {
                    free_node = Some(id);
                }
                None => {}
            }
        }

        if grains.len() >= 3 {
            debug!(
                "junction of {} grains at ({}, {})",
                grains.len(),
                location.x,
                location.y
            );
            junctions.push(Junction {
                location,
                copies,
                free_node,
            });
        }
    }

    Ok(junctions)
}

/// Fan every junction hole into triangles around a centre node.
///
/// Must run after shrinkage. The centre is the incentre of the copies for
/// a triple junction and their mean otherwise. Quadratic meshes are left
/// unfilled.
///
/// # Errors
///
/// - [`GeometryError::DegenerateJunction`] if a fill triangle has no positive
///   area
/// - [`Error::InvalidParameter`] if node or element labels run out
pub fn fill_junctions(
    mesh: &mut Mesh,
    junctions: &[Junction],
    first_id: ElementId,
) -> Result<JunctionFill> {
    let mut fill = JunctionFill::default();
    if junctions.is_empty() {
        return Ok(fill);
    }
    if mesh.bulk_elements().any(|e| e.kind.is_quadratic()) {
        warn!(
            "skipping {} junction(s): filling quadratic meshes is not supported",
            junctions.len()
        );
        return Ok(fill);
    }
    let type_name = fill_type_name(mesh);

    let mut next_id = Some(first_id);
    for junction in junctions {
        let points: Vec<(NodeId, Point2<f64>)> = junction
            .copies
            .iter()
            .filter_map(|&n| mesh.position(n).map(|p| (n, p)))
            .collect();
        let positions: Vec<Point2<f64>> = points.iter().map(|(_, p)| *p).collect();
        let center_pos = match positions.as_slice() {
            [a, b, c] => incenter(a, b, c),
            _ => mean(&positions).unwrap_or(junction.location),
        };

        let center = match junction.free_node {
            Some(free) => {
                if let Some(node) = mesh.node_mut(free) {
                    node.position = center_pos;
                }
                free
            }
            None => {
                let created = mesh.add_free_node(center_pos)?;
                fill.new_nodes.push(created);
                created
            }
        };

        let mut ring = points;
        ring.sort_by(|a, b| {
            let angle = |p: &Point2<f64>| (p.y - center_pos.y).atan2(p.x - center_pos.x);
            angle(&a.1).total_cmp(&angle(&b.1))
        });

        for i in 0..ring.len() {
            let (a, pa) = ring[i];
            let (b, pb) = ring[(i + 1) % ring.len()];
            if orient(&center_pos, &pa, &pb) <= 0.0 {
                return Err(GeometryError::DegenerateJunction { center }.into());
            }
            let id = next_id.ok_or_else(|| {
                Error::invalid_param("element id", center, "no label left for its junction triangles")
            })?;
            next_id = id.next();
            fill.elements.push(JunctionElement {
                id,
                type_name: type_name.clone(),
                nodes: [center, a, b],
            });
        }
    }

    info!(
        "Filled {} junction(s) with {} triangles",
        junctions.len(),
        fill.elements.len()
    );
    Ok(fill)
}

/// Linear triangle type in the plane family of the bulk mesh.
fn fill_type_name(mesh: &Mesh) -> String {
    let family: String = mesh
        .bulk_elements()
        .find(|e| e.grain.is_some())
        .map(|e| {
            e.type_name
                .trim()
                .to_ascii_uppercase()
                .chars()
                .take_while(|c| c.is_ascii_alphabetic())
                .collect()
        })
        .unwrap_or_default();
    if family.is_empty() {
        "CPE3".to_string()
    } else {
        format!("{family}3")
    }
}
