//! Interface element construction.
//!
//! Once the grains have been shrunk, the two sides of every cohesive element
//! are apart. Each cohesive element becomes an interface element of finite
//! thickness whose connectivity runs along one side and back along the other.
//! Every interface element is counter-clockwise: when `minus ++ reverse(plus)`
//! runs clockwise the sides are swapped to `plus ++ reverse(minus)`.

use log::info;

use crate::error::{Error, GeometryError, Result, StructuralError};
use crate::mesh::geometry::{is_simple, signed_area};
use crate::mesh::{ElementId, GrainId, Mesh, NodeId};

/// A finite-thickness element replacing one cohesive element.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceElement {
    /// New element label.
    pub id: ElementId,
    /// The cohesive element this replaces.
    pub source: ElementId,
    /// Type label, carried over from the cohesive element.
    pub type_name: String,
    /// Corners in counter-clockwise order. The first half lies on the grain
    /// `grains.0`, the second half on `grains.1`.
    pub nodes: Vec<NodeId>,
    /// Grains on the leading and trailing halves of `nodes`.
    pub grains: (GrainId, GrainId),
}

/// First label available for generated elements.
///
/// Without a request this is one past the largest element label. A
/// requested label must exceed every existing one.
pub fn first_free_element_id(mesh: &Mesh, requested: Option<u64>) -> Result<ElementId> {
    let next = match mesh.max_element_id() {
        Some(max) => element_after(max)?,
        None => ElementId::new(1),
    };
    match requested {
        None => Ok(next),
        Some(id) if id >= next.get() => Ok(ElementId::new(id)),
        Some(id) => Err(Error::invalid_param(
            "first element id",
            id,
            "must exceed every existing element id",
        )),
    }
}

/// The element label following `id`.
///
/// Fails with [`Error::InvalidParameter`] past the largest label.
pub(crate) fn element_after(id: ElementId) -> Result<ElementId> {
    id.next()
        .ok_or_else(|| Error::invalid_param("element id", id, "no label left after it"))
}

/// Build one interface element per cohesive element.
///
/// Labels are allocated contiguously from `first_id` in cohesive input
/// order.
///
/// # Errors
///
/// - [`StructuralError::MismatchedSides`] if the sides differ in length
/// - [`GeometryError::TwistedInterface`] if the new element crosses itself
/// - [`GeometryError::FlatInterface`] if it has no area
/// - [`Error::InvalidParameter`] if the labels run out
pub fn stitch_interfaces(mesh: &Mesh, first_id: ElementId) -> Result<Vec<InterfaceElement>> {
    let mut interfaces = Vec::with_capacity(mesh.num_cohesive_elements());
    let mut next_id = Some(first_id);

    for cohesive in mesh.cohesive_elements() {
        if cohesive.minus.len() != cohesive.plus.len() {
            return Err(StructuralError::MismatchedSides {
                element: cohesive.id,
                minus: cohesive.minus.len(),
                plus: cohesive.plus.len(),
            }
            .into());
        }

        let mut nodes: Vec<NodeId> = cohesive
            .minus
            .iter()
            .chain(cohesive.plus.iter().rev())
            .copied()
            .collect();
        let mut grains = cohesive.grains;
        let ring = mesh.ring_positions(&nodes);
        if !is_simple(&ring) {
            return Err(GeometryError::TwistedInterface {
                element: cohesive.id,
            }
            .into());
        }

        let area = signed_area(&ring);
        if area < 0.0 {
            // Reversing the whole ring puts the plus side first
            nodes.reverse();
            grains = (grains.1, grains.0);
        } else if area == 0.0 || !area.is_finite() {
            return Err(GeometryError::FlatInterface {
                element: cohesive.id,
                area,
            }
            .into());
        }

        let id = match next_id {
            Some(id) => id,
            None => {
                return Err(Error::invalid_param(
                    "element id",
                    cohesive.id,
                    "no label left for its interface element",
                ))
            }
        };
        next_id = id.next();
        interfaces.push(InterfaceElement {
            id,
            source: cohesive.id,
            type_name: cohesive.type_name.clone(),
            nodes,
            grains,
        });
    }

    info!("Built {} interface elements", interfaces.len());
    Ok(interfaces)
}
