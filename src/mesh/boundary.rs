//! Grain boundary reconstruction.
//!
//! The boundary of a grain is the set of element edges used by exactly one of
//! its elements. Every element is oriented counter-clockwise first, so the
//! free edges form directed loops: outer rings run counter-clockwise, holes
//! clockwise. The loops are recovered by walking an adjacency map from each
//! edge's end node to the free edge starting there.

use std::collections::HashMap;

use nalgebra::Point2;

use super::element::{BulkElement, ElementEdge, Node};
use super::geometry::signed_area;
use super::index::{GrainId, NodeId};
use crate::error::{ParseError, Result};

/// Trace the closed boundary rings of one grain.
///
/// Fails with [`ParseError::OpenBoundary`] if a walk reaches a node with no
/// continuing edge and with [`ParseError::PinchedBoundary`] if a node has
/// more than one.
pub(crate) fn trace_rings(
    grain: GrainId,
    elements: &[&BulkElement],
    nodes: &HashMap<NodeId, Node>,
) -> Result<Vec<Vec<NodeId>>> {
    let oriented = oriented_edges(elements, nodes);

    let mut uses: HashMap<(NodeId, NodeId), usize> = HashMap::new();
    for edge in &oriented {
        *uses.entry(undirected(edge)).or_insert(0) += 1;
    }

    let mut free: Vec<ElementEdge> = oriented
        .into_iter()
        .filter(|e| uses[&undirected(e)] == 1)
        .collect();
    free.sort_by_key(|e| (e.start, e.end));

    // Adjacency: start node -> free edge leaving it
    let mut outgoing: HashMap<NodeId, usize> = HashMap::with_capacity(free.len());
    for (i, edge) in free.iter().enumerate() {
        if outgoing.insert(edge.start, i).is_some() {
            return Err(ParseError::PinchedBoundary {
                grain,
                node: edge.start,
            }
            .into());
        }
    }

    let mut visited = vec![false; free.len()];
    let mut rings = Vec::new();

    for first in 0..free.len() {
        if visited[first] {
            continue;
        }

        let mut ring = Vec::new();
        let mut current = first;
        loop {
            visited[current] = true;
            let edge = free[current];
            ring.push(edge.start);
            if let Some(mid) = edge.mid {
                ring.push(mid);
            }

            let next = *outgoing.get(&edge.end).ok_or(ParseError::OpenBoundary {
                grain,
                node: edge.end,
            })?;
            if next == first {
                break;
            }
            if visited[next] {
                // Two free edges end at the same node
                return Err(ParseError::PinchedBoundary {
                    grain,
                    node: edge.end,
                }
                .into());
            }
            current = next;
        }
        rings.push(ring);
    }

    Ok(rings)
}

/// All element edges, each element taken counter-clockwise.
fn oriented_edges(elements: &[&BulkElement], nodes: &HashMap<NodeId, Node>) -> Vec<ElementEdge> {
    let mut out = Vec::new();
    for element in elements {
        let corners: Vec<Point2<f64>> = element
            .corners()
            .iter()
            .filter_map(|id| nodes.get(id).map(|n| n.position))
            .collect();
        let edges = element.edges();
        if signed_area(&corners) < 0.0 {
            out.extend(edges.into_iter().rev().map(ElementEdge::reversed));
        } else {
            out.extend(edges);
        }
    }
    out
}

fn undirected(edge: &ElementEdge) -> (NodeId, NodeId) {
    if edge.start <= edge.end {
        (edge.start, edge.end)
    } else {
        (edge.end, edge.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mesh::{ElementId, ElementKind};

    fn node_map(coords: &[(u64, f64, f64)]) -> HashMap<NodeId, Node> {
        coords
            .iter()
            .map(|&(id, x, y)| (NodeId::new(id), Node::new(NodeId::new(id), Point2::new(x, y))))
            .collect()
    }

    fn tri(id: u64, nodes: [u64; 3]) -> BulkElement {
        BulkElement {
            id: ElementId::new(id),
            kind: ElementKind::Tri3,
            type_name: "CPE3".to_string(),
            nodes: nodes.iter().copied().map(NodeId::new).collect(),
            grain: None,
        }
    }

    fn ids(raw: &[u64]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::new).collect()
    }

    #[test]
    fn test_square_from_two_triangles() {
        let nodes = node_map(&[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 1.0), (4, 0.0, 1.0)]);
        let a = tri(1, [1, 2, 3]);
        // Clockwise on purpose; orientation is normalised
        let b = tri(2, [1, 4, 3]);
        let rings = trace_rings(GrainId::new(1), &[&a, &b], &nodes).unwrap();

        assert_eq!(rings, vec![ids(&[1, 2, 3, 4])]);
        let pts: Vec<_> = rings[0].iter().map(|id| nodes[id].position).collect();
        assert!(signed_area(&pts) > 0.0);
    }

    #[test]
    fn test_quadratic_ring_includes_midside_nodes() {
        let nodes = node_map(&[
            (1, 0.0, 0.0),
            (2, 2.0, 0.0),
            (3, 0.0, 2.0),
            (4, 1.0, 0.0),
            (5, 1.0, 1.0),
            (6, 0.0, 1.0),
        ]);
        let e = BulkElement {
            id: ElementId::new(1),
            kind: ElementKind::Tri6,
            type_name: "CPE6".to_string(),
            nodes: ids(&[1, 2, 3, 4, 5, 6]),
            grain: None,
        };
        let rings = trace_rings(GrainId::new(3), &[&e], &nodes).unwrap();
        assert_eq!(rings, vec![ids(&[1, 4, 2, 5, 3, 6])]);
    }

    #[test]
    fn test_two_disjoint_pieces_give_two_rings() {
        let nodes = node_map(&[
            (1, 0.0, 0.0),
            (2, 1.0, 0.0),
            (3, 0.0, 1.0),
            (4, 5.0, 0.0),
            (5, 6.0, 0.0),
            (6, 5.0, 1.0),
        ]);
        let a = tri(1, [1, 2, 3]);
        let b = tri(2, [4, 5, 6]);
        let rings = trace_rings(GrainId::new(1), &[&a, &b], &nodes).unwrap();
        assert_eq!(rings.len(), 2);
    }

    #[test]
    fn test_pinch_point_is_rejected() {
        // Two triangles touching only at node 2
        let nodes = node_map(&[
            (1, 0.0, 0.0),
            (2, 1.0, 1.0),
            (3, 0.0, 2.0),
            (4, 2.0, 0.0),
            (5, 2.0, 2.0),
        ]);
        let a = tri(1, [1, 2, 3]);
        let b = tri(2, [2, 4, 5]);
        let err = trace_rings(GrainId::new(9), &[&a, &b], &nodes).unwrap_err();
        match err {
            Error::Parse(ParseError::PinchedBoundary { grain, node }) => {
                assert_eq!(grain, GrainId::new(9));
                assert_eq!(node, NodeId::new(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_edge_shared_by_three_triangles_is_rejected() {
        // Edge 1-3 borders all three triangles, leaving two free edges at node 3
        let nodes = node_map(&[
            (1, 0.0, 0.0),
            (2, 1.0, 0.0),
            (3, 1.0, 1.0),
            (4, 0.0, 1.0),
            (5, 0.5, 2.0),
        ]);
        let a = tri(1, [1, 2, 3]);
        let b = tri(2, [1, 3, 4]);
        let c = tri(3, [1, 3, 5]);
        let err = trace_rings(GrainId::new(1), &[&a, &b, &c], &nodes).unwrap_err();
        match &err {
            Error::Parse(ParseError::PinchedBoundary { grain, node }) => {
                assert_eq!(*grain, GrainId::new(1));
                assert_eq!(*node, NodeId::new(3));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.exit_code(), 2);
    }
}
