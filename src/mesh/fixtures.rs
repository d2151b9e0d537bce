//! Small meshes shared by the unit tests.

use std::collections::BTreeMap;

use nalgebra::Point2;

use super::{ElementId, GrainId, Mesh, MeshBuilder, NodeId};

fn ids(raw: &[u64]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId::new).collect()
}

fn eids(raw: &[u64]) -> Vec<ElementId> {
    raw.iter().copied().map(ElementId::new).collect()
}

fn add_nodes(b: &mut MeshBuilder, coords: &[(u64, f64, f64)]) {
    for &(id, x, y) in coords {
        b.add_node(NodeId::new(id), Point2::new(x, y));
    }
}

fn add_elements(b: &mut MeshBuilder, type_name: &str, elements: &[(u64, &[u64])]) {
    for (id, nodes) in elements {
        b.add_element(ElementId::new(*id), type_name, ids(nodes))
            .unwrap();
    }
}

/// Two unit-height squares side by side, joined by one cohesive element.
///
/// Grain 1 spans [-1, 1] x [-1, 1], grain 2 spans [1, 3] x [-1, 1]. The
/// shared boundary at x = 1 carries the duplicated node pairs 2/5 and 3/8.
pub(crate) fn two_grains_builder() -> MeshBuilder {
    let mut b = MeshBuilder::new();
    add_nodes(
        &mut b,
        &[
            (1, -1.0, -1.0),
            (2, 1.0, -1.0),
            (3, 1.0, 1.0),
            (4, -1.0, 1.0),
            (5, 1.0, -1.0),
            (6, 3.0, -1.0),
            (7, 3.0, 1.0),
            (8, 1.0, 1.0),
        ],
    );
    add_elements(
        &mut b,
        "CPE3",
        &[(1, &[1, 2, 3]), (2, &[1, 3, 4]), (3, &[5, 6, 7]), (4, &[5, 7, 8])],
    );
    add_elements(&mut b, "COH2D4", &[(5, &[2, 3, 8, 5])]);
    b.add_element_set("face1", eids(&[1, 2]));
    b.add_element_set("face2", eids(&[3, 4]));
    b
}

pub(crate) fn two_grains() -> Mesh {
    two_grains_builder().build().unwrap()
}

pub(crate) fn two_grain_centroids() -> BTreeMap<GrainId, Point2<f64>> {
    BTreeMap::from([
        (GrainId::new(1), Point2::new(0.0, 0.0)),
        (GrainId::new(2), Point2::new(2.0, 0.0)),
    ])
}

/// The two-grain mesh with centroids assigned.
pub(crate) fn two_grains_with_centroids() -> Mesh {
    let mut mesh = two_grains();
    mesh.assign_centroids(&two_grain_centroids()).unwrap();
    mesh
}

/// Four unit-square grains tiling [0, 2] x [0, 2].
///
/// Grain `g` (1..=4) sits at column `(g - 1) % 2`, row `(g - 1) / 2`, and owns
/// nodes `10g + 1 ..= 10g + 4` counter-clockwise from its lower-left corner.
/// Cohesive elements 101..=104 join the four interior boundaries, which meet
/// in a four-grain junction at (1, 1). With `free_center` a node 50 that no
/// element references is placed at the junction.
pub(crate) fn grid_builder(free_center: bool) -> MeshBuilder {
    let mut b = MeshBuilder::new();
    for g in 1..=4u64 {
        let x0 = ((g - 1) % 2) as f64;
        let y0 = ((g - 1) / 2) as f64;
        let base = 10 * g;
        add_nodes(
            &mut b,
            &[
                (base + 1, x0, y0),
                (base + 2, x0 + 1.0, y0),
                (base + 3, x0 + 1.0, y0 + 1.0),
                (base + 4, x0, y0 + 1.0),
            ],
        );
        add_elements(
            &mut b,
            "CPE3",
            &[
                (base + 1, &[base + 1, base + 2, base + 3]),
                (base + 2, &[base + 1, base + 3, base + 4]),
            ],
        );
        b.add_element_set(format!("face{g}"), eids(&[base + 1, base + 2]));
    }
    add_elements(
        &mut b,
        "COH2D4",
        &[
            (101, &[12, 13, 24, 21]),
            (102, &[32, 33, 44, 41]),
            (103, &[14, 13, 32, 31]),
            (104, &[24, 23, 42, 41]),
        ],
    );
    if free_center {
        add_nodes(&mut b, &[(50, 1.0, 1.0)]);
    }
    b
}

pub(crate) fn grid_centroids() -> BTreeMap<GrainId, Point2<f64>> {
    (1..=4u32)
        .map(|g| {
            let x = ((g - 1) % 2) as f64 + 0.5;
            let y = ((g - 1) / 2) as f64 + 0.5;
            (GrainId::new(g), Point2::new(x, y))
        })
        .collect()
}

pub(crate) fn grid(free_center: bool) -> Mesh {
    let mut mesh = grid_builder(free_center).build().unwrap();
    mesh.assign_centroids(&grid_centroids()).unwrap();
    mesh
}

/// A single square grain fanned around node 8, with two x-max nodes 3 and 4
/// straddling the image of x-min node 7 at equal distance.
pub(crate) fn ambiguous_square() -> Mesh {
    let mut b = MeshBuilder::new();
    add_nodes(
        &mut b,
        &[
            (1, 0.0, 0.0),
            (2, 1.0, 0.0),
            (3, 1.0, 0.4994),
            (4, 1.0, 0.5006),
            (5, 1.0, 1.0),
            (6, 0.0, 1.0),
            (7, 0.0, 0.5),
            (8, 0.5, 0.5),
        ],
    );
    add_elements(
        &mut b,
        "CPE3",
        &[
            (1, &[8, 1, 2]),
            (2, &[8, 2, 3]),
            (3, &[8, 3, 4]),
            (4, &[8, 4, 5]),
            (5, &[8, 5, 6]),
            (6, &[8, 6, 7]),
            (7, &[8, 7, 1]),
        ],
    );
    b.add_element_set("face1", eids(&[1, 2, 3, 4, 5, 6, 7]));
    let mut mesh = b.build().unwrap();
    mesh.set_centroid(GrainId::new(1), Point2::new(0.5, 0.5));
    mesh
}

/// A thin hooked grain that folds over itself when shrunk hard, next to a
/// triangular grain that stretches the domain to [0, 10] x [0, 10].
pub(crate) fn hooked_grain() -> Mesh {
    let mut b = MeshBuilder::new();
    add_nodes(
        &mut b,
        &[
            (1, 0.0, 1.0),
            (2, 4.0, 5.0),
            (3, 4.0, 6.0),
            (4, 0.5, 6.0),
            (5, 0.5, 3.0),
            (6, 0.0, 3.0),
            (7, 10.0, 0.0),
            (8, 10.0, 10.0),
            (9, 6.0, 10.0),
        ],
    );
    add_elements(
        &mut b,
        "CPE3",
        &[
            (1, &[1, 2, 5]),
            (2, &[2, 3, 4]),
            (3, &[2, 4, 5]),
            (4, &[1, 5, 6]),
            (5, &[7, 8, 9]),
        ],
    );
    b.add_element_set("face1", eids(&[1, 2, 3, 4]));
    b.add_element_set("face2", eids(&[5]));
    let mut mesh = b.build().unwrap();
    mesh.set_centroid(GrainId::new(1), Point2::new(1.742063, 4.246032));
    mesh.set_centroid(GrainId::new(2), Point2::new(26.0 / 3.0, 20.0 / 3.0));
    mesh
}
