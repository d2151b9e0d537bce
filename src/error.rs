//! Error types for grainlayer.
//!
//! Failures fall into four terminal categories, each with its own enum so
//! callers can match on the category and still get the implicated ids:
//!
//! - [`ParseError`]: malformed or inconsistent input files
//! - [`StructuralError`]: mesh topology is inconsistent
//! - [`PeriodicityError`]: periodic matching failed or broke after shrinkage
//! - [`GeometryError`]: the shrink factor produced degenerate geometry
//!
//! All of them are wrapped by [`Error`].

use std::path::PathBuf;
use thiserror::Error;

use crate::mesh::{ElementId, GrainId, NodeId};

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a mesh.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or inconsistent input.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Inconsistent mesh topology.
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    /// Periodic matching failed.
    #[error("periodicity error: {0}")]
    Periodicity(#[from] PeriodicityError),

    /// Degenerate geometry after shrinkage.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Io(_) | Error::InvalidParameter { .. } => 1,
            Error::Parse(_) => 2,
            Error::Structural(_) => 3,
            Error::Periodicity(_) => 4,
            Error::Geometry(_) => 5,
        }
    }
}

/// Malformed or inconsistent input files.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A line could not be parsed.
    #[error("{path}:{line}: {message}")]
    Syntax {
        /// The file being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// An element type outside the supported 2D family.
    #[error("{path}:{line}: unsupported element type {type_name}")]
    UnsupportedElement {
        /// The file being read.
        path: PathBuf,
        /// 1-based line number of the keyword.
        line: usize,
        /// The type label from the file.
        type_name: String,
    },

    /// A node given out of the plane.
    #[error("node {node} is not planar (z = {z})")]
    NonPlanarNode {
        /// The node.
        node: NodeId,
        /// Its z coordinate.
        z: f64,
    },

    /// The same node id appears twice with different coordinates.
    #[error("node {node} is defined twice with conflicting coordinates ({first:?} vs {second:?})")]
    ConflictingNode {
        /// The duplicated id.
        node: NodeId,
        /// Coordinates of the first definition.
        first: [f64; 2],
        /// Coordinates of the second definition.
        second: [f64; 2],
    },

    /// The same element id appears twice.
    #[error("element {element} is defined twice")]
    DuplicateElement {
        /// The duplicated id.
        element: ElementId,
    },

    /// The input defines no grains.
    #[error("mesh defines no grain element sets")]
    NoGrains,

    /// A grain boundary walk ran into a node with no continuing edge.
    #[error("grain {grain} boundary is open at node {node} (dangling segment)")]
    OpenBoundary {
        /// The grain.
        grain: GrainId,
        /// Where the walk stopped.
        node: NodeId,
    },

    /// A grain boundary touches itself at a node.
    #[error("grain {grain} boundary is not a simple polygon at node {node}")]
    PinchedBoundary {
        /// The grain.
        grain: GrainId,
        /// The node with more than one continuation.
        node: NodeId,
    },

    /// Two centroid records for the same grain.
    #[error("centroid for grain {grain} is given twice")]
    DuplicateCentroid {
        /// The grain.
        grain: GrainId,
    },

    /// A grain in the mesh has no centroid record.
    #[error("no centroid given for grain {grain}")]
    MissingCentroid {
        /// The grain.
        grain: GrainId,
    },

    /// A centroid record names a grain the mesh does not define.
    #[error("centroid given for grain {grain}, which the mesh does not define")]
    UnknownCentroid {
        /// The grain.
        grain: GrainId,
    },
}

/// Inconsistent mesh topology.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    /// An element references a node that was never defined.
    #[error("element {element} references undefined node {node}")]
    UndefinedNode {
        /// The element.
        element: ElementId,
        /// The missing node.
        node: NodeId,
    },

    /// A grain set references an element that was never defined.
    #[error("grain {grain} references undefined bulk element {element}")]
    UndefinedElement {
        /// The grain.
        grain: GrainId,
        /// The missing element.
        element: ElementId,
    },

    /// A bulk element is listed in two grain sets.
    #[error("bulk element {element} belongs to grains {first} and {second}")]
    ElementInTwoGrains {
        /// The element.
        element: ElementId,
        /// First grain.
        first: GrainId,
        /// Second grain.
        second: GrainId,
    },

    /// A grain without elements.
    #[error("grain {grain} has no elements")]
    EmptyGrain {
        /// The grain.
        grain: GrainId,
    },

    /// A cohesive side whose nodes do not sit in exactly one grain.
    #[error("cohesive element {element} has a side that does not belong to a single grain (node {node})")]
    UngrainedSide {
        /// The cohesive element.
        element: ElementId,
        /// The offending node.
        node: NodeId,
    },

    /// Both sides of a cohesive element lie in the same grain.
    #[error("cohesive element {element} has both sides in grain {grain}")]
    SameGrainSides {
        /// The cohesive element.
        element: ElementId,
        /// The grain.
        grain: GrainId,
    },

    /// The two sides of a cohesive element have different node counts.
    #[error("cohesive element {element} has mismatched sides ({minus} vs {plus} nodes)")]
    MismatchedSides {
        /// The cohesive element.
        element: ElementId,
        /// Minus side count.
        minus: usize,
        /// Plus side count.
        plus: usize,
    },

    /// Paired cohesive nodes are not at the same location.
    #[error("cohesive element {element} is not zero-thickness: nodes {minus} and {plus} are {distance} apart")]
    NonCoincidentSides {
        /// The cohesive element.
        element: ElementId,
        /// Minus side node.
        minus: NodeId,
        /// Plus side node.
        plus: NodeId,
        /// Their separation.
        distance: f64,
    },

    /// A node referenced by bulk elements of more than one grain.
    #[error("node {node} is shared by grains {first} and {second} instead of being duplicated")]
    SharedNode {
        /// The node.
        node: NodeId,
        /// First grain.
        first: GrainId,
        /// Second grain.
        second: GrainId,
    },

    /// A grain without a centroid reached the shrink engine.
    #[error("grain {grain} has no centroid")]
    MissingCentroid {
        /// The grain.
        grain: GrainId,
    },

    /// The mesh has no nodes.
    #[error("mesh has no nodes")]
    EmptyMesh,
}

/// Periodic matching failed or became inconsistent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PeriodicityError {
    /// A face node has no counterpart on the opposite face.
    #[error("node {node} on the {face} face has no periodic counterpart within tolerance")]
    Unmatched {
        /// The node.
        node: NodeId,
        /// Face label, e.g. `x-min`.
        face: &'static str,
    },

    /// More than one counterpart within tolerance and no clear winner.
    #[error("node {node} matches both {first} and {second} within tolerance")]
    Ambiguous {
        /// The node being matched.
        node: NodeId,
        /// Closest candidate.
        first: NodeId,
        /// Runner-up candidate.
        second: NodeId,
    },

    /// Two minimum-face groups map onto the same maximum-face group.
    #[error("nodes {first} and {second} both map onto node {upper} across the seam")]
    ClaimedTwice {
        /// First node of the maximum-face group.
        upper: NodeId,
        /// First node of the group that claimed it first.
        first: NodeId,
        /// First node of the group that claimed it again.
        second: NodeId,
    },

    /// Coincident node groups of different size across the seam.
    #[error("node group at {lower} ({lower_len} copies) does not match group at {upper} ({upper_len} copies)")]
    GroupSizeMismatch {
        /// First node of the minimum-face group.
        lower: NodeId,
        /// Copies in the minimum-face group.
        lower_len: usize,
        /// First node of the maximum-face group.
        upper: NodeId,
        /// Copies in the maximum-face group.
        upper_len: usize,
    },

    /// After shrinkage a linked pair no longer differs by the period.
    #[error("nodes {lower} and {upper} are no longer periodic after shrinkage (off by {deviation})")]
    Inconsistent {
        /// Node on the minimum face.
        lower: NodeId,
        /// Node on the maximum face.
        upper: NodeId,
        /// Distance from the expected position.
        deviation: f64,
    },

    /// The domain has no extent along an axis.
    #[error("domain has zero extent along {axis}")]
    DegenerateDomain {
        /// Axis label.
        axis: &'static str,
    },
}

/// The shrink factor produced degenerate or self-intersecting geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A grain ring changed orientation or collapsed.
    #[error("grain {grain} collapses or inverts at shrink factor {factor} (area {before} -> {after})")]
    Inverted {
        /// The grain.
        grain: GrainId,
        /// The shrink factor.
        factor: f64,
        /// Signed area before shrinkage.
        before: f64,
        /// Signed area after shrinkage.
        after: f64,
    },

    /// A grain ring crosses itself.
    #[error("grain {grain} self-intersects at shrink factor {factor}")]
    SelfIntersection {
        /// The grain.
        grain: GrainId,
        /// The shrink factor.
        factor: f64,
    },

    /// An interface element came out twisted.
    #[error("interface element built from cohesive element {element} is twisted")]
    TwistedInterface {
        /// The source cohesive element.
        element: ElementId,
    },

    /// An interface element has no area in either orientation.
    #[error("interface element built from cohesive element {element} has zero area ({area})")]
    FlatInterface {
        /// The source cohesive element.
        element: ElementId,
        /// Signed area of the element.
        area: f64,
    },

    /// A junction fill triangle has no positive area.
    #[error("junction fill around node {center} is degenerate")]
    DegenerateJunction {
        /// The junction centre node.
        center: NodeId,
    },
}

impl GeometryError {
    /// The grain implicated, if the error concerns one.
    pub fn grain(&self) -> Option<GrainId> {
        match self {
            GeometryError::Inverted { grain, .. } | GeometryError::SelfIntersection { grain, .. } => {
                Some(*grain)
            }
            _ => None,
        }
    }
}
