//! Planar geometry helpers.
//!
//! Shoelace areas, simple-polygon tests and the axis-aligned domain box used
//! to find nodes on the outer faces of the mesh.

use nalgebra::{Point2, Vector2};

/// Signed area of a closed polygon (positive for counter-clockwise order).
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        twice += p.x * q.y - q.x * p.y;
    }
    0.5 * twice
}

/// Twice the signed area of triangle `abc`.
#[inline]
pub fn orient(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b - a).perp(&(c - a))
}

/// Check whether two segments cross or overlap along a positive length.
///
/// Touching at a single point does not count.
pub fn segments_cross(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
) -> bool {
    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);

    if o1 * o2 < 0.0 && o3 * o4 < 0.0 {
        return true;
    }

    if o1 == 0.0 && o2 == 0.0 && o3 == 0.0 && o4 == 0.0 {
        // Collinear: project on the dominant direction and compare intervals
        let dir = b - a;
        let axis = if dir.x.abs() >= dir.y.abs() { 0 } else { 1 };
        let (lo1, hi1) = ordered(a[axis], b[axis]);
        let (lo2, hi2) = ordered(c[axis], d[axis]);
        return lo1.max(lo2) < hi1.min(hi2);
    }

    false
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Check whether a closed polygon is simple (no two non-adjacent edges cross).
pub fn is_simple(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    if n < 4 {
        return true;
    }
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        for j in (i + 2)..n {
            // Edge n-1 is adjacent to edge 0
            if i == 0 && j == n - 1 {
                continue;
            }
            let c = &points[j];
            let d = &points[(j + 1) % n];
            if segments_cross(a, b, c, d) {
                return false;
            }
        }
    }
    true
}

/// Incentre of triangle `abc`.
///
/// Falls back to the vertex mean when the triangle has zero perimeter.
pub fn incenter(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Point2<f64> {
    let la = (b - c).norm();
    let lb = (c - a).norm();
    let lc = (a - b).norm();
    let perimeter = la + lb + lc;
    if perimeter == 0.0 {
        return *a;
    }
    Point2::from((a.coords * la + b.coords * lb + c.coords * lc) / perimeter)
}

/// Vertex mean of a set of points.
pub fn mean(points: &[Point2<f64>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum: Vector2<f64> = points.iter().map(|p| p.coords).sum();
    Some(Point2::from(sum / points.len() as f64))
}

/// A coordinate axis of the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
}

impl Axis {
    /// Both axes, x first.
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    /// Coordinate index of this axis.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }

    /// The other axis (the direction along a face normal to this axis).
    #[inline]
    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }

    /// Label of the minimum face normal to this axis.
    pub fn min_face(self) -> &'static str {
        match self {
            Axis::X => "x-min",
            Axis::Y => "y-min",
        }
    }

    /// Label of the maximum face normal to this axis.
    pub fn max_face(self) -> &'static str {
        match self {
            Axis::X => "x-max",
            Axis::Y => "y-max",
        }
    }
}

/// Axis-aligned bounding box of the mesh domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainBox {
    /// Lower-left corner.
    pub min: Point2<f64>,
    /// Upper-right corner.
    pub max: Point2<f64>,
}

impl DomainBox {
    /// Bounding box of a set of points, or `None` if there are none.
    pub fn from_points<'a, It>(points: It) -> Option<Self>
    where
        It: IntoIterator<Item = &'a Point2<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    /// Extent along an axis.
    #[inline]
    pub fn extent(&self, axis: Axis) -> f64 {
        self.max[axis.index()] - self.min[axis.index()]
    }

    /// Translation from the minimum face to the maximum face along `axis`.
    pub fn period(&self, axis: Axis) -> Vector2<f64> {
        let mut v = Vector2::zeros();
        v[axis.index()] = self.extent(axis);
        v
    }

    /// Whether `p` lies on the minimum face normal to `axis`.
    #[inline]
    pub fn on_min_face(&self, p: &Point2<f64>, axis: Axis, tol: f64) -> bool {
        (p[axis.index()] - self.min[axis.index()]).abs() <= tol
    }

    /// Whether `p` lies on the maximum face normal to `axis`.
    #[inline]
    pub fn on_max_face(&self, p: &Point2<f64>, axis: Axis, tol: f64) -> bool {
        (p[axis.index()] - self.max[axis.index()]).abs() <= tol
    }

    /// Whether `p` lies on either face normal to `axis`.
    #[inline]
    pub fn on_face(&self, p: &Point2<f64>, axis: Axis, tol: f64) -> bool {
        self.on_min_face(p, axis, tol) || self.on_max_face(p, axis, tol)
    }

    /// Whether `p` lies on any of the four faces.
    pub fn on_boundary(&self, p: &Point2<f64>, tol: f64) -> bool {
        Axis::ALL.iter().any(|&axis| self.on_face(p, axis, tol))
    }
}
