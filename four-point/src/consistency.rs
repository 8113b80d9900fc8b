use ar_core::{
    nalgebra::{Point2, Vector2},
    Homography,
};
use num_traits::Float;

/// Which side of the line through `a` and `b` the point `c` lies on.
///
/// This is twice the signed area of the triangle `(a, b, c)`. It is positive when
/// the triangle winds counter-clockwise in a y-up frame.
#[inline(always)]
pub fn line_point_side(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// The smallest area among the four triangles that can be formed from four points.
pub fn smallest_triangle_area(points: &[Point2<f64>; 4]) -> f64 {
    let area = |u: Vector2<f64>, v: Vector2<f64>| Float::abs(u.perp(&v)) * 0.5;
    let [x1, x2, x3, x4] = *points;
    let v12 = x2 - x1;
    let v13 = x3 - x1;
    let v14 = x4 - x1;
    let v32 = x2 - x3;
    let v34 = x4 - x3;
    area(v12, v13)
        .min(area(v13, v14))
        .min(area(v12, v14))
        .min(area(v32, v34))
}

/// Checks if the four points, in order, form a convex quadrilateral.
pub fn quadrilateral_convex(points: &[Point2<f64>; 4]) -> bool {
    let side = |i: usize| {
        if line_point_side(points[i], points[(i + 1) % 4], points[(i + 2) % 4]) > 0.0 {
            1
        } else {
            -1
        }
    };
    let turns: i32 = (0..4).map(side).sum();
    turns.abs() == 4
}

#[inline(always)]
fn same_orientation(a: [Point2<f64>; 3], b: [Point2<f64>; 3]) -> bool {
    (line_point_side(a[0], a[1], a[2]) > 0.0) == (line_point_side(b[0], b[1], b[2]) > 0.0)
}

/// Rejects correspondences that a planar homography seen from the front could not produce,
/// along with samples that would make the four-point solve numerically unreliable.
///
/// Two rules are applied:
///
/// * Orientation: every cyclic triple of points must wind the same way in both views.
///   A plane viewed from its front side never flips, so a flip means at least one bad match.
/// * Collinearity: the smallest triangle formed by the four points, divided by the mean squared
///   distance of the points from their centroid, must be at least [`GeometricConsistency::min_area_ratio`].
///   The ratio does not depend on the units of the points.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeometricConsistency {
    pub min_area_ratio: f64,
}

impl GeometricConsistency {
    pub fn new(min_area_ratio: f64) -> Self {
        Self { min_area_ratio }
    }

    /// Checks whether four correspondences `p[i] -> q[i]` can be used to solve a homography.
    pub fn sample_consistent(&self, p: &[Point2<f64>; 4], q: &[Point2<f64>; 4]) -> bool {
        let orientation_kept = (0..4).all(|i| {
            let ix = [i, (i + 1) % 4, (i + 2) % 4];
            same_orientation(ix.map(|j| p[j]), ix.map(|j| q[j]))
        });
        orientation_kept && !self.collinear(p) && !self.collinear(q)
    }

    /// Checks whether `homography` keeps the orientation of every cyclic triple of
    /// consecutive `points`.
    ///
    /// Fewer than three points cannot be checked and always pass. A point which maps to
    /// infinity always fails.
    pub fn points_consistent(&self, homography: &Homography, points: &[Point2<f64>]) -> bool {
        let n = points.len();
        if n < 3 {
            return true;
        }
        (0..n).all(|i| {
            let source = [points[i], points[(i + 1) % n], points[(i + 2) % n]];
            let mapped = [
                homography.transform_point(source[0]),
                homography.transform_point(source[1]),
                homography.transform_point(source[2]),
            ];
            match mapped {
                [Some(a), Some(b), Some(c)] => same_orientation(source, [a, b, c]),
                _ => false,
            }
        })
    }

    fn collinear(&self, points: &[Point2<f64>; 4]) -> bool {
        let mean = points.iter().map(|p| p.coords).sum::<Vector2<f64>>() / 4.0;
        let spread = points
            .iter()
            .map(|p| (p.coords - mean).norm_squared())
            .sum::<f64>()
            / 4.0;
        if spread == 0.0 || !spread.is_finite() {
            return true;
        }
        let ratio = smallest_triangle_area(points) / spread;
        // NaN compares false and is treated as collinear.
        !(ratio >= self.min_area_ratio)
    }
}

impl Default for GeometricConsistency {
    fn default() -> Self {
        Self {
            min_area_ratio: 1e-6,
        }
    }
}
