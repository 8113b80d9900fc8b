use ar_core::{nalgebra::Point2, Homography};
use four_point::{quadrilateral_convex, smallest_triangle_area};

/// Homographies with a smaller determinant magnitude are not inverted.
const INVERSE_EPSILON: f64 = 1e-5;
/// Fraction of the reference area that every corner triangle must keep.
const MIN_AREA_FRACTION: f64 = 1e-4;

/// Indices of the correspondences whose reprojection distance is at most `threshold`.
pub fn find_inliers<'a>(
    homography: &'a Homography,
    p: &'a [Point2<f64>],
    q: &'a [Point2<f64>],
    threshold: f64,
) -> impl Iterator<Item = usize> + 'a {
    let threshold2 = threshold * threshold;
    p.iter()
        .zip(q)
        .enumerate()
        .filter(move |&(_, (&p, &q))| (homography.project(p) - q).norm_squared() <= threshold2)
        .map(|(ix, _)| ix)
}

/// The corners of a `width` by `height` rectangle at the origin, in winding order.
pub fn reference_corners(width: f64, height: f64) -> [Point2<f64>; 4] {
    [
        Point2::new(0.0, 0.0),
        Point2::new(width, 0.0),
        Point2::new(width, height),
        Point2::new(0.0, height),
    ]
}

/// Checks that a homography is a plausible view of a planar reference image of the given size.
///
/// The rectangle is mapped through the inverse homography. Every triangle of the mapped
/// corners must keep a small fraction of the rectangle's area and the corners must remain
/// a convex quadrilateral.
pub fn check_heuristics(homography: &Homography, width: f64, height: f64) -> bool {
    let inverse = match homography.inverse(INVERSE_EPSILON) {
        Some(inverse) => inverse,
        None => return false,
    };
    let corners = reference_corners(width, height).map(|c| inverse.transform_point(c));
    let mapped = match corners {
        [Some(a), Some(b), Some(c), Some(d)] => [a, b, c, d],
        _ => return false,
    };
    smallest_triangle_area(&mapped) >= width * height * MIN_AREA_FRACTION
        && quadrilateral_convex(&mapped)
}
