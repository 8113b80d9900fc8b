//! # AR Core
//!
//! This library provides the common types shared by the planar tracking crates.
//! Feature matchers produce [`FeatureMatch`]es between a reference image and a live
//! camera frame, homography solvers consume them, and trackers consume the resulting
//! [`Homography`] to warp bounding boxes or to compose a camera pose with the intrinsics.
//! Keeping these types in one tiny crate lets every stage agree on them without pulling
//! in the heavier estimation machinery.
//!
//! The crate is designed to work with `#![no_std]`, even without an allocator. `libm` is used
//! (indirectly through [`num-traits`] and [`nalgebra`]) for all math that isn't present in `core`.
//!
//! ## Homographies
//!
//! A planar surface seen from two views is related by a projective transform of the plane,
//! a 3x3 matrix defined up to scale:
//!
//! ```text
//!   [x' * w]   [h00 h01 h02] [x]
//!   [y' * w] = [h10 h11 h12] [y]
//!   [  w   ]   [h20 h21 h22] [1]
//! ```
//!
//! The point `(x, y)` in the source view maps to `(x', y')` in the destination view after
//! the perspective divide by `w`. Eight of the nine values are free, so four non-degenerate
//! correspondences determine the transform exactly.

#![no_std]

mod homography;
mod keypoint;
mod matches;

pub use homography::*;
pub use keypoint::*;
pub use matches::*;
pub use nalgebra;
pub use sample_consensus;
