// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pinhole projection of camera-space points into pixel coordinates.
//!
//! Points are expected to already be expressed in the camera frame:
//! no extrinsic motion and no lens distortion are applied here.

use crate::error::{Error, Result};
use crate::misc::type_aliases::{Float, Point2, Point3};

/// Project a 3D point with per-axis focal lengths and a principal point.
///
/// `u = fx / z * x + cx` and `v = fy / z * y + cy`.
/// Points on the camera plane (z = 0) or producing non-finite coordinates
/// are rejected with `Error::DegenerateDepth`.
pub fn cast(focal: (Float, Float), principal: (Float, Float), point: &Point3) -> Result<Point2> {
    let (x, y, z) = (point.x, point.y, point.z);
    let degenerate = || Error::DegenerateDepth { x, y, z };
    if z == 0.0 {
        return Err(degenerate());
    }
    let u = focal.0 / z * x + principal.0;
    let v = focal.1 / z * y + principal.1;
    if u.is_finite() && v.is_finite() {
        Ok(Point2::new(u, v))
    } else {
        Err(degenerate())
    }
}

/// Project every point of a slice, stopping at the first degenerate one.
pub fn cast_all(
    focal: (Float, Float),
    principal: (Float, Float),
    points: &[Point3],
) -> Result<Vec<Point2>> {
    points.iter().map(|p| cast(focal, principal, p)).collect()
}

// TESTS #############################################################
