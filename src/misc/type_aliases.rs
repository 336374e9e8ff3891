// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Type aliases for common types used all over the code base.

use nalgebra as na;

/// Calibration values and marker coordinates are kept in f64
/// so that their textual form survives a parse / print cycle.
pub type Float = f64;

/// A point with two Float coordinates (pixel space).
pub type Point2 = na::Point2<Float>;
/// A point with three Float coordinates (camera space).
pub type Point3 = na::Point3<Float>;

/// An RGB pixel color.
pub type Color = [u8; 3];
