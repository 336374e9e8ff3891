// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Miscellaneous helper functions that didn't fit elsewhere.

use num_traits::ToPrimitive;

use crate::error::{Error, Result};
use crate::misc::type_aliases::Float;

/// Split a slice into groups of `n` consecutive elements.
/// The last group is shorter when the length is not a multiple of `n`.
pub fn chunks<T: Clone>(values: &[T], n: usize) -> Result<Vec<Vec<T>>> {
    if n == 0 {
        return Err(Error::InvalidArgument("chunk size must be positive".to_string()));
    }
    Ok(values.chunks(n).map(|c| c.to_vec()).collect())
}

/// Truncate a float toward zero, like an integer cast,
/// but refuse NaN and values not representable by an i64.
pub fn truncate(x: Float) -> Option<i64> {
    x.trunc().to_i64()
}

/// Check that a (col, row) position lies in an image of the given dimensions.
pub fn in_image_bounds((col, row): (i64, i64), (width, height): (u32, u32)) -> bool {
    col >= 0 && row >= 0 && col < i64::from(width) && row < i64::from(height)
}

/// Clamp a (col, row) position to the closest pixel of a non-empty image.
pub fn clamp_to_image((col, row): (i64, i64), (width, height): (u32, u32)) -> (u32, u32) {
    let clamp = |v: i64, size: u32| v.max(0).min(i64::from(size) - 1) as u32;
    (clamp(col, width), clamp(row, height))
}

// TESTS #############################################################
