// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Drawing helpers to visualize markers on frames.

use image::{Rgb, RgbImage};

use crate::misc::type_aliases::Color;

/// Marker color of the dataset scripts (red).
pub const RED: Color = [255, 0, 0];

// Paint single pixels of an RGB image with a given color.
// Positions must be inside the image.
pub fn draw_markers(img: &mut RgbImage, pixels: &[(u32, u32)], color: Color) {
    for &(col, row) in pixels {
        img.put_pixel(col, row, Rgb(color));
    }
}

// TESTS #############################################################
