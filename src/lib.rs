// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Projection of motion-capture markers onto the camera images of a gait dataset.
//!
//! Camera calibrations (Tsai model parameters) are read from XML files,
//! marker sequences from text or binary point files.
//! Markers are projected with a pinhole model and painted on frame images.
//! The calibration can also be handed over to an external Tsai program.

pub mod core;
pub mod dataset;
pub mod error;
pub mod external;
pub mod misc;

pub use crate::error::{Error, Result};
