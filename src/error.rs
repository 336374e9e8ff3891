// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type shared by the whole crate.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Everything that can go wrong while loading calibrations, sequences and images,
/// projecting markers or calling the external program.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error. {0}")]
    Io(#[from] std::io::Error),

    /// The calibration document is not valid XML.
    #[error("Invalid calibration XML. {0}")]
    Xml(#[from] roxmltree::Error),

    /// An expected element is absent from the calibration document.
    #[error("Missing element <{0}> in calibration")]
    MissingElement(&'static str),

    /// An expected attribute is absent from a calibration element.
    #[error("Missing attribute {attribute} in <{element}>")]
    MissingAttribute {
        /// Element searched.
        element: &'static str,
        /// Attribute that was not found.
        attribute: &'static str,
    },

    /// A calibration attribute is not a floating point number.
    #[error("Attribute {attribute} in <{element}> is not a number: {value:?}")]
    InvalidAttribute {
        /// Element containing the attribute.
        element: &'static str,
        /// Name of the attribute.
        attribute: &'static str,
        /// Raw attribute text.
        value: String,
    },

    /// A line of a text file could not be parsed.
    #[error("Malformed line {line}: {reason}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The binary point container is corrupted or has an unknown layout.
    #[error("Invalid binary point file: {0}")]
    InvalidBinary(String),

    /// Projection of a point lying on the camera plane (z = 0).
    #[error("Cannot project point ({x}, {y}, {z}): degenerate depth")]
    DegenerateDepth {
        /// x coordinate.
        x: f64,
        /// y coordinate.
        y: f64,
        /// z coordinate.
        z: f64,
    },

    /// The image of a frame does not exist.
    #[error("Missing frame image: {0}")]
    MissingImage(PathBuf),

    /// Failed to decode or encode an image.
    #[error("Image error. {0}")]
    Image(#[from] image::ImageError),

    /// A marker falls outside of the image.
    #[error("Marker ({col}, {row}) of frame {frame} is outside the {width}x{height} image")]
    OutOfBounds {
        /// Frame index.
        frame: u32,
        /// Target column.
        col: i64,
        /// Target row.
        row: i64,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// The external program exited with a failure status.
    #[error("External program {program} failed with {status}")]
    ExternalFailed {
        /// Program that was run.
        program: String,
        /// Its exit status.
        status: ExitStatus,
    },

    /// An argument has an invalid value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type of the crate.
pub type Result<T> = std::result::Result<T, Error>;
