// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Overlay projected markers on the frames of a sequence.
//!
//! Every marker of a frame is projected with the camera,
//! mapped to a pixel position and painted with a single colored pixel.
//! Intermediate frames are handed to a `FrameObserver`
//! instead of being displayed directly.

use image::RgbImage;
use std::io::{BufRead, BufReader, Stdin};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::camera::Camera;
use crate::dataset::gait3d::{self, FrameNaming};
use crate::dataset::sequence::{Frame, Sequence};
use crate::error::{Error, Result};
use crate::misc::helper;
use crate::misc::type_aliases::{Color, Float, Point2};
use crate::misc::view;

/// Conversion from projected coordinates to pixel positions.
///
/// `col = trunc(u / divisor)`, `row = trunc(v / divisor)`,
/// with absolute values taken before truncation if `absolute` is set.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct MarkerMapping {
    /// Downscaling applied to projected coordinates.
    pub divisor: Float,
    /// Fold negative coordinates into the image.
    pub absolute: bool,
}

impl MarkerMapping {
    /// Pixel position (col, row) of a projected point,
    /// `None` if it cannot be represented as integers.
    pub fn position(&self, projected: &Point2) -> Option<(i64, i64)> {
        let map = |v: Float| {
            let v = v / self.divisor;
            helper::truncate(if self.absolute { v.abs() } else { v })
        };
        Some((map(projected.x)?, map(projected.y)?))
    }
}

/// What to do with markers falling outside of the image.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BoundsPolicy {
    /// Fail on the first out-of-bounds marker.
    Reject,
    /// Leave the marker out and keep going.
    Skip,
    /// Paint the closest border pixel.
    Clamp,
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        BoundsPolicy::Skip
    }
}

impl FromStr for BoundsPolicy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reject" => Ok(BoundsPolicy::Reject),
            "skip" => Ok(BoundsPolicy::Skip),
            "clamp" => Ok(BoundsPolicy::Clamp),
            _ => Err(format!("Unknown bounds policy: {}", s)),
        }
    }
}

/// Configuration of an overlay run.
#[derive(PartialEq, Debug, Clone)]
pub struct OverlayConfig {
    /// Naming of frame images in the camera directory.
    pub naming: FrameNaming,
    /// Projected coordinates to pixel positions.
    pub mapping: MarkerMapping,
    /// Marker color.
    pub color: Color,
    /// Out-of-bounds behavior.
    pub bounds: BoundsPolicy,
}

impl OverlayConfig {
    /// Settings for sequences read from text files:
    /// bare image names, projected coordinates used as is.
    pub fn text() -> OverlayConfig {
        OverlayConfig {
            naming: FrameNaming::bare(),
            mapping: MarkerMapping {
                divisor: 1.0,
                absolute: false,
            },
            color: view::RED,
            bounds: BoundsPolicy::default(),
        }
    }

    /// Settings for sequences read from binary files:
    /// png images, coordinates divided by 10 and folded to positive values.
    pub fn binary() -> OverlayConfig {
        OverlayConfig {
            naming: FrameNaming::png(),
            mapping: MarkerMapping {
                divisor: 10.0,
                absolute: true,
            },
            color: view::RED,
            bounds: BoundsPolicy::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        let divisor = self.mapping.divisor;
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "marker divisor must be finite and non zero, got {}",
                divisor
            )));
        }
        Ok(())
    }
}

/// Outcome of the overlay of one frame.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct FrameReport {
    /// Frame index.
    pub index: u32,
    /// Number of painted markers.
    pub drawn: usize,
    /// Number of markers left out because outside of the image.
    pub skipped: usize,
}

/// Outcome of the overlay of a whole sequence.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct OverlayReport {
    /// Number of processed frames.
    pub frames: usize,
    /// Number of painted markers.
    pub drawn: usize,
    /// Number of markers left out.
    pub skipped: usize,
}

impl OverlayReport {
    fn add(&mut self, frame: &FrameReport) {
        self.frames += 1;
        self.drawn += frame.drawn;
        self.skipped += frame.skipped;
    }
}

// OBSERVERS ###############################################

/// Receives frames before and after markers are painted.
pub trait FrameObserver {
    /// Frame freshly loaded.
    fn before_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()>;
    /// Frame with its markers.
    fn after_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()>;
}

impl<O: FrameObserver + ?Sized> FrameObserver for Box<O> {
    fn before_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()> {
        (**self).before_overlay(index, img)
    }
    fn after_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()> {
        (**self).after_overlay(index, img)
    }
}

/// Ignores every frame.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl FrameObserver for NoopObserver {
    fn before_overlay(&mut self, _index: u32, _img: &RgbImage) -> Result<()> {
        Ok(())
    }
    fn after_overlay(&mut self, _index: u32, _img: &RgbImage) -> Result<()> {
        Ok(())
    }
}

/// Keeps copies of the observed frames in memory.
#[derive(Debug, Default)]
pub struct Collect {
    /// Frames before overlay.
    pub before: Vec<(u32, RgbImage)>,
    /// Frames after overlay.
    pub after: Vec<(u32, RgbImage)>,
}

impl FrameObserver for Collect {
    fn before_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()> {
        self.before.push((index, img.clone()));
        Ok(())
    }
    fn after_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()> {
        self.after.push((index, img.clone()));
        Ok(())
    }
}

/// Saves annotated frames as PNG images in a directory.
#[derive(Debug)]
pub struct SaveFrames {
    dir: PathBuf,
}

impl SaveFrames {
    /// Create the output directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<SaveFrames> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(SaveFrames {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// Output path of an annotated frame.
    pub fn path(&self, index: u32) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", index))
    }
}

impl FrameObserver for SaveFrames {
    fn before_overlay(&mut self, _index: u32, _img: &RgbImage) -> Result<()> {
        Ok(())
    }
    fn after_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()> {
        let path = self.path(index);
        img.save(&path)?;
        log::debug!("Saved {}", path.display());
        Ok(())
    }
}

/// Waits for a line of input after each step of another observer.
pub struct PauseObserver<O, R> {
    inner: O,
    input: R,
}

impl<O: FrameObserver> PauseObserver<O, BufReader<Stdin>> {
    /// Pause on the standard input.
    pub fn stdin(inner: O) -> Self {
        Self::new(inner, BufReader::new(std::io::stdin()))
    }
}

impl<O: FrameObserver, R: BufRead> PauseObserver<O, R> {
    /// Pause on the given input.
    pub fn new(inner: O, input: R) -> Self {
        PauseObserver { inner, input }
    }

    /// Give back the wrapped observer.
    pub fn into_inner(self) -> O {
        self.inner
    }

    fn wait(&mut self, index: u32, step: &str) -> Result<()> {
        eprintln!("frame {} {}, press Enter to continue", index, step);
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }
}

impl<O: FrameObserver, R: BufRead> FrameObserver for PauseObserver<O, R> {
    fn before_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()> {
        self.inner.before_overlay(index, img)?;
        self.wait(index, "loaded")
    }
    fn after_overlay(&mut self, index: u32, img: &RgbImage) -> Result<()> {
        self.inner.after_overlay(index, img)?;
        self.wait(index, "annotated")
    }
}

// OVERLAY #################################################

/// Paint the markers of a frame on its image.
///
/// Under `BoundsPolicy::Reject`, an out-of-bounds marker leaves the image untouched.
pub fn overlay_frame(
    img: &mut RgbImage,
    frame: &Frame,
    camera: &Camera,
    config: &OverlayConfig,
) -> Result<FrameReport> {
    config.validate()?;
    let (width, height) = img.dimensions();
    let mut pixels = Vec::with_capacity(frame.points.len());
    let mut skipped = 0;
    for point in &frame.points {
        let projected = camera.project(point)?;
        let position = config.mapping.position(&projected);
        match position {
            Some(pos) if helper::in_image_bounds(pos, (width, height)) => {
                pixels.push((pos.0 as u32, pos.1 as u32));
            }
            _ => {
                let (col, row) =
                    position.unwrap_or((projected.x as i64, projected.y as i64));
                match config.bounds {
                    BoundsPolicy::Clamp if position.is_some() && width > 0 && height > 0 => {
                        pixels.push(helper::clamp_to_image((col, row), (width, height)));
                    }
                    BoundsPolicy::Reject => {
                        return Err(Error::OutOfBounds {
                            frame: frame.index,
                            col,
                            row,
                            width,
                            height,
                        });
                    }
                    _ => {
                        log::warn!(
                            "Frame {}: marker ({}, {}) outside of {}x{} image, skipped",
                            frame.index,
                            col,
                            row,
                            width,
                            height
                        );
                        skipped += 1;
                    }
                }
            }
        }
    }
    view::draw_markers(img, &pixels, config.color);
    Ok(FrameReport {
        index: frame.index,
        drawn: pixels.len(),
        skipped,
    })
}

/// Overlay every frame of a sequence on the images of a camera directory.
///
/// Fails on the first missing image, degenerate point or rejected marker.
pub fn overlay_sequence<P, O>(
    sequence: &Sequence,
    image_dir: P,
    camera: &Camera,
    config: &OverlayConfig,
    observer: &mut O,
) -> Result<OverlayReport>
where
    P: AsRef<Path>,
    O: FrameObserver + ?Sized,
{
    config.validate()?;
    let mut report = OverlayReport::default();
    for frame in &sequence.frames {
        let path = config.naming.path(image_dir.as_ref(), frame.index);
        let mut img = gait3d::load_frame(&path)?;
        observer.before_overlay(frame.index, &img)?;
        let frame_report = overlay_frame(&mut img, frame, camera, config)?;
        log::debug!(
            "Frame {} ({}): {} markers drawn, {} skipped",
            frame.index,
            path.display(),
            frame_report.drawn,
            frame_report.skipped
        );
        observer.after_overlay(frame.index, &img)?;
        report.add(&frame_report);
    }
    log::info!(
        "Overlaid {} frames: {} markers drawn, {} skipped",
        report.frames,
        report.drawn,
        report.skipped
    );
    Ok(report)
}

// TESTS #############################################################
