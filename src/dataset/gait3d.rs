// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conventions of the gait3d image sequences.
//!
//! Each camera has its own directory of frames,
//! named by the frame number prefixed with a `0`,
//! where frame number = capture frame index + `FRAME_OFFSET`.

use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// First image number of a capture sequence.
pub const FRAME_OFFSET: u32 = 130;

/// How frame images are named inside a camera directory.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct FrameNaming {
    /// Added to the frame index to obtain the image number.
    pub offset: u32,
    /// File extension, without the dot. `None` for bare numbers.
    pub extension: Option<String>,
}

impl FrameNaming {
    /// Bare image numbers (edge maps).
    pub fn bare() -> FrameNaming {
        FrameNaming {
            offset: FRAME_OFFSET,
            extension: None,
        }
    }

    /// PNG images.
    pub fn png() -> FrameNaming {
        FrameNaming {
            offset: FRAME_OFFSET,
            extension: Some("png".to_string()),
        }
    }

    /// Image file name of a frame.
    pub fn file_name(&self, index: u32) -> String {
        image_file_name(index, self.offset, self.extension.as_deref())
    }

    /// Full path of the image of a frame inside a camera directory.
    pub fn path<P: AsRef<Path>>(&self, dir: P, index: u32) -> PathBuf {
        dir.as_ref().join(self.file_name(index))
    }
}

/// `0{offset + index}` with an optional extension.
pub fn image_file_name(index: u32, offset: u32, extension: Option<&str>) -> String {
    let number = u64::from(offset) + u64::from(index);
    match extension {
        Some(ext) => format!("0{}.{}", number, ext),
        None => format!("0{}", number),
    }
}

/// Load a frame image as RGB, whatever its stored color type.
///
/// Files without extension are decoded by guessing their format from content.
pub fn load_frame<P: AsRef<Path>>(file_path: P) -> Result<RgbImage> {
    let file_path = file_path.as_ref();
    if !file_path.is_file() {
        return Err(Error::MissingImage(file_path.to_path_buf()));
    }
    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?;
    Ok(img.to_rgb8())
}

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use image::{GrayImage, ImageFormat, Luma};

    #[test]
    fn names_with_leading_zero() {
        assert_eq!(image_file_name(0, FRAME_OFFSET, None), "0130");
        assert_eq!(image_file_name(9, FRAME_OFFSET, Some("png")), "0139.png");
        assert_eq!(FrameNaming::bare().file_name(870), "01000");
    }

    #[test]
    fn path_in_camera_directory() {
        let path = FrameNaming::png().path("Edges/c1", 2);
        assert_eq!(path, Path::new("Edges/c1").join("0132.png"));
    }

    #[test]
    fn missing_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = FrameNaming::png().path(dir.path(), 0);
        match load_frame(&path) {
            Err(Error::MissingImage(p)) => assert_eq!(p, path),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn gray_frame_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = FrameNaming::bare().path(dir.path(), 1);
        let gray = GrayImage::from_pixel(3, 2, Luma([42]));
        gray.save_with_format(&path, ImageFormat::Png).unwrap();
        let rgb = load_frame(&path).unwrap();
        assert_eq!(rgb.dimensions(), (3, 2));
        assert_eq!(rgb.get_pixel(2, 1).0, [42, 42, 42]);
    }

    #[test]
    fn garbage_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0130.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(load_frame(&path).is_err());
    }
}
