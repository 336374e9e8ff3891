// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Camera calibration record (Tsai model parameters).
//!
//! Only the principal point and the focal length (scaled per axis by the
//! sensor geometry) take part in the projection.
//! The other parameters are carried along to be serialized
//! for the external Tsai program.

use std::path::Path;

use crate::core::projection;
use crate::dataset::calibration;
use crate::error::Result;
use crate::misc::type_aliases::{Float, Point2, Point3};

/// Calibration of one camera, as read from its calibration file.
///
/// Read-only once constructed.
#[derive(PartialEq, Debug, Clone)]
pub struct Camera {
    // Intrinsic.
    /// [pix] Principal point, x.
    pub cx: Float,
    /// [pix] Principal point, y.
    pub cy: Float,
    /// [mm] Focal length.
    pub focal: Float,
    /// [1/mm^2] First order radial distortion coefficient (not applied).
    pub kappa1: Float,
    /// Scale factor compensating the uncertainty on dpx.
    pub sx: Float,

    // Geometry.
    /// [sel] Number of sensor elements in x.
    pub ncx: Float,
    /// [pix] Number of pixels in the frame grabber x direction.
    pub nfx: Float,
    /// [mm/sel] Sensor element width.
    pub dx: Float,
    /// [mm/sel] Sensor element height.
    pub dy: Float,
    /// [mm/pix] Effective pixel width.
    pub dpx: Float,
    /// [mm/pix] Effective pixel height.
    pub dpy: Float,

    // Extrinsic.
    /// [mm] Translation, x.
    pub tx: Float,
    /// [mm] Translation, y.
    pub ty: Float,
    /// [mm] Translation, z.
    pub tz: Float,
    /// [rad] Rotation around x.
    pub rx: Float,
    /// [rad] Rotation around y.
    pub ry: Float,
    /// [rad] Rotation around z.
    pub rz: Float,
}

/// Field layout of the calibration constants string.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ConstantsLayout {
    /// Historical layout, `ty` written in place of `ry`.
    Legacy,
    /// `f, kappa1, p1, p2, Tx, Ty, Tz, Rx, Ry, Rz, r1..r9` as read by the Tsai program.
    Tsai,
}

impl Default for ConstantsLayout {
    fn default() -> Self {
        ConstantsLayout::Legacy
    }
}

/// Number of trailing zero placeholders (rotation matrix r1..r9).
const NB_ROTATION_PLACEHOLDERS: usize = 9;

impl Camera {
    /// Parse a calibration XML document.
    pub fn from_xml_str(content: &str) -> Result<Camera> {
        calibration::parse(content)
    }

    /// Read and parse a calibration XML file.
    pub fn from_xml_file<P: AsRef<Path>>(file_path: P) -> Result<Camera> {
        calibration::read(file_path)
    }

    /// Same as `from_xml_file`, kept under the name used by the dataset scripts.
    pub fn from_csv<P: AsRef<Path>>(file_path: P) -> Result<Camera> {
        Self::from_xml_file(file_path)
    }

    /// Principal point `(cx, cy)` in pixels.
    pub fn principal_point(&self) -> (Float, Float) {
        (self.cx, self.cy)
    }

    /// Focal length in pixels along each image axis.
    ///
    /// Without distortion, the Tsai model maps sensor millimeters
    /// to pixels with `sx / dpx` horizontally and `1 / dpy` vertically.
    pub fn focal_pair(&self) -> (Float, Float) {
        (self.sx * self.focal / self.dpx, self.focal / self.dpy)
    }

    /// Project a camera-space point into the image.
    pub fn project(&self, point: &Point3) -> Result<Point2> {
        projection::cast(self.focal_pair(), self.principal_point(), point)
    }

    /// `ncx,nfx,dx,dy,dpx,dpy,cx,cy,sx`
    pub fn camera_parameters(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.ncx, self.nfx, self.dx, self.dy, self.dpx, self.dpy, self.cx, self.cy, self.sx
        )
    }

    /// `focal,kappa1,0.0,0.0,tx,ty,tz,rx,ty,rz` followed by nine `0.0`.
    ///
    /// The second `ty` is part of the historical format.
    pub fn calibration_constants(&self) -> String {
        self.constants_with(self.ty)
    }

    /// Like `calibration_constants` but with `ry` at the rotation position.
    pub fn tsai_calibration_constants(&self) -> String {
        self.constants_with(self.ry)
    }

    /// Calibration constants in the given layout.
    pub fn calibration_constants_as(&self, layout: ConstantsLayout) -> String {
        match layout {
            ConstantsLayout::Legacy => self.calibration_constants(),
            ConstantsLayout::Tsai => self.tsai_calibration_constants(),
        }
    }

    fn constants_with(&self, second_rotation: Float) -> String {
        let mut constants = format!(
            "{},{},0.0,0.0,{},{},{},{},{},{}",
            self.focal,
            self.kappa1,
            self.tx,
            self.ty,
            self.tz,
            self.rx,
            second_rotation,
            self.rz
        );
        for _ in 0..NB_ROTATION_PLACEHOLDERS {
            constants.push_str(",0.0");
        }
        constants
    }
}

// TESTS #############################################################

#[cfg(test)]
pub(crate) mod tests {

    use super::*;
    use approx;

    /// Camera with every field set to a distinct value.
    pub(crate) fn numbered_camera() -> Camera {
        Camera {
            ncx: 1.0,
            nfx: 2.0,
            dx: 3.0,
            dy: 4.0,
            dpx: 5.0,
            dpy: 6.0,
            cx: 7.0,
            cy: 8.0,
            sx: 9.0,
            focal: 10.0,
            kappa1: 11.0,
            tx: 12.0,
            ty: 13.0,
            tz: 14.0,
            rx: 15.0,
            ry: 16.0,
            rz: 17.0,
        }
    }

    #[test]
    fn camera_parameters_order() {
        assert_eq!(numbered_camera().camera_parameters(), "1,2,3,4,5,6,7,8,9");
    }

    #[test]
    fn camera_parameters_keep_decimals() {
        let mut camera = numbered_camera();
        camera.dpx = 0.0129;
        camera.cx = 305.46;
        assert_eq!(
            camera.camera_parameters(),
            "1,2,3,4,0.0129,6,305.46,8,9"
        );
    }

    #[test]
    fn legacy_constants_repeat_ty() {
        assert_eq!(
            numbered_camera().calibration_constants(),
            "10,11,0.0,0.0,12,13,14,15,13,17,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0"
        );
    }

    #[test]
    fn tsai_constants_use_ry() {
        let camera = numbered_camera();
        assert_eq!(
            camera.tsai_calibration_constants(),
            "10,11,0.0,0.0,12,13,14,15,16,17,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0"
        );
        assert_eq!(
            camera.calibration_constants_as(ConstantsLayout::Tsai),
            camera.tsai_calibration_constants()
        );
    }

    #[test]
    fn constants_have_nineteen_fields() {
        let camera = numbered_camera();
        assert_eq!(camera.calibration_constants().split(',').count(), 19);
        assert_eq!(camera.tsai_calibration_constants().split(',').count(), 19);
    }

    #[test]
    fn focal_pair_uses_pixel_geometry() {
        let camera = numbered_camera();
        let (fx, fy) = camera.focal_pair();
        approx::assert_relative_eq!(fx, 9.0 * 10.0 / 5.0);
        approx::assert_relative_eq!(fy, 10.0 / 6.0);
    }

    #[test]
    fn project_goes_through_cast() {
        let mut camera = numbered_camera();
        camera.sx = 1.0;
        camera.focal = 10.0;
        camera.dpx = 1.0;
        camera.dpy = 1.0;
        camera.cx = 0.0;
        camera.cy = 0.0;
        let pixel = camera.project(&Point3::new(5.0, 5.0, 1.0)).unwrap();
        assert_eq!(pixel, Point2::new(50.0, 50.0));
    }
}
