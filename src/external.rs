// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interface with the external Tsai projection program.
//!
//! The program is called as `program input_file camera_parameters calibration_constants`
//! where both calibration arguments are comma separated lists of numbers.
//! It writes its projections next to the input file, as `<stem>_a.csv`:
//! one line per frame, `index,u1,v1,u2,v2,...` with pixel coordinates rounded.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::camera::{Camera, ConstantsLayout};
use crate::dataset::sequence::Sequence;
use crate::error::{Error, Result};
use crate::misc::type_aliases::Float;

/// A ready to run invocation of the external program.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Invocation on an input file with the calibration of a camera.
    pub fn new<P: AsRef<Path>>(
        program: &str,
        input_file: P,
        camera: &Camera,
        layout: ConstantsLayout,
    ) -> ExternalCommand {
        ExternalCommand {
            program: program.to_string(),
            args: vec![
                input_file.as_ref().to_string_lossy().into_owned(),
                camera.camera_parameters(),
                camera.calibration_constants_as(layout),
            ],
        }
    }

    /// Program to run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Positional arguments, in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Print the command line, run the program and wait for it.
    ///
    /// Arguments are passed directly, without going through a shell.
    /// A non-zero exit status is an error.
    pub fn run(&self) -> Result<()> {
        println!("{}", self);
        log::info!("Running {}", self.program);
        let status = Command::new(&self.program).args(&self.args).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::ExternalFailed {
                program: self.program.clone(),
                status,
            })
        }
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

// PROJECTIONS EXPORT ######################################

/// Project a sequence with a camera, in the output format of the external program.
pub fn export_projections(sequence: &Sequence, camera: &Camera) -> Result<String> {
    let mut content = String::new();
    for frame in &sequence.frames {
        content.push_str(&frame.index.to_string());
        for point in &frame.points {
            let pixel = camera.project(point)?;
            content.push_str(&format!(",{},{}", round(pixel.x), round(pixel.y)));
        }
        content.push('\n');
    }
    Ok(content)
}

/// Project a text point file and write `<stem>_a.csv` next to it.
/// Returns the path of the written file.
pub fn export_projections_file<P: AsRef<Path>>(input_file: P, camera: &Camera) -> Result<PathBuf> {
    let input_file = input_file.as_ref();
    let sequence = Sequence::from_text_file(input_file)?;
    let output_file = projections_path(input_file);
    std::fs::write(&output_file, export_projections(&sequence, camera)?)?;
    log::info!("Wrote projections to {}", output_file.display());
    Ok(output_file)
}

/// `dir/stem.ext` -> `dir/stem_a.csv`
pub fn projections_path(input_file: &Path) -> PathBuf {
    let stem = input_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input_file.with_file_name(format!("{}_a.csv", stem))
}

#[allow(clippy::cast_possible_truncation)]
fn round(x: Float) -> i64 {
    x.round() as i64
}

// PARSING #################################################

/// Camera parameters as received by the external program.
#[derive(PartialEq, Debug, Clone)]
pub struct CameraParameters {
    /// Number of sensor elements in x.
    pub ncx: Float,
    /// Number of frame grabber pixels in x.
    pub nfx: Float,
    /// Sensor element width.
    pub dx: Float,
    /// Sensor element height.
    pub dy: Float,
    /// Effective pixel width.
    pub dpx: Float,
    /// Effective pixel height.
    pub dpy: Float,
    /// Principal point, x.
    pub cx: Float,
    /// Principal point, y.
    pub cy: Float,
    /// Scale factor.
    pub sx: Float,
}

/// Calibration constants as received by the external program.
#[derive(PartialEq, Debug, Clone)]
pub struct CalibrationConstants {
    /// Focal length.
    pub f: Float,
    /// Radial distortion.
    pub kappa1: Float,
    /// Tangential distortion, first coefficient.
    pub p1: Float,
    /// Tangential distortion, second coefficient.
    pub p2: Float,
    /// Translation `(tx, ty, tz)`.
    pub translation: (Float, Float, Float),
    /// Rotation angles `(rx, ry, rz)`.
    pub rotation: (Float, Float, Float),
    /// Rotation matrix coefficients r1..r9.
    pub matrix: [Float; 9],
}

/// Parse the arguments of the external program back into values.
pub mod parse {
    use super::*;
    use nom::{
        character::complete::{char, space0},
        combinator::all_consuming,
        multi::separated_list1,
        number::complete::double,
        sequence::delimited,
        IResult,
    };

    /// Parse the 9 comma separated camera parameters.
    pub fn camera_parameters(arg: &str) -> Result<CameraParameters> {
        let v = numbers(arg, 9)?;
        Ok(CameraParameters {
            ncx: v[0],
            nfx: v[1],
            dx: v[2],
            dy: v[3],
            dpx: v[4],
            dpy: v[5],
            cx: v[6],
            cy: v[7],
            sx: v[8],
        })
    }

    /// Parse the 19 comma separated calibration constants.
    pub fn calibration_constants(arg: &str) -> Result<CalibrationConstants> {
        let v = numbers(arg, 19)?;
        let mut matrix = [0.0; 9];
        matrix.copy_from_slice(&v[10..19]);
        Ok(CalibrationConstants {
            f: v[0],
            kappa1: v[1],
            p1: v[2],
            p2: v[3],
            translation: (v[4], v[5], v[6]),
            rotation: (v[7], v[8], v[9]),
            matrix,
        })
    }

    fn numbers(arg: &str, expected: usize) -> Result<Vec<Float>> {
        let malformed = |reason: String| Error::MalformedLine { line: 1, reason };
        let (_, values) =
            number_list(arg).map_err(|_| malformed(format!("not a list of numbers: {:?}", arg)))?;
        if values.len() != expected {
            return Err(malformed(format!(
                "expected {} numbers, got {}",
                expected,
                values.len()
            )));
        }
        Ok(values)
    }

    // nom parsers #############################################################

    fn number_list(input: &str) -> IResult<&str, Vec<Float>> {
        all_consuming(separated_list1(char(','), delimited(space0, double, space0)))(input)
    }
} // pub mod parse

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;
    use crate::core::camera::tests::numbered_camera;
    use crate::dataset::sequence::Frame;
    use crate::misc::type_aliases::Point3;

    #[test]
    fn arguments_order() {
        let command =
            ExternalCommand::new("cpp_cv", "p1s1_2.csv", &numbered_camera(), ConstantsLayout::Legacy);
        assert_eq!(command.program(), "cpp_cv");
        assert_eq!(
            command.args(),
            &[
                "p1s1_2.csv".to_string(),
                "1,2,3,4,5,6,7,8,9".to_string(),
                "10,11,0.0,0.0,12,13,14,15,13,17,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0".to_string(),
            ]
        );
        assert_eq!(
            command.to_string(),
            "cpp_cv p1s1_2.csv 1,2,3,4,5,6,7,8,9 \
             10,11,0.0,0.0,12,13,14,15,13,17,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0,0.0"
        );
    }

    #[test]
    fn tsai_layout_round_trips_through_parser() {
        let camera = numbered_camera();
        let command = ExternalCommand::new("prog", "in.csv", &camera, ConstantsLayout::Tsai);
        let params = parse::camera_parameters(&command.args()[1]).unwrap();
        assert_eq!((params.ncx, params.cx, params.sx), (1.0, 7.0, 9.0));
        let constants = parse::calibration_constants(&command.args()[2]).unwrap();
        assert_eq!(constants.f, 10.0);
        assert_eq!(constants.translation, (12.0, 13.0, 14.0));
        assert_eq!(constants.rotation, (15.0, 16.0, 17.0));
        assert_eq!(constants.matrix, [0.0; 9]);
    }

    #[test]
    fn legacy_layout_reads_ty_as_ry() {
        let constants = parse::calibration_constants(&numbered_camera().calibration_constants())
            .unwrap();
        assert_eq!(constants.rotation, (15.0, 13.0, 17.0));
    }

    #[test]
    fn wrong_number_of_fields() {
        assert!(parse::camera_parameters("1,2,3").is_err());
        assert!(parse::camera_parameters("1,2,3,4,5,6,7,8,x").is_err());
        assert!(parse::calibration_constants(&vec!["0.5"; 18].join(",")).is_err());
        assert!(parse::calibration_constants(&vec!["0.5"; 19].join(",")).is_ok());
    }

    #[test]
    fn projections_format() {
        let mut camera = numbered_camera();
        camera.sx = 1.0;
        camera.focal = 10.0;
        camera.dpx = 1.0;
        camera.dpy = 1.0;
        camera.cx = 0.5;
        camera.cy = -0.2;
        let sequence = Sequence {
            frames: vec![Frame {
                index: 4,
                points: vec![Point3::new(5.0, 5.0, 1.0), Point3::new(1.0, -1.0, 4.0)],
            }],
        };
        // (50.5, 49.8) and (3.0, -2.7)
        assert_eq!(export_projections(&sequence, &camera).unwrap(), "4,51,50,3,-3\n");
    }

    #[test]
    fn projections_file_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("p2s1.csv");
        std::fs::write(&input, "frame;x;y;z\n0;1;1;1\n").unwrap();
        let mut camera = numbered_camera();
        camera.sx = 1.0;
        camera.dpx = 1.0;
        camera.dpy = 1.0;
        camera.cx = 0.0;
        camera.cy = 0.0;
        let output = export_projections_file(&input, &camera).unwrap();
        assert_eq!(output, dir.path().join("p2s1_a.csv"));
        assert_eq!(std::fs::read_to_string(output).unwrap(), "0,10,10\n");
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_checked() {
        let camera = numbered_camera();
        let ok = ExternalCommand::new("true", "in.csv", &camera, ConstantsLayout::Legacy);
        assert!(ok.run().is_ok());
        let failing = ExternalCommand::new("false", "in.csv", &camera, ConstantsLayout::Legacy);
        assert!(matches!(failing.run(), Err(Error::ExternalFailed { .. })));
    }

    #[test]
    fn missing_program() {
        let command = ExternalCommand::new(
            "this-program-does-not-exist-42",
            "in.csv",
            &numbered_camera(),
            ConstantsLayout::Legacy,
        );
        assert!(matches!(command.run(), Err(Error::Io(_))));
    }
}
