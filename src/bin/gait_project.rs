// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use argh::FromArgs;
use std::{error::Error, path::Path, path::PathBuf};

use gait_projection::core::camera::{Camera, ConstantsLayout};
use gait_projection::core::overlay::{
    self, BoundsPolicy, FrameObserver, NoopObserver, OverlayConfig, PauseObserver, SaveFrames,
};
use gait_projection::dataset::sequence::Sequence;
use gait_projection::external::{self, ExternalCommand};

/// Project motion-capture markers onto gait dataset camera images.
#[derive(FromArgs, Debug)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Command {
    OverlayText(OverlayText),
    OverlayBinary(OverlayBinary),
    RunExternal(RunExternal),
    Export(Export),
    Convert(Convert),
    Params(Params),
}

/// Overlay the markers of a text point file on the frames of a camera.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "overlay-text")]
struct OverlayText {
    /// text point file (`index;x;y;z;...`)
    #[argh(positional)]
    points: PathBuf,

    /// camera calibration xml file
    #[argh(positional)]
    calibration: PathBuf,

    /// directory of the camera frames
    #[argh(positional)]
    image_dir: PathBuf,

    /// directory where annotated frames are saved
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// number added to frame indices to name images (default 130)
    #[argh(option)]
    offset: Option<u32>,

    /// extension of frame images (default none)
    #[argh(option)]
    extension: Option<String>,

    /// out-of-bounds markers: reject, skip or clamp (default skip)
    #[argh(option, default = "BoundsPolicy::Skip")]
    bounds: BoundsPolicy,

    /// wait for Enter after each frame step
    #[argh(switch)]
    pause: bool,
}

/// Overlay the markers of a binary point file on the frames of a camera.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "overlay-binary")]
struct OverlayBinary {
    /// binary point file
    #[argh(positional)]
    points: PathBuf,

    /// camera calibration xml file
    #[argh(positional)]
    calibration: PathBuf,

    /// directory of the camera frames
    #[argh(positional)]
    image_dir: PathBuf,

    /// directory where annotated frames are saved
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// number added to frame indices to name images (default 130)
    #[argh(option)]
    offset: Option<u32>,

    /// extension of frame images (default png)
    #[argh(option)]
    extension: Option<String>,

    /// out-of-bounds markers: reject, skip or clamp (default skip)
    #[argh(option, default = "BoundsPolicy::Skip")]
    bounds: BoundsPolicy,

    /// wait for Enter after each frame step
    #[argh(switch)]
    pause: bool,
}

/// Run the external Tsai program with the calibration of a camera.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "run-external")]
struct RunExternal {
    /// program to run
    #[argh(positional)]
    program: String,

    /// input file handed to the program
    #[argh(positional)]
    input: PathBuf,

    /// camera calibration xml file
    #[argh(positional)]
    calibration: PathBuf,

    /// write ry instead of the historical second ty in the constants
    #[argh(switch)]
    tsai_constants: bool,
}

/// Project a text point file and write `<stem>_a.csv` next to it.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "export")]
struct Export {
    /// text point file
    #[argh(positional)]
    points: PathBuf,

    /// camera calibration xml file
    #[argh(positional)]
    calibration: PathBuf,
}

/// Convert a point file between the binary (.gpts) and text formats.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "convert")]
struct Convert {
    /// input point file
    #[argh(positional)]
    input: PathBuf,

    /// output point file
    #[argh(positional)]
    output: PathBuf,
}

/// Print the serialized calibration of a camera.
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "params")]
struct Params {
    /// camera calibration xml file
    #[argh(positional)]
    calibration: PathBuf,
}

fn main() {
    env_logger::init();
    let args: Args = argh::from_env();
    if let Err(error) = run(args) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        Command::OverlayText(a) => {
            let sequence = Sequence::from_text_file(&a.points)?;
            let mut config = OverlayConfig::text();
            configure(&mut config, a.offset, a.extension, a.bounds);
            run_overlay(&sequence, &a.calibration, &a.image_dir, &config, a.output, a.pause)
        }
        Command::OverlayBinary(a) => {
            let sequence = Sequence::from_binary_file(&a.points)?;
            let mut config = OverlayConfig::binary();
            configure(&mut config, a.offset, a.extension, a.bounds);
            run_overlay(&sequence, &a.calibration, &a.image_dir, &config, a.output, a.pause)
        }
        Command::RunExternal(a) => {
            let camera = Camera::from_xml_file(&a.calibration)?;
            let layout = if a.tsai_constants {
                ConstantsLayout::Tsai
            } else {
                ConstantsLayout::Legacy
            };
            ExternalCommand::new(&a.program, &a.input, &camera, layout).run()?;
            Ok(())
        }
        Command::Export(a) => {
            let camera = Camera::from_xml_file(&a.calibration)?;
            let output = external::export_projections_file(&a.points, &camera)?;
            println!("{}", output.display());
            Ok(())
        }
        Command::Convert(a) => {
            let sequence = read_sequence(&a.input)?;
            if is_binary(&a.output) {
                sequence.to_binary_file(&a.output)?;
            } else {
                sequence.to_text_file(&a.output)?;
            }
            Ok(())
        }
        Command::Params(a) => {
            let camera = Camera::from_xml_file(&a.calibration)?;
            println!("{}", camera.camera_parameters());
            println!("{}", camera.calibration_constants());
            Ok(())
        }
    }
}

/// Apply command line overrides on top of a preset.
fn configure(
    config: &mut OverlayConfig,
    offset: Option<u32>,
    extension: Option<String>,
    bounds: BoundsPolicy,
) {
    if let Some(offset) = offset {
        config.naming.offset = offset;
    }
    if extension.is_some() {
        config.naming.extension = extension;
    }
    config.bounds = bounds;
}

fn run_overlay(
    sequence: &Sequence,
    calibration: &Path,
    image_dir: &Path,
    config: &OverlayConfig,
    output: Option<PathBuf>,
    pause: bool,
) -> Result<(), Box<dyn Error>> {
    let camera = Camera::from_xml_file(calibration)?;
    let mut observer: Box<dyn FrameObserver> = match output {
        Some(dir) => Box::new(SaveFrames::new(dir)?),
        None => Box::new(NoopObserver),
    };
    if pause {
        observer = Box::new(PauseObserver::stdin(observer));
    }
    let report = overlay::overlay_sequence(sequence, image_dir, &camera, config, &mut observer)?;
    println!(
        "{} frames, {} markers drawn, {} skipped",
        report.frames, report.drawn, report.skipped
    );
    Ok(())
}

fn is_binary(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gpts")
}

fn read_sequence(path: &Path) -> Result<Sequence, Box<dyn Error>> {
    if is_binary(path) {
        Ok(Sequence::from_binary_file(path)?)
    } else {
        Ok(Sequence::from_text_file(path)?)
    }
}
