// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sequences of motion-capture markers, one set of 3D points per frame.
//!
//! Two encodings are supported:
//!
//! - a text format, one frame per line after a header line:
//!   `index;x1;y1;z1;x2;y2;z2;...`
//! - a binary container, little endian:
//!   `"GPTS"`, `u16` version, `u32` frame count,
//!   then for each frame a `u32` index, a `u32` point count
//!   and `count * 3` f64 coordinates.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use itertools::Itertools;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::misc::type_aliases::Point3;

/// Magic bytes at the start of a binary point file.
pub const MAGIC: &[u8; 4] = b"GPTS";

/// Current version of the binary point file layout.
pub const VERSION: u16 = 1;

/// Header line written at the top of text point files.
pub const TEXT_HEADER: &str = "frame;x;y;z";

/// Markers of one video frame.
#[derive(PartialEq, Debug, Clone)]
pub struct Frame {
    /// Index of the frame in the sequence, used to find its image.
    pub index: u32,
    /// Marker positions, in camera space.
    pub points: Vec<Point3>,
}

/// Ordered frames of a capture.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Sequence {
    /// Frames, in file order.
    pub frames: Vec<Frame>,
}

impl Sequence {
    /// Parse a text point file.
    pub fn from_text(content: &str) -> Result<Sequence> {
        parse::text(content)
    }

    /// Read and parse a text point file.
    pub fn from_text_file<P: AsRef<Path>>(file_path: P) -> Result<Sequence> {
        let file_path = file_path.as_ref();
        let sequence = Self::from_text(&std::fs::read_to_string(file_path)?)?;
        log::info!(
            "Loaded {} frames from {}",
            sequence.frames.len(),
            file_path.display()
        );
        Ok(sequence)
    }

    /// Read a binary point file.
    pub fn from_binary_file<P: AsRef<Path>>(file_path: P) -> Result<Sequence> {
        let file_path = file_path.as_ref();
        let sequence = read_binary(BufReader::new(File::open(file_path)?))?;
        log::info!(
            "Loaded {} frames from {}",
            sequence.frames.len(),
            file_path.display()
        );
        Ok(sequence)
    }

    /// Write the sequence into a binary point file.
    pub fn to_binary_file<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(file_path)?);
        write_binary(self, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Encode the sequence in the text format, header included.
    pub fn to_text(&self) -> String {
        let mut content = String::from(TEXT_HEADER);
        content.push('\n');
        for frame in &self.frames {
            let coordinates = frame
                .points
                .iter()
                .flat_map(|p| vec![p.x, p.y, p.z])
                .join(";");
            if coordinates.is_empty() {
                content.push_str(&format!("{}\n", frame.index));
            } else {
                content.push_str(&format!("{};{}\n", frame.index, coordinates));
            }
        }
        content
    }

    /// Write the sequence into a text point file.
    pub fn to_text_file<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        std::fs::write(file_path, self.to_text())?;
        Ok(())
    }

    /// Total number of markers over all frames.
    pub fn nb_points(&self) -> usize {
        self.frames.iter().map(|f| f.points.len()).sum()
    }
}

// BINARY ##################################################

/// Encode a sequence in the binary point format.
pub fn write_binary<W: Write>(sequence: &Sequence, writer: &mut W) -> Result<()> {
    writer.write_all(MAGIC)?;
    writer.write_u16::<LittleEndian>(VERSION)?;
    writer.write_u32::<LittleEndian>(count(sequence.frames.len())?)?;
    for frame in &sequence.frames {
        writer.write_u32::<LittleEndian>(frame.index)?;
        writer.write_u32::<LittleEndian>(count(frame.points.len())?)?;
        for point in &frame.points {
            writer.write_f64::<LittleEndian>(point.x)?;
            writer.write_f64::<LittleEndian>(point.y)?;
            writer.write_f64::<LittleEndian>(point.z)?;
        }
    }
    Ok(())
}

/// Decode a sequence from the binary point format.
///
/// The whole input must be consumed.
pub fn read_binary<R: Read>(mut reader: R) -> Result<Sequence> {
    let mut magic = [0; 4];
    reader.read_exact(&mut magic).map_err(truncated)?;
    if &magic != MAGIC {
        return Err(Error::InvalidBinary(format!("bad magic {:?}", magic)));
    }
    let version = reader.read_u16::<LittleEndian>().map_err(truncated)?;
    if version != VERSION {
        return Err(Error::InvalidBinary(format!(
            "unsupported version {}",
            version
        )));
    }
    let nb_frames = reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    let mut frames = Vec::with_capacity(nb_frames.min(PREALLOCATION_LIMIT));
    for _ in 0..nb_frames {
        let index = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        let nb_points = reader.read_u32::<LittleEndian>().map_err(truncated)? as usize;
        let mut points = Vec::with_capacity(nb_points.min(PREALLOCATION_LIMIT));
        for _ in 0..nb_points {
            let mut xyz = [0.0; 3];
            reader
                .read_f64_into::<LittleEndian>(&mut xyz)
                .map_err(truncated)?;
            points.push(Point3::new(xyz[0], xyz[1], xyz[2]));
        }
        frames.push(Frame { index, points });
    }
    let mut rest = [0; 1];
    if reader.read(&mut rest)? != 0 {
        return Err(Error::InvalidBinary("trailing bytes".to_string()));
    }
    Ok(Sequence { frames })
}

/// Counts read from a file are not trusted for allocation beyond this.
const PREALLOCATION_LIMIT: usize = 1 << 16;

fn count(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::InvalidArgument(format!("{} elements do not fit in u32", len)))
}

fn truncated(error: std::io::Error) -> Error {
    if error.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::InvalidBinary("truncated file".to_string())
    } else {
        Error::Io(error)
    }
}

// TEXT ####################################################

/// Parse the text point format.
pub mod parse {
    use super::*;
    use crate::misc::helper;
    use crate::misc::type_aliases::Float;
    use nom::{
        character::complete::{char, digit1, space0},
        combinator::{map_res, opt},
        multi::many0,
        number::complete::double,
        sequence::{delimited, preceded},
        IResult,
    };

    /// Parse a whole text point file, skipping its header line and empty lines.
    pub fn text(file_content: &str) -> Result<Sequence> {
        let mut frames = Vec::new();
        for (line_number, line) in file_content.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            frames.push(frame(line_number + 1, line)?);
        }
        Ok(Sequence { frames })
    }

    fn frame(line_number: usize, line: &str) -> Result<Frame> {
        let malformed = |reason: String| Error::MalformedLine {
            line: line_number,
            reason,
        };
        let (rest, (index, coordinates)) = frame_line(line)
            .map_err(|_| malformed(format!("expected a frame index, got {:?}", line)))?;
        if !rest.is_empty() {
            return Err(malformed(format!("unexpected text {:?}", rest)));
        }
        let triples = helper::chunks(&coordinates, 3)?;
        let mut points = Vec::with_capacity(triples.len());
        for triple in triples {
            match triple.as_slice() {
                [x, y, z] => points.push(Point3::new(*x, *y, *z)),
                _ => {
                    return Err(malformed(format!(
                        "{} coordinates do not form complete triples",
                        coordinates.len()
                    )))
                }
            }
        }
        Ok(Frame { index, points })
    }

    // nom parsers #############################################################

    // Frame index followed by `;`-separated coordinates and an optional trailing `;`.
    fn frame_line(input: &str) -> IResult<&str, (u32, Vec<Float>)> {
        let (input, index) = frame_index(input)?;
        let (input, coordinates) = many0(preceded(char(';'), coordinate))(input)?;
        let (input, _) = opt(char(';'))(input)?;
        let (input, _) = space0(input)?;
        Ok((input, (index, coordinates)))
    }

    fn frame_index(input: &str) -> IResult<&str, u32> {
        delimited(space0, map_res(digit1, |s: &str| s.parse::<u32>()), space0)(input)
    }

    fn coordinate(input: &str) -> IResult<&str, Float> {
        delimited(space0, double, space0)(input)
    }
} // pub mod parse

// TESTS #############################################################

#[cfg(test)]
mod tests {

    use super::*;

    const EXAMPLE_LINE: &str = "9;-1452.85;2186.34;966.856;87.9573;28.1164;-2.65344;4.10748;0;4.21633;5.25645;0;0;5.78604;0;6.76691;5.63856;0;0;8.63007;1.86614;5.40711;12.9194;-4.13434;1.09512;-3.72624;3.79311;-82.1212;0;-24.176;0;13.7303;12.3857;71.651;0;30.8861;0;262.391;1713.66;0;-0.89815;1.22122;0.69644;-2.18465;1.19311;1.7172";

    fn two_frames() -> Sequence {
        Sequence {
            frames: vec![
                Frame {
                    index: 0,
                    points: vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-4.5, 0.25, 6.0)],
                },
                Frame {
                    index: 3,
                    points: vec![Point3::new(7.0, 8.0, 9.0)],
                },
            ],
        }
    }

    #[test]
    fn header_is_skipped() {
        let sequence = Sequence::from_text("0;1;1;1\n1;2;2;2\n").unwrap();
        assert_eq!(sequence.frames.len(), 1);
        assert_eq!(sequence.frames[0].index, 1);
        assert_eq!(sequence.frames[0].points, vec![Point3::new(2.0, 2.0, 2.0)]);
    }

    #[test]
    fn dataset_line() {
        let content = format!("{}\n{}\n", TEXT_HEADER, EXAMPLE_LINE);
        let sequence = Sequence::from_text(&content).unwrap();
        let frame = &sequence.frames[0];
        assert_eq!(frame.index, 9);
        assert_eq!(frame.points.len(), 15);
        assert_eq!(frame.points[0], Point3::new(-1452.85, 2186.34, 966.856));
        assert_eq!(frame.points[14], Point3::new(-2.18465, 1.19311, 1.7172));
    }

    #[test]
    fn trailing_separator_and_crlf() {
        let sequence = Sequence::from_text("header\r\n2; 1.5 ;2;3;\r\n\r\n").unwrap();
        assert_eq!(sequence.frames.len(), 1);
        assert_eq!(sequence.frames[0].points, vec![Point3::new(1.5, 2.0, 3.0)]);
    }

    #[test]
    fn incomplete_triple() {
        match Sequence::from_text("header\n0;1;1;1\n1;1;2;3;4\n") {
            Err(Error::MalformedLine { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("triples"), "{}", reason);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn not_a_number() {
        match Sequence::from_text("header\n0;1;abc;1\n") {
            Err(Error::MalformedLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_index() {
        assert!(matches!(
            Sequence::from_text("header\n;1;1;1\n"),
            Err(Error::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn text_round_trip() {
        let sequence = two_frames();
        let text = sequence.to_text();
        assert!(text.starts_with(TEXT_HEADER));
        assert_eq!(Sequence::from_text(&text).unwrap(), sequence);
    }

    #[test]
    fn binary_round_trip() {
        let sequence = two_frames();
        let mut buffer = Vec::new();
        write_binary(&sequence, &mut buffer).unwrap();
        assert_eq!(buffer.len(), 4 + 2 + 4 + 2 * 8 + 3 * 3 * 8);
        assert_eq!(read_binary(buffer.as_slice()).unwrap(), sequence);
        assert_eq!(sequence.nb_points(), 3);
    }

    #[test]
    fn binary_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.gpts");
        two_frames().to_binary_file(&path).unwrap();
        assert_eq!(Sequence::from_binary_file(&path).unwrap(), two_frames());
    }

    #[test]
    fn binary_bad_magic() {
        let result = read_binary(&b"NPY\x01\x01\x00\x00\x00\x00\x00"[..]);
        assert!(matches!(result, Err(Error::InvalidBinary(_))));
    }

    #[test]
    fn binary_bad_version() {
        let mut buffer = Vec::new();
        write_binary(&two_frames(), &mut buffer).unwrap();
        buffer[4] = 2;
        assert!(matches!(
            read_binary(buffer.as_slice()),
            Err(Error::InvalidBinary(_))
        ));
    }

    #[test]
    fn binary_truncated() {
        let mut buffer = Vec::new();
        write_binary(&two_frames(), &mut buffer).unwrap();
        buffer.truncate(buffer.len() - 1);
        match read_binary(buffer.as_slice()) {
            Err(Error::InvalidBinary(reason)) => assert!(reason.contains("truncated")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn binary_trailing_bytes() {
        let mut buffer = Vec::new();
        write_binary(&two_frames(), &mut buffer).unwrap();
        buffer.push(0);
        assert!(matches!(
            read_binary(buffer.as_slice()),
            Err(Error::InvalidBinary(_))
        ));
    }
}
