//! # Drawing codec
//!
//! Encodes a [`Drawing`] into the blob stored as a canvas's drawing data, and back.
//!
//! The blob is a little-endian RIFF form of type `avdw`:
//!
//! ```text
//! RIFF <len> avdw
//!   head <8>     version major, minor, patch, 0 | stroke count: u32
//!   strk <len>   ink: u8, [0; 3] | width: f32 | rgba: [f32; 4] | point count: u32 | (x, y, pressure: f32)*
//!   ...          one strk per stroke, in drawing order
//!   csum <4>     CRC-32 (ISO-HDLC) of every byte from `head` up to `csum`
//! ```
//!
//! Every payload is a multiple of four bytes long, so no RIFF pad bytes are ever needed.
//! Chunks the decoder doesn't recognize between `head` and `csum` are skipped.

pub mod riff;

use crate::{
    color::Color,
    stroke::{Drawing, InkKind, Point, Stroke, StrokeStyle},
    util::FiniteF32,
};
use az::CheckedAs;
use riff::{ChunkID, ChunkReader, SizedChunkWriter};
use std::io::{Read, Write};

const CHECKSUM: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC);

/// Fixed-size portion of a `strk` payload, before the points.
const STROKE_HEADER_LEN: usize = 1 + 3 + 4 + 16 + 4;
const HEAD_LEN: usize = 8;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Version(pub u8, pub u8, pub u8);
impl Version {
    pub const CURRENT: Self = Self(1, 0, 0);
    /// Blobs are readable if the major version matches.
    #[must_use]
    pub fn is_compatible(self) -> bool {
        self.0 == Self::CURRENT.0
    }
}
impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("drawing too large to encode")]
    TooLarge,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no drawing data")]
    Empty,
    #[error("drawing data is truncated")]
    Truncated,
    #[error("not a RIFF stream")]
    NotRiff,
    #[error("RIFF form {} is not a drawing", .0)]
    WrongForm(ChunkID),
    #[error("unsupported drawing version {}", .0)]
    UnsupportedVersion(Version),
    #[error("drawing header missing")]
    MissingHeader,
    #[error("malformed drawing: {}", .0)]
    Malformed(&'static str),
    #[error("header declares {expected} strokes, found {found}")]
    CountMismatch { expected: u32, found: usize },
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("unknown ink tag {}", .0)]
    UnknownInk(u8),
    #[error("non-finite value in drawing")]
    NonFinite,
}
impl From<std::io::Error> for DecodeError {
    fn from(value: std::io::Error) -> Self {
        // Decoding only ever reads from a slice, so EOF is the only thing that can go wrong.
        match value.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::Truncated,
            _ => Self::Malformed("read failed"),
        }
    }
}

/// Serialize a drawing. The output is a pure function of the drawing.
pub fn encode(drawing: &Drawing) -> Result<Vec<u8>, EncodeError> {
    // Everything after the form type. Built first so the checksum and RIFF length are known.
    let mut body = Vec::new();
    let stroke_count = drawing.len().checked_as::<u32>().ok_or(EncodeError::TooLarge)?;

    let mut head = [0u8; HEAD_LEN];
    let Version(major, minor, patch) = Version::CURRENT;
    head[..4].copy_from_slice(&[major, minor, patch, 0]);
    head[4..].copy_from_slice(&stroke_count.to_le_bytes());
    SizedChunkWriter::write_buf(&mut body, ChunkID::HEAD, &head).map_err(too_large)?;

    for stroke in drawing {
        write_stroke(&mut body, stroke)?;
    }

    let checksum = CHECKSUM.checksum(&body);
    SizedChunkWriter::write_buf(&mut body, ChunkID::CSUM, &checksum.to_le_bytes())
        .map_err(too_large)?;

    let mut out = Vec::with_capacity(body.len() + 12);
    let mut riff = SizedChunkWriter::new_subtype(&mut out, ChunkID::RIFF, ChunkID::AVDW, body.len())
        .map_err(too_large)?;
    riff.write_all(&body).map_err(too_large)?;
    riff.finish().map_err(too_large)?;

    log::trace!(
        "encoded {} strokes into {} bytes",
        drawing.len(),
        out.len()
    );
    Ok(out)
}

fn too_large(err: std::io::Error) -> EncodeError {
    // Writes into a Vec only fail on the 4GiB chunk limit.
    log::debug!("encode failed: {err}");
    EncodeError::TooLarge
}

fn write_stroke(body: &mut Vec<u8>, stroke: &Stroke) -> Result<(), EncodeError> {
    let point_count = stroke.len().checked_as::<u32>().ok_or(EncodeError::TooLarge)?;
    let len = stroke
        .len()
        .checked_mul(Point::ENCODED_LEN)
        .and_then(|points| points.checked_add(STROKE_HEADER_LEN))
        .ok_or(EncodeError::TooLarge)?;

    let mut chunk = SizedChunkWriter::new(body, ChunkID::STRK, len).map_err(too_large)?;
    let style = stroke.style;
    let mut header = smallvec::SmallVec::<[u8; STROKE_HEADER_LEN]>::new();
    header.extend_from_slice(&[style.ink().tag(), 0, 0, 0]);
    header.extend_from_slice(&style.width().to_le_bytes());
    for channel in style.color().as_finite_array() {
        header.extend_from_slice(&channel.to_le_bytes());
    }
    header.extend_from_slice(&point_count.to_le_bytes());
    chunk.write_all(&header).map_err(too_large)?;

    for point in &stroke.points {
        for value in point.as_finite_array() {
            chunk.write_all(&value.to_le_bytes()).map_err(too_large)?;
        }
    }
    chunk.finish().map_err(too_large)
}

/// Parse a drawing. Fails on anything that isn't exactly a blob produced by [`encode`]
/// (modulo unknown chunks from newer minor versions).
pub fn decode(bytes: &[u8]) -> Result<Drawing, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let mut riff = ChunkReader::new(bytes)?;
    if riff.id() != ChunkID::RIFF {
        return Err(DecodeError::NotRiff);
    }
    // Chunk header has been consumed, everything else should be the payload.
    match riff.data_len().cmp(&(bytes.len() - 8)) {
        std::cmp::Ordering::Greater => return Err(DecodeError::Truncated),
        std::cmp::Ordering::Less => return Err(DecodeError::Malformed("trailing bytes")),
        std::cmp::Ordering::Equal => (),
    }
    let form = riff.subtype()?;
    if form != ChunkID::AVDW {
        return Err(DecodeError::WrongForm(form));
    }

    let body = &bytes[12..];
    let mut cursor = std::io::Cursor::new(body);

    let stroke_count = {
        let mut head = ChunkReader::new(&mut cursor)?;
        if head.id() != ChunkID::HEAD {
            return Err(DecodeError::MissingHeader);
        }
        if head.data_len() != HEAD_LEN {
            return Err(DecodeError::Malformed("header length"));
        }
        let [major, minor, patch, _, c0, c1, c2, c3] = head.read_array::<HEAD_LEN>()?;
        let version = Version(major, minor, patch);
        if !version.is_compatible() {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        u32::from_le_bytes([c0, c1, c2, c3])
    };

    let mut strokes = Vec::new();
    loop {
        // Position of this chunk within `body`, for the checksum.
        let start = cursor
            .position()
            .checked_as::<usize>()
            .ok_or(DecodeError::Malformed("offset"))?;
        if start == body.len() {
            // Ran out before the checksum.
            return Err(DecodeError::Truncated);
        }
        let mut chunk = ChunkReader::new(&mut cursor)?;
        if chunk.data_len() > body.len() - start - 8 {
            return Err(DecodeError::Truncated);
        }
        if chunk.data_len() % 4 != 0 {
            return Err(DecodeError::Malformed("unaligned chunk"));
        }
        match chunk.id() {
            ChunkID::STRK => strokes.push(read_stroke(&mut chunk)?),
            ChunkID::CSUM => {
                if chunk.data_len() != 4 {
                    return Err(DecodeError::Malformed("checksum length"));
                }
                let stored = u32::from_le_bytes(chunk.read_array()?);
                if stored != CHECKSUM.checksum(&body[..start]) {
                    return Err(DecodeError::ChecksumMismatch);
                }
                if start + 12 != body.len() {
                    return Err(DecodeError::Malformed("data after checksum"));
                }
                break;
            }
            ChunkID::HEAD => return Err(DecodeError::Malformed("duplicate header")),
            other => {
                log::debug!("skipping unknown drawing chunk {other}");
                chunk.skip()?;
            }
        }
    }

    if strokes.len() != stroke_count as usize {
        return Err(DecodeError::CountMismatch {
            expected: stroke_count,
            found: strokes.len(),
        });
    }
    Ok(Drawing::from(strokes))
}

fn read_finite<R: Read>(r: &mut ChunkReader<R>) -> Result<FiniteF32, DecodeError> {
    FiniteF32::from_le_bytes(r.read_array()?).map_err(|_| DecodeError::NonFinite)
}

fn read_stroke<R: Read>(chunk: &mut ChunkReader<R>) -> Result<Stroke, DecodeError> {
    if chunk.data_len() < STROKE_HEADER_LEN {
        return Err(DecodeError::Malformed("stroke header"));
    }
    let [tag, pad0, pad1, pad2] = chunk.read_array()?;
    if [pad0, pad1, pad2] != [0; 3] {
        return Err(DecodeError::Malformed("nonzero stroke padding"));
    }
    let ink = InkKind::from_tag(tag).ok_or(DecodeError::UnknownInk(tag))?;
    let width = read_finite(chunk)?;
    let mut channels = [0.0f32; 4];
    for channel in &mut channels {
        *channel = read_finite(chunk)?.get();
    }
    let color = Color::from_array(channels).map_err(|_| DecodeError::Malformed("color range"))?;
    let style = StrokeStyle::new(ink, color, width.get())
        .map_err(|_| DecodeError::Malformed("stroke width"))?;

    let point_count = u32::from_le_bytes(chunk.read_array()?) as usize;
    let expected_len = point_count
        .checked_mul(Point::ENCODED_LEN)
        .and_then(|len| len.checked_add(STROKE_HEADER_LEN));
    if expected_len != Some(chunk.data_len()) {
        return Err(DecodeError::Malformed("stroke length"));
    }

    let mut points = Vec::with_capacity(point_count);
    for _ in 0..point_count {
        let x = read_finite(chunk)?;
        let y = read_finite(chunk)?;
        let pressure = read_finite(chunk)?;
        points.push(Point::from_finite(x, y, pressure));
    }
    Ok(Stroke::new(style, points))
}
