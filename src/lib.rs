//! Reader and writer for Autodesk Animator FLI/FLC animations.
//!
//! A file is a 128 byte header followed by a sequence of frames, each one
//! made of self-sized chunks. Frames hold 8-bit indexed pixels and an
//! optional 256 entry colormap update.

pub mod decoder;
pub mod encoder;
pub mod runs;
pub mod stream;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use stream::{ByteStream, IoStream, MemoryStream};

use std::fmt;
use std::ops::{Index, IndexMut};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum FlicError {
    #[error("invalid file magic 0x{0:04x}, expected 0xaf11 (FLI) or 0xaf12 (FLC)")]
    InvalidMagic(u16),

    #[error("frame buffer holds {actual} bytes, at least {expected} are required")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("rowstride {rowstride} is smaller than the frame width {width}")]
    InvalidRowstride { rowstride: usize, width: u16 },

    #[error("the file header must be read or written before any frame")]
    MissingHeader,

    #[error("stream is not writable, the file header was left unpatched")]
    StreamUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Original Animator files, speed stored in 1/70 s jiffies.
    Fli,
    /// Animator Pro files, speed stored in milliseconds.
    Flc,
}

impl Format {
    pub(crate) const FLI_MAGIC: u16 = 0xaf11;
    pub(crate) const FLC_MAGIC: u16 = 0xaf12;

    pub fn from_magic(magic: u16) -> Option<Self> {
        match magic {
            Self::FLI_MAGIC => Some(Self::Fli),
            Self::FLC_MAGIC => Some(Self::Flc),
            _ => None,
        }
    }

    pub fn magic(&self) -> u16 {
        match self {
            Self::Fli => Self::FLI_MAGIC,
            Self::Flc => Self::FLC_MAGIC,
        }
    }
}

/// Chunk tags understood by this codec. Any other tag is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    Color256,
    Delta,
    Color64,
    LineChange,
    Black,
    Brun,
    Copy,
}

impl ChunkType {
    pub fn from_u16(tag: u16) -> Option<Self> {
        match tag {
            4 => Some(Self::Color256),
            7 => Some(Self::Delta),
            11 => Some(Self::Color64),
            12 => Some(Self::LineChange),
            13 => Some(Self::Black),
            15 => Some(Self::Brun),
            16 => Some(Self::Copy),
            _ => None,
        }
    }

    pub fn tag(&self) -> u16 {
        match self {
            Self::Color256 => 4,
            Self::Delta => 7,
            Self::Color64 => 11,
            Self::LineChange => 12,
            Self::Black => 13,
            Self::Brun => 15,
            Self::Copy => 16,
        }
    }
}

impl From<&ChunkType> for &'static str {
    fn from(x: &ChunkType) -> &'static str {
        match x {
            ChunkType::Color256 => "COLOR_256",
            ChunkType::Delta => "DELTA",
            ChunkType::Color64 => "COLOR_64",
            ChunkType::LineChange => "LC",
            ChunkType::Black => "BLACK",
            ChunkType::Brun => "BRUN",
            ChunkType::Copy => "COPY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub frames: u16,
    pub width: u16,
    pub height: u16,
    /// Delay between frames in milliseconds.
    pub speed: u32,
}

impl Header {
    pub(crate) const SIZE: usize = 128;
    // Frame 1 and frame 2 offsets, FLC only.
    pub(crate) const OFFSETS_POS: usize = 80;

    pub(crate) const DEFAULT_WIDTH: u16 = 320;
    pub(crate) const DEFAULT_HEIGHT: u16 = 200;
    pub(crate) const DEPTH: u16 = 8;
}

pub(crate) struct FrameHeader;

impl FrameHeader {
    pub(crate) const MAGIC: u16 = 0xf1fa;
    pub(crate) const RESERVED: usize = 8;
}

pub(crate) struct ChunkHeader;

impl ChunkHeader {
    pub(crate) const SIZE: usize = 6;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Colormap {
    colors: [Color; Colormap::SIZE],
}

impl Colormap {
    pub const SIZE: usize = 256;
}

impl Default for Colormap {
    fn default() -> Self {
        Self {
            colors: [Color::default(); Self::SIZE],
        }
    }
}

impl Index<usize> for Colormap {
    type Output = Color;

    fn index(&self, idx: usize) -> &Color {
        &self.colors[idx]
    }
}

impl IndexMut<usize> for Colormap {
    fn index_mut(&mut self, idx: usize) -> &mut Color {
        &mut self.colors[idx]
    }
}

impl fmt::Debug for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let distinct = self
            .colors
            .iter()
            .enumerate()
            .filter(|(i, c)| *i == 0 || self.colors[i - 1] != **c)
            .count();
        f.debug_struct("Colormap")
            .field("first", &self.colors[0])
            .field("last", &self.colors[Self::SIZE - 1])
            .field("distinct_runs", &distinct)
            .finish()
    }
}

/// One indexed-color image plus the palette active for it.
///
/// The pixel buffer is owned by the caller and sized `rowstride * height`
/// (or larger). Decoding writes into it in place, it is never resized.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub rowstride: usize,
    pub colormap: Colormap,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_rowstride(width as usize, height)
    }

    pub fn with_rowstride(rowstride: usize, height: u16) -> Self {
        Self {
            pixels: vec![0; rowstride * height as usize],
            rowstride,
            colormap: Colormap::default(),
        }
    }

    pub fn row(&self, y: usize, width: usize) -> &[u8] {
        let start = y * self.rowstride;
        &self.pixels[start..start + width]
    }

    pub(crate) fn check_size(&self, width: u16, height: u16) -> Result<(), FlicError> {
        if self.rowstride < width as usize {
            return Err(FlicError::InvalidRowstride {
                rowstride: self.rowstride,
                width,
            });
        }
        let expected = self.rowstride * height as usize;
        if self.pixels.len() < expected {
            return Err(FlicError::BufferTooSmall {
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.pixels.len())
            .field("rowstride", &self.rowstride)
            .field("colormap", &self.colormap)
            .finish()
    }
}
