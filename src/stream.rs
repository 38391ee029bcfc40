//! Byte level access to the medium holding a FLIC file.
//!
//! The codec only needs five primitives: a status flag, the current
//! position, absolute seeks and single byte reads/writes. Multi-byte
//! integers are built on top of those, always little endian.

use log::error;
use std::io::{self, Read, Seek, SeekFrom, Write};

pub trait ByteStream {
    /// Returns true while bytes can still be read from/written into the stream.
    fn ok(&self) -> bool;

    fn tell(&mut self) -> usize;

    fn seek(&mut self, abs_pos: usize);

    /// Returns the next byte, or 0 once `ok()` is false.
    fn read8(&mut self) -> u8;

    /// Does nothing once `ok()` is false.
    fn write8(&mut self, value: u8);

    fn read16(&mut self) -> u16 {
        let b1 = self.read8();
        let b2 = self.read8();
        if self.ok() {
            u16::from_le_bytes([b1, b2])
        } else {
            0
        }
    }

    fn read32(&mut self) -> u32 {
        let b1 = self.read8();
        let b2 = self.read8();
        let b3 = self.read8();
        let b4 = self.read8();
        if self.ok() {
            u32::from_le_bytes([b1, b2, b3, b4])
        } else {
            0
        }
    }

    fn write16(&mut self, value: u16) {
        for b in &value.to_le_bytes() {
            self.write8(*b);
        }
    }

    fn write32(&mut self, value: u32) {
        for b in &value.to_le_bytes() {
            self.write8(*b);
        }
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn ok(&self) -> bool {
        (**self).ok()
    }

    fn tell(&mut self) -> usize {
        (**self).tell()
    }

    fn seek(&mut self, abs_pos: usize) {
        (**self).seek(abs_pos)
    }

    fn read8(&mut self) -> u8 {
        (**self).read8()
    }

    fn write8(&mut self, value: u8) {
        (**self).write8(value)
    }
}

/// In-memory stream backed by a growable buffer.
///
/// Reading past the end clears the status flag. Writing past the end fills
/// the gap with zeros.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    data: Vec<u8>,
    pos: usize,
    ok: bool,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for MemoryStream {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            ok: true,
        }
    }
}

impl ByteStream for MemoryStream {
    fn ok(&self) -> bool {
        self.ok
    }

    fn tell(&mut self) -> usize {
        self.pos
    }

    fn seek(&mut self, abs_pos: usize) {
        self.pos = abs_pos;
    }

    fn read8(&mut self) -> u8 {
        if !self.ok {
            return 0;
        }
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                b
            }
            None => {
                self.ok = false;
                0
            }
        }
    }

    fn write8(&mut self, value: u8) {
        if !self.ok {
            return;
        }
        if self.pos >= self.data.len() {
            self.data.resize(self.pos, 0);
            self.data.push(value);
        } else {
            self.data[self.pos] = value;
        }
        self.pos += 1;
    }
}

/// Adapter over any seekable `std::io` medium, e.g. a `File`.
///
/// The first I/O error is logged and makes the stream permanently not ok.
#[derive(Debug)]
pub struct IoStream<F> {
    inner: F,
    ok: bool,
}

impl<F> IoStream<F> {
    pub fn new(inner: F) -> Self {
        Self { inner, ok: true }
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    fn fail(&mut self, op: &str, err: io::Error) {
        error!("{} failed: {}", op, err);
        self.ok = false;
    }
}

impl<F: Read + Write + Seek> ByteStream for IoStream<F> {
    fn ok(&self) -> bool {
        self.ok
    }

    fn tell(&mut self) -> usize {
        match self.inner.stream_position() {
            Ok(pos) => pos as usize,
            Err(e) => {
                self.fail("tell", e);
                0
            }
        }
    }

    fn seek(&mut self, abs_pos: usize) {
        if let Err(e) = self.inner.seek(SeekFrom::Start(abs_pos as u64)) {
            self.fail("seek", e);
        }
    }

    fn read8(&mut self) -> u8 {
        if !self.ok {
            return 0;
        }
        let mut buf = [0u8; 1];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => buf[0],
            Err(e) => {
                self.fail("read", e);
                0
            }
        }
    }

    fn write8(&mut self, value: u8) {
        if !self.ok {
            return;
        }
        if let Err(e) = self.inner.write_all(&[value]) {
            self.fail("write", e);
        }
    }
}
