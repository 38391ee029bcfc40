use crate::{
    ByteStream, ChunkHeader, ChunkType, Color, Colormap, FlicError, Format, Frame, FrameHeader,
    Header,
};
use log::{debug, info, trace, warn};

/// Sequential FLI/FLC reader.
///
/// Call [`Decoder::read_header`] once, then [`Decoder::read_frame`] for each
/// frame. Every chunk decoder clips its writes to the frame buffer, and the
/// stream is always moved to the declared end of each chunk and frame, so
/// damaged files degrade instead of failing.
pub struct Decoder<S> {
    file: S,
    width: u16,
    height: u16,
    format: Option<Format>,
    frame_count: usize,
    offset_frame1: usize,
    offset_frame2: usize,
}

impl<S: ByteStream> Decoder<S> {
    pub fn new(file: S) -> Self {
        Self {
            file,
            width: 0,
            height: 0,
            format: None,
            frame_count: 0,
            offset_frame1: 0,
            offset_frame2: 0,
        }
    }

    /// Variant detected by the last successful `read_header`.
    pub fn format(&self) -> Option<Format> {
        self.format
    }

    pub fn current_frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn into_inner(self) -> S {
        self.file
    }

    pub fn read_header(&mut self) -> anyhow::Result<Header> {
        self.file.read32(); // File size
        let magic = self.file.read16();
        let format = match Format::from_magic(magic) {
            Some(format) => format,
            None => return Err(FlicError::InvalidMagic(magic).into()),
        };
        info!("FLIC format: {:?}", format);

        let mut header = Header {
            frames: self.file.read16(),
            width: self.file.read16(),
            height: self.file.read16(),
            speed: 0,
        };
        self.file.read16(); // Color depth, always decoded as 8bpp
        self.file.read16(); // Flags
        let speed = self.file.read32();

        header.speed = match format {
            // Jiffies (1/70 s) to milliseconds
            Format::Fli if speed == 0 => 70,
            Format::Fli => (1000 * u64::from(speed) / 70) as u32,
            Format::Flc => speed,
        };

        if format == Format::Flc {
            self.file.seek(Header::OFFSETS_POS);
            self.offset_frame1 = self.file.read32() as usize;
            self.offset_frame2 = self.file.read32() as usize;
            debug!(
                "Loop anchors: frame 1 at {}, frame 2 at {}",
                self.offset_frame1, self.offset_frame2
            );
        }

        if header.width == 0 {
            header.width = Header::DEFAULT_WIDTH;
        }
        if header.height == 0 {
            header.height = Header::DEFAULT_HEIGHT;
        }

        self.width = header.width;
        self.height = header.height;
        self.format = Some(format);

        self.file.seek(Header::SIZE);
        debug!("Header: {:?}", header);
        Ok(header)
    }

    /// Decodes the next frame on top of the pixels and colormap already in
    /// `frame`, which must hold the previous frame for delta chunks to work.
    pub fn read_frame(&mut self, frame: &mut Frame) -> anyhow::Result<()> {
        if self.format.is_none() {
            return Err(FlicError::MissingHeader.into());
        }
        frame.check_size(self.width, self.height)?;

        match self.frame_count {
            0 if self.offset_frame1 != 0 => self.file.seek(self.offset_frame1),
            1 if self.offset_frame2 != 0 => self.file.seek(self.offset_frame2),
            _ => {}
        }

        let frame_start = self.file.tell();
        let frame_size = self.file.read32() as usize;
        let magic = self.file.read16();
        if magic != FrameHeader::MAGIC {
            warn!(
                "frame {} at offset {} has magic 0x{:04x}, expected 0x{:04x}",
                self.frame_count,
                frame_start,
                magic,
                FrameHeader::MAGIC
            );
        }

        let chunks = self.file.read16();
        for _ in 0..FrameHeader::RESERVED {
            self.file.read8();
        }
        info!(
            "Reading frame {}: offset {}, {} bytes, {} chunks",
            self.frame_count, frame_start, frame_size, chunks
        );

        for _ in 0..chunks {
            if !self.file.ok() {
                break;
            }
            self.read_chunk(frame);
        }

        self.file.seek(frame_start + frame_size);
        self.frame_count += 1;

        // Damaged frames keep whatever was decoded
        if !self.file.ok() {
            warn!(
                "frame at offset {} ends past the end of the stream",
                frame_start
            );
        }
        Ok(())
    }

    fn read_chunk(&mut self, frame: &mut Frame) {
        let chunk_start = self.file.tell();
        let chunk_size = self.file.read32() as usize;
        let tag = self.file.read16();
        if chunk_size < ChunkHeader::SIZE {
            debug!(
                "Chunk at offset {} declares {} bytes, less than its own header",
                chunk_start, chunk_size
            );
        }

        match ChunkType::from_u16(tag) {
            Some(chunk_type) => {
                let name: &'static str = (&chunk_type).into();
                debug!(
                    "Found {} chunk at offset {}, {} bytes",
                    name, chunk_start, chunk_size
                );
                match chunk_type {
                    ChunkType::Color256 => self.read_color_chunk(frame, false),
                    ChunkType::Delta => self.read_delta_chunk(frame),
                    ChunkType::Color64 => self.read_color_chunk(frame, true),
                    ChunkType::LineChange => self.read_lc_chunk(frame),
                    ChunkType::Black => self.read_black_chunk(frame),
                    ChunkType::Brun => self.read_brun_chunk(frame),
                    ChunkType::Copy => self.read_copy_chunk(frame),
                }
            }
            None => debug!(
                "Skipping chunk of unknown type {} at offset {}",
                tag, chunk_start
            ),
        }

        self.file.seek(chunk_start + chunk_size);
    }

    fn read_black_chunk(&mut self, frame: &mut Frame) {
        let end = frame.rowstride * self.height as usize;
        for px in &mut frame.pixels[..end] {
            *px = 0;
        }
    }

    fn read_copy_chunk(&mut self, frame: &mut Frame) {
        if self.width != Header::DEFAULT_WIDTH || self.height != Header::DEFAULT_HEIGHT {
            warn!(
                "ignoring COPY chunk on a {}x{} frame, only 320x200 is supported",
                self.width, self.height
            );
            return;
        }
        for y in 0..self.height as usize {
            let start = y * frame.rowstride;
            for px in &mut frame.pixels[start..start + self.width as usize] {
                *px = self.file.read8();
            }
        }
    }

    fn read_color_chunk(&mut self, frame: &mut Frame, six_bit: bool) {
        let npackets = self.file.read16();

        let mut i = 0;
        for _ in 0..npackets {
            i += self.file.read8() as usize; // Colors to skip
            let colors = match self.file.read8() {
                0 => 256,
                n => n as usize,
            };
            trace!("Color packet: first index {}, {} colors", i, colors);

            // Writes past the last entry mean a broken chunk, drop them
            let end = (i + colors).min(Colormap::SIZE);
            for idx in i..end {
                let (r, g, b) = (self.file.read8(), self.file.read8(), self.file.read8());
                frame.colormap[idx] = if six_bit {
                    Color::new(scale_6bit(r), scale_6bit(g), scale_6bit(b))
                } else {
                    Color::new(r, g, b)
                };
            }
            i += colors;
        }
    }

    fn read_brun_chunk(&mut self, frame: &mut Frame) {
        let width = self.width as usize;
        for y in 0..self.height as usize {
            let start = y * frame.rowstride;
            let row = &mut frame.pixels[start..start + width];

            // Obsolete for wide frames, only compared against what we decode
            let declared = self.file.read8();
            let mut npackets = 0;

            let mut x = 0;
            while self.file.ok() && x < width {
                let count = self.file.read8() as i8;
                npackets += 1;
                if count >= 0 {
                    let color = self.file.read8();
                    let end = (x + count as usize).min(width);
                    for px in &mut row[x..end] {
                        *px = color;
                    }
                    x = end;
                } else {
                    let end = (x + count.unsigned_abs() as usize).min(width);
                    for px in &mut row[x..end] {
                        *px = self.file.read8();
                    }
                    x = end;
                }
            }

            if declared != 255 && npackets != declared as usize {
                debug!(
                    "BRUN line {} declares {} packets, decoded {}",
                    y, declared, npackets
                );
            }
        }
    }

    fn read_lc_chunk(&mut self, frame: &mut Frame) {
        let width = self.width as usize;
        let height = self.height as usize;
        let end = frame.rowstride * height;

        let skip_lines = self.file.read16() as usize;
        let nlines = self.file.read16() as usize;

        for y in skip_lines..skip_lines + nlines {
            if y >= height {
                break;
            }

            let mut pos = y * frame.rowstride;
            let mut x = 0;
            let npackets = self.file.read8();
            for _ in 0..npackets {
                if x >= width {
                    break;
                }
                let skip = self.file.read8() as usize;
                x += skip;
                pos += skip;

                let count = self.file.read8() as i8;
                if count >= 0 {
                    // Literal runs are only bounded by the end of the buffer
                    let stop = (pos + count as usize).min(end);
                    for idx in pos..stop {
                        frame.pixels[idx] = self.file.read8();
                    }
                    x += stop.saturating_sub(pos);
                    pos = pos.max(stop);
                    if pos >= end {
                        debug!("LC chunk runs past the frame buffer, stopping");
                        return;
                    }
                } else {
                    let color = self.file.read8();
                    if x < width {
                        let stop = (x + count.unsigned_abs() as usize).min(width);
                        for px in &mut frame.pixels[pos..pos + stop - x] {
                            *px = color;
                        }
                        pos += stop - x;
                        x = stop;
                    }
                }
            }
        }
    }

    fn read_delta_chunk(&mut self, frame: &mut Frame) {
        let width = self.width as usize;
        let height = self.height as usize;

        let mut nlines = self.file.read16() as usize;
        let mut y = 0;
        while nlines != 0 {
            nlines -= 1;
            let mut npackets = 0;

            while self.file.ok() {
                let word = self.file.read16() as i16;
                if word >= 0 {
                    npackets = word as usize;
                    break;
                }
                if word as u16 & 0x4000 != 0 {
                    y += (-i32::from(word)) as usize;
                } else {
                    // Only the last pixel of the line changes
                    if y < height && width > 0 {
                        frame.pixels[y * frame.rowstride + width - 1] = word as u8;
                    }
                    y += 1;
                    if nlines == 0 {
                        return;
                    }
                    nlines -= 1;
                }
            }

            if y >= height {
                break;
            }

            let row_start = y * frame.rowstride;
            let row = &mut frame.pixels[row_start..row_start + width];
            let mut x = 0;
            for _ in 0..npackets {
                x += self.file.read8() as usize;
                let count = self.file.read8() as i8;
                if count >= 0 {
                    for _ in 0..count {
                        if x >= width {
                            break;
                        }
                        let pair = [self.file.read8(), self.file.read8()];
                        x = put_pair(row, x, pair);
                    }
                } else {
                    let pair = [self.file.read8(), self.file.read8()];
                    for _ in 0..count.unsigned_abs() {
                        if x >= width {
                            break;
                        }
                        x = put_pair(row, x, pair);
                    }
                }
            }

            y += 1;
        }
    }
}

// Writes up to two pixels at `x`, clipped to the row. Returns the new cursor.
fn put_pair(row: &mut [u8], mut x: usize, pair: [u8; 2]) -> usize {
    for &c in &pair {
        if x < row.len() {
            row[x] = c;
            x += 1;
        }
    }
    x
}

fn scale_6bit(value: u8) -> u8 {
    (255 * u32::from(value) / 63).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStream;

    fn header(magic: u16, frames: u16, width: u16, height: u16, speed: u32) -> Vec<u8> {
        let mut data = vec![0; Header::SIZE];
        data[4..6].copy_from_slice(&magic.to_le_bytes());
        data[6..8].copy_from_slice(&frames.to_le_bytes());
        data[8..10].copy_from_slice(&width.to_le_bytes());
        data[10..12].copy_from_slice(&height.to_le_bytes());
        data[12..14].copy_from_slice(&8u16.to_le_bytes());
        data[16..20].copy_from_slice(&speed.to_le_bytes());
        data
    }

    fn chunk(tag: u16, payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&((ChunkHeader::SIZE + payload.len()) as u32).to_le_bytes());
        data.extend_from_slice(&tag.to_le_bytes());
        data.extend_from_slice(payload);
        data
    }

    fn frame(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut data = Vec::new();
        data.extend_from_slice(&(16 + body.len() as u32).to_le_bytes());
        data.extend_from_slice(&FrameHeader::MAGIC.to_le_bytes());
        data.extend_from_slice(&(chunks.len() as u16).to_le_bytes());
        data.extend_from_slice(&[0; 8]);
        data.extend_from_slice(&body);
        data
    }

    fn decode_one(width: u16, height: u16, chunks: &[Vec<u8>], frame: &mut Frame) -> anyhow::Result<()> {
        let mut data = header(Format::FLC_MAGIC, 1, width, height, 100);
        data.extend_from_slice(&self::frame(chunks));
        let mut decoder = Decoder::new(MemoryStream::from(data));
        decoder.read_header()?;
        decoder.read_frame(frame)
    }

    #[test]
    fn fli_speed_is_converted_to_milliseconds() {
        let mut decoder = Decoder::new(MemoryStream::from(header(Format::FLI_MAGIC, 3, 10, 10, 35)));
        let h = decoder.read_header().unwrap();
        assert_eq!(h.speed, 500);
        assert_eq!(h.frames, 3);
        assert_eq!(decoder.format(), Some(Format::Fli));

        let mut decoder = Decoder::new(MemoryStream::from(header(Format::FLI_MAGIC, 3, 10, 10, 0)));
        assert_eq!(decoder.read_header().unwrap().speed, 70);
    }

    #[test]
    fn flc_speed_is_kept() {
        let mut decoder = Decoder::new(MemoryStream::from(header(Format::FLC_MAGIC, 1, 10, 10, 35)));
        assert_eq!(decoder.read_header().unwrap().speed, 35);
    }

    #[test]
    fn invalid_magic_is_rejected() {
        let mut decoder = Decoder::new(MemoryStream::from(header(0x1234, 1, 10, 10, 0)));
        let err = decoder.read_header().unwrap_err();
        assert_eq!(
            err.downcast_ref::<FlicError>(),
            Some(&FlicError::InvalidMagic(0x1234))
        );
    }

    #[test]
    fn zero_size_defaults_to_320x200() {
        let mut decoder = Decoder::new(MemoryStream::from(header(Format::FLI_MAGIC, 1, 0, 0, 5)));
        let h = decoder.read_header().unwrap();
        assert_eq!((h.width, h.height), (320, 200));
        assert_eq!(decoder.into_inner().tell(), Header::SIZE);
    }

    #[test]
    fn frame_before_header_is_an_error() {
        let mut decoder = Decoder::new(MemoryStream::new());
        let mut f = Frame::new(4, 4);
        assert!(decoder.read_frame(&mut f).is_err());
    }

    #[test]
    fn small_buffer_is_rejected() {
        let mut f = Frame::new(4, 4);
        f.pixels.truncate(10);
        let err = decode_one(4, 4, &[], &mut f).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FlicError>(),
            Some(&FlicError::BufferTooSmall {
                expected: 16,
                actual: 10
            })
        );

        let mut f = Frame::with_rowstride(3, 8);
        assert!(decode_one(4, 4, &[], &mut f).is_err());
    }

    #[test]
    fn color_chunks() {
        let mut f = Frame::new(2, 2);
        // Skip 1, write 2 colors, then skip 1 more and write 1.
        let payload = [2, 0, 1, 2, 10, 20, 30, 40, 50, 60, 1, 1, 7, 8, 9];
        decode_one(2, 2, &[chunk(4, &payload)], &mut f).unwrap();
        assert_eq!(f.colormap[0], Color::default());
        assert_eq!(f.colormap[1], Color::new(10, 20, 30));
        assert_eq!(f.colormap[2], Color::new(40, 50, 60));
        assert_eq!(f.colormap[3], Color::default());
        assert_eq!(f.colormap[4], Color::new(7, 8, 9));

        let mut f = Frame::new(2, 2);
        decode_one(2, 2, &[chunk(11, &[1, 0, 0, 1, 63, 0, 21])], &mut f).unwrap();
        assert_eq!(f.colormap[0], Color::new(255, 0, 85));
    }

    #[test]
    fn color_chunk_overflow_is_clamped() {
        let mut f = Frame::new(2, 2);
        // Skip 255 entries and claim 3 colors: only index 255 fits.
        let payload = [1, 0, 255, 3, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        decode_one(2, 2, &[chunk(4, &payload)], &mut f).unwrap();
        assert_eq!(f.colormap[255], Color::new(1, 2, 3));
        assert_eq!(f.colormap[254], Color::default());
    }

    #[test]
    fn black_chunk_clears_frame() {
        let mut f = Frame::with_rowstride(5, 3);
        for px in f.pixels.iter_mut() {
            *px = 9;
        }
        decode_one(4, 3, &[chunk(13, &[])], &mut f).unwrap();
        assert!(f.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn copy_chunk_only_for_320x200() {
        let raw: Vec<u8> = (0..320 * 200).map(|i| (i % 251) as u8).collect();
        let mut f = Frame::new(320, 200);
        decode_one(320, 200, &[chunk(16, &raw)], &mut f).unwrap();
        assert_eq!(f.pixels, raw);

        let mut f = Frame::new(10, 10);
        decode_one(10, 10, &[chunk(16, &[1; 100])], &mut f).unwrap();
        assert!(f.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn brun_chunk() {
        let mut f = Frame::with_rowstride(8, 2);
        let payload = [
            2, 3, 7, 0xfd, 1, 2, 3, // line 0: 7 7 7 1 2 3
            1, 100, 4, // line 1: repeat clipped to the width
        ];
        decode_one(6, 2, &[chunk(15, &payload)], &mut f).unwrap();
        assert_eq!(f.row(0, 6), &[7, 7, 7, 1, 2, 3]);
        assert_eq!(f.row(1, 6), &[4; 6]);
        // Padding after the row is untouched.
        assert_eq!(&f.pixels[6..8], &[0, 0]);
    }

    #[test]
    fn lc_chunk() {
        let mut f = Frame::new(6, 4);
        for px in f.pixels.iter_mut() {
            *px = 1;
        }
        let payload = [
            1, 0, 2, 0, // skip 1 line, 2 lines
            2, 1, 2, 8, 9, 1, 0xfe, 5, // line 1: skip 1, literal [8 9], skip 1, repeat 5 x2
            1, 4, 2, 3, 4, // line 2: skip 4, literal [3 4]
        ];
        decode_one(6, 4, &[chunk(12, &payload)], &mut f).unwrap();
        assert_eq!(f.row(0, 6), &[1; 6]);
        assert_eq!(f.row(1, 6), &[1, 8, 9, 1, 5, 5]);
        assert_eq!(f.row(2, 6), &[1, 1, 1, 1, 3, 4]);
        assert_eq!(f.row(3, 6), &[1; 6]);
    }

    #[test]
    fn lc_chunk_with_broken_counts_stays_in_bounds() {
        let mut f = Frame::new(4, 2);
        let payload = [
            1, 0, 200, 0, // 200 lines on a 2 line frame
            3, 200, 100, 1, 2, 3, // skip far past the row, long literal
            255, 0, 127, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10,
        ];
        decode_one(4, 2, &[chunk(12, &payload)], &mut f).unwrap();
        assert_eq!(f.pixels.len(), 8);
        assert_eq!(f.row(0, 4), &[0; 4]);
    }

    #[test]
    fn lc_literal_stops_at_buffer_end() {
        let mut f = Frame::new(4, 2);
        // Literal of 10 bytes starting on the last line.
        let mut payload = vec![1, 0, 1, 0, 1, 0, 10];
        payload.extend(1..=10);
        decode_one(4, 2, &[chunk(12, &payload)], &mut f).unwrap();
        assert_eq!(f.pixels, vec![0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn delta_chunk() {
        let mut f = Frame::new(5, 4);
        let mut payload = Vec::new();
        payload.extend_from_slice(&3u16.to_le_bytes()); // lines
        payload.extend_from_slice(&(-1i16).to_le_bytes()); // skip 1 line
        payload.extend_from_slice(&1i16.to_le_bytes()); // 1 packet
        payload.extend_from_slice(&[1, 1, 6, 7]); // skip 1, one literal pair
        payload.extend_from_slice(&(0x8000u16 | 0x2a).to_le_bytes()); // line 2 last pixel
        payload.extend_from_slice(&1i16.to_le_bytes()); // line 3: 1 packet
        payload.extend_from_slice(&[2, 0xfe, 3, 4]); // skip 2, pair repeated twice
        decode_one(5, 4, &[chunk(7, &payload)], &mut f).unwrap();
        assert_eq!(f.row(0, 5), &[0; 5]);
        assert_eq!(f.row(1, 5), &[0, 6, 7, 0, 0]);
        assert_eq!(f.row(2, 5), &[0, 0, 0, 0, 0x2a]);
        // Second pair clipped to the row width.
        assert_eq!(f.row(3, 5), &[0, 0, 3, 4, 3]);
    }

    #[test]
    fn delta_chunk_skipping_past_the_frame_stops() {
        let mut f = Frame::new(4, 2);
        let mut payload = Vec::new();
        payload.extend_from_slice(&2u16.to_le_bytes());
        payload.extend_from_slice(&(-300i16).to_le_bytes());
        payload.extend_from_slice(&1i16.to_le_bytes());
        payload.extend_from_slice(&[0, 2, 9, 9, 9, 9]);
        decode_one(4, 2, &[chunk(7, &payload)], &mut f).unwrap();
        assert!(f.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn unknown_chunk_and_declared_sizes() {
        let mut f = Frame::new(4, 1);
        for px in f.pixels.iter_mut() {
            *px = 5;
        }
        // Declared 5 bytes larger than what the color decoder consumes.
        let mut oversized = chunk(4, &[1, 0, 0, 1, 9, 9, 9]);
        oversized[0] += 5;
        oversized.extend_from_slice(&[0xee; 5]);
        // An LC chunk with no payload: its decoder reads 4 bytes of the
        // following chunk, then gets moved back to the declared end.
        let undersized = chunk(12, &[]);
        let chunks = [chunk(18, &[1, 2, 3, 4]), oversized, undersized, chunk(13, &[])];

        decode_one(4, 1, &chunks, &mut f).unwrap();
        assert_eq!(f.colormap[0], Color::new(9, 9, 9));
        assert_eq!(f.pixels, vec![0; 4]);
    }

    #[test]
    fn loop_anchor_is_followed() {
        let mut data = header(Format::FLC_MAGIC, 1, 2, 1, 100);
        // A junk record first, the real frame after it.
        data.extend_from_slice(&[0xab; 10]);
        let anchor = data.len() as u32;
        data[80..84].copy_from_slice(&anchor.to_le_bytes());
        data.extend_from_slice(&frame(&[chunk(15, &[1, 2, 6])]));

        let mut decoder = Decoder::new(MemoryStream::from(data));
        decoder.read_header().unwrap();
        let mut f = Frame::new(2, 1);
        decoder.read_frame(&mut f).unwrap();
        assert_eq!(f.pixels, vec![6, 6]);
    }

    #[test]
    fn truncated_frame_keeps_decoded_rows() {
        let mut data = header(Format::FLC_MAGIC, 1, 4, 4, 100);
        let fr = frame(&[chunk(15, &[1, 4, 3, 1, 4, 3, 1, 4, 3, 1, 4, 3])]);
        data.extend_from_slice(&fr[..fr.len() - 5]);

        let mut decoder = Decoder::new(MemoryStream::from(data));
        decoder.read_header().unwrap();
        let mut f = Frame::new(4, 4);
        decoder.read_frame(&mut f).unwrap();
        assert_eq!(decoder.current_frame_count(), 1);
        assert_eq!(f.row(0, 4), &[3; 4]);
        assert_eq!(f.row(1, 4), &[3; 4]);
    }

    #[test]
    fn oversized_chunk_is_not_an_error() {
        let mut data = header(Format::FLC_MAGIC, 1, 2, 1, 100);
        let mut fr = frame(&[chunk(15, &[1, 2, 6]), chunk(13, &[])]);
        // The second chunk claims 1000 bytes and the frame claims 3 chunks
        let second = fr.len() - ChunkHeader::SIZE;
        fr[second..second + 4].copy_from_slice(&1000u32.to_le_bytes());
        fr[6..8].copy_from_slice(&3u16.to_le_bytes());
        data.extend_from_slice(&fr);

        let mut decoder = Decoder::new(MemoryStream::from(data));
        decoder.read_header().unwrap();
        let mut f = Frame::new(2, 1);
        decoder.read_frame(&mut f).unwrap();
        assert_eq!(f.pixels, vec![0, 0]);
    }

    #[test]
    fn frames_resync_on_declared_size() {
        let mut data = header(Format::FLC_MAGIC, 4, 2, 1, 100);
        // Junk after the chunks of each frame, counted in the frame size
        for &(color, junk) in &[(5u8, 6usize), (7, 3)] {
            let mut fr = frame(&[chunk(15, &[1, 2, color])]);
            fr.extend_from_slice(&vec![0xaa; junk]);
            let size = fr.len() as u32;
            fr[..4].copy_from_slice(&size.to_le_bytes());
            data.extend_from_slice(&fr);
        }
        // Declares one chunk but no room for it, the next frame is read as
        // an unknown chunk and then decoded again as a frame
        let mut short = frame(&[]);
        short[6..8].copy_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&short);
        data.extend_from_slice(&frame(&[chunk(15, &[1, 2, 9])]));

        let mut decoder = Decoder::new(MemoryStream::from(data));
        decoder.read_header().unwrap();
        let mut f = Frame::new(2, 1);
        for expected in &[[5, 5], [7, 7], [7, 7], [9, 9]] {
            decoder.read_frame(&mut f).unwrap();
            assert_eq!(f.pixels, expected.to_vec());
        }
        assert_eq!(decoder.current_frame_count(), 4);
    }
}
