use crate::runs::{
    count_consecutive_values, count_max_consecutive_equal_values, count_max_consecutive_values,
};
use crate::{ByteStream, ChunkType, Colormap, FlicError, Format, Frame, FrameHeader, Header};
use log::{debug, info, trace, warn};

/// Sequential FLC writer.
///
/// The first frame is stored with a full colormap and a BRUN chunk, every
/// following frame as an LC delta against the previous one, plus a colormap
/// chunk when the palette changed. Call [`Encoder::finish`] at the end to
/// patch the file header.
pub struct Encoder<S> {
    file: S,
    width: u16,
    height: u16,
    header_written: bool,
    prev_colormap: Colormap,
    // Previous frame pixels, `width * height` without row padding
    prev_frame: Vec<u8>,
    frame_count: usize,
    offset_frame1: usize,
    offset_frame2: usize,
}

impl<S: ByteStream> Encoder<S> {
    pub fn new(file: S) -> Self {
        Self {
            file,
            width: 0,
            height: 0,
            header_written: false,
            prev_colormap: Colormap::default(),
            prev_frame: Vec::new(),
            frame_count: 0,
            offset_frame1: 0,
            offset_frame2: 0,
        }
    }

    pub fn current_frame_count(&self) -> usize {
        self.frame_count
    }

    /// Writes the fixed part of the header. File size, magic and frame
    /// count stay zero until [`Encoder::finish`].
    pub fn write_header(&mut self, header: &Header) {
        debug_assert!(header.width > 0 && header.height > 0);
        self.width = header.width;
        self.height = header.height;

        self.file.write32(0); // File size
        self.file.write16(0); // File type
        self.file.write16(0); // Number of frames
        self.file.write16(header.width);
        self.file.write16(header.height);
        self.file.write16(Header::DEPTH);
        self.file.write16(0); // Flags
        self.file.write32(header.speed);
        self.file.seek(Header::SIZE);

        self.header_written = true;
        info!("Wrote the FLIC header");
        debug!("Header: {:?}", header);
    }

    /// Appends `frame`, delta-encoded against the previous one.
    ///
    /// An LC line holds at most 255 packets. A wide line with scattered
    /// changes can need more, in which case the count is capped, a warning
    /// is logged and the line no longer decodes back exactly.
    pub fn write_frame(&mut self, frame: &Frame) -> anyhow::Result<()> {
        if !self.header_written {
            return Err(FlicError::MissingHeader.into());
        }
        frame.check_size(self.width, self.height)?;

        let frame_start = self.file.tell();
        match self.frame_count {
            0 => self.offset_frame1 = frame_start,
            1 => self.offset_frame2 = frame_start,
            _ => {}
        }

        // Patched below once the chunks are known
        self.file.write32(0);
        self.file.write16(0);
        self.file.write16(0);
        for _ in 0..FrameHeader::RESERVED {
            self.file.write8(0);
        }

        let mut nchunks = 0u16;
        if self.frame_count == 0 || self.prev_colormap != frame.colormap {
            self.write_color_chunk(frame);
            nchunks += 1;
        }

        if self.frame_count == 0 {
            self.write_brun_chunk(frame);
            nchunks += 1;

            let width = self.width as usize;
            self.prev_frame.clear();
            for y in 0..self.height as usize {
                self.prev_frame.extend_from_slice(frame.row(y, width));
            }
        } else {
            self.write_lc_chunk(frame);
            nchunks += 1;
        }

        let frame_end = self.pad_to_even(frame_start);
        self.file.seek(frame_start);
        self.file.write32((frame_end - frame_start) as u32);
        self.file.write16(FrameHeader::MAGIC);
        self.file.write16(nchunks);
        self.file.seek(frame_end);

        info!(
            "Wrote frame {}: {} bytes, {} chunks",
            self.frame_count,
            frame_end - frame_start,
            nchunks
        );
        self.frame_count += 1;
        Ok(())
    }

    /// Writes `frame` (normally the first one again) so players can loop
    /// from the last frame back to the start. It is stored in the file but
    /// not counted in the header.
    pub fn write_ring_frame(&mut self, frame: &Frame) -> anyhow::Result<()> {
        self.write_frame(frame)?;
        self.frame_count -= 1;
        Ok(())
    }

    /// Patches file size, magic, frame count and loop offsets into the
    /// header and hands the stream back.
    ///
    /// Fails with [`FlicError::StreamUnavailable`] when the stream can no
    /// longer be written, leaving the header as placeholders.
    pub fn finish(mut self) -> anyhow::Result<S> {
        if !self.file.ok() {
            warn!("stream is not writable, skipping the header update");
            return Err(FlicError::StreamUnavailable.into());
        }

        let size = self.file.tell();
        self.file.seek(0);
        self.file.write32(size as u32);
        self.file.write16(Format::Flc.magic());
        self.file.write16(self.frame_count as u16);

        self.file.seek(Header::OFFSETS_POS);
        self.file.write32(self.offset_frame1 as u32);
        self.file.write32(self.offset_frame2 as u32);
        self.file.seek(size);

        if !self.file.ok() {
            return Err(FlicError::StreamUnavailable.into());
        }
        info!(
            "Finished FLIC file: {} frames, {} bytes",
            self.frame_count, size
        );
        Ok(self.file)
    }

    // Pads the record started at `start` to an even length, returns its end.
    fn pad_to_even(&mut self, start: usize) -> usize {
        let mut end = self.file.tell();
        if (end - start) & 1 != 0 {
            self.file.write8(0);
            end += 1;
        }
        end
    }

    fn begin_chunk(&mut self) -> usize {
        let chunk_start = self.file.tell();
        self.file.write32(0); // Chunk size, patched by end_chunk()
        self.file.write16(0);
        chunk_start
    }

    fn end_chunk(&mut self, chunk_start: usize, chunk_type: ChunkType) {
        let chunk_end = self.pad_to_even(chunk_start);
        self.file.seek(chunk_start);
        self.file.write32((chunk_end - chunk_start) as u32);
        self.file.write16(chunk_type.tag());
        self.file.seek(chunk_end);

        let name: &'static str = (&chunk_type).into();
        debug!("Wrote {} chunk, {} bytes", name, chunk_end - chunk_start);
    }

    fn write_color_chunk(&mut self, frame: &Frame) {
        let chunk_start = self.begin_chunk();
        let npackets_pos = self.file.tell();
        self.file.write16(0);

        let full = self.frame_count == 0;
        let mut npackets = 0u16;
        let mut skip = 0;
        let mut i = 0;
        while i < Colormap::SIZE {
            if !full && self.prev_colormap[i] == frame.colormap[i] {
                skip += 1;
                i += 1;
                continue;
            }

            let ncolors = if full {
                Colormap::SIZE
            } else {
                (i..Colormap::SIZE)
                    .take_while(|&j| self.prev_colormap[j] != frame.colormap[j])
                    .count()
            };
            debug_assert!(ncolors > 0 && skip <= 255);
            trace!("Color packet: skip {}, {} colors", skip, ncolors);

            npackets += 1;
            self.file.write8(skip as u8);
            // 0 means 256 colors
            self.file.write8(if ncolors == Colormap::SIZE { 0 } else { ncolors as u8 });
            for j in i..i + ncolors {
                let c = frame.colormap[j];
                self.file.write8(c.r);
                self.file.write8(c.g);
                self.file.write8(c.b);
            }

            i += ncolors;
            skip = 0;
        }
        debug_assert!(npackets > 0);

        let restore = self.file.tell();
        self.file.seek(npackets_pos);
        self.file.write16(npackets);
        self.file.seek(restore);
        self.end_chunk(chunk_start, ChunkType::Color256);

        self.prev_colormap = frame.colormap.clone();
    }

    fn write_brun_chunk(&mut self, frame: &Frame) {
        let width = self.width as usize;
        let chunk_start = self.begin_chunk();
        for y in 0..self.height as usize {
            self.write_brun_line(frame.row(y, width));
        }
        self.end_chunk(chunk_start, ChunkType::Brun);
    }

    fn write_brun_line(&mut self, line: &[u8]) {
        let npackets_pos = self.file.tell();
        self.file.write8(0); // Number of packets, patched below
        let mut npackets = 0usize;

        let mut x = 0;
        while x < line.len() {
            let rest = &line[x..];

            // Up to 127 equal pixels in one packet
            let same = count_consecutive_values(rest).min(127);
            if same >= 4 {
                self.file.write8(same as u8);
                self.file.write8(rest[0]);
                x += same;
            } else {
                // Up to 128 literal pixels, cut short where a long enough
                // run starts so it gets its own packet
                let mut len = rest.len().min(128);
                let (max_same, max_start) = count_max_consecutive_values(rest);
                if max_same >= 4 && len > max_start {
                    len = max_start;
                }
                debug_assert!(len > 0);

                self.file.write8((-(len as i16)) as u8);
                for &px in &rest[..len] {
                    self.file.write8(px);
                }
                x += len;
            }
            npackets += 1;
        }

        let restore = self.file.tell();
        self.file.seek(npackets_pos);
        self.file.write8(npackets.min(255) as u8);
        self.file.seek(restore);
    }

    fn write_lc_chunk(&mut self, frame: &Frame) {
        let width = self.width as usize;
        let height = self.height as usize;

        let (skip_lines, nlines) = {
            let prev = &self.prev_frame;
            let unchanged = |y: usize| frame.row(y, width) == &prev[y * width..(y + 1) * width];
            let skip_lines = (0..height).take_while(|&y| unchanged(y)).count();
            let skip_end_lines = (skip_lines + 1..height)
                .rev()
                .take_while(|&y| unchanged(y))
                .count();
            (skip_lines, height - skip_lines - skip_end_lines)
        };
        trace!("LC lines: skip {}, encode {}", skip_lines, nlines);

        let chunk_start = self.begin_chunk();
        self.file.write16(skip_lines as u16);
        self.file.write16(nlines as u16);

        for y in skip_lines..skip_lines + nlines {
            self.write_lc_line(frame.row(y, width), y);
            self.prev_frame[y * width..(y + 1) * width].copy_from_slice(frame.row(y, width));
        }

        self.end_chunk(chunk_start, ChunkType::LineChange);
    }

    fn write_lc_line(&mut self, cur: &[u8], y: usize) {
        let width = cur.len();
        let prev = &self.prev_frame[y * width..(y + 1) * width];

        let npackets_pos = self.file.tell();
        self.file.write8(0); // Number of packets, patched below
        let mut npackets = 0usize;
        let mut skip = 0usize;

        let mut x = 0;
        while x < width {
            if prev[x] == cur[x] {
                skip += 1;
                x += 1;
                continue;
            }

            // Empty packets to skip 255 pixels equal to the previous frame
            while skip > 255 {
                npackets += 1;
                self.file.write8(255);
                self.file.write8(0);
                skip -= 255;
            }

            npackets += 1;
            self.file.write8(skip as u8);
            skip = 0;

            // Stop before a long strip that matches the previous frame, the
            // next packet can skip over it
            let mut window = (width - x).min(128);
            let (unchanged, unchanged_start) =
                count_max_consecutive_equal_values(&prev[x..x + window], &cur[x..x + window]);
            if unchanged > 4 && window > unchanged_start {
                window = unchanged_start;
            }
            let run = &cur[x..x + window];

            // Up to 128 equal pixels in one packet
            let same = count_consecutive_values(run).min(128);
            if same >= 4 {
                self.file.write8((-(same as i16)) as u8);
                self.file.write8(run[0]);
                x += same;
            } else {
                let mut len = window.min(127);
                let (max_same, max_start) = count_max_consecutive_values(run);
                if max_same >= 4 && len > max_start {
                    len = max_start;
                }
                debug_assert!(len > 0);

                self.file.write8(len as u8);
                for &px in &run[..len] {
                    self.file.write8(px);
                }
                x += len;
            }
        }

        if npackets > 0 {
            if npackets > 255 {
                warn!(
                    "LC line {} needs {} packets, only 255 can be recorded",
                    y, npackets
                );
            }
            let restore = self.file.tell();
            self.file.seek(npackets_pos);
            self.file.write8(npackets.min(255) as u8);
            self.file.seek(restore);
        }
    }
}
