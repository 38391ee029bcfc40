//! Decodes a FLI/FLC animation and, given a second path, writes it back out
//! as FLC.
//!
//! Format reference: https://www.compuphase.com/flic.htm

use anyhow::{anyhow, Context};
use flic::{Decoder, Encoder, Frame, Header, IoStream};
use log::info;
use std::env;
use std::fs::{File, OpenOptions};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let input = args
        .next()
        .ok_or_else(|| anyhow!("usage: flic <input.flc> [output.flc]"))?;
    let output = args.next();

    let file = File::open(&input).with_context(|| format!("cannot open {}", input))?;
    let mut decoder = Decoder::new(IoStream::new(file));
    let header = decoder.read_header()?;
    info!(
        "{}: {}x{}, {} frames, {} ms per frame",
        input, header.width, header.height, header.frames, header.speed
    );

    let mut frame = Frame::new(header.width, header.height);
    let mut frames = Vec::with_capacity(header.frames as usize);
    for _ in 0..header.frames {
        decoder.read_frame(&mut frame)?;
        frames.push(frame.clone());
    }
    info!("Decoded {} frames", decoder.current_frame_count());

    let output = match output {
        Some(output) => output,
        None => return Ok(()),
    };

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&output)
        .with_context(|| format!("cannot create {}", output))?;
    let mut encoder = Encoder::new(IoStream::new(file));
    encoder.write_header(&Header {
        frames: frames.len() as u16,
        ..header
    });
    for frame in &frames {
        encoder.write_frame(frame)?;
    }
    if let Some(first) = frames.first() {
        encoder.write_ring_frame(first)?;
    }
    encoder.finish()?;
    info!("Wrote {}", output);

    Ok(())
}
