//! LSTF container parser
//!
//! Walks the chunk sequence, dispatches each recognised chunk to its
//! sub-parser and assembles a validated [`Program`]. Pad streams are decoded
//! only after the whole file has been scanned, so the palette and tempo map
//! are complete regardless of chunk order.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use crate::error::LstfError;
use crate::module::{Pad, Program};
use crate::palette::PaletteBuilder;
use crate::tempo::{TempoEvent, TempoMap};
use crate::text::normalise_bytes;
use crate::{CHUNK_HEADER_LEN, HEAD_MIN_LEN, LSTF_MAGIC, LSTF_VERSION, tags};

mod helpers;
mod pad;
mod tempo;

use helpers::{read_u16, read_u32};
use pad::decode_pad_stream;
use tempo::parse_tempo_chunk;

/// A raw chunk borrowed from the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub tag: [u8; 4],
    pub payload: &'a [u8],
}

impl Chunk<'_> {
    /// Tag as text (tags are validated as ASCII when read)
    pub fn tag_str(&self) -> &str {
        std::str::from_utf8(&self.tag).unwrap_or("????")
    }
}

/// Decoded HEAD chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LstfHeader {
    pub version: u16,
    pub ticks_per_beat: u16,
    pub microseconds_per_beat: u32,
    pub declared_track_count: u16,
    pub flags: u16,
}

/// Split `data` into chunks without interpreting their payloads
pub fn read_chunks(data: &[u8]) -> Result<Vec<Chunk<'_>>, LstfError> {
    let mut chunks = Vec::new();
    let mut offset = 0usize;

    while offset < data.len() {
        let Some(header) = data.get(offset..offset + CHUNK_HEADER_LEN) else {
            return Err(LstfError::TruncatedChunkHeader { offset });
        };
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&header[..4]);
        if !tag.is_ascii() {
            return Err(LstfError::NonAsciiTag(tag));
        }
        let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        offset += CHUNK_HEADER_LEN;

        let remaining = data.len() - offset;
        if length as usize > remaining {
            return Err(LstfError::ChunkOverrun {
                tag: String::from_utf8_lossy(&tag).into_owned(),
                length,
                remaining,
            });
        }
        let payload = &data[offset..offset + length as usize];
        offset += length as usize;

        chunks.push(Chunk { tag, payload });
    }

    Ok(chunks)
}

/// Parse and validate a HEAD payload
pub fn parse_header(payload: &[u8]) -> Result<LstfHeader, LstfError> {
    if payload.len() < HEAD_MIN_LEN {
        return Err(LstfError::HeaderTooSmall(payload.len()));
    }
    let mut cursor = Cursor::new(payload);

    let magic = read_u32(&mut cursor, "HEAD magic")?;
    if magic != LSTF_MAGIC {
        return Err(LstfError::InvalidMagic(magic));
    }
    let version = read_u16(&mut cursor, "HEAD version")?;
    if version != LSTF_VERSION {
        return Err(LstfError::UnsupportedVersion(version));
    }
    let ticks_per_beat = read_u16(&mut cursor, "HEAD ticks per beat")?;
    if ticks_per_beat == 0 {
        return Err(LstfError::InvalidTimebase);
    }
    let microseconds_per_beat = read_u32(&mut cursor, "HEAD tempo")?;
    if microseconds_per_beat == 0 {
        return Err(LstfError::InvalidTempo);
    }
    let declared_track_count = read_u16(&mut cursor, "HEAD track count")?;
    if declared_track_count == 0 {
        debug!("HEAD chunk declared zero tracks; continuing regardless");
    }
    let flags = read_u16(&mut cursor, "HEAD flags")?;

    Ok(LstfHeader {
        version,
        ticks_per_beat,
        microseconds_per_beat,
        declared_track_count,
        flags,
    })
}

/// Parse a binary LSTF buffer into a [`Program`]
///
/// # Returns
/// * `Ok(Program)` - Program with every pad that decoded at least one command
/// * `Err(LstfError)` - Any malformed input; there is no partial result
pub fn parse_lstf(data: &[u8]) -> Result<Program, LstfError> {
    let mut header = None;
    let mut tempo_events: Vec<TempoEvent> = Vec::new();
    let mut palette = PaletteBuilder::new();
    let mut pad_chunks: BTreeMap<Pad, Vec<&[u8]>> = BTreeMap::new();

    for chunk in read_chunks(data)? {
        match &chunk.tag {
            tag if tag == tags::HEAD => {
                if header.is_some() {
                    return Err(LstfError::DuplicateHeader);
                }
                header = Some(parse_header(chunk.payload)?);
            }
            tag if tag == tags::TEMP => {
                tempo_events.extend(parse_tempo_chunk(chunk.payload)?);
            }
            tag if tag == tags::PAL0 => palette.apply_chunk(chunk.payload)?,
            [b'P', b'A', b'D', digit] => {
                let pad = digit.checked_sub(b'0').and_then(Pad::from_chunk_index);
                match pad {
                    Some(pad) => pad_chunks.entry(pad).or_default().push(chunk.payload),
                    None => debug!("Ignoring unsupported pad chunk {}", chunk.tag_str()),
                }
            }
            _ => debug!("Skipping unrecognised LSTF chunk {}", chunk.tag_str()),
        }
    }

    let header = header.ok_or(LstfError::MissingHeader)?;
    let tempo = TempoMap::new(
        header.ticks_per_beat,
        header.microseconds_per_beat,
        &tempo_events,
    )?;
    let palette = palette.build();

    let mut tracks = BTreeMap::new();
    for (pad, chunks) in &pad_chunks {
        let track = decode_pad_stream(*pad, chunks, &tempo, &palette)?;
        if track.is_empty() {
            debug!("Pad {} decoded no commands", pad);
            continue;
        }
        tracks.insert(*pad, track);
    }

    if tracks.is_empty() {
        return Err(LstfError::NoPadTracks);
    }

    Ok(Program::new(tracks))
}

/// Read a track file, unwrap a text envelope if present and parse it
pub fn load_lstf(path: impl AsRef<Path>) -> Result<Program, LstfError> {
    let raw = std::fs::read(path.as_ref())?;
    let data = normalise_bytes(&raw)?;
    parse_lstf(&data)
}
