//! Toypad-LSTF: Light Show Track Format parser and writer
//!
//! This crate decodes LSTF tracks into immutable [`Program`]s that describe,
//! per light pad, a looping sequence of timed colour commands. It is pure and
//! synchronous: parsing never blocks, and a decoded program can be shared
//! read-only between any number of playback workers.
//!
//! # Key Features
//!
//! - **Chunked container**: tagged, length-prefixed chunks; unknown tags are skipped
//! - **Tempo mapping**: piecewise-linear tick to seconds conversion with tempo
//!   and timebase changes
//! - **Palette**: 32-entry default table with an optional override chunk
//! - **Text envelope**: transparent support for the `LSTF-TEXT` base64 wrapper
//! - **Writer**: build LSTF tracks programmatically
//!
//! # LSTF Format Overview
//!
//! An LSTF file is a sequence of chunks, each `tag (4 ASCII bytes)`,
//! `length (u32 LE)` and `payload`:
//! - `HEAD` - magic, version, timebase, initial tempo (required)
//! - `TEMP` - delta-encoded tempo and timebase changes
//! - `PAL0` - palette overrides
//! - `PAD0`/`PAD1`/`PAD2` - delta-encoded opcode streams for the centre,
//!   left and right pads
//!
//! # Usage
//!
//! ```ignore
//! use toypad_lstf::{load_lstf, Pad};
//!
//! let program = load_lstf("tracks/aurora.lstf")?;
//! for (pad, track) in program.tracks() {
//!     println!("{pad}: {} commands, loops every {:.2}s", track.len(), track.duration());
//! }
//! ```

mod error;
mod module;
mod palette;
mod parser;
mod tempo;
mod text;
mod writer;

pub use error::{ErrorKind, LstfError};
pub use module::{Pad, PadCommand, PadTrack, Program, Rgb, seconds_to_units};
pub use palette::{DEFAULT_PALETTE, PALETTE_SIZE, Palette, PaletteBuilder};
pub use parser::{Chunk, LstfHeader, load_lstf, parse_header, parse_lstf, read_chunks};
pub use tempo::{TempoChange, TempoEvent, TempoMap, TempoSegment};
pub use text::{TEXT_HEADER, decode_text, encode_text, normalise_bytes};
pub use writer::{ColourSpec, LstfWriter, PadStreamBuilder, write_varint};

// =============================================================================
// Constants
// =============================================================================

/// HEAD magic value, read as a little-endian u32 (bytes `46 54 53 4C` on disk)
pub const LSTF_MAGIC: u32 = 0x4C53_5446;

/// LSTF container version we support
pub const LSTF_VERSION: u16 = 1;

/// Minimum HEAD payload length in bytes
pub const HEAD_MIN_LEN: usize = 16;

/// Length of a chunk header (tag + payload length)
pub const CHUNK_HEADER_LEN: usize = 8;

/// Largest varint shift accepted before the value is considered malformed
pub const MAX_VARINT_SHIFT: u32 = 28;

/// Seconds represented by one actuator timing unit
pub const ACTUATOR_UNIT_SECONDS: f64 = 0.01;

/// Shortest loop period a pad track may have, in seconds
pub const MIN_TRACK_DURATION: f64 = 0.01;

/// Transition value in SwitchColour meaning "use the default transition"
pub const USE_DEFAULT_TRANSITION: u16 = 0xFFFF;

/// Chunk tags
pub mod tags {
    /// Header chunk
    pub const HEAD: &[u8; 4] = b"HEAD";
    /// Tempo change stream
    pub const TEMP: &[u8; 4] = b"TEMP";
    /// Palette override table
    pub const PAL0: &[u8; 4] = b"PAL0";
    /// Prefix shared by the per-pad event streams (`PAD0`..`PAD2`)
    pub const PAD_PREFIX: &[u8; 3] = b"PAD";
}

/// Opcodes found in `TEMP` chunks
pub mod tempo_opcodes {
    /// Set tempo, payload `u32` microseconds per beat
    pub const SET_TEMPO: u8 = 0x01;
    /// Set timebase, payload `u16` ticks per beat
    pub const SET_TIMEBASE: u8 = 0x02;
}

/// Opcodes found in `PADn` chunks
pub mod pad_opcodes {
    /// `transition:u16, colour, hold:u16`
    pub const SWITCH_COLOUR: u8 = 0x10;
    /// `ramp:u16, pulses:u8, colour, hold:u16`
    pub const FADE_TO_COLOUR: u8 = 0x11;
    /// `on:u16, off:u16, pulses:u8, colour, hold:u16`
    pub const FLASH_COLOUR: u8 = 0x12;
    /// `transition:u16, hold:u16`
    pub const BLACKOUT: u8 = 0x13;
    /// `transition:u16`
    pub const SET_DEFAULT_TRANSITION: u8 = 0x14;
    /// Reserved, one byte payload
    pub const KEYFRAME_STATE: u8 = 0x1F;
}

/// Colour mode byte layout
pub mod colour_mode {
    /// Set when a literal RGB triple follows the mode byte
    pub const LITERAL: u8 = 0x20;
    /// Palette index bits
    pub const INDEX_MASK: u8 = 0x1F;
}

// =============================================================================
// Tests
// =============================================================================
