//! Error types for LSTF parsing and writing

use std::io;

use crate::module::Pad;

/// Broad category of an [`LstfError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or truncated binary input
    Format,
    /// Caller-level contract violation
    InvalidInput,
    /// Should be unreachable; indicates a bug
    Internal,
    /// Failure reading the track from disk
    Io,
}

/// Errors that can occur when parsing or writing LSTF tracks
#[derive(Debug, thiserror::Error)]
pub enum LstfError {
    #[error("Unexpected end of data while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("Variable-length integer is too large")]
    VarintTooLarge,

    #[error("Chunk tag {0:02X?} is not ASCII")]
    NonAsciiTag([u8; 4]),

    #[error("Unexpected end of file while reading chunk header at offset {offset}")]
    TruncatedChunkHeader { offset: usize },

    #[error("Chunk '{tag}' exceeds file length ({length} bytes declared, {remaining} available)")]
    ChunkOverrun {
        tag: String,
        length: u32,
        remaining: usize,
    },

    #[error("HEAD chunk must contain at least 16 bytes, found {0}")]
    HeaderTooSmall(usize),

    #[error("Invalid LSTF magic value 0x{0:08X}")]
    InvalidMagic(u32),

    #[error("Unsupported LSTF version {0}")]
    UnsupportedVersion(u16),

    #[error("ticks_per_beat must be positive")]
    InvalidTimebase,

    #[error("Initial tempo must be positive")]
    InvalidTempo,

    #[error("LSTF file contains more than one HEAD chunk")]
    DuplicateHeader,

    #[error("LSTF file missing HEAD chunk")]
    MissingHeader,

    #[error("LSTF file did not contain any pad tracks")]
    NoPadTracks,

    #[error("Unsupported tempo opcode 0x{0:02X}")]
    UnsupportedTempoOpcode(u8),

    #[error("Unsupported pad opcode 0x{opcode:02X} in {pad} track")]
    UnsupportedPadOpcode { pad: Pad, opcode: u8 },

    #[error("Palette index {0} out of range")]
    PaletteIndexOutOfRange(u8),

    #[error("Invalid LSTF-TEXT envelope: {0}")]
    TextEnvelope(&'static str),

    #[error("Unsupported LSTF-TEXT version '{0}'")]
    UnsupportedTextVersion(String),

    #[error("Invalid base64 payload in LSTF-TEXT envelope: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl LstfError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Io(_) => ErrorKind::Io,
            _ => ErrorKind::Format,
        }
    }

    /// True for malformed or truncated input
    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }
}
