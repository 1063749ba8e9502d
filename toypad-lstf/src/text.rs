//! `LSTF-TEXT` envelope
//!
//! Tracks kept under version control are stored as ASCII: a `LSTF-TEXT 1`
//! header line followed by the base64 encoded binary container. Blank lines
//! and lines starting with `#` are ignored.

use std::borrow::Cow;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::LstfError;

/// Header line of the text envelope
pub const TEXT_HEADER: &str = "LSTF-TEXT 1";

const TEXT_PREFIX: &str = "LSTF-TEXT";
const TEXT_VERSION: &str = "1";
const LINE_WIDTH: usize = 76;

/// Return the binary container, unwrapping a text envelope when present
pub fn normalise_bytes(data: &[u8]) -> Result<Cow<'_, [u8]>, LstfError> {
    if data.starts_with(TEXT_PREFIX.as_bytes()) {
        Ok(Cow::Owned(decode_text(data)?))
    } else {
        Ok(Cow::Borrowed(data))
    }
}

/// Decode a text envelope into the binary container
pub fn decode_text(data: &[u8]) -> Result<Vec<u8>, LstfError> {
    if !data.is_ascii() {
        return Err(LstfError::TextEnvelope("text-encoded LSTF files must be ASCII"));
    }
    let text = String::from_utf8_lossy(data);

    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let Some(header) = lines.next() else {
        return Err(LstfError::TextEnvelope("file is empty"));
    };

    let fields: Vec<&str> = header.split_whitespace().collect();
    match fields.as_slice() {
        [TEXT_PREFIX, TEXT_VERSION] => {}
        [TEXT_PREFIX, version] => {
            return Err(LstfError::UnsupportedTextVersion((*version).to_string()));
        }
        _ => return Err(LstfError::TextEnvelope("missing LSTF-TEXT header")),
    }

    let payload: String = lines.filter(|line| !line.starts_with('#')).collect();
    if payload.is_empty() {
        return Err(LstfError::TextEnvelope("no payload data"));
    }

    Ok(STANDARD.decode(payload)?)
}

/// Wrap a binary container in a text envelope (76-column base64 lines)
pub fn encode_text(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 16);
    out.push_str(TEXT_HEADER);
    out.push('\n');
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        // base64 output is ASCII
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out
}
