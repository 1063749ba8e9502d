//! TEMP chunk decoding

use std::io::Cursor;

use super::helpers::{at_end, read_u8, read_u16, read_u32, read_varint};
use crate::error::LstfError;
use crate::tempo::{TempoChange, TempoEvent};
use crate::tempo_opcodes;

/// Decode a `TEMP` payload into absolute-tick tempo events
///
/// Each chunk's delta stream starts from tick 0.
pub(crate) fn parse_tempo_chunk(payload: &[u8]) -> Result<Vec<TempoEvent>, LstfError> {
    let mut cursor = Cursor::new(payload);
    let mut events = Vec::new();
    let mut tick = 0i64;

    while !at_end(&cursor) {
        tick += read_varint(&mut cursor)? as i64;
        let opcode = read_u8(&mut cursor, "tempo event opcode")?;
        let change = match opcode {
            tempo_opcodes::SET_TEMPO => {
                TempoChange::SetTempo(read_u32(&mut cursor, "SetTempo payload")?)
            }
            tempo_opcodes::SET_TIMEBASE => {
                TempoChange::SetTimebase(read_u16(&mut cursor, "SetTimebase payload")?)
            }
            other => return Err(LstfError::UnsupportedTempoOpcode(other)),
        };
        events.push(TempoEvent::new(tick, change));
    }

    Ok(events)
}
