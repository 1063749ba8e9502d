//! Helper functions for reading binary data

use std::io::{Cursor, Read};

use crate::MAX_VARINT_SHIFT;
use crate::error::LstfError;

/// Read a single byte
pub(crate) fn read_u8(cursor: &mut Cursor<&[u8]>, what: &'static str) -> Result<u8, LstfError> {
    let mut buf = [0u8; 1];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| LstfError::UnexpectedEof(what))?;
    Ok(buf[0])
}

/// Read a 16-bit little-endian integer
pub(crate) fn read_u16(cursor: &mut Cursor<&[u8]>, what: &'static str) -> Result<u16, LstfError> {
    let mut buf = [0u8; 2];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| LstfError::UnexpectedEof(what))?;
    Ok(u16::from_le_bytes(buf))
}

/// Read a 32-bit little-endian integer
pub(crate) fn read_u32(cursor: &mut Cursor<&[u8]>, what: &'static str) -> Result<u32, LstfError> {
    let mut buf = [0u8; 4];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| LstfError::UnexpectedEof(what))?;
    Ok(u32::from_le_bytes(buf))
}

/// Read an LEB128-style unsigned varint (7 bits per byte, high bit continues)
pub(crate) fn read_varint(cursor: &mut Cursor<&[u8]>) -> Result<u64, LstfError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = read_u8(cursor, "variable-length integer")?;
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > MAX_VARINT_SHIFT {
            return Err(LstfError::VarintTooLarge);
        }
    }
}

/// True when the cursor has consumed the whole buffer
pub(crate) fn at_end(cursor: &Cursor<&[u8]>) -> bool {
    cursor.position() as usize >= cursor.get_ref().len()
}
