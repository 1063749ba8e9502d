//! Colour palette used to resolve palette-indexed colours

use tracing::debug;

use crate::error::LstfError;
use crate::module::Rgb;

/// Number of palette entries
pub const PALETTE_SIZE: usize = 32;

/// Palette used when a track carries no `PAL0` override
pub const DEFAULT_PALETTE: [Rgb; PALETTE_SIZE] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0xFF, 0xFF, 0xFF),
    Rgb::new(0xFF, 0xD8, 0xB0),
    Rgb::new(0xD6, 0xF0, 0xFF),
    Rgb::new(0xFF, 0x00, 0x00),
    Rgb::new(0xFF, 0x33, 0x00),
    Rgb::new(0xFF, 0x66, 0x00),
    Rgb::new(0xFF, 0x99, 0x00),
    Rgb::new(0xFF, 0xCC, 0x00),
    Rgb::new(0xFF, 0xFF, 0x00),
    Rgb::new(0xCC, 0xFF, 0x00),
    Rgb::new(0x99, 0xFF, 0x00),
    Rgb::new(0x66, 0xFF, 0x00),
    Rgb::new(0x33, 0xFF, 0x00),
    Rgb::new(0x00, 0xFF, 0x00),
    Rgb::new(0x00, 0xFF, 0x66),
    Rgb::new(0x00, 0xFF, 0xCC),
    Rgb::new(0x00, 0xFF, 0xFF),
    Rgb::new(0x00, 0xCC, 0xFF),
    Rgb::new(0x00, 0x99, 0xFF),
    Rgb::new(0x00, 0x66, 0xFF),
    Rgb::new(0x00, 0x33, 0xFF),
    Rgb::new(0x00, 0x00, 0xFF),
    Rgb::new(0x33, 0x00, 0xFF),
    Rgb::new(0x66, 0x00, 0xFF),
    Rgb::new(0x99, 0x00, 0xFF),
    Rgb::new(0xCC, 0x00, 0xFF),
    Rgb::new(0xFF, 0x00, 0xFF),
    Rgb::new(0xFF, 0x00, 0x99),
    Rgb::new(0xFF, 0x00, 0x66),
    Rgb::new(0xFF, 0x00, 0x33),
    Rgb::new(0xFF, 0x19, 0x19),
];

/// Frozen palette table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    entries: [Rgb; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: DEFAULT_PALETTE,
        }
    }
}

impl Palette {
    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.entries.get(index as usize).copied()
    }

    /// Look up `index`, failing for indices past the end of the table
    pub fn resolve(&self, index: u8) -> Result<Rgb, LstfError> {
        self.get(index).ok_or(LstfError::PaletteIndexOutOfRange(index))
    }

    pub fn entries(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.entries
    }
}

/// Builds a [`Palette`] from the default table plus at most one override chunk
#[derive(Debug, Clone)]
pub struct PaletteBuilder {
    entries: [Rgb; PALETTE_SIZE],
    overridden: bool,
}

impl Default for PaletteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteBuilder {
    pub fn new() -> Self {
        Self {
            entries: DEFAULT_PALETTE,
            overridden: false,
        }
    }

    /// Apply a `PAL0` payload: `count:u8` then `count` records of
    /// `(index, r, g, b)`. Out-of-range indices are ignored.
    ///
    /// Only the first override chunk is applied; later ones are skipped.
    pub fn apply_chunk(&mut self, payload: &[u8]) -> Result<(), LstfError> {
        if self.overridden {
            debug!("Ignoring additional PAL0 chunk");
            return Ok(());
        }
        self.overridden = true;

        let Some((&count, records)) = payload.split_first() else {
            return Ok(());
        };
        let needed = count as usize * 4;
        if records.len() < needed {
            return Err(LstfError::UnexpectedEof("palette override entry"));
        }

        for record in records[..needed].chunks_exact(4) {
            let index = record[0] as usize;
            match self.entries.get_mut(index) {
                Some(entry) => *entry = Rgb::new(record[1], record[2], record[3]),
                None => debug!("Ignoring palette override for index {}", index),
            }
        }
        Ok(())
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub fn build(self) -> Palette {
        Palette {
            entries: self.entries,
        }
    }
}
