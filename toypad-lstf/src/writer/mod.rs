//! LSTF file writer
//!
//! Builds binary LSTF containers from high-level pad events. The output is
//! accepted by [`parse_lstf`](crate::parse_lstf) and is what the demo track
//! generator uses.

use std::collections::BTreeMap;

use crate::error::LstfError;
use crate::module::{Pad, Rgb};
use crate::palette::PALETTE_SIZE;
use crate::tempo::TempoChange;
use crate::{LSTF_MAGIC, LSTF_VERSION, colour_mode, pad_opcodes, tags, tempo_opcodes};


/// Append `value` as an LEB128-style varint
pub fn write_varint(output: &mut Vec<u8>, value: u64) {
    let mut remaining = value;
    loop {
        let byte = (remaining & 0x7F) as u8;
        remaining >>= 7;
        if remaining == 0 {
            output.push(byte);
            return;
        }
        output.push(byte | 0x80);
    }
}

/// Append a chunk header and payload
fn write_chunk(output: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    output.extend_from_slice(tag);
    output.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    output.extend_from_slice(payload);
}

/// Colour reference in a pad event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourSpec {
    /// Palette index (0..32)
    Palette(u8),
    /// Literal colour
    Rgb(Rgb),
}

impl ColourSpec {
    fn encode(self, output: &mut Vec<u8>) -> Result<(), LstfError> {
        match self {
            ColourSpec::Palette(index) if (index as usize) < PALETTE_SIZE => {
                output.push(index & colour_mode::INDEX_MASK);
                Ok(())
            }
            ColourSpec::Palette(index) => Err(LstfError::InvalidInput(format!(
                "palette index {} must be in range 0-{}",
                index,
                PALETTE_SIZE - 1
            ))),
            ColourSpec::Rgb(colour) => {
                output.extend_from_slice(&[
                    colour_mode::LITERAL,
                    colour.red,
                    colour.green,
                    colour.blue,
                ]);
                Ok(())
            }
        }
    }
}

impl From<Rgb> for ColourSpec {
    fn from(colour: Rgb) -> Self {
        ColourSpec::Rgb(colour)
    }
}

#[derive(Debug, Clone)]
struct PadEvent {
    tick: u32,
    opcode: u8,
    payload: Vec<u8>,
}

/// Collects events for one pad and encodes them as a `PADn` payload
///
/// Events may be added in any order; they are emitted sorted by tick, with
/// equal ticks kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PadStreamBuilder {
    events: Vec<PadEvent>,
}

impl PadStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, tick: u32, opcode: u8, payload: Vec<u8>) -> &mut Self {
        self.events.push(PadEvent {
            tick,
            opcode,
            payload,
        });
        self
    }

    /// SetDefaultTransition (0x14)
    pub fn set_default_transition(&mut self, tick: u32, transition: u16) -> &mut Self {
        self.push(
            tick,
            pad_opcodes::SET_DEFAULT_TRANSITION,
            transition.to_le_bytes().to_vec(),
        )
    }

    /// SwitchColour (0x10). Pass [`USE_DEFAULT_TRANSITION`](crate::USE_DEFAULT_TRANSITION)
    /// as `transition` to use the pad's default transition.
    pub fn switch_colour(
        &mut self,
        tick: u32,
        colour: impl Into<ColourSpec>,
        transition: u16,
        hold: u16,
    ) -> Result<&mut Self, LstfError> {
        let mut payload = transition.to_le_bytes().to_vec();
        colour.into().encode(&mut payload)?;
        payload.extend_from_slice(&hold.to_le_bytes());
        Ok(self.push(tick, pad_opcodes::SWITCH_COLOUR, payload))
    }

    /// FadeToColour (0x11)
    pub fn fade_to_colour(
        &mut self,
        tick: u32,
        colour: impl Into<ColourSpec>,
        ramp: u16,
        pulses: u8,
        hold: u16,
    ) -> Result<&mut Self, LstfError> {
        let mut payload = ramp.to_le_bytes().to_vec();
        payload.push(pulses);
        colour.into().encode(&mut payload)?;
        payload.extend_from_slice(&hold.to_le_bytes());
        Ok(self.push(tick, pad_opcodes::FADE_TO_COLOUR, payload))
    }

    /// FlashColour (0x12)
    pub fn flash_colour(
        &mut self,
        tick: u32,
        colour: impl Into<ColourSpec>,
        on: u16,
        off: u16,
        pulses: u8,
        hold: u16,
    ) -> Result<&mut Self, LstfError> {
        let mut payload = Vec::with_capacity(11);
        payload.extend_from_slice(&on.to_le_bytes());
        payload.extend_from_slice(&off.to_le_bytes());
        payload.push(pulses);
        colour.into().encode(&mut payload)?;
        payload.extend_from_slice(&hold.to_le_bytes());
        Ok(self.push(tick, pad_opcodes::FLASH_COLOUR, payload))
    }

    /// Blackout (0x13)
    pub fn blackout(&mut self, tick: u32, transition: u16, hold: u16) -> &mut Self {
        let mut payload = transition.to_le_bytes().to_vec();
        payload.extend_from_slice(&hold.to_le_bytes());
        self.push(tick, pad_opcodes::BLACKOUT, payload)
    }

    /// KeyframeState (0x1F), ignored by the parser
    pub fn keyframe(&mut self, tick: u32, state: u8) -> &mut Self {
        self.push(tick, pad_opcodes::KEYFRAME_STATE, vec![state])
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Encode the delta-time stream
    pub fn encode(&self) -> Vec<u8> {
        let mut events: Vec<&PadEvent> = self.events.iter().collect();
        events.sort_by_key(|event| event.tick);

        let mut output = Vec::new();
        let mut current = 0u32;
        for event in events {
            write_varint(&mut output, u64::from(event.tick - current));
            output.push(event.opcode);
            output.extend_from_slice(&event.payload);
            current = event.tick;
        }
        output
    }
}

/// Builds a complete LSTF container
#[derive(Debug, Clone)]
pub struct LstfWriter {
    ticks_per_beat: u16,
    microseconds_per_beat: u32,
    flags: u16,
    palette: BTreeMap<u8, Rgb>,
    tempo_events: Vec<(u32, TempoChange)>,
    pads: BTreeMap<Pad, PadStreamBuilder>,
}

impl Default for LstfWriter {
    fn default() -> Self {
        // 960 ticks per beat at 120 BPM
        Self::new(960, 500_000)
    }
}

impl LstfWriter {
    /// Create a writer with the HEAD timebase and initial tempo
    pub fn new(ticks_per_beat: u16, microseconds_per_beat: u32) -> Self {
        Self {
            ticks_per_beat: ticks_per_beat.max(1),
            microseconds_per_beat: microseconds_per_beat.max(1),
            flags: 0,
            palette: BTreeMap::new(),
            tempo_events: Vec::new(),
            pads: BTreeMap::new(),
        }
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    /// Convert beats to ticks at the HEAD timebase
    pub fn beats(&self, beats: f64) -> u32 {
        (beats * f64::from(self.ticks_per_beat)).round().max(0.0) as u32
    }

    pub fn set_flags(&mut self, flags: u16) {
        self.flags = flags;
    }

    /// Override palette entry `index` (0..32)
    pub fn override_palette(&mut self, index: u8, colour: Rgb) -> Result<(), LstfError> {
        if index as usize >= PALETTE_SIZE {
            return Err(LstfError::InvalidInput(format!(
                "palette index {} must be in range 0-{}",
                index,
                PALETTE_SIZE - 1
            )));
        }
        self.palette.insert(index, colour);
        Ok(())
    }

    /// Add a SetTempo event (microseconds per beat)
    pub fn set_tempo(&mut self, tick: u32, microseconds_per_beat: u32) {
        self.tempo_events
            .push((tick, TempoChange::SetTempo(microseconds_per_beat)));
    }

    /// Add a SetTimebase event (ticks per beat)
    pub fn set_timebase(&mut self, tick: u32, ticks_per_beat: u16) {
        self.tempo_events
            .push((tick, TempoChange::SetTimebase(ticks_per_beat)));
    }

    /// Event stream for `pad`, created on first use
    pub fn pad(&mut self, pad: Pad) -> &mut PadStreamBuilder {
        self.pads.entry(pad).or_default()
    }

    fn encode_header(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(16);
        payload.extend_from_slice(&LSTF_MAGIC.to_le_bytes());
        payload.extend_from_slice(&LSTF_VERSION.to_le_bytes());
        payload.extend_from_slice(&self.ticks_per_beat.to_le_bytes());
        payload.extend_from_slice(&self.microseconds_per_beat.to_le_bytes());
        payload.extend_from_slice(&(self.pads.len() as u16).to_le_bytes());
        payload.extend_from_slice(&self.flags.to_le_bytes());
        payload
    }

    fn encode_palette(&self) -> Vec<u8> {
        let mut payload = vec![self.palette.len() as u8];
        for (index, colour) in &self.palette {
            payload.extend_from_slice(&[*index, colour.red, colour.green, colour.blue]);
        }
        payload
    }

    fn encode_tempo(&self) -> Vec<u8> {
        let mut events = self.tempo_events.clone();
        events.sort_by_key(|(tick, _)| *tick);

        let mut payload = Vec::new();
        let mut current = 0u32;
        for (tick, change) in events {
            write_varint(&mut payload, u64::from(tick - current));
            match change {
                TempoChange::SetTempo(value) => {
                    payload.push(tempo_opcodes::SET_TEMPO);
                    payload.extend_from_slice(&value.to_le_bytes());
                }
                TempoChange::SetTimebase(value) => {
                    payload.push(tempo_opcodes::SET_TIMEBASE);
                    payload.extend_from_slice(&value.to_le_bytes());
                }
            }
            current = tick;
        }
        payload
    }

    /// Emit `HEAD`, optional `PAL0`, `TEMP`, then one chunk per pad
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = Vec::new();
        write_chunk(&mut output, tags::HEAD, &self.encode_header());
        if !self.palette.is_empty() {
            write_chunk(&mut output, tags::PAL0, &self.encode_palette());
        }
        write_chunk(&mut output, tags::TEMP, &self.encode_tempo());
        for (pad, stream) in &self.pads {
            let mut tag = [0u8; 4];
            tag[..3].copy_from_slice(tags::PAD_PREFIX);
            tag[3] = b'0' + pad.chunk_index();
            write_chunk(&mut output, &tag, &stream.encode());
        }
        output
    }
}
