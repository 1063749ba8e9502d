//! Pad event stream decoding
//!
//! Turns one pad's `PADn` payloads into a sorted [`PadTrack`]. Each payload
//! repeats `(varint tick delta)(opcode)(payload)`; when a pad has several
//! chunks they form one continuous stream, so the running tick and the
//! default transition carry over between them.

use std::io::Cursor;

use super::helpers::{at_end, read_u8, read_u16, read_varint};
use crate::error::LstfError;
use crate::module::{Pad, PadCommand, PadTrack, Rgb, seconds_to_units};
use crate::palette::Palette;
use crate::tempo::TempoMap;
use crate::{USE_DEFAULT_TRANSITION, colour_mode, pad_opcodes};

/// Decoder state for one pad
struct PadDecoder<'a> {
    pad: Pad,
    tempo: &'a TempoMap,
    palette: &'a Palette,
    tick: i64,
    default_transition: Option<u16>,
    commands: Vec<PadCommand>,
    /// Latest hold end (or command start when there is no hold)
    duration: f64,
}

impl<'a> PadDecoder<'a> {
    fn new(pad: Pad, tempo: &'a TempoMap, palette: &'a Palette) -> Self {
        Self {
            pad,
            tempo,
            palette,
            tick: 0,
            default_transition: None,
            commands: Vec::new(),
            duration: 0.0,
        }
    }

    fn decode_chunk(&mut self, payload: &[u8]) -> Result<(), LstfError> {
        let mut cursor = Cursor::new(payload);
        while !at_end(&cursor) {
            self.tick += read_varint(&mut cursor)? as i64;
            let opcode = read_u8(&mut cursor, "pad opcode")?;
            self.decode_event(opcode, &mut cursor)?;
        }
        Ok(())
    }

    fn decode_event(&mut self, opcode: u8, cursor: &mut Cursor<&[u8]>) -> Result<(), LstfError> {
        match opcode {
            pad_opcodes::SWITCH_COLOUR => {
                let mut transition = read_u16(cursor, "SwitchColour transition")?;
                if transition == USE_DEFAULT_TRANSITION {
                    transition = self.default_transition.unwrap_or(0);
                }
                let colour = self.read_colour(cursor)?;
                let hold = read_u16(cursor, "SwitchColour hold")?;
                self.emit_switch(transition, colour, hold)
            }
            pad_opcodes::FADE_TO_COLOUR => {
                let ramp = read_u16(cursor, "FadeToColour ramp")?;
                let pulses = read_u8(cursor, "FadeToColour pulses")?;
                let colour = self.read_colour(cursor)?;
                let hold = read_u16(cursor, "FadeToColour hold")?;

                let time = self.tempo.ticks_to_seconds(self.tick)?;
                let pulse_count = pulses.max(1);
                let ramp_seconds = self.span_seconds(ramp)?;
                let pulse_time = seconds_to_units(ramp_seconds / f64::from(pulse_count)).max(1);
                self.commands.push(PadCommand::Fade {
                    time,
                    colour,
                    pulse_time,
                    pulse_count,
                });
                self.extend_duration(time, hold)
            }
            pad_opcodes::FLASH_COLOUR => {
                let on = read_u16(cursor, "FlashColour on length")?;
                let off = read_u16(cursor, "FlashColour off length")?;
                let pulses = read_u8(cursor, "FlashColour pulses")?;
                let colour = self.read_colour(cursor)?;
                let hold = read_u16(cursor, "FlashColour hold")?;

                let time = self.tempo.ticks_to_seconds(self.tick)?;
                self.commands.push(PadCommand::Flash {
                    time,
                    colour,
                    on_length: seconds_to_units(self.span_seconds(on)?).max(1),
                    off_length: seconds_to_units(self.span_seconds(off)?).max(1),
                    pulse_count: pulses.max(1),
                });
                self.extend_duration(time, hold)
            }
            pad_opcodes::BLACKOUT => {
                // No default-transition substitution here
                let transition = read_u16(cursor, "Blackout transition")?;
                let hold = read_u16(cursor, "Blackout hold")?;
                self.emit_switch(transition, Rgb::BLACK, hold)
            }
            pad_opcodes::SET_DEFAULT_TRANSITION => {
                self.default_transition = Some(read_u16(cursor, "SetDefaultTransition payload")?);
                Ok(())
            }
            pad_opcodes::KEYFRAME_STATE => {
                read_u8(cursor, "KeyframeState payload")?;
                Ok(())
            }
            other => Err(LstfError::UnsupportedPadOpcode {
                pad: self.pad,
                opcode: other,
            }),
        }
    }

    /// Switch when `transition` is zero, otherwise a single-pulse fade
    fn emit_switch(&mut self, transition: u16, colour: Rgb, hold: u16) -> Result<(), LstfError> {
        let time = self.tempo.ticks_to_seconds(self.tick)?;
        let command = if transition == 0 {
            PadCommand::Switch { time, colour }
        } else {
            PadCommand::Fade {
                time,
                colour,
                pulse_time: seconds_to_units(self.span_seconds(transition)?),
                pulse_count: 1,
            }
        };
        self.commands.push(command);
        self.extend_duration(time, hold)
    }

    /// Seconds covered by `ticks` starting at the current tick
    fn span_seconds(&self, ticks: u16) -> Result<f64, LstfError> {
        self.tempo
            .duration_between(self.tick, self.tick + i64::from(ticks))
    }

    fn extend_duration(&mut self, time: f64, hold: u16) -> Result<(), LstfError> {
        let end = if hold == 0 {
            time
        } else {
            self.tempo.ticks_to_seconds(self.tick + i64::from(hold))?
        };
        self.duration = self.duration.max(end);
        Ok(())
    }

    fn read_colour(&self, cursor: &mut Cursor<&[u8]>) -> Result<Rgb, LstfError> {
        let mode = read_u8(cursor, "colour mode")?;
        if mode & colour_mode::LITERAL != 0 {
            let red = read_u8(cursor, "literal colour")?;
            let green = read_u8(cursor, "literal colour")?;
            let blue = read_u8(cursor, "literal colour")?;
            Ok(Rgb::new(red, green, blue))
        } else {
            self.palette.resolve(mode & colour_mode::INDEX_MASK)
        }
    }

    fn finish(self) -> PadTrack {
        PadTrack::new(self.commands, self.duration)
    }
}

/// Decode all chunks for `pad` into a track (which may be empty)
pub(crate) fn decode_pad_stream(
    pad: Pad,
    chunks: &[&[u8]],
    tempo: &TempoMap,
    palette: &Palette,
) -> Result<PadTrack, LstfError> {
    let mut decoder = PadDecoder::new(pad, tempo, palette);
    for chunk in chunks {
        decoder.decode_chunk(chunk)?;
    }
    Ok(decoder.finish())
}
