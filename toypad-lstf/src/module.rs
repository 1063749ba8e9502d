//! Decoded program structures

use std::collections::BTreeMap;
use std::fmt;

use crate::{ACTUATOR_UNIT_SECONDS, MIN_TRACK_DURATION};

/// 24-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// One of the three independently addressable light pads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pad {
    Centre,
    Left,
    Right,
}

impl Pad {
    /// All pads, in chunk index order
    pub const ALL: [Pad; 3] = [Pad::Centre, Pad::Left, Pad::Right];

    /// Wire identifier of the "all pads" broadcast target
    pub const BROADCAST_ID: u8 = 0;

    /// Map a `PADn` chunk index to its pad (0 centre, 1 left, 2 right)
    pub fn from_chunk_index(index: u8) -> Option<Pad> {
        match index {
            0 => Some(Pad::Centre),
            1 => Some(Pad::Left),
            2 => Some(Pad::Right),
            _ => None,
        }
    }

    /// Index used in the `PADn` chunk tag
    pub fn chunk_index(self) -> u8 {
        match self {
            Pad::Centre => 0,
            Pad::Left => 1,
            Pad::Right => 2,
        }
    }

    /// Identifier used by the actuator protocol (1..=3, 0 is broadcast)
    pub fn wire_id(self) -> u8 {
        self.chunk_index() + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Pad::Centre => "centre",
            Pad::Left => "left",
            Pad::Right => "right",
        }
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timed lighting instruction for a single pad
///
/// `time` is the offset in seconds from the start of the loop. Timing
/// parameters are in actuator units (one unit is roughly 10ms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PadCommand {
    /// Switch immediately to `colour`
    Switch { time: f64, colour: Rgb },
    /// Fade to `colour`, `pulse_count` times, each pulse `pulse_time` units
    Fade {
        time: f64,
        colour: Rgb,
        pulse_time: u8,
        pulse_count: u8,
    },
    /// Flash `colour` on and off `pulse_count` times
    Flash {
        time: f64,
        colour: Rgb,
        on_length: u8,
        off_length: u8,
        pulse_count: u8,
    },
}

impl PadCommand {
    pub fn time(&self) -> f64 {
        match *self {
            PadCommand::Switch { time, .. }
            | PadCommand::Fade { time, .. }
            | PadCommand::Flash { time, .. } => time,
        }
    }

    pub fn colour(&self) -> Rgb {
        match *self {
            PadCommand::Switch { colour, .. }
            | PadCommand::Fade { colour, .. }
            | PadCommand::Flash { colour, .. } => colour,
        }
    }

    /// Short action name, used in logs
    pub fn action(&self) -> &'static str {
        match self {
            PadCommand::Switch { .. } => "switch",
            PadCommand::Fade { .. } => "fade",
            PadCommand::Flash { .. } => "flash",
        }
    }
}

/// Time-ordered commands for one pad plus the loop period
#[derive(Debug, Clone, PartialEq)]
pub struct PadTrack {
    commands: Vec<PadCommand>,
    duration: f64,
}

impl PadTrack {
    /// Build a track, sorting commands by time (stable) and clamping the
    /// duration so it covers the last command and is at least 10ms.
    pub fn new(mut commands: Vec<PadCommand>, duration: f64) -> Self {
        commands.sort_by(|a, b| a.time().total_cmp(&b.time()));
        let last = commands.last().map(PadCommand::time).unwrap_or(0.0);
        let duration = duration.max(last).max(MIN_TRACK_DURATION);
        Self { commands, duration }
    }

    pub fn commands(&self) -> &[PadCommand] {
        &self.commands
    }

    /// Loop period in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Fully decoded LSTF track: one [`PadTrack`] per defined pad
///
/// Immutable once built; share it with `Arc` between playback workers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    tracks: BTreeMap<Pad, PadTrack>,
}

impl Program {
    pub fn new(tracks: BTreeMap<Pad, PadTrack>) -> Self {
        Self { tracks }
    }

    /// A generic program defines exactly one pad and must be bound to a
    /// target pad when played.
    pub fn is_generic(&self) -> bool {
        self.tracks.len() == 1
    }

    /// True when every pad has a track
    pub fn is_full(&self) -> bool {
        Pad::ALL.iter().all(|pad| self.tracks.contains_key(pad))
    }

    pub fn track(&self, pad: Pad) -> Option<&PadTrack> {
        self.tracks.get(&pad)
    }

    pub fn tracks(&self) -> impl Iterator<Item = (Pad, &PadTrack)> {
        self.tracks.iter().map(|(pad, track)| (*pad, track))
    }

    pub fn pads(&self) -> impl Iterator<Item = Pad> + '_ {
        self.tracks.keys().copied()
    }

    /// The only track of a generic program
    pub fn generic_track(&self) -> Option<&PadTrack> {
        if self.is_generic() {
            self.tracks.values().next()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Convert seconds into actuator timing units
///
/// Each unit is 10ms. Positive durations round to the nearest unit (ties to
/// even) and are clamped to `1..=255`; zero or negative durations give 0.
/// Precision below 10ms is lost, and anything above ~2.55s saturates.
pub fn seconds_to_units(seconds: f64) -> u8 {
    if seconds <= 0.0 || seconds.is_nan() {
        return 0;
    }
    let scaled = (seconds / ACTUATOR_UNIT_SECONDS).round_ties_even();
    scaled.clamp(1.0, 255.0) as u8
}
