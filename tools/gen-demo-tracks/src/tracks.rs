//! Demonstration track definitions
//!
//! Every track is 120 BPM at 960 ticks per beat, defines all three pads and
//! loops in 5-15 seconds. Times below are in beats.

use std::ops::RangeInclusive;

use toypad_lstf::{
    ColourSpec, LstfError, LstfWriter, Pad, PadStreamBuilder, Program, Rgb,
    USE_DEFAULT_TRANSITION,
};

pub const TICKS_PER_BEAT: u16 = 960;
/// 120 BPM
pub const BASE_TEMPO_US_PER_BEAT: u32 = 500_000;

/// Accepted loop length of a demo track, in seconds
pub const LOOP_SECONDS: RangeInclusive<f64> = 5.0..=15.0;

/// Loop length of the longest pad track
pub fn loop_seconds(program: &Program) -> f64 {
    program
        .tracks()
        .map(|(_, track)| track.duration())
        .fold(0.0, f64::max)
}

/// Whether `seconds` is an acceptable loop length, allowing for float error
pub fn loop_length_ok(seconds: f64) -> bool {
    const SLACK: f64 = 1e-6;
    seconds >= LOOP_SECONDS.start() - SLACK && seconds <= LOOP_SECONDS.end() + SLACK
}

/// A named demo track
pub struct TrackSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn() -> Result<Vec<u8>, LstfError>,
}

pub const TRACKS: &[TrackSpec] = &[
    TrackSpec {
        name: "aurora_glide",
        description: "Cascading pad fades with default transitions.",
        build: aurora_glide,
    },
    TrackSpec {
        name: "rainbow_cycle",
        description: "Multi-pad literal colour fades with overlapping ramps.",
        build: rainbow_cycle,
    },
    TrackSpec {
        name: "sync_pulse",
        description: "Synchronous pulse patterns using flash commands.",
        build: sync_pulse,
    },
    TrackSpec {
        name: "triple_chase",
        description: "Sequential pad chase with quick swaps to blackout.",
        build: triple_chase,
    },
    TrackSpec {
        name: "tempo_ramp",
        description: "Tempo changes that accelerate flashes and fades.",
        build: tempo_ramp,
    },
    TrackSpec {
        name: "countdown_burst",
        description: "Countdown pulses with shrinking intervals.",
        build: countdown_burst,
    },
    TrackSpec {
        name: "strobe_warning",
        description: "High-intensity strobe showcase.",
        build: strobe_warning,
    },
    TrackSpec {
        name: "twinkle_field",
        description: "Asynchronous twinkles with short dwell times.",
        build: twinkle_field,
    },
    TrackSpec {
        name: "wave_cascade",
        description: "Layered wave fades using default transitions.",
        build: wave_cascade,
    },
    TrackSpec {
        name: "centre_stage",
        description: "Centre spotlight with supporting side pulses.",
        build: centre_stage,
    },
    TrackSpec {
        name: "ocean_swell",
        description: "Slow overlapping fades with blackout finales.",
        build: ocean_swell,
    },
    TrackSpec {
        name: "fireworks_finale",
        description: "Palette overrides with spark bursts and finale strobe.",
        build: fireworks_finale,
    },
];

// ============================================================================
// Beat helpers
// ============================================================================

fn ticks(beats: f64) -> f64 {
    (beats * f64::from(TICKS_PER_BEAT)).round().max(0.0)
}

/// Absolute event position
fn at(beats: f64) -> u32 {
    ticks(beats) as u32
}

/// Transition, ramp, hold or flash length (0xFFFF is reserved)
fn span(beats: f64) -> u16 {
    ticks(beats).min(f64::from(USE_DEFAULT_TRANSITION - 1)) as u16
}

fn index(index: u8) -> ColourSpec {
    ColourSpec::Palette(index)
}

/// Pad event stream addressed in beats
struct Beats<'a>(&'a mut PadStreamBuilder);

impl Beats<'_> {
    fn default_transition(&mut self, beat: f64, transition: f64) -> &mut Self {
        self.0.set_default_transition(at(beat), span(transition));
        self
    }

    fn switch(
        &mut self,
        beat: f64,
        colour: impl Into<ColourSpec>,
        transition: f64,
        hold: f64,
    ) -> Result<&mut Self, LstfError> {
        self.0
            .switch_colour(at(beat), colour, span(transition), span(hold))?;
        Ok(self)
    }

    /// Switch using the pad's default transition
    fn switch_default(
        &mut self,
        beat: f64,
        colour: impl Into<ColourSpec>,
        hold: f64,
    ) -> Result<&mut Self, LstfError> {
        self.0
            .switch_colour(at(beat), colour, USE_DEFAULT_TRANSITION, span(hold))?;
        Ok(self)
    }

    fn fade(
        &mut self,
        beat: f64,
        colour: impl Into<ColourSpec>,
        ramp: f64,
        pulses: u8,
        hold: f64,
    ) -> Result<&mut Self, LstfError> {
        self.0
            .fade_to_colour(at(beat), colour, span(ramp), pulses, span(hold))?;
        Ok(self)
    }

    fn flash(
        &mut self,
        beat: f64,
        colour: impl Into<ColourSpec>,
        (on, off): (f64, f64),
        pulses: u8,
        hold: f64,
    ) -> Result<&mut Self, LstfError> {
        self.0
            .flash_colour(at(beat), colour, span(on), span(off), pulses, span(hold))?;
        Ok(self)
    }

    fn blackout(&mut self, beat: f64, transition: f64, hold: f64) -> &mut Self {
        self.0.blackout(at(beat), span(transition), span(hold));
        self
    }
}

fn demo_writer() -> LstfWriter {
    LstfWriter::new(TICKS_PER_BEAT, BASE_TEMPO_US_PER_BEAT)
}

fn pad(writer: &mut LstfWriter, pad: Pad) -> Beats<'_> {
    Beats(writer.pad(pad))
}

// ============================================================================
// Tracks
// ============================================================================

fn aurora_glide() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    let steps: [(Pad, f64, [u8; 5]); 3] = [
        (Pad::Centre, 0.0, [17, 19, 21, 23, 27]),
        (Pad::Left, 1.0, [13, 15, 17, 19, 21]),
        (Pad::Right, 2.0, [24, 26, 28, 30, 1]),
    ];
    for (target, offset, colours) in steps {
        let mut stream = pad(&mut writer, target);
        stream.default_transition(0.0, 0.5);
        for (step, colour) in colours.into_iter().enumerate() {
            stream.switch_default(offset + 2.0 * step as f64, index(colour), 2.0)?;
        }
    }
    Ok(writer.to_bytes())
}

fn rainbow_cycle() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    let steps: [(Pad, f64, [(u8, u8, u8); 5]); 3] = [
        (
            Pad::Centre,
            0.0,
            [(0, 255, 128), (64, 0, 255), (255, 64, 0), (0, 128, 255), (255, 0, 192)],
        ),
        (
            Pad::Left,
            1.0,
            [(255, 200, 0), (0, 180, 255), (180, 0, 255), (0, 255, 200), (255, 120, 0)],
        ),
        (
            Pad::Right,
            0.5,
            [(255, 32, 160), (0, 255, 255), (255, 255, 0), (0, 128, 255), (255, 0, 255)],
        ),
    ];
    for (target, offset, colours) in steps {
        let mut stream = pad(&mut writer, target);
        for (step, colour) in colours.into_iter().enumerate() {
            // The last fade holds a beat longer
            let hold = if step == 4 { 3.0 } else { 2.0 };
            stream.fade(offset + 2.0 * step as f64, Rgb::from(colour), 1.5, 3, hold)?;
        }
    }
    Ok(writer.to_bytes())
}

fn sync_pulse() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    for (target, first, second) in [(Pad::Centre, 1, 27), (Pad::Left, 4, 9), (Pad::Right, 17, 24)] {
        pad(&mut writer, target)
            .flash(0.0, index(first), (0.25, 0.25), 6, 3.0)?
            .flash(3.0, index(second), (0.125, 0.125), 10, 3.0)?
            .switch(6.0, index(0), 0.0, 4.0)?;
    }
    Ok(writer.to_bytes())
}

fn triple_chase() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    let highlight = 0.75;
    let lanes = [(Pad::Centre, 0.0, 4, 2), (Pad::Left, 1.0, 6, 12), (Pad::Right, 2.0, 9, 24)];
    for (target, offset, colour, finale) in lanes {
        let mut stream = pad(&mut writer, target);
        for cycle in [0.0, 3.0, 6.0, 9.0] {
            let start = cycle + offset;
            stream
                .switch(start, index(colour), 0.0, highlight)?
                .switch(start + highlight, index(0), 0.0, 0.25)?;
        }
        stream.switch(12.0, index(finale), 0.0, 1.0)?;
    }
    Ok(writer.to_bytes())
}

fn tempo_ramp() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    for (beat, tempo) in [(0.0, 750_000), (4.0, 500_000), (8.0, 350_000)] {
        writer.set_tempo(at(beat), tempo);
    }

    pad(&mut writer, Pad::Centre)
        .flash(0.0, index(10), (0.5, 0.5), 6, 4.0)?
        .flash(4.0, index(14), (0.5, 0.5), 8, 4.0)?
        .flash(8.0, index(4), (0.5, 0.5), 10, 4.0)?
        .switch(12.0, index(0), 0.0, 2.0)?;

    pad(&mut writer, Pad::Left)
        .fade(0.0, index(17), 2.0, 2, 4.0)?
        .fade(4.0, index(19), 2.0, 3, 4.0)?
        .fade(8.0, index(21), 2.0, 4, 4.0)?
        .blackout(12.0, 1.0, 2.0);

    pad(&mut writer, Pad::Right)
        .switch(0.0, index(5), 0.0, 4.0)?
        .switch(4.0, index(7), 0.0, 4.0)?
        .switch(8.0, index(9), 0.0, 4.0)?
        .blackout(12.0, 0.5, 2.0);

    Ok(writer.to_bytes())
}

fn countdown_burst() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    let lanes = [
        (Pad::Centre, [1, 27, 4], 1),
        (Pad::Left, [20, 14, 9], 10),
        (Pad::Right, [4, 6, 27], 24),
    ];
    for (target, [slow, medium, fast], finale) in lanes {
        pad(&mut writer, target)
            .flash(0.0, index(slow), (1.0, 1.0), 3, 4.0)?
            .flash(4.0, index(medium), (0.5, 0.5), 3, 3.0)?
            .flash(7.0, index(fast), (0.25, 0.25), 4, 2.0)?
            .switch(9.0, index(finale), 0.0, 2.0)?;
    }
    Ok(writer.to_bytes())
}

fn strobe_warning() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    for (target, strobe, burst) in [(Pad::Centre, 1, 4), (Pad::Left, 9, 1), (Pad::Right, 27, 22)] {
        pad(&mut writer, target)
            .flash(0.0, index(strobe), (0.125, 0.125), 20, 6.0)?
            .flash(6.0, index(burst), (0.0625, 0.0625), 24, 2.0)?
            .blackout(8.0, 0.5, 2.0);
    }
    Ok(writer.to_bytes())
}

fn twinkle_field() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    let centre: [(f64, u8, f64); 7] = [
        (0.5, 24, 0.3),
        (1.8, 10, 0.4),
        (3.2, 27, 0.3),
        (4.6, 21, 0.5),
        (6.5, 9, 0.4),
        (8.4, 14, 0.4),
        (10.2, 18, 0.5),
    ];
    let left: [(f64, u8, f64); 7] = [
        (0.7, 30, 0.3),
        (2.1, 12, 0.4),
        (3.9, 16, 0.4),
        (5.2, 28, 0.3),
        (6.8, 8, 0.4),
        (8.9, 26, 0.4),
        (10.8, 4, 0.5),
    ];
    let right: [(f64, u8, f64); 7] = [
        (0.9, 5, 0.3),
        (2.4, 19, 0.4),
        (4.0, 23, 0.3),
        (5.7, 15, 0.4),
        (7.2, 25, 0.4),
        (9.1, 17, 0.4),
        (11.0, 29, 0.5),
    ];

    for (target, twinkles, finale) in [
        (Pad::Centre, centre, 3),
        (Pad::Left, left, 7),
        (Pad::Right, right, 11),
    ] {
        let mut stream = pad(&mut writer, target);
        for (start, colour, dwell) in twinkles {
            stream
                .switch(start, index(colour), 0.0, dwell)?
                .switch(start + dwell, index(0), 0.0, 0.25)?;
        }
        stream.switch(12.0, index(finale), 0.0, 1.0)?;
    }
    Ok(writer.to_bytes())
}

fn wave_cascade() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    let lanes = [
        (Pad::Centre, 0.0, [17, 19, 21, 23]),
        (Pad::Left, 1.0, [10, 12, 14, 16]),
        (Pad::Right, 2.0, [24, 26, 28, 30]),
    ];
    for (target, offset, colours) in lanes {
        let mut stream = pad(&mut writer, target);
        stream.default_transition(0.0, 0.5);
        for (step, colour) in colours.into_iter().enumerate() {
            stream.fade(offset + 3.0 * step as f64, index(colour), 2.0, 4, 3.0)?;
        }
    }
    Ok(writer.to_bytes())
}

fn centre_stage() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();

    pad(&mut writer, Pad::Centre)
        .fade(0.0, index(1), 2.0, 2, 4.0)?
        .fade(4.0, index(4), 1.0, 1, 2.0)?
        .fade(6.0, index(9), 1.0, 1, 2.0)?
        .fade(8.0, index(27), 2.0, 2, 4.0)?
        .blackout(12.0, 0.5, 2.0);

    pad(&mut writer, Pad::Left)
        .switch(0.0, index(14), 0.5, 12.0)?
        .flash(3.0, index(10), (0.25, 0.25), 4, 2.0)?
        .flash(7.0, index(12), (0.25, 0.25), 4, 2.0)?;

    pad(&mut writer, Pad::Right)
        .switch(0.0, index(18), 0.5, 12.0)?
        .flash(3.5, index(24), (0.25, 0.25), 4, 2.0)?
        .flash(7.5, index(26), (0.25, 0.25), 4, 2.0)?;

    Ok(writer.to_bytes())
}

fn ocean_swell() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    let lanes = [
        (Pad::Centre, 0.0, [18, 16, 14]),
        (Pad::Left, 1.5, [19, 17, 15]),
        (Pad::Right, 3.0, [20, 22, 24]),
    ];
    for (target, offset, colours) in lanes {
        let mut stream = pad(&mut writer, target);
        for (step, colour) in colours.into_iter().enumerate() {
            stream.fade(offset + 3.0 * step as f64, index(colour), 3.0, 3, 3.0)?;
        }
        stream.blackout(offset + 9.0, 1.0, 2.0);
    }
    pad(&mut writer, Pad::Centre).switch(11.0, index(0), 0.0, 1.0)?;
    Ok(writer.to_bytes())
}

fn fireworks_finale() -> Result<Vec<u8>, LstfError> {
    let mut writer = demo_writer();
    writer.override_palette(31, Rgb::new(0xFF, 0xEE, 0x66))?;
    writer.override_palette(30, Rgb::new(0xFF, 0xAA, 0x00))?;

    pad(&mut writer, Pad::Centre)
        .flash(0.0, index(27), (0.25, 0.25), 4, 2.0)?
        .switch(2.0, index(31), 0.5, 2.0)?
        .flash(4.0, index(4), (0.125, 0.125), 8, 3.0)?
        .switch(7.0, index(1), 0.25, 2.0)?
        .flash(9.0, index(31), (0.125, 0.125), 6, 2.0)?
        .blackout(11.0, 0.5, 1.0);

    pad(&mut writer, Pad::Left)
        .fade(0.0, index(24), 1.5, 2, 2.0)?
        .flash(2.5, index(31), (0.25, 0.25), 6, 2.0)?
        .fade(5.0, index(17), 1.0, 3, 2.0)?
        .flash(9.0, index(31), (0.125, 0.125), 6, 2.0)?
        .blackout(11.0, 0.5, 1.0);

    pad(&mut writer, Pad::Right)
        .switch(0.0, index(6), 0.0, 1.0)?
        .flash(1.0, index(27), (0.25, 0.25), 5, 2.0)?
        .flash(3.5, index(22), (0.25, 0.25), 6, 2.0)?
        .switch(6.0, index(30), 0.5, 2.0)?
        .flash(9.0, index(1), (0.125, 0.125), 6, 2.0)?
        .blackout(11.0, 0.5, 1.0);

    Ok(writer.to_bytes())
}
