//! Tick to seconds conversion
//!
//! A [`TempoMap`] is a piecewise-linear function built from the HEAD timebase
//! and tempo plus any `TEMP` chunk events. Each [`TempoSegment`] covers the
//! ticks from its `start_tick` up to the next segment's start.

use tracing::debug;

use crate::error::LstfError;

/// Kind and value of a tempo chunk event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempoChange {
    /// New tempo in microseconds per beat
    SetTempo(u32),
    /// New timebase in ticks per beat
    SetTimebase(u16),
}

/// A tempo or timebase change at an absolute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoEvent {
    pub tick: i64,
    pub change: TempoChange,
}

impl TempoEvent {
    pub fn new(tick: i64, change: TempoChange) -> Self {
        Self { tick, change }
    }
}

/// One linear piece of the tempo map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSegment {
    pub start_tick: i64,
    pub seconds_per_tick: f64,
    /// Elapsed seconds at `start_tick`
    pub start_time: f64,
}

impl TempoSegment {
    fn seconds_at(&self, tick: i64) -> f64 {
        self.start_time + (tick - self.start_tick) as f64 * self.seconds_per_tick
    }
}

fn seconds_per_tick(microseconds_per_beat: u32, ticks_per_beat: u16) -> f64 {
    microseconds_per_beat as f64 / 1_000_000.0 / ticks_per_beat as f64
}

/// Piecewise-linear map from tick positions to elapsed seconds
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    /// Build a map from the initial rate and a set of change events
    ///
    /// Events are applied in tick order (stable for equal ticks). Zero
    /// values and events before the current cursor are skipped. Events at
    /// the same tick as the last segment replace its rate in place.
    pub fn new(
        ticks_per_beat: u16,
        microseconds_per_beat: u32,
        events: &[TempoEvent],
    ) -> Result<Self, LstfError> {
        if ticks_per_beat == 0 {
            return Err(LstfError::InvalidInput(
                "ticks_per_beat must be positive".into(),
            ));
        }
        if microseconds_per_beat == 0 {
            return Err(LstfError::InvalidInput(
                "microseconds_per_beat must be positive".into(),
            ));
        }

        let mut segments = vec![TempoSegment {
            start_tick: 0,
            seconds_per_tick: seconds_per_tick(microseconds_per_beat, ticks_per_beat),
            start_time: 0.0,
        }];

        let mut sorted = events.to_vec();
        sorted.sort_by_key(|event| event.tick);

        let mut cursor = 0i64;
        let mut tempo = microseconds_per_beat;
        let mut timebase = ticks_per_beat;

        for event in sorted {
            if event.tick < cursor {
                debug!(
                    "Dropping tempo event at tick {} before cursor {}",
                    event.tick, cursor
                );
                continue;
            }
            match event.change {
                TempoChange::SetTempo(0) => {
                    debug!("Ignoring non-positive tempo change at tick {}", event.tick);
                    continue;
                }
                TempoChange::SetTimebase(0) => {
                    debug!("Ignoring non-positive timebase change at tick {}", event.tick);
                    continue;
                }
                TempoChange::SetTempo(value) => tempo = value,
                TempoChange::SetTimebase(value) => timebase = value,
            }

            let rate = seconds_per_tick(tempo, timebase);
            // Non-empty: seeded with the tick 0 segment
            let last = segments.len() - 1;
            if segments[last].start_tick == event.tick {
                segments[last].seconds_per_tick = rate;
            } else {
                let start_time = segments[last].seconds_at(event.tick);
                segments.push(TempoSegment {
                    start_tick: event.tick,
                    seconds_per_tick: rate,
                    start_time,
                });
            }
            cursor = event.tick;
        }

        Ok(Self { segments })
    }

    /// Map with a single constant-rate segment
    pub fn constant(ticks_per_beat: u16, microseconds_per_beat: u32) -> Result<Self, LstfError> {
        Self::new(ticks_per_beat, microseconds_per_beat, &[])
    }

    pub fn segments(&self) -> &[TempoSegment] {
        &self.segments
    }

    /// Elapsed seconds at `tick`
    pub fn ticks_to_seconds(&self, tick: i64) -> Result<f64, LstfError> {
        if tick < 0 {
            return Err(LstfError::InvalidInput(format!(
                "tick positions cannot be negative (got {})",
                tick
            )));
        }
        // The first segment starts at tick 0, so the partition point is >= 1
        let index = self
            .segments
            .partition_point(|segment| segment.start_tick <= tick)
            .saturating_sub(1);
        Ok(self.segments[index].seconds_at(tick))
    }

    /// Seconds elapsed between two tick positions
    pub fn duration_between(&self, start_tick: i64, end_tick: i64) -> Result<f64, LstfError> {
        if end_tick < start_tick {
            return Err(LstfError::InvalidInput(format!(
                "end tick {} precedes start tick {}",
                end_tick, start_tick
            )));
        }
        Ok(self.ticks_to_seconds(end_tick)? - self.ticks_to_seconds(start_tick)?)
    }
}
