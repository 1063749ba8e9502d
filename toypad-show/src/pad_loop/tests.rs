//! Tests for pad loop workers

use std::collections::BTreeMap;
use std::time::Duration;

use toypad_lstf::{PadCommand, PadTrack, Rgb};

use super::*;
use crate::actuator::PadTarget;
use crate::testing::{Call, RecordingActuator, solid_program, wait_for};

const TIMEOUT: Duration = Duration::from_secs(5);

fn program(pad: Pad, commands: Vec<PadCommand>, duration: f64) -> Arc<Program> {
    let mut tracks = BTreeMap::new();
    tracks.insert(pad, PadTrack::new(commands, duration));
    Arc::new(Program::new(tracks))
}

fn fast_config() -> PlaybackConfig {
    PlaybackConfig {
        stop_poll_ms: 5,
        ..Default::default()
    }
}

#[test]
fn test_commands_repeat_in_order() {
    let actuator = RecordingActuator::new();
    let red = Rgb::new(255, 0, 0);
    let blue = Rgb::new(0, 0, 255);
    let program = program(
        Pad::Centre,
        vec![
            PadCommand::Switch {
                time: 0.01,
                colour: blue,
            },
            PadCommand::Switch {
                time: 0.0,
                colour: red,
            },
        ],
        0.02,
    );

    let mut pad_loop =
        PadLoop::spawn(actuator.clone(), Pad::Centre, program, Pad::Centre, fast_config())
            .unwrap();
    assert!(wait_for(TIMEOUT, || actuator.len() >= 6));
    pad_loop.stop().unwrap();

    let colours: Vec<Rgb> = actuator
        .calls_for(Pad::Centre)
        .iter()
        .map(Call::colour)
        .collect();
    for (index, colour) in colours.iter().enumerate() {
        let expected = if index % 2 == 0 { red } else { blue };
        assert_eq!(*colour, expected);
    }
}

#[test]
fn test_stop_is_idempotent_and_final() {
    let actuator = RecordingActuator::new();
    let mut pad_loop = PadLoop::spawn(
        actuator.clone(),
        Pad::Left,
        solid_program(&[Pad::Left], Rgb::WHITE, 0.01),
        Pad::Left,
        fast_config(),
    )
    .unwrap();
    assert!(wait_for(TIMEOUT, || actuator.len() >= 2));

    pad_loop.stop().unwrap();
    assert!(!pad_loop.is_running());
    let count = actuator.len();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(actuator.len(), count);

    pad_loop.stop().unwrap();
    assert_eq!(actuator.len(), count);
}

#[test]
fn test_stop_interrupts_long_wait() {
    let actuator = RecordingActuator::new();
    // Default 100ms slices; the stop signal wakes the worker directly
    let mut pad_loop = PadLoop::spawn(
        actuator.clone(),
        Pad::Right,
        solid_program(&[Pad::Right], Rgb::WHITE, 30.0),
        Pad::Right,
        PlaybackConfig::default(),
    )
    .unwrap();
    assert!(wait_for(TIMEOUT, || actuator.len() == 1));

    let started = Instant::now();
    pad_loop.stop().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(actuator.len(), 1);
}

#[test]
fn test_empty_track_exits_without_calls() {
    let actuator = RecordingActuator::new();
    let pad_loop = PadLoop::spawn(
        actuator.clone(),
        Pad::Centre,
        program(Pad::Centre, Vec::new(), 0.5),
        Pad::Centre,
        fast_config(),
    )
    .unwrap();
    assert!(wait_for(TIMEOUT, || !pad_loop.is_running()));
    assert_eq!(actuator.len(), 0);
    assert!(pad_loop.fault().is_none());
}

#[test]
fn test_generic_track_is_bound_to_target_pad() {
    let actuator = RecordingActuator::new();
    let mut pad_loop = PadLoop::spawn(
        actuator.clone(),
        Pad::Right,
        solid_program(&[Pad::Centre], Rgb::WHITE, 0.05),
        Pad::Centre,
        fast_config(),
    )
    .unwrap();
    assert!(wait_for(TIMEOUT, || actuator.len() >= 1));
    pad_loop.stop().unwrap();

    assert!(
        actuator
            .calls()
            .iter()
            .all(|(target, _)| *target == PadTarget::Pad(Pad::Right))
    );
}

#[test]
fn test_missing_source_track_is_internal_error() {
    let actuator = RecordingActuator::new();
    let result = PadLoop::spawn(
        actuator,
        Pad::Left,
        solid_program(&[Pad::Centre], Rgb::WHITE, 0.05),
        Pad::Left,
        fast_config(),
    );
    assert!(matches!(result, Err(ShowError::Internal(_))));
}

#[test]
fn test_timing_parameters_are_at_least_one() {
    let actuator = RecordingActuator::new();
    let colour = Rgb::new(1, 2, 3);
    let program = program(
        Pad::Centre,
        vec![
            PadCommand::Fade {
                time: 0.0,
                colour,
                pulse_time: 0,
                pulse_count: 0,
            },
            PadCommand::Flash {
                time: 0.0,
                colour,
                on_length: 7,
                off_length: 0,
                pulse_count: 3,
            },
        ],
        10.0,
    );
    let mut pad_loop =
        PadLoop::spawn(actuator.clone(), Pad::Centre, program, Pad::Centre, fast_config())
            .unwrap();
    assert!(wait_for(TIMEOUT, || actuator.len() >= 2));
    pad_loop.stop().unwrap();

    assert_eq!(
        actuator.calls_for(Pad::Centre),
        vec![
            Call::Fade {
                pulse_time: 1,
                pulse_count: 1,
                colour
            },
            Call::Flash {
                on_length: 7,
                off_length: 1,
                pulse_count: 3,
                colour
            },
        ]
    );
}

#[test]
fn test_actuator_failure_ends_worker() {
    let actuator = RecordingActuator::new();
    actuator.fail_on(PadTarget::Pad(Pad::Left));
    let mut pad_loop = PadLoop::spawn(
        actuator.clone(),
        Pad::Left,
        solid_program(&[Pad::Left], Rgb::WHITE, 0.01),
        Pad::Left,
        fast_config(),
    )
    .unwrap();

    assert!(wait_for(TIMEOUT, || !pad_loop.is_running()));
    assert!(pad_loop.fault().is_some());
    assert!(matches!(pad_loop.stop(), Err(ShowError::Actuator(_))));
    // Still reported after the worker has been joined
    assert!(matches!(pad_loop.stop(), Err(ShowError::Actuator(_))));
    assert_eq!(actuator.len(), 0);
}

#[test]
fn test_drop_stops_worker() {
    let actuator = RecordingActuator::new();
    let pad_loop = PadLoop::spawn(
        actuator.clone(),
        Pad::Centre,
        solid_program(&[Pad::Centre], Rgb::WHITE, 0.01),
        Pad::Centre,
        fast_config(),
    )
    .unwrap();
    assert!(wait_for(TIMEOUT, || actuator.len() >= 1));
    drop(pad_loop);

    let count = actuator.len();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(actuator.len(), count);
}
