//! Tests for the show engine

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use toypad_lstf::{PadCommand, PadTrack, Rgb};

use super::*;
use crate::actuator::PadTarget;
use crate::testing::{Call, RecordingActuator, full_program, solid_program, wait_for};

const TIMEOUT: Duration = Duration::from_secs(5);
const RED: Rgb = Rgb::new(255, 0, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);
const BLUE: Rgb = Rgb::new(0, 0, 255);

fn engine(actuator: &Arc<RecordingActuator>) -> ShowEngine {
    let mut config = ShowConfig::default();
    config.playback.stop_poll_ms = 5;
    ShowEngine::with_config(actuator.clone(), &config)
}

fn colours_since(actuator: &RecordingActuator, pad: Pad, since: Instant) -> Vec<Rgb> {
    actuator
        .calls_for_since(pad, since)
        .iter()
        .map(Call::colour)
        .collect()
}

/// Wait until `pad` has received at least one call since `since`, then
/// check that every such call used `colour`
fn assert_pad_shows(actuator: &RecordingActuator, pad: Pad, since: Instant, colour: Rgb) {
    assert!(
        wait_for(TIMEOUT, || !colours_since(actuator, pad, since).is_empty()),
        "no calls on {} since checkpoint",
        pad
    );
    let colours = colours_since(actuator, pad, since);
    assert!(
        colours.iter().all(|c| *c == colour),
        "{} showed {:?}, expected only {}",
        pad,
        colours,
        colour
    );
}

#[test]
fn test_activate_default_rejects_generic() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let generic = solid_program(&[Pad::Centre], RED, 0.05);

    assert!(matches!(
        engine.activate_default(generic),
        Err(ShowError::InvalidInput(_))
    ));
    assert_eq!(engine.stack_depth(), 0);
    assert!(engine.top().is_none());
}

#[test]
fn test_activate_default_rejects_partial_program() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let base = engine.activate_default(full_program(RED, 0.05)).unwrap();

    let pair = solid_program(&[Pad::Centre, Pad::Left], RED, 0.05);
    assert!(matches!(
        engine.activate_default(pair),
        Err(ShowError::InvalidInput(_))
    ));
    assert_eq!(engine.stack_depth(), 1);
    assert_eq!(engine.top(), Some(base));
    engine.close();
}

#[test]
fn test_activate_default_drives_all_pads() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let since = Instant::now();
    let id = engine.activate_default(full_program(RED, 0.02)).unwrap();

    for pad in Pad::ALL {
        assert_pad_shows(&actuator, pad, since, RED);
        assert_eq!(engine.controller(pad), Some(id));
    }
    engine.close();
}

#[test]
fn test_activate_default_discards_stack() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    engine.activate_default(full_program(RED, 0.02)).unwrap();
    engine.push_track(full_program(GREEN, 0.02)).unwrap();
    assert_eq!(engine.stack_depth(), 2);

    let id = engine.activate_default(full_program(BLUE, 0.02)).unwrap();
    let since = Instant::now();
    assert_eq!(engine.stack_depth(), 1);
    assert_eq!(engine.top(), Some(id));
    for pad in Pad::ALL {
        assert_pad_shows(&actuator, pad, since, BLUE);
    }
    engine.close();
}

#[test]
fn test_push_then_pop_restarts_previous_track() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let a = engine.push_track(full_program(RED, 0.02)).unwrap();
    let b = engine.push_track(full_program(BLUE, 0.02)).unwrap();

    let pushed_at = Instant::now();
    for pad in Pad::ALL {
        assert_pad_shows(&actuator, pad, pushed_at, BLUE);
        assert_eq!(engine.controller(pad), Some(b));
    }

    assert!(engine.pop_track(b).unwrap());
    let popped_at = Instant::now();
    assert_eq!(engine.top(), Some(a));
    for pad in Pad::ALL {
        assert_pad_shows(&actuator, pad, popped_at, RED);
        assert_eq!(engine.controller(pad), Some(a));
    }

    // Already popped
    assert!(!engine.pop_track(b).unwrap());
    assert_eq!(engine.top(), Some(a));
    engine.close();
}

#[test]
fn test_pop_ignores_non_top_handle() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let a = engine.push_track(full_program(RED, 0.02)).unwrap();
    let b = engine.push_track(full_program(BLUE, 0.02)).unwrap();

    assert!(!engine.pop_track(a).unwrap());
    assert_eq!(engine.stack_depth(), 2);
    assert_eq!(engine.top(), Some(b));
    engine.close();
}

#[test]
fn test_push_rejects_generic_program() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let a = engine.push_track(full_program(RED, 0.02)).unwrap();

    let generic = solid_program(&[Pad::Left], BLUE, 0.02);
    assert!(matches!(
        engine.push_track(generic.clone()),
        Err(ShowError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.replace_track(generic),
        Err(ShowError::InvalidInput(_))
    ));
    // Rejected before anything was stopped
    assert_eq!(engine.top(), Some(a));
    assert_eq!(engine.controller(Pad::Left), Some(a));
    engine.close();
}

#[test]
fn test_replace_track_discards_stack() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    engine.activate_default(full_program(RED, 0.02)).unwrap();
    engine.push_track(full_program(GREEN, 0.02)).unwrap();

    let c = engine.replace_track(full_program(BLUE, 0.02)).unwrap();
    let since = Instant::now();
    assert_eq!(engine.stack_depth(), 1);
    assert_eq!(engine.top(), Some(c));
    assert_pad_shows(&actuator, Pad::Centre, since, BLUE);

    // Popping the only entry leaves the pads idle
    assert!(engine.pop_track(c).unwrap());
    assert_eq!(engine.stack_depth(), 0);
    assert!(Pad::ALL.iter().all(|pad| engine.controller(*pad).is_none()));
}

#[test]
fn test_overlay_suspends_only_its_pad() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let base = engine.activate_default(full_program(RED, 0.02)).unwrap();

    let overlay = engine
        .apply_overlay(Pad::Left, solid_program(&[Pad::Centre], GREEN, 0.02))
        .unwrap();
    let applied_at = Instant::now();
    assert_eq!(engine.overlay(Pad::Left), Some(overlay));
    assert_eq!(engine.controller(Pad::Left), Some(overlay));
    assert_eq!(engine.controller(Pad::Centre), Some(base));
    assert_eq!(engine.controller(Pad::Right), Some(base));

    assert_pad_shows(&actuator, Pad::Left, applied_at, GREEN);
    assert_pad_shows(&actuator, Pad::Centre, applied_at, RED);
    assert_pad_shows(&actuator, Pad::Right, applied_at, RED);

    assert!(engine.remove_overlay(Pad::Left).unwrap());
    let removed_at = Instant::now();
    assert_eq!(engine.overlay(Pad::Left), None);
    assert_eq!(engine.controller(Pad::Left), Some(base));
    assert_pad_shows(&actuator, Pad::Left, removed_at, RED);
    engine.close();
}

#[test]
fn test_removed_overlay_resumes_from_loop_start() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);

    // White at the start of each cycle, black 0.3s in
    let cycle = PadTrack::new(
        vec![
            PadCommand::Switch {
                time: 0.0,
                colour: Rgb::WHITE,
            },
            PadCommand::Switch {
                time: 0.3,
                colour: Rgb::BLACK,
            },
        ],
        0.6,
    );
    let tracks: BTreeMap<Pad, PadTrack> =
        Pad::ALL.iter().map(|pad| (*pad, cycle.clone())).collect();
    engine.activate_default(Arc::new(Program::new(tracks))).unwrap();

    // Let the base loop get past its first command
    let started = Instant::now();
    assert!(wait_for(TIMEOUT, || {
        colours_since(&actuator, Pad::Right, started).contains(&Rgb::BLACK)
    }));

    engine
        .apply_overlay(Pad::Right, solid_program(&[Pad::Right], GREEN, 5.0))
        .unwrap();
    engine.remove_overlay(Pad::Right).unwrap();
    let removed_at = Instant::now();

    assert!(wait_for(TIMEOUT, || {
        !colours_since(&actuator, Pad::Right, removed_at).is_empty()
    }));
    assert_eq!(colours_since(&actuator, Pad::Right, removed_at)[0], Rgb::WHITE);
    engine.close();
}

#[test]
fn test_overlay_with_multi_pad_program() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let base = engine.activate_default(full_program(RED, 0.02)).unwrap();

    let pair = solid_program(&[Pad::Centre, Pad::Left], BLUE, 0.02);
    assert!(matches!(
        engine.apply_overlay(Pad::Right, pair.clone()),
        Err(ShowError::InvalidInput(_))
    ));
    assert_eq!(engine.controller(Pad::Right), Some(base));

    let since = Instant::now();
    engine.apply_overlay(Pad::Centre, pair).unwrap();
    assert_pad_shows(&actuator, Pad::Centre, since, BLUE);
    // The pair's Left track is not played
    assert_pad_shows(&actuator, Pad::Left, since, RED);
    engine.close();
}

#[test]
fn test_overlay_replaces_existing_overlay() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    engine.activate_default(full_program(RED, 0.02)).unwrap();

    let first = engine
        .apply_overlay(Pad::Centre, solid_program(&[Pad::Centre], GREEN, 0.02))
        .unwrap();
    let second = engine
        .apply_overlay(Pad::Centre, solid_program(&[Pad::Centre], BLUE, 0.02))
        .unwrap();
    let since = Instant::now();

    assert_ne!(first, second);
    assert_eq!(engine.overlay(Pad::Centre), Some(second));
    assert_pad_shows(&actuator, Pad::Centre, since, BLUE);
    engine.close();
}

#[test]
fn test_stack_changes_keep_overlaid_pads() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    engine.activate_default(full_program(RED, 0.02)).unwrap();
    let overlay = engine
        .apply_overlay(Pad::Left, solid_program(&[Pad::Left], GREEN, 0.02))
        .unwrap();

    let pushed = engine.push_track(full_program(BLUE, 0.02)).unwrap();
    let since = Instant::now();
    assert_eq!(engine.controller(Pad::Left), Some(overlay));
    assert_eq!(engine.controller(Pad::Centre), Some(pushed));
    assert_pad_shows(&actuator, Pad::Left, since, GREEN);
    assert_pad_shows(&actuator, Pad::Centre, since, BLUE);

    let base = engine.activate_default(full_program(RED, 0.02)).unwrap();
    assert_eq!(engine.controller(Pad::Left), Some(overlay));
    assert_eq!(engine.controller(Pad::Right), Some(base));

    // The overlay ends; the new default takes the pad
    engine.clear_overlays().unwrap();
    let cleared_at = Instant::now();
    assert_eq!(engine.overlay(Pad::Left), None);
    assert_eq!(engine.controller(Pad::Left), Some(base));
    assert_pad_shows(&actuator, Pad::Left, cleared_at, RED);
    engine.close();
}

#[test]
fn test_overlay_without_stack() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    let overlay = engine
        .apply_overlay(Pad::Right, solid_program(&[Pad::Centre], GREEN, 0.02))
        .unwrap();
    assert_eq!(engine.controller(Pad::Right), Some(overlay));
    assert!(engine.controller(Pad::Centre).is_none());

    assert!(engine.remove_overlay(Pad::Right).unwrap());
    assert!(!engine.remove_overlay(Pad::Right).unwrap());
    assert!(engine.controller(Pad::Right).is_none());
}

#[test]
fn test_close_is_idempotent() {
    let actuator = RecordingActuator::new();
    let mut engine = engine(&actuator);
    engine.activate_default(full_program(RED, 0.01)).unwrap();
    engine.push_track(full_program(BLUE, 0.01)).unwrap();
    engine
        .apply_overlay(Pad::Centre, solid_program(&[Pad::Centre], GREEN, 0.01))
        .unwrap();
    assert!(wait_for(TIMEOUT, || actuator.len() >= 3));

    engine.close();
    let count = actuator.len();
    engine.close();

    assert_eq!(engine.stack_depth(), 0);
    assert!(Pad::ALL.iter().all(|pad| engine.overlay(*pad).is_none()));
    assert!(Pad::ALL.iter().all(|pad| engine.controller(*pad).is_none()));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(actuator.len(), count);
}

#[test]
fn test_drop_stops_all_workers() {
    let actuator = RecordingActuator::new();
    {
        let mut engine = engine(&actuator);
        engine.activate_default(full_program(RED, 0.01)).unwrap();
        assert!(wait_for(TIMEOUT, || actuator.len() >= 3));
    }
    let count = actuator.len();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(actuator.len(), count);
}

#[test]
fn test_actuator_fault_is_reported_per_pad() {
    let actuator = RecordingActuator::new();
    actuator.fail_on(PadTarget::Pad(Pad::Right));
    let mut engine = engine(&actuator);
    engine.activate_default(full_program(RED, 0.01)).unwrap();

    assert!(wait_for(TIMEOUT, || engine.pad_fault(Pad::Right).is_some()));
    assert!(engine.pad_fault(Pad::Centre).is_none());
    let since = Instant::now();
    assert_pad_shows(&actuator, Pad::Centre, since, RED);
    assert!(actuator.calls_for(Pad::Right).is_empty());

    // Faulted loops do not prevent shutdown
    engine.close();
    assert_eq!(engine.stack_depth(), 0);
}
