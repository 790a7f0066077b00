use atomic_float::AtomicF64;
use keyfall_core::time::{FreeClock, ManualTimeSource, MediaClock, SongClock};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[test]
fn test_free_clock_measures_from_start() {
    let source = ManualTimeSource::new(5_000.0);
    let clock = FreeClock::start(source.clone());

    assert_eq!(clock.elapsed_ms(), 0.0);
    source.advance(250.0);
    assert_eq!(clock.elapsed_ms(), 250.0);
}

#[test]
fn test_free_clock_excludes_paused_time() {
    let source = ManualTimeSource::new(0.0);
    let mut clock = FreeClock::start(source.clone());

    source.set(1_000.0);
    clock.pause();
    assert!(clock.is_paused());

    // Wall time keeps running; the reading does not.
    source.set(4_000.0);
    assert_eq!(clock.elapsed_ms(), 1_000.0);

    clock.resume();
    assert!(!clock.is_paused());
    assert_eq!(clock.elapsed_ms(), 1_000.0);
    assert_eq!(clock.paused_total_ms(), 3_000.0);

    source.advance(500.0);
    assert_eq!(clock.elapsed_ms(), 1_500.0);
}

#[test]
fn test_free_clock_repeated_pause_is_harmless() {
    let source = ManualTimeSource::new(0.0);
    let mut clock = FreeClock::start(source.clone());

    source.set(100.0);
    clock.pause();
    source.set(200.0);
    clock.pause();
    source.set(300.0);
    clock.resume();
    clock.resume();

    assert_eq!(clock.paused_total_ms(), 200.0);
    assert_eq!(clock.elapsed_ms(), 100.0);
}

#[test]
fn test_media_clock_applies_start_offset() {
    let position = Arc::new(AtomicF64::new(0.0));
    let clock = MediaClock::new(position.clone(), 1_500.0);

    // Before the offset the chart has not started yet.
    assert_eq!(clock.elapsed_ms(), 0.0);

    position.store(2.0, Ordering::SeqCst);
    assert!((clock.elapsed_ms() - 500.0).abs() < 1e-9);
}

#[test]
fn test_media_clock_freezes_while_paused() {
    let position = Arc::new(AtomicF64::new(1.0));
    let mut clock = MediaClock::new(position, 0.0);
    let handle = clock.position_handle();

    clock.pause();
    handle.store(3.0, Ordering::SeqCst);
    assert!((clock.elapsed_ms() - 1_000.0).abs() < 1e-9);

    clock.resume();
    assert!((clock.elapsed_ms() - 3_000.0).abs() < 1e-9);
}

#[test]
fn test_clocks_are_interchangeable() {
    let source = ManualTimeSource::new(0.0);
    let position = Arc::new(AtomicF64::new(0.25));
    let clocks: Vec<Box<dyn SongClock>> = vec![
        Box::new(FreeClock::start(source.clone())),
        Box::new(MediaClock::new(position, 0.0)),
    ];

    source.set(250.0);
    for clock in &clocks {
        assert!((clock.elapsed_ms() - 250.0).abs() < 1e-9);
    }
}
