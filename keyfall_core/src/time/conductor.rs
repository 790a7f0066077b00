use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF64;

use super::source::TimeSource;

/// Position in the song timeline, in milliseconds, with paused time removed.
pub trait SongClock {
    fn elapsed_ms(&self) -> f64;
    fn pause(&mut self);
    fn resume(&mut self);
    fn is_paused(&self) -> bool;
}

/// Free-running clock for practice runs, seeded when it is started.
#[derive(Debug, Clone)]
pub struct FreeClock<S> {
    source: S,
    run_start_ms: f64,
    paused_total_ms: f64,
    pause_started_ms: Option<f64>,
}

impl<S: TimeSource> FreeClock<S> {
    pub fn start(source: S) -> Self {
        let run_start_ms = source.now_ms();
        Self {
            source,
            run_start_ms,
            paused_total_ms: 0.0,
            pause_started_ms: None,
        }
    }

    pub fn paused_total_ms(&self) -> f64 {
        self.paused_total_ms
    }
}

impl<S: TimeSource> SongClock for FreeClock<S> {
    fn elapsed_ms(&self) -> f64 {
        // While paused the reading stays frozen at the pause instant.
        let now = self.pause_started_ms.unwrap_or_else(|| self.source.now_ms());
        now - self.run_start_ms - self.paused_total_ms
    }

    fn pause(&mut self) {
        if self.pause_started_ms.is_none() {
            self.pause_started_ms = Some(self.source.now_ms());
        }
    }

    fn resume(&mut self) {
        if let Some(started) = self.pause_started_ms.take() {
            self.paused_total_ms += self.source.now_ms() - started;
        }
    }

    fn is_paused(&self) -> bool {
        self.pause_started_ms.is_some()
    }
}

/// Clock backed by the playback position of the song's media.
///
/// The media layer writes its position (seconds) into the shared cell; the
/// chart's time zero sits `start_offset_ms` into the media.
#[derive(Debug, Clone)]
pub struct MediaClock {
    position_secs: Arc<AtomicF64>,
    start_offset_ms: f64,
    frozen_ms: Option<f64>,
}

impl MediaClock {
    pub fn new(position_secs: Arc<AtomicF64>, start_offset_ms: f64) -> Self {
        Self {
            position_secs,
            start_offset_ms,
            frozen_ms: None,
        }
    }

    pub fn position_handle(&self) -> Arc<AtomicF64> {
        self.position_secs.clone()
    }

    fn live_ms(&self) -> f64 {
        let position_ms = self.position_secs.load(Ordering::Acquire) * 1000.0;
        (position_ms - self.start_offset_ms).max(0.0)
    }
}

impl SongClock for MediaClock {
    fn elapsed_ms(&self) -> f64 {
        self.frozen_ms.unwrap_or_else(|| self.live_ms())
    }

    fn pause(&mut self) {
        if self.frozen_ms.is_none() {
            self.frozen_ms = Some(self.live_ms());
        }
    }

    fn resume(&mut self) {
        self.frozen_ms = None;
    }

    fn is_paused(&self) -> bool {
        self.frozen_ms.is_some()
    }
}
