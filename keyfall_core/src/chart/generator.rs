use rand::seq::index;
use rand::Rng;
use tracing::debug;

use super::layout::LaneLayout;
use super::{Chart, Milliseconds, Note};
use crate::config::GameSettings;
use crate::error::ChartError;

pub const FIRST_NOTE_MS: Milliseconds = 1000;
pub const BASE_INTERVAL_MS: Milliseconds = 500;
/// Interval shaved off per lane so wider layouts play denser.
pub const NOTE_SPACING_FACTOR: Milliseconds = 20;
pub const HOLD_MIN_MS: Milliseconds = 500;
pub const HOLD_MAX_MS: Milliseconds = 1500;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub note_count: usize,
    pub lane_count: usize,
    pub simultaneous_probability: f64,
    pub hold_probability: f64,
    pub decoy_probability: f64,
    pub bpm: f64,
}

impl GeneratorSettings {
    pub fn from_settings(settings: &GameSettings) -> Self {
        Self {
            note_count: settings.clamped_note_count(),
            lane_count: settings.lanes,
            simultaneous_probability: settings.simultaneous_probability,
            hold_probability: settings.hold_probability,
            decoy_probability: settings.decoy_probability,
            bpm: chart_schema::DEFAULT_BPM,
        }
    }

    pub fn interval_ms(&self) -> Milliseconds {
        BASE_INTERVAL_MS - self.lane_count as Milliseconds * NOTE_SPACING_FACTOR
    }
}

/// Builds a random practice chart.
///
/// Each step spends part of the note budget on a two-lane chord (2), a hold
/// (1) or a single tap that may be a decoy (1). Holds push the following notes
/// back by their duration so nothing overlaps the tail.
pub fn generate<R: Rng + ?Sized>(settings: &GeneratorSettings, rng: &mut R) -> Result<Chart, ChartError> {
    LaneLayout::for_lane_count(settings.lane_count)?;
    let lanes = settings.lane_count;
    let interval = settings.interval_ms();

    let mut notes = Vec::with_capacity(settings.note_count + settings.note_count / 2);
    let mut generated = 0usize;
    let mut current_time = FIRST_NOTE_MS;
    let mut next_hold_id: u32 = 0;

    while generated < settings.note_count {
        let remaining = settings.note_count - generated;
        let can_pair = lanes > 1 && remaining >= 2;

        if can_pair && rng.gen::<f64>() < settings.simultaneous_probability {
            let pair = index::sample(rng, lanes, 2);
            notes.push(Note::tap(current_time, pair.index(0)));
            notes.push(Note::tap(current_time, pair.index(1)));
            generated += 2;
        } else if rng.gen::<f64>() < settings.hold_probability {
            let lane = rng.gen_range(0..lanes);
            let duration = rng.gen_range(HOLD_MIN_MS..HOLD_MAX_MS);
            notes.extend(Note::hold(current_time, lane, duration, next_hold_id));
            next_hold_id += 1;
            current_time += duration;
            generated += 1;
        } else if settings.decoy_probability > 0.0 && rng.gen::<f64>() < settings.decoy_probability {
            notes.push(Note::decoy(current_time, rng.gen_range(0..lanes)));
            generated += 1;
        } else {
            notes.push(Note::tap(current_time, rng.gen_range(0..lanes)));
            generated += 1;
        }
        current_time += interval;
    }

    let chart = Chart::new(lanes, settings.bpm, notes)?;
    debug!(
        notes = chart.notes.len(),
        judgeable = chart.judgeable_count(),
        holds = next_hold_id,
        "generated chart"
    );
    Ok(chart)
}
