use std::collections::HashMap;

use tracing::warn;

use crate::chart::{Chart, Judgment, Milliseconds, Note, NoteKind};
use crate::config::ScrollConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteState {
    /// Judged; no longer live.
    pub processed: bool,
    /// For hold halves: the head was hit perfect/good, so the tail may be
    /// judged on release.
    pub engaged: bool,
    /// Handed to the presentation layer and not yet detached.
    pub materialized: bool,
    pub judgment: Option<Judgment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedNote {
    pub note: Note,
    pub state: NoteState,
    /// Index of the other half of a hold.
    pub partner: Option<usize>,
}

impl TimedNote {
    /// Resolved and no longer on screen; the cursor may move past it.
    pub fn is_settled(&self) -> bool {
        self.state.processed && !self.state.materialized
    }
}

/// Presentation data for one materialized note at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteView {
    pub note_index: usize,
    pub lane: usize,
    pub kind: NoteKind,
    /// Negative once the ideal hit instant has passed.
    pub time_to_hit: f64,
    /// Bottom edge, measured downward from the top of the lane.
    pub bottom: f64,
    pub height: f64,
    pub hold_total_ms: Option<f64>,
    pub hold_remaining_ms: Option<f64>,
}

/// The live, time-ordered notes of one run.
///
/// `cursor` is a low-water mark: every note before it is settled, so scans
/// start there and it only ever moves forward.
#[derive(Debug, Clone)]
pub struct Timeline {
    notes: Vec<TimedNote>,
    cursor: usize,
    lane_count: usize,
    judgeable: usize,
}

impl Timeline {
    pub fn new(chart: &Chart) -> Self {
        let mut notes: Vec<TimedNote> = chart
            .notes
            .iter()
            .map(|note| TimedNote {
                note: note.clone(),
                state: NoteState::default(),
                partner: None,
            })
            .collect();

        let mut heads: HashMap<u32, usize> = HashMap::new();
        for index in 0..notes.len() {
            let note = &notes[index].note;
            match (note.kind, note.hold_id) {
                (NoteKind::HoldHead, Some(id)) => {
                    heads.insert(id, index);
                }
                (NoteKind::HoldTail, Some(id)) => match heads.remove(&id) {
                    Some(head) => {
                        notes[head].partner = Some(index);
                        notes[index].partner = Some(head);
                    }
                    None => warn!(index, hold_id = id, "hold tail without a head"),
                },
                _ => {}
            }
        }
        for (id, index) in heads {
            warn!(index, hold_id = id, "hold head without a tail");
        }

        Self {
            notes,
            cursor: 0,
            lane_count: chart.lane_count,
            judgeable: chart.judgeable_count(),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &[TimedNote] {
        &self.notes
    }

    pub fn get(&self, index: usize) -> Option<&TimedNote> {
        self.notes.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut TimedNote> {
        self.notes.get_mut(index)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    /// Notes a run must judge: every note except hold tails.
    pub fn judgeable(&self) -> usize {
        self.judgeable
    }

    pub fn unresolved(&self) -> usize {
        self.notes.iter().filter(|n| !n.state.processed).count()
    }

    pub(crate) fn advance_cursor(&mut self) {
        while self.notes.get(self.cursor).is_some_and(TimedNote::is_settled) {
            self.cursor += 1;
        }
    }

    /// Unresolved, non-decoy notes sharing `time` exactly (a chord).
    pub fn chord_at(&self, time: Milliseconds) -> Vec<usize> {
        let start = self.notes.partition_point(|n| n.note.time < time);
        let end = self.notes.partition_point(|n| n.note.time <= time);
        (start..end)
            .filter(|&i| {
                let n = &self.notes[i];
                !n.state.processed && n.note.kind != NoteKind::Decoy
            })
            .collect()
    }

    pub fn view(&self, index: usize, elapsed_ms: f64, scroll: &ScrollConfig) -> Option<NoteView> {
        let timed = self.notes.get(index)?;
        let note = &timed.note;
        let time_to_hit = note.time as f64 - elapsed_ms;
        let (hold_total_ms, hold_remaining_ms) = match (note.kind, note.duration) {
            (NoteKind::HoldHead, Some(duration)) => {
                let total = duration as f64;
                let end = (note.time + duration) as f64;
                (Some(total), Some((end - elapsed_ms).clamp(0.0, total)))
            }
            _ => (None, None),
        };
        Some(NoteView {
            note_index: index,
            lane: note.lane,
            kind: note.kind,
            time_to_hit,
            bottom: scroll.note_bottom(time_to_hit),
            height: scroll.note_height(note.kind, note.duration),
            hold_total_ms,
            hold_remaining_ms,
        })
    }

    /// Views of every materialized note at `elapsed_ms`.
    pub fn visible<'a>(
        &'a self,
        elapsed_ms: f64,
        scroll: &'a ScrollConfig,
    ) -> impl Iterator<Item = NoteView> + 'a {
        (self.cursor..self.notes.len())
            .filter(move |&i| self.notes[i].state.materialized)
            .filter_map(move |i| self.view(i, elapsed_ms, scroll))
    }
}
