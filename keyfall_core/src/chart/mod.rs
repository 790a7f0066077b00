pub mod generator;
pub mod layout;
pub mod loader;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use chart_schema::{LaneId, LaneRef, Milliseconds};

use crate::error::ChartError;
use self::layout::LaneLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    Tap,
    HoldHead,
    HoldTail,
    /// Must not be pressed: letting it expire is the best outcome.
    Decoy,
}

impl NoteKind {
    /// Kinds a key press can judge. Tails are only judged on release.
    pub fn is_pressable(self) -> bool {
        matches!(self, NoteKind::Tap | NoteKind::HoldHead | NoteKind::Decoy)
    }

    pub fn is_hold(self) -> bool {
        matches!(self, NoteKind::HoldHead | NoteKind::HoldTail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Perfect,
    Good,
    Bad,
    Miss,
}

impl Judgment {
    pub const ALL: [Judgment; 4] = [
        Judgment::Perfect,
        Judgment::Good,
        Judgment::Bad,
        Judgment::Miss,
    ];

    pub fn breaks_combo(self) -> bool {
        matches!(self, Judgment::Bad | Judgment::Miss)
    }

    pub fn label(self) -> &'static str {
        match self {
            Judgment::Perfect => "PERFECT",
            Judgment::Good => "GOOD",
            Judgment::Bad => "BAD",
            Judgment::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub time: Milliseconds,
    pub lane: usize,
    pub kind: NoteKind,
    /// Shared by the two halves of a hold.
    pub hold_id: Option<u32>,
    /// Head-to-tail distance; set on hold heads only.
    pub duration: Option<Milliseconds>,
}

impl Note {
    pub fn tap(time: Milliseconds, lane: usize) -> Self {
        Self {
            time,
            lane,
            kind: NoteKind::Tap,
            hold_id: None,
            duration: None,
        }
    }

    pub fn decoy(time: Milliseconds, lane: usize) -> Self {
        Self {
            kind: NoteKind::Decoy,
            ..Self::tap(time, lane)
        }
    }

    /// Expands one logical hold into its head and tail.
    pub fn hold(time: Milliseconds, lane: usize, duration: Milliseconds, hold_id: u32) -> [Note; 2] {
        [
            Note {
                time,
                lane,
                kind: NoteKind::HoldHead,
                hold_id: Some(hold_id),
                duration: Some(duration),
            },
            Note {
                time: time.saturating_add(duration),
                lane,
                kind: NoteKind::HoldTail,
                hold_id: Some(hold_id),
                duration: None,
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub song_name: Option<String>,
    pub bpm: f64,
    /// Media position (ms) that maps to chart time zero.
    pub start_offset_ms: f64,
    pub lane_count: usize,
    pub notes: Vec<Note>,
}

impl Chart {
    /// Sorts `notes` by time (stable, so chart order breaks ties) and validates.
    pub fn new(lane_count: usize, bpm: f64, mut notes: Vec<Note>) -> Result<Self, ChartError> {
        notes.sort_by_key(|n| n.time);
        let chart = Chart {
            song_name: None,
            bpm,
            start_offset_ms: 0.0,
            lane_count,
            notes,
        };
        chart.validate()?;
        Ok(chart)
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        LaneLayout::for_lane_count(self.lane_count)?;

        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(ChartError::new("E4001", format!("bpm must be > 0 (got {})", self.bpm)));
        }
        if !(self.start_offset_ms.is_finite() && self.start_offset_ms >= 0.0) {
            return Err(ChartError::new(
                "E4007",
                format!("start offset must be >= 0 (got {})", self.start_offset_ms),
            ));
        }

        // hold_id -> (head index, tail index)
        let mut holds: HashMap<u32, (Option<usize>, Option<usize>)> = HashMap::new();
        let mut previous_time = Milliseconds::MIN;

        for (index, note) in self.notes.iter().enumerate() {
            if note.time < 0 {
                return Err(ChartError::new("E4002", "note time must be >= 0")
                    .with_note_index(index)
                    .with_time_ms(note.time));
            }
            if note.time < previous_time {
                return Err(ChartError::new("E4004", "notes are not sorted by time")
                    .with_note_index(index)
                    .with_time_ms(note.time));
            }
            previous_time = note.time;

            if note.lane >= self.lane_count {
                return Err(ChartError::new(
                    "E4005",
                    format!("lane index {} out of range for {} lanes", note.lane, self.lane_count),
                )
                .with_note_index(index)
                .with_lane(note.lane));
            }

            match (note.kind, note.hold_id) {
                (NoteKind::HoldHead, Some(id)) => {
                    if !matches!(note.duration, Some(d) if d > 0) {
                        return Err(ChartError::new("E4003", "hold duration must be > 0")
                            .with_note_index(index)
                            .with_time_ms(note.time));
                    }
                    let entry = holds.entry(id).or_default();
                    if entry.0.replace(index).is_some() {
                        return Err(pairing_error(index, format!("duplicate hold head for hold {id}")));
                    }
                }
                (NoteKind::HoldTail, Some(id)) => {
                    let entry = holds.entry(id).or_default();
                    if entry.1.replace(index).is_some() {
                        return Err(pairing_error(index, format!("duplicate hold tail for hold {id}")));
                    }
                }
                (NoteKind::HoldHead | NoteKind::HoldTail, None) => {
                    return Err(pairing_error(index, "hold note without hold id"));
                }
                (NoteKind::Tap | NoteKind::Decoy, Some(_)) => {
                    return Err(pairing_error(index, "only hold notes carry a hold id"));
                }
                (NoteKind::Tap | NoteKind::Decoy, None) => {}
            }
        }

        for (id, pair) in holds {
            let (head, tail) = match pair {
                (Some(head), Some(tail)) => (&self.notes[head], tail),
                (Some(index), None) => {
                    return Err(pairing_error(index, format!("hold {id} has no tail")));
                }
                (None, tail) => {
                    return Err(pairing_error(tail.unwrap_or_default(), format!("hold {id} has no head")));
                }
            };
            let tail_note = &self.notes[tail];
            let Some(expected) = head.time.checked_add(head.duration.unwrap_or_default()) else {
                return Err(pairing_error(tail, format!("hold {id} ends past the representable time range")));
            };
            if tail_note.time != expected || tail_note.lane != head.lane {
                return Err(pairing_error(
                    tail,
                    format!("hold {id} tail does not match its head (expected lane {} at {expected}ms)", head.lane),
                ));
            }
        }

        Ok(())
    }

    /// Logical notes a run must judge: every note except hold tails.
    pub fn judgeable_count(&self) -> usize {
        self.notes.iter().filter(|n| n.kind != NoteKind::HoldTail).count()
    }

    pub fn count_of(&self, kind: NoteKind) -> usize {
        self.notes.iter().filter(|n| n.kind == kind).count()
    }

    pub fn last_time(&self) -> Milliseconds {
        self.notes.last().map(|n| n.time).unwrap_or_default()
    }
}

fn pairing_error(index: usize, message: impl Into<String>) -> ChartError {
    ChartError::new("E4006", message).with_note_index(index)
}
