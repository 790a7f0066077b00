use serde::{Deserialize, Serialize};
use std::fmt;

pub type Milliseconds = i64;

pub const DEFAULT_BPM: f64 = 120.0;

/// Position-relative lane identifier, independent of the physical key binding.
///
/// `L1`/`R1` are the innermost lanes, `C1` is the center lane used by odd lane
/// counts, and `L4`/`R4` are the outermost lanes of the 8-lane layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneId {
    L4,
    L3,
    L2,
    L1,
    C1,
    R1,
    R2,
    R3,
    R4,
}

impl LaneId {
    pub const ALL: [LaneId; 9] = [
        LaneId::L4,
        LaneId::L3,
        LaneId::L2,
        LaneId::L1,
        LaneId::C1,
        LaneId::R1,
        LaneId::R2,
        LaneId::R3,
        LaneId::R4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LaneId::L4 => "L4",
            LaneId::L3 => "L3",
            LaneId::L2 => "L2",
            LaneId::L1 => "L1",
            LaneId::C1 => "C1",
            LaneId::R1 => "R1",
            LaneId::R2 => "R2",
            LaneId::R3 => "R3",
            LaneId::R4 => "R4",
        }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `lane` field as written in a chart file.
///
/// Ids outside [`LaneId`] still parse so that the loader can treat them like
/// any other lane the active layout lacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LaneRef {
    Known(LaneId),
    Unknown(String),
}

impl LaneRef {
    pub fn known(&self) -> Option<LaneId> {
        match self {
            LaneRef::Known(id) => Some(*id),
            LaneRef::Unknown(_) => None,
        }
    }
}

impl From<LaneId> for LaneRef {
    fn from(id: LaneId) -> Self {
        LaneRef::Known(id)
    }
}

impl fmt::Display for LaneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneRef::Known(id) => f.write_str(id.as_str()),
            LaneRef::Unknown(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteType {
    #[serde(rename = "tap")]
    Tap,

    /// A note the player must not press.
    #[serde(rename = "false")]
    Decoy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartNote {
    pub time: Milliseconds,
    pub lane: LaneRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Milliseconds>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,
}

impl ChartNote {
    pub fn tap(time: Milliseconds, lane: impl Into<LaneRef>) -> Self {
        Self {
            time,
            lane: lane.into(),
            duration: None,
            note_type: None,
        }
    }

    /// A positive `duration` makes the note a hold; zero is treated as a tap.
    pub fn is_hold(&self) -> bool {
        matches!(self.duration, Some(d) if d > 0)
    }

    pub fn is_decoy(&self) -> bool {
        self.note_type == Some(NoteType::Decoy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_name: Option<String>,
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Milliseconds into the media file where the chart's time zero sits.
    #[serde(default)]
    pub start_time_offset: f64,
    /// Lane count the chart was authored for. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lanes: Option<usize>,
    pub notes: Vec<ChartNote>,
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}
