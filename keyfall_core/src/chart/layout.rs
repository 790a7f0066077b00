use chart_schema::LaneId;

use crate::error::ChartError;

pub const SUPPORTED_LANE_COUNTS: [usize; 5] = [4, 5, 6, 7, 8];

const LANES_4: [LaneId; 4] = [LaneId::L2, LaneId::L1, LaneId::R1, LaneId::R2];
const LANES_5: [LaneId; 5] = [LaneId::L2, LaneId::L1, LaneId::C1, LaneId::R1, LaneId::R2];
const LANES_6: [LaneId; 6] = [
    LaneId::L3,
    LaneId::L2,
    LaneId::L1,
    LaneId::R1,
    LaneId::R2,
    LaneId::R3,
];
const LANES_7: [LaneId; 7] = [
    LaneId::L3,
    LaneId::L2,
    LaneId::L1,
    LaneId::C1,
    LaneId::R1,
    LaneId::R2,
    LaneId::R3,
];
const LANES_8: [LaneId; 8] = [
    LaneId::L4,
    LaneId::L3,
    LaneId::L2,
    LaneId::L1,
    LaneId::R1,
    LaneId::R2,
    LaneId::R3,
    LaneId::R4,
];

/// Left-to-right physical order of symbolic lanes for one lane count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneLayout {
    ids: &'static [LaneId],
}

impl LaneLayout {
    pub fn for_lane_count(lane_count: usize) -> Result<Self, ChartError> {
        let ids: &'static [LaneId] = match lane_count {
            4 => &LANES_4,
            5 => &LANES_5,
            6 => &LANES_6,
            7 => &LANES_7,
            8 => &LANES_8,
            _ => {
                return Err(ChartError::new(
                    "E3001",
                    format!(
                        "unsupported lane count {lane_count} (expected one of {:?})",
                        SUPPORTED_LANE_COUNTS
                    ),
                ))
            }
        };
        Ok(Self { ids })
    }

    pub fn lane_count(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &'static [LaneId] {
        self.ids
    }

    pub fn index_of(&self, id: LaneId) -> Option<usize> {
        self.ids.iter().position(|&lane| lane == id)
    }

    pub fn id_at(&self, index: usize) -> Option<LaneId> {
        self.ids.get(index).copied()
    }
}
