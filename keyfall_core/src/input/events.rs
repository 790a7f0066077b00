#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneInput {
    /// Song time (ms, pause-corrected) when the event occurred
    pub timestamp_ms: f64,
    /// Physical lane index, already resolved from the key binding
    pub lane: usize,
    pub pressed: bool,
}

impl LaneInput {
    pub fn down(lane: usize, timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            lane,
            pressed: true,
        }
    }

    pub fn up(lane: usize, timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            lane,
            pressed: false,
        }
    }
}
