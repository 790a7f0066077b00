//! Hand-off of lane input from whatever polls the keyboard to the session,
//! which consumes it once per frame.

pub mod events;

use self::events::LaneInput;
use crossbeam_channel::{unbounded, Receiver, Sender, TryIter};

/// Consumer end owned by the game loop.
pub struct InputQueue {
    tx: Sender<LaneInput>,
    rx: Receiver<LaneInput>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// A handle that can move to a polling thread. Any number may exist.
    pub fn producer(&self) -> InputProducer {
        InputProducer { tx: self.tx.clone() }
    }

    /// Everything queued since the last drain, oldest first. Never blocks.
    pub fn drain(&self) -> TryIter<'_, LaneInput> {
        self.rx.try_iter()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Feeds key transitions into an [`InputQueue`].
#[derive(Clone)]
pub struct InputProducer {
    tx: Sender<LaneInput>,
}

impl InputProducer {
    /// Returns false once the queue has been dropped.
    pub fn send(&self, input: LaneInput) -> bool {
        self.tx.send(input).is_ok()
    }

    pub fn press(&self, lane: usize, timestamp_ms: f64) -> bool {
        self.send(LaneInput::down(lane, timestamp_ms))
    }

    pub fn release(&self, lane: usize, timestamp_ms: f64) -> bool {
        self.send(LaneInput::up(lane, timestamp_ms))
    }
}
