use crossbeam_channel::Sender;

use super::score::RunSummary;
use crate::chart::Judgment;

/// Which feedback sound/flash the presentation layer should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackClass {
    Hit,
    Miss,
}

impl From<Judgment> for FeedbackClass {
    fn from(judgment: Judgment) -> Self {
        match judgment {
            Judgment::Perfect | Judgment::Good => FeedbackClass::Hit,
            Judgment::Bad | Judgment::Miss => FeedbackClass::Miss,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    Count(u8),
    Start,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// One judgement as the player perceives it. A chord miss resolves
    /// several notes under a single event.
    Judgement {
        judgment: Judgment,
        combo_after: u32,
        notes: Vec<usize>,
        feedback: FeedbackClass,
        /// Input time minus note time. `None` for passive resolutions.
        delta_ms: Option<f64>,
    },
    NoteResolved {
        note_index: usize,
        judgment: Judgment,
    },
    /// The note's visual should be removed.
    NoteDetached {
        note_index: usize,
    },
    Countdown(CountdownStep),
    RunComplete {
        summary: RunSummary,
    },
}

/// Receiver of everything the core reports to the outside world.
pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: GameEvent) {}
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F: FnMut(GameEvent)> EventSink for FnSink<F> {
    fn emit(&mut self, event: GameEvent) {
        (self.0)(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_follows_combo_rules() {
        assert_eq!(FeedbackClass::from(Judgment::Perfect), FeedbackClass::Hit);
        assert_eq!(FeedbackClass::from(Judgment::Good), FeedbackClass::Hit);
        assert_eq!(FeedbackClass::from(Judgment::Bad), FeedbackClass::Miss);
        assert_eq!(FeedbackClass::from(Judgment::Miss), FeedbackClass::Miss);
    }

    #[test]
    fn closure_and_channel_sinks_receive_events() {
        let mut seen = Vec::new();
        {
            let mut sink = FnSink(|event: GameEvent| seen.push(event));
            sink.emit(GameEvent::NoteDetached { note_index: 3 });
        }
        assert_eq!(seen, vec![GameEvent::NoteDetached { note_index: 3 }]);

        let (mut tx, rx) = crossbeam_channel::unbounded();
        tx.emit(GameEvent::Countdown(CountdownStep::Start));
        assert_eq!(rx.try_recv().ok(), Some(GameEvent::Countdown(CountdownStep::Start)));
    }
}
