use tracing::{debug, info};

use super::events::{CountdownStep, EventSink, GameEvent};
use super::judge::{JudgeMachine, JudgmentResult};
use super::score::{RunState, RunSummary};
use super::timeline::{NoteView, Timeline};
use crate::chart::Chart;
use crate::config::GameSettings;
use crate::input::events::LaneInput;
use crate::input::InputQueue;
use crate::time::SongClock;

pub const COUNTDOWN_FROM: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Countdown,
    Playing,
    Paused,
    Finished,
}

/// "3, 2, 1, START" played before the run begins and after every resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    next: Option<u8>,
}

impl Countdown {
    pub fn new(from: u8) -> Self {
        Self { next: Some(from) }
    }

    pub fn step(&mut self) -> CountdownStep {
        match self.next {
            Some(0) => {
                self.next = None;
                CountdownStep::Start
            }
            Some(n) => {
                self.next = Some(n - 1);
                CountdownStep::Count(n)
            }
            None => CountdownStep::Done,
        }
    }
}

/// Everything one run owns: clock, timeline, judge and the event sink.
///
/// Nothing is global, so independent sessions can run side by side.
pub struct Session {
    clock: Box<dyn SongClock>,
    judge: JudgeMachine,
    sink: Box<dyn EventSink>,
    phase: RunPhase,
    countdown: Countdown,
}

impl Session {
    /// Creates a session in the countdown phase. The clock is held paused
    /// until the countdown finishes.
    pub fn new(chart: &Chart, settings: &GameSettings, mut clock: Box<dyn SongClock>, sink: Box<dyn EventSink>) -> Self {
        clock.pause();
        info!(
            notes = chart.notes.len(),
            lanes = chart.lane_count,
            song = chart.song_name.as_deref().unwrap_or("<untitled>"),
            "session created"
        );
        Self {
            clock,
            judge: JudgeMachine::new(chart, settings),
            sink,
            phase: RunPhase::Countdown,
            countdown: Countdown::new(COUNTDOWN_FROM),
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.clock.elapsed_ms()
    }

    pub fn timeline(&self) -> &Timeline {
        self.judge.timeline()
    }

    pub fn run_state(&self) -> &RunState {
        self.judge.run_state()
    }

    pub fn judge(&self) -> &JudgeMachine {
        &self.judge
    }

    pub fn visible_notes(&self) -> impl Iterator<Item = NoteView> + '_ {
        self.judge.visible_notes(self.clock.elapsed_ms())
    }

    /// Called once per countdown interval by the host.
    pub fn advance_countdown(&mut self) -> CountdownStep {
        if self.phase != RunPhase::Countdown {
            return CountdownStep::Done;
        }
        let step = self.countdown.step();
        if step == CountdownStep::Done {
            self.start_playing();
        } else {
            self.sink.emit(GameEvent::Countdown(step));
        }
        step
    }

    pub fn skip_countdown(&mut self) {
        if self.phase == RunPhase::Countdown {
            self.start_playing();
        }
    }

    fn start_playing(&mut self) {
        self.phase = RunPhase::Playing;
        self.clock.resume();
        debug!(elapsed_ms = self.clock.elapsed_ms(), "playing");
    }

    /// One animation frame. A no-op unless the run is playing.
    pub fn tick(&mut self) {
        if self.phase != RunPhase::Playing {
            return;
        }
        let elapsed = self.clock.elapsed_ms();
        self.judge.tick(elapsed, self.sink.as_mut());
        if self.judge.is_complete() {
            self.phase = RunPhase::Finished;
        }
    }

    pub fn lane_down(&mut self, lane: usize) -> Option<JudgmentResult> {
        let elapsed = self.clock.elapsed_ms();
        self.handle_input(LaneInput::down(lane, elapsed))
    }

    pub fn lane_up(&mut self, lane: usize) -> Option<JudgmentResult> {
        let elapsed = self.clock.elapsed_ms();
        self.handle_input(LaneInput::up(lane, elapsed))
    }

    /// Judges one input at its own timestamp. Ignored unless playing.
    pub fn handle_input(&mut self, input: LaneInput) -> Option<JudgmentResult> {
        if self.phase != RunPhase::Playing {
            return None;
        }
        let sink = self.sink.as_mut();
        if input.pressed {
            self.judge.lane_down(input.lane, input.timestamp_ms, sink)
        } else {
            self.judge.lane_up(input.lane, input.timestamp_ms, sink)
        }
    }

    /// Processes queued input in arrival order, each to completion.
    pub fn drain_input(&mut self, queue: &InputQueue) -> Vec<JudgmentResult> {
        queue.drain().filter_map(|input| self.handle_input(input)).collect()
    }

    pub fn pause(&mut self) {
        if matches!(self.phase, RunPhase::Playing | RunPhase::Countdown) {
            self.clock.pause();
            self.phase = RunPhase::Paused;
            debug!(elapsed_ms = self.clock.elapsed_ms(), "paused");
        }
    }

    /// Leaves the pause through a fresh countdown; the clock stays frozen
    /// until it finishes.
    pub fn resume(&mut self) {
        if self.phase == RunPhase::Paused {
            self.countdown = Countdown::new(COUNTDOWN_FROM);
            self.phase = RunPhase::Countdown;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            RunPhase::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    /// Ends the run now, whether or not every note was judged.
    pub fn end(&mut self) -> RunSummary {
        let summary = self.judge.summary();
        if self.phase != RunPhase::Finished {
            self.phase = RunPhase::Finished;
            if !self.judge.is_complete() {
                self.sink.emit(GameEvent::RunComplete {
                    summary: summary.clone(),
                });
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_counts_down_then_starts() {
        let mut countdown = Countdown::new(3);
        let steps: Vec<CountdownStep> = (0..6).map(|_| countdown.step()).collect();
        assert_eq!(
            steps,
            vec![
                CountdownStep::Count(3),
                CountdownStep::Count(2),
                CountdownStep::Count(1),
                CountdownStep::Start,
                CountdownStep::Done,
                CountdownStep::Done,
            ]
        );
    }
}
