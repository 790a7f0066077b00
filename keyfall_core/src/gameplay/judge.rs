use tracing::{debug, info, trace, warn};

use super::events::{EventSink, GameEvent};
use super::score::{RunState, RunSummary};
use super::timeline::{NoteView, TimedNote, Timeline};
use crate::chart::{Chart, Judgment, NoteKind};
use crate::config::{GameSettings, JudgeWindows, PointTable, ScrollConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentResult {
    pub note_index: usize,
    pub judgment: Judgment,
    /// Input time minus note time: positive is late.
    pub delta: f64,
}

/// Matches lane input against the timeline and sweeps expired notes.
///
/// Every method runs to completion before returning; callers feed it one
/// input or one frame at a time.
pub struct JudgeMachine {
    timeline: Timeline,
    run: RunState,
    held: Vec<bool>,
    /// Per lane: the tail of a hold whose head has been resolved.
    open_holds: Vec<Option<usize>>,
    windows: JudgeWindows,
    points: PointTable,
    scroll: ScrollConfig,
    completed: bool,
}

impl JudgeMachine {
    pub fn new(chart: &Chart, settings: &GameSettings) -> Self {
        let timeline = Timeline::new(chart);
        Self {
            run: RunState::new(timeline.judgeable(), timeline.len()),
            held: vec![false; chart.lane_count],
            open_holds: vec![None; chart.lane_count],
            timeline,
            windows: settings.windows,
            points: settings.points,
            scroll: settings.scroll,
            completed: false,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn windows(&self) -> &JudgeWindows {
        &self.windows
    }

    pub fn is_held(&self, lane: usize) -> bool {
        self.held.get(lane).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn summary(&self) -> RunSummary {
        self.run.summary(&self.points)
    }

    pub fn visible_notes(&self, elapsed_ms: f64) -> impl Iterator<Item = NoteView> + '_ {
        self.timeline.visible(elapsed_ms, &self.scroll)
    }

    pub fn lane_down(&mut self, lane: usize, elapsed_ms: f64, sink: &mut dyn EventSink) -> Option<JudgmentResult> {
        if lane >= self.held.len() {
            warn!(lane, "press on a lane outside the layout");
            return None;
        }
        if self.held[lane] {
            // Key repeat.
            return None;
        }
        self.held[lane] = true;

        let Some((index, distance)) = self.nearest_candidate(lane, elapsed_ms, |n| n.note.kind.is_pressable()) else {
            trace!(lane, elapsed_ms, "press with no note in range");
            return None;
        };
        let Some(judgment) = self.windows.classify(distance) else {
            trace!(lane, index, distance, "press outside the judging windows");
            return None;
        };
        let judgment = match self.timeline.notes()[index].note.kind {
            NoteKind::Decoy => Judgment::Miss,
            _ => judgment,
        };
        Some(self.judge_input(index, judgment, elapsed_ms, sink))
    }

    pub fn lane_up(&mut self, lane: usize, elapsed_ms: f64, sink: &mut dyn EventSink) -> Option<JudgmentResult> {
        if lane >= self.held.len() {
            warn!(lane, "release on a lane outside the layout");
            return None;
        }
        self.held[lane] = false;

        let (index, distance) = self.nearest_candidate(lane, elapsed_ms, |n| {
            n.note.kind == NoteKind::HoldTail && n.state.engaged
        })?;
        let judgment = self.windows.classify(distance)?;
        Some(self.judge_input(index, judgment, elapsed_ms, sink))
    }

    /// Advances the timeline to `elapsed_ms`. Fails holds whose lane was let
    /// go, then materializes notes entering the screen and times out notes that
    /// left the miss window.
    pub fn tick(&mut self, elapsed_ms: f64, sink: &mut dyn EventSink) {
        for lane in 0..self.open_holds.len() {
            if let Some(tail) = self.open_holds[lane] {
                if !self.held[lane] {
                    self.resolve_released_hold(tail, sink);
                }
            }
        }

        self.timeline.advance_cursor();
        let horizon = self.scroll.look_ahead_ms().max(self.windows.miss_ms);

        let mut index = self.timeline.cursor();
        while let Some(timed) = self.timeline.get(index) {
            let time_to_hit = timed.note.time as f64 - elapsed_ms;
            if time_to_hit > horizon {
                break;
            }
            if timed.is_settled() {
                index += 1;
                continue;
            }
            let kind = timed.note.kind;
            let duration = timed.note.duration;
            let state = timed.state;

            if !state.processed && !state.materialized && kind != NoteKind::HoldTail {
                let bottom = self.scroll.note_bottom(time_to_hit);
                let height = self.scroll.note_height(kind, duration);
                if self.scroll.is_visible(bottom, height) {
                    if let Some(timed) = self.timeline.get_mut(index) {
                        timed.state.materialized = true;
                    }
                }
            }

            if !state.processed && time_to_hit < -self.windows.miss_ms {
                self.resolve_timeout(index, sink);
            }
            index += 1;
        }

        if !self.completed && self.run.is_complete() {
            self.completed = true;
            let summary = self.summary();
            info!(score = summary.score, rank = %summary.rank, "run complete");
            sink.emit(GameEvent::RunComplete { summary });
        }
    }

    /// Nearest unresolved note on `lane` accepted by `accept`, within the miss
    /// window. Equidistant candidates resolve to the earliest chart index.
    fn nearest_candidate(
        &self,
        lane: usize,
        elapsed_ms: f64,
        accept: impl Fn(&TimedNote) -> bool,
    ) -> Option<(usize, f64)> {
        let miss = self.windows.miss_ms;
        let mut best: Option<(usize, f64)> = None;

        for (index, timed) in self.timeline.notes().iter().enumerate().skip(self.timeline.cursor()) {
            let offset = timed.note.time as f64 - elapsed_ms;
            // Sorted by time: nothing further on can be closer.
            if offset > miss {
                break;
            }
            if timed.state.processed || timed.note.lane != lane || !accept(timed) {
                continue;
            }
            let distance = offset.abs();
            if distance <= miss && best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best
    }

    fn judge_input(
        &mut self,
        index: usize,
        judgment: Judgment,
        elapsed_ms: f64,
        sink: &mut dyn EventSink,
    ) -> JudgmentResult {
        let delta = elapsed_ms - self.timeline.notes()[index].note.time as f64;
        self.resolve(index, judgment, sink);
        debug!(index, ?judgment, delta, combo = self.run.combo(), "judged input");
        self.emit_judgement(judgment, vec![index], Some(delta), sink);
        JudgmentResult {
            note_index: index,
            judgment,
            delta,
        }
    }

    /// A note that left the miss window unjudged. Decoys succeed; anything else
    /// fails together with the rest of its chord.
    fn resolve_timeout(&mut self, index: usize, sink: &mut dyn EventSink) {
        let Some(timed) = self.timeline.get(index) else {
            return;
        };
        if timed.state.processed {
            return;
        }
        if timed.note.kind == NoteKind::Decoy {
            self.resolve(index, Judgment::Perfect, sink);
            self.emit_judgement(Judgment::Perfect, vec![index], None, sink);
            return;
        }

        let chord = self.timeline.chord_at(timed.note.time);
        for &i in &chord {
            self.resolve(i, Judgment::Miss, sink);
        }
        debug!(notes = ?chord, "timed out");
        self.emit_judgement(Judgment::Miss, chord, None, sink);
    }

    fn resolve_released_hold(&mut self, tail: usize, sink: &mut dyn EventSink) {
        if self.resolve(tail, Judgment::Miss, sink) {
            debug!(tail, "hold released early");
            self.emit_judgement(Judgment::Miss, vec![tail], None, sink);
        }
    }

    /// Marks one note processed and applies its effects. Returns false if it
    /// was already resolved.
    fn resolve(&mut self, index: usize, judgment: Judgment, sink: &mut dyn EventSink) -> bool {
        let Some(timed) = self.timeline.get_mut(index) else {
            return false;
        };
        if timed.state.processed {
            return false;
        }
        timed.state.processed = true;
        timed.state.judgment = Some(judgment);
        let kind = timed.note.kind;
        let lane = timed.note.lane;
        let partner = timed.partner;

        self.run.record(judgment, kind, &self.points);
        sink.emit(GameEvent::NoteResolved {
            note_index: index,
            judgment,
        });

        match (kind, partner) {
            (NoteKind::Tap | NoteKind::Decoy, _) => self.detach(index, sink),
            (NoteKind::HoldHead, Some(tail)) => {
                if let Some(open) = self.open_holds.get_mut(lane) {
                    *open = Some(tail);
                }
                if !judgment.breaks_combo() {
                    for half in [index, tail] {
                        if let Some(timed) = self.timeline.get_mut(half) {
                            timed.state.engaged = true;
                        }
                    }
                }
            }
            // The hold's visual goes away with its tail.
            (NoteKind::HoldTail, Some(head)) => {
                if let Some(open) = self.open_holds.get_mut(lane) {
                    if *open == Some(index) {
                        *open = None;
                    }
                }
                self.detach(head, sink);
            }
            (NoteKind::HoldHead, None) => self.detach(index, sink),
            (NoteKind::HoldTail, None) => {}
        }
        true
    }

    fn detach(&mut self, index: usize, sink: &mut dyn EventSink) {
        if let Some(timed) = self.timeline.get_mut(index) {
            if timed.state.materialized {
                timed.state.materialized = false;
                sink.emit(GameEvent::NoteDetached { note_index: index });
            }
        }
    }

    fn emit_judgement(&self, judgment: Judgment, notes: Vec<usize>, delta_ms: Option<f64>, sink: &mut dyn EventSink) {
        sink.emit(GameEvent::Judgement {
            judgment,
            combo_after: self.run.combo(),
            notes,
            feedback: judgment.into(),
            delta_ms,
        });
    }
}
