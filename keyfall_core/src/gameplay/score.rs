use std::fmt;

use serde::Serialize;

use crate::chart::{Judgment, NoteKind};
use crate::config::PointTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JudgmentCounts {
    pub perfect: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
}

impl JudgmentCounts {
    pub fn get(&self, judgment: Judgment) -> u32 {
        match judgment {
            Judgment::Perfect => self.perfect,
            Judgment::Good => self.good,
            Judgment::Bad => self.bad,
            Judgment::Miss => self.miss,
        }
    }

    fn increment(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Perfect => self.perfect += 1,
            Judgment::Good => self.good += 1,
            Judgment::Bad => self.bad += 1,
            Judgment::Miss => self.miss += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.good + self.bad + self.miss
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub score: u64,
    pub max_score: u64,
    pub max_combo: u32,
    pub counts: JudgmentCounts,
    pub judged_notes: usize,
    pub total_notes: usize,
    pub rank: Rank,
}

/// Score and combo bookkeeping for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    score: u64,
    combo: u32,
    max_combo: u32,
    counts: JudgmentCounts,
    judged_notes: usize,
    total_notes: usize,
    /// Resolutions that award points: every note, hold tails included.
    scoring_notes: usize,
}

impl RunState {
    pub fn new(total_notes: usize, scoring_notes: usize) -> Self {
        Self {
            total_notes,
            scoring_notes,
            ..Self::default()
        }
    }

    pub fn record(&mut self, judgment: Judgment, kind: NoteKind, points: &PointTable) {
        self.counts.increment(judgment);
        self.score += u64::from(points.points(judgment));
        if judgment.breaks_combo() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
        // A hold counts once, when its tail resolves.
        if kind != NoteKind::HoldHead {
            self.judged_notes += 1;
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn counts(&self) -> JudgmentCounts {
        self.counts
    }

    pub fn judged_notes(&self) -> usize {
        self.judged_notes
    }

    pub fn total_notes(&self) -> usize {
        self.total_notes
    }

    pub fn is_complete(&self) -> bool {
        self.total_notes > 0 && self.judged_notes >= self.total_notes
    }

    pub fn max_score(&self, points: &PointTable) -> u64 {
        self.scoring_notes as u64 * u64::from(points.perfect)
    }

    pub fn rank(&self, points: &PointTable) -> Rank {
        let max = self.max_score(points);
        if max == 0 {
            return Rank::C;
        }
        let percentage = self.score as f64 / max as f64 * 100.0;
        if percentage >= 100.0 {
            Rank::S
        } else if percentage >= 90.0 {
            Rank::A
        } else if percentage >= 70.0 {
            Rank::B
        } else {
            Rank::C
        }
    }

    pub fn summary(&self, points: &PointTable) -> RunSummary {
        RunSummary {
            score: self.score,
            max_score: self.max_score(points),
            max_combo: self.max_combo,
            counts: self.counts,
            judged_notes: self.judged_notes,
            total_notes: self.total_notes,
            rank: self.rank(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combo_grows_on_hits_and_resets_on_bad() {
        let points = PointTable::default();
        let mut run = RunState::new(4, 4);
        run.record(Judgment::Perfect, NoteKind::Tap, &points);
        run.record(Judgment::Good, NoteKind::Tap, &points);
        assert_eq!(run.combo(), 2);
        run.record(Judgment::Bad, NoteKind::Tap, &points);
        assert_eq!(run.combo(), 0);
        assert_eq!(run.max_combo(), 2);
        assert_eq!(run.score(), 17);
        assert_eq!(run.counts().total(), 3);
    }

    #[test]
    fn hold_heads_do_not_count_toward_completion() {
        let points = PointTable::default();
        let mut run = RunState::new(1, 2);
        run.record(Judgment::Perfect, NoteKind::HoldHead, &points);
        assert_eq!(run.judged_notes(), 0);
        assert!(!run.is_complete());
        run.record(Judgment::Perfect, NoteKind::HoldTail, &points);
        assert!(run.is_complete());
    }

    #[test]
    fn empty_run_is_never_complete() {
        assert!(!RunState::new(0, 0).is_complete());
        assert_eq!(RunState::new(0, 0).rank(&PointTable::default()), Rank::C);
    }

    #[test]
    fn rank_thresholds() {
        let points = PointTable::default();
        let mut run = RunState::new(10, 10);
        for _ in 0..10 {
            run.record(Judgment::Perfect, NoteKind::Tap, &points);
        }
        assert_eq!(run.rank(&points), Rank::S);

        let mut run = RunState::new(10, 10);
        for _ in 0..9 {
            run.record(Judgment::Perfect, NoteKind::Tap, &points);
        }
        run.record(Judgment::Miss, NoteKind::Tap, &points);
        assert_eq!(run.rank(&points), Rank::A);

        let mut run = RunState::new(10, 10);
        for _ in 0..7 {
            run.record(Judgment::Perfect, NoteKind::Tap, &points);
        }
        assert_eq!(run.rank(&points), Rank::B);

        run.record(Judgment::Miss, NoteKind::Tap, &points);
        let summary = run.summary(&points);
        assert_eq!(summary.max_score, 100);
        assert_eq!(summary.score, 70);
        assert_eq!(summary.counts.miss, 1);
    }
}
