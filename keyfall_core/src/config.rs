use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::chart::layout::SUPPORTED_LANE_COUNTS;
use crate::chart::{Judgment, NoteKind};
use crate::error::SettingsError;

pub const NOTE_COUNT_MIN: usize = 10;
pub const NOTE_COUNT_MAX: usize = 500;
pub const DEFAULT_NOTE_COUNT: usize = 100;

pub const NOTE_SPEED_MIN: f64 = 1.0;
pub const NOTE_SPEED_MAX: f64 = 20.0;

/// Half-widths of the timing windows, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeWindows {
    pub perfect_ms: f64,
    pub good_ms: f64,
    pub bad_ms: f64,
    /// Outer bound. Notes further away than this cannot be touched by input
    /// and resolve only by timeout.
    pub miss_ms: f64,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            perfect_ms: 50.0,
            good_ms: 100.0,
            bad_ms: 150.0,
            miss_ms: 200.0,
        }
    }
}

impl JudgeWindows {
    /// Tightest window first. Between `bad_ms` and `miss_ms` an input is
    /// ignored rather than judged.
    pub fn classify(&self, distance_ms: f64) -> Option<Judgment> {
        if distance_ms <= self.perfect_ms {
            Some(Judgment::Perfect)
        } else if distance_ms <= self.good_ms {
            Some(Judgment::Good)
        } else if distance_ms <= self.bad_ms {
            Some(Judgment::Bad)
        } else {
            None
        }
    }

    fn is_ordered(&self) -> bool {
        0.0 <= self.perfect_ms
            && self.perfect_ms <= self.good_ms
            && self.good_ms <= self.bad_ms
            && self.bad_ms <= self.miss_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointTable {
    pub perfect: u32,
    pub good: u32,
    pub bad: u32,
    pub miss: u32,
}

impl Default for PointTable {
    fn default() -> Self {
        Self {
            perfect: 10,
            good: 5,
            bad: 2,
            miss: 0,
        }
    }
}

impl PointTable {
    pub fn points(&self, judgment: Judgment) -> u32 {
        match judgment {
            Judgment::Perfect => self.perfect,
            Judgment::Good => self.good,
            Judgment::Bad => self.bad,
            Judgment::Miss => self.miss,
        }
    }
}

/// Scroll geometry handed to the presentation layer. Positions are measured
/// downward from the top of the lane, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub note_speed: f64,
    pub lane_height: f64,
    /// Distance from the lane bottom to the judgement line.
    pub judge_line_lift: f64,
    pub tap_height: f64,
    /// How far above the lane a note may sit and still count as on screen.
    pub cull_margin: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            note_speed: Difficulty::Normal.note_speed(),
            lane_height: 800.0,
            judge_line_lift: 100.0,
            tap_height: 25.0,
            cull_margin: 50.0,
        }
    }
}

impl ScrollConfig {
    pub fn pixels_per_ms(&self) -> f64 {
        self.note_speed / 10.0
    }

    /// Bottom edge of a note `time_to_hit` ms away from the judgement line.
    pub fn note_bottom(&self, time_to_hit: f64) -> f64 {
        self.lane_height - self.judge_line_lift - time_to_hit * self.pixels_per_ms()
    }

    pub fn note_height(&self, kind: NoteKind, duration_ms: Option<i64>) -> f64 {
        match (kind, duration_ms) {
            (NoteKind::HoldHead, Some(duration)) => duration as f64 * self.pixels_per_ms(),
            _ => self.tap_height,
        }
    }

    pub fn is_visible(&self, bottom: f64, height: f64) -> bool {
        bottom - height < self.lane_height && bottom > -self.cull_margin
    }

    /// Largest `time_to_hit` at which a note can still be on screen.
    pub fn look_ahead_ms(&self) -> f64 {
        let ppm = self.pixels_per_ms();
        if ppm <= 0.0 {
            return f64::INFINITY;
        }
        (self.lane_height - self.judge_line_lift + self.cull_margin) / ppm
    }
}

/// Note speed a loaded chart plays at: faster songs scroll faster.
pub fn note_speed_for_bpm(bpm: f64) -> f64 {
    (bpm / 20.0).round().clamp(NOTE_SPEED_MIN, NOTE_SPEED_MAX)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn note_speed(self) -> f64 {
        match self {
            Difficulty::Easy => 4.0,
            Difficulty::Normal => 7.0,
            Difficulty::Hard => 10.0,
        }
    }

    pub fn simultaneous_probability(self) -> f64 {
        match self {
            Difficulty::Easy => 0.1,
            Difficulty::Normal => 0.25,
            Difficulty::Hard => 0.4,
        }
    }

    pub fn hold_probability(self) -> f64 {
        match self {
            Difficulty::Easy => 0.1,
            Difficulty::Normal => 0.15,
            Difficulty::Hard => 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub lanes: usize,
    pub note_count: usize,
    pub simultaneous_probability: f64,
    pub hold_probability: f64,
    pub decoy_probability: f64,
    pub windows: JudgeWindows,
    pub points: PointTable,
    pub scroll: ScrollConfig,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Normal)
    }
}

impl GameSettings {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            lanes: 4,
            note_count: DEFAULT_NOTE_COUNT,
            simultaneous_probability: difficulty.simultaneous_probability(),
            hold_probability: difficulty.hold_probability(),
            decoy_probability: 0.0,
            windows: JudgeWindows::default(),
            points: PointTable::default(),
            scroll: ScrollConfig {
                note_speed: difficulty.note_speed(),
                ..ScrollConfig::default()
            },
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: GameSettings = serde_json::from_str(&src)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn clamped_note_count(&self) -> usize {
        self.note_count.clamp(NOTE_COUNT_MIN, NOTE_COUNT_MAX)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !SUPPORTED_LANE_COUNTS.contains(&self.lanes) {
            return Err(SettingsError::Invalid(format!(
                "lanes must be one of {:?} (got {})",
                SUPPORTED_LANE_COUNTS, self.lanes
            )));
        }
        if !self.windows.is_ordered() {
            return Err(SettingsError::Invalid(
                "judge windows must satisfy 0 <= perfect <= good <= bad <= miss".to_string(),
            ));
        }
        for (name, p) in [
            ("simultaneous_probability", self.simultaneous_probability),
            ("hold_probability", self.hold_probability),
            ("decoy_probability", self.decoy_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SettingsError::Invalid(format!("{name} must be within 0..=1 (got {p})")));
            }
        }
        if !(NOTE_SPEED_MIN..=NOTE_SPEED_MAX).contains(&self.scroll.note_speed) {
            return Err(SettingsError::Invalid(format!(
                "note_speed must be within {NOTE_SPEED_MIN}..={NOTE_SPEED_MAX} (got {})",
                self.scroll.note_speed
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_nested_windows() {
        let w = JudgeWindows::default();
        assert_eq!(w.classify(0.0), Some(Judgment::Perfect));
        assert_eq!(w.classify(50.0), Some(Judgment::Perfect));
        assert_eq!(w.classify(50.5), Some(Judgment::Good));
        assert_eq!(w.classify(100.0), Some(Judgment::Good));
        assert_eq!(w.classify(150.0), Some(Judgment::Bad));
        assert_eq!(w.classify(150.1), None);
        assert_eq!(w.classify(199.0), None);
    }

    #[test]
    fn default_points() {
        let p = PointTable::default();
        let values: Vec<u32> = Judgment::ALL.iter().map(|&j| p.points(j)).collect();
        assert_eq!(values, vec![10, 5, 2, 0]);
    }

    #[test]
    fn note_speed_follows_bpm() {
        assert_eq!(note_speed_for_bpm(120.0), 6.0);
        assert_eq!(note_speed_for_bpm(150.0), 8.0);
        assert_eq!(note_speed_for_bpm(5.0), 1.0);
        assert_eq!(note_speed_for_bpm(900.0), 20.0);
    }

    #[test]
    fn note_on_judge_line_sits_at_lift() {
        let scroll = ScrollConfig::default();
        assert_eq!(scroll.note_bottom(0.0), 700.0);
        assert!(scroll.is_visible(scroll.note_bottom(0.0), scroll.tap_height));
    }

    #[test]
    fn look_ahead_matches_visibility_edge() {
        let scroll = ScrollConfig::default();
        let edge = scroll.look_ahead_ms();
        assert!(scroll.is_visible(scroll.note_bottom(edge - 1.0), scroll.tap_height));
        assert!(!scroll.is_visible(scroll.note_bottom(edge + 1.0), scroll.tap_height));
    }

    #[test]
    fn hold_height_scales_with_duration() {
        let scroll = ScrollConfig {
            note_speed: 10.0,
            ..ScrollConfig::default()
        };
        assert_eq!(scroll.note_height(NoteKind::HoldHead, Some(500)), 500.0);
        assert_eq!(scroll.note_height(NoteKind::Tap, None), scroll.tap_height);
    }

    #[test]
    fn difficulty_presets() {
        let hard = GameSettings::for_difficulty(Difficulty::Hard);
        assert_eq!(hard.scroll.note_speed, 10.0);
        assert_eq!(hard.simultaneous_probability, 0.4);
        assert_eq!(hard.hold_probability, 0.2);
        hard.validate().unwrap();
    }

    #[test]
    fn note_count_is_clamped() {
        let mut s = GameSettings::default();
        s.note_count = 3;
        assert_eq!(s.clamped_note_count(), NOTE_COUNT_MIN);
        s.note_count = 10_000;
        assert_eq!(s.clamped_note_count(), NOTE_COUNT_MAX);
    }

    #[test]
    fn validate_rejects_bad_lanes_and_windows() {
        let mut s = GameSettings::default();
        s.lanes = 9;
        assert!(matches!(s.validate(), Err(SettingsError::Invalid(_))));

        let mut s = GameSettings::default();
        s.windows.good_ms = 10.0;
        assert!(s.validate().is_err());

        let mut s = GameSettings::default();
        s.decoy_probability = 1.5;
        assert!(s.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "lanes": 6, "windows": { "miss_ms": 250 } }"#).unwrap();
        let s = GameSettings::load_json(&path).unwrap();
        assert_eq!(s.lanes, 6);
        assert_eq!(s.windows.miss_ms, 250.0);
        assert_eq!(s.windows.perfect_ms, 50.0);
        assert_eq!(s.points, PointTable::default());
    }
}
