use std::{fs, path::Path};

use chart_schema::{ChartDocument, ChartNote, LaneRef, Milliseconds, NoteType};
use tracing::{debug, warn};

use super::layout::LaneLayout;
use super::{Chart, Note, NoteKind};
use crate::error::ChartError;

/// What to do with a note whose lane is not part of the active layout, either
/// a real id the layout lacks (`C1` on 4 lanes) or an id no layout has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmappedLanePolicy {
    #[default]
    Reject,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub lane_count: usize,
    pub unmapped: UnmappedLanePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            lane_count: 4,
            unmapped: UnmappedLanePolicy::Reject,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNote {
    pub source_index: usize,
    pub lane: LaneRef,
    pub time: Milliseconds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChart {
    pub chart: Chart,
    pub skipped: Vec<SkippedNote>,
}

pub fn read_document(path: impl AsRef<Path>) -> Result<ChartDocument, ChartError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        ChartError::new("E1001", format!("failed to read chart: {e}")).with_file(path.display().to_string())
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ChartError::new("E2001", format!("malformed chart json: {e}")).with_file(path.display().to_string())
    })
}

pub fn parse_document(json: &str) -> Result<ChartDocument, ChartError> {
    serde_json::from_str(json).map_err(|e| ChartError::new("E2001", format!("malformed chart json: {e}")))
}

pub fn load_chart_file(path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadedChart, ChartError> {
    let path = path.as_ref();
    let doc = read_document(path)?;
    load_chart(&doc, options).map_err(|e| e.with_file(path.display().to_string()))
}

pub fn load_chart_str(json: &str, options: &LoadOptions) -> Result<LoadedChart, ChartError> {
    load_chart(&parse_document(json)?, options)
}

/// Remaps symbolic lanes to physical indices and expands holds into head/tail
/// pairs with fresh hold ids.
pub fn load_chart(doc: &ChartDocument, options: &LoadOptions) -> Result<LoadedChart, ChartError> {
    let layout = LaneLayout::for_lane_count(options.lane_count)?;

    let mut notes = Vec::with_capacity(doc.notes.len());
    let mut skipped = Vec::new();
    let mut next_hold_id: u32 = 0;

    for (index, source) in doc.notes.iter().enumerate() {
        let Some(lane) = source.lane.known().and_then(|id| layout.index_of(id)) else {
            match options.unmapped {
                UnmappedLanePolicy::Reject => {
                    return Err(ChartError::new(
                        "E3002",
                        format!(
                            "lane {} has no mapping for {} lanes",
                            source.lane, options.lane_count
                        ),
                    )
                    .with_note_index(index)
                    .with_lane(&source.lane)
                    .with_time_ms(source.time));
                }
                UnmappedLanePolicy::Skip => {
                    warn!(index, lane = %source.lane, time = source.time, "skipping note on unmapped lane");
                    skipped.push(SkippedNote {
                        source_index: index,
                        lane: source.lane.clone(),
                        time: source.time,
                    });
                    continue;
                }
            }
        };

        if source.time < 0 {
            return Err(ChartError::new("E4002", "note time must be >= 0")
                .with_note_index(index)
                .with_time_ms(source.time));
        }

        match source.duration {
            Some(duration) if duration < 0 => {
                return Err(ChartError::new("E4003", format!("hold duration must be > 0 (got {duration})"))
                    .with_note_index(index)
                    .with_time_ms(source.time));
            }
            Some(duration) if duration > 0 => {
                if source.is_decoy() {
                    warn!(index, "decoy note carries a duration; loading it as a hold");
                }
                if source.time.checked_add(duration).is_none() {
                    return Err(ChartError::new(
                        "E4003",
                        format!("hold of {duration}ms starting at {}ms ends past the representable time range", source.time),
                    )
                    .with_note_index(index)
                    .with_time_ms(source.time));
                }
                notes.extend(Note::hold(source.time, lane, duration, next_hold_id));
                next_hold_id += 1;
            }
            _ => notes.push(match source.note_type {
                Some(NoteType::Decoy) => Note::decoy(source.time, lane),
                Some(NoteType::Tap) | None => Note::tap(source.time, lane),
            }),
        }
    }

    let mut chart = Chart::new(options.lane_count, doc.bpm, notes)?;
    chart.song_name = doc.song_name.clone();
    chart.start_offset_ms = doc.start_time_offset;
    chart.validate()?;

    debug!(
        song = chart.song_name.as_deref().unwrap_or("<untitled>"),
        notes = chart.notes.len(),
        skipped = skipped.len(),
        lanes = chart.lane_count,
        "chart loaded"
    );

    Ok(LoadedChart { chart, skipped })
}

/// Converts a chart back into the external document format, folding each
/// head/tail pair into one note with a `duration`.
pub fn export_document(chart: &Chart) -> Result<ChartDocument, ChartError> {
    let layout = LaneLayout::for_lane_count(chart.lane_count)?;

    let mut notes = Vec::with_capacity(chart.judgeable_count());
    for (index, note) in chart.notes.iter().enumerate() {
        let lane = layout.id_at(note.lane).ok_or_else(|| {
            ChartError::new("E4005", format!("lane index {} out of range", note.lane))
                .with_note_index(index)
                .with_lane(note.lane)
        })?;
        let exported = match note.kind {
            NoteKind::Tap => ChartNote::tap(note.time, lane),
            NoteKind::Decoy => ChartNote {
                note_type: Some(NoteType::Decoy),
                ..ChartNote::tap(note.time, lane)
            },
            NoteKind::HoldHead => ChartNote {
                duration: note.duration,
                ..ChartNote::tap(note.time, lane)
            },
            NoteKind::HoldTail => continue,
        };
        notes.push(exported);
    }

    Ok(ChartDocument {
        song_name: chart.song_name.clone(),
        bpm: chart.bpm,
        start_time_offset: chart.start_offset_ms,
        lanes: Some(chart.lane_count),
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartErrorKind;
    use chart_schema::LaneId;

    fn options(lane_count: usize) -> LoadOptions {
        LoadOptions {
            lane_count,
            ..LoadOptions::default()
        }
    }

    #[test]
    fn remaps_symbolic_lanes_for_lane_count() {
        let json = r#"{ "bpm": 150, "notes": [
            { "time": 100, "lane": "L2" },
            { "time": 200, "lane": "R2" },
            { "time": 300, "lane": "L1" }
        ] }"#;
        let loaded = load_chart_str(json, &options(4)).unwrap();
        let lanes: Vec<usize> = loaded.chart.notes.iter().map(|n| n.lane).collect();
        assert_eq!(lanes, vec![0, 3, 1]);
        assert_eq!(loaded.chart.bpm, 150.0);

        let loaded = load_chart_str(json, &options(8)).unwrap();
        let lanes: Vec<usize> = loaded.chart.notes.iter().map(|n| n.lane).collect();
        assert_eq!(lanes, vec![2, 6, 3]);
    }

    #[test]
    fn durations_expand_to_paired_holds() {
        let json = r#"{ "notes": [
            { "time": 1000, "lane": "L1", "duration": 600 },
            { "time": 1200, "lane": "R1", "duration": 300 },
            { "time": 1300, "lane": "R2" }
        ] }"#;
        let chart = load_chart_str(json, &options(4)).unwrap().chart;
        let kinds: Vec<(Milliseconds, NoteKind, Option<u32>)> =
            chart.notes.iter().map(|n| (n.time, n.kind, n.hold_id)).collect();
        assert_eq!(
            kinds,
            vec![
                (1000, NoteKind::HoldHead, Some(0)),
                (1200, NoteKind::HoldHead, Some(1)),
                (1300, NoteKind::Tap, None),
                (1500, NoteKind::HoldTail, Some(1)),
                (1600, NoteKind::HoldTail, Some(0)),
            ]
        );
    }

    #[test]
    fn false_type_loads_as_decoy() {
        let json = r#"{ "notes": [{ "time": 500, "lane": "R1", "type": "false" }] }"#;
        let chart = load_chart_str(json, &options(4)).unwrap().chart;
        assert_eq!(chart.notes[0].kind, NoteKind::Decoy);
    }

    #[test]
    fn unmapped_lane_is_rejected_by_default() {
        let json = r#"{ "notes": [{ "time": 500, "lane": "C1" }] }"#;
        let err = load_chart_str(json, &options(4)).unwrap_err();
        assert_eq!(err.code, "E3002");
        assert_eq!(err.kind, ChartErrorKind::Layout);
        assert_eq!(err.lane.as_deref(), Some("C1"));
        assert_eq!(err.note_index, Some(0));
    }

    #[test]
    fn unmapped_lane_is_skipped_when_asked() {
        let json = r#"{ "notes": [
            { "time": 500, "lane": "C1" },
            { "time": 600, "lane": "L1" }
        ] }"#;
        let loaded = load_chart_str(
            json,
            &LoadOptions {
                lane_count: 4,
                unmapped: UnmappedLanePolicy::Skip,
            },
        )
        .unwrap();
        assert_eq!(loaded.chart.notes.len(), 1);
        assert_eq!(
            loaded.skipped,
            vec![SkippedNote {
                source_index: 0,
                lane: LaneId::C1.into(),
                time: 500
            }]
        );
    }

    #[test]
    fn unknown_lane_id_is_rejected_as_unmapped() {
        let json = r#"{ "notes": [
            { "time": 100, "lane": "L1" },
            { "time": 500, "lane": "X9" }
        ] }"#;
        let err = load_chart_str(json, &options(8)).unwrap_err();
        assert_eq!(err.code, "E3002");
        assert_eq!(err.kind, ChartErrorKind::Layout);
        assert_eq!(err.lane.as_deref(), Some("X9"));
        assert_eq!(err.note_index, Some(1));
    }

    #[test]
    fn unknown_lane_id_is_skipped_when_asked() {
        let json = r#"{ "notes": [
            { "time": 100, "lane": "L1" },
            { "time": 500, "lane": "X9", "duration": 300 }
        ] }"#;
        let loaded = load_chart_str(
            json,
            &LoadOptions {
                lane_count: 4,
                unmapped: UnmappedLanePolicy::Skip,
            },
        )
        .unwrap();
        assert_eq!(loaded.chart.notes.len(), 1);
        assert_eq!(
            loaded.skipped,
            vec![SkippedNote {
                source_index: 1,
                lane: LaneRef::Unknown("X9".to_string()),
                time: 500
            }]
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = load_chart_str("{ notes: ", &options(4)).unwrap_err();
        assert_eq!(err.code, "E2001");
        assert_eq!(err.kind, ChartErrorKind::Parse);
    }

    #[test]
    fn unsupported_lane_count_is_rejected_before_parsing_notes() {
        let err = load_chart_str(r#"{ "notes": [] }"#, &options(9)).unwrap_err();
        assert_eq!(err.code, "E3001");
    }

    #[test]
    fn negative_duration_is_rejected() {
        let json = r#"{ "notes": [{ "time": 500, "lane": "L1", "duration": -10 }] }"#;
        assert_eq!(load_chart_str(json, &options(4)).unwrap_err().code, "E4003");
    }

    #[test]
    fn hold_ending_past_time_range_is_rejected() {
        let json = r#"{ "notes": [
            { "time": 100, "lane": "R1" },
            { "time": 9223372036854775000, "lane": "L1", "duration": 1000 }
        ] }"#;
        let err = load_chart_str(json, &options(4)).unwrap_err();
        assert_eq!(err.code, "E4003");
        assert_eq!(err.kind, ChartErrorKind::Validation);
        assert_eq!(err.note_index, Some(1));
    }

    #[test]
    fn unsorted_source_notes_are_sorted() {
        let json = r#"{ "notes": [
            { "time": 900, "lane": "L1" },
            { "time": 100, "lane": "R1" }
        ] }"#;
        let chart = load_chart_str(json, &options(4)).unwrap().chart;
        assert_eq!(chart.notes[0].time, 100);
        assert_eq!(chart.notes[1].time, 900);
    }

    #[test]
    fn export_folds_holds_back_into_durations() {
        let json = r#"{ "songName": "Loop", "bpm": 128, "startTimeOffset": 40, "notes": [
            { "time": 1000, "lane": "L1", "duration": 600 },
            { "time": 1100, "lane": "R2", "type": "false" }
        ] }"#;
        let chart = load_chart_str(json, &options(4)).unwrap().chart;
        let doc = export_document(&chart).unwrap();
        assert_eq!(doc.song_name.as_deref(), Some("Loop"));
        assert_eq!(doc.start_time_offset, 40.0);
        assert_eq!(doc.lanes, Some(4));
        assert_eq!(doc.notes.len(), 2);
        assert_eq!(doc.notes[0].duration, Some(600));
        assert!(doc.notes[1].is_decoy());

        let reloaded = load_chart(&doc, &options(4)).unwrap().chart;
        assert_eq!(reloaded, chart);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_chart_file(dir.path().join("nope.json"), &options(4)).unwrap_err();
        assert_eq!(err.code, "E1001");
        assert!(err.file.is_some());
    }
}
