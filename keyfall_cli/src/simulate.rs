use crossbeam_channel::{unbounded, Receiver};
use keyfall_core::chart::{Chart, Judgment, NoteKind};
use keyfall_core::config::GameSettings;
use keyfall_core::gameplay::events::{CountdownStep, GameEvent};
use keyfall_core::gameplay::score::RunSummary;
use keyfall_core::input::events::LaneInput;
use keyfall_core::input::InputQueue;
use keyfall_core::time::{FreeClock, ManualTimeSource};
use keyfall_core::{RunPhase, Session};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Wall time one countdown step takes.
const COUNTDOWN_STEP_MS: f64 = 1000.0;
/// Song time after the last note before an unfinished run is ended.
const END_GRACE_MS: f64 = 2000.0;
/// How long an autoplayed tap stays pressed.
const TAP_PRESS_MS: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub offset_ms: f64,
    pub jitter_ms: f64,
    pub seed: u64,
    pub pause_at_ms: Option<f64>,
    pub pause_for_ms: f64,
    pub frame_ms: f64,
    /// Suppress per-judgement output.
    pub quiet: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            offset_ms: 0.0,
            jitter_ms: 0.0,
            seed: 0,
            pause_at_ms: None,
            pause_for_ms: 2000.0,
            frame_ms: 16.0,
            quiet: false,
        }
    }
}

/// Key presses a perfect player would make, shifted by the configured timing
/// error. Decoys are left alone; holds are held from head to tail.
fn autoplay_inputs(chart: &Chart, options: &SimulationOptions) -> Vec<LaneInput> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let timing_error = |rng: &mut StdRng| {
        let jitter = if options.jitter_ms > 0.0 {
            rng.gen_range(-options.jitter_ms..=options.jitter_ms)
        } else {
            0.0
        };
        options.offset_ms + jitter
    };

    let mut inputs = Vec::with_capacity(chart.notes.len() * 2);
    for note in &chart.notes {
        let at = note.time as f64 + timing_error(&mut rng);
        match note.kind {
            NoteKind::Tap => {
                inputs.push(LaneInput::down(note.lane, at));
                inputs.push(LaneInput::up(note.lane, at + TAP_PRESS_MS));
            }
            NoteKind::HoldHead => inputs.push(LaneInput::down(note.lane, at)),
            NoteKind::HoldTail => inputs.push(LaneInput::up(note.lane, at)),
            NoteKind::Decoy => {}
        }
    }
    inputs.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
    inputs
}

pub fn run_simulation(
    chart: &Chart,
    settings: &GameSettings,
    options: &SimulationOptions,
) -> anyhow::Result<RunSummary> {
    if options.frame_ms <= 0.0 {
        anyhow::bail!("frame length must be positive (got {})", options.frame_ms);
    }

    let source = ManualTimeSource::new(0.0);
    let (tx, rx) = unbounded();
    let mut session = Session::new(chart, settings, Box::new(FreeClock::start(source.clone())), Box::new(tx));

    let inputs = autoplay_inputs(chart, options);
    let mut pending = inputs.iter().peekable();
    let queue = InputQueue::new();
    let producer = queue.producer();

    let end_ms = chart.last_time() as f64 + END_GRACE_MS;
    let mut pause_at = options.pause_at_ms;
    let mut summary = None;

    info!(notes = chart.notes.len(), inputs = inputs.len(), "autoplay started");
    run_countdown(&mut session, &source);

    while session.phase() != RunPhase::Finished {
        source.advance(options.frame_ms);
        let now = session.elapsed_ms();

        if pause_at.is_some_and(|at| now >= at) {
            pause_at = None;
            session.pause();
            debug!(at_ms = now, "paused");
            source.advance(options.pause_for_ms);
            session.resume();
            run_countdown(&mut session, &source);
        }

        while let Some(input) = pending.next_if(|i| i.timestamp_ms <= now) {
            producer.send(*input);
        }
        session.drain_input(&queue);
        session.tick();

        summary = report_events(&rx, now, options.quiet).or(summary);

        if now > end_ms {
            break;
        }
    }

    if session.phase() != RunPhase::Finished {
        session.end();
        summary = report_events(&rx, session.elapsed_ms(), options.quiet).or(summary);
    }

    summary.ok_or_else(|| anyhow::anyhow!("run ended without a summary"))
}

fn run_countdown(session: &mut Session, source: &ManualTimeSource) {
    while session.advance_countdown() != CountdownStep::Done {
        source.advance(COUNTDOWN_STEP_MS);
    }
}

/// Prints pending events and returns the run summary if one arrived.
fn report_events(rx: &Receiver<GameEvent>, now: f64, quiet: bool) -> Option<RunSummary> {
    let mut summary = None;
    for event in rx.try_iter() {
        match event {
            GameEvent::Judgement {
                judgment,
                combo_after,
                notes,
                delta_ms,
                ..
            } if !quiet => {
                let delta = delta_ms.map(|d| format!("{d:+.0} ms")).unwrap_or_else(|| "-".to_string());
                println!(
                    "{now:>8.0} | {:<7} | notes {notes:?} | delta {delta} | combo {combo_after}",
                    judgment.label()
                );
            }
            GameEvent::Countdown(step) if !quiet => match step {
                CountdownStep::Count(n) => println!("{n}"),
                CountdownStep::Start => println!("START"),
                CountdownStep::Done => {}
            },
            GameEvent::RunComplete { summary: s } => summary = Some(s),
            _ => {}
        }
    }
    summary
}

pub fn print_summary(summary: &RunSummary) {
    println!("Score: {} / {}", summary.score, summary.max_score);
    println!("Max combo: {}", summary.max_combo);
    let counts = Judgment::ALL
        .iter()
        .map(|&j| format!("{}: {}", j.label(), summary.counts.get(j)))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{counts}");
    println!("Judged: {} / {}", summary.judged_notes, summary.total_notes);
    println!("Rank: {}", summary.rank);
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyfall_core::chart::Note;
    use keyfall_core::gameplay::score::Rank;

    #[test]
    fn autoplay_skips_decoys_and_holds_through_tails() {
        let mut notes = vec![Note::tap(1000, 0), Note::decoy(1200, 1)];
        notes.extend(Note::hold(1500, 2, 500, 0));
        let chart = Chart::new(4, 120.0, notes).unwrap();

        let inputs = autoplay_inputs(&chart, &SimulationOptions::default());
        assert_eq!(
            inputs,
            vec![
                LaneInput::down(0, 1000.0),
                LaneInput::up(0, 1040.0),
                LaneInput::down(2, 1500.0),
                LaneInput::up(2, 2000.0),
            ]
        );
    }

    #[test]
    fn perfect_autoplay_ranks_s() {
        let mut notes = vec![Note::tap(1000, 0), Note::tap(1000, 3), Note::decoy(1400, 1)];
        notes.extend(Note::hold(1800, 2, 600, 0));
        let chart = Chart::new(4, 120.0, notes).unwrap();
        let options = SimulationOptions {
            quiet: true,
            ..SimulationOptions::default()
        };

        let summary = run_simulation(&chart, &GameSettings::default(), &options).unwrap();
        assert_eq!(summary.counts.perfect, 5);
        assert_eq!(summary.counts.miss, 0);
        assert_eq!(summary.max_combo, 5);
        assert_eq!(summary.rank, Rank::S);
    }

    #[test]
    fn late_autoplay_drops_to_good() {
        let chart = Chart::new(4, 120.0, vec![Note::tap(1000, 1), Note::tap(1500, 2)]).unwrap();
        let options = SimulationOptions {
            offset_ms: 80.0,
            quiet: true,
            pause_at_ms: Some(1200.0),
            ..SimulationOptions::default()
        };

        let summary = run_simulation(&chart, &GameSettings::default(), &options).unwrap();
        assert_eq!(summary.counts.good, 2);
        assert_eq!(summary.judged_notes, 2);
    }
}
