//! Note-timeline scheduler and judgement engine for a lane-based rhythm game.
//!
//! A [`chart::Chart`] is loaded or generated once, expanded into a
//! [`gameplay::timeline::Timeline`] and driven by a [`gameplay::session::Session`]
//! that owns the clock, the judge and the event sink for one run.

pub mod chart;
pub mod config;
pub mod error;
pub mod gameplay;
pub mod input;
pub mod time;

pub use chart::{Chart, Judgment, Note, NoteKind};
pub use config::GameSettings;
pub use error::{ChartError, ChartErrorKind, SettingsError};
pub use gameplay::events::{EventSink, GameEvent};
pub use gameplay::session::{RunPhase, Session};
