pub mod conductor;
pub mod source;

pub use self::conductor::{FreeClock, MediaClock, SongClock};
pub use self::source::{ManualTimeSource, SystemTimeSource, TimeSource};
