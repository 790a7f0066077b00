use chart_schema::Milliseconds;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartErrorKind {
    Io,
    Parse,
    Layout,
    Validation,
}

impl ChartErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Io
            "E1001" => Self::Io,

            // Parse
            "E2001" => Self::Parse,

            // Layout: lane count and symbolic lane mapping
            "E3001" | "E3002" => Self::Layout,

            // Validation
            "E4001" | "E4002" | "E4003" | "E4004" | "E4005" | "E4006" | "E4007" => Self::Validation,

            _ => Self::Validation,
        }
    }
}

/// Rejection raised while loading, generating or validating a chart.
///
/// The message stays the source of truth; the structured fields are filled in
/// where the failing location is known.
#[derive(Debug, Error, Clone)]
#[error("{code}: {message}")]
pub struct ChartError {
    pub code: &'static str,
    pub kind: ChartErrorKind,
    pub message: String,

    pub file: Option<String>,
    pub note_index: Option<usize>,
    pub lane: Option<String>,
    pub time_ms: Option<Milliseconds>,
}

impl ChartError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: ChartErrorKind::from_code(code),
            message: message.into(),

            file: None,
            note_index: None,
            lane: None,
            time_ms: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_note_index(mut self, note_index: usize) -> Self {
        self.note_index = Some(note_index);
        self
    }

    pub fn with_lane(mut self, lane: impl ToString) -> Self {
        self.lane = Some(lane.to_string());
        self
    }

    pub fn with_time_ms(mut self, time_ms: Milliseconds) -> Self {
        self.time_ms = Some(time_ms);
        self
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_code_and_message() {
        let err = ChartError::new("E3002", "lane R3 has no mapping for 4 lanes")
            .with_note_index(7)
            .with_lane("R3");
        assert_eq!(err.to_string(), "E3002: lane R3 has no mapping for 4 lanes");
        assert_eq!(err.kind, ChartErrorKind::Layout);
        assert_eq!(err.note_index, Some(7));
        assert_eq!(err.lane.as_deref(), Some("R3"));
    }

    #[test]
    fn codes_map_to_kinds() {
        assert_eq!(ChartErrorKind::from_code("E1001"), ChartErrorKind::Io);
        assert_eq!(ChartErrorKind::from_code("E2001"), ChartErrorKind::Parse);
        assert_eq!(ChartErrorKind::from_code("E3001"), ChartErrorKind::Layout);
        assert_eq!(ChartErrorKind::from_code("E4006"), ChartErrorKind::Validation);
    }
}
