use thiserror::Error;

/// Failures that stop a block or a session.
///
/// Incorrect answers and clicks that miss every option are not errors; they are
/// recorded or ignored by the block runner.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("session cancelled by the participant")]
    Cancelled,

    #[error("input source closed before the session finished")]
    InputClosed,

    #[error("palette needs at least {required} colors, got {actual}")]
    PaletteTooSmall { required: usize, actual: usize },

    #[error("color `{0}` is not in the palette")]
    UnknownColor(String),

    #[error("color `{0}` appears more than once in the palette")]
    DuplicateColor(String),

    #[error("no string table for language `{0}`")]
    UnsupportedLanguage(String),

    #[error("language `{language}` has no word for color `{color}`")]
    MissingColorWord { language: String, color: String },

    #[error("invalid stimulus: {0}")]
    InvalidStimulus(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("display failure: {0}")]
    Display(String),

    #[error("could not serialize {what}: {message}")]
    Serialization { what: &'static str, message: String },
}

impl ExperimentError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExperimentError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_failure_names_what_was_written() {
        let err = ExperimentError::Serialization {
            what: "session summary",
            message: "key must be a string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "could not serialize session summary: key must be a string"
        );
        assert!(!err.is_cancelled());
    }
}
