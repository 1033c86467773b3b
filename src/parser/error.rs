use thiserror::Error;

/// Raised only when a report lacks the tokens needed to key it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty report")]
    Empty,

    #[error("Missing or invalid timestamp '{token}' in report '{raw}'")]
    InvalidTimestamp { token: String, raw: String },

    #[error("Missing station identifier in report '{raw}'")]
    MissingStation { raw: String },
}
