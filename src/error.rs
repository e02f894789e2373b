use std::fmt;

/// Errors the matching core surfaces to callers that need to branch on kind.
///
/// Everything below the core (CLI, CSV loading) mostly deals in `anyhow::Error`
/// directly; this enum exists only for the handful of cases callers need to
/// distinguish programmatically.
#[derive(Debug)]
pub enum MatchError {
    /// Configuration is invalid: bad weights, non-positive radius, etc.
    InvalidConfiguration(String),
    /// The first observation produced no candidates at any radius.
    NoStartingCandidates,
    /// The underlying spatial store failed.
    Store(anyhow::Error),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            MatchError::NoStartingCandidates => {
                write!(f, "no starting candidates for the first observation")
            }
            MatchError::Store(err) => write!(f, "spatial store error: {err}"),
        }
    }
}

impl std::error::Error for MatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MatchError::Store(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for MatchError {
    fn from(err: anyhow::Error) -> Self {
        MatchError::Store(err)
    }
}
