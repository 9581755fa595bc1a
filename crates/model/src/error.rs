use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The service could not be reached, or the connection broke before
    /// a response was received.
    Network,
    /// The service answered with a non-success status.
    Api,
    /// The service answered successfully, but the body could not be
    /// understood.
    MalformedResponse,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => "network error".fmt(f),
            ErrorKind::Api => "API error".fmt(f),
            ErrorKind::MalformedResponse => "malformed response".fmt(f),
        }
    }
}
