//! Error types for the realtime layer.
use std::error::Error as StdError;
use std::fmt;

/// Errors raised inside the realtime subsystem.
///
/// None of these ever reach an HTTP response for a write request: the router
/// logs and drops them. They exist so that callers inside the subsystem can
/// tell a stopped hub apart from a failed recipient lookup.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: RealtimeErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum RealtimeErrorKind {
    /// The hub control loop is no longer running.
    HubClosed,
    /// Recipients for an event could not be resolved.
    Resolution(ResolutionErrorKind),
    /// An event payload could not be serialized.
    Serialization,
}

#[derive(Debug, PartialEq)]
pub enum ResolutionErrorKind {
    /// The conversation or user no longer exists.
    NotFound,
    Other(String),
}

impl Error {
    pub fn hub_closed() -> Self {
        Error {
            source: None,
            error_kind: RealtimeErrorKind::HubClosed,
        }
    }

    pub fn not_found() -> Self {
        Error {
            source: None,
            error_kind: RealtimeErrorKind::Resolution(ResolutionErrorKind::NotFound),
        }
    }

    pub fn resolution<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            error_kind: RealtimeErrorKind::Resolution(ResolutionErrorKind::Other(err.to_string())),
            source: Some(Box::new(err)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error_kind == RealtimeErrorKind::Resolution(ResolutionErrorKind::NotFound)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            RealtimeErrorKind::HubClosed => write!(f, "realtime hub is not running"),
            RealtimeErrorKind::Resolution(ResolutionErrorKind::NotFound) => {
                write!(f, "recipients not found")
            }
            RealtimeErrorKind::Resolution(ResolutionErrorKind::Other(msg)) => {
                write!(f, "recipient resolution failed: {msg}")
            }
            RealtimeErrorKind::Serialization => write!(f, "event serialization failed"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: RealtimeErrorKind::Serialization,
        }
    }
}
