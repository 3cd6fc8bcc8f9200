use thiserror::Error;

/// Transport and decoding failures against the listing store's REST boundary.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("connect failure: {0}")]
    Connect(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("http error {status}")]
    Http {
        status: reqwest::StatusCode,
        retriable: bool,
    },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

impl ClientError {
    /// Whether a single failed poll attempt may be absorbed by the retry
    /// budget. Client-side errors (4xx, bad base url) will not heal on their
    /// own; everything transport-shaped might.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidUrl(_) => false,
            Self::Http { retriable, .. } => *retriable,

            Self::Connect(_) => true,
            Self::ConnectTimeout => true,
            Self::RequestTimeout => true,
            Self::Decode(_) => true,
            Self::Unknown(_) => true,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if let Some(status) = err.status() {
            Self::Http {
                status,
                retriable: status.is_server_error(),
            }
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_request() || err.is_connect() {
            // DNS, refused connections
            Self::Connect(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

/// Analysis could not be started. Never retried automatically; the caller
/// surfaces it and the user may trigger again.
#[derive(Error, Debug)]
pub enum TriggerError {
    /// The store refused the trigger (unknown listing, not the owner,
    /// server-side validation).
    #[error("analysis trigger rejected with status {status}")]
    Rejected { status: reqwest::StatusCode },

    #[error(transparent)]
    Transport(ClientError),
}

impl From<ClientError> for TriggerError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http { status, .. } if status.is_client_error() => {
                Self::Rejected { status }
            }
            other => Self::Transport(other),
        }
    }
}
