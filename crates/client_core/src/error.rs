use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status. `body` is the raw response text.
    #[error("Request Failed: {status_text} \n {body}")]
    Request {
        status: u16,
        status_text: String,
        body: String,
    },
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

impl ClientError {
    /// True when the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ClientError::Decode(value.to_string())
        } else {
            ClientError::Transport(value)
        }
    }
}
