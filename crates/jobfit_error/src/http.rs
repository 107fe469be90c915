//! Conversions from `reqwest` client failures.

use crate::UpstreamError;

impl From<&reqwest::Error> for UpstreamError {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else if err.is_connect() {
            UpstreamError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::status(status.as_u16(), err.to_string())
        } else {
            UpstreamError::Message(err.to_string())
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::from(&err)
    }
}
