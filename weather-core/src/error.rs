use std::error::Error as StdError;

use thiserror::Error;

/// Why a fetch cycle ended in the `Error` state.
///
/// `Transport` and `Parse` carry the underlying cause in their message;
/// `Service` deliberately renders a fixed message regardless of status.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error fetching data: {0}")]
    Transport(String),

    #[error("Error fetching data: malformed response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to load weather data")]
    Service { status: u16 },
}

impl FetchError {
    /// Transport failure described by the error and every `source()` below it.
    pub fn transport(err: &(dyn StdError + 'static)) -> Self {
        let mut message = err.to_string();
        let mut cause = err.source();
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }
        FetchError::Transport(message)
    }
}

// The request URL carries `appid`, so it never goes into the message.
impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::transport(&err.without_url())
    }
}
