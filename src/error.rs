use std::{error::Error, fmt::Display};

#[derive(Debug)]
pub enum FetchError {
    Request(reqwest::Error),
    Status(reqwest::StatusCode),
    Decode(reqwest::Error),
    NoMedia,
}

impl Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request failed: {e}"),
            Self::Status(status) => write!(f, "unexpected response status {status}"),
            Self::Decode(e) => write!(f, "could not decode response: {e}"),
            Self::NoMedia => write!(f, "response contained no media"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Request(e) | Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

/// Send a request and decode a successful JSON response
pub(crate) async fn fetch_json<T>(request: reqwest::RequestBuilder) -> Result<T, FetchError>
where
    T: serde::de::DeserializeOwned,
{
    let response = request.send().await.map_err(FetchError::Request)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    response.json::<T>().await.map_err(FetchError::Decode)
}
