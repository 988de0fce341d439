//! Plumbing shared by the HTTP adapters.

use crate::parley::endpoint::EndpointError;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a `reqwest::Client` whose every request is bounded by `timeout_secs`.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, EndpointError> {
    reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|err| EndpointError::Request(format!("could not build HTTP client: {}", err)))
}

/// Classify a transport error.
pub fn map_reqwest_error(err: reqwest::Error) -> EndpointError {
    map_reqwest_error_ref(&err)
}

/// Classify a transport error the caller does not own, e.g. one wrapped by an SDK.
pub fn map_reqwest_error_ref(err: &reqwest::Error) -> EndpointError {
    if err.is_timeout() {
        EndpointError::Timeout(err.to_string())
    } else if err.is_connect() {
        EndpointError::Connection(err.to_string())
    } else if err.is_decode() {
        EndpointError::MalformedResponse(err.to_string())
    } else if let Some(status) = err.status() {
        EndpointError::Status {
            code: status.as_u16(),
            body: String::new(),
        }
    } else {
        EndpointError::Request(err.to_string())
    }
}

/// Join `base_url` and `path` with exactly one slash between them.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Turn a response into `T`, failing on a non-2xx status or an undecodable body.
pub async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, EndpointError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EndpointError::Status {
            code: status.as_u16(),
            body: body.trim().to_string(),
        });
    }

    let text = response.text().await.map_err(map_reqwest_error)?;
    serde_json::from_str(&text).map_err(|err| EndpointError::MalformedResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(
            join_url("http://localhost:11434/", "/api/generate"),
            "http://localhost:11434/api/generate"
        );
        assert_eq!(join_url("http://h", "v1/models"), "http://h/v1/models");
    }
}
