use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream asked us to slow down. Retrying the same request later is
    /// expected to succeed.
    #[error("Upstream temporarily refused the request: {message}")]
    Transient { message: String },

    /// The upstream answered but holds no reports for the requested interval.
    #[error("No reports available for the requested interval")]
    NoData,

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },
}
