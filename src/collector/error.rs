use crate::source::error::FetchError;
use crate::store::error::CacheError;
use crate::windows::error::WindowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Invalid collection window")]
    Window(#[from] WindowError),

    #[error("Observation store failed")]
    Cache(#[from] CacheError),

    #[error("Fetching reports failed")]
    Fetch(#[from] FetchError),

    #[error("Upstream for station {station} still refused after {attempts} attempts")]
    RetriesExhausted { station: String, attempts: u32 },

    #[error("Collection was cancelled")]
    Cancelled,
}
