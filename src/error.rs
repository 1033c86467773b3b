use crate::collector::error::CollectError;
use crate::rules::error::RulesetError;
use crate::store::error::CacheError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetarArchiveError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Ruleset(#[from] RulesetError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Period does not describe a valid range of days")]
    InvalidPeriod,
}
