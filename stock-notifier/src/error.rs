use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
    #[error("catalog request failed: {0}")]
    Transport(String),
    #[error("catalog endpoint returned HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("failed to decode catalog response: {0}")]
    Decode(String),
}

/// Failures that end a pass. Publish failures are not here; they come back as
/// [`crate::publisher::PublishOutcome::Failed`].
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error(transparent)]
    Fetch(#[from] CatalogError),
}
