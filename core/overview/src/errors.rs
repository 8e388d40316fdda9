//! Error types for the overview facade.

use app_overview_tree::errors::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum OverviewError {
    /// The overview was read before the host reported readiness. Retry once
    /// the application is ready.
    #[error("the application must be in ready status to access the overview")]
    NotReady,

    /// A notification could not be applied to the tree.
    #[error(transparent)]
    Build(BuildError),

    /// The overview could not be rendered as JSON.
    #[error("failed to serialize the overview: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<BuildError> for OverviewError {
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::NotReady => OverviewError::NotReady,
            other => OverviewError::Build(other),
        }
    }
}
