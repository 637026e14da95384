use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("statechart JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
