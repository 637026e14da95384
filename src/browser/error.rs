use thiserror::Error;

/// Failures talking to the page driver process.
///
/// Stale elements and off-origin redirects are not errors: they come back
/// as [`FireOutcome`](crate::browser::driver::FireOutcome) values.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The Node.js driver process failed to spawn.
    #[error("failed to spawn {script} (is Node.js installed?): {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the driver's stdio failed.
    #[error("driver I/O error: {0}")]
    Io(String),

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The driver answered `ok: false`, or an answer was missing a field.
    #[error("driver command '{command}' failed: {error}")]
    Protocol { command: String, error: String },
}
