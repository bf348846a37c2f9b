/// Errors raised while loading a rule package file.
///
/// These are file-level failures: in a batch, one file's error is reported
/// and processing continues with its siblings.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// The file could not be read.
    #[error("error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("error parsing JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but does not deserialize into a rule package.
    #[error("malformed rule package: {0}")]
    Malformed(String),
}
