use thiserror::Error;

/// Failures of the project-file store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read project file: {0}")]
    Unreadable(#[source] std::io::Error),
    #[error("project file is not well-formed: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to serialize project: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write project file: {0}")]
    Unwritable(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("no reply content from the LLM")]
    EmptyReply,
}

/// Per-query search failures. These abort the current query only; the
/// retrieval stage logs them and moves on to the next query.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("WebDriver command failed: {0}")]
    Driver(#[from] thirtyfour::error::WebDriverError),
    #[error("search results did not load within the timeout")]
    ResultsTimeout,
}

/// Fatal-to-stage conditions. Progress persisted before the failure is
/// always retained; re-running the stage is the retry mechanism.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("query generation failed: {0}")]
    GenerationFailure(String),
    #[error("unsupported search engine: {0}")]
    UnsupportedEngine(String),
    #[error("no search results found in project file")]
    NoSearchResults,
    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
    #[error("CSV export failed: {0}")]
    ExportIo(#[from] std::io::Error),
}
