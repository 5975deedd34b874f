use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Inventory source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Library '{0}' does not exist in the inventory")]
    LibraryNotFound(String),

    #[error("Destructive action was not confirmed")]
    NotConfirmed,

    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Errors that stop a run before any deletion. Everything else is
    /// recorded against an item or stage and the run carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SourceUnavailable(_)
                | Error::LibraryNotFound(_)
                | Error::NotConfirmed
                | Error::Config(_)
        )
    }
}
