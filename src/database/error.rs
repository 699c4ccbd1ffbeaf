use thiserror::Error;

/// A storage failure. Every gateway operation surfaces the underlying
/// driver error unchanged; nothing is retried.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite rejected the operation: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("The store connection has been closed.")]
    Closed,

    #[error("Blocking store task failed: {0}")]
    Worker(String),
}
