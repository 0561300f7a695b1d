use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to open trace db '{path}': {source}")]
    OpenDb {
        path: String,
        #[source]
        source: tokio_rusqlite::Error,
    },
    #[error("Failed to initialize trace db: {source}")]
    InitDb {
        #[source]
        source: tokio_rusqlite::Error,
    },
    #[error("Failed to write debug traces: {source}")]
    WriteTraces {
        #[source]
        source: tokio_rusqlite::Error,
    },
    #[error("Failed to serialize debug trace: {source}")]
    SerializeTrace {
        #[source]
        source: serde_json::Error,
    },
}
