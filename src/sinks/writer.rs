use tokio::{sync::mpsc, task::JoinHandle};
use tokio_rusqlite::Connection;
use tracing::{error, info};

use crate::error::{AppError, AppResult, SinkError};
use crate::pipeline::DebugTrace;

pub const DB_FLUSH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct TraceWriterConfig {
    pub db_url: String,
    pub flush_size: usize,
}

impl TraceWriterConfig {
    #[must_use]
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            flush_size: DB_FLUSH_SIZE,
        }
    }
}

struct TraceRow {
    report_id: String,
    event_id: String,
    api_id: String,
    uuid: String,
    status: &'static str,
    request_code: u16,
    payload: String,
}

impl TraceRow {
    fn from_trace(trace: &DebugTrace) -> Result<Self, SinkError> {
        let payload =
            serde_json::to_string(trace).map_err(|source| SinkError::SerializeTrace { source })?;
        Ok(Self {
            report_id: trace.report_id.clone(),
            event_id: trace.event_id.clone(),
            api_id: trace.api_id.clone(),
            uuid: trace.uuid.clone(),
            status: trace.status.as_str(),
            request_code: trace.request_code,
            payload,
        })
    }
}

/// Spawns the writer task. It drains `trace_rx` until every sender is
/// dropped and returns the number of traces persisted.
///
/// Opening or initializing the database is fatal to the writer; individual
/// write failures are logged and the affected batch is dropped.
#[must_use]
pub fn setup_trace_writer(
    config: TraceWriterConfig,
    mut trace_rx: mpsc::UnboundedReceiver<DebugTrace>,
) -> JoinHandle<AppResult<u64>> {
    tokio::spawn(async move {
        let conn = open_trace_db(&config.db_url).await?;
        let flush_size = config.flush_size.max(1);
        let mut buffer: Vec<TraceRow> = Vec::with_capacity(flush_size);
        let mut written: u64 = 0;

        while let Some(trace) = trace_rx.recv().await {
            match TraceRow::from_trace(&trace) {
                Ok(row) => buffer.push(row),
                Err(err) => error!("Dropping debug trace: {}", err),
            }
            if buffer.len() >= flush_size {
                written = written.saturating_add(flush_or_drop(&conn, &mut buffer).await);
            }
        }
        written = written.saturating_add(flush_or_drop(&conn, &mut buffer).await);
        info!("Persisted {} debug traces to {}.", written, config.db_url);
        Ok(written)
    })
}

async fn open_trace_db(db_url: &str) -> AppResult<Connection> {
    let conn = Connection::open(db_url).await.map_err(|source| {
        AppError::sink(SinkError::OpenDb {
            path: db_url.to_owned(),
            source,
        })
    })?;
    conn.call(|conn| {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS debug_traces (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                report_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                api_id TEXT NOT NULL,
                uuid TEXT NOT NULL,
                status TEXT NOT NULL,
                request_code INTEGER NOT NULL,
                payload TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_debug_traces_report_id ON debug_traces(report_id);
            CREATE INDEX IF NOT EXISTS idx_debug_traces_event_id ON debug_traces(event_id);
            CREATE INDEX IF NOT EXISTS idx_debug_traces_status ON debug_traces(status);",
        )?;
        Ok(())
    })
    .await
    .map_err(|source| AppError::sink(SinkError::InitDb { source }))?;
    Ok(conn)
}

async fn flush_or_drop(conn: &Connection, buffer: &mut Vec<TraceRow>) -> u64 {
    let count = u64::try_from(buffer.len()).unwrap_or(u64::MAX);
    match flush_trace_rows(conn, buffer).await {
        Ok(()) => count,
        Err(err) => {
            error!("Dropping {} debug traces: {}", count, err);
            0
        }
    }
}

async fn flush_trace_rows(conn: &Connection, buffer: &mut Vec<TraceRow>) -> Result<(), SinkError> {
    if buffer.is_empty() {
        return Ok(());
    }

    let rows = std::mem::take(buffer);
    conn.call(move |conn| {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO debug_traces (report_id, event_id, api_id, uuid, status, request_code, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.report_id,
                    row.event_id,
                    row.api_id,
                    row.uuid,
                    row.status,
                    i64::from(row.request_code),
                    row.payload
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
    .await
    .map_err(|source| SinkError::WriteTraces { source })
}
