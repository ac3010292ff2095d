use super::error::StatbankError;
use super::transport::ApiRequest;
use std::sync::Mutex;

/// Receives the client's failure reports
///
/// The client calls this at two points only: when a request fails and when
/// a response cannot be reshaped into a frame. The error is returned to the
/// caller afterwards either way.
pub trait ClientLogger: Send + Sync {
    /// A request failed (transport, status or decoding)
    fn request_failed(&self, request: &ApiRequest, error: &StatbankError);

    /// A data response could not be turned into a frame
    fn reshape_failed(&self, table_id: &str, error: &StatbankError);
}

/// Logger that emits `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ClientLogger for TracingLogger {
    fn request_failed(&self, request: &ApiRequest, error: &StatbankError) {
        tracing::error!(
            method = %request.method,
            endpoint = %request.endpoint,
            status = ?error.status(),
            error = %error,
            "Statbank API request failed"
        );
    }

    fn reshape_failed(&self, table_id: &str, error: &StatbankError) {
        tracing::error!(table_id, error = %error, "Failed to reshape Statbank data");
    }
}

/// One entry captured by [`MemoryLogger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    RequestFailed { endpoint: String, message: String },
    ReshapeFailed { table_id: String, message: String },
}

/// Logger that keeps entries in memory, for inspection by callers and tests
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn push(&self, entry: LogEntry) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(entry);
        }
    }
}

impl ClientLogger for MemoryLogger {
    fn request_failed(&self, request: &ApiRequest, error: &StatbankError) {
        self.push(LogEntry::RequestFailed {
            endpoint: request.endpoint.clone(),
            message: error.to_string(),
        });
    }

    fn reshape_failed(&self, table_id: &str, error: &StatbankError) {
        self.push(LogEntry::ReshapeFailed {
            table_id: table_id.to_string(),
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_records_in_order() {
        let logger = MemoryLogger::new();
        let request = ApiRequest::get("tableinfo");

        logger.request_failed(&request, &StatbankError::UnsupportedMethod("PUT".into()));
        logger.reshape_failed("FOLK1A", &StatbankError::Reshape("ragged".into()));

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert!(matches!(
            &entries[0],
            LogEntry::RequestFailed { endpoint, .. } if endpoint == "tableinfo"
        ));
        assert!(matches!(
            &entries[1],
            LogEntry::ReshapeFailed { table_id, message } if table_id == "FOLK1A" && message.contains("ragged")
        ));
    }
}
