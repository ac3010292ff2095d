//! Statbank API client module
//!
//! Structure:
//! - `client.rs`: `StatbankClient` and its eight operations
//! - `transport.rs`: request types and the blocking HTTP transport
//! - `models.rs`: tables, variables, values, subjects, data queries
//! - `frame.rs`: JSON records / CSV to Polars DataFrame
//! - `bulk.rs`: sequential or pooled execution of independent lookups
//! - `helpers.rs`: table search and variable-domain collection
//! - `logger.rs`: failure logging collaborator
//! - `error.rs`: error types

pub mod bulk;
pub mod client;
pub mod error;
pub mod frame;
pub mod helpers;
pub mod logger;
pub mod models;
pub mod transport;

// Re-exports for convenience
pub use bulk::FetchStrategy;
pub use client::StatbankClient;
pub use error::{RemoteCause, Result, StatbankError};
pub use helpers::{collect_variable_domains, find_relevant_tables};
pub use logger::{ClientLogger, MemoryLogger, TracingLogger};
pub use models::{
    DataQuery, DataResult, Language, OutputFormat, Subject, Table, TableSummary, Value, Variable,
    VariableSelection, SUPPORTED_LANGUAGES,
};
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, Transport};
