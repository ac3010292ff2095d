use super::bulk::FetchStrategy;
use super::error::{RemoteCause, Result, StatbankError};
use super::frame;
use super::logger::{ClientLogger, TracingLogger};
use super::models::{
    DataQuery, DataRequestBody, DataResult, Language, OutputFormat, Subject, Table, TableSummary,
    Value, Variable,
};
use super::transport::{ApiRequest, HttpTransport, RawResponse, Transport};
use crate::config::ClientConfig;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Statbank API client
///
/// Every operation issues exactly one request and blocks until the service
/// answers or the transport gives up. Nothing is cached and nothing is retried.
pub struct StatbankClient<T = HttpTransport> {
    transport: T,
    logger: Arc<dyn ClientLogger>,
    fetch_strategy: FetchStrategy,
}

impl StatbankClient<HttpTransport> {
    /// Create a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.base_url.clone(), config.timeout)?;
        Ok(StatbankClient::with_transport(transport).with_fetch_strategy(config.fetch_strategy))
    }

    /// Create a client from environment variables
    ///
    /// See [`ClientConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env())
    }
}

impl<T: Transport> StatbankClient<T> {
    /// Create a client over any transport, logging through `tracing`
    pub fn with_transport(transport: T) -> Self {
        StatbankClient {
            transport,
            logger: Arc::new(TracingLogger),
            fetch_strategy: FetchStrategy::default(),
        }
    }

    /// Replace the failure logger
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set how per-variable lookups are executed in bulk operations
    pub fn with_fetch_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.fetch_strategy = strategy;
        self
    }

    pub fn fetch_strategy(&self) -> FetchStrategy {
        self.fetch_strategy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List available tables
    ///
    /// Returned unfiltered and in the order the service reports them.
    pub fn list_tables(&self, lang: &Language) -> Result<Vec<TableSummary>> {
        let request = ApiRequest::get("tableinfo").param("lang", lang.as_str());
        self.request_json(&request)
    }

    /// Fetch full metadata for one table
    pub fn get_table_metadata(&self, table_id: &str, lang: &Language) -> Result<Table> {
        let request = ApiRequest::get("tableinfo")
            .param("id", table_id)
            .param("lang", lang.as_str());
        self.request_json(&request)
    }

    /// Variables of a table: the `variables` field of its metadata
    pub fn list_variables(&self, table_id: &str, lang: &Language) -> Result<Vec<Variable>> {
        Ok(self.get_table_metadata(table_id, lang)?.variables)
    }

    /// Permissible values of one variable
    ///
    /// An answer without a `values` field yields an empty list.
    pub fn get_variable_values(
        &self,
        table_id: &str,
        variable_id: &str,
        lang: &Language,
    ) -> Result<Vec<Value>> {
        let request = ApiRequest::get("variables")
            .param("id", format!("{}.{}", table_id, variable_id))
            .param("lang", lang.as_str());

        let response: JsonValue = self.request_json(&request)?;
        let values = match response {
            JsonValue::Object(mut fields) => fields.remove("values").unwrap_or(JsonValue::Null),
            other => {
                let err = StatbankError::remote(
                    &request.endpoint,
                    RemoteCause::UnexpectedShape(format!(
                        "expected an object with 'values', got {}",
                        other
                    )),
                );
                self.logger.request_failed(&request, &err);
                return Err(err);
            }
        };

        if values.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(values).map_err(|e| {
            let err = StatbankError::remote(&request.endpoint, RemoteCause::Decode(e));
            self.logger.request_failed(&request, &err);
            err
        })
    }

    /// Retrieve data for a query
    ///
    /// Structured formats return the service's JSON unmodified. `Frame`
    /// reshapes a flat JSON record list; `Csv` parses the delimited body.
    pub fn fetch_data(&self, query: &DataQuery) -> Result<DataResult> {
        let body = serde_json::to_value(DataRequestBody::from(query)).map_err(|e| {
            StatbankError::Config(format!("Failed to encode data request: {}", e))
        })?;
        let request = ApiRequest::post("data", body);
        let response = self.execute(&request)?;

        if !query.format.is_tabular() {
            return self
                .decode::<JsonValue>(&request, &response)
                .map(DataResult::Structured);
        }

        let shaped = match query.format {
            OutputFormat::Csv => frame::csv_to_frame(&response.body),
            _ => {
                let json = self.decode::<JsonValue>(&request, &response)?;
                frame::records_to_frame(&json)
            }
        };

        match shaped {
            Ok(df) => Ok(DataResult::Tabular(df)),
            Err(err) => {
                self.logger.reshape_failed(&query.table_id, &err);
                Err(err)
            }
        }
    }

    /// Search tables by keyword, in the service's relevance order
    pub fn search_tables(&self, query: &str, lang: &Language) -> Result<Vec<TableSummary>> {
        let request = ApiRequest::get("tableinfo")
            .param("search", query)
            .param("lang", lang.as_str());
        self.request_json(&request)
    }

    /// Subject hierarchy for browsing
    pub fn list_subjects(&self, lang: &Language) -> Result<Vec<Subject>> {
        let request = ApiRequest::get("subjects").param("lang", lang.as_str());
        self.request_json(&request)
    }

    /// Send a request and decode its JSON body
    fn request_json<R: DeserializeOwned>(&self, request: &ApiRequest) -> Result<R> {
        let response = self.execute(request)?;
        self.decode(request, &response)
    }

    /// Send a request, turning non-2xx answers into errors
    fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        let outcome = self.transport.send(request).and_then(|response| {
            if response.is_success() {
                Ok(response)
            } else {
                Err(StatbankError::remote(
                    &request.endpoint,
                    RemoteCause::Status {
                        status: response.status,
                        body: response.body,
                    },
                ))
            }
        });

        outcome.map_err(|err| {
            self.logger.request_failed(request, &err);
            err
        })
    }

    fn decode<R: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        response: &RawResponse,
    ) -> Result<R> {
        serde_json::from_str(&response.body).map_err(|e| {
            let err = StatbankError::remote(&request.endpoint, RemoteCause::Decode(e));
            self.logger.request_failed(request, &err);
            err
        })
    }
}
