//! HTTP transport for the Statbank client
//!
//! The client builds an [`ApiRequest`] per operation and hands it to a
//! [`Transport`]. The transport only moves bytes: it returns whatever status
//! and body the service produced, and errors only when no response was
//! obtained at all. Status handling lives in the client.

use super::error::{RemoteCause, Result, StatbankError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Url;
use std::fmt;
use std::time::Duration;

/// User agent string for API requests
const USER_AGENT_VALUE: &str = concat!("statbank-explorer/", env!("CARGO_PKG_VERSION"));

/// HTTP verb of an [`ApiRequest`]
///
/// The service only answers GET and POST; anything else is carried as
/// `Other` and refused by [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
            Method::Other(name) => f.write_str(name),
        }
    }
}

/// A single request against a Statbank endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Endpoint name relative to the base URL, e.g. `tableinfo`
    pub endpoint: String,
    /// Query parameters, in order
    pub params: Vec<(String, String)>,
    /// JSON body (POST only)
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::Get,
            endpoint: endpoint.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest {
            method: Method::Post,
            endpoint: endpoint.into(),
            params: Vec::new(),
            body: Some(body),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Value of a query parameter, if set
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        RawResponse {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves a request to the service and returns its raw response
pub trait Transport: Send + Sync {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// Blocking HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a global request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|e| StatbankError::Config(format!("Invalid base URL '{}': {}", raw, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(StatbankError::Config(format!(
                "Invalid base URL '{}': expected http:// or https://",
                raw
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StatbankError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpTransport { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Full URL for an endpoint
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url(), endpoint.trim_start_matches('/'))
    }

    /// Endpoint URL with the request's query parameters appended
    fn request_url(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = Url::parse(&self.url_for(&request.endpoint)).map_err(|e| {
            StatbankError::Config(format!("Invalid URL for '{}': {}", request.endpoint, e))
        })?;
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.params);
        }
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let builder = match &request.method {
            Method::Get => self.client.get(self.request_url(request)?),
            Method::Post => {
                let builder = self
                    .client
                    .post(self.request_url(request)?)
                    .header(CONTENT_TYPE, "application/json");
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
            Method::Other(name) => return Err(StatbankError::UnsupportedMethod(name.clone())),
        };

        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            "Sending Statbank request"
        );

        let response = builder.send().map_err(|e| {
            StatbankError::remote(&request.endpoint, RemoteCause::Transport(Box::new(e)))
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| {
            StatbankError::remote(&request.endpoint, RemoteCause::Transport(Box::new(e)))
        })?;

        tracing::debug!(status, bytes = body.len(), "Statbank response received");

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statbank::client::StatbankClient;
    use crate::statbank::models::{DataQuery, Language, OutputFormat};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    fn transport() -> HttpTransport {
        HttpTransport::new("https://api.statbank.dk/v1/", Duration::from_secs(5)).unwrap()
    }

    /// Request line, headers and body as received by the loopback server
    struct Received {
        request_line: String,
        headers: Vec<String>,
        body: String,
    }

    impl Received {
        fn header(&self, name: &str) -> Option<&str> {
            let prefix = format!("{}:", name.to_ascii_lowercase());
            self.headers
                .iter()
                .find(|h| h.to_ascii_lowercase().starts_with(&prefix))
                .map(|h| h[prefix.len()..].trim())
        }
    }

    /// Serve one canned response on 127.0.0.1 and hand back what was received
    fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                headers.push(line);
            }

            let length = headers
                .iter()
                .find_map(|h| {
                    let (name, value) = h.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            let mut raw_body = vec![0u8; length];
            reader.read_exact(&mut raw_body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();

            Received {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(raw_body).unwrap(),
            }
        });

        (base_url, handle)
    }

    fn client_for(base_url: &str) -> StatbankClient<HttpTransport> {
        StatbankClient::with_transport(HttpTransport::new(base_url, Duration::from_secs(5)).unwrap())
    }

    #[test]
    fn test_url_joining() {
        let t = transport();
        assert_eq!(t.base_url(), "https://api.statbank.dk/v1");
        assert_eq!(t.url_for("tableinfo"), "https://api.statbank.dk/v1/tableinfo");
        assert_eq!(t.url_for("/data"), "https://api.statbank.dk/v1/data");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = HttpTransport::new("ftp://example.org", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, StatbankError::Config(_)));
    }

    #[test]
    fn test_malformed_base_url_fails_at_construction() {
        let err = HttpTransport::new("http://exa mple", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, StatbankError::Config(_)));

        let err = HttpTransport::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, StatbankError::Config(_)));
    }

    #[test]
    fn test_unsupported_method_is_rejected_before_sending() {
        let mut request = ApiRequest::get("tableinfo");
        request.method = Method::Other("DELETE".to_string());

        let err = transport().send(&request).unwrap_err();
        match err {
            StatbankError::UnsupportedMethod(method) => assert_eq!(method, "DELETE"),
            other => panic!("expected UnsupportedMethod, got {:?}", other),
        }
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Other("PATCH".into()).to_string(), "PATCH");
    }

    #[test]
    fn test_request_params() {
        let request = ApiRequest::get("variables")
            .param("id", "FOLK1A.Tid")
            .param("lang", "da");
        assert_eq!(request.param_value("id"), Some("FOLK1A.Tid"));
        assert_eq!(request.param_value("search"), None);
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::ok("{}").is_success());
        assert!(!RawResponse {
            status: 404,
            body: String::new()
        }
        .is_success());
    }

    #[test]
    fn test_get_encodes_query_parameters() {
        let (base_url, server) =
            serve_once(200, r#"{"id":"OMRÅDE","values":[{"id":"000","text":"Hele landet"}]}"#);

        let values = client_for(&base_url)
            .get_variable_values("FOLK1A", "OMRÅDE", &Language::danish())
            .unwrap();

        let received = server.join().unwrap();
        assert_eq!(
            received.request_line,
            "GET /v1/variables?id=FOLK1A.OMR%C3%85DE&lang=da HTTP/1.1"
        );
        assert_eq!(received.header("accept"), Some("application/json"));
        assert!(received
            .header("user-agent")
            .unwrap()
            .starts_with("statbank-explorer/"));
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].code, "000");
        assert_eq!(values[0].label, "Hele landet");
    }

    #[test]
    fn test_post_sends_json_body_without_query() {
        let (base_url, server) = serve_once(200, r#"[{"OMRÅDE":"Hele landet","INDHOLD":5932654}]"#);

        let query = DataQuery::new("FOLK1A")
            .select("OMRÅDE", ["000"])
            .format(OutputFormat::Frame)
            .language(Language::danish());
        let result = client_for(&base_url).fetch_data(&query).unwrap();

        let received = server.join().unwrap();
        assert_eq!(received.request_line, "POST /v1/data HTTP/1.1");
        assert_eq!(received.header("content-type"), Some("application/json"));

        let body: serde_json::Value = serde_json::from_str(&received.body).unwrap();
        assert_eq!(body["table"], "FOLK1A");
        assert_eq!(body["format"], "PANDAS");
        assert_eq!(body["lang"], "da");
        assert_eq!(body["variables"][0]["code"], "OMRÅDE");

        assert_eq!(result.as_frame().unwrap().shape(), (1, 2));
    }

    #[test]
    fn test_error_status_reaches_client() {
        let (base_url, server) = serve_once(404, r#"{"errorTypeCode":"TABLE-NOT-FOUND"}"#);

        let err = client_for(&base_url)
            .get_table_metadata("NOPE", &Language::english())
            .unwrap_err();
        server.join().unwrap();

        assert_eq!(err.status(), Some(404));
        match err {
            StatbankError::RemoteService { endpoint, .. } => assert_eq!(endpoint, "tableinfo"),
            other => panic!("expected RemoteService, got {:?}", other),
        }
    }

    #[test]
    fn test_connection_refused_is_transport_cause() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let transport = HttpTransport::new(format!("http://{}/v1", addr), Duration::from_secs(5))
            .unwrap();

        let err = transport.send(&ApiRequest::get("subjects")).unwrap_err();
        match err {
            StatbankError::RemoteService {
                endpoint,
                cause: RemoteCause::Transport(_),
            } => assert_eq!(endpoint, "subjects"),
            other => panic!("expected a transport failure, got {:?}", other),
        }
    }
}
