//! Typed views of Statbank responses and requests
//!
//! Response types keep any field they do not model in an `extra` map, so
//! nothing the service reports is lost when it adds new keys.

use polars::prelude::DataFrame;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// Language tags the service documents
pub const SUPPORTED_LANGUAGES: &[&str] = &["da", "en"];

/// Language tag sent with every request
///
/// Any tag can be constructed; unsupported tags are passed through to the
/// service, which decides how to handle them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Self {
        Language(tag.into())
    }

    pub fn danish() -> Self {
        Language::new("da")
    }

    pub fn english() -> Self {
        Language::new("en")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the tag is one of [`SUPPORTED_LANGUAGES`]
    pub fn is_supported(&self) -> bool {
        SUPPORTED_LANGUAGES.contains(&self.0.as_str())
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::danish()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(tag: &str) -> Self {
        Language::new(tag)
    }
}

/// One entry of a table listing or search result
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub id: String,
    /// Table title
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// Last-updated timestamp as reported (ISO 8601)
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub first_period: Option<String>,
    #[serde(default)]
    pub latest_period: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    /// Variable identifiers (display names in listings)
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Full metadata for one table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Table {
    pub id: String,
    /// Table title
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// Subject classification, contacts, footnotes and anything else reported
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Table {
    pub fn title(&self) -> &str {
        &self.text
    }

    pub fn variable_ids(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.id.as_str()).collect()
    }
}

/// A dimension of a table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Variable {
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Whether the variable may be left out of a data request
    #[serde(default)]
    pub elimination: bool,
    /// Whether this is the time dimension
    #[serde(default)]
    pub time: bool,
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// One permissible code of a variable
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Value {
    #[serde(rename = "id")]
    pub code: String,
    #[serde(rename = "text", default)]
    pub label: String,
}

/// A node of the subject hierarchy
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub has_subjects: bool,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

// Subject ids come back as "02" on some deployments and 2 on others
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Response format requested from the `data` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JSON-stat document, returned as-is
    #[default]
    JsonStat,
    /// Delimited text, parsed into a frame
    Csv,
    /// Flat JSON record list, reshaped into a frame
    Frame,
}

impl OutputFormat {
    /// Format name as sent in the request body
    pub fn wire_name(&self) -> &'static str {
        match self {
            OutputFormat::JsonStat => "JSONSTAT",
            OutputFormat::Csv => "CSV",
            OutputFormat::Frame => "PANDAS",
        }
    }

    /// Whether the result is a tabular frame rather than structured JSON
    pub fn is_tabular(&self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Frame)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "JSONSTAT" => Ok(OutputFormat::JsonStat),
            "CSV" => Ok(OutputFormat::Csv),
            "PANDAS" | "FRAME" => Ok(OutputFormat::Frame),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Selected codes for one variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableSelection {
    pub code: String,
    pub values: Vec<String>,
}

/// A data request against one table
///
/// Selections keep insertion order; the request body lists them in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    pub table_id: String,
    pub selections: Vec<VariableSelection>,
    pub format: OutputFormat,
    pub language: Language,
}

impl DataQuery {
    pub fn new(table_id: impl Into<String>) -> Self {
        DataQuery {
            table_id: table_id.into(),
            selections: Vec::new(),
            format: OutputFormat::default(),
            language: Language::default(),
        }
    }

    /// Select codes for a variable, replacing an earlier selection of the same variable
    pub fn select<I, S>(mut self, variable_id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let code = variable_id.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match self.selections.iter_mut().find(|s| s.code == code) {
            Some(existing) => existing.values = values,
            None => self.selections.push(VariableSelection { code, values }),
        }
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

/// Body of a `data` POST
#[derive(Debug, Serialize)]
pub(crate) struct DataRequestBody<'a> {
    pub table: &'a str,
    pub format: &'a str,
    pub variables: &'a [VariableSelection],
    pub lang: &'a str,
}

impl<'a> From<&'a DataQuery> for DataRequestBody<'a> {
    fn from(query: &'a DataQuery) -> Self {
        DataRequestBody {
            table: &query.table_id,
            format: query.format.wire_name(),
            variables: &query.selections,
            lang: query.language.as_str(),
        }
    }
}

/// Result of a data request
#[derive(Debug, Clone)]
pub enum DataResult {
    /// Service response, unmodified
    Structured(JsonValue),
    /// Response reshaped into columns
    Tabular(DataFrame),
}

impl DataResult {
    pub fn as_structured(&self) -> Option<&JsonValue> {
        match self {
            DataResult::Structured(json) => Some(json),
            DataResult::Tabular(_) => None,
        }
    }

    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            DataResult::Tabular(df) => Some(df),
            DataResult::Structured(_) => None,
        }
    }

    pub fn into_frame(self) -> Option<DataFrame> {
        match self {
            DataResult::Tabular(df) => Some(df),
            DataResult::Structured(_) => None,
        }
    }
}
