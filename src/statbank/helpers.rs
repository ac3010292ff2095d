//! Helpers composed from the client's operations
//!
//! These issue no requests of their own beyond the client calls they make.

use super::client::StatbankClient;
use super::error::Result;
use super::models::{Language, TableSummary, Value};
use super::transport::Transport;
use indexmap::IndexMap;

/// Find tables that might answer a free-text query
///
/// Searches directly and keeps at most `max_results` entries in the order
/// the service ranked them.
pub fn find_relevant_tables<T: Transport>(
    client: &StatbankClient<T>,
    query: &str,
    lang: &Language,
    max_results: usize,
) -> Result<Vec<TableSummary>> {
    let mut tables = client.search_tables(query, lang)?;
    tables.truncate(max_results);
    Ok(tables)
}

/// Value domain of every variable in a table
///
/// Keys follow the order of the table's variables. Lookups run according to
/// the client's [`FetchStrategy`](super::bulk::FetchStrategy); if any lookup
/// fails the whole call fails and nothing collected so far is returned.
pub fn collect_variable_domains<T: Transport>(
    client: &StatbankClient<T>,
    table_id: &str,
    lang: &Language,
) -> Result<IndexMap<String, Vec<Value>>> {
    let variable_ids: Vec<String> = client
        .list_variables(table_id, lang)?
        .into_iter()
        .map(|v| v.id)
        .collect();

    let domains = client.fetch_strategy().run(&variable_ids, |variable_id| {
        client.get_variable_values(table_id, variable_id, lang)
    })?;

    Ok(variable_ids.into_iter().zip(domains).collect())
}
