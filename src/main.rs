//! Statbank explorer - command-line entry point
//!
//! Thin front end over `StatbankClient`: each command maps to one client
//! operation and prints the result.
//!
//! Usage:
//! ```bash
//! statbank tables
//! statbank search "befolkning" --max 5
//! statbank table FOLK1A
//! statbank values FOLK1A OMRÅDE
//! statbank domains FOLK1A
//! statbank data FOLK1A --select Tid=2023K1 --select OMRÅDE=000 --format CSV
//! statbank subjects
//! ```
//!
//! Global flags: `--lang da|en`, `--url <base url>`, `--timeout <seconds>`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use statbank_explorer::config::ClientConfig;
use statbank_explorer::logging;
use statbank_explorer::statbank::{
    collect_variable_domains, find_relevant_tables, DataQuery, DataResult, Language,
    OutputFormat, StatbankClient, Subject,
};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "statbank",
    version,
    about = "Explore tables and data of the Statistics Denmark Statbank API"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Language of labels and texts (da or en).
    #[arg(long, global = true, value_name = "LANG")]
    lang: Option<String>,

    /// API base URL (overrides STATBANK_API_URL).
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,

    /// Request timeout in seconds (overrides API_TIMEOUT).
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all active tables.
    Tables,

    /// Search tables by keyword.
    Search {
        #[arg(required = true, value_name = "QUERY")]
        query: Vec<String>,

        /// Keep at most this many results.
        #[arg(long, value_name = "N")]
        max: Option<usize>,
    },

    /// Show metadata of one table.
    Table { table_id: String },

    /// List the values of one variable.
    Values {
        table_id: String,
        variable_id: String,
    },

    /// List the value domain of every variable of a table.
    Domains { table_id: String },

    /// Retrieve data for a table.
    Data {
        table_id: String,

        /// Selected codes, repeatable: VARIABLE=code1,code2
        #[arg(long = "select", value_name = "VAR=CODES", value_parser = parse_selection)]
        selections: Vec<Selection>,

        /// JSONSTAT, CSV or PANDAS.
        #[arg(long, value_name = "FORMAT")]
        format: Option<OutputFormat>,
    },

    /// Show the subject hierarchy.
    Subjects,
}

/// One `--select` argument
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    variable: String,
    codes: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = cli.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    if let Err(e) = logging::init_logging(&config.log_level) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    if let Err(e) = run(&config, &cli) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

/// Parse `Variable=code1,code2`
fn parse_selection(raw: &str) -> Result<Selection, String> {
    let invalid = || format!("invalid selection '{}', expected VARIABLE=code1,code2", raw);
    let (variable, codes) = raw.split_once('=').ok_or_else(invalid)?;
    let codes: Vec<String> = codes
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if variable.trim().is_empty() || codes.is_empty() {
        return Err(invalid());
    }
    Ok(Selection {
        variable: variable.trim().to_string(),
        codes,
    })
}

fn run(config: &ClientConfig, cli: &Cli) -> anyhow::Result<()> {
    let client = StatbankClient::new(config).context("failed to create Statbank client")?;
    let lang = cli
        .lang
        .as_deref()
        .map(Language::from)
        .unwrap_or_else(|| config.default_language.clone());

    if !lang.is_supported() {
        eprintln!("⚠ Language '{}' is not supported by Statbank, sending as-is", lang);
    }

    match &cli.command {
        Command::Tables => {
            for table in client.list_tables(&lang)? {
                println!("{:<10} {}", table.id, table.text);
            }
        }
        Command::Search { query, max } => {
            let query = query.join(" ");
            let tables = match max {
                Some(max) => find_relevant_tables(&client, &query, &lang, *max)?,
                None => client.search_tables(&query, &lang)?,
            };
            for table in tables {
                println!("{:<10} {}", table.id, table.text);
            }
        }
        Command::Table { table_id } => {
            let table = client.get_table_metadata(table_id, &lang)?;
            println!("{} - {}", table.id, table.title());
            if let Some(updated) = &table.updated {
                println!("Updated: {}", updated);
            }
            for variable in &table.variables {
                println!(
                    "  {:<12} {} ({} values)",
                    variable.id,
                    variable.text,
                    variable.values.len()
                );
            }
        }
        Command::Values {
            table_id,
            variable_id,
        } => {
            for value in client.get_variable_values(table_id, variable_id, &lang)? {
                println!("{:<12} {}", value.code, value.label);
            }
        }
        Command::Domains { table_id } => {
            let domains = collect_variable_domains(&client, table_id, &lang)?;
            for (variable, values) in &domains {
                println!("{} ({} values)", variable, values.len());
            }
        }
        Command::Data {
            table_id,
            selections,
            format,
        } => {
            let mut query = DataQuery::new(table_id.as_str())
                .format(format.unwrap_or_default())
                .language(lang);
            for selection in selections {
                query = query.select(selection.variable.clone(), selection.codes.iter().cloned());
            }
            match client.fetch_data(&query)? {
                DataResult::Structured(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                DataResult::Tabular(df) => println!("{}", df),
            }
        }
        Command::Subjects => {
            for subject in client.list_subjects(&lang)? {
                print_subject(&subject, 0);
            }
        }
    }

    Ok(())
}

fn print_subject(subject: &Subject, depth: usize) {
    println!("{}{:<6} {}", "  ".repeat(depth), subject.id, subject.description);
    for child in &subject.subjects {
        print_subject(child, depth + 1);
    }
}
