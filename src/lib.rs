//! Danish Statistics Explorer library
//!
//! Typed, synchronous client for the Statistics Denmark Statbank API, used by
//! the `statbank` binary and by any front end that needs table discovery,
//! metadata lookup and data retrieval.

pub mod config;
pub mod logging;
pub mod statbank;
