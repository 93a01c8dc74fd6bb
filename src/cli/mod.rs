//! CLI module
//!
//! Command-line interface for harvesting the product catalog.
//!
//! # Commands
//!
//! - `fetch` - Fetch matching products as CSV or JSON
//! - `upload` - Fetch matching products and post them as a CSV feed
//! - `validate` - Check the configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
