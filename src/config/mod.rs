//! Configuration module for Wiki-History
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use wiki_history::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("wiki-history.toml")).unwrap();
//! println!("Fetching at most {} pages", config.pagination.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, FilterConfig, PaginationConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
