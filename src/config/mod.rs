//! Configuration module for Link-Matrix
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. A configuration carries the crawl tuning, the output locations, the
//! tracked articles (`[[article]]`) and the link matching rules (`[[rule]]`).
//!
//! # Example
//!
//! ```no_run
//! use link_matrix::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("links.toml")).unwrap();
//! println!("Fetching {} pages at a time", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Article, Config, CrawlerConfig, OutputConfig, SelectorRule, DEFAULT_CONCURRENCY,
    DEFAULT_INTER_BATCH_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
