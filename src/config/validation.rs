use crate::config::types::{Article, Config, CrawlerConfig, OutputConfig, SelectorRule};
use crate::url::canonical_key;
use crate::ConfigError;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_articles(&config.articles)?;
    validate_rules(&config.rules)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 50 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 50, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates article entries
///
/// Two articles sharing a normalized URL are allowed (the later one wins in
/// the link graph) but are logged, since the sheet probably has a duplicate row.
fn validate_articles(articles: &[Article]) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();
    let mut keys: HashMap<String, &str> = HashMap::new();

    for article in articles {
        if article.id.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Article '{}' must have a non-empty id",
                article.url
            )));
        }

        if !ids.insert(article.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate article id '{}'",
                article.id
            )));
        }

        let url = Url::parse(&article.url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid article URL '{}': {}", article.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Article URL '{}' must use HTTP or HTTPS",
                article.url
            )));
        }

        let key = canonical_key(&article.url);
        if let Some(previous) = keys.insert(key.to_string(), article.id.as_str()) {
            tracing::warn!(
                "Articles '{}' and '{}' share the page identity '{}'; only '{}' is tracked",
                previous,
                article.id,
                key,
                article.id
            );
        }
    }

    Ok(())
}

/// Validates selector rules
///
/// Selector syntax is not checked here: a rule the HTML matcher rejects is
/// skipped at extraction time without failing the run.
fn validate_rules(rules: &[SelectorRule]) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();

    for rule in rules {
        if !ids.insert(rule.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate rule id '{}'",
                rule.id
            )));
        }

        if rule.pattern.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Rule '{}' has an empty pattern",
                rule.id
            )));
        }
    }

    Ok(())
}
