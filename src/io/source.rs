use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::model::config::Config;
use crate::model::record::{NodeRecord, RecordError, read_records};

/// Where a notebook collection is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
    Url(String),
}

impl Source {
    /// `-` is stdin, `http://` / `https://` is a collection endpoint,
    /// anything else is a file path.
    pub fn parse(s: &str) -> Source {
        if s == "-" {
            Source::Stdin
        } else if s.starts_with("http://") || s.starts_with("https://") {
            Source::Url(s.to_string())
        } else {
            Source::File(PathBuf::from(s))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Stdin => write!(f, "<stdin>"),
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Error type for loading a collection
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not read {source_name}: {error}")]
    ReadError {
        source_name: String,
        error: std::io::Error,
    },
    #[error("could not parse {source_name}: {error}")]
    ParseError {
        source_name: String,
        error: serde_json::Error,
    },
    #[error("request to {url} failed: {error}")]
    HttpError { url: String, error: reqwest::Error },
    #[error("{source_name}: expected a JSON array or an object with a \"results\" array")]
    UnexpectedShape { source_name: String },
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Load the raw JSON objects of a collection.
pub fn load_values(source: &Source, timeout: Duration) -> Result<Vec<Value>, SourceError> {
    let source_name = source.to_string();
    let value: Value = match source {
        Source::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|error| SourceError::ReadError {
                    source_name: source_name.clone(),
                    error,
                })?;
            parse_json(&text, &source_name)?
        }
        Source::File(path) => {
            let text = fs::read_to_string(path).map_err(|error| SourceError::ReadError {
                source_name: source_name.clone(),
                error,
            })?;
            parse_json(&text, &source_name)?
        }
        Source::Url(url) => fetch(url, timeout)?,
    };

    let values = unwrap_collection(value).ok_or(SourceError::UnexpectedShape {
        source_name: source_name.clone(),
    })?;
    tracing::debug!(source = %source_name, records = values.len(), "loaded collection");
    Ok(values)
}

/// Load and decode a collection using the configured field map.
pub fn load_records(source: &Source, config: &Config) -> Result<Vec<NodeRecord>, SourceError> {
    let timeout = Duration::from_millis(config.source.timeout_ms);
    let values = load_values(source, timeout)?;
    Ok(read_records(values, &config.fields)?)
}

fn parse_json(text: &str, source_name: &str) -> Result<Value, SourceError> {
    serde_json::from_str(text).map_err(|error| SourceError::ParseError {
        source_name: source_name.to_string(),
        error,
    })
}

fn fetch(url: &str, timeout: Duration) -> Result<Value, SourceError> {
    let http_err = |error| SourceError::HttpError {
        url: url.to_string(),
        error,
    };
    tracing::info!(url, "fetching collection");
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(http_err)?;
    client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.json::<Value>())
        .map_err(http_err)
}

/// A bare array, or the `results` array of a paginated response
fn unwrap_collection(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.shift_remove("results") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}
