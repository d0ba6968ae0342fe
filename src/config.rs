//! Parser configuration parsing and validation.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{AgiError, Result};

/// Maximum buffered line length accepted by default: 1 MiB.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1_048_576;

fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}

fn default_request_key() -> String {
    "agi_request".into()
}

fn default_type_key() -> String {
    "agi_type".into()
}

fn default_method() -> String {
    "GET".into()
}

/// Header names consulted when deriving the request `path` and `method`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HeaderKeys {
    /// Header holding the request URL (e.g. `agi://host:port/script`).
    #[serde(default = "default_request_key")]
    pub request_key: String,
    /// Header holding the channel type, normalised into the method.
    #[serde(default = "default_type_key")]
    pub type_key: String,
    /// Method used when the type header is absent.
    #[serde(default = "default_method")]
    pub default_method: String,
}

impl Default for HeaderKeys {
    fn default() -> Self {
        Self {
            request_key: default_request_key(),
            type_key: default_type_key(),
            default_method: default_method(),
        }
    }
}

/// Parser configuration, usually parsed from TOML.
///
/// ```toml
/// max_line_bytes = 65536
///
/// [headers]
/// request_key = "agi_request"
/// type_key = "agi_type"
/// default_method = "GET"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ParserConfig {
    /// Longest line, request header block, or usage block accepted, in bytes.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
    /// Header naming used by the request header parser.
    #[serde(default)]
    pub headers: HeaderKeys,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            headers: HeaderKeys::default(),
        }
    }
}

impl ParserConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AgiError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_line_bytes == 0 {
            return Err(AgiError::Config(
                "max_line_bytes must be greater than zero".into(),
            ));
        }

        if self.headers.request_key.is_empty() || self.headers.type_key.is_empty() {
            return Err(AgiError::Config("header keys must not be empty".into()));
        }

        Ok(())
    }
}
