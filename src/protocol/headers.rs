//! Request header block parsing.
//!
//! A FastAGI session opens with a block of `key: value` lines terminated by
//! a blank line:
//!
//! ```text
//! agi_network: yes
//! agi_request: agi://10.0.0.1:9000/foo/
//! agi_type: SIP
//!
//! ```
//!
//! [`parse_header_block`] turns the lines of one block (without the blank
//! terminator) into a [`RequestHeaders`] value. Construction is atomic: a
//! single malformed line fails the whole block.

use std::str::FromStr;

use bytes::Bytes;
use http::Uri;
use tracing::warn;

use crate::config::HeaderKeys;
use crate::protocol::fields::Fields;
use crate::protocol::line_buffer::trim_cr;
use crate::{AgiError, Result};

/// Separator between a header key and its value; only the first occurrence splits.
const SEPARATOR: &str = ": ";

/// Structured decomposition of the request `path` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestUrl {
    /// URL scheme, e.g. `agi`.
    pub scheme: Option<String>,
    /// Host name or address.
    pub host: Option<String>,
    /// Explicit port.
    pub port: Option<u16>,
    /// Path component; empty for the default value.
    pub path: String,
    /// Query string without the leading `?`.
    pub query: Option<String>,
}

impl RequestUrl {
    /// Parse `raw`, returning the default value when `raw` is empty.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Header` when `raw` is not a valid URI.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self::default());
        }

        let uri = Uri::from_str(raw)
            .map_err(|err| AgiError::Header(format!("invalid request url {raw:?}: {err}")))?;

        Ok(Self {
            scheme: uri.scheme_str().map(str::to_owned),
            host: uri.host().map(str::to_owned),
            port: uri.port_u16(),
            path: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
        })
    }
}

/// Parsed request header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    method: String,
    path: String,
    headers: Fields,
    url: RequestUrl,
}

impl RequestHeaders {
    /// Normalised channel type, e.g. `SIP`; defaults to `GET`.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Raw value of the request header; empty when absent.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All headers in first-seen order.
    #[must_use]
    pub fn headers(&self) -> &Fields {
        &self.headers
    }

    /// Structured form of [`path`](Self::path).
    #[must_use]
    pub fn url(&self) -> &RequestUrl {
        &self.url
    }

    /// Look up a single header value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }
}

/// Build [`RequestHeaders`] from the lines of one header block.
///
/// `lines` must not include the blank terminator. Trailing `\r` on each
/// line is ignored.
///
/// # Errors
///
/// Returns `AgiError::Header` if a line is not valid UTF-8 or lacks the
/// `": "` separator. No partial value is produced.
pub fn parse_header_block(lines: &[Bytes], keys: &HeaderKeys) -> Result<RequestHeaders> {
    let mut headers = Fields::new();

    for (index, raw) in lines.iter().enumerate() {
        let line = std::str::from_utf8(trim_cr(raw)).map_err(|err| {
            AgiError::Header(format!("line {} is not valid utf-8: {err}", index + 1))
        })?;

        let (key, value) = line.split_once(SEPARATOR).ok_or_else(|| {
            AgiError::Header(format!(
                "line {} has no {SEPARATOR:?} separator: {line:?}",
                index + 1
            ))
        })?;

        headers.insert(key, value);
    }

    let path = headers.get(&keys.request_key).unwrap_or_default().to_owned();
    let method = normalize_method(
        headers
            .get(&keys.type_key)
            .unwrap_or(keys.default_method.as_str()),
    );

    let url = RequestUrl::parse(&path).unwrap_or_else(|err| {
        warn!(%err, path = %path, "request headers: unparseable request url, using default");
        RequestUrl::default()
    });

    Ok(RequestHeaders {
        method,
        path,
        headers,
        url,
    })
}

/// Drop spaces, hyphens and every other non-word character, then upper-case.
#[must_use]
pub fn normalize_method(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_uppercase)
        .collect()
}
