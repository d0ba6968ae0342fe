//! Result line parsing, typed result access, and result encoding.
//!
//! Every command sent to the gateway is answered by a status line:
//!
//! ```text
//! 200 result=1 (testvariable)
//! 200 result=-1 endpos=11223
//! 510 Invalid or unknown command
//! 520-Invalid command syntax.  Proper usage follows:
//! Usage: GET VARIABLE <variablename>
//! 520 End of proper usage.
//! ```
//!
//! [`parse_result_blob`] handles one logical message. The `520` usage form
//! spans several lines; until its terminator arrives the parser answers
//! [`ResultParse::NeedMoreData`] and the caller appends the next line to the
//! blob before parsing again with [`parse_status_blob`].
//!
//! Deriving `info` happens in two explicit passes: [`extract_tokens`] finds
//! every `key=value` token and the parenthesised payload, and
//! [`strip_tokens`] removes their spans from the response text.

use std::fmt::Write as _;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::protocol::diagnostic::Diagnostic;
use crate::protocol::fields::Fields;
use crate::protocol::status::AgiStatus;
use crate::{AgiError, Result};

/// Literal the gateway writes when the channel hangs up.
pub const HANGUP_MARKER: &str = "HANGUP";

/// Phrases that end a `520` usage block.
pub const USAGE_TERMINATORS: [&str; 2] = ["End of proper usage.", "Proper usage not available."];

/// Key under which the parenthesised payload is stored in [`ResultMessage::data`].
pub const DATA_KEY: &str = "data";

const RESULT_KEY: &str = "result";

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("literal pattern compiles")
}

/// Status code, optional `-`/whitespace separators, free-form response.
static STATUS_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)^([0-9]+)[\s-]*(.*)$"));

/// The hang-up marker between word boundaries.
static HANGUP_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"\b{HANGUP_MARKER}\b")));

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| compile(r"(\w+)=(\S+)"));

/// `result=<value> (<payload>)`, payload confined to one line.
static PAYLOAD: LazyLock<Regex> = LazyLock::new(|| compile(r"result=\S+\s*\(([^\n]*)\)"));

/// One parsed result message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMessage {
    status: AgiStatus,
    result: Option<String>,
    data: Fields,
    info: String,
    raw: String,
}

impl ResultMessage {
    /// A `200` result carrying `result`, auxiliary `data`, and `info`.
    #[must_use]
    pub fn success(result: impl Into<String>, data: Fields, info: impl Into<String>) -> Self {
        Self {
            status: AgiStatus::Success,
            result: Some(result.into()),
            data,
            info: info.into(),
            raw: String::new(),
        }
    }

    /// A non-success result with only a status and free text.
    ///
    /// Passing [`AgiStatus::Success`] yields a success message with no result.
    #[must_use]
    pub fn with_status(status: AgiStatus, info: impl Into<String>) -> Self {
        Self {
            status,
            result: None,
            data: Fields::new(),
            info: info.into(),
            raw: String::new(),
        }
    }

    /// Status code of the line.
    #[must_use]
    pub fn status(&self) -> AgiStatus {
        self.status
    }

    /// Primary result value; only set for [`AgiStatus::Success`].
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Auxiliary `key=value` tokens, plus the payload under [`DATA_KEY`].
    #[must_use]
    pub fn data(&self) -> &Fields {
        &self.data
    }

    /// Parenthesised payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.data.get(DATA_KEY)
    }

    /// Response text left after removing tokens and payload.
    #[must_use]
    pub fn info(&self) -> &str {
        &self.info
    }

    /// The text this message was parsed from; empty for constructed messages.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Interpret `result` as a signed integer.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Coercion` if there is no result or it is not an integer.
    pub fn result_as_int(&self) -> Result<i64> {
        let raw = self.result.as_deref().ok_or_else(|| {
            AgiError::Coercion(format!("status {} carries no result", self.status))
        })?;
        raw.parse()
            .map_err(|err| AgiError::Coercion(format!("result {raw:?} is not an integer: {err}")))
    }

    /// Interpret `result` as a character code point, e.g. `49` → `'1'`.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Coercion` if the result is not an integer or not a
    /// valid Unicode scalar value.
    pub fn result_as_char(&self) -> Result<char> {
        let code = self.result_as_int()?;
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| AgiError::Coercion(format!("result {code} is not a character code")))
    }

    /// Interpret `result` as a boolean: any non-zero integer is `true`.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Coercion` if the result is not an integer.
    pub fn result_as_bool(&self) -> Result<bool> {
        Ok(self.result_as_int()? != 0)
    }

    /// Convert failure statuses into errors, passing other messages through.
    ///
    /// | Status / result          | Error                           |
    /// |--------------------------|---------------------------------|
    /// | `503`, `510`             | [`AgiError::InvalidCommand`]    |
    /// | `511`                    | [`AgiError::CommandNotPermitted`] |
    /// | `520`                    | [`AgiError::Usage`]             |
    /// | `200` with `result=-1`   | [`AgiError::Application`]       |
    ///
    /// # Errors
    ///
    /// Returns the error listed above for the message's status.
    pub fn into_checked(self) -> Result<Self> {
        match self.status {
            AgiStatus::MemoryAllocationFailure | AgiStatus::InvalidCommand => {
                Err(AgiError::InvalidCommand(self.info))
            }
            AgiStatus::CommandNotPermitted => Err(AgiError::CommandNotPermitted(self.info)),
            AgiStatus::InvalidCommandSyntax => Err(AgiError::Usage(self.info)),
            AgiStatus::Success if self.result.as_deref() == Some("-1") => Err(
                AgiError::Application("error executing application, or hangup".into()),
            ),
            AgiStatus::Success | AgiStatus::Trying | AgiStatus::Unknown(_) => Ok(self),
        }
    }

    /// Render the message as a newline-terminated status line.
    ///
    /// Multi-line `info` is written in the `NNN-` continuation form.
    #[must_use]
    pub fn encode(&self) -> String {
        let code = self.status.code();
        let mut line = String::new();

        if self.status == AgiStatus::Success {
            let _ = write!(line, "{code}");
            if let Some(result) = &self.result {
                let _ = write!(line, " {RESULT_KEY}={result}");
                if let Some(payload) = self.payload() {
                    let _ = write!(line, " ({payload})");
                }
            }
            for (key, value) in self.data.iter().filter(|(k, _)| *k != DATA_KEY) {
                let _ = write!(line, " {key}={value}");
            }
            if !self.info.is_empty() {
                let _ = write!(line, " {}", self.info);
            }
        } else if self.info.contains('\n') {
            let _ = write!(line, "{code}-{}", self.info);
        } else if self.info.is_empty() {
            let _ = write!(line, "{code}");
        } else {
            let _ = write!(line, "{code} {}", self.info);
        }

        line.push('\n');
        line
    }
}

/// Outcome of parsing one result blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultParse {
    /// A complete message, with a side-channel notice when warranted.
    Complete {
        /// The parsed message.
        message: ResultMessage,
        /// Notice for unknown codes or gateway resource failures.
        diagnostic: Option<Diagnostic>,
    },
    /// The blob opens a usage block whose terminator has not arrived yet.
    NeedMoreData,
    /// The blob is the hang-up marker; the stream is ending.
    Hangup,
    /// The blob has no leading status code; nothing was produced.
    Unrecognized(Diagnostic),
}

/// A `key=value` token or payload located in the response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token key; `data` for the payload.
    pub key: String,
    /// Token value, or the payload text.
    pub value: String,
    /// Byte span of the whole token within the response text.
    pub span: Range<usize>,
}

/// Tokens found by [`extract_tokens`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTokens {
    /// `key=value` tokens outside the payload, in textual order.
    pub pairs: Vec<Token>,
    /// The `result=<value> (<payload>)` segment, if present.
    pub payload: Option<Token>,
}

/// First pass: locate every `key=value` token and the payload segment.
#[must_use]
pub fn extract_tokens(response: &str) -> ResultTokens {
    let payload = PAYLOAD.captures(response).and_then(|caps| {
        let whole = caps.get(0)?;
        let inner = caps.get(1)?;
        Some((
            Token {
                key: DATA_KEY.to_owned(),
                value: inner.as_str().to_owned(),
                span: whole.range(),
            },
            // Include the parentheses themselves.
            inner.start().saturating_sub(1)..inner.end() + 1,
        ))
    });

    let pairs = KEY_VALUE
        .captures_iter(response)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if let Some((_, parens)) = &payload {
                if parens.contains(&whole.start()) {
                    return None;
                }
            }
            Some(Token {
                key: caps.get(1)?.as_str().to_owned(),
                value: caps.get(2)?.as_str().to_owned(),
                span: whole.range(),
            })
        })
        .collect();

    ResultTokens {
        pairs,
        payload: payload.map(|(token, _)| token),
    }
}

/// Second pass: remove every token span from `response` and trim the rest.
#[must_use]
pub fn strip_tokens(response: &str, tokens: &ResultTokens) -> String {
    let mut spans: Vec<Range<usize>> = tokens
        .pairs
        .iter()
        .chain(tokens.payload.iter())
        .map(|t| t.span.clone())
        .collect();
    spans.sort_by_key(|span| span.start);

    let mut out = String::with_capacity(response.len());
    let mut cursor = 0;
    for span in spans {
        if span.end <= cursor {
            continue;
        }
        if span.start > cursor {
            out.push_str(&response[cursor..span.start]);
        }
        cursor = span.end;
    }
    out.push_str(&response[cursor..]);
    out.trim().to_owned()
}

/// Whether `text` ends a `520` usage block.
#[must_use]
pub fn ends_usage_block(text: &str) -> bool {
    let text = text.trim_end();
    USAGE_TERMINATORS.iter().any(|t| text.ends_with(t))
}

/// Whether `text` carries the hang-up marker as a whole word.
///
/// `200 result=1 (HANGUP)` matches; `HANGUPS` and `AUTOHANGUP` do not.
#[must_use]
pub fn contains_hangup_marker(text: &str) -> bool {
    HANGUP_TOKEN.is_match(text)
}

/// Leading status code of `line`, if it starts with digits.
#[must_use]
pub fn leading_status(line: &str) -> Option<u32> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    line[..digits].parse().ok()
}

/// Parse one freshly received result message.
///
/// `blob` holds every line of the message joined by `\n`, without the final
/// newline. A blob carrying the hang-up marker anywhere, status code or
/// not, answers [`ResultParse::Hangup`].
#[must_use]
pub fn parse_result_blob(blob: &str) -> ResultParse {
    if contains_hangup_marker(blob) {
        return ResultParse::Hangup;
    }
    parse_status_blob(blob)
}

/// Parse a result message without looking for the hang-up marker.
///
/// Used for `520` usage blocks that are being continued, whose text may
/// name the `HANGUP` command.
#[must_use]
pub fn parse_status_blob(blob: &str) -> ResultParse {
    let Some(caps) = STATUS_LINE.captures(blob) else {
        return ResultParse::Unrecognized(Diagnostic::warning(
            "unrecognized result line: no status code",
            blob,
        ));
    };

    let (Some(code), Some(response)) = (caps.get(1), caps.get(2)) else {
        return ResultParse::Unrecognized(Diagnostic::warning("unrecognized result line", blob));
    };
    let Ok(code) = code.as_str().parse::<u32>() else {
        return ResultParse::Unrecognized(Diagnostic::warning(
            "unrecognized result line: status code out of range",
            blob,
        ));
    };
    let response = response.as_str();
    let status = AgiStatus::from_code(code);

    let tokens = extract_tokens(response);
    let info = strip_tokens(response, &tokens);

    let mut result = None;
    let mut data = Fields::new();
    let mut diagnostic = None;

    match status {
        AgiStatus::Success => {
            for token in &tokens.pairs {
                if token.key == RESULT_KEY {
                    result = Some(token.value.clone());
                } else {
                    data.insert(token.key.as_str(), token.value.as_str());
                }
            }
            if let Some(payload) = &tokens.payload {
                data.insert(DATA_KEY, payload.value.as_str());
            }
        }
        AgiStatus::InvalidCommandSyntax => {
            if !ends_usage_block(response) {
                return ResultParse::NeedMoreData;
            }
        }
        AgiStatus::MemoryAllocationFailure => {
            diagnostic = Some(Diagnostic::critical(
                "gateway reported memory allocation failure",
                blob,
            ));
        }
        AgiStatus::Unknown(code) => {
            diagnostic = Some(Diagnostic::warning(
                format!("unknown status code {code}"),
                blob,
            ));
        }
        AgiStatus::Trying | AgiStatus::InvalidCommand | AgiStatus::CommandNotPermitted => {}
    }

    ResultParse::Complete {
        message: ResultMessage {
            status,
            result,
            data,
            info,
            raw: blob.to_owned(),
        },
        diagnostic,
    }
}
