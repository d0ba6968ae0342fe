//! Outbound command lines: the known command set, parsing, and encoding.
//!
//! A command line is a command name followed by arguments, where a
//! double-quoted segment is a single argument:
//!
//! ```text
//! EXEC Dial "SIP/100,30" tT
//! GET VARIABLE "my var"
//! ```

use std::fmt::{Display, Formatter};

use crate::protocol::diagnostic::Diagnostic;
use crate::protocol::line_buffer::trim_cr;
use crate::{AgiError, Result};

const QUOTE: char = '"';

/// Every command name the gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AgiCommand {
    Answer,
    AsyncAgiBreak,
    ChannelStatus,
    ControlStreamFile,
    DatabaseDel,
    DatabaseDeltree,
    DatabaseGet,
    DatabasePut,
    Exec,
    GetData,
    GetFullVariable,
    GetOption,
    GetVariable,
    Gosub,
    Hangup,
    Noop,
    ReceiveChar,
    ReceiveText,
    RecordFile,
    SayAlpha,
    SayDate,
    SayDatetime,
    SayDigits,
    SayNumber,
    SayPhonetic,
    SayTime,
    SendImage,
    SendText,
    SetAutohangup,
    SetCallerid,
    SetContext,
    SetExtension,
    SetMusic,
    SetPriority,
    SetVariable,
    SpeechActivateGrammar,
    SpeechCreate,
    SpeechDeactivateGrammar,
    SpeechDestroy,
    SpeechLoadGrammar,
    SpeechRecognize,
    SpeechSet,
    SpeechUnloadGrammar,
    StreamFile,
    TddMode,
    Verbose,
    WaitForDigit,
}

impl AgiCommand {
    /// All commands, in wire-name order.
    pub const ALL: [Self; 47] = [
        Self::Answer,
        Self::AsyncAgiBreak,
        Self::ChannelStatus,
        Self::ControlStreamFile,
        Self::DatabaseDel,
        Self::DatabaseDeltree,
        Self::DatabaseGet,
        Self::DatabasePut,
        Self::Exec,
        Self::GetData,
        Self::GetFullVariable,
        Self::GetOption,
        Self::GetVariable,
        Self::Gosub,
        Self::Hangup,
        Self::Noop,
        Self::ReceiveChar,
        Self::ReceiveText,
        Self::RecordFile,
        Self::SayAlpha,
        Self::SayDate,
        Self::SayDatetime,
        Self::SayDigits,
        Self::SayNumber,
        Self::SayPhonetic,
        Self::SayTime,
        Self::SendImage,
        Self::SendText,
        Self::SetAutohangup,
        Self::SetCallerid,
        Self::SetContext,
        Self::SetExtension,
        Self::SetMusic,
        Self::SetPriority,
        Self::SetVariable,
        Self::SpeechActivateGrammar,
        Self::SpeechCreate,
        Self::SpeechDeactivateGrammar,
        Self::SpeechDestroy,
        Self::SpeechLoadGrammar,
        Self::SpeechRecognize,
        Self::SpeechSet,
        Self::SpeechUnloadGrammar,
        Self::StreamFile,
        Self::TddMode,
        Self::Verbose,
        Self::WaitForDigit,
    ];

    /// Name as written on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answer => "ANSWER",
            Self::AsyncAgiBreak => "ASYNCAGI BREAK",
            Self::ChannelStatus => "CHANNEL STATUS",
            Self::ControlStreamFile => "CONTROL STREAM FILE",
            Self::DatabaseDel => "DATABASE DEL",
            Self::DatabaseDeltree => "DATABASE DELTREE",
            Self::DatabaseGet => "DATABASE GET",
            Self::DatabasePut => "DATABASE PUT",
            Self::Exec => "EXEC",
            Self::GetData => "GET DATA",
            Self::GetFullVariable => "GET FULL VARIABLE",
            Self::GetOption => "GET OPTION",
            Self::GetVariable => "GET VARIABLE",
            Self::Gosub => "GOSUB",
            Self::Hangup => "HANGUP",
            Self::Noop => "NOOP",
            Self::ReceiveChar => "RECEIVE CHAR",
            Self::ReceiveText => "RECEIVE TEXT",
            Self::RecordFile => "RECORD FILE",
            Self::SayAlpha => "SAY ALPHA",
            Self::SayDate => "SAY DATE",
            Self::SayDatetime => "SAY DATETIME",
            Self::SayDigits => "SAY DIGITS",
            Self::SayNumber => "SAY NUMBER",
            Self::SayPhonetic => "SAY PHONETIC",
            Self::SayTime => "SAY TIME",
            Self::SendImage => "SEND IMAGE",
            Self::SendText => "SEND TEXT",
            Self::SetAutohangup => "SET AUTOHANGUP",
            Self::SetCallerid => "SET CALLERID",
            Self::SetContext => "SET CONTEXT",
            Self::SetExtension => "SET EXTENSION",
            Self::SetMusic => "SET MUSIC",
            Self::SetPriority => "SET PRIORITY",
            Self::SetVariable => "SET VARIABLE",
            Self::SpeechActivateGrammar => "SPEECH ACTIVATE GRAMMAR",
            Self::SpeechCreate => "SPEECH CREATE",
            Self::SpeechDeactivateGrammar => "SPEECH DEACTIVATE GRAMMAR",
            Self::SpeechDestroy => "SPEECH DESTROY",
            Self::SpeechLoadGrammar => "SPEECH LOAD GRAMMAR",
            Self::SpeechRecognize => "SPEECH RECOGNIZE",
            Self::SpeechSet => "SPEECH SET",
            Self::SpeechUnloadGrammar => "SPEECH UNLOAD GRAMMAR",
            Self::StreamFile => "STREAM FILE",
            Self::TddMode => "TDD MODE",
            Self::Verbose => "VERBOSE",
            Self::WaitForDigit => "WAIT FOR DIGIT",
        }
    }

    /// Find the command naming the start of `line`, returning it with the
    /// rest of the line.
    ///
    /// Matching ignores ASCII case, prefers the longest name, and requires
    /// the name to end at whitespace, a quote, or the end of the line, so
    /// `SAY DATETIME` never matches as `SAY DATE`.
    #[must_use]
    pub fn match_prefix(line: &str) -> Option<(Self, &str)> {
        Self::ALL
            .iter()
            .filter_map(|&command| {
                let name = command.as_str();
                let head = line.get(..name.len())?;
                let rest = &line[name.len()..];
                let at_boundary = rest.is_empty()
                    || rest.starts_with(char::is_whitespace)
                    || rest.starts_with(QUOTE);
                (head.eq_ignore_ascii_case(name) && at_boundary).then_some((command, rest))
            })
            .max_by_key(|(command, _)| command.as_str().len())
    }
}

impl Display for AgiCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMessage {
    command: AgiCommand,
    args: Vec<String>,
}

impl CommandMessage {
    /// Build a command with the given arguments.
    #[must_use]
    pub fn new<I, S>(command: AgiCommand, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The command name.
    #[must_use]
    pub fn command(&self) -> AgiCommand {
        self.command
    }

    /// Arguments in textual order.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Join a digit list into one argument, e.g. `[1, 2, 3]` → `"123"`.
    #[must_use]
    pub fn digits<I, D>(digits: I) -> String
    where
        I: IntoIterator<Item = D>,
        D: Display,
    {
        digits.into_iter().map(|d| d.to_string()).collect()
    }

    /// Render the command as a newline-terminated line.
    ///
    /// Arguments that are empty or contain whitespace are double-quoted.
    ///
    /// # Errors
    ///
    /// Returns `AgiError::Encode` if an argument contains a double quote or
    /// a line break, which the wire format cannot carry.
    pub fn encode(&self) -> Result<String> {
        let mut line = String::from(self.command.as_str());
        for arg in &self.args {
            if arg.contains([QUOTE, '\n', '\r']) {
                return Err(AgiError::Encode(format!(
                    "argument {arg:?} of {} contains a quote or line break",
                    self.command
                )));
            }
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                line.push(QUOTE);
                line.push_str(arg);
                line.push(QUOTE);
            } else {
                line.push_str(arg);
            }
        }
        line.push('\n');
        Ok(line)
    }
}

/// Outcome of parsing one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandParse {
    /// A recognised command.
    Complete(CommandMessage),
    /// No known command name starts the line.
    Unrecognized(Diagnostic),
}

/// Parse one command line (without its newline).
#[must_use]
pub fn parse_command_line(line: &[u8]) -> CommandParse {
    let text = String::from_utf8_lossy(trim_cr(line));
    let text = text.trim();

    match AgiCommand::match_prefix(text) {
        Some((command, rest)) => CommandParse::Complete(CommandMessage {
            command,
            args: split_args(rest),
        }),
        None => CommandParse::Unrecognized(Diagnostic::warning("unknown command", text)),
    }
}

/// Split the argument part of a command line.
///
/// Quoted segments become single (trimmed) arguments and are dropped when
/// blank; unquoted segments split on whitespace. Arguments keep their
/// left-to-right order, and an unterminated trailing quote still yields its
/// text as the final argument.
#[must_use]
pub fn split_args(rest: &str) -> Vec<String> {
    let mut args = Vec::new();
    for (index, segment) in rest.trim().split(QUOTE).enumerate() {
        if index % 2 == 1 {
            let quoted = segment.trim();
            if !quoted.is_empty() {
                args.push(quoted.to_owned());
            }
        } else {
            args.extend(segment.split_whitespace().map(str::to_owned));
        }
    }
    args
}
