//! Result status codes.

use std::fmt::{Display, Formatter};

/// Status code carried at the start of every result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgiStatus {
    /// `100`: the command is still running; a final result follows.
    Trying,
    /// `200`: the command completed.
    Success,
    /// `503`: the gateway could not allocate memory for the command.
    MemoryAllocationFailure,
    /// `510`: the command name is not recognised.
    InvalidCommand,
    /// `511`: the command may not run on a dead channel.
    CommandNotPermitted,
    /// `520`: the command syntax is wrong; usage text follows.
    InvalidCommandSyntax,
    /// Any other numeric code, preserved as received.
    Unknown(u32),
}

impl AgiStatus {
    /// Map a numeric code onto the closed status set.
    #[must_use]
    pub fn from_code(code: u32) -> Self {
        match code {
            100 => Self::Trying,
            200 => Self::Success,
            503 => Self::MemoryAllocationFailure,
            510 => Self::InvalidCommand,
            511 => Self::CommandNotPermitted,
            520 => Self::InvalidCommandSyntax,
            other => Self::Unknown(other),
        }
    }

    /// Numeric wire code.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Trying => 100,
            Self::Success => 200,
            Self::MemoryAllocationFailure => 503,
            Self::InvalidCommand => 510,
            Self::CommandNotPermitted => 511,
            Self::InvalidCommandSyntax => 520,
            Self::Unknown(code) => code,
        }
    }

    /// Whether the code is outside the known set.
    #[must_use]
    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl Display for AgiStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Trying => "trying",
            Self::Success => "success",
            Self::MemoryAllocationFailure => "memory allocation failure",
            Self::InvalidCommand => "invalid command",
            Self::CommandNotPermitted => "command not permitted",
            Self::InvalidCommandSyntax => "invalid command syntax",
            Self::Unknown(_) => "unknown",
        };
        write!(f, "{} {label}", self.code())
    }
}
