//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Error types for remote execution

use remexec_telnetcodec::CodecError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for executor and session operations
pub type Result<T> = std::result::Result<T, ExecError>;

/// Closed set of failure categories, numbered as they appear in error records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No host configured
    HostEmpty,
    /// The reachability probe failed
    HostUnreachable,
    /// The device rejected the credentials, or the login dialogue broke down
    AuthFail,
    /// The TCP connection could not be established or written to
    SocketError,
    /// The peer closed the connection
    ClosedByRemote,
    /// No expected prompt arrived in time
    Timeout,
    /// A command's response did not end with a prompt in time
    TimeoutDuringExec,
}

impl ErrorCode {
    /// Numeric code stored in error records
    pub fn code(self) -> u8 {
        match self {
            ErrorCode::HostEmpty => 1,
            ErrorCode::HostUnreachable => 2,
            ErrorCode::AuthFail => 3,
            ErrorCode::SocketError => 5,
            ErrorCode::ClosedByRemote => 6,
            ErrorCode::Timeout => 7,
            ErrorCode::TimeoutDuringExec => 8,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorCode::HostEmpty => "HOST_EMPTY",
            ErrorCode::HostUnreachable => "HOST_UNREACHABLE",
            ErrorCode::AuthFail => "AUTH_FAIL",
            ErrorCode::SocketError => "SOCKET_ERROR",
            ErrorCode::ClosedByRemote => "CLOSED_BY_REMOTE",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::TimeoutDuringExec => "TIMEOUT_DURING_EXEC",
        };
        write!(f, "{}({})", name, self.code())
    }
}

/// One recorded failure, as kept by the error sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Failure category
    pub code: ErrorCode,
    /// Operation that failed (`open`, `authenticate`, `execute_command`, ...)
    pub source: String,
    /// Human readable message
    pub message: String,
    /// Raw detail such as the OS error text or the device's answer
    pub detail: Option<String>,
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.source, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Failures of the executor and its backends
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// No host configured
    #[error("Host is empty")]
    HostEmpty,

    /// The reachability probe did not get a TCP connection
    #[error("Unable to connect to [{host}]")]
    HostUnreachable {
        /// Host that was probed
        host: String,
    },

    /// Authentication did not reach the input prompt
    #[error("Authentication failed")]
    AuthFail {
        /// Whitespace-collapsed device answer, or the underlying failure
        detail: Option<String>,
    },

    /// Socket level failure
    #[error("socket error: {detail}")]
    Socket {
        /// Operating system error text
        detail: String,
    },

    /// The peer closed the connection
    #[error("connection is closed by the remote side")]
    ClosedByRemote,

    /// A wait ran past its deadline
    #[error("timeout")]
    Timeout {
        /// Length of the wait that expired
        waited: Duration,
    },

    /// A command's response wait ran past its deadline
    #[error("the command execution timeout")]
    TimeoutDuringExec {
        /// Length of the wait that expired
        waited: Duration,
    },

    /// Malformed Telnet input
    #[error("Protocol error: {0}")]
    Protocol(#[from] CodecError),
}

impl ExecError {
    /// Category of this error in the closed taxonomy
    pub fn kind(&self) -> ErrorCode {
        match self {
            ExecError::HostEmpty => ErrorCode::HostEmpty,
            ExecError::HostUnreachable { .. } => ErrorCode::HostUnreachable,
            ExecError::AuthFail { .. } => ErrorCode::AuthFail,
            ExecError::Socket { .. } | ExecError::Protocol(_) => ErrorCode::SocketError,
            ExecError::ClosedByRemote => ErrorCode::ClosedByRemote,
            ExecError::Timeout { .. } => ErrorCode::Timeout,
            ExecError::TimeoutDuringExec { .. } => ErrorCode::TimeoutDuringExec,
        }
    }

    /// Numeric code of [`ExecError::kind`]
    pub fn code(&self) -> u8 {
        self.kind().code()
    }

    /// Raw detail carried by the error, if any
    pub fn detail(&self) -> Option<String> {
        match self {
            ExecError::HostUnreachable { host } => Some(host.clone()),
            ExecError::AuthFail { detail } => detail.clone(),
            ExecError::Socket { detail } => Some(detail.clone()),
            ExecError::Protocol(err) => Some(err.to_string()),
            _ => None,
        }
    }

    /// Check if the error is an expired wait
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ExecError::Timeout { .. } | ExecError::TimeoutDuringExec { .. }
        )
    }

    /// Check if the connection can no longer be used after this error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ExecError::Socket { .. } | ExecError::ClosedByRemote | ExecError::Protocol(_)
        )
    }

    /// Builds the record stored in the error sink for a failure of `source`.
    pub fn to_record(&self, source: &str) -> ErrorRecord {
        ErrorRecord {
            code: self.kind(),
            source: source.to_string(),
            message: self.to_string(),
            detail: self.detail(),
        }
    }
}

impl From<std::io::Error> for ExecError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::BrokenPipe => ExecError::ClosedByRemote,
            _ => ExecError::Socket {
                detail: error.to_string(),
            },
        }
    }
}

/// Configuration loading and validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The prompt template is not a valid regular expression
    #[error("Invalid prompt pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The rejected template
        pattern: String,
        /// Regex compilation error
        source: regex_lite::Error,
    },

    /// A diagnostics destination string was not understood
    #[error("Invalid diagnostics destination `{0}`, expected discard, buffer, console or file:<path>")]
    InvalidDestination(String),

    /// A timeout value is negative or not finite
    #[error("Invalid timeout {0}")]
    InvalidTimeout(f64),

    /// The configuration file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for [`crate::ExecutorConfig`]
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
