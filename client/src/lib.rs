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

//! # Remote Command Execution Client
//!
//! Runs commands on line-oriented network devices (routers, switches, embedded
//! shells) and returns their responses as text. A [`RemoteExecutor`] handles
//! the connection lifecycle, batching and error recording; a
//! [`RemoteBackend`] speaks the protocol. The shipped backend is
//! [`TelnetSession`].
//!
//! ## Features
//!
//! - **Option negotiation** - `ECHO`, `SUPPRESS-GO-AHEAD`, `TERMINAL-TYPE`
//!   and `WINDOW-SIZE` answered from the configured terminal stance
//! - **Prompt synchronisation** - every wait ends on a configurable prompt
//!   regular expression under an overall deadline
//! - **Login** - `login`/`user` + `password` or password-only dialogues
//! - **Response trimming** - command echo and trailing prompt removed
//! - **Diagnostics** - debug trace and error records kept in memory, printed,
//!   written to a file or discarded
//!
//! ## Quick Start
//!
//! ```no_run
//! use remexec_client::{ExecOutput, ExecutorConfig, Telnet};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ExecutorConfig::new("192.0.2.1")
//!         .with_credentials("admin", "secret")
//!         .with_timeout(Duration::from_secs(5));
//!     let mut telnet = Telnet::new(config);
//!
//!     match telnet.exec(vec!["terminal length 0", "show version"], None).await {
//!         Ok(Some(ExecOutput::Many(responses))) => {
//!             for response in responses {
//!                 println!("{response}");
//!             }
//!         }
//!         _ => eprintln!("failed: {:?}", telnet.last_error()),
//!     }
//!     telnet.close();
//! }
//! ```
//!
//! ## Failure Surface
//!
//! Every failure produces exactly one [`ErrorRecord`] in the error sink and an
//! `ERROR:` line in the debug trace. With `error_silent = true` (the default)
//! `open`/`exec` then return `Ok(None)`; with `error_silent = false` they
//! return the same failure as `Err(ExecError)`.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod config;
mod diagnostics;
mod error;
mod executor;
pub mod telnet;

pub use self::config::{DEFAULT_PROMPT_TEMPLATE, ExecutorConfig, PromptPattern, SinkDestination};
pub use self::diagnostics::{BufferKind, Diagnostics, Sink};
pub use self::error::{ConfigError, ErrorCode, ErrorRecord, ExecError, Result};
pub use self::executor::{
    Command, ConnectionHandle, DEFAULT_PROBE_TIMEOUT, ExecOutput, RemoteBackend, RemoteExecutor,
    SessionState, Target, Telnet,
};
pub use self::telnet::{AnalyzeMode, Answer, TelnetSession};

// Re-export the wire layer for callers building their own backend
pub use remexec_telnetcodec::{NegotiationPolicy, TelnetCommand, TelnetOption};
