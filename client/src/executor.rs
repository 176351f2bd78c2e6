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

//! Remote executor: connection lifecycle and batch execution over a backend

use crate::{
    BufferKind, Diagnostics, ErrorRecord, ExecError, ExecutorConfig, Result, TelnetSession,
};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{info, warn};

/// Probe timeout used when no timeout is configured
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Session state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No connection
    #[default]
    Disconnected,
    /// Opening the transport
    Connecting,
    /// Transport open, not authenticated
    Connected,
    /// Login dialogue in progress
    Authenticating,
    /// Ready to execute commands
    Authenticated,
}

impl SessionState {
    /// Check if a transport is open
    pub fn is_connected(self) -> bool {
        self != SessionState::Disconnected
    }
}

/// Commands passed to [`RemoteExecutor::exec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One line; embedded newlines split it into several commands
    Line(String),
    /// An ordered batch of commands
    Batch(Vec<String>),
}

impl From<&str> for Command {
    fn from(line: &str) -> Self {
        Command::Line(line.to_string())
    }
}

impl From<String> for Command {
    fn from(line: String) -> Self {
        Command::Line(line)
    }
}

impl From<Vec<String>> for Command {
    fn from(batch: Vec<String>) -> Self {
        Command::Batch(batch)
    }
}

impl From<Vec<&str>> for Command {
    fn from(batch: Vec<&str>) -> Self {
        Command::Batch(batch.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Command {
    fn from(batch: &[&str]) -> Self {
        Command::Batch(batch.iter().map(|line| (*line).to_string()).collect())
    }
}

/// Responses returned by [`RemoteExecutor::exec`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutput {
    /// Response to a single [`Command::Line`] without embedded newlines
    Single(String),
    /// Responses in command order
    Many(Vec<String>),
}

impl ExecOutput {
    /// The single response, if this is one
    pub fn as_single(&self) -> Option<&str> {
        match self {
            ExecOutput::Single(text) => Some(text),
            ExecOutput::Many(_) => None,
        }
    }

    /// All responses in command order
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ExecOutput::Single(text) => vec![text],
            ExecOutput::Many(texts) => texts,
        }
    }
}

/// Identifies the open connection returned by [`RemoteExecutor::open`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    /// Connected host
    pub host: String,
    /// Connected port
    pub port: u16,
}

/// New settings for [`RemoteExecutor::open_with`]
#[derive(Debug, Clone)]
pub enum Target {
    /// Keep the current settings, change the host
    Host(String),
    /// Replace all settings
    Config(Box<ExecutorConfig>),
}

impl From<&str> for Target {
    fn from(host: &str) -> Self {
        Target::Host(host.to_string())
    }
}

impl From<String> for Target {
    fn from(host: String) -> Self {
        Target::Host(host)
    }
}

impl From<ExecutorConfig> for Target {
    fn from(config: ExecutorConfig) -> Self {
        Target::Config(Box::new(config))
    }
}

/// Protocol backend driven by [`RemoteExecutor`].
///
/// The executor owns ordering, error recording and the silent/raising switch;
/// a backend only moves bytes and reports what went wrong.
#[async_trait::async_trait]
pub trait RemoteBackend: Send {
    /// Apply settings; called before every fresh connection.
    fn configure(&mut self, config: &ExecutorConfig, diagnostics: Diagnostics);

    /// Current session state
    fn state(&self) -> SessionState;

    /// Open the transport.
    async fn connect(&mut self) -> Result<()>;

    /// Log in. Returns immediately when already authenticated.
    async fn authenticate(&mut self) -> Result<()>;

    /// Split a [`Command`] into the individual lines to execute.
    ///
    /// A [`Command::Line`] is split on `\n`, dropping one trailing `\r` from
    /// each piece.
    fn prepare_command(&self, command: &Command) -> Vec<String> {
        match command {
            Command::Line(line) => line
                .split('\n')
                .map(|piece| piece.strip_suffix('\r').unwrap_or(piece).to_string())
                .collect(),
            Command::Batch(batch) => batch.clone(),
        }
    }

    /// Run one command and return its response.
    async fn execute_command(&mut self, command: &str, timeout: Option<Duration>)
    -> Result<String>;

    /// Release the transport and reset authentication.
    fn close(&mut self);
}

/// Runs commands on a remote device through a [`RemoteBackend`].
///
/// Every failure is recorded once in the error sink. With
/// `error_silent = true` the operation then returns `Ok(None)`; otherwise it
/// returns the same failure as `Err`.
///
/// # Example
/// ```no_run
/// use remexec_client::{ExecutorConfig, Telnet};
///
/// # async fn example() -> Result<(), remexec_client::ExecError> {
/// let config = ExecutorConfig::new("192.0.2.1").with_credentials("admin", "secret");
/// let mut telnet = Telnet::new(config);
/// if let Some(output) = telnet.exec("show clock", None).await? {
///     println!("{}", output.as_single().unwrap_or_default());
/// } else {
///     eprintln!("{:?}", telnet.last_error());
/// }
/// # Ok(())
/// # }
/// ```
pub struct RemoteExecutor<B: RemoteBackend> {
    config: ExecutorConfig,
    backend: B,
    diagnostics: Diagnostics,
}

/// Executor with the Telnet backend
pub type Telnet = RemoteExecutor<TelnetSession>;

impl<B: RemoteBackend + Default> RemoteExecutor<B> {
    /// Create an executor with a default-constructed backend
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_backend(config, B::default())
    }
}

impl<B: RemoteBackend> RemoteExecutor<B> {
    /// Create an executor around an existing backend
    pub fn with_backend(config: ExecutorConfig, mut backend: B) -> Self {
        let diagnostics = Diagnostics::new(config.debug.clone(), config.error.clone());
        backend.configure(&config, diagnostics.clone());
        Self {
            config,
            backend,
            diagnostics,
        }
    }

    /// Current settings
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Shared diagnostics handle
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.backend.state()
    }

    /// Opens and authenticates the session with the current settings.
    ///
    /// Returns the existing handle when the session is already open.
    pub async fn open(&mut self) -> Result<Option<ConnectionHandle>> {
        if self.backend.state().is_connected() {
            return Ok(Some(self.handle()));
        }

        if self.config.host.is_empty() {
            return self.fail("open", ExecError::HostEmpty);
        }

        self.diagnostics
            .debug("open", format!("Opening [{}]", self.config.address()));

        if self.config.enable_is_alive_check && !self.is_alive(None).await {
            let host = self.config.host.clone();
            return self.fail("open", ExecError::HostUnreachable { host });
        }

        if let Err(err) = self.backend.connect().await {
            self.backend.close();
            return self.fail("connect", err);
        }
        info!("Connected to {}", self.config.address());

        if let Err(err) = self.backend.authenticate().await {
            self.backend.close();
            return self.fail("authenticate", err);
        }

        Ok(Some(self.handle()))
    }

    /// Applies new settings, closing any open session first, then opens.
    pub async fn open_with(
        &mut self,
        target: impl Into<Target>,
    ) -> Result<Option<ConnectionHandle>> {
        self.close();
        match target.into() {
            Target::Host(host) => self.config.host = host,
            Target::Config(config) => {
                self.config = *config;
                self.diagnostics
                    .reconfigure(self.config.debug.clone(), self.config.error.clone());
            }
        }
        self.backend.configure(&self.config, self.diagnostics.clone());
        self.open().await
    }

    /// Closes the session. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.backend.close();
    }

    /// Executes one command, a newline-separated list, or a batch.
    ///
    /// Opens and authenticates first if needed. Commands run in order; the
    /// first failure discards all collected responses and later commands are
    /// not sent. `timeout` overrides the configured wait for each response.
    pub async fn exec(
        &mut self,
        command: impl Into<Command>,
        timeout: Option<Duration>,
    ) -> Result<Option<ExecOutput>> {
        let command = command.into();

        match self.open().await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(None),
            Err(err) => return Err(err),
        }
        if self.backend.state() != SessionState::Authenticated {
            if let Err(err) = self.backend.authenticate().await {
                self.backend.close();
                return self.fail("authenticate", err);
            }
        }

        let lines = self.backend.prepare_command(&command);
        let mut responses = Vec::with_capacity(lines.len());
        for line in &lines {
            match self.backend.execute_command(line, timeout).await {
                Ok(response) => responses.push(response),
                Err(err) => {
                    if err.is_connection_error() {
                        self.backend.close();
                    }
                    return self.fail("execute_command", err);
                }
            }
        }

        if responses.len() == 1 && matches!(command, Command::Line(_)) {
            Ok(responses.pop().map(ExecOutput::Single))
        } else {
            Ok(Some(ExecOutput::Many(responses)))
        }
    }

    /// Checks whether a TCP connection to the configured host succeeds
    /// within `timeout` (default: the configured timeout, or 5 seconds).
    ///
    /// The probe uses its own connection and leaves the session untouched.
    pub async fn is_alive(&self, timeout_override: Option<Duration>) -> bool {
        let wait = timeout_override
            .filter(|wait| !wait.is_zero())
            .or(Some(self.config.timeout).filter(|wait| !wait.is_zero()))
            .unwrap_or(DEFAULT_PROBE_TIMEOUT);
        let address = (self.config.host.as_str(), self.config.port);
        match timeout(wait, TcpStream::connect(address)).await {
            Ok(Ok(_probe)) => true,
            Ok(Err(err)) => {
                warn!("Host {} is not reachable: {}", self.config.address(), err);
                false
            }
            Err(_) => {
                warn!(
                    "Host {} did not answer within {:?}",
                    self.config.address(),
                    wait
                );
                false
            }
        }
    }

    /// The most recent error record
    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.diagnostics.last_error()
    }

    /// All error records, oldest first
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.diagnostics.errors()
    }

    /// The debug trace, oldest first
    pub fn debug_messages(&self) -> Vec<String> {
        self.diagnostics.debug_messages()
    }

    /// Re-initialises the chosen diagnostics buffers.
    pub fn clear_buffers(&self, kind: BufferKind) {
        self.diagnostics.clear(kind);
    }

    fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            host: self.config.host.clone(),
            port: self.config.port,
        }
    }

    fn fail<T>(&self, source: &str, err: ExecError) -> Result<Option<T>> {
        self.diagnostics.error(err.to_record(source));
        if self.config.error_silent {
            Ok(None)
        } else {
            Err(err)
        }
    }
}

impl<B: RemoteBackend> Drop for RemoteExecutor<B> {
    fn drop(&mut self) {
        self.backend.close();
    }
}
