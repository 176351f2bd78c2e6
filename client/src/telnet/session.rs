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

//! Telnet session: socket, negotiation, prompt-synchronised reads and login

use super::trim::{last_line, trim_from_echo, trim_from_prompt, trim_response};
use crate::executor::{RemoteBackend, SessionState};
use crate::{Diagnostics, ExecError, ExecutorConfig, Result};
use bytes::BytesMut;
use regex_lite::Regex;
use remexec_telnetcodec::{NegotiationPolicy, TelnetCodec};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};
use tokio_util::codec::Encoder;
use tracing::{error, info, warn};

/// Bytes requested from the socket per read
pub const READ_BUFFER_SIZE: usize = 8192;

/// Wait used when neither the call nor the configuration gives one
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(1);

/// Deadline used when a wait is too long to be added to the current instant
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

static AUTH_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(login|user|password)").expect("valid auth type pattern"));
static PASSWORD_PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)password").expect("valid password pattern"));
static AUTH_FAILURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ims)(fail|invalid|error)").expect("valid failure pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Where [`TelnetSession::get_answer`] looks for a pattern match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalyzeMode {
    /// Only the text after the last `\n`
    Fast,
    /// Everything received since the wait started
    #[default]
    Total,
}

/// Result of a successful [`TelnetSession::get_answer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Index of the pattern that matched
    pub index: usize,
    /// Everything received during the wait
    pub text: String,
    /// Capture groups of the match; group 0 is the whole match
    pub captures: Vec<Option<String>>,
}

impl Answer {
    /// The text matched by the whole pattern
    pub fn matched(&self) -> &str {
        self.captures
            .first()
            .and_then(|group| group.as_deref())
            .unwrap_or_default()
    }
}

/// Telnet connection to a line-oriented device.
///
/// Used on its own or as the backend of [`crate::Telnet`]. Every receive goes
/// through the negotiation parser; answers to the peer's option requests are
/// sent before the text is handed back.
pub struct TelnetSession {
    config: ExecutorConfig,
    policy: NegotiationPolicy,
    diagnostics: Diagnostics,
    stream: Option<TcpStream>,
    codec: TelnetCodec,
    read_buffer: BytesMut,
    partial_text: Vec<u8>,
    state: SessionState,
    banner: String,
    input_buffer: String,
    input_prompt: String,
    last_request: String,
    last_timeout: Option<Duration>,
}

impl Default for TelnetSession {
    fn default() -> Self {
        TelnetSession::new(ExecutorConfig::default())
    }
}

impl TelnetSession {
    /// Create a disconnected session with its own diagnostics sinks
    pub fn new(config: ExecutorConfig) -> Self {
        let diagnostics = Diagnostics::new(config.debug.clone(), config.error.clone());
        Self::with_diagnostics(config, diagnostics)
    }

    /// Create a disconnected session writing to shared diagnostics sinks
    pub fn with_diagnostics(config: ExecutorConfig, diagnostics: Diagnostics) -> Self {
        Self {
            policy: config.negotiation_policy(),
            config,
            diagnostics,
            stream: None,
            codec: TelnetCodec::new(),
            read_buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            partial_text: Vec::new(),
            state: SessionState::Disconnected,
            banner: String::new(),
            input_buffer: String::new(),
            input_prompt: String::new(),
            last_request: String::new(),
            last_timeout: None,
        }
    }

    /// Current settings
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Diagnostics sinks this session writes its trace to
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The prompt captured after the last command
    pub fn input_prompt(&self) -> &str {
        &self.input_prompt
    }

    /// Text received during the last wait, trimmed when `trimmed` (default:
    /// the `trim_response` setting) is set
    pub fn input_buffer(&self, trimmed: Option<bool>) -> String {
        if trimmed.unwrap_or(self.config.trim_response) {
            self.trim_response(&self.input_buffer)
        } else {
            self.input_buffer.clone()
        }
    }

    /// Length of the last wait that expired
    pub fn last_timeout(&self) -> Option<Duration> {
        self.last_timeout
    }

    /// Text received before the credentials were sent
    pub fn banner(&self) -> &str {
        &self.banner
    }

    /// Strips the echo of the last command and the captured prompt.
    pub fn trim_response(&self, response: &str) -> String {
        trim_response(response, &self.last_request, &self.input_prompt).to_string()
    }

    /// Strips the echo of the last command.
    pub fn trim_from_echo(&self, response: &str) -> String {
        trim_from_echo(response, &self.last_request).to_string()
    }

    /// Cuts the response at the last occurrence of the captured prompt.
    pub fn trim_from_prompt(&self, response: &str) -> String {
        trim_from_prompt(response, &self.input_prompt).to_string()
    }

    /// Opens the TCP connection and reads the banner.
    pub async fn connect(&mut self) -> Result<()> {
        self.close();
        self.state = SessionState::Connecting;
        let address = self.config.address();
        let wait = self.effective_timeout(None);

        let connected = timeout(
            wait,
            TcpStream::connect((self.config.host.as_str(), self.config.port)),
        )
        .await;
        let stream = match connected {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                error!("Failed to connect to {}: {}", address, err);
                self.state = SessionState::Disconnected;
                return Err(ExecError::Socket {
                    detail: err.to_string(),
                });
            }
            Err(_) => {
                error!("Connection to {} timed out", address);
                self.state = SessionState::Disconnected;
                return Err(ExecError::Socket {
                    detail: format!("connection to {address} timed out after {wait:?}"),
                });
            }
        };

        self.stream = Some(stream);
        self.state = SessionState::Connected;
        info!("Connected to {}", address);
        self.diagnostics
            .debug("connect", format!("Connected to [{address}]"));

        self.handshake().await
    }

    /// First read after connecting. Silence is not an error here.
    async fn handshake(&mut self) -> Result<()> {
        self.diagnostics.debug("handshake", "start");
        let wait = self.effective_timeout(None);
        match self.read(wait).await {
            Ok(text) => {
                self.input_buffer = text;
                Ok(())
            }
            Err(err @ ExecError::Timeout { .. }) => {
                self.input_buffer.clear();
                self.diagnostics.debug("handshake", err);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Logs in with the configured credentials.
    ///
    /// Skipped when both user and password are empty. Any failure closes the
    /// session and is reported as [`ExecError::AuthFail`].
    pub async fn authenticate(&mut self) -> Result<()> {
        match self.state {
            SessionState::Authenticated => return Ok(()),
            SessionState::Disconnected | SessionState::Connecting => {
                return Err(not_connected());
            }
            SessionState::Connected | SessionState::Authenticating => {}
        }

        if self.config.user.is_empty() && self.config.password.is_empty() {
            self.diagnostics.debug(
                "authenticate",
                "User & Password is empty - authentication is disabled",
            );
            self.state = SessionState::Authenticated;
            return Ok(());
        }

        self.state = SessionState::Authenticating;
        self.diagnostics.debug("authenticate", "start");
        match self.login().await {
            Ok(()) => {
                self.state = SessionState::Authenticated;
                self.diagnostics.debug("authenticate", "Success");
                Ok(())
            }
            Err(err) => {
                warn!("Authentication on {} failed: {}", self.config.address(), err);
                self.close();
                Err(match err {
                    ExecError::AuthFail { .. } => err,
                    other => ExecError::AuthFail {
                        detail: Some(other.to_string()),
                    },
                })
            }
        }
    }

    async fn login(&mut self) -> Result<()> {
        let wait = self.effective_timeout(None);
        let deadline = deadline_after(wait);
        let method = loop {
            let found = AUTH_TYPE
                .captures(last_line(&self.input_buffer))
                .and_then(|captures| captures.get(1))
                .map(|method| method.as_str().to_lowercase());
            if let Some(method) = found {
                break method;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.expired(wait));
            }
            let text = match self.read(remaining).await {
                Ok(text) => text,
                Err(ExecError::Timeout { .. }) => return Err(self.expired(wait)),
                Err(err) => return Err(err),
            };
            self.input_buffer.push_str(&text);
        };
        self.diagnostics
            .debug("authenticate", format!("method: {method}"));

        self.banner = self.input_buffer.clone();

        let user = self.config.user.clone();
        let password = self.config.password.clone();
        if method == "password" {
            self.send_line(&password).await?;
        } else {
            self.send_line(&user).await?;
            self.get_answer(&[&*PASSWORD_PROMPT], AnalyzeMode::Total, None)
                .await?;
            self.send_line(&password).await?;
        }

        let prompt = self.config.input_prompt_template.regex().clone();
        let answer = self
            .get_answer(&[&prompt, &*AUTH_FAILURE], AnalyzeMode::Total, None)
            .await?;
        if answer.index == 0 {
            Ok(())
        } else {
            Err(ExecError::AuthFail {
                detail: Some(WHITESPACE.replace_all(&answer.text, " ").into_owned()),
            })
        }
    }

    /// Sends `command` and waits for the input prompt on the last line.
    ///
    /// The matched prompt is kept as [`TelnetSession::input_prompt`]. A wait
    /// that expires is reported as [`ExecError::TimeoutDuringExec`].
    pub async fn execute_command(
        &mut self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.last_request = command.to_string();
        self.send_line(command).await?;

        let prompt = self.config.input_prompt_template.regex().clone();
        let answer = match self.get_answer(&[&prompt], AnalyzeMode::Fast, timeout).await {
            Ok(answer) => answer,
            Err(ExecError::Timeout { waited }) => {
                return Err(ExecError::TimeoutDuringExec { waited });
            }
            Err(err) => return Err(err),
        };
        self.input_prompt = answer.matched().to_string();

        if self.config.trim_response {
            Ok(self.trim_response(&answer.text))
        } else {
            Ok(answer.text)
        }
    }

    /// Reads until one of `patterns` matches.
    ///
    /// The input buffer is cleared first and accumulates every read of this
    /// wait. `timeout` (default: the configured timeout) bounds the whole
    /// wait; when it expires the result is [`ExecError::Timeout`] and
    /// [`TelnetSession::last_timeout`] equals that timeout.
    pub async fn get_answer(
        &mut self,
        patterns: &[&Regex],
        mode: AnalyzeMode,
        timeout: Option<Duration>,
    ) -> Result<Answer> {
        let wait = self.effective_timeout(timeout);
        let deadline = deadline_after(wait);
        self.input_buffer.clear();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.expired(wait));
            }
            match self.read(remaining).await {
                Ok(text) => self.input_buffer.push_str(&text),
                Err(ExecError::Timeout { .. }) => return Err(self.expired(wait)),
                Err(err) => return Err(err),
            }

            let analyzed = match mode {
                AnalyzeMode::Fast => last_line(&self.input_buffer),
                AnalyzeMode::Total => self.input_buffer.as_str(),
            };
            for (index, pattern) in patterns.iter().enumerate() {
                if let Some(captures) = pattern.captures(analyzed) {
                    let captures = captures
                        .iter()
                        .map(|group| group.map(|m| m.as_str().to_string()))
                        .collect();
                    return Ok(Answer {
                        index,
                        text: self.input_buffer.clone(),
                        captures,
                    });
                }
            }
        }
    }

    /// One receive bounded by `wait`.
    ///
    /// Negotiation requests in the received bytes are answered straight away;
    /// the remaining text is returned. A read of only negotiation bytes
    /// returns an empty string. A UTF-8 character cut off at the end of the
    /// read is held back and returned with the next read.
    pub async fn read(&mut self, wait: Duration) -> Result<String> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(not_connected());
        };
        self.read_buffer.reserve(READ_BUFFER_SIZE);

        let received = match timeout(wait, stream.read_buf(&mut self.read_buffer)).await {
            Err(_) => {
                self.last_timeout = Some(wait);
                return Err(ExecError::Timeout { waited: wait });
            }
            Ok(Err(err)) => {
                let err = ExecError::from(err);
                if err == ExecError::ClosedByRemote {
                    self.close();
                }
                return Err(err);
            }
            Ok(Ok(0)) => {
                self.close();
                return Err(ExecError::ClosedByRemote);
            }
            Ok(Ok(received)) => received,
        };

        let parsed = self.codec.decode_input(&mut self.read_buffer)?;
        self.partial_text.extend_from_slice(&parsed.text);
        let text = take_complete_utf8(&mut self.partial_text);
        let commands = parsed
            .commands
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.diagnostics.debug(
            "read",
            format!("bytes [{received}], data comm [{commands}], data text [{text}]"),
        );

        let mut reply = BytesMut::new();
        if self.policy.encode_replies(&parsed.commands, &mut reply)? > 0 {
            self.send(&reply).await?;
        }
        Ok(text)
    }

    /// Writes raw bytes to the socket.
    pub async fn send(&mut self, data: &[u8]) -> Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(not_connected());
        };
        if let Err(err) = stream.write_all(data).await {
            let err = ExecError::from(err);
            if err == ExecError::ClosedByRemote {
                self.close();
            }
            return Err(err);
        }
        self.diagnostics.debug(
            "send",
            format!(
                "bytes [{}], data [{}]",
                data.len(),
                String::from_utf8_lossy(data)
            ),
        );
        Ok(data.len())
    }

    /// Sends `line` followed by the enter key, escaping `IAC` bytes.
    pub async fn send_line(&mut self, line: &str) -> Result<usize> {
        let mut out = BytesMut::with_capacity(line.len() + self.config.enter_key.len());
        self.codec.encode(line.as_bytes(), &mut out)?;
        self.codec
            .encode(self.config.enter_key.as_bytes(), &mut out)?;
        self.send(&out).await
    }

    /// Drops the socket and resets authentication. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            self.diagnostics.debug("close", "OK");
        }
        self.state = SessionState::Disconnected;
        self.codec = TelnetCodec::new();
        self.read_buffer.clear();
        self.partial_text.clear();
    }

    fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        requested
            .filter(|wait| !wait.is_zero())
            .or(Some(self.config.timeout).filter(|wait| !wait.is_zero()))
            .unwrap_or(FALLBACK_TIMEOUT)
    }

    fn expired(&mut self, wait: Duration) -> ExecError {
        self.last_timeout = Some(wait);
        ExecError::Timeout { waited: wait }
    }
}

impl Drop for TelnetSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait::async_trait]
impl RemoteBackend for TelnetSession {
    fn configure(&mut self, config: &ExecutorConfig, diagnostics: Diagnostics) {
        self.config = config.clone();
        self.policy = config.negotiation_policy();
        self.diagnostics = diagnostics;
    }

    fn state(&self) -> SessionState {
        self.state
    }

    async fn connect(&mut self) -> Result<()> {
        TelnetSession::connect(self).await
    }

    async fn authenticate(&mut self) -> Result<()> {
        TelnetSession::authenticate(self).await
    }

    async fn execute_command(
        &mut self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<String> {
        TelnetSession::execute_command(self, command, timeout).await
    }

    fn close(&mut self) {
        TelnetSession::close(self);
    }
}

fn not_connected() -> ExecError {
    ExecError::Socket {
        detail: "not connected".to_string(),
    }
}

fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Decodes `pending` up to an unfinished UTF-8 sequence at its end, which
/// stays in `pending`. Invalid bytes elsewhere become U+FFFD.
fn take_complete_utf8(pending: &mut Vec<u8>) -> String {
    let keep = incomplete_utf8_tail(pending);
    let tail = pending.split_off(pending.len() - keep);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = tail;
    text
}

/// Length of a multi-byte sequence started but not finished at the end of `bytes`
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let needed = match byte {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return 0,
        };
        return if needed > back { back } else { 0 };
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_text_is_returned_whole() {
        let mut pending = "host# ".as_bytes().to_vec();
        assert_eq!(take_complete_utf8(&mut pending), "host# ");
        assert!(pending.is_empty());
    }

    #[test]
    fn cut_character_waits_for_the_next_read() {
        // "Пр" is D0 9F D1 80
        let mut pending = vec![b'a', 0xD0, 0x9F, 0xD1];
        assert_eq!(take_complete_utf8(&mut pending), "aП");
        assert_eq!(pending, vec![0xD1]);

        pending.extend_from_slice(&[0x80, b'\r']);
        assert_eq!(take_complete_utf8(&mut pending), "р\r");
        assert!(pending.is_empty());
    }

    #[test]
    fn four_byte_sequence_is_held_until_complete() {
        // U+1F600 is F0 9F 98 80
        let mut pending = vec![0xF0, 0x9F, 0x98];
        assert_eq!(take_complete_utf8(&mut pending), "");
        assert_eq!(pending.len(), 3);
        pending.push(0x80);
        assert_eq!(take_complete_utf8(&mut pending), "\u{1F600}");
    }

    #[test]
    fn invalid_bytes_are_not_held_back() {
        let mut pending = vec![b'x', 0xFF];
        assert_eq!(take_complete_utf8(&mut pending), "x\u{FFFD}");
        assert!(pending.is_empty());
    }

    #[test]
    fn huge_wait_gets_a_far_deadline() {
        assert!(deadline_after(Duration::MAX) > Instant::now() + Duration::from_secs(86400));
    }
}
