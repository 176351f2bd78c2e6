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

//! Executor configuration
//!
//! [`ExecutorConfig`] can be built in code with the `with_*` methods or loaded
//! from TOML. Every field is optional in TOML; missing fields keep their
//! defaults.
//!
//! ```toml
//! host = "192.0.2.10"
//! user = "admin"
//! password = "secret"
//! timeout = 5
//! debug = "file:/tmp/telnet-debug.log"
//! terminal_width = 200
//! ```

use crate::ConfigError;
use regex_lite::Regex;
use remexec_telnetcodec::NegotiationPolicy;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Prompt template matching typical device prompts such as `router#`, `host>`
/// or `user@box:~$`.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r"^[^#>$%]+[#>$%?]\s*$";

/// Where a diagnostics channel writes its messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SinkDestination {
    /// Drop every message
    Discard,
    /// Keep messages in memory
    #[default]
    Buffer,
    /// Print messages to standard output
    Console,
    /// Append messages to a file, truncated when the sink is (re)initialised
    File(PathBuf),
}

impl FromStr for SinkDestination {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discard" | "none" => Ok(SinkDestination::Discard),
            "buffer" => Ok(SinkDestination::Buffer),
            "console" => Ok(SinkDestination::Console),
            _ => match s.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(SinkDestination::File(PathBuf::from(path))),
                _ => Err(ConfigError::InvalidDestination(s.to_string())),
            },
        }
    }
}

impl std::fmt::Display for SinkDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkDestination::Discard => write!(f, "discard"),
            SinkDestination::Buffer => write!(f, "buffer"),
            SinkDestination::Console => write!(f, "console"),
            SinkDestination::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

impl<'de> Deserialize<'de> for SinkDestination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A validated prompt regular expression.
///
/// Compiling at construction means an invalid template is reported while the
/// configuration is built, never in the middle of a session.
#[derive(Debug, Clone)]
pub struct PromptPattern {
    regex: Regex,
}

impl PromptPattern {
    /// Compiles `template` into a prompt pattern.
    ///
    /// # Example
    /// ```
    /// use remexec_client::PromptPattern;
    ///
    /// let prompt = PromptPattern::new(r"[#>]\s*$").unwrap();
    /// assert!(prompt.regex().is_match("router# "));
    /// assert!(PromptPattern::new("(unclosed").is_err());
    /// ```
    pub fn new(template: &str) -> Result<Self, ConfigError> {
        Regex::new(template)
            .map(|regex| PromptPattern { regex })
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: template.to_string(),
                source,
            })
    }

    /// The compiled expression
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The template text
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for PromptPattern {
    fn default() -> Self {
        PromptPattern {
            regex: Regex::new(DEFAULT_PROMPT_TEMPLATE).expect("default prompt template compiles"),
        }
    }
}

impl PartialEq for PromptPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl FromStr for PromptPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PromptPattern::new(s)
    }
}

impl<'de> Deserialize<'de> for PromptPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        PromptPattern::new(&text).map_err(serde::de::Error::custom)
    }
}

/// Remote executor configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Device hostname or IP address
    pub host: String,

    /// Device port
    pub port: u16,

    /// Login name; empty together with `password` skips authentication
    pub user: String,

    /// Login password
    pub password: String,

    /// Default wait for connecting, the banner, prompts and responses
    #[serde(deserialize_with = "deserialize_seconds")]
    pub timeout: Duration,

    /// Strip the command echo and the trailing prompt from responses
    pub trim_response: bool,

    /// Record failures only (`true`) or also return them as errors (`false`)
    pub error_silent: bool,

    /// Destination of the debug trace
    pub debug: SinkDestination,

    /// Destination of the error records
    pub error: SinkDestination,

    /// Accept the remote `ECHO` option
    pub terminal_echo_on: bool,

    /// Accept `SUPPRESS-GO-AHEAD`
    pub terminal_go_ahead: bool,

    /// Terminal name answered to `TERMINAL-TYPE`
    pub terminal_type: String,

    /// Columns answered to `WINDOW-SIZE` (0 = unspecified)
    pub terminal_width: u16,

    /// Rows answered to `WINDOW-SIZE` (0 = unspecified)
    pub terminal_height: u16,

    /// Line terminator appended to every line sent
    pub enter_key: String,

    /// Regular expression recognising the device's input prompt
    pub input_prompt_template: PromptPattern,

    /// Probe the host with a plain TCP connect before opening the session
    pub enable_is_alive_check: bool,

    /// Per-option answers for options outside the built-in four
    #[serde(skip)]
    pub option_overrides: Vec<(u8, bool)>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 23,
            user: String::new(),
            password: String::new(),
            timeout: Duration::from_secs(10),
            trim_response: true,
            error_silent: true,
            debug: SinkDestination::Buffer,
            error: SinkDestination::Buffer,
            terminal_echo_on: false,
            terminal_go_ahead: true,
            terminal_type: "vt100".to_string(),
            terminal_width: 0,
            terminal_height: 0,
            enter_key: "\r".to_string(),
            input_prompt_template: PromptPattern::default(),
            enable_is_alive_check: true,
            option_overrides: Vec::new(),
        }
    }
}

impl ExecutorConfig {
    /// Create a configuration for the given host with default settings
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the login credentials
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Set the default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable response trimming
    pub fn with_trim_response(mut self, enabled: bool) -> Self {
        self.trim_response = enabled;
        self
    }

    /// Choose between record-only and record-and-return failures
    pub fn with_error_silent(mut self, silent: bool) -> Self {
        self.error_silent = silent;
        self
    }

    /// Set the debug trace destination
    pub fn with_debug(mut self, destination: SinkDestination) -> Self {
        self.debug = destination;
        self
    }

    /// Set the error record destination
    pub fn with_error(mut self, destination: SinkDestination) -> Self {
        self.error = destination;
        self
    }

    /// Set the `ECHO` stance
    pub fn with_terminal_echo(mut self, enabled: bool) -> Self {
        self.terminal_echo_on = enabled;
        self
    }

    /// Set the `SUPPRESS-GO-AHEAD` stance
    pub fn with_terminal_go_ahead(mut self, enabled: bool) -> Self {
        self.terminal_go_ahead = enabled;
        self
    }

    /// Set the terminal type
    pub fn with_terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.terminal_type = terminal_type.into();
        self
    }

    /// Set the terminal size
    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set the line terminator
    pub fn with_enter_key(mut self, enter_key: impl Into<String>) -> Self {
        self.enter_key = enter_key.into();
        self
    }

    /// Set the input prompt pattern
    pub fn with_prompt(mut self, prompt: PromptPattern) -> Self {
        self.input_prompt_template = prompt;
        self
    }

    /// Enable or disable the reachability probe before connecting
    pub fn with_is_alive_check(mut self, enabled: bool) -> Self {
        self.enable_is_alive_check = enabled;
        self
    }

    /// Accept or refuse an option outside `ECHO`, `SGA`, `TTYPE` and `NAWS`
    pub fn with_option_override(mut self, option: u8, accept: bool) -> Self {
        self.option_overrides.push((option, accept));
        self
    }

    /// Get the device address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the negotiation stance described by the terminal settings.
    pub fn negotiation_policy(&self) -> NegotiationPolicy {
        self.option_overrides.iter().fold(
            NegotiationPolicy::new()
                .with_echo(self.terminal_echo_on)
                .with_suppress_go_ahead(self.terminal_go_ahead)
                .with_terminal_type(self.terminal_type.clone())
                .with_window_size(self.terminal_width, self.terminal_height),
            |policy, &(option, accept)| policy.with_override(option, accept),
        )
    }
}

fn deserialize_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| serde::de::Error::custom(ConfigError::InvalidTimeout(seconds)))
}
