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

//! Client-side answers to option negotiation.
//!
//! The policy answers every `WILL`/`DO` it receives. `ECHO` and
//! `SUPPRESS-GO-AHEAD` follow the configured stance, `TERMINAL-TYPE` and
//! `WINDOW-SIZE` are always accepted and immediately followed by their
//! subnegotiation payload, and everything else is refused unless an override
//! says otherwise. `WONT`, `DONT`, subnegotiations and bare commands are not
//! answered.

use crate::naws::WindowSize;
use crate::{CodecResult, TelnetCodec, TelnetCommand, TelnetOption, TelnetVerb, consts};
use bytes::{BufMut, BytesMut};
use std::collections::BTreeMap;
use tokio_util::codec::Encoder;
use tracing::debug;

/// Terminal stance used to answer option negotiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NegotiationPolicy {
    /// Accept `ECHO` (RFC 857)
    pub echo: bool,
    /// Accept `SUPPRESS-GO-AHEAD` (RFC 858)
    pub suppress_go_ahead: bool,
    /// Terminal name sent in the `TERMINAL-TYPE IS` subnegotiation
    pub terminal_type: String,
    /// Size sent in the `WINDOW-SIZE` subnegotiation
    pub window_size: WindowSize,
    overrides: BTreeMap<u8, bool>,
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self {
            echo: false,
            suppress_go_ahead: true,
            terminal_type: "vt100".to_string(),
            window_size: WindowSize::default(),
            overrides: BTreeMap::new(),
        }
    }
}

impl NegotiationPolicy {
    /// Creates the default policy: echo refused, go-ahead suppressed,
    /// terminal `vt100`, window size unspecified (0x0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `ECHO` stance
    pub fn with_echo(mut self, enabled: bool) -> Self {
        self.echo = enabled;
        self
    }

    /// Set the `SUPPRESS-GO-AHEAD` stance
    pub fn with_suppress_go_ahead(mut self, enabled: bool) -> Self {
        self.suppress_go_ahead = enabled;
        self
    }

    /// Set the terminal type name
    pub fn with_terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.terminal_type = terminal_type.into();
        self
    }

    /// Set the window size
    pub fn with_window_size(mut self, width: u16, height: u16) -> Self {
        self.window_size = WindowSize::new(width, height);
        self
    }

    /// Accept (`true`) or refuse (`false`) an option outside the four built-in ones.
    ///
    /// Overrides for `ECHO`, `SUPPRESS-GO-AHEAD`, `TERMINAL-TYPE` and
    /// `WINDOW-SIZE` are ignored; those follow their dedicated settings.
    pub fn with_override(mut self, option: u8, accept: bool) -> Self {
        self.overrides.insert(option, accept);
        self
    }

    /// Builds the answers to the given commands, in order.
    ///
    /// # Example
    /// ```
    /// use remexec_telnetcodec::{NegotiationPolicy, TelnetCommand, TelnetOption};
    ///
    /// let policy = NegotiationPolicy::new();
    /// let replies = policy.replies(&[TelnetCommand::will(TelnetOption::Echo)]).unwrap();
    /// assert_eq!(replies, vec![TelnetCommand::dont(TelnetOption::Echo)]);
    /// ```
    pub fn replies(&self, commands: &[TelnetCommand]) -> CodecResult<Vec<TelnetCommand>> {
        let mut replies = Vec::new();
        for command in commands {
            let TelnetCommand::Negotiate(verb, option) = command else {
                continue;
            };
            let Some((accept, refuse)) = verb.answers() else {
                continue;
            };
            match option {
                TelnetOption::Echo => {
                    replies.push(Self::answer(accept, refuse, self.echo, *option));
                }
                TelnetOption::SuppressGoAhead => {
                    replies.push(Self::answer(
                        accept,
                        refuse,
                        self.suppress_go_ahead,
                        *option,
                    ));
                }
                TelnetOption::TerminalType => {
                    replies.push(TelnetCommand::will(*option));
                    replies.push(self.terminal_type_is());
                }
                TelnetOption::WindowSize => {
                    replies.push(TelnetCommand::will(*option));
                    replies.push(self.window_size_is()?);
                }
                TelnetOption::Unknown(code) => {
                    let enabled = self.overrides.get(code).copied().unwrap_or(false);
                    replies.push(Self::answer(accept, refuse, enabled, *option));
                }
            }
        }
        for reply in &replies {
            debug!("Negotiation reply {}", reply);
        }
        Ok(replies)
    }

    /// Encodes the answers to `commands` into `dst`, returning the number of
    /// bytes written (zero when nothing needs answering).
    pub fn encode_replies(
        &self,
        commands: &[TelnetCommand],
        dst: &mut BytesMut,
    ) -> CodecResult<usize> {
        let start = dst.len();
        let mut codec = TelnetCodec::new();
        for reply in self.replies(commands)? {
            codec.encode(reply, dst)?;
        }
        Ok(dst.len() - start)
    }

    fn answer(
        accept: TelnetVerb,
        refuse: TelnetVerb,
        enabled: bool,
        option: TelnetOption,
    ) -> TelnetCommand {
        let verb = if enabled { accept } else { refuse };
        TelnetCommand::Negotiate(verb, option)
    }

    fn terminal_type_is(&self) -> TelnetCommand {
        let mut payload = BytesMut::with_capacity(1 + self.terminal_type.len());
        payload.put_u8(consts::ttype::IS);
        payload.put_slice(self.terminal_type.as_bytes());
        TelnetCommand::Subnegotiate(TelnetOption::TerminalType, payload.freeze())
    }

    fn window_size_is(&self) -> CodecResult<TelnetCommand> {
        let mut payload = BytesMut::with_capacity(self.window_size.len());
        self.window_size.encode(&mut payload)?;
        Ok(TelnetCommand::Subnegotiate(
            TelnetOption::WindowSize,
            payload.freeze(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_type_reply_bytes() {
        let policy = NegotiationPolicy::new().with_terminal_type("xterm");
        let mut dst = BytesMut::new();
        let written = policy
            .encode_replies(&[TelnetCommand::do_(TelnetOption::TerminalType)], &mut dst)
            .unwrap();
        let expected: &[u8] = &[
            0xFF, 0xFB, 0x18, 0xFF, 0xFA, 0x18, 0x00, b'x', b't', b'e', b'r', b'm', 0xFF, 0xF0,
        ];
        assert_eq!(&dst[..], expected);
        assert_eq!(written, expected.len());
    }

    #[test]
    fn window_size_reply_bytes() {
        let policy = NegotiationPolicy::new().with_window_size(132, 1000);
        let mut dst = BytesMut::new();
        policy
            .encode_replies(&[TelnetCommand::do_(TelnetOption::WindowSize)], &mut dst)
            .unwrap();
        assert_eq!(
            &dst[..],
            &[
                0xFF, 0xFB, 0x1F, 0xFF, 0xFA, 0x1F, 0x00, 0x84, 0x03, 0xE8, 0xFF, 0xF0
            ]
        );
    }

    #[test]
    fn echo_and_go_ahead_follow_stance() {
        let refuse = NegotiationPolicy::new()
            .with_echo(false)
            .with_suppress_go_ahead(false);
        assert_eq!(
            refuse.replies(&[
                TelnetCommand::will(TelnetOption::Echo),
                TelnetCommand::do_(TelnetOption::SuppressGoAhead),
            ])
            .unwrap(),
            vec![
                TelnetCommand::dont(TelnetOption::Echo),
                TelnetCommand::wont(TelnetOption::SuppressGoAhead),
            ]
        );

        let accept = NegotiationPolicy::new()
            .with_echo(true)
            .with_suppress_go_ahead(true);
        assert_eq!(
            accept.replies(&[
                TelnetCommand::do_(TelnetOption::Echo),
                TelnetCommand::will(TelnetOption::SuppressGoAhead),
            ])
            .unwrap(),
            vec![
                TelnetCommand::will(TelnetOption::Echo),
                TelnetCommand::do_(TelnetOption::SuppressGoAhead),
            ]
        );
    }

    #[test]
    fn unknown_options_are_refused_unless_overridden() {
        let policy = NegotiationPolicy::new().with_override(0x22, true);
        assert_eq!(
            policy.replies(&[
                TelnetCommand::do_(TelnetOption::Unknown(0x20)),
                TelnetCommand::will(TelnetOption::Unknown(0x20)),
                TelnetCommand::do_(TelnetOption::Unknown(0x22)),
            ])
            .unwrap(),
            vec![
                TelnetCommand::wont(TelnetOption::Unknown(0x20)),
                TelnetCommand::dont(TelnetOption::Unknown(0x20)),
                TelnetCommand::will(TelnetOption::Unknown(0x22)),
            ]
        );
    }

    #[test]
    fn refusals_and_subnegotiations_are_not_answered() {
        let policy = NegotiationPolicy::new();
        let mut dst = BytesMut::new();
        let written = policy
            .encode_replies(
                &[
                    TelnetCommand::wont(TelnetOption::Echo),
                    TelnetCommand::dont(TelnetOption::TerminalType),
                    TelnetCommand::Subnegotiate(
                        TelnetOption::TerminalType,
                        bytes::Bytes::from_static(&[consts::ttype::SEND]),
                    ),
                    TelnetCommand::Command(0xF1),
                ],
                &mut dst,
            )
            .unwrap();
        assert_eq!(written, 0);
        assert!(dst.is_empty());
    }
}
