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

use crate::{CodecError, TelnetCommand, TelnetFrame, TelnetVerb, consts};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

/// Default upper bound for buffered subnegotiation parameters.
pub const DEFAULT_MAX_SUBNEGOTIATION: usize = 64 * 1024;

/// A codec splitting a raw Telnet byte stream into plain text and command sequences.
///
/// `TelnetCodec` keeps its parser state between calls, so a command sequence split
/// across two socket reads (for example `IAC DO` at the end of one read and the
/// option byte at the start of the next) is completed on the following call instead
/// of leaking into the text.
///
/// Encoding escapes `IAC` in plain data and in subnegotiation parameters.
pub struct TelnetCodec {
    decoder_buffer: BytesMut,
    decoder_state: DecoderState,
    max_subnegotiation: usize,
}

impl TelnetCodec {
    /// Creates a new `TelnetCodec` in the plain-data state.
    ///
    /// # Example
    /// ```
    /// use remexec_telnetcodec::TelnetCodec;
    ///
    /// let codec = TelnetCodec::new();
    /// assert!(!codec.is_mid_sequence());
    /// ```
    pub fn new() -> TelnetCodec {
        TelnetCodec::default()
    }

    /// Sets the maximum number of subnegotiation parameter bytes buffered
    /// before the decoder gives up on a missing `IAC SE`.
    pub fn with_max_subnegotiation(mut self, limit: usize) -> TelnetCodec {
        self.max_subnegotiation = limit;
        self
    }

    /// Returns `true` while the decoder holds a partially received command sequence.
    pub fn is_mid_sequence(&self) -> bool {
        !matches!(self.decoder_state, DecoderState::NormalData)
    }

    /// Drains every complete frame from `src`, separating commands from text.
    ///
    /// Bytes belonging to an unfinished command sequence are consumed and kept in
    /// the decoder until the rest arrives.
    pub fn decode_input(&mut self, src: &mut BytesMut) -> Result<ParsedInput, CodecError> {
        let mut parsed = ParsedInput::default();
        while let Some(frame) = self.decode(src)? {
            match frame {
                TelnetFrame::Data(data) => parsed.text.extend_from_slice(&data),
                TelnetFrame::Command(command) => parsed.commands.push(command),
            }
        }
        Ok(parsed)
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        TelnetCodec {
            decoder_buffer: BytesMut::new(),
            decoder_state: DecoderState::NormalData,
            max_subnegotiation: DEFAULT_MAX_SUBNEGOTIATION,
        }
    }
}

/// Commands and plain text separated out of one chunk of input.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedInput {
    /// Command sequences in the order they appeared
    pub commands: Vec<TelnetCommand>,
    /// Every byte that was not part of a command sequence
    pub text: Vec<u8>,
}

impl ParsedInput {
    /// The plain text decoded as UTF-8, replacing invalid sequences.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.text).into_owned()
    }
}

/// Splits a complete buffer into `(commands, text)`.
///
/// An unfinished command sequence at the very end of `input` is dropped; use a
/// long-lived [`TelnetCodec`] when the input arrives in pieces.
///
/// # Example
/// ```
/// use remexec_telnetcodec::{TelnetCommand, TelnetOption, parse};
///
/// let (commands, text) = parse(b"\xFF\xFD\x18login: ").unwrap();
/// assert_eq!(commands, vec![TelnetCommand::do_(TelnetOption::TerminalType)]);
/// assert_eq!(text, "login: ");
/// ```
pub fn parse(input: &[u8]) -> Result<(Vec<TelnetCommand>, String), CodecError> {
    let mut codec = TelnetCodec::new();
    let mut src = BytesMut::from(input);
    let parsed = codec.decode_input(&mut src)?;
    if codec.is_mid_sequence() {
        trace!("Dropping unfinished command sequence at end of input");
    }
    let text = parsed.text_lossy();
    Ok((parsed.commands, text))
}

impl Decoder for TelnetCodec {
    type Item = TelnetFrame;
    type Error = CodecError;

    /// Decodes the next frame from `src`.
    ///
    /// # States
    /// - `NormalData`: returns the run of bytes up to the next `IAC` as
    ///   [`TelnetFrame::Data`]; an `IAC` moves to `InterpretAsCommand`.
    /// - `InterpretAsCommand`: `WILL`/`WONT`/`DO`/`DONT` wait for an option byte,
    ///   `SB` starts a subnegotiation and any other code, `IAC` included, is
    ///   returned as [`TelnetCommand::Command`] without adding to the text.
    /// - `Negotiate`: the option byte completes a [`TelnetCommand::Negotiate`].
    /// - `Subnegotiate*`: parameters are kept exactly as received until the
    ///   first `IAC SE`.
    ///
    /// Returns `Ok(None)` once `src` is exhausted.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TelnetFrame>, Self::Error> {
        while src.has_remaining() {
            if let DecoderState::NormalData = self.decoder_state {
                let run = src
                    .iter()
                    .position(|&byte| byte == consts::IAC)
                    .unwrap_or(src.len());
                if run > 0 {
                    return Ok(Some(TelnetFrame::Data(src.split_to(run).freeze())));
                }
                src.advance(1);
                self.decoder_state = DecoderState::InterpretAsCommand;
                continue;
            }

            let byte = src.get_u8();
            match (self.decoder_state, byte) {
                (DecoderState::NormalData, consts::IAC) => {
                    self.decoder_state = DecoderState::InterpretAsCommand;
                }
                (DecoderState::NormalData, _) => {
                    return Ok(Some(TelnetFrame::Data(bytes::Bytes::copy_from_slice(&[
                        byte,
                    ]))));
                }
                (DecoderState::InterpretAsCommand, consts::SB) => {
                    self.decoder_state = DecoderState::Subnegotiate;
                }
                (DecoderState::InterpretAsCommand, _) => match TelnetVerb::from_u8(byte) {
                    Some(verb) => self.decoder_state = DecoderState::Negotiate(verb),
                    None => {
                        self.decoder_state = DecoderState::NormalData;
                        return Ok(Some(TelnetFrame::Command(TelnetCommand::Command(byte))));
                    }
                },
                (DecoderState::Negotiate(verb), _) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(TelnetFrame::Command(TelnetCommand::Negotiate(
                        verb,
                        byte.into(),
                    ))));
                }
                (DecoderState::Subnegotiate, _) => {
                    self.decoder_buffer.clear();
                    self.decoder_state = DecoderState::SubnegotiateArgument(byte);
                }
                (DecoderState::SubnegotiateArgument(option), consts::IAC) => {
                    self.decoder_state = DecoderState::SubnegotiateArgumentIAC(option);
                }
                (DecoderState::SubnegotiateArgument(option), _) => {
                    self.push_argument(option, &[byte])?;
                }
                (DecoderState::SubnegotiateArgumentIAC(option), consts::SE) => {
                    self.decoder_state = DecoderState::NormalData;
                    let params = self.decoder_buffer.split().freeze();
                    return Ok(Some(TelnetFrame::Command(TelnetCommand::Subnegotiate(
                        option.into(),
                        params,
                    ))));
                }
                (DecoderState::SubnegotiateArgumentIAC(option), consts::IAC) => {
                    // the second IAC may still start the closing IAC SE
                    self.push_argument(option, &[consts::IAC])?;
                }
                (DecoderState::SubnegotiateArgumentIAC(option), _) => {
                    self.decoder_state = DecoderState::SubnegotiateArgument(option);
                    self.push_argument(option, &[consts::IAC, byte])?;
                }
            }
        }
        Ok(None)
    }
}

impl TelnetCodec {
    fn push_argument(&mut self, option: u8, bytes: &[u8]) -> Result<(), CodecError> {
        if self.decoder_buffer.len() + bytes.len() > self.max_subnegotiation {
            warn!(
                "Subnegotiation for option {} exceeded {} bytes. Aborting",
                option, self.max_subnegotiation
            );
            self.decoder_buffer.clear();
            self.decoder_state = DecoderState::NormalData;
            return Err(CodecError::SubnegotiationOverflow {
                option,
                limit: self.max_subnegotiation,
            });
        }
        self.decoder_buffer.put_slice(bytes);
        Ok(())
    }
}

impl Encoder<&[u8]> for TelnetCodec {
    type Error = CodecError;

    /// Encodes plain data, doubling every `IAC` byte.
    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        put_escaped(item, dst);
        Ok(())
    }
}

impl Encoder<&TelnetCommand> for TelnetCodec {
    type Error = CodecError;

    /// Encodes a command sequence.
    ///
    /// - `Negotiate(verb, option)`: `IAC <verb> <option>`
    /// - `Subnegotiate(option, params)`: `IAC SB <option> <params> IAC SE`
    /// - `Command(code)`: `IAC <code>`
    fn encode(&mut self, item: &TelnetCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            TelnetCommand::Negotiate(verb, option) => {
                dst.reserve(3);
                dst.put_u8(consts::IAC);
                dst.put_u8(verb.to_u8());
                dst.put_u8(option.to_u8());
            }
            TelnetCommand::Subnegotiate(option, params) => {
                dst.reserve(5 + params.len());
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SB);
                dst.put_u8(option.to_u8());
                put_escaped(params, dst);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SE);
            }
            TelnetCommand::Command(code) => {
                dst.reserve(2);
                dst.put_u8(consts::IAC);
                dst.put_u8(*code);
            }
        }
        Ok(())
    }
}

impl Encoder<TelnetCommand> for TelnetCodec {
    type Error = CodecError;

    fn encode(&mut self, item: TelnetCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
        <Self as Encoder<&TelnetCommand>>::encode(self, &item, dst)
    }
}

fn put_escaped(data: &[u8], dst: &mut BytesMut) {
    for &byte in data {
        if byte == consts::IAC {
            dst.put_u8(consts::IAC);
        }
        dst.put_u8(byte);
    }
}

///
/// Internal state of the Telnet decoder.
///
/// - `NormalData`: plain data; an `IAC` switches to `InterpretAsCommand`.
/// - `InterpretAsCommand`: the next byte is a command code.
/// - `Negotiate(verb)`: the next byte is the option for `verb`.
/// - `Subnegotiate`: the next byte is the subnegotiated option.
/// - `SubnegotiateArgument(option)`: collecting parameters.
/// - `SubnegotiateArgumentIAC(option)`: saw `IAC` while collecting parameters.
///
#[derive(Clone, Copy, Debug)]
enum DecoderState {
    /// Normal Data
    NormalData,
    /// Received IAC, Next byte is Command
    InterpretAsCommand,
    /// Received a negotiation verb, Next Byte is the option
    Negotiate(TelnetVerb),
    /// Received Subnegotiate Command, Next Byte is the option
    Subnegotiate,
    /// Received Subnegotiate Option, Next Bytes are arguments
    SubnegotiateArgument(u8),
    /// Received IAC during Subnegotiation, Next Byte is command
    SubnegotiateArgumentIAC(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelnetOption;
    use bytes::Bytes;
    use tracing_test::traced_test;

    fn collect_all(codec: &mut TelnetCodec, mut src: BytesMut) -> Vec<TelnetFrame> {
        let mut out = Vec::new();
        while let Some(frame) = codec.decode(&mut src).expect("decode should not error") {
            out.push(frame);
        }
        out
    }

    fn encode_command(command: TelnetCommand) -> BytesMut {
        let mut codec = TelnetCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(command, &mut dst).expect("encode ok");
        dst
    }

    #[test]
    fn plain_text_is_returned_as_one_run() {
        let mut codec = TelnetCodec::new();
        let frames = collect_all(&mut codec, BytesMut::from(&b"Username: "[..]));
        assert_eq!(
            frames,
            vec![TelnetFrame::Data(Bytes::from_static(b"Username: "))]
        );
    }

    #[test]
    fn negotiation_splits_text_runs() {
        let mut codec = TelnetCodec::new();
        let frames = collect_all(
            &mut codec,
            BytesMut::from(&b"ab\xFF\xFB\x01cd"[..]),
        );
        assert_eq!(
            frames,
            vec![
                TelnetFrame::Data(Bytes::from_static(b"ab")),
                TelnetFrame::Command(TelnetCommand::will(TelnetOption::Echo)),
                TelnetFrame::Data(Bytes::from_static(b"cd")),
            ]
        );
    }

    #[test]
    fn other_command_codes_are_bare_commands() {
        let mut codec = TelnetCodec::new();
        // IAC GA, IAC NOP
        let frames = collect_all(&mut codec, BytesMut::from(&[0xFF, 0xF9, 0xFF, 0xF1][..]));
        assert_eq!(
            frames,
            vec![
                TelnetFrame::Command(TelnetCommand::Command(0xF9)),
                TelnetFrame::Command(TelnetCommand::Command(0xF1)),
            ]
        );
    }

    #[test]
    fn double_iac_is_a_bare_command() {
        let mut codec = TelnetCodec::new();
        let parsed = codec
            .decode_input(&mut BytesMut::from(&[b'a', 0xFF, 0xFF, b'b'][..]))
            .unwrap();
        assert_eq!(parsed.commands, vec![TelnetCommand::Command(0xFF)]);
        assert_eq!(parsed.text, b"ab");
    }

    #[test]
    fn parse_leaves_no_trace_of_double_iac_in_text() {
        let (commands, text) = parse(b"a\xFF\xFFb").unwrap();
        assert_eq!(commands, vec![TelnetCommand::Command(255)]);
        assert_eq!(text, "ab");
    }

    #[test]
    fn subnegotiation_collects_parameters() {
        let mut codec = TelnetCodec::new();
        let frames = collect_all(
            &mut codec,
            BytesMut::from(&[0xFF, 0xFA, 0x18, 0x01, 0xFF, 0xF0][..]),
        );
        assert_eq!(
            frames,
            vec![TelnetFrame::Command(TelnetCommand::Subnegotiate(
                TelnetOption::TerminalType,
                Bytes::from_static(&[0x01]),
            ))]
        );
    }

    #[test]
    fn subnegotiation_parameters_are_kept_as_sent() {
        let mut codec = TelnetCodec::new();
        let parsed = codec
            .decode_input(&mut BytesMut::from(
                &[0xFF, 0xFA, 0x1F, 0x00, 0xFF, 0x50, 0xFF, 0xFF, 0xFF, 0xF0, b'k'][..],
            ))
            .unwrap();
        assert_eq!(
            parsed.commands,
            vec![TelnetCommand::Subnegotiate(
                TelnetOption::WindowSize,
                Bytes::from_static(&[0x00, 0xFF, 0x50, 0xFF, 0xFF]),
            )]
        );
        assert_eq!(parsed.text, b"k");
    }

    #[test]
    fn sequence_split_across_reads_is_completed() {
        let mut codec = TelnetCodec::new();
        let first = codec
            .decode_input(&mut BytesMut::from(&b"login\xFF\xFD"[..]))
            .unwrap();
        assert_eq!(first.text, b"login");
        assert!(first.commands.is_empty());
        assert!(codec.is_mid_sequence());

        let second = codec
            .decode_input(&mut BytesMut::from(&b"\x1F: "[..]))
            .unwrap();
        assert_eq!(
            second.commands,
            vec![TelnetCommand::do_(TelnetOption::WindowSize)]
        );
        assert_eq!(second.text, b": ");
        assert!(!codec.is_mid_sequence());
    }

    #[traced_test]
    #[test]
    fn oversized_subnegotiation_is_rejected() {
        let mut codec = TelnetCodec::new().with_max_subnegotiation(4);
        let result = codec.decode_input(&mut BytesMut::from(
            &[0xFF, 0xFA, 0x18, 1, 2, 3, 4, 5, 6][..],
        ));
        assert_eq!(
            result,
            Err(CodecError::SubnegotiationOverflow {
                option: 0x18,
                limit: 4
            })
        );
        assert!(!codec.is_mid_sequence());
        assert!(logs_contain("Subnegotiation for option 24 exceeded 4 bytes"));
    }

    #[test]
    fn encode_negotiation() {
        assert_eq!(
            &encode_command(TelnetCommand::dont(TelnetOption::Unknown(0x22)))[..],
            &[0xFF, 0xFE, 0x22]
        );
    }

    #[test]
    fn encode_subnegotiation_escapes_iac() {
        let dst = encode_command(TelnetCommand::Subnegotiate(
            TelnetOption::WindowSize,
            Bytes::from_static(&[0x00, 0xFF, 0x00, 0x18]),
        ));
        assert_eq!(
            &dst[..],
            &[0xFF, 0xFA, 0x1F, 0x00, 0xFF, 0xFF, 0x00, 0x18, 0xFF, 0xF0]
        );
    }

    #[test]
    fn encode_data_escapes_iac() {
        let mut codec = TelnetCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(&[b'x', 0xFF][..], &mut dst).unwrap();
        assert_eq!(&dst[..], &[b'x', 0xFF, 0xFF]);
    }

    #[test]
    fn parse_drops_unfinished_tail() {
        let (commands, text) = parse(b"ok\xFF\xFA\x18\x00vt").unwrap();
        assert!(commands.is_empty());
        assert_eq!(text, "ok");
    }
}
