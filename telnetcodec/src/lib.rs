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

//! # Telnet Negotiation Codec
//!
//! Wire layer for driving line-oriented network devices over Telnet (RFC 854).
//! The crate splits the incoming byte stream into plain text and command
//! sequences, and builds the client's answers to option negotiation.
//!
//! ## Core Components
//!
//! ### [`TelnetCodec`]
//!
//! A stateful [`tokio_util::codec::Decoder`]/[`tokio_util::codec::Encoder`]. A
//! command sequence split across two reads is completed on the next call
//! instead of leaking into the text. [`TelnetCodec::decode_input`] drains a
//! buffer into a [`ParsedInput`]; [`parse`] does the same for a single,
//! self-contained chunk.
//!
//! ### [`TelnetCommand`] and [`TelnetFrame`]
//!
//! A parsed `IAC` sequence (negotiation, subnegotiation or bare command), and
//! the decoder's unit of output (a run of text or one command).
//!
//! ### [`NegotiationPolicy`]
//!
//! The client's terminal stance: `ECHO` and `SUPPRESS-GO-AHEAD` settings, the
//! terminal type name and the window size. It turns received `WILL`/`DO`
//! requests into the bytes to send back.
//!
//! ## Usage Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use remexec_telnetcodec::{NegotiationPolicy, TelnetCommand, TelnetOption, parse};
//!
//! // DO TERMINAL-TYPE followed by a login prompt
//! let (commands, text) = parse(b"\xFF\xFD\x18login: ").unwrap();
//! assert_eq!(commands, vec![TelnetCommand::do_(TelnetOption::TerminalType)]);
//! assert_eq!(text, "login: ");
//!
//! let mut reply = BytesMut::new();
//! NegotiationPolicy::new()
//!     .encode_replies(&commands, &mut reply)
//!     .unwrap();
//! assert_eq!(&reply[..], b"\xFF\xFB\x18\xFF\xFA\x18\x00vt100\xFF\xF0");
//! ```
//!
//! ## Protocol Details
//!
//! - 2-byte commands: `IAC <command>`
//! - 3-byte negotiation: `IAC <DO|DONT|WILL|WONT> <option>`
//! - Subnegotiation: `IAC SB <option> <data...> IAC SE`
//!
//! The decoder reports `IAC IAC` as the bare command `0xFF` and keeps
//! subnegotiation parameters exactly as received up to the first `IAC SE`.
//! The encoder doubles `IAC` in data and in subnegotiation parameters.
//!
//! ## Related RFCs
//!
//! - RFC 854: Telnet Protocol Specification
//! - RFC 857: Telnet Echo Option
//! - RFC 858: Telnet Suppress Go Ahead Option
//! - RFC 1073: Telnet Window Size Option
//! - RFC 1091: Telnet Terminal-Type Option

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

mod codec;
pub mod consts;
mod frame;
pub mod naws;
mod negotiation;
mod options;
mod result;

pub use self::codec::{DEFAULT_MAX_SUBNEGOTIATION, ParsedInput, TelnetCodec, parse};
pub use self::frame::{TelnetCommand, TelnetFrame};
pub use self::negotiation::NegotiationPolicy;
pub use self::options::{TelnetOption, TelnetVerb};
pub use self::result::{CodecError, CodecResult};

#[cfg(test)]
mod tests {
    use super::{NegotiationPolicy, TelnetCodec, TelnetCommand, TelnetOption, consts};
    use bytes::BytesMut;

    #[test]
    fn login_banner_with_negotiation() {
        let mut codec = TelnetCodec::new();
        let mut input = BytesMut::from(
            &[
                consts::IAC,
                consts::DO,
                consts::option::ECHO,
                consts::IAC,
                consts::WILL,
                consts::option::SGA,
                b'L',
                b'o',
                b'g',
                b'i',
                b'n',
                b':',
                b' ',
            ][..],
        );
        let parsed = codec.decode_input(&mut input).unwrap();
        assert_eq!(
            parsed.commands,
            vec![
                TelnetCommand::do_(TelnetOption::Echo),
                TelnetCommand::will(TelnetOption::SuppressGoAhead),
            ]
        );
        assert_eq!(parsed.text_lossy(), "Login: ");

        let mut reply = BytesMut::new();
        NegotiationPolicy::new()
            .encode_replies(&parsed.commands, &mut reply)
            .unwrap();
        assert_eq!(
            &reply[..],
            &[
                consts::IAC,
                consts::WONT,
                consts::option::ECHO,
                consts::IAC,
                consts::DO,
                consts::option::SGA,
            ]
        );
    }
}
