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

use crate::{TelnetOption, TelnetVerb};
use bytes::Bytes;

///
/// A single parsed Telnet command sequence.
///
/// Produced by the decoder and consumed straight away by the negotiation policy
/// to build a reply; nothing keeps these around afterwards.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TelnetCommand {
    /// `IAC <WILL|WONT|DO|DONT> <option>`
    Negotiate(TelnetVerb, TelnetOption),
    /// `IAC SB <option> <parameters...> IAC SE`
    Subnegotiate(TelnetOption, Bytes),
    /// `IAC <code>` for any other command code (NOP, GA, AYT, ...)
    Command(u8),
}

impl TelnetCommand {
    /// Shorthand for a `WILL <option>` singleton
    pub fn will(option: TelnetOption) -> Self {
        TelnetCommand::Negotiate(TelnetVerb::Will, option)
    }

    /// Shorthand for a `WONT <option>` singleton
    pub fn wont(option: TelnetOption) -> Self {
        TelnetCommand::Negotiate(TelnetVerb::Wont, option)
    }

    /// Shorthand for a `DO <option>` singleton
    pub fn do_(option: TelnetOption) -> Self {
        TelnetCommand::Negotiate(TelnetVerb::Do, option)
    }

    /// Shorthand for a `DONT <option>` singleton
    pub fn dont(option: TelnetOption) -> Self {
        TelnetCommand::Negotiate(TelnetVerb::Dont, option)
    }
}

impl std::fmt::Display for TelnetCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetCommand::Negotiate(verb, option) => write!(f, "{verb}:{option}"),
            TelnetCommand::Subnegotiate(option, params) => {
                write!(f, "SB:{option}{:?}", params.as_ref())
            }
            TelnetCommand::Command(code) => write!(f, "{code}"),
        }
    }
}

///
/// `TelnetFrame` is one unit produced by [`crate::TelnetCodec`]'s decoder: either a
/// contiguous run of plain text bytes or a complete command sequence.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TelnetFrame {
    /// Plain data between command sequences
    Data(Bytes),
    /// A complete command sequence
    Command(TelnetCommand),
}
