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

use crate::consts;
use std::fmt::Formatter;

///
/// [Telnet Terminal Options](https://www.iana.org/assignments/telnet-options/telnet-options.xhtml)
/// recognised by the negotiation policy. Every other option code is carried as
/// [`TelnetOption::Unknown`] and refused by default.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum TelnetOption {
    /// [`consts::option::ECHO`] Telnet Echo Option [RFC857](https://tools.ietf.org/html/rfc857)
    Echo,
    /// [`consts::option::SGA`] Suppress Go Ahead [RFC858](https://tools.ietf.org/html/rfc858)
    SuppressGoAhead,
    /// [`consts::option::TTYPE`] Terminal Type [RFC1091](http://www.iana.org/go/rfc1091)
    TerminalType,
    /// [`consts::option::NAWS`] Negotiate About Window Size [RFC1073](http://www.iana.org/go/rfc1073)
    WindowSize,
    /// Any other option code
    Unknown(u8),
}

impl TelnetOption {
    /// Converts a `TelnetOption` into its wire byte.
    pub fn to_u8(&self) -> u8 {
        match self {
            TelnetOption::Echo => consts::option::ECHO,
            TelnetOption::SuppressGoAhead => consts::option::SGA,
            TelnetOption::TerminalType => consts::option::TTYPE,
            TelnetOption::WindowSize => consts::option::NAWS,
            TelnetOption::Unknown(byte) => *byte,
        }
    }

    /// Converts a wire byte into a `TelnetOption`, falling back to
    /// [`TelnetOption::Unknown`] for codes outside the negotiated set.
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            consts::option::ECHO => TelnetOption::Echo,
            consts::option::SGA => TelnetOption::SuppressGoAhead,
            consts::option::TTYPE => TelnetOption::TerminalType,
            consts::option::NAWS => TelnetOption::WindowSize,
            byte => TelnetOption::Unknown(byte),
        }
    }
}

impl std::fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetOption::Echo => write!(f, "ECHO"),
            TelnetOption::SuppressGoAhead => write!(f, "SGA"),
            TelnetOption::TerminalType => write!(f, "TTYPE"),
            TelnetOption::WindowSize => write!(f, "NAWS"),
            TelnetOption::Unknown(option) => write!(f, "{option}"),
        }
    }
}

impl From<u8> for TelnetOption {
    fn from(byte: u8) -> Self {
        Self::from_u8(byte)
    }
}

impl From<TelnetOption> for u8 {
    fn from(option: TelnetOption) -> Self {
        option.to_u8()
    }
}

/// Option negotiation verb (`WILL`, `WONT`, `DO`, `DONT`)
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TelnetVerb {
    /// Sender wants to enable the option on its side
    Will,
    /// Sender refuses to enable the option on its side
    Wont,
    /// Sender asks the receiver to enable the option
    Do,
    /// Sender asks the receiver to disable the option
    Dont,
}

impl TelnetVerb {
    /// Wire byte for this verb
    pub fn to_u8(self) -> u8 {
        match self {
            TelnetVerb::Will => consts::WILL,
            TelnetVerb::Wont => consts::WONT,
            TelnetVerb::Do => consts::DO,
            TelnetVerb::Dont => consts::DONT,
        }
    }

    /// Parses a verb byte, returning `None` for any other command code.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            consts::WILL => Some(TelnetVerb::Will),
            consts::WONT => Some(TelnetVerb::Wont),
            consts::DO => Some(TelnetVerb::Do),
            consts::DONT => Some(TelnetVerb::Dont),
            _ => None,
        }
    }

    /// The `(accept, refuse)` verbs used to answer this verb, or `None` for
    /// verbs that are not answered (`WONT`, `DONT`).
    ///
    /// A `WILL` is answered with `DO`/`DONT`, a `DO` with `WILL`/`WONT`.
    pub fn answers(self) -> Option<(TelnetVerb, TelnetVerb)> {
        match self {
            TelnetVerb::Will => Some((TelnetVerb::Do, TelnetVerb::Dont)),
            TelnetVerb::Do => Some((TelnetVerb::Will, TelnetVerb::Wont)),
            TelnetVerb::Wont | TelnetVerb::Dont => None,
        }
    }
}

impl std::fmt::Display for TelnetVerb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetVerb::Will => write!(f, "WILL"),
            TelnetVerb::Wont => write!(f, "WONT"),
            TelnetVerb::Do => write!(f, "DO"),
            TelnetVerb::Dont => write!(f, "DONT"),
        }
    }
}
