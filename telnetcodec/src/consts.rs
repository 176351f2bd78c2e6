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

//! Telnet wire constants (RFC 854 and the option RFCs this crate negotiates)

/// Carriage Return
pub const CR: u8 = 0x0D;
/// Line Feed
pub const LF: u8 = 0x0A;

/// Subnegotiation End
pub const SE: u8 = 0xF0;
/// Subnegotiation Begin
pub const SB: u8 = 0xFA;
/// Sender wants to enable an option
pub const WILL: u8 = 0xFB;
/// Sender refuses to enable an option
pub const WONT: u8 = 0xFC;
/// Sender asks the receiver to enable an option
pub const DO: u8 = 0xFD;
/// Sender asks the receiver not to enable an option
pub const DONT: u8 = 0xFE;
/// Interpret As Command
pub const IAC: u8 = 0xFF;

/// Telnet option codes
pub mod option {
    /// Echo [RFC857](https://tools.ietf.org/html/rfc857)
    pub const ECHO: u8 = 0x01;
    /// Suppress Go Ahead [RFC858](https://tools.ietf.org/html/rfc858)
    pub const SGA: u8 = 0x03;
    /// Terminal Type [RFC1091](https://tools.ietf.org/html/rfc1091)
    pub const TTYPE: u8 = 0x18;
    /// Negotiate About Window Size [RFC1073](https://tools.ietf.org/html/rfc1073)
    pub const NAWS: u8 = 0x1F;
}

/// Terminal Type subnegotiation verbs
pub mod ttype {
    /// `IS` marker preceding the terminal name sent by the client
    pub const IS: u8 = 0x00;
    /// `SEND` request issued by the server
    pub const SEND: u8 = 0x01;
}
