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

//! Telnet backend
//!
//! [`TelnetSession`] drives one device over a Telnet connection: it answers
//! option negotiation, waits for prompts, logs in and runs commands. The trim
//! helpers are exported for callers post-processing raw responses.

mod session;
mod trim;

pub use self::session::{Answer, AnalyzeMode, FALLBACK_TIMEOUT, READ_BUFFER_SIZE, TelnetSession};
pub use self::trim::{trim_from_echo, trim_from_prompt, trim_response};
