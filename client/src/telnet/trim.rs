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

//! Response clean-up helpers

/// Removes a leading echo of `request`, then one leading `\r`, then one
/// leading `\n`. Each step applies only when its text is a prefix.
///
/// # Example
/// ```
/// use remexec_client::telnet::trim_from_echo;
///
/// assert_eq!(trim_from_echo("show clock\r\n12:00\r\n", "show clock"), "12:00\r\n");
/// assert_eq!(trim_from_echo("12:00\r\n", "show clock"), "12:00\r\n");
/// ```
pub fn trim_from_echo<'a>(response: &'a str, request: &str) -> &'a str {
    let response = response.strip_prefix(request).unwrap_or(response);
    let response = response.strip_prefix('\r').unwrap_or(response);
    response.strip_prefix('\n').unwrap_or(response)
}

/// Cuts `response` at the last occurrence of `prompt`.
///
/// # Example
/// ```
/// use remexec_client::telnet::trim_from_prompt;
///
/// assert_eq!(trim_from_prompt("12:00\r\nhost# ", "host# "), "12:00\r\n");
/// ```
pub fn trim_from_prompt<'a>(response: &'a str, prompt: &str) -> &'a str {
    match response.rfind(prompt) {
        Some(end) => &response[..end],
        None => response,
    }
}

/// [`trim_from_echo`] followed by [`trim_from_prompt`]
pub fn trim_response<'a>(response: &'a str, request: &str, prompt: &str) -> &'a str {
    trim_from_prompt(trim_from_echo(response, request), prompt)
}

/// Text after the last `\n`
pub(crate) fn last_line(text: &str) -> &str {
    text.rsplit('\n').next().unwrap_or(text)
}
