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

//! Negotiate About Window Size
//!

use crate::CodecResult;
use byteorder::{BigEndian, WriteBytesExt};
use bytes::BufMut;

/// Window dimensions advertised in the NAWS subnegotiation.
///
/// # Format
/// The window size is encoded as four bytes in big-endian format:
/// - 2 bytes for columns (width)
/// - 2 bytes for rows (height)
///
/// A value of zero means "unspecified"; many network devices then fall back to
/// their own default page size.
///
/// # Example
/// ```
/// use remexec_telnetcodec::naws::WindowSize;
///
/// let size = WindowSize::new(80, 24);
/// assert_eq!(size.cols, 80);
/// assert_eq!(size.rows, 24);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowSize {
    /// The number of columns (characters) in the terminal window
    pub cols: u16,
    /// The number of rows (lines) in the terminal window
    pub rows: u16,
}

impl WindowSize {
    /// Creates a new `WindowSize` with the specified columns and rows.
    pub fn new(cols: u16, rows: u16) -> Self {
        WindowSize { cols, rows }
    }

    /// The NAWS payload always occupies exactly 4 bytes.
    pub fn len(&self) -> usize {
        4
    }

    /// Always `false`; kept alongside [`WindowSize::len`].
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Encodes this `WindowSize` into a byte buffer using big-endian format.
    ///
    /// # Example
    /// ```
    /// use bytes::BytesMut;
    /// use remexec_telnetcodec::naws::WindowSize;
    ///
    /// let mut buf = BytesMut::new();
    /// WindowSize::new(300, 24).encode(&mut buf).unwrap();
    /// assert_eq!(&buf[..], &[0x01, 0x2C, 0x00, 0x18]);
    /// ```
    pub fn encode<T: BufMut>(&self, dst: &mut T) -> CodecResult<usize> {
        Ok(self.write(&mut dst.writer())?)
    }

    /// Writes this `WindowSize` to a writer, columns first, both big-endian.
    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<usize> {
        writer.write_u16::<BigEndian>(self.cols)?;
        writer.write_u16::<BigEndian>(self.rows)?;
        Ok(4)
    }
}

impl std::fmt::Display for WindowSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.cols, self.rows)
    }
}
