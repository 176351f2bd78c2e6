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

//! Scripted Telnet peer shared by the integration tests

#![allow(dead_code)]

use bytes::BytesMut;
use remexec_client::ExecutorConfig;
use remexec_telnetcodec::{TelnetCodec, TelnetCommand};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Bind a listener on an ephemeral localhost port
pub async fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// Configuration pointing at the scripted peer, without the reachability probe
pub fn config(port: u16) -> ExecutorConfig {
    ExecutorConfig::new("127.0.0.1")
        .with_port(port)
        .with_is_alive_check(false)
        .with_timeout(Duration::from_secs(2))
}

/// Server side of one connection, decoding what the client sends
pub struct Peer {
    stream: TcpStream,
    codec: TelnetCodec,
    pending: BytesMut,
    text: Vec<u8>,
    /// Negotiation commands received from the client so far
    pub commands: Vec<TelnetCommand>,
}

impl Peer {
    pub async fn accept(listener: &TcpListener) -> Peer {
        let (stream, _) = listener.accept().await.unwrap();
        Peer {
            stream,
            codec: TelnetCodec::new(),
            pending: BytesMut::new(),
            text: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub async fn send(&mut self, data: &[u8]) {
        self.stream.write_all(data).await.unwrap();
    }

    /// Next line sent by the client, without its `\r` terminator
    pub async fn expect_line(&mut self) -> String {
        loop {
            if let Some(end) = self.text.iter().position(|&byte| byte == b'\r') {
                let line: Vec<u8> = self.text.drain(..=end).collect();
                return String::from_utf8_lossy(&line[..end]).into_owned();
            }
            let received = self.stream.read_buf(&mut self.pending).await.unwrap();
            assert!(received > 0, "client closed while a line was expected");
            self.decode_pending();
        }
    }

    /// Exactly `len` raw bytes, bypassing the decoder
    pub async fn read_raw(&mut self, len: usize) -> Vec<u8> {
        let mut raw = vec![0u8; len];
        self.stream.read_exact(&mut raw).await.unwrap();
        raw
    }

    /// Reads until the client closes; returns the text not yet consumed
    pub async fn drain_until_closed(&mut self) -> String {
        loop {
            match self.stream.read_buf(&mut self.pending).await {
                Ok(0) | Err(_) => break,
                Ok(_) => self.decode_pending(),
            }
        }
        String::from_utf8_lossy(&std::mem::take(&mut self.text)).into_owned()
    }

    fn decode_pending(&mut self) {
        let parsed = self.codec.decode_input(&mut self.pending).unwrap();
        self.commands.extend(parsed.commands);
        self.text.extend(parsed.text);
    }
}
