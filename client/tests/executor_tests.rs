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

//! End-to-end tests for the Telnet executor against a scripted peer

mod common;

use common::{Peer, config, listen};
use remexec_client::{
    BufferKind, ErrorCode, ExecError, ExecOutput, ExecutorConfig, SessionState, Telnet,
};
use std::time::Duration;

const BANNER: &[u8] = b"\r\nUser Access Verification\r\n\r\nUsername: ";

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn user_and_password_login_succeeds() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(BANNER).await;
        assert_eq!(peer.expect_line().await, "admin");
        peer.send(b"\r\nPassword: ").await;
        assert_eq!(peer.expect_line().await, "secret");
        peer.send(b"\r\nrouter#").await;
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(port).with_credentials("admin", "secret"));
    let handle = telnet.open().await.unwrap().unwrap();
    assert_eq!(handle.port, port);
    assert_eq!(telnet.state(), SessionState::Authenticated);
    assert!(telnet.errors().is_empty());
    assert!(telnet.last_error().is_none());
    assert!(telnet.backend().banner().contains("User Access Verification"));

    telnet.close();
    assert_eq!(telnet.state(), SessionState::Disconnected);
    peer.await.unwrap();
}

#[tokio::test]
async fn rejected_login_is_recorded_and_closes() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(BANNER).await;
        peer.expect_line().await;
        peer.send(b"\r\nPassword: ").await;
        peer.expect_line().await;
        peer.send(b"\r\n% Login invalid\r\n\r\nUsername: ").await;
        // the client hangs up without sending anything else
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(port).with_credentials("admin", "wrong"));
    assert_eq!(telnet.exec("show clock", None).await, Ok(None));
    assert_eq!(telnet.state(), SessionState::Disconnected);

    let errors = telnet.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ErrorCode::AuthFail);
    assert_eq!(errors[0].source, "authenticate");
    let detail = errors[0].detail.clone().unwrap_or_default();
    assert!(detail.starts_with(" % Login invalid"), "{detail:?}");
    assert!(!detail.contains('\n'));
    assert!(
        telnet
            .debug_messages()
            .iter()
            .any(|line| line == "authenticate : ERROR: Authentication failed")
    );

    assert_eq!(peer.await.unwrap(), "");
}

// ============================================================================
// Execution
// ============================================================================

#[tokio::test]
async fn single_command_is_trimmed() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(b"host# ").await;
        assert_eq!(peer.expect_line().await, "show clock");
        peer.send(b"show clock\r\n12:00:00 UTC\r\nhost# ").await;
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(port));
    let output = telnet.exec("show clock", None).await.unwrap().unwrap();
    assert_eq!(output, ExecOutput::Single("12:00:00 UTC\r\n".to_string()));
    assert_eq!(telnet.backend().input_prompt(), "host# ");

    telnet.close();
    peer.await.unwrap();
}

#[tokio::test]
async fn untrimmed_response_keeps_echo_and_prompt() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(b"host# ").await;
        peer.expect_line().await;
        peer.send(b"show clock\r\n12:00:00 UTC\r\nhost# ").await;
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(port).with_trim_response(false));
    let output = telnet.exec("show clock", None).await.unwrap().unwrap();
    assert_eq!(
        output.as_single(),
        Some("show clock\r\n12:00:00 UTC\r\nhost# ")
    );

    telnet.close();
    peer.await.unwrap();
}

#[tokio::test]
async fn two_commands_return_two_responses_in_order() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(b"switch> ").await;
        for (command, output) in [("show clock", "12:00:00 UTC"), ("show users", "admin vty0")] {
            assert_eq!(peer.expect_line().await, command);
            let reply = format!("{command}\r\n{output}\r\nswitch> ");
            peer.send(reply.as_bytes()).await;
        }
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(port));
    let output = telnet
        .exec("show clock\nshow users", None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        output,
        ExecOutput::Many(vec![
            "12:00:00 UTC\r\n".to_string(),
            "admin vty0\r\n".to_string()
        ])
    );

    telnet.close();
    peer.await.unwrap();
}

#[tokio::test]
async fn batch_stops_at_the_first_timeout() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(b"router# ").await;
        assert_eq!(peer.expect_line().await, "cmd1");
        // never answer; report everything else the client sends
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(port));
    let output = telnet
        .exec(vec!["cmd1", "cmd2"], Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(output, None);

    let error = telnet.last_error().unwrap();
    assert_eq!(error.code, ErrorCode::TimeoutDuringExec);
    assert_eq!(error.message, "the command execution timeout");
    assert_eq!(telnet.errors().len(), 1);
    assert_eq!(
        telnet.backend().last_timeout(),
        Some(Duration::from_secs(1))
    );

    telnet.close();
    let rest = peer.await.unwrap();
    assert!(!rest.contains("cmd2"), "cmd2 was sent: {rest:?}");
}

#[tokio::test]
async fn raising_mode_returns_the_error() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(b"router# ").await;
        peer.expect_line().await;
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(port).with_error_silent(false));
    let err = telnet
        .exec("show tech-support", Some(Duration::from_millis(300)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ExecError::TimeoutDuringExec {
            waited: Duration::from_millis(300)
        }
    );
    let record = telnet.last_error().unwrap();
    assert_eq!(record.code, err.kind());
    assert_eq!(record.message, err.to_string());

    telnet.close();
    peer.await.unwrap();
}

#[tokio::test]
async fn remote_hangup_during_exec_closes_the_session() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(b"router# ").await;
        assert_eq!(peer.expect_line().await, "reload");
    });

    let mut telnet = Telnet::new(config(port));
    assert_eq!(telnet.exec("reload", None).await, Ok(None));
    assert_eq!(telnet.last_error().unwrap().code, ErrorCode::ClosedByRemote);
    assert_eq!(telnet.state(), SessionState::Disconnected);
    peer.await.unwrap();
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn probe_runs_before_connecting() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        // the reachability probe connects and hangs up first
        let (probe, _) = listener.accept().await.unwrap();
        drop(probe);
        let mut peer = Peer::accept(&listener).await;
        peer.send(b"host> ").await;
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(port).with_is_alive_check(true));
    assert!(telnet.open().await.unwrap().is_some());
    assert_eq!(telnet.state(), SessionState::Authenticated);

    telnet.close();
    peer.await.unwrap();
}

#[tokio::test]
async fn unreachable_host_is_recorded() {
    let (listener, port) = listen().await;
    drop(listener);

    let mut telnet = Telnet::new(config(port).with_is_alive_check(true));
    assert!(!telnet.is_alive(Some(Duration::from_secs(1))).await);
    assert_eq!(telnet.exec("show clock", None).await, Ok(None));
    let error = telnet.last_error().unwrap();
    assert_eq!(error.code, ErrorCode::HostUnreachable);
    assert_eq!(error.message, "Unable to connect to [127.0.0.1]");
}

#[tokio::test]
async fn open_with_new_host_replaces_the_session() {
    let (first_listener, first_port) = listen().await;
    let (second_listener, second_port) = listen().await;
    let first = tokio::spawn(async move {
        let mut peer = Peer::accept(&first_listener).await;
        peer.send(b"a# ").await;
        peer.drain_until_closed().await
    });
    let second = tokio::spawn(async move {
        let mut peer = Peer::accept(&second_listener).await;
        peer.send(b"b# ").await;
        peer.drain_until_closed().await
    });

    let mut telnet = Telnet::new(config(first_port));
    telnet.open().await.unwrap();
    // the first session is closed before the new one opens
    let handle = telnet
        .open_with(config(second_port))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(handle.port, second_port);
    first.await.unwrap();

    telnet.close();
    telnet.close();
    second.await.unwrap();
}

#[tokio::test]
async fn debug_trace_goes_to_a_file() {
    let (listener, port) = listen().await;
    let peer = tokio::spawn(async move {
        let mut peer = Peer::accept(&listener).await;
        peer.send(b"host# ").await;
        peer.drain_until_closed().await
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("debug.log");
    let toml = format!(
        "host = \"127.0.0.1\"\nport = {port}\nenable_is_alive_check = false\ndebug = \"file:{}\"\n",
        path.display()
    );
    let mut telnet = Telnet::new(ExecutorConfig::from_toml_str(&toml).unwrap());
    telnet.open().await.unwrap();
    telnet.close();
    peer.await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains(&format!("connect : Connected to [127.0.0.1:{port}]")));
    assert!(written.contains("close : OK"));
    assert_eq!(telnet.debug_messages().len(), written.lines().count());

    telnet.clear_buffers(BufferKind::Debug);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
}
