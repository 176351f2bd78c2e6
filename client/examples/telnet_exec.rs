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

//! Run commands on a device over Telnet and print the responses.
//!
//! ```text
//! cargo run -p remexec-client --example telnet_exec -- \
//!     --host 192.0.2.1 --user admin --password secret \
//!     "terminal length 0" "show version"
//! ```

use clap::Parser;
use remexec_client::{ExecutorConfig, SinkDestination, Telnet};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "telnet_exec", about = "Execute commands on a device over Telnet")]
struct Args {
    /// TOML configuration file; command line options override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device hostname or IP address
    #[arg(long)]
    host: Option<String>,

    /// Device port
    #[arg(short, long)]
    port: Option<u16>,

    /// Login name
    #[arg(short, long)]
    user: Option<String>,

    /// Login password
    #[arg(long)]
    password: Option<String>,

    /// Response timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Print the debug trace to standard output
    #[arg(long)]
    trace: bool,

    /// Commands to execute, in order
    #[arg(required = true)]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ExecutorConfig::from_file(path)?,
        None => ExecutorConfig::default(),
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(user) = args.user {
        config.user = user;
    }
    if let Some(password) = args.password {
        config.password = password;
    }
    if let Some(seconds) = args.timeout {
        config.timeout = Duration::try_from_secs_f64(seconds)?;
    }
    if args.trace {
        config.debug = SinkDestination::Console;
    }

    let mut telnet = Telnet::new(config);
    let output = telnet.exec(args.commands.clone(), None).await?;
    telnet.close();

    match output {
        Some(output) => {
            for (command, response) in args.commands.iter().zip(output.into_vec()) {
                println!("==> {command}");
                print!("{response}");
            }
            Ok(())
        }
        None => {
            for error in telnet.errors() {
                eprintln!("{error}");
            }
            std::process::exit(1);
        }
    }
}
