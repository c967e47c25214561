// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serve ten holding registers until killed.

use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use modbus_tcp_core::{
    session::{Server, ServerConfig},
    store::RegisterStore,
};

const REGISTERS: [u16; 10] = [
    0x1234, 0x5678, 0x9ABC, 0xDEF0, 0x1111, 0x2222, 0x3333, 0x4444, 0x5555, 0x6666,
];

#[derive(Debug, Parser)]
#[command(about = "Modbus TCP server")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:502")]
    bind: SocketAddr,

    /// Read/write timeout per connection in milliseconds (0 disables it)
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let timeout = (args.timeout_ms > 0).then(|| Duration::from_millis(args.timeout_ms));
    let config = ServerConfig::default()
        .with_bind(args.bind)
        .with_timeout(timeout);
    let mut server = Server::bind(&config, RegisterStore::new(REGISTERS))?;
    server.run()
}
