// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read holding registers once and print them.

use std::{net::SocketAddr, process::ExitCode, time::Duration};

use clap::Parser;
use modbus_tcp_core::session::{ClientConfig, fetch_registers};

#[derive(Debug, Parser)]
#[command(about = "Modbus TCP client")]
struct Args {
    /// Server address
    #[arg(long, default_value = "192.168.4.1:502")]
    server: SocketAddr,

    #[arg(long, default_value_t = 1)]
    unit_id: u8,

    /// First register to read
    #[arg(long, default_value_t = 4)]
    address: u16,

    /// Number of registers to read
    #[arg(long, default_value_t = 2)]
    quantity: u16,

    /// Connect/read/write timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = ClientConfig::default()
        .with_address(args.server)
        .with_unit_id(args.unit_id)
        .with_registers(args.address, args.quantity)
        .with_timeout(Some(Duration::from_millis(args.timeout_ms)));
    match fetch_registers(&config) {
        Ok(words) => {
            for (offset, word) in words.iter().enumerate() {
                println!("{:>5}: 0x{word:04X}", usize::from(args.address) + offset);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Reading registers from {} failed: {err}", args.server);
            ExitCode::FAILURE
        }
    }
}
