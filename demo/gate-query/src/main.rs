/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, ValueHint, value_parser};
use http::{HeaderMap, HeaderValue};
use slog::{Logger, o};

use g3gate::{GateConfig, GeoGate, X_FORWARDED_FOR};

const ARG_CONFIG: &str = "config";
const ARG_FORWARDED_FOR: &str = "forwarded-for";
const ARG_PEER_LIST: &str = "peer-list";

fn build_cli_args() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .arg(
            Arg::new(ARG_CONFIG)
                .help("Gate config file")
                .long(ARG_CONFIG)
                .short('c')
                .num_args(1)
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new(ARG_FORWARDED_FOR)
                .help("Value for the X-Forwarded-For header")
                .long(ARG_FORWARDED_FOR)
                .num_args(1),
        )
        .arg(
            Arg::new(ARG_PEER_LIST)
                .help("Transport peer address, host or host:port")
                .action(ArgAction::Append)
                .required(true),
        )
}

fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    let config_file = args.get_one::<PathBuf>(ARG_CONFIG).unwrap();
    let config = GateConfig::load(config_file)?;
    let gate = GeoGate::new(config, Logger::root(slog::Discard, o!()))?;

    let mut headers = HeaderMap::new();
    if let Some(v) = args.get_one::<String>(ARG_FORWARDED_FOR) {
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(v)?);
    }

    for peer in args.get_many::<String>(ARG_PEER_LIST).unwrap() {
        println!("# check for peer {peer}");
        let ctx = gate.evaluate(&headers, peer);
        if ctx.permitted() {
            println!("verdict: {}", ctx.action);
        } else {
            println!("verdict: {} (host rejects with a forbidden response)", ctx.action);
        }
        match ctx.client_ip {
            Some(ip) => println!("client_ip: {ip}"),
            None => println!("client_ip: unresolved"),
        }
        for (name, value) in ctx.record.attributes() {
            println!("{name}: {value}");
        }
    }
    Ok(())
}
