// Copyright 2026 The Tapwire Authors
// SPDX-License-Identifier: Apache-2.0

//! Tapwire: decode database wire-traffic recordings.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tapwire_reader::{recorded_documents, stream_to};

mod cli;

use cli::{Cli, Commands, ExportArgs, InspectArgs};

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Export(args) => export(&args),
        Commands::Inspect(args) => inspect(&args),
        Commands::Version => {
            println!("tapwire {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn export(args: &ExportArgs) -> Result<()> {
    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open recording file: {}", args.input.display()))?;
    let mut output = BufWriter::new(File::create(&args.output).with_context(|| {
        format!("Failed to create replay file: {}", args.output.display())
    })?);

    let count = stream_to(input, &mut output).context("Failed to decode recording")?;
    output.flush().context("Failed to flush replay file")?;

    println!("Wrote {count} packets to {}", args.output.display());
    Ok(())
}

fn inspect(args: &InspectArgs) -> Result<()> {
    let documents = recorded_documents(&args.input).context("Failed to decode recording")?;

    for document in &documents {
        let order = document.get_i64("order").unwrap_or(0);
        let op_type = document.get_str("opType").unwrap_or("?");
        let opcode = document
            .get_document("rawop")
            .and_then(|rawop| rawop.get_document("header"))
            .and_then(|header| header.get_i32("opcode"))
            .unwrap_or(0);
        let src = document.get_str("srcendpoint").unwrap_or("-");
        let dest = document.get_str("destendpoint").unwrap_or("-");
        let connection = document.get_i64("seenconnectionnum").unwrap_or(0);

        println!("{order:>8}  conn {connection:<6} {src:>6} -> {dest:<6} opcode {opcode:<6} {op_type}");
    }

    println!("{} packets", documents.len());
    Ok(())
}
