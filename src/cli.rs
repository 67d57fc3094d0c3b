use std::env;
use std::fs;

use crate::ingest::validate::validate_document;
use crate::ingest::{IngestSession, RawFile};
use crate::server;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Ingest,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("ingest") => Some(Command::Ingest),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(),
        Some(Command::Ingest) => handle_ingest(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("usage: astrometrics <serve|ingest|validate>");
            2
        }
    }
}

fn handle_serve() -> i32 {
    let bind_addr = env::var("ASTROMETRICS_BIND").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    match server::run_server(&bind_addr) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_ingest(args: &[String]) -> i32 {
    let mut single = false;
    let mut paths = Vec::new();
    for arg in &args[2..] {
        if arg == "--single" {
            single = true;
        } else {
            paths.push(arg.clone());
        }
    }
    if paths.is_empty() {
        eprintln!("usage: astrometrics ingest <files...> [--single]");
        return 2;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("runtime error: {err}");
            return 1;
        }
    };

    let files: Vec<RawFile> = paths.iter().map(RawFile::from_path).collect();
    let mut session = IngestSession::new();
    let report = match runtime.block_on(session.ingest(files)) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("ingest failed: {err}");
            return 1;
        }
    };

    // With --single, leftover lone geometry parts are decoded without
    // waiting for their attribute tables.
    let mut forced_keys = Vec::new();
    if single {
        let bases: Vec<String> = session
            .pending_summaries()
            .iter()
            .filter(|summary| summary.role == "geometry")
            .map(|summary| summary.base_name.clone())
            .collect();
        for base in bases {
            match session.force_decode(&base) {
                Ok(key) => forced_keys.push(key),
                Err(err) => {
                    eprintln!("forced decode failed for '{base}': {err}");
                    return 1;
                }
            }
        }
    }

    let layers: Vec<String> = session
        .registry()
        .entries()
        .iter()
        .map(|entry| entry.key.clone())
        .collect();
    let payload = serde_json::json!({
        "report": report,
        "forced_keys": forced_keys,
        "layers": layers,
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize ingest report: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: astrometrics validate <path-to-geojson>");
        return 2;
    };

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("unable to read '{path}': {err}");
            return 1;
        }
    };

    let report = validate_document(&raw);
    if report.has_errors() {
        eprintln!("validation failed: {path}");
        for diag in &report.diagnostics {
            eprintln!("- [{}] {}: {}", diag.severity, diag.context, diag.message);
        }
        1
    } else {
        println!(
            "validation passed: {path} ({} diagnostic(s))",
            report.diagnostics.len()
        );
        for diag in &report.diagnostics {
            println!("- [{}] {}: {}", diag.severity, diag.context, diag.message);
        }
        0
    }
}
