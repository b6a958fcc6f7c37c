//! AuthCoin CLI
//!
//! Command-line front end for a ledger host: inspect registry state and
//! submit transactions from JSON-lines files.

use anyhow::{bail, Context, Result};
use authcoin_core::{logging, AccountId, AuthCoinConfig};
use authcoin_registry::{LedgerHost, Transaction};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;

/// JSON output for the status command
#[derive(Debug, Serialize)]
struct StatusOutput {
    node_id: String,
    ledger_entries: u64,
    ledger_healthy: bool,
    startup_checks: u64,
    corruption_detections: u64,
    verifier_types: Vec<String>,
    eir_count: usize,
    vae_count: usize,
}

/// JSON output for one submitted transaction
#[derive(Debug, Serialize)]
struct SubmitOutput {
    line: usize,
    op: &'static str,
    accepted: bool,
    seq_no: Option<u64>,
    tx_id: Option<String>,
    events: Vec<&'static str>,
    error: Option<String>,
}

fn load_config(path: &Path) -> Result<AuthCoinConfig> {
    let config = AuthCoinConfig::from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    logging::init_from_config(&config.logging);
    Ok(config)
}

fn read_transactions(path: &Path) -> Result<Vec<(usize, Transaction)>> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = io::BufReader::new(file);
    let mut transactions = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tx: Transaction = serde_json::from_str(line)
            .with_context(|| format!("Invalid transaction on line {}", index + 1))?;
        transactions.push((index + 1, tx));
    }

    Ok(transactions)
}

fn cmd_status(config_path: PathBuf, json: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    let host = LedgerHost::open(&config)?;
    let registry = host.registry();
    let metrics = host.ledger().metrics();

    let output = StatusOutput {
        node_id: host.ledger().node_id().to_string(),
        ledger_entries: host.ledger().len()?,
        ledger_healthy: host.ledger().get_ledger_health().status.is_ok(),
        startup_checks: metrics.ledger_startup_checks_total,
        corruption_detections: metrics.ledger_corruption_detections_total,
        verifier_types: registry
            .get_signature_verifier_types()
            .iter()
            .map(|t| t.label())
            .collect(),
        eir_count: registry.get_eir_count(),
        vae_count: registry.get_vae_count(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Node: {}", output.node_id);
        println!("Ledger entries: {}", output.ledger_entries);
        println!("Ledger healthy: {}", output.ledger_healthy);
        println!(
            "Startup checks: {} ({} corrupt)",
            output.startup_checks, output.corruption_detections
        );
        println!("Verifier registrations: {}", output.verifier_types.join(", "));
        println!("Identities: {}", output.eir_count);
        println!("Sessions: {}", output.vae_count);
    }

    Ok(())
}

fn cmd_submit(config_path: PathBuf, caller: String, input: PathBuf, json: bool) -> Result<()> {
    let config = load_config(&config_path)?;
    let transactions = read_transactions(&input)?;
    if transactions.is_empty() {
        bail!("No transactions found in {}", input.display());
    }

    let mut host = LedgerHost::open(&config)?;
    let caller = AccountId::new(caller);
    let mut rejected = 0usize;

    for (line, tx) in transactions {
        let op = tx.name();
        let output = match host.submit(&caller, tx) {
            Ok(receipt) => SubmitOutput {
                line,
                op,
                accepted: true,
                seq_no: Some(receipt.seq_no),
                tx_id: Some(receipt.tx_id),
                events: receipt.events.iter().map(|e| e.name()).collect(),
                error: None,
            },
            Err(e) => {
                rejected += 1;
                SubmitOutput {
                    line,
                    op,
                    accepted: false,
                    seq_no: None,
                    tx_id: None,
                    events: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        if json {
            println!("{}", serde_json::to_string(&output)?);
        } else if let Some(error) = &output.error {
            println!("line {}: {} rejected: {}", line, op, error);
        } else {
            println!(
                "line {}: {} accepted at seq_no {} [{}]",
                line,
                op,
                output.seq_no.unwrap_or_default(),
                output.events.join(", ")
            );
        }
    }

    if rejected > 0 {
        bail!("{} transaction(s) rejected", rejected);
    }
    Ok(())
}

fn print_usage() {
    println!("AuthCoin CLI - Inspect and drive an AuthCoin registry");
    println!();
    println!("USAGE:");
    println!("    authcoin-cli status --config <file> [--json]");
    println!("    authcoin-cli submit --config <file> --caller <account> --input <file> [--json]");
    println!();
    println!("COMMANDS:");
    println!("    status    Replay the ledger and print registry counts");
    println!("    submit    Submit JSON-lines transactions as <account>");
    println!();
    println!("EXAMPLES:");
    println!("    authcoin-cli status --config authcoin.toml");
    println!("    authcoin-cli submit --config authcoin.toml --caller owner --input genesis.jsonl");
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let mut config = None;
    let mut caller = None;
    let mut input = None;
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                config = args.get(i).map(PathBuf::from);
            }
            "--caller" => {
                i += 1;
                caller = args.get(i).cloned();
            }
            "--input" | "-i" => {
                i += 1;
                input = args.get(i).map(PathBuf::from);
            }
            "--json" => json = true,
            _ => {}
        }
        i += 1;
    }

    let result = match (command, config) {
        ("status", Some(config)) => cmd_status(config, json),
        ("submit", Some(config)) => match (caller, input) {
            (Some(caller), Some(input)) => cmd_submit(config, caller, input, json),
            _ => Err(anyhow::anyhow!("submit requires --caller and --input")),
        },
        ("status" | "submit", None) => Err(anyhow::anyhow!("Missing --config argument")),
        ("help" | "--help" | "-h", _) => {
            print_usage();
            Ok(())
        }
        (other, _) => Err(anyhow::anyhow!("Unknown command: {}", other)),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
