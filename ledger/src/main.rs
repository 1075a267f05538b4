// ledger/src/main.rs
//
// Operator tool for the evidence ledger:
//
// - `summary`    print block count, tip hash, difficulty and validity
// - `verify`     re-check every block and report the first fault
// - `complaints` dump every committed transaction as JSON
// - `demo`       stage and commit a sample complaint (writes the chain file)
//
// The first three open the chain strictly and never write to it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use ledger::{
    ComplaintMetadata, Difficulty, EvidenceSubmission, JsonFileStore, Ledger, LedgerConfig,
    LedgerError,
};

#[derive(Parser, Debug)]
#[command(name = "ledger", version)]
#[command(about = "Inspect and exercise the evidence ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Chain file (overrides EVICHAIN_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Proof-of-work difficulty (overrides EVICHAIN_DIFFICULTY)
    #[arg(long, global = true)]
    difficulty: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of the stored chain
    Summary,
    /// Verify every block of the stored chain
    Verify,
    /// Print every committed complaint as JSON
    Complaints,
    /// Stage and commit sample complaints
    Demo {
        /// Number of complaints to stage before committing
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "ledger=info".to_string()))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, String> {
    let mut cfg = LedgerConfig::from_env().map_err(|e| format!("invalid configuration: {e}"))?;
    if let Some(path) = cli.data_file {
        cfg.storage.path = path;
    }
    if let Some(level) = cli.difficulty {
        cfg.mining.difficulty = Difficulty::new(level).map_err(|e| e.to_string())?;
    }
    let store = JsonFileStore::new(&cfg.storage);

    match cli.cmd {
        Command::Summary => {
            let ledger = open_strict(&cfg, store)?;
            print_json(&ledger.chain_summary())?;
        }
        Command::Verify => match Ledger::open_existing(&cfg, store) {
            Ok(ledger) => {
                println!(
                    "chain valid: {} blocks, tip {}",
                    ledger.blocks().len(),
                    ledger.chain_summary().last_block_hash
                );
            }
            Err(LedgerError::ChainCorrupt(fault)) => {
                println!("chain INVALID: {fault}");
                return Ok(ExitCode::from(2));
            }
            Err(e) => return Err(e.to_string()),
        },
        Command::Complaints => {
            let ledger = open_strict(&cfg, store)?;
            let complaints: Vec<_> = ledger.query_all_transactions().collect();
            print_json(&complaints)?;
        }
        Command::Demo { count } => {
            let mut ledger = Ledger::open(&cfg, store).map_err(|e| e.to_string())?;
            for n in 1..=count.max(1) {
                let id = ledger
                    .stage(demo_submission(n))
                    .map_err(|e| e.to_string())?;
                info!(%id, "staged demo complaint");
            }
            ledger.commit_pending().map_err(|e| e.to_string())?;
            print_json(&ledger.chain_summary())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_strict(cfg: &LedgerConfig, store: JsonFileStore) -> Result<Ledger<JsonFileStore>, String> {
    Ledger::open_existing(cfg, store).map_err(|e| format!("cannot open chain: {e}"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn demo_submission(n: usize) -> EvidenceSubmission {
    EvidenceSubmission {
        metadata: ComplaintMetadata {
            titulo: Some(format!("Teste de Demonstração {n}")),
            descricao: Some("Detalhes do teste.".to_string()),
            conselho: Some("N/A".to_string()),
            categoria: Some("Teste".to_string()),
            ..ComplaintMetadata::default()
        },
        file_hashes: vec!["hash1".to_string(), "hash2".to_string()],
        ia_analysis: None,
    }
}
