//! evmole-host: analyze one EVM contract with the sandboxed evmole engine.
//!
//! ## Example Usage
//!
//! ```bash
//! # Selectors, arguments and mutability of a deployed contract
//! evmole-host --wasm evmole.wasm --code 0x6080604052... --arguments --state-mutability
//!
//! # Everything, from a file, pretty-printed
//! EVMOLE_WASM_PATH=evmole.wasm.gz evmole-host --code-file runtime.hex --all --pretty
//! ```
//!
//! Logs go to stderr and are controlled by `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use evmole_host::{AnalysisOptions, Analyzer, EngineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "evmole-host",
    version,
    about = "Analyze EVM bytecode with the sandboxed evmole engine"
)]
struct Args {
    /// Engine module (.wasm or gzip). Defaults to $EVMOLE_WASM_PATH
    #[arg(long)]
    wasm: Option<PathBuf>,

    /// Contract bytecode as hex, with or without 0x
    #[arg(long, conflicts_with = "code_file", required_unless_present = "code_file")]
    code: Option<String>,

    /// File containing hex bytecode
    #[arg(long)]
    code_file: Option<PathBuf>,

    /// Extract function selectors (the default when no output flag is given)
    #[arg(long)]
    selectors: bool,

    /// Extract function arguments (implies --selectors)
    #[arg(long)]
    arguments: bool,

    /// Extract state mutability (implies --selectors)
    #[arg(long)]
    state_mutability: bool,

    /// Extract storage layout (implies --arguments)
    #[arg(long)]
    storage: bool,

    /// Disassemble bytecode
    #[arg(long)]
    disassemble: bool,

    /// Extract basic blocks
    #[arg(long)]
    basic_blocks: bool,

    /// Build the control flow graph (implies --basic-blocks)
    #[arg(long)]
    control_flow_graph: bool,

    /// Request every output
    #[arg(long)]
    all: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn options(&self) -> AnalysisOptions {
        if self.all {
            return AnalysisOptions::all();
        }
        let mut options = AnalysisOptions::new();
        if self.selectors {
            options = options.with_selectors();
        }
        if self.arguments {
            options = options.with_arguments();
        }
        if self.state_mutability {
            options = options.with_state_mutability();
        }
        if self.storage {
            options = options.with_storage();
        }
        if self.disassemble {
            options = options.with_disassemble();
        }
        if self.basic_blocks {
            options = options.with_basic_blocks();
        }
        if self.control_flow_graph {
            options = options.with_control_flow_graph();
        }
        if options.is_empty() {
            options = options.with_selectors();
        }
        options
    }

    fn code(&self) -> Result<String> {
        match (&self.code, &self.code_file) {
            (Some(code), _) => Ok(code.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("reading bytecode from {}", path.display())),
            (None, None) => anyhow::bail!("either --code or --code-file is required"),
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber already initialized: {}", error);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = EngineConfig::from_env().with_pool_size(1);
    if let Some(path) = &args.wasm {
        config = config.with_wasm_path(path);
    }

    let code = args.code()?;
    let analyzer = Analyzer::new(&config).context("loading analysis engine")?;
    let contract = analyzer
        .contract_info_hex(&code, args.options())
        .context("analyzing contract")?;
    analyzer.close()?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&contract)?
    } else {
        serde_json::to_string(&contract)?
    };
    println!("{}", json);
    Ok(())
}

fn main() {
    init_logging();
    let args = Args::parse();
    if let Err(error) = run(&args) {
        eprintln!("error: {:#}", error);
        std::process::exit(1);
    }
}
