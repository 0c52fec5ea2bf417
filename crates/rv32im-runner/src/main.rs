//! CLI entry point for the `rv32im-run` binary.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rv32im_core::{
    disassemble_window, run, CoreConfig, CoreState, HaltPolicy, RunOutcome, INSTRUCTION_BYTES,
};
use rv32im_runner::{load_hex_file, status_line, StateDump, TraceFormatter};
use serde as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum HaltMode {
    /// Stop at any `ebreak`.
    Ebreak,
    /// Stop only at an `ebreak` between the semihosting marker words.
    Marker,
}

impl From<HaltMode> for HaltPolicy {
    fn from(mode: HaltMode) -> Self {
        match mode {
            HaltMode::Ebreak => Self::Ebreak,
            HaltMode::Marker => Self::SemihostingMarker,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "rv32im-run",
    version,
    about = "Run an RV32IM hex image and write its execution trace."
)]
struct Cli {
    /// Program image: two-digit hex bytes, `@` lines skipped.
    input: PathBuf,

    /// Trace output file. Defaults to stdout.
    output: Option<PathBuf>,

    /// Address the image is loaded at and execution starts from.
    #[arg(long, value_name = "HEX", value_parser = parse_address, default_value = "0x80000000")]
    base_address: u32,

    /// Memory size in KiB.
    #[arg(long, value_name = "N", default_value_t = 32)]
    memory_kib: usize,

    /// Stop after this many instructions have retired.
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Which `ebreak` ends the run.
    #[arg(long, value_enum, default_value_t = HaltMode::Ebreak)]
    halt: HaltMode,

    /// Write final registers, PC and status as JSON.
    #[arg(long, value_name = "PATH")]
    state_json: Option<PathBuf>,

    /// Print a disassembly of the loaded image instead of running it.
    #[arg(long, default_value_t = false)]
    disassemble: bool,

    /// Log at debug level on stderr unless `RUST_LOG` says otherwise.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn core_config(&self) -> Result<CoreConfig> {
        let memory_bytes = self
            .memory_kib
            .checked_mul(1024)
            .context("memory size is too large")?;
        Ok(CoreConfig {
            base_address: self.base_address,
            memory_bytes,
            halt_policy: self.halt.into(),
        })
    }
}

fn parse_address(text: &str) -> Result<u32, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
        .replace('_', "");
    u32::from_str_radix(&digits, 16).map_err(|err| format!("invalid hex address `{text}`: {err}"))
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn trace_run<W: Write>(
    state: &mut CoreState,
    config: &CoreConfig,
    max_steps: Option<u64>,
    out: W,
) -> Result<RunOutcome> {
    let mut formatter = TraceFormatter::new(out);
    let outcome = run(state, config, &mut formatter, max_steps);
    formatter.finish().context("failed to write trace")?;
    Ok(outcome)
}

fn print_disassembly(state: &CoreState, loaded: usize) -> Result<()> {
    let count = loaded.div_ceil(INSTRUCTION_BYTES as usize);
    let mut out = io::stdout().lock();
    for row in disassemble_window(&state.memory, state.memory.base(), count) {
        writeln!(out, "0x{:08x}: {:08x}  {row}", row.addr, row.raw_word)?;
    }
    out.flush()?;
    Ok(())
}

fn run_cli(cli: &Cli) -> Result<ExitCode> {
    let config = cli.core_config()?;
    let mut state = CoreState::with_config(&config);
    let loaded = load_hex_file(&cli.input, &mut state)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    if cli.disassemble {
        print_disassembly(&state, loaded)?;
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            trace_run(&mut state, &config, cli.max_steps, BufWriter::new(file))?
        }
        None => trace_run(&mut state, &config, cli.max_steps, io::stdout().lock())?,
    };

    println!("{}", status_line(outcome.status));

    if let Some(path) = &cli.state_json {
        let dump = StateDump::capture(&state, outcome.status);
        let json = serde_json::to_string_pretty(&dump)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(if outcome.status.is_normal_halt() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_cli(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
