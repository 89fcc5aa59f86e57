use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use simulrun::config::{parse_mnemonics, GenerateConfig, Selection};
use simulrun::corpus::check_corpus;
use simulrun::program::ProgramGenerator;
use simulrun::thumb::{RandASM, Registry};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "simulrun",
    about = "Random Thumb/Thumb-2 instruction generator for simulator fuzzing"
)]
struct Args {
    /// Log progress at info level (RUST_LOG overrides)
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print randomly generated instructions, one per line
    Generate {
        /// Randomizer seed (random and logged when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of instructions to generate
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,

        /// Encoding selection policy (uniform, sequential)
        #[arg(long, default_value_t = Selection::Uniform)]
        selection: Selection,

        /// Comma-separated mnemonics to restrict generation to, e.g. `add,adc`
        #[arg(long, value_name = "LIST")]
        mnemonics: Option<String>,

        /// Restrict generation to one encoding form, e.g. "ADD (immediate) T3". Repeatable.
        #[arg(long = "encoding", value_name = "NAME")]
        encodings: Vec<String>,

        /// Only generate 32-bit encodings
        #[arg(long, action = clap::ArgAction::SetTrue)]
        wide_only: bool,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List every encoding form in the registry
    List,
    /// Check that every line of a corpus file is a well-formed instruction
    Check {
        #[arg(value_name = "PATH")]
        corpus: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn generate(config: GenerateConfig, output: Option<PathBuf>) -> anyhow::Result<()> {
    let seed = config.resolve_seed();
    info!(seed, "seeding randomizer");
    let rand = RandASM::new(StdRng::seed_from_u64(seed));
    let mut program = ProgramGenerator::from_config(&config, rand)?;

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for instr in program.generate(config.count) {
        writeln!(out, "{}", instr)?;
    }
    out.flush()?;
    Ok(())
}

fn list() -> anyhow::Result<()> {
    let registry = Registry::<StdRng>::thumb();
    let mut out = io::stdout().lock();
    for (i, encoding) in registry.iter().enumerate() {
        let bits = encoding.width().bits();
        writeln!(out, "{:3} {:30} {:5} {}", i, encoding.name(), encoding.mnemonic(), bits)?;
    }
    Ok(())
}

fn check(corpus: PathBuf) -> anyhow::Result<()> {
    let file = File::open(&corpus).with_context(|| format!("opening {}", corpus.display()))?;
    let report = check_corpus(BufReader::new(file))
        .with_context(|| format!("reading {}", corpus.display()))?;
    info!(checked = report.checked, failed = report.failures.len(), "checked corpus");
    if !report.is_clean() {
        anyhow::bail!(
            "{} of {} lines in {} are malformed",
            report.failures.len(),
            report.checked,
            corpus.display()
        );
    }
    println!("{} instructions ok", report.checked);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Generate { seed, count, selection, mnemonics, encodings, wide_only, output } => {
            let mnemonics = match mnemonics {
                Some(list) => parse_mnemonics(&list)?,
                None => Vec::new(),
            };
            let config =
                GenerateConfig { seed, count, selection, mnemonics, encodings, wide_only };
            generate(config, output)
        }
        Command::List => list(),
        Command::Check { corpus } => check(corpus),
    }
}
