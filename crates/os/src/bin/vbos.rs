use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use kernel::{Config, Kernel};
use os::{RunSummary, execute, load_programs, parse_script, run_to_completion};

/// VBOS: a small educational operating system running on a simulated 6502
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load hex programs, one process each, and run them to completion
    Run {
        /// Program files: whitespace separated hex byte pairs
        #[arg(required = true)]
        programs: Vec<PathBuf>,

        /// CPU cycles per time slice
        #[arg(short, long)]
        quantum: Option<u32>,

        /// JSON machine description
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Give up after this many clock pulses
        #[arg(long, default_value_t = 100_000)]
        max_ticks: u64,

        /// Format the disk first so extra programs can use the swap slot
        #[arg(short, long)]
        format: bool,

        /// Echo the kernel trace and every executed instruction
        #[arg(short, long)]
        verbose: bool,
    },
    /// Format a fresh disk and run a script of file commands against it
    Disk {
        /// One command per line: create, write NAME "DATA", read, delete, ls
        script: PathBuf,

        /// JSON machine description
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print every disk record as hex afterwards
        #[arg(short, long)]
        dump: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    println!("{}", "VBOS v0.1.0".bold().blue());
    println!("{}", "=====================================".blue());

    match args.command {
        Command::Run {
            programs,
            quantum,
            config,
            max_ticks,
            format,
            verbose,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(quantum) = quantum {
                config.quantum = quantum;
            }
            config.verbose = verbose;
            if verbose {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }

            let mut kernel = Kernel::new(config)?;
            if format {
                kernel.format()?;
            }
            let pids = load_programs(&mut kernel, &programs)?;
            println!("{} Loaded {} process(es)", "📦".bold(), pids.len());
            println!();

            let summary = run_to_completion(&mut kernel, max_ticks);
            println!();
            print_summary(&summary);
            if let Some(fatal) = &summary.fatal {
                anyhow::bail!("machine halted: {}", fatal);
            }
        }
        Command::Disk {
            script,
            config,
            dump,
        } => {
            let config = load_config(config.as_deref())?;
            let text = fs::read_to_string(&script)
                .with_context(|| format!("failed to read script {}", script.display()))?;
            let commands = parse_script(&text)?;

            let mut kernel = Kernel::new(config)?;
            kernel.format()?;
            let failures = execute(&mut kernel, &commands);
            println!();
            let line = format!(
                "{} command(s), {} failed, {} free block(s) left",
                commands.len(),
                failures,
                kernel.fs().free_block_count()
            );
            if failures == 0 {
                println!("{} {}", "✅".bold(), line.green());
            } else {
                println!("{} {}", "⚠️".bold(), line.yellow());
            }
            if dump {
                kernel.fs().hdd().store().dump();
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    Config::from_json(&text).with_context(|| format!("bad config {}", path.display()))
}

fn print_summary(summary: &RunSummary) {
    println!("{}", "📊 Summary".bold());
    println!("  Clock ticks:       {}", summary.ticks);
    println!("  CPU cycles:        {}", summary.stats.cycles);
    println!("  Idle ticks:        {}", summary.stats.idle_ticks);
    println!("  Context switches:  {}", summary.stats.context_switches);
    println!("  Interrupts:        {}", summary.stats.interrupts);
    println!("  Swaps:             {}", summary.stats.swaps);

    if summary.halted {
        println!("{}", "❌ Machine halted".red().bold());
    } else if summary.unfinished > 0 {
        println!(
            "{}",
            format!("⏱️  {} process(es) still running at the tick limit", summary.unfinished).yellow()
        );
    } else {
        println!("{}", "✅ All processes finished".green().bold());
    }
}
