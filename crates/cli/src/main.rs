//! decavm CLI: minimal host for running raw bytecode images.
//!
//! Loads a raw binary image into machine memory, runs it with a step
//! budget, and dumps the final registers plus any requested memory window.
//! The exit code encodes how the run stopped: 0 when the program ran off
//! the end of its image (the clean-finish path), otherwise a code naming
//! the trap.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use decavm_executor::memory::DEFAULT_MEM_SIZE;
use decavm_executor::{Cpu, RunResult, Trap, INSTR_LEN};

/// Exit code for host-side failures (bad arguments, unreadable files),
/// distinct from the trap codes 1..=7.
const EXIT_HOST_ERROR: u8 = 64;

/// decavm: fixed-width bytecode virtual machine
#[derive(Parser)]
#[command(name = "decavm")]
#[command(version = "0.1.0")]
#[command(about = "Run raw decavm bytecode images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a raw binary image
    Run {
        /// Path to the raw bytecode image
        #[arg(long, value_name = "PATH")]
        bin: PathBuf,

        /// Address the image is loaded at
        #[arg(long, value_name = "ADDR", default_value = "0")]
        base: String,

        /// Initial program counter
        #[arg(long, value_name = "ADDR", default_value = "0")]
        pc: String,

        /// Initial stack pointer (defaults to the top of memory)
        #[arg(long, value_name = "ADDR")]
        sp: Option<String>,

        /// Memory size in bytes
        #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MEM_SIZE)]
        mem_size: usize,

        /// Maximum number of instructions to execute
        #[arg(long, value_name = "NUM", default_value = "1000000")]
        max_steps: u64,

        /// Dump a memory window after the run, as ADDR:LEN
        #[arg(long, value_name = "ADDR:LEN")]
        dump_mem: Option<String>,

        /// Write the execution trace as JSON
        #[arg(long, value_name = "PATH")]
        trace: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            bin,
            base,
            pc,
            sp,
            mem_size,
            max_steps,
            dump_mem,
            trace,
        } => run_command(
            &bin,
            &base,
            &pc,
            sp.as_deref(),
            mem_size,
            max_steps,
            dump_mem.as_deref(),
            trace.as_deref(),
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_HOST_ERROR)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_command(
    bin: &std::path::Path,
    base: &str,
    pc: &str,
    sp: Option<&str>,
    mem_size: usize,
    max_steps: u64,
    dump_mem: Option<&str>,
    trace_out: Option<&std::path::Path>,
) -> Result<ExitCode> {
    let image = fs::read(bin).with_context(|| format!("reading image {}", bin.display()))?;
    info!(path = %bin.display(), bytes = image.len(), "loaded image");

    let base = parse_num(base).context("parsing --base")?;
    let pc = parse_num(pc).context("parsing --pc")?;
    let sp = match sp {
        Some(s) => parse_num(s).context("parsing --sp")?,
        None => mem_size as u32,
    };

    let mut cpu = Cpu::boot(mem_size, &image, base, pc, sp)
        .map_err(|t| anyhow!("loading image at {base:#x}: {t}"))?;

    if trace_out.is_some() {
        cpu.enable_tracing();
    }

    info!(pc, sp, mem_size, max_steps, "executing");
    let start = Instant::now();
    let result = cpu.run(max_steps);
    let elapsed = start.elapsed();

    println!(
        "Executed {} steps in {:?} ({:.2} steps/sec)",
        result.steps,
        elapsed,
        result.steps as f64 / elapsed.as_secs_f64()
    );
    println!("Stopped: {}", stop_description(&cpu, &result));
    println!();
    print_registers(&cpu);

    if let Some(range) = dump_mem {
        let (addr, len) = parse_range(range).context("parsing --dump-mem")?;
        println!();
        dump_memory(&cpu, addr, len)?;
    }

    if let Some(path) = trace_out {
        let trace = cpu
            .take_trace()
            .ok_or_else(|| anyhow!("tracing was enabled but no trace was collected"))?;
        let json = serde_json::to_string_pretty(&trace).context("serializing trace")?;
        fs::write(path, json).with_context(|| format!("writing trace {}", path.display()))?;
        info!(path = %path.display(), rows = trace.len(), "trace written");
    }

    Ok(exit_code(&cpu, &result))
}

/// A fetch that ran past the last full instruction is the program running
/// to completion; everything else is a reported trap.
fn ran_off_end(cpu: &Cpu, result: &RunResult) -> bool {
    match result.trap {
        Trap::OutOfBounds { addr } => {
            addr == cpu.pc && addr as u64 + INSTR_LEN as u64 > cpu.memory.size() as u64
        }
        _ => false,
    }
}

fn stop_description(cpu: &Cpu, result: &RunResult) -> String {
    if ran_off_end(cpu, result) {
        "execution finished (ran past the end of memory)".to_string()
    } else {
        result.trap.to_string()
    }
}

fn exit_code(cpu: &Cpu, result: &RunResult) -> ExitCode {
    if ran_off_end(cpu, result) {
        return ExitCode::SUCCESS;
    }
    let code: u8 = match result.trap {
        Trap::OutOfBounds { .. } => 1,
        Trap::ReservedOpcode { .. } => 2,
        Trap::UnknownOpcode { .. } => 3,
        Trap::DivideByZero { .. } => 4,
        Trap::StackUnderflow { .. } => 5,
        Trap::StackOverflow { .. } => 6,
        Trap::BudgetExhausted { .. } => 7,
    };
    ExitCode::from(code)
}

fn print_registers(cpu: &Cpu) {
    println!("Registers:");
    for (i, val) in cpu.regs.snapshot().iter().enumerate() {
        println!("r{i:02} = {val:#010x}");
    }
    println!("pc  = {:#010x}", cpu.pc);
    println!("sp  = {:#010x}", cpu.sp());
}

fn dump_memory(cpu: &Cpu, addr: u32, len: u32) -> Result<()> {
    let bytes = cpu
        .memory
        .read_bytes(addr, len as usize)
        .map_err(|t| anyhow!("{t}"))?;
    println!("Memory {addr:#010x}..{:#010x}:", addr as u64 + len as u64);
    for (i, chunk) in bytes.chunks(16).enumerate() {
        let line: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("{:#010x}  {}", addr as usize + i * 16, line.join(" "));
    }
    Ok(())
}

/// Parse a decimal or 0x-prefixed hex number.
fn parse_num(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex number {s:?}"))
    } else {
        s.parse().with_context(|| format!("invalid number {s:?}"))
    }
}

/// Parse an ADDR:LEN window.
fn parse_range(s: &str) -> Result<(u32, u32)> {
    let (addr, len) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("expected ADDR:LEN, got {s:?}"))?;
    Ok((parse_num(addr)?, parse_num(len)?))
}
