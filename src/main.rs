// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// main.rs
//
// Command-line driver for the Tomasulo scheduling simulator: decodes a
// program, configures hardware and initial memory, runs the engine to
// completion (or until the cycle budget is exhausted), and reports the
// final state as a colored table or as JSON.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use log::LevelFilter;
use serde::Serialize;

use tomasulo_sim::utils::logger::{LogLevel, Logger};
use tomasulo_sim::{decode_program, load_memory_image, Engine, EngineStats, HardwareConfig, Memory, SimulatorError};

#[derive(Parser)]
#[command(name = "tomasulo_sim")]
#[command(about = "A Tomasulo dynamic-scheduling simulator")]
#[command(version)]
struct Cli {
    /// Instruction text file
    #[arg(long)]
    program: PathBuf,

    /// Seven-line reservation-station configuration file (defaults built in)
    #[arg(long)]
    hardware_config: Option<PathBuf>,

    /// `address value` memory seed file
    #[arg(long)]
    init_memory: Option<PathBuf>,

    /// Initial program counter
    #[arg(long, default_value_t = 0)]
    initial_pc: usize,

    /// CLI-level safety ceiling on cycles simulated
    #[arg(long, default_value_t = 100_000)]
    max_cycles: usize,

    /// Append a line per issue/execute-start/execute-end/write-back/flush event here
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Diagnostic log verbosity (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the final report as JSON instead of a colored table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct InstructionReport {
    index: usize,
    category: String,
    issue: usize,
    exec_start: usize,
    exec_end: usize,
    write_back: usize,
    source: String,
}

#[derive(Serialize)]
struct Report {
    registers: [u16; 8],
    memory: Vec<(usize, u16)>,
    instructions: Vec<InstructionReport>,
    stats: EngineStats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::new().filter_level(level).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message.red());
            ExitCode::FAILURE
        },
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let program_text = fs::read_to_string(&cli.program).map_err(|e| format!("reading {:?}: {e}", cli.program))?;
    let program = decode_program(&program_text).map_err(|e| describe(&e))?;

    let config = match &cli.hardware_config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("reading {path:?}: {e}"))?;
            HardwareConfig::parse(&text).map_err(|e| describe(&e))?
        },
        None => HardwareConfig::default_config(),
    };

    let mut memory = Memory::new();
    if let Some(path) = &cli.init_memory {
        let text = fs::read_to_string(path).map_err(|e| format!("reading {path:?}: {e}"))?;
        load_memory_image(&text, &mut memory).map_err(|e| describe(&e))?;
    }

    let mut engine = Engine::new(program, &config, memory, cli.initial_pc);

    let mut tracer = cli.trace.as_ref().map(|path| {
        let path_str = path.to_string_lossy().into_owned();
        Logger::new(Some(&path_str), LogLevel::Info)
    });

    while !engine.is_terminated() {
        if engine.cycle() > cli.max_cycles {
            return Err(format!("cycle budget exhausted after {} cycles", cli.max_cycles));
        }
        let before = snapshot(&engine);
        engine.step().map_err(|e| describe(&e))?;
        if let Some(logger) = tracer.as_mut() {
            trace_cycle(logger, &before, &engine);
        }
    }

    let report = build_report(&engine);
    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| format!("serializing report: {e}"))?;
        println!("{json}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn describe(err: &SimulatorError) -> String {
    err.to_string()
}

/// Per-station `(busy, inst_index)` and per-instruction timestamps, taken
/// just before a cycle, so the diff after it can be turned into trace lines.
struct Snapshot {
    stations: Vec<(bool, usize)>,
    timestamps: Vec<(usize, usize, usize, usize)>,
}

fn snapshot(engine: &Engine) -> Snapshot {
    Snapshot {
        stations: engine.stations().map(|s| (s.busy, s.inst_index)).collect(),
        timestamps: engine
            .program
            .iter()
            .map(|i| (i.issue, i.exec_start, i.exec_end, i.write_back))
            .collect(),
    }
}

fn trace_cycle(logger: &mut Logger, before: &Snapshot, engine: &Engine) {
    let cycle = engine.cycle().saturating_sub(1).max(1);
    for (idx, instr) in engine.program.iter().enumerate() {
        let (old_issue, old_exec_start, old_exec_end, old_write_back) = before.timestamps[idx];
        if old_issue == 0 && instr.issue != 0 {
            logger.info(&format!("cycle {cycle}: issue inst {idx}"));
        }
        if old_exec_start == 0 && instr.exec_start != 0 {
            logger.info(&format!("cycle {cycle}: execute-start inst {idx}"));
        }
        if old_exec_end == 0 && instr.exec_end != 0 {
            logger.info(&format!("cycle {cycle}: execute-end inst {idx}"));
        }
        if old_write_back == 0 && instr.write_back != 0 {
            logger.info(&format!("cycle {cycle}: write-back inst {idx}"));
        }
    }
    for (slot, station) in engine.stations().enumerate() {
        let (was_busy, was_index) = before.stations[slot];
        if was_busy && !station.busy && engine.program[was_index].write_back == 0 {
            logger.info(&format!("cycle {cycle}: flush inst {was_index}"));
        }
    }
}

fn build_report(engine: &Engine) -> Report {
    let instructions = engine
        .program
        .iter()
        .map(|i| InstructionReport {
            index: i.index,
            category: i.category.to_string(),
            issue: i.issue,
            exec_start: i.exec_start,
            exec_end: i.exec_end,
            write_back: i.write_back,
            source: i.source.clone(),
        })
        .collect();

    Report {
        registers: *engine.registers().as_slice(),
        memory: engine.memory().non_zero().collect(),
        instructions,
        stats: engine.stats(),
    }
}

fn print_report(report: &Report) {
    println!("{}", "Registers".bold());
    for (i, value) in report.registers.iter().enumerate() {
        print!("R{i}={value}\t");
        if i % 4 == 3 {
            println!();
        }
    }
    println!();

    println!("{}", "Non-zero memory".bold());
    for (addr, value) in &report.memory {
        println!("  mem[{addr}] = {value}");
    }

    println!("{}", "Instructions".bold());
    for instr in &report.instructions {
        println!(
            "  [{:>3}] {:<9} issue={:<4} exec_start={:<4} exec_end={:<4} write_back={:<4} {}",
            instr.index, instr.category, instr.issue, instr.exec_start, instr.exec_end, instr.write_back, instr.source
        );
    }

    let stats = &report.stats;
    println!("{}", "Summary".bold().green());
    println!("  cycles: {}", stats.cycle);
    println!("  written: {}", stats.written);
    println!("  beq: {}", stats.beq);
    println!("  mispredictions: {}", stats.mispredictions);
    println!("  ipc: {:.3}", stats.ipc);
}
