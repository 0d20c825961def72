// svm: register bytecode VM with a time-travel debugger

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::filter::EnvFilter;

use svm::bytecode::disasm::disassemble;
use svm::interpreter::constants::{
    MachineConfig, DEFAULT_MEMORY_LIMIT, DEFAULT_MEMORY_SIZE, DEFAULT_SCRATCH_SIZE,
    DEFAULT_SNAPSHOT_LIMIT,
};
use svm::interpreter::engine::Machine;
use svm::interpreter::history::Recording;
use svm::snapshot::StdoutSink;
use svm::ui::App;

#[derive(Parser)]
#[command(name = "svm", version, about = "Register bytecode VM with a time-travel debugger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Initial machine memory in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_MEMORY_SIZE)]
    memory: usize,

    /// Largest size machine memory may grow to
    #[arg(long, global = true, default_value_t = DEFAULT_MEMORY_LIMIT)]
    memory_limit: usize,

    /// Memory budget for recorded history (debug only)
    #[arg(long, global = true, default_value_t = DEFAULT_SNAPSHOT_LIMIT)]
    snapshot_limit: usize,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program, printing its output; exits with the return code
    Run { file: PathBuf },
    /// Record a run and browse it in the terminal debugger
    Debug { file: PathBuf },
    /// Print the disassembly of a program
    Disasm { file: PathBuf },
}

fn read_program(path: &Path) -> Vec<u8> {
    match fs::read(path) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    let config = MachineConfig {
        memory_size: cli.memory,
        memory_limit: cli.memory_limit,
        scratch_size: DEFAULT_SCRATCH_SIZE,
    };

    match cli.command {
        Commands::Run { file } => {
            let program = read_program(&file);
            let mut machine = Machine::with_sink(config, StdoutSink);
            let code = machine.run_program(&program);
            if !code.is_ok() {
                eprintln!("{} ({})", code, code.as_byte());
            }
            std::process::exit(code.as_byte() as i32);
        }
        Commands::Disasm { file } => {
            let program = read_program(&file);
            let listing = disassemble(&program);
            for instruction in &listing.instructions {
                println!("{}", instruction);
            }
            if let Some(e) = listing.error {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Debug { file } => debug(&file, config, cli.snapshot_limit),
    }
}

fn debug(
    file: &Path,
    config: MachineConfig,
    snapshot_limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let program = read_program(file);

    // Run execution to build history
    eprintln!("Executing {}...", file.display());
    let mut recording = Recording::capture(config, &program, snapshot_limit);
    match (recording.exit_code(), recording.truncated()) {
        (_, Some(e)) => {
            eprintln!("Recording stopped early: {}", e);
            eprintln!("Entering TUI with partial execution history...");
        }
        (Some(code), None) if code.is_ok() => {
            eprintln!("Execution completed successfully.");
        }
        (Some(code), None) => {
            eprintln!("Runtime error: {} ({})", code, code.as_byte());
        }
        (None, None) => {}
    }
    eprintln!("Total snapshots: {}", recording.total_snapshots());

    // Rewind to the beginning for TUI
    if let Err(e) = recording.rewind_to_start() {
        eprintln!("Warning: Failed to rewind to start: {}", e);
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(recording);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
