use std::{io::Write, process::ExitCode};

use clap::{Args, Parser, Subcommand};
use nya::{parser, runner::Runner, tokenizer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DATA_ERROR: u8 = 65;
const NO_INPUT: u8 = 66;

#[derive(Debug, Parser)]
#[command(version, about = "Tokenize, parse and run nya programs")]
struct Cli {
    /// Log filter, e.g. `debug` or `nya::parser=trace`. Falls back to NYA_LOG.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Repl)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every token of a file
    Tokenize(FileArgs),
    /// Print every statement of a file in prefix form
    Parse(FileArgs),
    /// Run a file
    Evaluate(FileArgs),
    Repl,
}

#[derive(Debug, Args)]
struct FileArgs {
    file: String,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.log.as_deref());

    let (file, command): (&FileArgs, fn(&str) -> ExitCode) = match args.command() {
        Command::Tokenize(file) => (file, tokenize_command),
        Command::Parse(file) => (file, parse_command),
        Command::Evaluate(file) => (file, evaluate_command),
        Command::Repl => return repl_command(),
    };

    match read_source(file) {
        Ok(source) => command(&source),
        Err(code) => code,
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_env("NYA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_source(args: &FileArgs) -> Result<String, ExitCode> {
    std::fs::read_to_string(&args.file).map_err(|e| {
        eprintln!("Could not read {}: {e}", args.file);
        ExitCode::from(NO_INPUT)
    })
}

fn tokenize_command(source: &str) -> ExitCode {
    let mut failed = false;
    for result in tokenizer::tokens(source) {
        match result {
            Ok(token) => println!("{token}"),
            Err(e) => {
                eprintln!("{e}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::from(DATA_ERROR)
    } else {
        ExitCode::SUCCESS
    }
}

fn parse_command(source: &str) -> ExitCode {
    let mut tokens = Vec::new();
    let mut failed = false;
    for result in tokenizer::tokens(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => {
                eprintln!("{e}");
                failed = true;
            }
        }
    }
    if failed {
        return ExitCode::from(DATA_ERROR);
    }

    for result in parser::program(&tokens) {
        match result {
            Ok(expression) => println!("{expression}"),
            Err(e) => {
                eprintln!("{e}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::from(DATA_ERROR)
    } else {
        ExitCode::SUCCESS
    }
}

fn evaluate_command(source: &str) -> ExitCode {
    let mut runner = Runner::default();
    match runner.run(source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "run failed");
            ExitCode::from(e.exit_code())
        }
    }
}

fn repl_command() -> ExitCode {
    println!("Welcome to the nya REPL!");
    println!("EOF to exit. (Ctrl+D on *nix, Ctrl+Z on Windows)");

    let mut runner = Runner::default();
    let mut input = String::new();

    loop {
        print!("> ");
        if let Err(e) = std::io::stdout().flush() {
            eprintln!("Could not write prompt: {e}");
            return ExitCode::FAILURE;
        }

        input.clear();
        match std::io::stdin().read_line(&mut input) {
            Ok(0) => return ExitCode::SUCCESS,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Could not read input: {e}");
                return ExitCode::FAILURE;
            }
        }

        // Diagnostics were already written by the runner
        if let Err(e) = runner.run(input.trim_end()) {
            tracing::debug!(error = %e, "line failed");
        }
    }
}
