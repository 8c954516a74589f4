mod completer;

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use rustyline::error::ReadlineError;
use rustyline::Editor;

use klox::ast_printer::AstPrinter;
use klox::parser::Parser;
use klox::scanner::Scanner;
use klox::token::Token;
use klox::{Diagnostics, Lox};

use completer::KloxHelper;

/// Exit code for scan, parse and resolve errors.
const EXIT_STATIC_ERROR: u8 = 65;

/// Exit code for runtime errors.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to klox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses a Lox program and prints the AST of each statement
    Parse {
        filename: PathBuf,

        /// Print one JSON document per statement
        #[arg(long)]
        json: bool,
    },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("klox.log").context("Failed to create klox.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("klox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{} {}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to klox.log");
    Ok(())
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<ExitCode> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(source.as_bytes()) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if json {
                    println!("{}", serde_json::to_string(&token)?);
                } else {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    info!("Tokenization completed successfully");
    Ok(ExitCode::SUCCESS)
}

fn parse(filename: &PathBuf, json: bool) -> Result<ExitCode> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;
    let mut diagnostics = Diagnostics::new();

    let mut tokens: Vec<Token> = Vec::new();
    for token in Scanner::new(source.as_bytes()) {
        match token {
            Ok(token) => tokens.push(token),
            Err(e) => diagnostics.report(e),
        }
    }

    let statements = Parser::new(tokens, &mut diagnostics).parse();

    for e in diagnostics.drain() {
        eprintln!("{}", e);
    }

    if diagnostics.had_error() {
        debug!("Parse failed, exiting with code {}", EXIT_STATIC_ERROR);
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    for stmt in &statements {
        if json {
            println!("{}", serde_json::to_string(stmt)?);
        } else {
            println!("{}", AstPrinter::print_stmt(stmt));
        }
    }

    info!("Parse subcommand completed");
    Ok(ExitCode::SUCCESS)
}

fn run(filename: &PathBuf) -> Result<ExitCode> {
    info!("Running Run subcommand");
    let source = read_file(filename)?;

    let mut lox = Lox::new();
    lox.run_file(&source);
    std::io::stdout().flush()?;

    let diagnostics = lox.diagnostics();
    for e in diagnostics.drain() {
        eprintln!("{}", e);
    }

    if diagnostics.had_error() {
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    if diagnostics.had_runtime_error() {
        return Ok(ExitCode::from(EXIT_RUNTIME_ERROR));
    }

    info!("Program executed successfully");
    Ok(ExitCode::SUCCESS)
}

fn repl() -> Result<ExitCode> {
    info!("Running REPL");
    println!("Welcome to klox. Type code to evaluate it, or ':exit' to exit.");

    let mut rl: Editor<KloxHelper, _> =
        Editor::new().context("Failed to start the line editor")?;
    let mut lox = Lox::new();
    rl.set_helper(Some(KloxHelper::new(lox.variable_names())));

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim() == ":exit" {
                    break;
                }

                if line.trim().is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line.as_str());

                lox.run_prompt_line(&line);
                std::io::stdout().flush()?;

                for e in lox.diagnostics().drain() {
                    eprintln!("{}", e);
                }

                if let Some(helper) = rl.helper() {
                    helper.set_variables(lox.variable_names());
                }
            }

            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,

            Err(err) => return Err(err).context("REPL input failed"),
        }
    }

    info!("REPL session ended");
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => tokenize(&filename, json),
        Commands::Parse { filename, json } => parse(&filename, json),
        Commands::Run { filename } => run(&filename),
        Commands::Repl => repl(),
    }
}
