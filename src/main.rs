use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::diagnostic::Diagnostics;
use rox::interpreter::Interpreter;
use rox::lox::{Lox, Outcome};
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a program from a file and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluates a single expression from a file and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a Lox program, or starts a REPL when no file is given
    Run { filename: Option<PathBuf> },
}

/// Reads a whole source file as UTF‑8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

/// Exit code for a missing or unreadable input file.
const EXIT_UNREADABLE: i32 = 66;

/// Like [`read_file`], but a failure is reported on stderr and turned into
/// the exit code the caller should finish with.
fn read_source(filename: &Path) -> std::result::Result<String, i32> {
    read_file(filename).map_err(|e| {
        debug!("Read debug: {:?}", e);
        eprintln!("{:#}", e);
        EXIT_UNREADABLE
    })
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Scan everything, reporting lex errors as they come.  Returns the tokens
/// and whether the input was clean.
fn scan(source: &str, diagnostics: &mut Diagnostics) -> (Vec<Token>, bool) {
    let mut tokens = Vec::new();
    let mut clean = true;

    for result in Scanner::new(source) {
        match result {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                tokens.push(token);
            }
            Err(e) => {
                clean = false;
                diagnostics.error(&e);
            }
        }
    }

    (tokens, clean)
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    info!("Running Tokenize subcommand");

    let source = match read_source(filename) {
        Ok(source) => source,
        Err(code) => return Ok(code),
    };
    let mut diagnostics = Diagnostics::new();
    let (tokens, clean) = scan(&source, &mut diagnostics);

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !clean {
        debug!("Tokenization failed, exiting with code 65");
        return Ok(Outcome::StaticError.exit_code());
    }

    info!("Tokenization completed successfully");
    Ok(Outcome::Success.exit_code())
}

fn parse(filename: &Path, json: bool) -> Result<i32> {
    info!("Running Parse subcommand");

    let source = match read_source(filename) {
        Ok(source) => source,
        Err(code) => return Ok(code),
    };
    let mut diagnostics = Diagnostics::new();
    let (tokens, clean) = scan(&source, &mut diagnostics);

    let statements = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,
        Err(errors) => {
            for e in &errors {
                diagnostics.error(e);
            }
            return Ok(Outcome::StaticError.exit_code());
        }
    };

    if !clean {
        return Ok(Outcome::StaticError.exit_code());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&statements)?);
    } else {
        let ast = AstPrinter::print_program(&statements);
        debug!("AST: {}", ast);
        println!("{}", ast);
    }

    info!("Parse subcommand completed");
    Ok(Outcome::Success.exit_code())
}

fn evaluate(filename: &Path) -> Result<i32> {
    info!("Running Evaluate subcommand");

    let source = match read_source(filename) {
        Ok(source) => source,
        Err(code) => return Ok(code),
    };
    let mut diagnostics = Diagnostics::new();
    let (tokens, clean) = scan(&source, &mut diagnostics);

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => {
            debug!("Parse debug: {}", e);
            diagnostics.error(&e);
            return Ok(Outcome::StaticError.exit_code());
        }
    };

    if !clean {
        return Ok(Outcome::StaticError.exit_code());
    }

    let mut interpreter = Interpreter::new();

    match interpreter.evaluate(&expr) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
        }
        Err(e) => {
            debug!("Evaluation debug: {}", e);
            diagnostics.runtime_error(&e);
            return Ok(Outcome::RuntimeError.exit_code());
        }
    }

    info!("Evaluate subcommand completed");
    Ok(Outcome::Success.exit_code())
}

fn run(filename: Option<&Path>) -> Result<i32> {
    let mut lox = Lox::new();

    match filename {
        Some(filename) => {
            info!("Running Run subcommand");

            let source = match read_source(filename) {
                Ok(source) => source,
                Err(code) => return Ok(code),
            };
            info!("Provided input:\n {}", source);

            let outcome = lox.run(&source);
            info!("Program finished: {:?}", outcome);

            Ok(outcome.exit_code())
        }
        None => {
            info!("No filepath provided for Run, starting REPL");

            let stdin = io::stdin();
            lox.run_prompt(stdin.lock(), &mut io::stdout())
                .context("REPL I/O failed")?;

            Ok(Outcome::Success.exit_code())
        }
    }
}

fn main() -> Result<()> {
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

    let code = match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json)?,
        Commands::Parse { filename, json } => parse(filename, *json)?,
        Commands::Evaluate { filename } => evaluate(filename)?,
        Commands::Run { filename } => run(filename.as_deref())?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        process::exit(code);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_file_maps_to_exit_66() {
        let missing = Path::new("no/such/dir/program.lox");

        assert_eq!(read_source(missing), Err(EXIT_UNREADABLE));
        assert_eq!(tokenize(missing, false).unwrap(), 66);
        assert_eq!(run(Some(missing)).unwrap(), 66);
    }
}
