use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::error::Diagnostics;
use rox::scanner::Scanner;
use rox::session::{Session, Status};
use rox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a small scripting language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

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

    /// Runs input from a file as a program
    Run { filename: PathBuf },

    /// Reads and runs programs line by line (the default)
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip the crate prefix from module path
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
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print every accumulated report to stderr.
fn flush_reports(diagnostics: &mut Diagnostics) {
    for report in diagnostics.drain() {
        eprintln!("{}", report);
    }
}

fn tokenize(filename: PathBuf, json: bool) -> Result<i32> {
    let source = read_file(filename)?;
    let mut diagnostics = Diagnostics::new();

    let tokens: Vec<Token> = Scanner::new(&source).scan_tokens(&mut diagnostics);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    flush_reports(&mut diagnostics);

    if diagnostics.had_error() {
        debug!("Tokenization failed, exiting with code 65");
        return Ok(Status::StaticError.exit_code());
    }

    Ok(0)
}

fn run_file(filename: PathBuf) -> Result<i32> {
    let source = read_file(filename)?;
    let mut session = Session::new();

    let status = session.run(&source);
    flush_reports(session.diagnostics_mut());

    info!("Run finished with {:?}", status);

    Ok(status.exit_code())
}

fn run_prompt() -> Result<i32> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            return Ok(0);
        }

        session.run(&line);
        flush_reports(session.diagnostics_mut());
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

    let code = match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => tokenize(filename, json)?,
        Commands::Run { filename } => run_file(filename)?,
        Commands::Repl => run_prompt()?,
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
