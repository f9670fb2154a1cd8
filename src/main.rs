use clap::{Parser as ClapParser, Subcommand};
use formula_lang::cli::{self, CheckOptions, CliError, EvalOptions};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "formula")]
#[command(about = "Evaluate and type-check spreadsheet-style formulas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula and print the result as JSON
    Eval {
        /// The formula to evaluate
        formula: String,

        /// JSON object with the referenced fields (reads from stdin if not provided)
        #[arg(short, long)]
        vars: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the type a formula would produce
    Check {
        /// The formula to check
        formula: String,

        /// JSON object mapping field paths to type names, e.g. {"age":"number"}
        #[arg(short, long)]
        types: Option<String>,

        /// Skip unknown characters and ignore trailing tokens
        #[arg(long)]
        lenient: bool,
    },

    /// List the built-in functions
    Functions,
}

fn main() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            formula,
            vars,
            pretty,
        } => run_eval(formula, vars, pretty),
        Commands::Check {
            formula,
            types,
            lenient,
        } => run_check(formula, types, lenient),
        Commands::Functions => {
            print!("{}", cli::list_functions());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e.report());
        std::process::exit(1);
    }
}

fn run_eval(formula: String, vars: Option<String>, pretty: bool) -> Result<(), CliError> {
    let vars = match vars {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let output = cli::execute_eval(&EvalOptions { formula, vars })?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}

fn run_check(formula: String, types: Option<String>, lenient: bool) -> Result<(), CliError> {
    let ty = cli::execute_check(&CheckOptions {
        formula,
        types,
        lenient,
    })?;
    println!("{}", ty);
    Ok(())
}
