//! nlread - NL file inspector
//!
//! Reads an NL file, reports its header and prints the nonlinear parts of its
//! objectives and constraints.
//!
//! # Usage
//!
//! ```bash
//! nlread model.nl
//! nlread --header-only -v model.nl
//! ```

use std::path::PathBuf;

use clap::Parser;
use log::{info, LevelFilter, Log, Metadata, Record};
use nlreader::{
    error::Result,
    nl::{self, Bounds, LinearTerm, Suffix},
    Expr, Handler, Header, Reader, DEFAULT_MAX_EXPR_DEPTH,
};

/// NL file reader and inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the NL file
    #[arg(value_name = "NL_FILE")]
    nl_file: PathBuf,

    /// Only read and print the header
    #[arg(long)]
    header_only: bool,

    /// Maximum nesting depth of expressions
    #[arg(long, default_value_t = DEFAULT_MAX_EXPR_DEPTH)]
    max_depth: usize,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Writes log records to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Prints the problem as it is read and counts what carries no expression.
#[derive(Default)]
struct Printer {
    num_bounds: usize,
    num_linear_terms: usize,
    num_suffixes: usize,
}

impl Handler for Printer {
    fn handle_header(&mut self, header: Header) {
        print_header(&header);
    }

    fn handle_objective(&mut self, index: usize, maximize: bool, expr: Expr) {
        let sense = if maximize { "maximize" } else { "minimize" };
        println!("{} o{}: {};", sense, index + 1, expr);
    }

    fn handle_algebraic_constraint(&mut self, index: usize, expr: Expr) {
        println!("c{}: {};", index + 1, expr);
    }

    fn handle_logical_constraint(&mut self, index: usize, expr: Expr) {
        println!("l{}: {};", index + 1, expr);
    }

    fn handle_common_expression(
        &mut self,
        index: usize,
        _position: usize,
        linear: Vec<LinearTerm>,
        expr: Expr,
    ) {
        self.num_linear_terms += linear.len();
        println!("e{} = {};", index + 1, expr);
    }

    fn handle_suffix(&mut self, suffix: Suffix) {
        self.num_suffixes += 1;
        info!("suffix {} with {} values", suffix.name, suffix.values.len());
    }

    fn handle_variable_bounds(&mut self, _index: usize, _bounds: Bounds) {
        self.num_bounds += 1;
    }

    fn handle_constraint_bounds(&mut self, _index: usize, _bounds: Bounds) {
        self.num_bounds += 1;
    }

    fn handle_linear_constraint(&mut self, _index: usize, terms: Vec<LinearTerm>) {
        self.num_linear_terms += terms.len();
    }

    fn handle_linear_objective(&mut self, _index: usize, terms: Vec<LinearTerm>) {
        self.num_linear_terms += terms.len();
    }
}

fn print_header(header: &Header) {
    print!("{}", header);
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbose: u8) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log_level(verbose));
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    if args.header_only {
        let header = nl::read_file_header(&args.nl_file)?;
        print_header(&header);
        return Ok(());
    }

    let mut reader = Reader::new(Printer::default()).with_max_depth(args.max_depth);
    reader.read_file(&args.nl_file)?;

    let printer = reader.into_handler();
    info!(
        "{} bounds, {} linear terms, {} suffixes",
        printer.num_bounds, printer.num_linear_terms, printer.num_suffixes
    );

    Ok(())
}
