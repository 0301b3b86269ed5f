use std::fs;

use clap::Parser;
use whenever::interpreter::engine::Executor;

/// whenever runs programs written in the Whenever programming language,
/// where lines execute in a random order weighted by their counts.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells whenever to look at a file instead of an inline program.
    #[arg(short, long)]
    file: bool,

    contents: String,
}

fn main() {
    let args = Args::parse();

    let source = if args.file {
        fs::read_to_string(&args.contents).unwrap_or_else(|_| {
            eprintln!("Failed to read the input file '{}'. Perhaps this file does not exist?",
                      &args.contents);
            std::process::exit(1);
        })
    } else {
        args.contents
    };

    let lines = match whenever::compile(&source) {
        Ok(lines) => lines,
        Err(diagnostics) => {
            for diagnostic in diagnostics {
                eprintln!("{diagnostic}");
            }
            std::process::exit(1);
        },
    };

    let mut executor = match Executor::new(lines) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    };

    if let Err(e) = executor.execute() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
