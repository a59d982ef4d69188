use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use braq_compiler::driver;

/// Compile one source file and print the assembly listing.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the source file
    source: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&cli.source)?;
    let listing = driver::compile_source(&source)?;
    println!("{listing}");
    Ok(())
}
