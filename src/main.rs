//! The main entry point for the `rewriter` command-line application.
//!
//! This file is responsible for parsing command-line arguments, setting up
//! logging and handing the run to the `rewriter` library.

use anyhow::Context;
use rewriter::{cli, logger, resolver};
use std::env;
use std::io;
use std::process;

fn main() -> anyhow::Result<()> {
    // Check if no arguments provided
    if env::args().len() == 1 {
        println!("Apply pattern:replacement substitutions to files, directories and strings\n");
        println!("QUICK START EXAMPLES:");
        println!("  rewriter -c 'colour:color' -f notes.txt     # Print the changed file");
        println!("  rewriter -c 'colour:color' -f notes.txt -n  # Write 'notes -Changed.txt'");
        println!("  rewriter -d fixes.json -a -r                # Rewrite every .txt below cwd");
        println!("  rewriter -e                                 # Create exampleDict.json\n");
        println!("Run 'rewriter --help' for full option list");
        process::exit(0);
    }

    let args = cli::parse_args();
    logger::init_logging(args.verbose);

    let working_dir = env::current_dir().context("Cannot determine the current directory")?;
    let mut out = io::stdout().lock();
    let mut report_out = io::stderr();

    resolver::run_rewrite(&args, &working_dir, &mut out, &mut report_out)
        .context("rewrite aborted")?;
    Ok(())
}
