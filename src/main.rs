//! Provides the main entry point to the program.
use gridplan::cli::run_cli;
use human_panic::{metadata, setup_panic};

fn main() {
    setup_panic!(metadata!().support("Open an issue on the gridplan issue tracker."));

    if let Err(err) = run_cli() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
