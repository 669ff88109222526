mod cli;
mod library;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Outline(args)) => run::outline(args),
        Some(Command::Where(args)) => run::show_paths(args),
        None => run::run(cli.run),
    }
}
