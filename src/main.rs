use clap::Parser;
use chromedump::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dump {
            ref database,
            ref output,
            ref master_key,
            ref tables,
            force,
        } => chromedump::cli::commands::dump::execute(
            &cli,
            database,
            output.as_deref(),
            master_key.as_deref(),
            tables.as_deref(),
            force,
        ),
        Commands::Tables { ref database } => chromedump::cli::commands::tables::execute(database),
        Commands::Key => chromedump::cli::commands::key::execute(&cli),
        Commands::Completions { shell } => chromedump::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        chromedump::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
