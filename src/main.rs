use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    readtrack::logging::init().context("init logging")?;

    let cli = readtrack::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let books = cli.books.as_path();
    match cli.command {
        readtrack::cli::Command::Init => {
            readtrack::commands::init(books).context("init")?;
        }
        readtrack::cli::Command::Migrate => {
            readtrack::commands::migrate(books).context("migrate")?;
        }
        readtrack::cli::Command::Add(args) => {
            readtrack::commands::add(books, args).await.context("add")?;
        }
        readtrack::cli::Command::Stats(args) => {
            readtrack::commands::stats(books, args).context("stats")?;
        }
    }

    Ok(())
}
