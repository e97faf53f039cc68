use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use readtrack::app::routes::router;
use readtrack::app::session::AppState;
use readtrack::cli::LookupArgs;
use readtrack::dashboard::DEFAULT_SINCE_YEAR;
use readtrack::store::RecordStore;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Books CSV file.
    #[arg(long, env = "READTRACK_BOOKS", default_value = "books.csv")]
    books: PathBuf,

    /// Average books per year counts only years after this one.
    #[arg(long, default_value_t = DEFAULT_SINCE_YEAR)]
    since_year: i32,

    #[command(flatten)]
    lookup: LookupArgs,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    readtrack::logging::init()?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting readtrack-app");

    let store = RecordStore::new(&args.books);
    match store.load() {
        Ok(records) => tracing::info!(records = records.len(), "loaded record store"),
        Err(err) => tracing::warn!(
            %err,
            "record store unavailable; pages will fail until it is restored or initialized"
        ),
    }

    let lookup = args.lookup.build()?;
    let state = AppState::new(store, lookup, args.since_year);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
