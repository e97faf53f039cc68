use std::path::Path;

use anyhow::Context as _;

use crate::cli::{AddArgs, StatsArgs};
use crate::dashboard::{Dashboard, render_text};
use crate::ingest::{self, NewBook};
use crate::store::{MigrationOutcome, RecordStore};

pub fn init(books: &Path) -> anyhow::Result<()> {
    RecordStore::new(books).initialize()?;
    println!("initialized {}", books.display());
    Ok(())
}

pub fn migrate(books: &Path) -> anyhow::Result<()> {
    match RecordStore::new(books).migrate()? {
        MigrationOutcome::AlreadyCurrent => {
            println!("{} already uses the current schema", books.display());
        }
        MigrationOutcome::Migrated { records } => {
            println!("migrated {records} records in {}", books.display());
        }
    }
    Ok(())
}

pub async fn add(books: &Path, args: AddArgs) -> anyhow::Result<()> {
    if args.title.trim().is_empty() {
        anyhow::bail!("--title must not be empty");
    }
    if args.author.trim().is_empty() {
        anyhow::bail!("--author must not be empty");
    }

    let store = RecordStore::new(books);
    let collection = store.load()?;
    let lookup = args.lookup.build().context("build metadata lookup")?;

    let input = NewBook {
        title: args.title,
        author: args.author,
        genre: args.genre,
        stars: args.stars,
    };
    let record = ingest::create_record(lookup.as_ref(), input, ingest::current_year()).await;
    store.append_and_persist(collection, record.clone())?;

    println!(
        "added \"{}\" by {} (genre: {}, pages: {}, published: {}, read: {}, stars: {})",
        record.title,
        record.author,
        record.genre,
        record.pages,
        record.published_date,
        record.date_read,
        record.stars
    );
    Ok(())
}

pub fn stats(books: &Path, args: StatsArgs) -> anyhow::Result<()> {
    let records = RecordStore::new(books).load()?;
    let year = args.year.unwrap_or_else(ingest::current_year);
    let dashboard = Dashboard::build(&records, year, args.since_year);

    if args.json {
        let json = serde_json::to_string_pretty(&dashboard).context("serialize dashboard")?;
        println!("{json}");
    } else {
        print!("{}", render_text(&dashboard));
    }
    Ok(())
}
