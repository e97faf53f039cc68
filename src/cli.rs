use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::dashboard::DEFAULT_SINCE_YEAR;
use crate::lookup::{
    DEFAULT_LOOKUP_URL, DEFAULT_TIMEOUT_SECS, DisabledLookup, MetadataLookup, OpenLibraryLookup,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Books CSV file.
    #[arg(long, global = true, env = "READTRACK_BOOKS", default_value = "books.csv")]
    pub books: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an empty books file.
    Init,
    /// Rewrite a legacy books file in the canonical schema.
    Migrate,
    /// Add a book read this year.
    Add(AddArgs),
    /// Print dashboard metrics.
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub author: String,

    /// Defaults to "other" when empty.
    #[arg(long, default_value = "")]
    pub genre: String,

    #[arg(long, default_value_t = 0)]
    pub stars: u32,

    #[command(flatten)]
    pub lookup: LookupArgs,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Average books per year counts only years after this one.
    #[arg(long, default_value_t = DEFAULT_SINCE_YEAR)]
    pub since_year: i32,

    /// Year treated as "this year" (default: the current year).
    #[arg(long)]
    pub year: Option<i32>,

    /// Print JSON instead of a text summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct LookupArgs {
    /// Base URL of the Open Library compatible metadata service.
    #[arg(long, env = "READTRACK_LOOKUP_URL", default_value = DEFAULT_LOOKUP_URL)]
    pub lookup_url: String,

    /// Timeout for one metadata lookup request.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub lookup_timeout_secs: u64,

    /// Skip the metadata lookup; pages and publish year are recorded as unknown.
    #[arg(long)]
    pub no_enrich: bool,
}

impl LookupArgs {
    pub fn build(&self) -> anyhow::Result<Arc<dyn MetadataLookup>> {
        if self.no_enrich {
            return Ok(Arc::new(DisabledLookup));
        }
        let lookup = OpenLibraryLookup::new(
            &self.lookup_url,
            Duration::from_secs(self.lookup_timeout_secs.max(1)),
        )?;
        tracing::debug!(endpoint = %lookup.endpoint(), "metadata lookup enabled");
        Ok(Arc::new(lookup))
    }
}
